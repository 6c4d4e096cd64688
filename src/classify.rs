// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Decide which catalog messages are worth sending to the backend.
//!
//! The rules are deliberately conservative: skipping a string that
//! could have been translated is cheap, while sending a placeholder
//! or a comment to the backend can mangle it.

use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

/// Character which marks a source string as a comment.
pub const COMMENT_MARKER: char = '#';

/// Why a message was not translated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The `msgid` is empty.
    Empty,
    /// The `msgid` starts with [`COMMENT_MARKER`].
    Comment,
    /// The `msgid` has no letters, e.g. `"..."` or `"42"`.
    NoLetters,
    /// The `msgid` is a bare conversion specifier such as `"%s"`.
    Placeholder,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let reason = match self {
            SkipReason::Empty => "the source text is empty",
            SkipReason::Comment => "the source text is a comment",
            SkipReason::NoLetters => "the source text contains no translatable text",
            SkipReason::Placeholder => "the source text is only a placeholder",
        };
        f.write_str(reason)
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"^%[a-zA-Z]*$").unwrap())
}

/// Returns `true` if `text` contains at least one letter.
///
/// Letters from any script count, so that translations into e.g.
/// Japanese or Greek are not mistaken for punctuation.
pub fn has_letters(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Returns `true` if `text` begins with the comment marker, ignoring
/// leading whitespace.
pub fn is_comment(text: &str) -> bool {
    text.trim().starts_with(COMMENT_MARKER)
}

/// Classify a source string.
///
/// Returns `None` if the string should be translated, otherwise the
/// reason for skipping it.
///
/// # Examples
///
/// ```
/// use po_autotranslate::classify::{classify, SkipReason};
///
/// assert_eq!(classify("Hello"), None);
/// assert_eq!(classify("%d"), Some(SkipReason::Placeholder));
/// assert_eq!(classify("---"), Some(SkipReason::NoLetters));
/// ```
pub fn classify(msgid: &str) -> Option<SkipReason> {
    if msgid.is_empty() {
        return Some(SkipReason::Empty);
    }
    if is_comment(msgid) {
        return Some(SkipReason::Comment);
    }
    if !has_letters(msgid) {
        return Some(SkipReason::NoLetters);
    }
    if placeholder_regex().is_match(msgid) {
        return Some(SkipReason::Placeholder);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_translatable() {
        assert_eq!(classify("Hello"), None);
        assert_eq!(classify("Apply for this job"), None);
        assert_eq!(classify("Olá"), None);
        assert_eq!(classify("Привет"), None);
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify(""), Some(SkipReason::Empty));
    }

    #[test]
    fn test_classify_comment() {
        assert_eq!(classify("###comment-only###"), Some(SkipReason::Comment));
        assert_eq!(classify("  # indented"), Some(SkipReason::Comment));
    }

    #[test]
    fn test_classify_no_letters() {
        for msgid in [" ", "...", "42", "%", "-- | --", "(1/2)"] {
            assert_eq!(classify(msgid), Some(SkipReason::NoLetters), "{msgid:?}");
        }
    }

    #[test]
    fn test_classify_placeholder() {
        assert_eq!(classify("%d"), Some(SkipReason::Placeholder));
        assert_eq!(classify("%s"), Some(SkipReason::Placeholder));
        assert_eq!(classify("%ld"), Some(SkipReason::Placeholder));
    }

    #[test]
    fn test_classify_mixed_placeholder_and_text() {
        // Only bare specifiers are skipped.
        assert_eq!(classify("%d files"), None);
        assert_eq!(classify("%s "), None);
        assert_eq!(classify("Page %d"), None);
    }

    #[test]
    fn test_is_comment() {
        assert!(is_comment("# note"));
        assert!(is_comment("\t#"));
        assert!(!is_comment("C# code"));
    }

    #[test]
    fn test_has_letters() {
        assert!(has_letters("abc"));
        assert!(has_letters("こんにちは"));
        assert!(!has_letters("12:30 - !?"));
    }
}
