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

//! Reading, updating and writing PO catalogs.

use anyhow::{anyhow, Context};
use log::debug;
use polib::catalog::Catalog;
use polib::message::{MessageMutView, MessageView};
use polib::po_file;
use std::fs;
use std::io::Write;
use std::panic;
use std::path::Path;

/// Translated text of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Singular(String),
    /// One string per plural form, indexed like `msgstr[n]`.
    Plural(Vec<String>),
}

/// A snapshot of one catalog message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Position of the message in the catalog.
    pub index: usize,
    /// Line of the `msgid` keyword in the PO file, if known.
    pub line: Option<usize>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub target: Target,
}

impl Entry {
    pub fn from_message(
        index: usize,
        line: Option<usize>,
        message: &dyn MessageView,
    ) -> anyhow::Result<Entry> {
        let (msgid_plural, target) = if message.is_plural() {
            (
                Some(String::from(message.msgid_plural()?)),
                Target::Plural(message.msgstr_plural()?.clone()),
            )
        } else {
            (None, Target::Singular(String::from(message.msgstr()?)))
        };
        Ok(Entry {
            index,
            line,
            msgid: String::from(message.msgid()),
            msgid_plural,
            target,
        })
    }

    /// Source text for plural form `form`.
    ///
    /// Form 0 is the singular, every other form uses `msgid_plural`.
    pub fn form_source(&self, form: usize) -> &str {
        match (form, &self.msgid_plural) {
            (0, _) | (_, None) => &self.msgid,
            (_, Some(msgid_plural)) => msgid_plural,
        }
    }

    /// Human-readable location used in log messages.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("line {line}"),
            None => format!("entry {}", self.index + 1),
        }
    }
}

/// Find the line number of every `msgid` in a PO file.
///
/// The header entry and obsolete (`#~`) entries are not part of the
/// catalog messages, so they are left out. The result lines up with
/// `Catalog::messages()` for well-formed files.
pub fn message_line_numbers(content: &str) -> Vec<usize> {
    let lines = content.lines().collect::<Vec<_>>();
    let mut linenos = Vec::new();
    let mut first = true;
    for (idx, line) in lines.iter().enumerate() {
        if !line.trim_start().starts_with("msgid ") {
            continue;
        }
        if std::mem::replace(&mut first, false) && is_header(&lines, idx) {
            continue;
        }
        linenos.push(idx + 1);
    }
    linenos
}

/// A header is an empty `msgid` without context or continuation lines.
fn is_header(lines: &[&str], idx: usize) -> bool {
    let continued = lines
        .get(idx + 1)
        .is_some_and(|next| next.trim_start().starts_with('"'));
    let has_context = idx > 0 && lines[idx - 1].trim_start().starts_with("msgctxt");
    lines[idx].trim() == r#"msgid """# && !continued && !has_context
}

/// Header fields the PO parser requires, with the value used when a
/// file leaves one out.
const HEADER_DEFAULTS: [(&str, &str); 9] = [
    ("Project-Id-Version", ""),
    ("POT-Creation-Date", ""),
    ("PO-Revision-Date", ""),
    ("Language-Team", ""),
    ("MIME-Version", "1.0"),
    ("Content-Type", "text/plain; charset=UTF-8"),
    ("Content-Transfer-Encoding", "8bit"),
    ("Language", ""),
    ("Plural-Forms", "nplurals=2; plural=(n != 1);"),
];

/// Text between the quotes of a PO string line, escapes left as is.
fn quoted(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix('"')
        .and_then(|line| line.strip_suffix('"'))
        .unwrap_or_default()
}

/// Header lines for the fields of `HEADER_DEFAULTS` missing from
/// `header`, the escaped header text.
fn missing_fields(header: &str) -> String {
    let present = header
        .split("\\n")
        .filter_map(|field| field.split_once(':'))
        .map(|(key, _)| key)
        .collect::<Vec<_>>();
    let mut lines = String::new();
    for (key, value) in HEADER_DEFAULTS {
        if !present.contains(&key) {
            lines.push_str(&format!("\"{key}: {value}\\n\"\n"));
        }
    }
    if !lines.is_empty() && !header.is_empty() && !header.ends_with("\\n") {
        lines.insert_str(0, "\"\\n\"\n");
    }
    lines
}

/// Give `content` a header with every field of `HEADER_DEFAULTS`.
///
/// A header is added in front of a file without one, and missing fields
/// are appended to an existing header. Returns `None` when the header is
/// already complete.
fn complete_header(content: &str) -> Option<String> {
    let lines = content.lines().collect::<Vec<_>>();
    let header = lines
        .iter()
        .position(|line| line.trim_start().starts_with("msgid "))
        .filter(|&idx| is_header(&lines, idx));
    let Some(msgid_idx) = header else {
        let fields = missing_fields("");
        return Some(format!("msgid \"\"\nmsgstr \"\"\n{fields}\n{content}"));
    };

    let msgstr_idx = msgid_idx + 1;
    let msgstr = lines.get(msgstr_idx)?.trim_start().strip_prefix("msgstr ")?;
    let mut text = String::from(quoted(msgstr));
    let mut end = msgstr_idx;
    while let Some(line) = lines.get(end + 1).filter(|line| line.trim_start().starts_with('"')) {
        text.push_str(quoted(line));
        end += 1;
    }

    let fields = missing_fields(&text);
    if fields.is_empty() {
        return None;
    }
    let mut completed = lines[..=end].join("\n");
    completed.push('\n');
    completed.push_str(&fields);
    for line in &lines[end + 1..] {
        completed.push_str(line);
        completed.push('\n');
    }
    Some(completed)
}

/// Run the PO parser on `parse_path`, reporting errors against `path`.
///
/// The parser panics on some malformed input, which is turned into an
/// error here.
fn parse_po(parse_path: &Path, path: &Path) -> anyhow::Result<Catalog> {
    panic::catch_unwind(|| po_file::parse(parse_path))
        .map_err(|_| anyhow!("PO parser failed on malformed input"))
        .and_then(|parsed| parsed.map_err(|err| anyhow!("{err}")))
        .with_context(|| format!("Could not parse {path:?} as PO file"))
}

/// Parse the PO file at `path`.
///
/// Files without a header, or with a header that lacks some of the
/// standard fields, are accepted: the parser is given a copy with the
/// header completed. Returns the catalog together with the line number
/// of each message in the original file. The line numbers are empty if
/// they cannot be matched up with the messages.
pub fn load(path: &Path) -> anyhow::Result<(Catalog, Vec<usize>)> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    let catalog = match complete_header(&content) {
        None => parse_po(path, path)?,
        Some(completed) => {
            debug!("Completing the header of {} before parsing", path.display());
            let mut copy =
                tempfile::NamedTempFile::new().context("Could not create temporary file")?;
            copy.write_all(completed.as_bytes())
                .with_context(|| format!("Could not write {}", copy.path().display()))?;
            parse_po(copy.path(), path)?
        }
    };
    let mut linenos = message_line_numbers(&content);
    let count = catalog.messages().count();
    if linenos.len() != count {
        debug!(
            "Found {} msgid lines for {count} messages in {}, not reporting line numbers",
            linenos.len(),
            path.display()
        );
        linenos.clear();
    }
    Ok((catalog, linenos))
}

/// Write `catalog` to `path`, replacing any existing file.
pub fn save(catalog: &Catalog, path: &Path) -> anyhow::Result<()> {
    po_file::write(catalog, path)
        .with_context(|| format!("Could not write catalog to {}", path.display()))
}

/// Take snapshots of all messages in `catalog`.
pub fn entries(catalog: &Catalog, linenos: &[usize]) -> anyhow::Result<Vec<Entry>> {
    catalog
        .messages()
        .enumerate()
        .map(|(index, message)| Entry::from_message(index, linenos.get(index).copied(), message))
        .collect()
}

/// Store `target` as the translation of the message at `index`.
pub fn set_target(catalog: &mut Catalog, index: usize, target: Target) -> anyhow::Result<()> {
    let mut message = catalog
        .messages_mut()
        .nth(index)
        .ok_or_else(|| anyhow!("No message at index {index}"))?;
    match target {
        Target::Singular(msgstr) => message.set_msgstr(msgstr)?,
        Target::Plural(msgstrs) => *message.msgstr_plural_mut()? = msgstrs,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PO: &str = r#"# Translation of the job board.
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"

#: jobs.html:3
msgid "Hello"
msgstr ""

msgid ""
"Apply "
"now"
msgstr ""

msgctxt "menu"
msgid "Open"
msgstr "Abrir"

msgid "1 file"
msgid_plural "%d files"
msgstr[0] ""
msgstr[1] ""
"#;

    #[test]
    fn test_message_line_numbers() {
        assert_eq!(message_line_numbers(PO), vec![8, 11, 17, 20]);
    }

    #[test]
    fn test_message_line_numbers_skips_obsolete() {
        let content = "msgid \"a\"\nmsgstr \"A\"\n\n#~ msgid \"b\"\n#~ msgstr \"B\"\n";
        assert_eq!(message_line_numbers(content), vec![1]);
    }

    #[test]
    fn test_message_line_numbers_without_header() {
        let content = "msgid \"a\"\nmsgstr \"\"\n\nmsgid \"b\"\nmsgstr \"\"\n";
        assert_eq!(message_line_numbers(content), vec![1, 4]);
    }

    #[test]
    fn test_load_entries() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("jobs.po");
        fs::write(&path, PO)?;

        let (catalog, linenos) = load(&path)?;
        let entries = entries(&catalog, &linenos)?;
        assert_eq!(
            entries
                .iter()
                .map(|entry| (entry.line, entry.msgid.as_str()))
                .collect::<Vec<_>>(),
            vec![
                (Some(8), "Hello"),
                (Some(11), "Apply now"),
                (Some(17), "Open"),
                (Some(20), "1 file"),
            ]
        );
        assert_eq!(entries[2].target, Target::Singular(String::from("Abrir")));
        assert_eq!(entries[3].msgid_plural.as_deref(), Some("%d files"));
        assert_eq!(
            entries[3].target,
            Target::Plural(vec![String::new(), String::new()])
        );
        Ok(())
    }

    #[test]
    fn test_complete_header() {
        let completed = complete_header(PO).expect("header lacks fields");
        assert!(completed.starts_with(
            "# Translation of the job board.\nmsgid \"\"\nmsgstr \"\"\n\
             \"Content-Type: text/plain; charset=UTF-8\\n\"\n\
             \"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n\
             \"Project-Id-Version: \\n\"\n"
        ));
        assert!(completed.contains("\"Language: \\n\"\n\n#: jobs.html:3\n"));
        assert_eq!(complete_header(&completed), None);
    }

    #[test]
    fn test_load_without_header() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("jobs.po");
        fs::write(
            &path,
            "#: jobs.html:3\nmsgid \"Hello\"\nmsgstr \"\"\n\nmsgid \"Bye\"\nmsgstr \"Tchau\"\n",
        )?;

        let (catalog, linenos) = load(&path)?;
        let entries = entries(&catalog, &linenos)?;
        assert_eq!(
            entries
                .iter()
                .map(|entry| (entry.line, entry.msgid.as_str()))
                .collect::<Vec<_>>(),
            vec![(Some(2), "Hello"), (Some(5), "Bye")]
        );
        assert_eq!(entries[1].target, Target::Singular(String::from("Tchau")));
        assert_eq!(catalog.metadata.plural_rules.nplurals, 2);

        let output = tmpdir.path().join("jobs-translated.po");
        save(&catalog, &output)?;
        let (reloaded, _) = load(&output)?;
        assert_eq!(reloaded.count(), 2);
        Ok(())
    }

    #[test]
    fn test_load_header_without_language() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("jobs.po");
        fs::write(
            &path,
            r#"msgid ""
msgstr ""
"Project-Id-Version: jobs 1.0\n"
"POT-Creation-Date: 2024-01-01 00:00+0000\n"
"PO-Revision-Date: 2024-01-02 00:00+0000\n"
"Language-Team: Portuguese\n"
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Content-Transfer-Encoding: 8bit\n"
"Plural-Forms: nplurals=2; plural=(n > 1);"

msgid "Hello"
msgstr ""
"#,
        )?;

        let (catalog, linenos) = load(&path)?;
        assert_eq!(linenos, vec![12]);
        assert_eq!(catalog.metadata.project_id_version, "jobs 1.0");
        assert_eq!(catalog.metadata.language, "");
        assert_eq!(catalog.metadata.plural_rules.expr, "(n > 1)");
        Ok(())
    }

    #[test]
    fn test_load_malformed_is_an_error() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("broken.po");
        fs::write(&path, "msgid x\nmsgstr \"\"\n")?;
        assert!(load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_form_source() {
        let entry = Entry {
            index: 0,
            line: None,
            msgid: String::from("1 file"),
            msgid_plural: Some(String::from("%d files")),
            target: Target::Plural(vec![String::new(); 3]),
        };
        assert_eq!(entry.form_source(0), "1 file");
        assert_eq!(entry.form_source(1), "%d files");
        assert_eq!(entry.form_source(2), "%d files");
        assert_eq!(entry.location(), "entry 1");
    }

    #[test]
    fn test_set_target_and_save() -> anyhow::Result<()> {
        let tmpdir = tempfile::tempdir()?;
        let path = tmpdir.path().join("jobs.po");
        fs::write(&path, PO)?;

        let (mut catalog, _) = load(&path)?;
        set_target(&mut catalog, 0, Target::Singular(String::from("Olá")))?;
        set_target(
            &mut catalog,
            3,
            Target::Plural(vec![String::from("1 arquivo"), String::from("%d arquivos")]),
        )?;
        assert!(set_target(&mut catalog, 9, Target::Singular(String::new())).is_err());

        let output = tmpdir.path().join("jobs-translated.po");
        save(&catalog, &output)?;
        let (reloaded, linenos) = load(&output)?;
        let entries = entries(&reloaded, &linenos)?;
        assert_eq!(entries[0].target, Target::Singular(String::from("Olá")));
        assert_eq!(
            entries[3].target,
            Target::Plural(vec![String::from("1 arquivo"), String::from("%d arquivos")])
        );
        Ok(())
    }
}
