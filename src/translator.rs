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

//! Translate single strings with a [`Backend`].

use crate::backend::{Backend, Completion, CompletionRequest};
use crate::classify::has_letters;
use log::{debug, error, warn};
use std::time::Instant;

/// Phrases which show that the model commented on the text instead
/// of translating it.
pub const REFUSAL_PHRASES: [&str; 2] = ["does not need to be corrected", "reference to"];

/// Settings which shape every request.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorOptions {
    /// Human-readable name of the target language, e.g. "Brazilian Portuguese".
    pub target_language: String,
    /// Domain hint for word choice, e.g. "job listings".
    pub context: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl TranslatorOptions {
    pub fn new(target_language: &str, context: &str) -> Self {
        TranslatorOptions {
            target_language: String::from(target_language),
            context: String::from(context),
            max_tokens: 100,
            temperature: 0.5,
        }
    }
}

pub struct Translator<B> {
    backend: B,
    options: TranslatorOptions,
}

/// Build the instruction sent to the model for `text`.
pub fn build_prompt(text: &str, target_language: &str, context: &str) -> String {
    format!(
        "Translate the following text into {target_language}. \
         The text comes from {context}; keep that context in mind and adapt \
         the wording when necessary, but do not add information that is not \
         in the original. Keep placeholders such as %s, %d or {{name}} \
         unchanged. Reply with the translation only.\n\
         Original text: {text}\n\
         Translated text:"
    )
}

/// Check a response from the backend.
///
/// Returns the trimmed translation, or `None` if it must be discarded.
pub fn validate(response: &str) -> Option<&str> {
    let response = response.trim();
    let lowercase = response.to_lowercase();
    if REFUSAL_PHRASES
        .iter()
        .any(|phrase| lowercase.contains(phrase))
    {
        return None;
    }
    if !has_letters(response) {
        return None;
    }
    Some(response)
}

impl<B: Backend> Translator<B> {
    pub fn new(backend: B, options: TranslatorOptions) -> Self {
        Translator { backend, options }
    }

    pub fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    /// Translate `text`.
    ///
    /// This never fails: when the backend is unavailable or its answer
    /// looks wrong, `text` is returned unchanged.
    pub fn translate(&self, text: &str) -> String {
        let request = CompletionRequest {
            source: text,
            prompt: build_prompt(text, &self.options.target_language, &self.options.context),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let start = Instant::now();
        let completion = self.backend.complete(&request);
        debug!("Backend call took {:.2?}", start.elapsed());

        match completion {
            Completion::Success(response) => match validate(&response) {
                Some(translation) => String::from(translation),
                None => {
                    warn!(
                        "Rejected translation {:?} for {text:?}, keeping the original text",
                        response.trim()
                    );
                    String::from(text)
                }
            },
            Completion::RateLimited => {
                warn!("API rate limit reached, keeping the original text for {text:?}");
                String::from(text)
            }
            Completion::Failed(message) => {
                error!("Translation backend failed: {message}");
                String::from(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    fn make_translator<B: Backend>(backend: B) -> Translator<B> {
        Translator::new(backend, TranslatorOptions::new("Brazilian Portuguese", "job listings"))
    }

    fn answer(response: &'static str) -> impl Fn(&CompletionRequest) -> Completion {
        move |_: &CompletionRequest| Completion::Success(String::from(response))
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("Apply now", "German", "job listings");
        assert!(prompt.contains("into German"));
        assert!(prompt.contains("job listings"));
        assert!(prompt.contains("{name}"));
        assert!(prompt.ends_with("Original text: Apply now\nTranslated text:"));
    }

    #[test]
    fn test_request_parameters() {
        let requests = RefCell::new(Vec::new());
        let backend = |request: &CompletionRequest| {
            requests.borrow_mut().push((
                String::from(request.source),
                request.prompt.clone(),
                request.max_tokens,
                request.temperature,
            ));
            Completion::Success(String::from("Candidate-se agora"))
        };
        let translator = make_translator(backend);
        assert_eq!(translator.translate("Apply now"), "Candidate-se agora");

        let requests = requests.into_inner();
        assert_eq!(requests.len(), 1);
        let (source, prompt, max_tokens, temperature) = &requests[0];
        assert_eq!(source, "Apply now");
        assert_eq!(
            prompt,
            &build_prompt("Apply now", "Brazilian Portuguese", "job listings")
        );
        assert_eq!(*max_tokens, 100);
        assert_eq!(*temperature, 0.5);
    }

    #[test]
    fn test_translate_trims_response() {
        let translator = make_translator(answer("  Olá mundo\n"));
        assert_eq!(translator.translate("Hello world"), "Olá mundo");
    }

    #[test]
    fn test_translate_rejects_refusal() {
        let translator = make_translator(answer("This is a reference to a company name."));
        assert_eq!(translator.translate("Acme"), "Acme");

        let translator = make_translator(answer("The text DOES NOT NEED TO BE CORRECTED."));
        assert_eq!(translator.translate("Acme Inc."), "Acme Inc.");
    }

    #[test]
    fn test_translate_rejects_symbols_only() {
        let translator = make_translator(answer("-- ... --"));
        assert_eq!(translator.translate("Loading"), "Loading");

        let translator = make_translator(answer(""));
        assert_eq!(translator.translate("Loading"), "Loading");
    }

    #[test]
    fn test_translate_accepts_non_latin_script() {
        let translator = make_translator(answer("求人に応募する"));
        assert_eq!(translator.translate("Apply for a job"), "求人に応募する");
    }

    #[test]
    fn test_translate_rate_limited() {
        let translator = make_translator(|_: &CompletionRequest| Completion::RateLimited);
        assert_eq!(translator.translate("Hello"), "Hello");
    }

    #[test]
    fn test_translate_backend_error() {
        let translator =
            make_translator(|_: &CompletionRequest| Completion::Failed(String::from("HTTP 500")));
        assert_eq!(translator.translate("Hello"), "Hello");
    }

    #[test]
    fn test_validate() {
        assert_eq!(validate(" Vaga "), Some("Vaga"));
        assert_eq!(validate("Reference To the above"), None);
        assert_eq!(validate("123"), None);
    }
}
