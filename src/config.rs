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

//! Run configuration collected from the environment and the console.

use crate::backend::OPENAI_CHAT_URL;
use crate::translator::TranslatorOptions;
use anyhow::{bail, Context};
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MAX_TOKENS_VAR: &str = "OPENAI_MAX_TOKENS";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Everything a run needs, fixed before the first entry is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub target_language: String,
    pub context: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub progress: PathBuf,
}

/// Settings read from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
}

impl EnvSettings {
    /// Read the settings through `lookup`, e.g. `|name| std::env::var(name).ok()`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let max_tokens = match non_empty(MAX_TOKENS_VAR) {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Expected a positive integer for {MAX_TOKENS_VAR}"))?,
            None => 100,
        };
        Ok(EnvSettings {
            api_key: non_empty(API_KEY_VAR),
            model: non_empty(MODEL_VAR).unwrap_or_else(|| String::from(DEFAULT_MODEL)),
            endpoint: non_empty(BASE_URL_VAR).unwrap_or_else(|| String::from(OPENAI_CHAT_URL)),
            max_tokens,
        })
    }
}

impl Config {
    /// Complete the configuration by asking the user.
    ///
    /// Fails without touching any file when the credential or an
    /// answer is missing, or when the input file does not exist.
    pub fn from_console<R: BufRead, W: Write>(
        env: EnvSettings,
        prompter: &mut Prompter<R, W>,
    ) -> anyhow::Result<Config> {
        let Some(api_key) = env.api_key else {
            bail!("{API_KEY_VAR} is not set, add it to the environment or to a .env file");
        };

        let Some(target_language) =
            prompter.ask("Target language (e.g. Brazilian Portuguese): ")?
        else {
            bail!("A target language is required");
        };
        let Some(context) = prompter.ask("Context of the texts (e.g. job listings): ")? else {
            bail!("A context is required");
        };
        let Some(input) = prompter.ask_path("Path to the PO file: ")? else {
            bail!("A PO file is required");
        };
        if !input.is_file() {
            bail!("{} does not exist", input.display());
        }

        let default_progress = progress_path(&input);
        let progress = prompter
            .ask_path(&format!(
                "Path to the progress file [{}]: ",
                default_progress.display()
            ))?
            .unwrap_or(default_progress);

        Ok(Config {
            api_key,
            model: env.model,
            endpoint: env.endpoint,
            max_tokens: env.max_tokens,
            temperature: 0.5,
            target_language,
            context,
            output: output_path(&input),
            input,
            progress,
        })
    }

    pub fn translator_options(&self) -> TranslatorOptions {
        TranslatorOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..TranslatorOptions::new(&self.target_language, &self.context)
        }
    }
}

/// Compute where the translated catalog is written.
///
/// `foo.po` and `foo.pot` become `foo-translated.po`, other file names
/// get `-translated` appended.
pub fn output_path(input: &Path) -> PathBuf {
    let is_catalog = input
        .extension()
        .is_some_and(|extension| extension == "po" || extension == "pot");
    match input.file_stem() {
        Some(stem) if is_catalog => {
            let mut name = OsString::from(stem);
            name.push("-translated.po");
            input.with_file_name(name)
        }
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push("-translated");
            PathBuf::from(name)
        }
    }
}

/// Default location of the progress file: `foo.po` uses `foo-progress.json`.
pub fn progress_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("translation"));
    name.push("-progress.json");
    input.with_file_name(name)
}

/// Suggests file system paths for partially typed input.
pub trait PathCompleter {
    /// Returns the paths which start with `partial`, sorted.
    fn complete(&self, partial: &str) -> Vec<String>;
}

/// Used when completion is not available.
pub struct NoCompletion;

impl PathCompleter for NoCompletion {
    fn complete(&self, _partial: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Completes paths by listing directory entries.
pub struct FsCompleter;

impl PathCompleter for FsCompleter {
    fn complete(&self, partial: &str) -> Vec<String> {
        let (directory, prefix) = match partial.rfind('/') {
            Some(pos) => (&partial[..=pos], &partial[pos + 1..]),
            None => ("", partial),
        };
        let read_dir = match fs::read_dir(if directory.is_empty() { "." } else { directory }) {
            Ok(read_dir) => read_dir,
            Err(_) => return Vec::new(),
        };

        let mut candidates = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().into_string().ok()?;
                if !name.starts_with(prefix) {
                    return None;
                }
                let suffix = if entry.path().is_dir() { "/" } else { "" };
                Some(format!("{directory}{name}{suffix}"))
            })
            .collect::<Vec<_>>();
        candidates.sort();
        candidates
    }
}

/// Pick the completion capability for this process.
pub fn completer() -> Box<dyn PathCompleter> {
    if io::stdin().is_terminal() {
        Box::new(FsCompleter)
    } else {
        Box::new(NoCompletion)
    }
}

/// Asks questions on an output stream and reads answers line by line.
pub struct Prompter<R, W> {
    input: R,
    output: W,
    completer: Box<dyn PathCompleter>,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, completer: Box<dyn PathCompleter>) -> Self {
        Prompter {
            input,
            output,
            completer,
        }
    }

    /// Ask `question` and return the trimmed answer, or `None` when
    /// the answer is empty or the input is exhausted.
    pub fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input
            .read_line(&mut answer)
            .context("Could not read from the console")?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| String::from(answer)))
    }

    /// Ask for a path.
    ///
    /// If the answer does not exist, the completer is consulted: a
    /// single candidate is taken as the answer, several candidates are
    /// listed and the question is repeated.
    pub fn ask_path(&mut self, question: &str) -> anyhow::Result<Option<PathBuf>> {
        loop {
            let Some(answer) = self.ask(question)? else {
                return Ok(None);
            };
            if Path::new(&answer).exists() {
                return Ok(Some(PathBuf::from(answer)));
            }
            let candidates = self.completer.complete(&answer);
            match candidates.as_slice() {
                [] => return Ok(Some(PathBuf::from(answer))),
                [candidate] if !candidate.ends_with('/') => {
                    writeln!(self.output, "Using {candidate}")?;
                    return Ok(Some(PathBuf::from(candidate)));
                }
                _ => {
                    for candidate in &candidates {
                        writeln!(self.output, "  {candidate}")?;
                    }
                }
            }
        }
    }
}
