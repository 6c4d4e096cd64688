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

//! Machine translation of Gettext PO files.
//!
//! The catalog is processed one message at a time. Every message
//! which looks translatable is sent to a chat-completion backend and
//! the answer is stored as the new `msgstr`. After each message, the
//! translated catalog and the index of the message are written to
//! disk. An interrupted run can therefore be restarted and will pick
//! up where it stopped.

pub mod backend;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod elapsed;
pub mod progress;
pub mod translator;

use backend::Backend;
use catalog::{Entry, Target};
use classify::{classify, is_comment, SkipReason};
use config::Config;
use elapsed::format_elapsed;
use log::info;
use polib::catalog::Catalog;
use progress::ProgressTracker;
use std::path::Path;
use translator::Translator;

/// What happened to a single entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The entry was processed by an earlier run.
    AlreadyDone,
    Skipped(SkipReason),
    Translated,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Index of the first entry processed by this run.
    pub resumed_from: usize,
    pub translated: usize,
    pub skipped: usize,
}

/// Translate every form of `entry`.
///
/// Plural entries get one backend call per `msgstr[n]`: form 0 is
/// translated from `msgid`, all other forms from `msgid_plural`. Forms
/// whose source is a comment keep their current text.
pub fn translate_entry<B: Backend>(entry: &Entry, translator: &Translator<B>) -> Target {
    match &entry.target {
        Target::Singular(_) => Target::Singular(translator.translate(&entry.msgid)),
        Target::Plural(forms) => Target::Plural(
            forms
                .iter()
                .enumerate()
                .map(|(form, current)| {
                    let source = entry.form_source(form);
                    if is_comment(source) {
                        info!("Skipping form {form} of {}: {source:?}", entry.location());
                        current.clone()
                    } else {
                        translator.translate(source)
                    }
                })
                .collect(),
        ),
    }
}

fn process_entry<B: Backend>(
    catalog: &mut Catalog,
    entry: &Entry,
    start_index: usize,
    translator: &Translator<B>,
    tracker: &ProgressTracker,
    output: &Path,
) -> anyhow::Result<Outcome> {
    if entry.index < start_index {
        return Ok(Outcome::AlreadyDone);
    }
    if let Some(reason) = classify(&entry.msgid) {
        info!(
            "Skipping {}: msgid {:?}, {reason}",
            entry.location(),
            entry.msgid
        );
        return Ok(Outcome::Skipped(reason));
    }

    match &entry.target {
        Target::Singular(msgstr) => info!(
            "Translating {}: msgid {:?}, current msgstr {msgstr:?}",
            entry.location(),
            entry.msgid
        ),
        Target::Plural(msgstrs) => info!(
            "Translating {}: msgid {:?}, msgid_plural {:?}, current msgstr {msgstrs:?}",
            entry.location(),
            entry.msgid,
            entry.msgid_plural.as_deref().unwrap_or_default()
        ),
    }
    let target = translate_entry(entry, translator);
    match &target {
        Target::Singular(msgstr) => info!("New translation: {msgstr:?}"),
        Target::Plural(msgstrs) => info!("New translations: {msgstrs:?}"),
    }

    catalog::set_target(catalog, entry.index, target)?;
    tracker.save(entry.index)?;
    catalog::save(catalog, output)?;
    Ok(Outcome::Translated)
}

/// Translate `catalog` in place and write it to `output`.
///
/// Entries before `start_index` are left alone. The catalog and the
/// progress file are updated after every translated entry, and the
/// catalog is written once more at the end.
pub fn translate_catalog<B: Backend>(
    catalog: &mut Catalog,
    linenos: &[usize],
    start_index: usize,
    translator: &Translator<B>,
    tracker: &ProgressTracker,
    output: &Path,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary {
        resumed_from: start_index,
        ..RunSummary::default()
    };
    for entry in catalog::entries(catalog, linenos)? {
        match process_entry(catalog, &entry, start_index, translator, tracker, output)? {
            Outcome::AlreadyDone => {}
            Outcome::Skipped(_) => summary.skipped += 1,
            Outcome::Translated => summary.translated += 1,
        }
    }

    catalog::save(catalog, output)?;
    Ok(summary)
}

/// Run a complete translation session described by `config`.
///
/// When an earlier run left progress behind and its output file
/// exists, the catalog is loaded from the output so that the
/// translations made so far are kept.
pub fn run<B: Backend>(config: &Config, backend: B) -> anyhow::Result<RunSummary> {
    let started = chrono::Local::now();
    info!(
        "Started at {}",
        started.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );

    let tracker = ProgressTracker::new(&config.progress);
    let start_index = tracker.load()?;
    if start_index > 0 {
        info!(
            "Resuming at entry {} as recorded in {}",
            start_index + 1,
            tracker.path().display()
        );
    }
    let resume = start_index > 0 && config.output.try_exists().unwrap_or(false);
    let source = if resume { &config.output } else { &config.input };
    info!("Loading {}", source.display());
    let (mut catalog, linenos) = catalog::load(source)?;

    let translator = Translator::new(backend, config.translator_options());
    info!(
        "Translating into {} with context {:?}",
        translator.options().target_language,
        translator.options().context
    );
    let summary = translate_catalog(
        &mut catalog,
        &linenos,
        start_index,
        &translator,
        &tracker,
        &config.output,
    )?;

    let elapsed = chrono::Local::now() - started;
    info!(
        "Done: {} translated, {} skipped. Catalog saved as {}",
        summary.translated,
        summary.skipped,
        config.output.display()
    );
    info!(
        "Total time: {}",
        format_elapsed(u64::try_from(elapsed.num_seconds()).unwrap_or(0))
    );
    Ok(summary)
}
