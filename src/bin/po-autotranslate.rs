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

//! Translate a PO file with an OpenAI chat model.
//!
//! The API key is read from `OPENAI_API_KEY`, which can also be set in
//! a `.env` file in the current directory. Everything else is asked
//! for on the console. Progress is saved after every message, so the
//! program can be stopped at any time and started again later.

use std::io;

use po_autotranslate::backend::OpenAiBackend;
use po_autotranslate::config::{completer, Config, EnvSettings, Prompter};

fn main() -> anyhow::Result<()> {
    // A missing .env file is fine, the variables may come from the
    // environment instead.
    let _ = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"));

    let env = EnvSettings::from_lookup(|name| std::env::var(name).ok())?;
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout(), completer());
    let config = Config::from_console(env, &mut prompter)?;

    let backend = OpenAiBackend::new(&config.endpoint, &config.api_key, &config.model);
    po_autotranslate::run(&config, backend)?;
    Ok(())
}
