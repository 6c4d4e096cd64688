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

//! Resumable progress, stored as a small JSON file next to the catalog.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Contents of the progress file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Index of the last entry which was fully processed.
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressTracker {
    path: PathBuf,
}

impl ProgressTracker {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ProgressTracker { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored entry index.
    ///
    /// A missing file means nothing has been processed yet and gives
    /// `0`. A file which cannot be parsed is an error.
    pub fn load(&self) -> anyhow::Result<usize> {
        if !self.path.try_exists().unwrap_or(false) {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        let progress: Progress = serde_json::from_str(&content)
            .with_context(|| format!("Could not parse {} as progress file", self.path.display()))?;
        Ok(progress.index)
    }

    /// Overwrite the stored entry index.
    pub fn save(&self, index: usize) -> anyhow::Result<()> {
        let content = serde_json::to_string(&Progress { index })?;
        fs::write(&self.path, content)
            .with_context(|| format!("Could not write {}", self.path.display()))
    }
}
