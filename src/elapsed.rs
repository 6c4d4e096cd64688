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

//! Human-readable durations for the end-of-run report.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
// Calendar-free approximations.
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

const UNITS: [(u64, &str); 5] = [
    (YEAR, "year"),
    (MONTH, "month"),
    (DAY, "day"),
    (HOUR, "hour"),
    (MINUTE, "minute"),
];

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Format a number of seconds as e.g. `"1 hour, 1 minute, 1 second"`.
///
/// Leading units which are zero are left out, seconds are always
/// included.
///
/// # Examples
///
/// ```
/// use po_autotranslate::elapsed::format_elapsed;
///
/// assert_eq!(format_elapsed(45), "45 seconds");
/// assert_eq!(format_elapsed(3661), "1 hour, 1 minute, 1 second");
/// ```
pub fn format_elapsed(seconds: u64) -> String {
    let mut parts = Vec::new();
    let mut remaining = seconds;
    for (size, unit) in UNITS {
        let count = remaining / size;
        remaining %= size;
        if count > 0 || !parts.is_empty() {
            parts.push(plural(count, unit));
        }
    }
    parts.push(plural(remaining, "second"));
    parts.join(", ")
}
