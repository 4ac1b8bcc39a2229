// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Terminal spinner shared by the long-running phases.

use indicatif::{ProgressBar, ProgressStyle};

const SPINNER_TEMPLATE: &str = "{spinner:.yellow} [{elapsed_precise}] {msg}";

/// Creates a spinner drawing to stderr. The spinner stays invisible when
/// stderr is not a terminal.
pub fn spinner() -> ProgressBar
{
    let pb = ProgressBar::new_spinner();
    if let Ok(style,) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE,) {
        pb.set_style(style,);
    }
    pb
}
