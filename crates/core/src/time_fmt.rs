// SPDX-License-Identifier: MIT

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp the way the control plane's REST API expects it:
/// a space (not `T`) between date and time, microsecond precision, and an
/// explicit UTC offset.
///
/// `2024-01-01 12:00:00.000000+00:00`
pub fn format_dts(at: DateTime<Utc>) -> String {
    let rendered = at.to_rfc3339_opts(SecondsFormat::Micros, false);
    rendered.replacen('T', " ", 1)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
