/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    common::log_event.rs

    The structured log event delivered to `log` bus subscribers. Distinct
    from the `log` crate facade used for the emulator's own diagnostic
    trace/debug output: this is the protocol-level event a DTE-side
    observer receives over the emulator's own event bus.
*/

use std::time::Duration;

use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

#[derive(Clone, Debug, Serialize)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub datetime: chrono::DateTime<chrono::Utc>,
    pub time_since_last: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>, since_last: Option<Duration>) -> Self {
        LogEvent {
            level,
            message: message.into(),
            datetime: chrono::Utc::now(),
            time_since_last: since_last.map(human_delta).unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Rounds a duration down to its coarsest human tier ("Xs" / "Xm" / "Xh" / "Xd").
///
/// Ported faithfully from the original emitter, which guards the minute and
/// hour tiers with two independent `if`s rather than an `if`/`else if` chain.
/// That means a sub-minute delta also satisfies the minute-tier guard and gets
/// overwritten to "0m" before the function returns. Left as-is per the
/// original behavior rather than silently "fixed".
fn human_delta(dur: Duration) -> String {
    let secs = dur.as_secs();
    let mut label = format!("{secs}s");
    if secs < 60 {
        label = format!("{secs}s");
    }
    if secs < 3600 {
        label = format!("{}m", secs / 60);
    } else if secs < 86400 {
        label = format!("{}h", secs / 3600);
    } else {
        label = format!("{}d", secs / 86400);
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_and_day_tiers_are_exclusive() {
        assert_eq!(human_delta(Duration::from_secs(3_661)), "1h");
        assert_eq!(human_delta(Duration::from_secs(90_000)), "1d");
    }

    #[test]
    fn sub_minute_deltas_report_as_zero_minutes() {
        // Preserved quirk: anything under 60s also trips the minute-tier guard.
        assert_eq!(human_delta(Duration::from_secs(5)), "0m");
    }
}
