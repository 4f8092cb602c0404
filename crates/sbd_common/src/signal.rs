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

    common::signal.rs

    The configured signal quality rating and the bar range it maps to.
*/

use serde_derive::Deserialize;
use strum_macros::{Display, EnumString};

/// Configured signal quality profile. Bounds the random walk the signal
/// model performs on each tick; see [`SignalQualityRating::bar_range`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalQualityRating {
    None,
    Poor,
    Ok,
    Good,
    Excellent,
    #[default]
    Random,
}

impl SignalQualityRating {
    /// Inclusive `[min, max]` bar range for this rating, per the emulator's
    /// signal model table.
    pub fn bar_range(self) -> (u8, u8) {
        match self {
            SignalQualityRating::None => (0, 0),
            SignalQualityRating::Poor => (0, 2),
            SignalQualityRating::Ok => (1, 2),
            SignalQualityRating::Good => (3, 4),
            SignalQualityRating::Excellent => (5, 5),
            SignalQualityRating::Random => (0, 5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_ranges_match_table() {
        assert_eq!(SignalQualityRating::None.bar_range(), (0, 0));
        assert_eq!(SignalQualityRating::Poor.bar_range(), (0, 2));
        assert_eq!(SignalQualityRating::Ok.bar_range(), (1, 2));
        assert_eq!(SignalQualityRating::Good.bar_range(), (3, 4));
        assert_eq!(SignalQualityRating::Excellent.bar_range(), (5, 5));
        assert_eq!(SignalQualityRating::Random.bar_range(), (0, 5));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("good".parse::<SignalQualityRating>().unwrap(), SignalQualityRating::Good);
        assert_eq!("EXCELLENT".parse::<SignalQualityRating>().unwrap(), SignalQualityRating::Excellent);
    }
}
