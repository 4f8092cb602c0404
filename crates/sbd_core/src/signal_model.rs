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

    signal_model.rs

    Signal Model (component C). A tiny state machine producing a current
    signal bar 0..5. The ticker that drives it lives in `emulator.rs`,
    since scheduling the random interval and emitting +CIEV lines both
    need access to the shared state mutex and output writer.
*/

use rand::Rng;
use std::time::Duration;

use sbd_common::SignalQualityRating;

pub const TICK_MIN: Duration = Duration::from_secs(15);
pub const TICK_MAX: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct SignalModel {
    rating: SignalQualityRating,
    current: u8,
}

impl SignalModel {
    pub fn new(rating: SignalQualityRating) -> Self {
        SignalModel { rating, current: 1 }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    /// Samples a new bar value. Returns `Some(new_value)` only when it
    /// differs from the current one, so the caller knows whether to emit
    /// +CIEV lines.
    pub fn tick(&mut self, rng: &mut impl Rng, radio_activity_enabled: bool) -> Option<u8> {
        let (min, max) = if radio_activity_enabled {
            self.rating.bar_range()
        }
        else {
            (0, 0)
        };
        let next = rng.gen_range(min..=max);
        if next != self.current {
            self.current = next;
            Some(next)
        }
        else {
            None
        }
    }

    /// Forces the bar to 0 without going through the normal tick sampling,
    /// used when radio activity is disabled out-of-band (AT*R0).
    pub fn force_zero(&mut self) -> Option<u8> {
        if self.current != 0 {
            self.current = 0;
            Some(0)
        }
        else {
            None
        }
    }
}

pub fn next_tick_delay(rng: &mut impl Rng) -> Duration {
    rng.gen_range(TICK_MIN..=TICK_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn none_rating_always_zero() {
        let mut model = SignalModel::new(SignalQualityRating::None);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            model.tick(&mut rng, true);
            assert_eq!(model.current(), 0);
        }
    }

    #[test]
    fn excellent_rating_always_five() {
        let mut model = SignalModel::new(SignalQualityRating::Excellent);
        let mut rng = StdRng::seed_from_u64(2);
        model.tick(&mut rng, true);
        assert_eq!(model.current(), 5);
    }

    #[test]
    fn radio_disabled_forces_zero_regardless_of_rating() {
        let mut model = SignalModel::new(SignalQualityRating::Excellent);
        let mut rng = StdRng::seed_from_u64(3);
        model.tick(&mut rng, false);
        assert_eq!(model.current(), 0);
    }
}
