// Timed color calibration. Before drawing starts (and again whenever the
// Calibrate control fires), the user holds a marker inside the on-screen
// ring for a few seconds; when the window elapses we sample the center
// color and widen it into the HSV band the blob pass matches against.
//
// A bad sample (empty ring, washed-out color) is not an error: the derived
// range simply matches nothing, which shows up later as a permanently
// absent cursor. There is deliberately no validation step here.

use std::time::{Duration, Instant};

use crate::types::{ColorRange, Hsv};

/// How long each marker is held in the ring before sampling.
pub const CALIBRATION_WINDOW: Duration = Duration::from_secs(6);

/// Hue half-width of the derived range.
const HUE_MARGIN: u8 = 10;
/// Fixed saturation/value band of the derived range.
const SAT_VAL_LOW: u8 = 50;
const SAT_VAL_HIGH: u8 = 250;

/// Widen a sampled center color into the range the marker locator matches.
/// Hue widens by the fixed margin (saturating at the scale ends); saturation
/// and value are clamped to one fixed band regardless of the sample.
pub fn derive_range(sample: Hsv) -> ColorRange {
    ColorRange {
        lower: Hsv {
            h: sample.h.saturating_sub(HUE_MARGIN),
            s: SAT_VAL_LOW,
            v: SAT_VAL_LOW,
        },
        upper: Hsv {
            h: sample.h.saturating_add(HUE_MARGIN),
            s: SAT_VAL_HIGH,
            v: SAT_VAL_HIGH,
        },
    }
}

/// Wall-clock timer for one calibration phase. The tool state machine owns
/// which phase (first or second marker) is running; this only answers
/// "has the window elapsed" and re-arms for the next phase.
pub struct PhaseTimer {
    started: Instant,
}

impl PhaseTimer {
    pub fn start(now: Instant) -> Self {
        Self { started: now }
    }

    pub fn restart(&mut self, now: Instant) {
        self.started = now;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.duration_since(self.started)
    }

    pub fn done(&self, now: Instant) -> bool {
        self.elapsed(now) >= CALIBRATION_WINDOW
    }

    /// Whole seconds left on the countdown prompt, clamped at zero.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        CALIBRATION_WINDOW
            .saturating_sub(self.elapsed(now))
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_range_exact_arithmetic() {
        // pinned scenario: margin 10, clamps 50/250
        let range = derive_range(Hsv { h: 100, s: 150, v: 150 });
        assert_eq!(range.lower, Hsv { h: 90, s: 50, v: 50 });
        assert_eq!(range.upper, Hsv { h: 110, s: 250, v: 250 });
    }

    #[test]
    fn derive_range_saturates_at_hue_ends() {
        let low = derive_range(Hsv { h: 4, s: 200, v: 200 });
        assert_eq!(low.lower.h, 0);
        assert_eq!(low.upper.h, 14);

        let high = derive_range(Hsv { h: 250, s: 200, v: 200 });
        assert_eq!(high.upper.h, 255);
    }

    #[test]
    fn timer_crosses_window_once_rearmed() {
        let t0 = Instant::now();
        let mut timer = PhaseTimer::start(t0);
        assert!(!timer.done(t0 + Duration::from_secs(5)));
        assert_eq!(timer.remaining_secs(t0 + Duration::from_secs(4)), 2);
        assert!(timer.done(t0 + CALIBRATION_WINDOW));

        timer.restart(t0 + Duration::from_secs(7));
        assert!(!timer.done(t0 + Duration::from_secs(8)));
        assert!(timer.done(t0 + Duration::from_secs(13)));
    }
}
