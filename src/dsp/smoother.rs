//! # One-Pole Delay-Time Smoother
//!
//! Gain and mix are ramped linearly by nih-plug's own
//! [`Smoother`](nih_plug::prelude::Smoother). Delay time needs a different
//! curve:
//!
//! ```text
//! current += (target - current) * coeff
//! coeff    = 1 - e^(-1 / (time_constant * sample_rate))
//! ```
//!
//! Each sample covers a fixed *fraction* of the remaining distance, so the
//! value moves fast at first and eases in at the end. The delay line's
//! read head then slows down gradually instead of stopping dead at the
//! end of a linear ramp, which keeps the Doppler-style pitch shift from
//! ending abruptly.
//!
//! ## Precision
//!
//! The state is kept in `f64`. In `f32` the per-sample increment of a
//! 200 ms constant at 192 kHz falls below half an ULP of a 5000 ms value
//! while the value is still ~10 ms away, and the smoother stalls there.
//! In `f64` the remaining distance shrinks far below [`SNAP_THRESHOLD`]
//! before that happens, so the value always lands on its target.

/// Remaining distance, in the smoothed unit, below which the value snaps
/// to its target.
const SNAP_THRESHOLD: f64 = 1e-6;

/// First-order exponential smoother.
#[derive(Debug, Clone)]
pub struct OnePoleSmoother {
    current: f64,
    target: f64,
    coeff: f64,
}

impl OnePoleSmoother {
    /// A smoother resting at `value`. With no time constant configured
    /// the coefficient is 1, i.e. the value follows the target instantly.
    pub fn new(value: f32) -> Self {
        Self {
            current: f64::from(value),
            target: f64::from(value),
            coeff: 1.0,
        }
    }

    /// Derive the per-sample coefficient from a time constant.
    ///
    /// After one time constant the value has covered ~63% of the distance
    /// to its target; after five, ~99.3%.
    pub fn set_time_constant(&mut self, time_constant_seconds: f32, sample_rate: f32) {
        let tau_samples = f64::from(time_constant_seconds) * f64::from(sample_rate);
        // `1 - e^x` computed as `-(e^x - 1)` keeps precision when the
        // coefficient is tiny (long time constants, high sample rates).
        self.coeff = -(-1.0 / tau_samples).exp_m1();
    }

    /// Jump straight to `value`, without smoothing.
    pub fn reset(&mut self, value: f32) {
        self.current = f64::from(value);
        self.target = f64::from(value);
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = f64::from(target);
    }

    /// Advance one sample and return the new current value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let distance = self.target - self.current;
        if distance.abs() <= SNAP_THRESHOLD {
            self.current = self.target;
        } else {
            self.current += distance * self.coeff;
        }

        self.current as f32
    }

    pub fn target(&self) -> f32 {
        self.target as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coefficient() {
        let mut s = OnePoleSmoother::new(0.0);
        s.set_time_constant(0.2, 48_000.0);
        let expected = 1.0 - (-1.0_f64 / 9_600.0).exp();
        assert!(
            (s.coeff - expected).abs() < 1e-12,
            "coeff {} vs {expected}",
            s.coeff
        );
    }

    #[test]
    fn test_reaches_63_percent_at_one_tau() {
        let mut s = OnePoleSmoother::new(0.0);
        s.set_time_constant(0.01, 44_100.0);
        s.set_target(1.0);
        let mut v = 0.0;
        for _ in 0..441 {
            v = s.next();
        }
        assert!((v - 0.632).abs() < 0.01, "v={v}");
    }

    #[test]
    fn test_converges_within_five_tau() {
        let mut s = OnePoleSmoother::new(100.0);
        s.set_time_constant(0.2, 48_000.0);
        s.set_target(1_000.0);

        let five_tau = (5.0 * 0.2 * 48_000.0) as usize;
        let mut previous = 100.0;
        for _ in 0..five_tau {
            let v = s.next();
            assert!(v >= previous && v <= 1_000.0);
            previous = v;
        }
        // e^-5 of the 900 ms distance is about 6 ms.
        let remaining = 1_000.0 - previous;
        assert!(remaining < 900.0 * 0.0075, "remaining {remaining}");
    }

    /// A full-range sweep lands exactly on the target instead of stalling
    /// a few milliseconds short, at both ordinary and high sample rates.
    #[test]
    fn test_full_range_sweep_lands_on_target() {
        for sample_rate in [48_000.0, 192_000.0] {
            for target in [5_000.0, 1_000.0] {
                let mut s = OnePoleSmoother::new(5.0);
                s.set_time_constant(0.2, sample_rate);
                s.set_target(target);

                let fifty_tau = (50.0 * 0.2 * sample_rate) as usize;
                let mut v = 5.0;
                for _ in 0..fifty_tau {
                    v = s.next();
                }
                assert_eq!(v, target, "stalled at {v} ms of {target} ms, {sample_rate} Hz");
            }
        }
    }

    /// Falling sweeps settle just the same.
    #[test]
    fn test_downward_sweep_lands_on_target() {
        let mut s = OnePoleSmoother::new(5_000.0);
        s.set_time_constant(0.2, 192_000.0);
        s.set_target(5.0);

        let mut v = 5_000.0;
        for _ in 0..(50.0 * 0.2 * 192_000.0) as usize {
            v = s.next();
        }
        assert_eq!(v, 5.0);
    }

    #[test]
    fn test_snaps_when_close() {
        let mut s = OnePoleSmoother::new(1.0);
        s.set_time_constant(0.2, 48_000.0);
        s.set_target(1.0 + 1e-7);
        assert_eq!(s.next(), 1.0 + 1e-7);
    }

    #[test]
    fn test_reset_snaps() {
        let mut s = OnePoleSmoother::new(0.0);
        s.set_time_constant(0.2, 48_000.0);
        s.set_target(250.0);
        s.next();
        s.reset(100.0);
        assert_eq!(s.next(), 100.0);
        assert_eq!(s.target(), 100.0);
    }
}
