//! # Smoothed Parameter Set
//!
//! Bridges the three raw host parameters to the per-sample values the
//! delay-mix stage consumes:
//!
//! | raw value        | conversion        | smoother              |
//! |------------------|-------------------|-----------------------|
//! | gain (dB)        | `10^(dB / 20)`    | linear, 20 ms         |
//! | delay time (ms)  | none              | one-pole, τ = 200 ms  |
//! | mix (%)          | `/ 100`           | linear, 20 ms         |
//!
//! The call order per stream is fixed:
//!
//! ```text
//! on_stream_start(sr) → on_stream_reset(raw) → { on_block_start(raw) → advance() × N }*
//! ```

use nih_plug::prelude::*;

use super::delay_mix::SampleControls;
use super::smoother::OnePoleSmoother;
use super::{EngineConfig, RawParameters};

/// Converted, range-checked smoother targets for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Targets {
    gain: f32,
    delay_time_ms: f32,
    mix: f32,
}

impl Targets {
    /// Convert host units to engine units, clamping each value to its
    /// declared range first.
    fn from_raw(raw: RawParameters, config: &EngineConfig) -> Self {
        Self {
            gain: util::db_to_gain(raw.gain_db.clamp(config.min_gain_db, config.max_gain_db)),
            delay_time_ms: raw
                .delay_time_ms
                .clamp(config.min_delay_ms, config.max_delay_ms),
            mix: raw.mix_percent.clamp(0.0, 100.0) / 100.0,
        }
    }
}

/// Gain, delay time and mix, each smoothed once per sample.
pub struct SmoothedParameterSet {
    config: EngineConfig,
    sample_rate: f32,

    gain_smoother: Smoother<f32>,
    delay_time_smoother: OnePoleSmoother,
    mix_smoother: Smoother<f32>,

    /// Last targets handed to the linear smoothers. nih-plug restarts a
    /// ramp on every `set_target()`, so they are only retargeted when the
    /// value actually moves.
    gain_target: f32,
    mix_target: f32,

    /// Linear gain for the current sample.
    gain: f32,
    /// Delay time in milliseconds for the current sample.
    delay_time_ms: f32,
    /// Wet amount in `[0, 1]` for the current sample.
    mix: f32,
}

impl SmoothedParameterSet {
    pub fn new(config: EngineConfig) -> Self {
        let initial = Targets::from_raw(RawParameters::default(), &config);
        let ramp_ms = config.ramp_seconds * 1000.0;

        let gain_smoother = Smoother::new(SmoothingStyle::Linear(ramp_ms));
        gain_smoother.reset(initial.gain);
        let mix_smoother = Smoother::new(SmoothingStyle::Linear(ramp_ms));
        mix_smoother.reset(initial.mix);

        Self {
            config,
            sample_rate: 0.0,
            gain_smoother,
            delay_time_smoother: OnePoleSmoother::new(initial.delay_time_ms),
            mix_smoother,
            gain_target: initial.gain,
            mix_target: initial.mix,
            gain: initial.gain,
            delay_time_ms: initial.delay_time_ms,
            mix: initial.mix,
        }
    }

    /// Configure ramp lengths and the delay-time coefficient for
    /// `sample_rate`. Must precede any processing and be repeated
    /// whenever the sample rate changes.
    ///
    /// A linear ramp in progress was sized for the old rate, so it is
    /// dropped and the smoother parks on its target.
    pub fn on_stream_start(&mut self, sample_rate: f32) {
        nih_debug_assert!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "invalid sample rate {}",
            sample_rate
        );

        self.sample_rate = sample_rate;
        self.gain_smoother.reset(self.gain_target);
        self.mix_smoother.reset(self.mix_target);
        self.delay_time_smoother
            .set_time_constant(self.config.delay_time_constant_seconds, sample_rate);
    }

    /// Snap every smoother to the present parameter values, skipping the
    /// ramp. Without this a stream would fade in from whatever stale value
    /// the smoothers last held, and the delay would sweep in from it.
    pub fn on_stream_reset(&mut self, raw: RawParameters) {
        let targets = Targets::from_raw(raw, &self.config);

        self.gain_smoother.reset(targets.gain);
        self.delay_time_smoother.reset(targets.delay_time_ms);
        self.mix_smoother.reset(targets.mix);
        self.gain_target = targets.gain;
        self.mix_target = targets.mix;

        self.gain = targets.gain;
        self.delay_time_ms = targets.delay_time_ms;
        self.mix = targets.mix;
    }

    /// Hand the block's raw values to the smoothers as new targets.
    /// Called once per block, before the sample loop.
    pub fn on_block_start(&mut self, raw: RawParameters) {
        let targets = Targets::from_raw(raw, &self.config);

        if targets.gain != self.gain_target {
            self.gain_smoother.set_target(self.sample_rate, targets.gain);
            self.gain_target = targets.gain;
        }
        if targets.mix != self.mix_target {
            self.mix_smoother.set_target(self.sample_rate, targets.mix);
            self.mix_target = targets.mix;
        }
        self.delay_time_smoother.set_target(targets.delay_time_ms);
    }

    /// Step every smoother forward by one sample.
    #[inline]
    pub fn advance(&mut self) {
        self.gain = self.gain_smoother.next();
        self.delay_time_ms = self.delay_time_smoother.next();
        self.mix = self.mix_smoother.next();
    }

    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    #[inline]
    pub fn delay_time_ms(&self) -> f32 {
        self.delay_time_ms
    }

    #[inline]
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// The current values in the shape the delay-mix stage takes.
    #[inline]
    pub fn controls(&self) -> SampleControls {
        SampleControls {
            delay_time_ms: self.delay_time_ms,
            mix: self.mix,
            gain: self.gain,
        }
    }

    /// The delay time the smoother is heading for, in milliseconds.
    pub fn target_delay_time_ms(&self) -> f32 {
        self.delay_time_smoother.target()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn prepared(raw: RawParameters) -> SmoothedParameterSet {
        let mut params = SmoothedParameterSet::new(EngineConfig::default());
        params.on_stream_start(SAMPLE_RATE);
        params.on_stream_reset(raw);
        params
    }

    #[test]
    fn test_reset_snaps_to_targets() {
        let raw = RawParameters {
            gain_db: -6.0,
            delay_time_ms: 250.0,
            mix_percent: 40.0,
            ..RawParameters::default()
        };
        let mut params = prepared(raw);

        let expected_gain = util::db_to_gain(-6.0);
        assert_eq!(params.gain(), expected_gain);
        assert_eq!(params.delay_time_ms(), 250.0);
        assert_eq!(params.mix(), 0.4);

        // The first advanced sample is still exactly on target: no sweep.
        params.on_block_start(raw);
        params.advance();
        assert_eq!(params.gain(), expected_gain);
        assert_eq!(params.delay_time_ms(), 250.0);
        assert_eq!(params.mix(), 0.4);
    }

    #[test]
    fn test_block_start_converts_units() {
        let mut params = prepared(RawParameters::default());
        params.on_block_start(RawParameters {
            gain_db: 12.0,
            delay_time_ms: 1_000.0,
            mix_percent: 25.0,
            ..RawParameters::default()
        });

        // 20 ms at 48 kHz is 960 samples for the linear smoothers.
        for _ in 0..960 {
            params.advance();
        }
        assert!((params.gain() - 3.981_072).abs() < 1e-4, "gain {}", params.gain());
        assert_eq!(params.mix(), 0.25);
        assert_eq!(params.target_delay_time_ms(), 1_000.0);
        // Delay time is still gliding after 20 ms with a 200 ms constant.
        assert!(params.delay_time_ms() > 100.0 && params.delay_time_ms() < 1_000.0);
    }

    #[test]
    fn test_delay_time_converges_after_five_time_constants() {
        let mut params = prepared(RawParameters::default());
        params.on_block_start(RawParameters {
            delay_time_ms: 600.0,
            ..RawParameters::default()
        });

        let five_tau = (5.0 * 0.2 * SAMPLE_RATE) as usize;
        for _ in 0..five_tau {
            params.advance();
        }
        let remaining = 600.0 - params.delay_time_ms();
        assert!(remaining >= 0.0 && remaining < 500.0 * 0.0075, "remaining {remaining}");
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = prepared(RawParameters {
            gain_db: 40.0,
            delay_time_ms: 0.0,
            mix_percent: 180.0,
            ..RawParameters::default()
        });

        assert!((params.gain() - util::db_to_gain(12.0)).abs() < 1e-6);
        assert_eq!(params.delay_time_ms(), 5.0);
        assert_eq!(params.mix(), 1.0);

        let params = prepared(RawParameters {
            gain_db: -100.0,
            delay_time_ms: 90_000.0,
            mix_percent: -3.0,
            ..RawParameters::default()
        });
        assert!((params.gain() - util::db_to_gain(-12.0)).abs() < 1e-6);
        assert_eq!(params.delay_time_ms(), 5_000.0);
        assert_eq!(params.mix(), 0.0);
    }

    /// Repeating the same raw values every block must not restart the
    /// linear ramps.
    #[test]
    fn test_unchanged_block_values_keep_ramping() {
        let mut params = prepared(RawParameters::default());
        let raw = RawParameters {
            mix_percent: 0.0,
            ..RawParameters::default()
        };

        // Twenty blocks of 48 samples cover the full 960-sample ramp.
        for _ in 0..20 {
            params.on_block_start(raw);
            for _ in 0..48 {
                params.advance();
            }
        }
        assert_eq!(params.mix(), 0.0);
    }

    /// Gain ramps in a straight line, never passes its target, and sits
    /// exactly on it once the 960-sample ramp is over.
    #[test]
    fn test_gain_ramp_is_monotonic_and_lands_exactly() {
        let mut params = prepared(RawParameters::default());
        params.on_block_start(RawParameters {
            gain_db: -12.0,
            ..RawParameters::default()
        });

        let target = util::db_to_gain(-12.0);
        let mut previous = params.gain();
        for n in 0..960 {
            params.advance();
            let gain = params.gain();
            assert!(gain <= previous && gain >= target, "sample {n}: {gain}");
            previous = gain;
        }
        assert_eq!(params.gain(), target);

        params.advance();
        assert_eq!(params.gain(), target);
    }

    /// A new target mid-ramp continues from the current value instead of
    /// jumping back to where the old ramp started.
    #[test]
    fn test_retarget_mid_ramp_starts_from_current_value() {
        let mut params = prepared(RawParameters::default());
        params.on_block_start(RawParameters {
            mix_percent: 0.0,
            ..RawParameters::default()
        });
        for _ in 0..480 {
            params.advance();
        }
        let halfway = params.mix();
        assert!((halfway - 0.5).abs() < 1e-3, "mix {halfway}");

        params.on_block_start(RawParameters {
            mix_percent: 100.0,
            ..RawParameters::default()
        });
        params.advance();
        assert!(params.mix() > halfway && params.mix() < halfway + 0.01);

        for _ in 0..959 {
            params.advance();
        }
        assert_eq!(params.mix(), 1.0);
    }

    #[test]
    fn test_stream_start_at_new_rate_changes_ramp_length() {
        let mut params = prepared(RawParameters::default());
        params.on_stream_start(96_000.0);
        params.on_stream_reset(RawParameters::default());
        params.on_block_start(RawParameters {
            mix_percent: 0.0,
            ..RawParameters::default()
        });

        for _ in 0..960 {
            params.advance();
        }
        // Halfway through the 1920-sample ramp.
        assert!((params.mix() - 0.5).abs() < 1e-4, "mix {}", params.mix());
    }
}
