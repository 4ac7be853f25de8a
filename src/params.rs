//! # Plugin Parameters
//!
//! The knobs the host sees. Each has a stable string ID used for preset
//! and automation recall (never change a published ID), a display name, a
//! range and a default.
//!
//! ## No framework smoothing
//!
//! Unlike most nih-plug plugins, none of these parameters carries a
//! `.with_smoother(...)`. The engine reads each value once per block and
//! smooths it itself (linear for gain and mix, one-pole for delay time),
//! so the values here are the raw targets.
//!
//! The values are stored atomically by nih-plug, so the UI/host threads
//! can write them while the audio thread reads them without locking.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::RawParameters;

#[derive(Params)]
pub struct LearnDelayParams {
    /// **Output Gain**, -12 dB to +12 dB, applied after the dry/wet sum.
    #[id = "gain"]
    pub gain: FloatParam,

    /// **Delay Time**, 5 ms to 5 s.
    ///
    /// Skewed so most of the knob travel covers the short times where a
    /// few milliseconds are clearly audible.
    #[id = "delayTime"]
    pub delay_time: FloatParam,

    /// **Mix**, 0% to 100%: how much delayed signal is added to the
    /// untouched dry signal.
    #[id = "mix"]
    pub mix: FloatParam,

    /// **Delay** on/off. Off leaves only the smoothed output gain.
    #[id = "delayOn"]
    pub delay_enabled: BoolParam,
}

impl Default for LearnDelayParams {
    fn default() -> Self {
        let defaults = RawParameters::default();

        Self {
            gain: FloatParam::new(
                "Output Gain",
                defaults.gain_db,
                FloatRange::Linear {
                    min: -12.0,
                    max: 12.0,
                },
            )
            .with_value_to_string(v2s_decibels())
            .with_string_to_value(s2v_decibels()),

            delay_time: FloatParam::new(
                "Delay Time",
                defaults.delay_time_ms,
                FloatRange::Skewed {
                    min: 5.0,
                    max: 5000.0,
                    // 2^-2 = 0.25: a quarter of the knob reaches ~25 ms,
                    // half reaches ~320 ms.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_step_size(0.001)
            .with_value_to_string(v2s_delay_time())
            .with_string_to_value(s2v_delay_time()),

            mix: FloatParam::new(
                "Mix",
                defaults.mix_percent,
                FloatRange::Linear {
                    min: 0.0,
                    max: 100.0,
                },
            )
            .with_step_size(1.0)
            .with_value_to_string(v2s_percent())
            .with_string_to_value(s2v_percent()),

            delay_enabled: BoolParam::new("Delay", defaults.delay_enabled),
        }
    }
}

impl LearnDelayParams {
    /// Read every parameter once, for the current block.
    pub fn raw(&self) -> RawParameters {
        RawParameters {
            gain_db: self.gain.value(),
            delay_time_ms: self.delay_time.value(),
            mix_percent: self.mix.value(),
            delay_enabled: self.delay_enabled.value(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Display formatting
// ─────────────────────────────────────────────────────────────────────

/// `-3.5 dB`
fn v2s_decibels() -> Arc<dyn Fn(f32) -> String + Send + Sync> {
    Arc::new(|value| format!("{value:.1} dB"))
}

fn s2v_decibels() -> Arc<dyn Fn(&str) -> Option<f32> + Send + Sync> {
    Arc::new(|string| {
        let string = string.trim();
        let number = string
            .strip_suffix("dB")
            .or_else(|| string.strip_suffix("db"))
            .unwrap_or(string);
        number.trim().parse().ok()
    })
}

/// Precision follows magnitude: `7.25 ms`, `42.5 ms`, `350 ms`, `1.20 s`.
fn v2s_delay_time() -> Arc<dyn Fn(f32) -> String + Send + Sync> {
    Arc::new(|ms| {
        if ms < 10.0 {
            format!("{ms:.2} ms")
        } else if ms < 100.0 {
            format!("{ms:.1} ms")
        } else if ms < 1000.0 {
            format!("{} ms", ms as i32)
        } else {
            format!("{:.2} s", ms * 0.001)
        }
    })
}

/// Accepts `250`, `250 ms` and `1.5 s`.
fn s2v_delay_time() -> Arc<dyn Fn(&str) -> Option<f32> + Send + Sync> {
    Arc::new(|string| {
        let string = string.trim();
        if let Some(ms) = string.strip_suffix("ms") {
            ms.trim().parse().ok()
        } else if let Some(seconds) = string.strip_suffix('s') {
            seconds.trim().parse::<f32>().ok().map(|s| s * 1000.0)
        } else {
            string.parse().ok()
        }
    })
}

/// `75 %`
fn v2s_percent() -> Arc<dyn Fn(f32) -> String + Send + Sync> {
    Arc::new(|value| format!("{} %", value as i32))
}

fn s2v_percent() -> Arc<dyn Fn(&str) -> Option<f32> + Send + Sync> {
    Arc::new(|string| {
        let string = string.trim();
        string.strip_suffix('%').unwrap_or(string).trim().parse().ok()
    })
}
