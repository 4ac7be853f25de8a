//! # DSP Core
//!
//! Everything that runs on the audio thread lives here. None of it knows
//! about the plugin API; the shell in `lib.rs` hands it plain numbers.
//!
//! - **`smoother`**: the one-pole delay-time smoother.
//! - **`smoothed_params`**: turns raw gain/delay/mix values into per-sample
//!   smoothed values.
//! - **`delay_line`**: a fractional circular buffer for one channel.
//! - **`delay_mix`**: the stereo dry/wet/gain stage built on two delay
//!   lines.
//! - **`engine`**: sequences the above once per block and once per sample.

pub mod delay_line;
pub mod delay_mix;
pub mod engine;
pub mod smoothed_params;
pub mod smoother;

/// A snapshot of the host-facing parameter values, in host units.
///
/// Taken once per block from the atomically stored plugin parameters, so
/// the audio loop never looks anything up by ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawParameters {
    /// Output gain in decibels, `[-12, 12]`.
    pub gain_db: f32,
    /// Delay time in milliseconds, `[5, 5000]`.
    pub delay_time_ms: f32,
    /// Dry/wet mix in percent, `[0, 100]`.
    pub mix_percent: f32,
    /// Whether the delay stage runs. Off turns the pipeline into a plain
    /// smoothed gain stage.
    pub delay_enabled: bool,
}

impl Default for RawParameters {
    fn default() -> Self {
        Self {
            gain_db: 0.0,
            delay_time_ms: 100.0,
            mix_percent: 100.0,
            delay_enabled: true,
        }
    }
}

/// Tuning constants for the smoothing and delay engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Ramp length of the linear gain and mix smoothers, in seconds.
    ///
    /// 0.02 s is 960 samples at 48 kHz: long enough to remove zipper
    /// noise, short enough not to be heard as a fade.
    pub ramp_seconds: f32,
    /// Time constant of the one-pole delay-time smoother, in seconds.
    pub delay_time_constant_seconds: f32,
    /// Shortest delay time the parameter can ask for, in milliseconds.
    pub min_delay_ms: f32,
    /// Longest delay time, in milliseconds. Sizes the delay buffers.
    pub max_delay_ms: f32,
    /// Quietest output gain, in decibels.
    pub min_gain_db: f32,
    /// Loudest output gain, in decibels.
    pub max_gain_db: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ramp_seconds: 0.02,
            delay_time_constant_seconds: 0.2,
            min_delay_ms: 5.0,
            max_delay_ms: 5000.0,
            min_gain_db: -12.0,
            max_gain_db: 12.0,
        }
    }
}

/// Replace subnormal floats with zero.
///
/// Recirculating audio (delay memory, stage output) that decays toward
/// zero can land in the subnormal range, where many CPUs slow down by orders of
/// magnitude.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.is_subnormal() {
        0.0
    } else {
        x
    }
}
