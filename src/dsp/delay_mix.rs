//! # Delay-Mix Stage
//!
//! Mixes a fractionally delayed copy of the input back onto the dry
//! signal, then applies the output gain:
//!
//! ```text
//! dry ──┬───────────────────────────────────────►(+)──► × gain ──► out
//!       │                                         ▲
//!       └──► [delay line] ──► wet ──► × mix ──────┘
//! ```
//!
//! Note that the dry path is never attenuated: mix only controls how much
//! echo is *added*. At mix = 0 the stage is a pure gain stage.
//!
//! Both channels share one time base. Their write cursors move together
//! and they are always read at the same delay.

use super::delay_line::DelayLine;
use super::flush_denormal;

/// Per-sample control values, already smoothed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleControls {
    /// Delay time in milliseconds.
    pub delay_time_ms: f32,
    /// Wet amount, `[0, 1]`.
    pub mix: f32,
    /// Linear output gain.
    pub gain: f32,
}

/// Stereo dry/wet delay with output gain.
pub struct DelayMixStage {
    /// Left and right delay memory.
    lines: [DelayLine; 2],
    sample_rate: f32,
}

impl Default for DelayMixStage {
    fn default() -> Self {
        Self {
            // Zero-capacity placeholders until `prepare()` knows the rate.
            lines: [DelayLine::new(0), DelayLine::new(0)],
            sample_rate: 0.0,
        }
    }
}

impl DelayMixStage {
    /// Allocate delay memory for `max_delay_ms` at `sample_rate`.
    ///
    /// This is the only call that allocates; run it before streaming
    /// starts, never from the audio thread.
    pub fn prepare(&mut self, sample_rate: f32, max_delay_ms: f32) {
        self.sample_rate = sample_rate;
        self.lines = [
            DelayLine::for_max_delay(max_delay_ms, sample_rate),
            DelayLine::for_max_delay(max_delay_ms, sample_rate),
        ];
    }

    /// Silence both delay lines.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Longest delay the stage can produce, in samples.
    pub fn capacity(&self) -> usize {
        self.lines[0].capacity()
    }

    /// Convert a delay time to a (fractional) number of samples at the
    /// prepared sample rate.
    #[inline]
    pub fn delay_in_samples(&self, delay_time_ms: f32) -> f32 {
        calculate_delay_samples(delay_time_ms, self.sample_rate)
    }

    /// Process one stereo sample.
    ///
    /// For each channel: store the dry sample, fetch the wet sample
    /// `delay_time_ms` behind it, advance. The output is
    /// `(dry + wet * mix) * gain`.
    #[inline]
    pub fn process(
        &mut self,
        dry_left: f32,
        dry_right: f32,
        controls: SampleControls,
    ) -> (f32, f32) {
        // Recomputed every sample: the delay time is itself smoothed.
        let delay_samples = self.delay_in_samples(controls.delay_time_ms);

        let mut frame = [dry_left, dry_right];
        for (line, sample) in self.lines.iter_mut().zip(frame.iter_mut()) {
            let dry = *sample;
            line.write(dry);
            let wet = line.read(delay_samples);
            line.advance();

            *sample = flush_denormal((dry + wet * controls.mix) * controls.gain);
        }

        (frame[0], frame[1])
    }

    /// Gain-only path used while the delay is switched off.
    ///
    /// The dry signal is still recorded so that switching the delay back
    /// on plays recent input instead of whatever was left in the buffer.
    #[inline]
    pub fn process_bypassed(&mut self, dry_left: f32, dry_right: f32, gain: f32) -> (f32, f32) {
        for (line, dry) in self.lines.iter_mut().zip([dry_left, dry_right]) {
            line.write(dry);
            line.advance();
        }

        (
            flush_denormal(dry_left * gain),
            flush_denormal(dry_right * gain),
        )
    }
}

/// `delay_samples = delay_ms * sample_rate / 1000`
#[inline]
pub fn calculate_delay_samples(delay_ms: f32, sample_rate: f32) -> f32 {
    delay_ms * sample_rate / 1000.0
}
