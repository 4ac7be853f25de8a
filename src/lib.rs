//! # Learn Delay: A Smoothed Gain + Delay Plugin
//!
//! A stereo effect built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! for learning click-free parameter handling. Outputs Audio Unit (AUv2),
//! VST3 and CLAP formats from a single codebase.
//!
//! With the **Delay** switch off it is a plain output-gain plugin; with it
//! on, a delayed copy of the input is added on top of the dry signal.
//!
//! ## Signal Flow
//!
//! ```text
//!  host params ──► raw() ──► begin_block() ──► smoothers ──┐  (once per block)
//!                                                          │
//!                                   gain, delay time, mix  ▼  (every sample)
//! Input ──┬─────────────────────────────────────────────►(+)──► × gain ──► Output
//!         │                                               ▲
//!         └──► [Delay Line, fractional read] ──► × mix ───┘
//! ```

mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::delay_line::capacity_for;
use dsp::engine::DelayEngine;
use nih_plug::prelude::*;
use params::LearnDelayParams;

/// The plugin: host-facing parameters plus the audio-thread engine.
///
/// `params` is shared with the host and UI threads through the `Arc`;
/// `engine` is only ever touched from the audio thread (and from
/// `initialize()`/`reset()`, which the host never runs concurrently with
/// `process()`).
struct LearnDelay {
    params: Arc<LearnDelayParams>,
    engine: DelayEngine,
}

impl Default for LearnDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(LearnDelayParams::default()),
            engine: DelayEngine::default(),
        }
    }
}

impl Plugin for LearnDelay {
    const NAME: &'static str = "Learn Delay";
    const VENDOR: &'static str = "Learn Delay";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // The engine is built around a fixed left/right pair, so stereo is the
    // only layout offered.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block and smoothed by the engine.
    // Splitting blocks at automation points would only add smoother
    // retargets with no audible benefit.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay memory and configure the smoothers for the
    /// host's sample rate.
    ///
    /// Returns `false` (the host then refuses the configuration) if the
    /// sample rate can't size a delay buffer.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        let max_delay_ms = self.engine.smoothed_params().config().max_delay_ms;

        if !sample_rate.is_finite() || capacity_for(max_delay_ms, sample_rate) == 0 {
            nih_error!("Cannot run at a sample rate of {} Hz", sample_rate);
            return false;
        }

        self.engine
            .prepare(sample_rate, buffer_config.max_buffer_size as usize);
        self.engine.reset(self.params.raw());

        true
    }

    /// Called when playback (re)starts. Silences the delay memory and
    /// snaps the smoothers to the current knob positions so nothing fades
    /// or sweeps in.
    fn reset(&mut self) {
        self.engine.reset(self.params.raw());
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        self.engine.begin_block(self.params.raw());

        // The stereo-only layout guarantees exactly two channels.
        if let [left, right] = buffer.as_slice() {
            self.engine.process_block(left, right);
        }

        // Keep the host calling process() until the last echo has played.
        match self.engine.tail_samples() {
            0 => ProcessStatus::Normal,
            tail => ProcessStatus::Tail(tail),
        }
    }
}

impl ClapPlugin for LearnDelay {
    const CLAP_ID: &'static str = "com.learn-delay.learn-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Output gain with a smoothed, fractional dry/wet delay");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
        ClapFeature::Utility,
    ];
}

impl Vst3Plugin for LearnDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"LearnDelayGainV1";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(LearnDelay);
nih_export_vst3!(LearnDelay);

// AUv2 entry point for Logic Pro, wrapped around the CLAP export.
clap_wrapper::export_auv2!();
