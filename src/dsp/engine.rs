//! # Delay Engine
//!
//! Sequences the smoothed parameter set and the delay-mix stage:
//!
//! ```text
//! prepare(sr, max_block)        allocate, configure smoothers
//! reset(raw)                    snap smoothers, silence delay memory
//! per block:
//!   begin_block(raw)            new smoother targets
//!   process_block(left, right)  per sample: advance smoothers, then
//!                               delay-mix
//! ```
//!
//! Only `prepare()` allocates. Everything after it is safe to run on the
//! audio thread.

use nih_plug::prelude::*;

use super::delay_mix::DelayMixStage;
use super::smoothed_params::SmoothedParameterSet;
use super::{EngineConfig, RawParameters};

/// Where the engine is in its stream lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// No sample rate yet; nothing may be processed.
    Unprepared,
    /// Buffers allocated, smoothers not yet snapped to the parameters.
    Prepared,
    /// Ready for `begin_block()`/`process()`.
    Streaming,
}

pub struct DelayEngine {
    params: SmoothedParameterSet,
    stage: DelayMixStage,
    delay_enabled: bool,
    max_block_size: usize,
    state: StreamState,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DelayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            params: SmoothedParameterSet::new(config),
            stage: DelayMixStage::default(),
            delay_enabled: RawParameters::default().delay_enabled,
            max_block_size: 0,
            state: StreamState::Unprepared,
        }
    }

    /// Configure for a new stream: smoother ramps for `sample_rate` and
    /// delay memory for the configured maximum delay time.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        let max_delay_ms = self.params.config().max_delay_ms;

        self.params.on_stream_start(sample_rate);
        self.stage.prepare(sample_rate, max_delay_ms);
        self.max_block_size = max_block_size;
        self.state = StreamState::Prepared;

        nih_log!(
            "Delay engine prepared: {} Hz, max block {}, delay capacity {} samples",
            sample_rate,
            max_block_size,
            self.stage.capacity()
        );
    }

    /// Start (or restart) streaming from silence with the smoothers
    /// already sitting on `raw`.
    pub fn reset(&mut self, raw: RawParameters) {
        nih_debug_assert!(
            self.state != StreamState::Unprepared,
            "reset() called before prepare()"
        );

        self.params.on_stream_reset(raw);
        self.stage.reset();
        self.delay_enabled = raw.delay_enabled;
        self.state = StreamState::Streaming;
    }

    /// Read the block's parameter values. Call once before the block's
    /// sample loop.
    pub fn begin_block(&mut self, raw: RawParameters) {
        self.params.on_block_start(raw);
        self.delay_enabled = raw.delay_enabled;
    }

    /// Process one stereo sample.
    #[inline]
    pub fn process(&mut self, dry_left: f32, dry_right: f32) -> (f32, f32) {
        nih_debug_assert!(
            self.state == StreamState::Streaming,
            "process() called before prepare() and reset()"
        );

        self.params.advance();

        if self.delay_enabled {
            self.stage.process(dry_left, dry_right, self.params.controls())
        } else {
            self.stage
                .process_bypassed(dry_left, dry_right, self.params.gain())
        }
    }

    /// Process two equally long channel slices in place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        nih_debug_assert_eq!(left.len(), right.len());
        nih_debug_assert!(
            left.len() <= self.max_block_size,
            "block of {} samples exceeds the announced maximum {}",
            left.len(),
            self.max_block_size
        );

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process(*l, *r);
        }
    }

    /// How many samples of output remain audible after the input goes
    /// silent. Without feedback that is a single delay period.
    pub fn tail_samples(&self) -> u32 {
        if !self.delay_enabled || self.params.mix() <= 0.0 {
            return 0;
        }

        let longest_ms = self
            .params
            .delay_time_ms()
            .max(self.params.target_delay_time_ms());
        self.stage.delay_in_samples(longest_ms).ceil() as u32
    }

    pub fn smoothed_params(&self) -> &SmoothedParameterSet {
        &self.params
    }
}
