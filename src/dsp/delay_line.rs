//! # Fractional Delay Line
//!
//! One channel of circular sample memory. The Delay-Mix Stage owns two of
//! these (left and right) and moves them in lock-step.
//!
//! ## Write first, then read
//!
//! Each sample the incoming dry value is stored at the write cursor
//! *before* the wet value is fetched. A delay of `0.0` samples therefore
//! reads back the sample that was just written, and a delay of `N` reads
//! the sample written `N` calls to [`advance()`](DelayLine::advance) ago:
//!
//! ```text
//!            write_pos
//!               │
//!   ... │ x[n-2] │ x[n-1] │ x[n] │ (older samples wrap around) ...
//!                     ▲      ▲
//!                delay 1   delay 0
//! ```
//!
//! ## Capacity and guard slots
//!
//! The line is sized for a maximum delay of `capacity` samples, but the
//! backing storage holds `capacity + 2` slots. Reading a fractional delay
//! `d` touches slots `floor(d)` and `floor(d) + 1` behind the cursor, so
//! the longest delay still has an older neighbour that was not just
//! overwritten by the current sample.
//!
//! ## Linear Interpolation
//!
//! ```text
//! result = newer * (1 - frac) + older * frac
//! ```

use nih_plug::prelude::*;

use super::flush_denormal;

/// Number of storage slots beyond the nominal capacity.
const GUARD_SLOTS: usize = 2;

/// A single-channel circular buffer with fractional, linearly
/// interpolated reads.
///
/// All memory is allocated in [`new()`](Self::new). Nothing in the
/// per-sample path allocates.
pub struct DelayLine {
    buffer: Vec<f32>,

    /// Slot that the next [`write()`](Self::write) stores into.
    write_pos: usize,

    /// Longest delay, in samples, that [`read()`](Self::read) serves
    /// without clamping.
    capacity: usize,
}

impl DelayLine {
    /// Create a silent delay line able to delay by up to `capacity`
    /// samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity + GUARD_SLOTS],
            write_pos: 0,
            capacity,
        }
    }

    /// Size a delay line for `max_delay_ms` at `sample_rate`.
    ///
    /// `capacity = ceil(max_delay_ms / 1000 * sample_rate)`
    pub fn for_max_delay(max_delay_ms: f32, sample_rate: f32) -> Self {
        Self::new(capacity_for(max_delay_ms, sample_rate))
    }

    /// The longest delay this line can produce, in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Store `sample` at the write cursor. Does not advance the cursor.
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = flush_denormal(sample);
    }

    /// Read the sample `delay_samples` behind the write cursor.
    ///
    /// Delays outside `[0, capacity]` are a caller error. Debug builds log
    /// the breach; the read position is clamped either way so the index
    /// can never leave the buffer.
    pub fn read(&self, delay_samples: f32) -> f32 {
        nih_debug_assert!(
            (0.0..=self.capacity as f32).contains(&delay_samples),
            "delay of {} samples exceeds capacity {}",
            delay_samples,
            self.capacity
        );

        let len = self.buffer.len();
        let delay = delay_samples.clamp(0.0, self.capacity as f32);

        let delay_int = delay as usize;
        let delay_frac = delay - delay_int as f32;

        // `len` is always greater than `delay_int + 1`, so adding it once
        // keeps the subtraction from underflowing.
        let newer = (self.write_pos + len - delay_int) % len;
        let older = (self.write_pos + len - delay_int - 1) % len;

        self.buffer[newer] * (1.0 - delay_frac) + self.buffer[older] * delay_frac
    }

    /// Move the write cursor one slot forward, wrapping at the end.
    pub fn advance(&mut self) {
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Fill the line with silence and rewind the cursor.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Samples needed to hold `max_delay_ms` of audio at `sample_rate`.
pub fn capacity_for(max_delay_ms: f32, sample_rate: f32) -> usize {
    ((f64::from(max_delay_ms) / 1000.0) * f64::from(sample_rate)).ceil() as usize
}
