//! Voice management for real-time audio mixing.
//!
//! This module provides the [`Voice`] struct which represents a single playing
//! PCM buffer with its current playback position.
//!
//! Voices are owned by the [`RtMixer`](crate::audio_engine::mixer::RtMixer). Every key press
//! starts a fresh one-shot voice that ends on its own once the buffer is exhausted.

use crate::messages::PcmBuffer;

/// A single voice in the mixer, representing one playing buffer.
#[derive(Debug)]
pub struct Voice {
    /// The buffer being played.
    pub buffer: PcmBuffer,

    /// Current playback position in frames.
    pub frame_pos: usize,

    /// Start order of the voice; lower values started earlier.
    pub serial: u64,
}

impl Voice {
    /// Creates a new voice positioned at the start of `buffer`.
    pub fn new(buffer: PcmBuffer, serial: u64) -> Self {
        Self {
            buffer,
            frame_pos: 0,
            serial,
        }
    }

    /// Frames left to play.
    pub fn remaining_frames(&self) -> usize {
        self.buffer.frames().saturating_sub(self.frame_pos)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining_frames() == 0
    }
}
