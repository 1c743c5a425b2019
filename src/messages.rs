//! Message definitions for communication between Python and Rust audio threads.
//!
//! This module defines the PCM buffer type shared by every part of the engine, plus the enums
//! that serve as the wire format for messages passed through the ring buffer between the
//! Python thread and the real-time audio thread.

use pyo3::prelude::*;
use std::fmt;
use std::sync::Arc;

/// Sample rate, channel count and bit depth of a PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// 16-bit signed PCM at the given rate and channel count.
    pub const fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
        }
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch@{} Hz/{}-bit",
            self.channels, self.sample_rate, self.bits_per_sample
        )
    }
}

/// Immutable interleaved 16-bit PCM audio.
///
/// Cloning is cheap: the samples live behind an `Arc`, so the key maps, the dispatcher and
/// every voice in the mixer share one allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub format: PcmFormat,
    pub samples: Arc<[i16]>,
}

impl PcmBuffer {
    pub fn new(format: PcmFormat, samples: Vec<i16>) -> Self {
        Self {
            format,
            samples: Arc::from(samples.into_boxed_slice()),
        }
    }

    /// A zero-filled buffer of `frames` frames.
    pub fn silent(format: PcmFormat, frames: usize) -> Self {
        Self::new(format, vec![0; frames * usize::from(format.channels)])
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        match self.format.channels {
            0 => 0,
            channels => self.samples.len() / usize::from(channels),
        }
    }

    #[cfg(test)]
    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }

    /// Samples of one channel, de-interleaved.
    #[cfg(test)]
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = i16> + '_ {
        let channels = usize::from(self.format.channels.max(1));
        self.samples.iter().skip(channel).step_by(channels).copied()
    }
}

/// Message that is emitted from the audio thread.
#[derive(Debug, Clone)]
#[pyclass]
pub enum AudioMessage {
    /// Response to a Ping message.
    Pong(),

    /// Indicates every voice was stopped.
    Stopped(),
}

/// Message that is emitted from the Python side.
#[derive(Debug, Clone)]
pub enum ControlMessage {
    /// Used for testing message passing functionality.
    Ping(),

    /// Start a new one-shot voice for the buffer.
    Play(PcmBuffer),

    /// Stop all currently active voices.
    StopAll(),
}

/// Events emitted while (re)loading the sample kit.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// A category's sample was decoded successfully.
    Loaded {
        category: String,
        path: String,
        frames: usize,
    },

    /// Loading failed; the category plays silence until a new sample loads.
    Error { category: String, error: String },
}
