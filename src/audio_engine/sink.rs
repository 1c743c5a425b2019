//! Output sink abstraction.
//!
//! The dispatcher hands buffers to an [`OutputSink`] and never waits for them: each submission
//! becomes an independent voice owned by the sink. Two sinks exist: the device stream
//! ([`AudioStreamHandle`](crate::audio_engine::audio_stream::AudioStreamHandle)), which forwards
//! to a mixer on the audio thread, and the [`RtMixer`] itself, which mixes in-process and is
//! what offline rendering and the tests use.

use crate::audio_engine::errors::PlaybackError;
use crate::audio_engine::mixer::{RtMixer, VoiceStart};
use crate::messages::{PcmBuffer, PcmFormat};

/// Destination for triggered buffers.
pub trait OutputSink {
    /// Format the sink was opened with.
    fn format(&self) -> PcmFormat;

    /// Starts a new voice for `buffer` without blocking.
    fn submit(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError>;

    /// Terminates every voice immediately.
    fn stop_all(&mut self) -> Result<(), PlaybackError>;
}

impl OutputSink for RtMixer {
    fn format(&self) -> PcmFormat {
        RtMixer::format(self)
    }

    fn submit(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
        let found = buffer.format;
        match self.play(buffer) {
            VoiceStart::Started => Ok(()),
            VoiceStart::Stole => {
                log::debug!("Voice pool full, replaced the oldest voice");
                Ok(())
            }
            VoiceStart::Rejected => Err(PlaybackError::FormatMismatch {
                expected: RtMixer::format(self),
                found,
            }),
        }
    }

    fn stop_all(&mut self) -> Result<(), PlaybackError> {
        RtMixer::stop_all(self);
        Ok(())
    }
}
