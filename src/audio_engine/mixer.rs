//! Real-time audio mixer implementation.
//!
//! This module provides the [`RtMixer`] struct which sums every playing
//! [`Voice`](crate::audio_engine::voice::Voice) into the device buffer.
//!
//! Voices are one-shot: a voice plays its [`PcmBuffer`] once and frees its slot. The pool has a
//! fixed number of slots so the audio callback never allocates; when all slots are busy the
//! voice that started first is replaced.
//!
//! Buffers of ended voices can be handed back through a retire queue so the last reference to
//! their samples is dropped outside the audio callback.

use crate::audio_engine::constants::MAX_VOICES;
use crate::audio_engine::voice::Voice;
use crate::messages::{PcmBuffer, PcmFormat};
use cpal::Sample;
use rtrb::Producer;

/// Outcome of starting a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStart {
    /// The voice took a free slot.
    Started,

    /// The pool was full; the oldest voice was replaced.
    Stole,

    /// The buffer's format does not match the mixer; nothing was started.
    Rejected,
}

/// Real-time mixer that owns the voice pool.
///
/// All operations are lock-free and never allocate once the mixer is built.
pub struct RtMixer {
    /// Format every played buffer must have; the output is interleaved in the same layout.
    format: PcmFormat,

    /// Active voices with MAX_VOICES slots.
    voices: [Option<Voice>; MAX_VOICES],

    /// Serial handed to the next started voice.
    next_serial: u64,

    /// Where the buffers of ended voices go; dropped in place when absent or full.
    retired: Option<Producer<PcmBuffer>>,
}

fn retire(retired: &mut Option<Producer<PcmBuffer>>, voice: Voice) {
    if let Some(producer) = retired {
        let _ = producer.push(voice.buffer);
    }
}

impl RtMixer {
    /// Creates a new RtMixer playing buffers of `format`.
    ///
    /// # Parameters
    ///
    /// - `format`: Format of the buffers and of the output stream
    ///
    /// # Returns
    ///
    /// A new `RtMixer` instance with no active voices.
    pub fn new(format: PcmFormat) -> Self {
        Self {
            format,
            voices: std::array::from_fn(|_| None),
            next_serial: 0,
            retired: None,
        }
    }

    /// Creates a mixer that pushes the buffers of ended voices into `retired`.
    pub fn with_retire_queue(format: PcmFormat, retired: Producer<PcmBuffer>) -> Self {
        Self {
            retired: Some(retired),
            ..Self::new(format)
        }
    }

    /// Starts a new voice playing `buffer` from its first frame.
    ///
    /// Buffers in another format are ignored and reported as [`VoiceStart::Rejected`].
    pub fn play(&mut self, buffer: PcmBuffer) -> VoiceStart {
        if buffer.format != self.format {
            return VoiceStart::Rejected;
        }

        let voice = Voice::new(buffer, self.next_serial);
        self.next_serial += 1;

        if let Some(slot) = self.voices.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(voice);
            return VoiceStart::Started;
        }

        let oldest = self
            .voices
            .iter_mut()
            .min_by_key(|slot| slot.as_ref().map_or(u64::MAX, |v| v.serial));
        if let Some(stolen) = oldest.and_then(|slot| slot.replace(voice)) {
            retire(&mut self.retired, stolen);
        }
        VoiceStart::Stole
    }

    /// Stops all active voices.
    pub fn stop_all(&mut self) {
        for slot in &mut self.voices {
            if let Some(voice) = slot.take() {
                retire(&mut self.retired, voice);
            }
        }
    }

    /// Number of voices currently playing.
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|slot| slot.is_some()).count()
    }

    /// Renders audio frames to the output buffer.
    ///
    /// Mixes all active voices into the output buffer, which must hold interleaved samples
    /// with the mixer's channel count. Voices that reach the end of their buffer are retired.
    pub fn render(&mut self, output: &mut [f32]) {
        output.fill(Sample::EQUILIBRIUM);

        let channels = usize::from(self.format.channels);
        if channels == 0 {
            return;
        }

        let frames = output.len() / channels;
        for slot in &mut self.voices {
            let Some(voice) = slot else {
                continue;
            };

            let count = frames.min(voice.remaining_frames());
            let start = voice.frame_pos * channels;
            let source = &voice.buffer.samples[start..start + count * channels];
            for (out, &sample) in output.iter_mut().zip(source) {
                *out += f32::from_sample(sample);
            }

            voice.frame_pos += count;
            if voice.is_finished() {
                if let Some(ended) = slot.take() {
                    retire(&mut self.retired, ended);
                }
            }
        }

        for sample in output.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    /// Gets the format this mixer plays.
    pub fn format(&self) -> PcmFormat {
        self.format
    }
}
