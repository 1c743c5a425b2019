//! Audio file loading and decoding functionality.
//!
//! This module provides functions for discovering sample files on disk and decoding them into
//! fixed-length PCM buffers that can be handed to the mixer without further conversion.
//!
//! The engine never resamples or reformats: the first sample that loads successfully fixes the
//! kit format (rate, channels, bit depth) and every later file must match it.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio_engine::constants::SAMPLE_EXTENSION;
use crate::audio_engine::errors::SampleLoadError;
use crate::messages::{PcmBuffer, PcmFormat};

/// Lists the sample files of a category directory.
///
/// Files are recognised by their extension (case-insensitive) and returned in lexicographic
/// order, so the default pick does not depend on the platform's directory order.
///
/// # Errors
///
/// Returns [`SampleLoadError::FileMissing`] if `dir` does not exist and
/// [`SampleLoadError::Io`] if it cannot be read.
pub fn list_candidates(dir: &Path) -> Result<Vec<PathBuf>, SampleLoadError> {
    let entries = fs::read_dir(dir).map_err(|err| match err.kind() {
        ErrorKind::NotFound => SampleLoadError::FileMissing {
            path: dir.to_path_buf(),
        },
        _ => SampleLoadError::Io(err),
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_sample = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SAMPLE_EXTENSION));
        if is_sample && path.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Number of frames in a clip of `clip_duration` seconds at `sample_rate`.
pub fn clip_frames(clip_duration: f64, sample_rate: u32) -> usize {
    (clip_duration * f64::from(sample_rate)).round() as usize
}

/// Decodes the beginning of a 16-bit WAV file into a fixed-length PCM buffer.
///
/// Exactly `clip_frames(clip_duration, rate)` frames are produced: longer files are truncated
/// and shorter files are padded with silence. The rate used for the clip length is the one of
/// `expected` when given, otherwise the file's own.
///
/// # Parameters
///
/// - `path`: Path to the audio file to load
/// - `expected`: Format the file must have, if one is already established
/// - `clip_duration`: Length of the produced clip in seconds
///
/// # Errors
///
/// - [`SampleLoadError::FileMissing`] when the file does not exist
/// - [`SampleLoadError::Decode`] when the container or codec cannot be read
/// - [`SampleLoadError::UnsupportedChannels`] / [`SampleLoadError::UnsupportedBitDepth`] for
///   anything other than 16-bit mono or stereo
/// - [`SampleLoadError::FormatMismatch`] when the file differs from `expected`
pub fn decode_pcm16_clip(
    path: &Path,
    expected: Option<PcmFormat>,
    clip_duration: f64,
) -> Result<PcmBuffer, SampleLoadError> {
    let file = File::open(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => SampleLoadError::FileMissing {
            path: path.to_path_buf(),
        },
        _ => SampleLoadError::Io(err),
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let decode_error = |source| SampleLoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_error)?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();
    let bits = track.codec_params.bits_per_sample.unwrap_or(16);

    if !(1..=2).contains(&channels) {
        return Err(SampleLoadError::UnsupportedChannels { channels });
    }
    if bits != 16 {
        return Err(SampleLoadError::UnsupportedBitDepth { bits });
    }

    let found = PcmFormat::pcm16(sample_rate, channels as u16);
    if let Some(expected) = expected {
        if expected != found {
            return Err(SampleLoadError::FormatMismatch { expected, found });
        }
    }

    let wanted = clip_frames(clip_duration, found.sample_rate) * channels;
    let mut decoder = get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_error)?;

    let mut decoded: Vec<i16> = Vec::with_capacity(wanted);
    while decoded.len() < wanted {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => {
                break;
            }
            Err(err) => return Err(decode_error(err)),
        };

        let audio_buf = decoder.decode(&packet).map_err(decode_error)?;
        let spec = *audio_buf.spec();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<i16>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());
    }

    decoded.resize(wanted, 0);
    Ok(PcmBuffer::new(found, decoded))
}

/// Loads sample clips while keeping every clip in one shared format.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    clip_duration: f64,
    reference: Option<PcmFormat>,
}

impl SampleLoader {
    /// Creates a loader producing clips of `clip_duration` seconds.
    pub fn new(clip_duration: f64) -> Self {
        Self {
            clip_duration,
            reference: None,
        }
    }

    /// Format fixed by the first successful load, if any.
    pub fn reference_format(&self) -> Option<PcmFormat> {
        self.reference
    }

    /// Length of every clip in the reference format, if one is established.
    pub fn reference_frames(&self) -> Option<usize> {
        self.reference
            .map(|format| clip_frames(self.clip_duration, format.sample_rate))
    }

    /// Decodes `path`, fixing the reference format on the first success.
    pub fn load(&mut self, path: &Path) -> Result<PcmBuffer, SampleLoadError> {
        let buffer = decode_pcm16_clip(path, self.reference, self.clip_duration)?;
        if self.reference.is_none() {
            log::info!("Sample format fixed to {}", buffer.format);
            self.reference = Some(buffer.format);
        }
        Ok(buffer)
    }
}
