//! Audio-specific error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::messages::PcmFormat;

/// Errors raised by the waveform synthesizer.
#[derive(Debug, Error, PartialEq)]
pub enum SynthError {
    /// A synthesis parameter is out of its domain.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
}

/// Errors that can occur while loading audio files.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    /// The sample file does not exist.
    #[error("the file at {} does not exist", path.display())]
    FileMissing {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Failed to open or list a file or directory.
    #[error("failed to open file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the audio file.
    #[error("failed to decode audio file {}: {source}", path.display())]
    Decode {
        /// File being decoded.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: symphonia::core::errors::Error,
    },

    /// Audio file has no default track.
    #[error("audio file has no default track")]
    NoDefaultTrack,

    /// Audio file is missing sample rate information.
    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    /// Audio file is missing channel information.
    #[error("audio file is missing channel information")]
    MissingChannels,

    /// Only mono and stereo samples can be played.
    #[error("unsupported channel count: {channels} (only mono and stereo are supported)")]
    UnsupportedChannels {
        /// Number of channels in the file.
        channels: usize,
    },

    /// Only 16-bit samples can be played.
    #[error("unsupported bit depth: {bits} (only 16-bit PCM is supported)")]
    UnsupportedBitDepth {
        /// Bits per sample in the file.
        bits: u32,
    },

    /// The file's format differs from the samples already loaded.
    #[error("sample format {found} does not match the loaded kit format {expected}")]
    FormatMismatch {
        /// Format every sample must share.
        expected: PcmFormat,
        /// Format of the rejected file.
        found: PcmFormat,
    },

    /// The category directory holds no sample files.
    #[error("no .wav samples found for category `{category}`")]
    NoCandidates {
        /// Category that was scanned.
        category: String,
    },

    /// The clip length is not a positive number of seconds within the accepted maximum.
    #[error("invalid clip duration: {0} s")]
    InvalidClipDuration(f64),

    /// The category is not part of the kit.
    #[error("unknown sample category `{0}`")]
    UnknownCategory(String),
}

/// Errors raised while building a key-to-buffer map.
#[derive(Debug, Error, PartialEq)]
pub enum KeyMapError {
    /// Symbol and buffer lists have different lengths.
    #[error("{symbols} symbols cannot map onto {buffers} buffers")]
    LengthMismatch {
        /// Number of symbols supplied.
        symbols: usize,
        /// Number of buffers supplied.
        buffers: usize,
    },

    /// A symbol appears more than once.
    #[error("symbol {0:?} is mapped more than once")]
    DuplicateSymbol(char),

    /// No buffers to map.
    #[error("cannot build an empty key map")]
    Empty,

    /// Buffers of different formats cannot share a dispatcher.
    #[error("buffer format {found} does not match {expected}")]
    FormatMismatch {
        /// Format of the first buffer.
        expected: PcmFormat,
        /// Format of the offending buffer.
        found: PcmFormat,
    },
}

/// Errors raised while submitting audio to the output sink.
#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    /// No output stream is attached.
    #[error("audio engine not initialized")]
    NotRunning,

    /// The control queue to the audio thread is full.
    #[error("failed to send message - buffer may be full")]
    QueueFull,

    /// The buffer's format differs from the one the sink was opened with.
    #[error("buffer format {found} does not match output format {expected}")]
    FormatMismatch {
        /// Format the sink plays.
        expected: PcmFormat,
        /// Format of the rejected buffer.
        found: PcmFormat,
    },

    /// The audio device or stream failed.
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Any failure of a toy session operation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    SampleLoad(#[from] SampleLoadError),

    #[error(transparent)]
    KeyMap(#[from] KeyMapError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
