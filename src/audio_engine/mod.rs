//! Audio Engine Module
//!
//! This module provides buffer rendering, sample loading and real-time playback for both toys.
//! It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`audio_stream`]: CPAL audio stream management and real-time callback
//! - [`channels`]: Stereo rolling and interleaving
//! - [`constants`]: Configuration constants, key layouts and limits
//! - [`dispatcher`]: Key events to voices
//! - [`errors`]: Audio-specific error types
//! - [`keymap`]: Key-to-buffer maps and pad groups
//! - [`mixer`]: Real-time mixing engine
//! - [`sample_bank`]: Sample sets of the drum kit
//! - [`sample_loader`]: WAV decoding and the shared-format guard
//! - [`sink`]: Output sink abstraction
//! - [`synth`]: Waveform synthesizer
//! - [`voice`]: Voice management and lifecycle
//!
//! Nothing in here depends on Python; the pyo3 sessions in [`crate::orca_board`] and
//! [`crate::sea_turtle`] wrap these pieces for the GUI.

pub mod audio_stream;
pub mod channels;
pub mod constants;
pub mod dispatcher;
pub mod errors;
pub mod keymap;
pub mod mixer;
pub mod sample_bank;
pub mod sample_loader;
pub mod sink;
pub mod synth;
pub mod voice;

#[cfg(test)]
pub(crate) mod testutil;
