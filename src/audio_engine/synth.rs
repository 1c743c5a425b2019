//! Waveform synthesizer for the keyboard synth.
//!
//! Every note is a detuned, three-level FM sine whose inner modulation depth follows a
//! logarithmic ramp over the note's duration. The dry carrier also ring-modulates the sum of
//! the carrier and its detuned copy, which gives the characteristic beating tone. A full bank
//! holds one pre-rendered stereo note per scale step, so triggering a key never synthesizes
//! anything on the fly.

use std::f64::consts::PI;

use crate::audio_engine::channels::{interleave, roll};
use crate::audio_engine::constants::{
    DURATION_MAX, FADE_FRAMES, FM_INDEX, OUTPUT_GAIN, PCM16_SCALE, SCALE_STEPS, SYNTH_FORMAT,
};
use crate::audio_engine::errors::SynthError;
use crate::messages::PcmBuffer;

/// Parameters of one bank generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthParams {
    /// Frequency of scale step 0 (Hz).
    pub base_freq: f64,

    /// Offset added to the detuned carrier (Hz).
    pub detune: f64,

    /// Note length (seconds).
    pub duration: f64,

    /// Depth of the FM ramp.
    pub ramp: f64,

    /// Right-channel delay (samples, circular).
    pub roll: usize,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            base_freq: 110.0,
            detune: 5.0,
            duration: 1.0,
            ramp: 0.5,
            roll: 0,
        }
    }
}

impl SynthParams {
    /// Rejects parameters outside their domain.
    ///
    /// Base frequency and duration must be finite and positive, and the duration must cover at
    /// least one frame and stay within `DURATION_MAX`. Detune and ramp must be finite and
    /// non-negative.
    pub fn validate(&self) -> Result<(), SynthError> {
        let positive = [("base_freq", self.base_freq), ("duration", self.duration)];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SynthError::InvalidParameter { name, value });
            }
        }

        let non_negative = [("detune", self.detune), ("ramp", self.ramp)];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SynthError::InvalidParameter { name, value });
            }
        }

        if frame_count(self.duration) == 0 || self.duration > DURATION_MAX {
            return Err(SynthError::InvalidParameter {
                name: "duration",
                value: self.duration,
            });
        }

        Ok(())
    }
}

/// Frequency of the note `step` semitones away from `base_freq`.
pub fn step_frequency(base_freq: f64, step: i32) -> f64 {
    base_freq * 2f64.powf(f64::from(step) / 12.0)
}

/// Number of frames of a note lasting `duration` seconds.
pub fn frame_count(duration: f64) -> usize {
    (duration * f64::from(SYNTH_FORMAT.sample_rate)).round() as usize
}

/// `n` evenly spaced values from `start` to `end`, both inclusive.
fn linspace(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = if n > 1 {
        (end - start) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n).map(move |k| start + step * k as f64)
}

/// Gains of the end-of-note fade for a note of `frames` frames.
///
/// The fade covers the last `min(FADE_FRAMES, frames)` frames and falls linearly from 1 to
/// exactly 0 on the final frame.
pub fn fade_gains(frames: usize) -> Vec<f64> {
    match frames.min(FADE_FRAMES) {
        0 => Vec::new(),
        1 => vec![0.0],
        n => linspace(1.0, 0.0, n).collect(),
    }
}

/// One sample of the nested FM oscillator at phase `freq * x`.
fn oscillator(freq: f64, x: f64, ramp: f64) -> f64 {
    let phase = freq * x;
    (phase + ramp * (0.5 * phase + 0.5 * (FM_INDEX * phase).sin()).sin()).sin()
}

/// Scales to 16 bits, truncating toward zero.
fn quantize(value: f64) -> i16 {
    (value * PCM16_SCALE).clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

/// Time axis and ramp envelope shared by every note of one bank.
struct NoteGrid {
    x: Vec<f64>,
    ramp: Vec<f64>,
    fade: Vec<f64>,
}

impl NoteGrid {
    fn new(params: &SynthParams) -> Self {
        let frames = frame_count(params.duration);
        Self {
            x: linspace(0.0, 2.0 * PI * params.duration, frames).collect(),
            ramp: linspace(1.0, 0.0, frames)
                .map(|exp| 10f64.powf(exp) * params.ramp)
                .collect(),
            fade: fade_gains(frames),
        }
    }
}

/// Renders the note `step` semitones away from the base frequency.
fn render_step(params: &SynthParams, grid: &NoteGrid, step: i32) -> PcmBuffer {
    let freq = step_frequency(params.base_freq, step);
    let frames = grid.x.len();
    let fade_start = frames - grid.fade.len();

    let left: Vec<i16> = (0..frames)
        .map(|k| {
            let (x, ramp) = (grid.x[k], grid.ramp[k]);
            // The ring modulator is the dry carrier itself.
            let carrier = oscillator(freq, x, ramp);
            let detuned = oscillator(freq + params.detune, x, ramp);

            let mut value = (carrier + detuned) * (carrier / 2.0 + 0.5) * OUTPUT_GAIN;
            if k >= fade_start {
                value *= grid.fade[k - fade_start];
            }
            quantize(value)
        })
        .collect();

    let right = roll(&left, params.roll);
    PcmBuffer::new(SYNTH_FORMAT, interleave(&left, &right))
}

/// Renders one note per scale step, in step order.
///
/// # Errors
///
/// Returns [`SynthError::InvalidParameter`] when `params` fails [`SynthParams::validate`].
pub fn generate(params: &SynthParams) -> Result<Vec<PcmBuffer>, SynthError> {
    params.validate()?;

    let grid = NoteGrid::new(params);
    let bank: Vec<PcmBuffer> = SCALE_STEPS
        .iter()
        .map(|&step| render_step(params, &grid, step))
        .collect();

    log::info!(
        "Generated {} notes ({} frames, base {} Hz, detune {} Hz, ramp {}, delay {})",
        bank.len(),
        grid.x.len(),
        params.base_freq,
        params.detune,
        params.ramp,
        params.roll
    );

    Ok(bank)
}
