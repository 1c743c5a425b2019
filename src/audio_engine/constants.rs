//! Audio engine configuration constants and limits.

use crate::messages::PcmFormat;

/// Output format of every synthesized note (stereo, 16-bit, 44.1 kHz).
pub const SYNTH_FORMAT: PcmFormat = PcmFormat::pcm16(44_100, 2);

/// Semitone offsets of the scale steps, relative to the base frequency.
pub const SCALE_STEPS: [i32; 15] = [-5, -4, -3, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Keyboard row playing the scale steps, in step order.
pub const SYNTH_KEYS: [char; 15] = [
    'a', 's', 'e', 'd', 'r', 'f', 't', 'g', 'h', 'u', 'j', 'i', 'k', 'l', 'p',
];

/// Number of frames faded out at the end of every note.
pub const FADE_FRAMES: usize = 8000;

/// Fixed output gain applied after ring modulation.
pub const OUTPUT_GAIN: f64 = 0.1;

/// Index of the innermost FM term.
pub const FM_INDEX: f64 = 0.25;

/// Full-scale value used when quantizing to 16 bits.
pub const PCM16_SCALE: f64 = 32767.0;

/// Base frequencies offered by the octave spinner (Hz).
pub const BASE_FREQ_CHOICES: [f64; 3] = [110.0, 330.0, 550.0];

/// Note duration slider range (seconds).
pub const DURATION_MIN: f64 = 0.2;
pub const DURATION_MAX: f64 = 5.0;

/// Detune slider range (Hz).
pub const DETUNE_MIN: f64 = 0.0;
pub const DETUNE_MAX: f64 = 13.0;

/// Ramp slider range.
pub const RAMP_MIN: f64 = 0.0;
pub const RAMP_MAX: f64 = 2.0;

/// Delay slider range (samples).
pub const ROLL_MIN: usize = 0;
pub const ROLL_MAX: usize = 4000;

/// Sample categories, one sub-directory each under the samples root.
pub const CATEGORIES: [&str; 8] = [
    "claps", "closed", "cymbals", "percs", "kicks", "open", "toms", "snares",
];

const PADS_PER_GROUP: usize = CATEGORIES.len();

/// Left-hand pad group, in category order.
pub const PAD_KEYS_A: [char; PADS_PER_GROUP] = [' ', 'f', 'v', 'g', 'r', 'w', 's', 'd'];

/// Right-hand pad group, in category order.
pub const PAD_KEYS_B: [char; PADS_PER_GROUP] = ['b', 'j', 'n', 'h', 'u', 'i', 'k', 'm'];

/// File extension recognised as a sample candidate.
pub const SAMPLE_EXTENSION: &str = "wav";

/// Default samples root, relative to the working directory.
pub const DEFAULT_SAMPLES_DIR: &str = "samples";

/// Default length of every loaded sample clip (seconds).
pub const DEFAULT_CLIP_DURATION: f64 = 1.0;

/// Longest accepted sample clip (seconds).
pub const CLIP_DURATION_MAX: f64 = 10.0;

/// Format assumed for the silent pads when no sample could be loaded at all.
pub const FALLBACK_SAMPLE_FORMAT: PcmFormat = PcmFormat::pcm16(44_100, 2);

/// Maximum number of voices that can be active simultaneously.
pub const MAX_VOICES: usize = 64;

/// Capacity of the control and audio message queues.
pub const MESSAGE_QUEUE_CAPACITY: usize = 1024;

/// Frames per device callback requested from the audio backend.
pub const STREAM_BUFFER_FRAMES: u32 = 512;
