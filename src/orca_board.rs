//! OrcaBoard: the keyboard synthesizer session.
//!
//! [`SynthSession`] owns the current synthesis parameters and the dispatcher over the rendered
//! note bank; [`OrcaBoard`] exposes it to Python with the device stream as its sink.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::audio_engine::audio_stream::AudioStreamHandle;
use crate::audio_engine::constants::{
    BASE_FREQ_CHOICES, DETUNE_MAX, DETUNE_MIN, DURATION_MAX, DURATION_MIN, RAMP_MAX, RAMP_MIN,
    ROLL_MAX, ROLL_MIN, SYNTH_FORMAT, SYNTH_KEYS,
};
use crate::audio_engine::dispatcher::{Dispatcher, Trigger};
use crate::audio_engine::errors::{PlaybackError, SessionError};
use crate::audio_engine::keymap::{KeyLookup, KeyMap};
use crate::audio_engine::sink::OutputSink;
use crate::audio_engine::synth::{SynthParams, generate};
use crate::messages::{AudioMessage, PcmBuffer};
use crate::session::{parse_key, to_pyarray};

/// Synth bank plus the dispatcher that plays it.
pub struct SynthSession<S> {
    params: SynthParams,
    dispatcher: Dispatcher<KeyMap, S>,
}

fn build_map(params: &SynthParams) -> Result<KeyMap, SessionError> {
    let bank = generate(params)?;
    Ok(KeyMap::build(&SYNTH_KEYS, &bank)?)
}

impl<S: OutputSink> SynthSession<S> {
    /// Renders the bank for `params`; no sink is attached yet.
    pub fn new(params: SynthParams) -> Result<Self, SessionError> {
        let map = build_map(&params)?;
        Ok(Self {
            params,
            dispatcher: Dispatcher::new(map),
        })
    }

    pub fn params(&self) -> SynthParams {
        self.params
    }

    /// Re-renders the whole bank and swaps it in.
    ///
    /// On error the previous bank and parameters stay active.
    pub fn regenerate(&mut self, params: SynthParams) -> Result<(), SessionError> {
        let map = build_map(&params)?;
        self.dispatcher.replace_map(map)?;
        self.params = params;
        Ok(())
    }

    pub fn attach(&mut self, sink: S) -> Result<(), SessionError> {
        Ok(self.dispatcher.attach(sink)?)
    }

    pub fn detach(&mut self) -> Option<S> {
        self.dispatcher.detach()
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.is_running()
    }

    pub fn sink(&self) -> Option<&S> {
        self.dispatcher.sink()
    }

    pub fn key_down(&mut self, key: char) -> Result<Trigger, SessionError> {
        Ok(self.dispatcher.trigger(key)?)
    }

    pub fn stop_all(&mut self) -> Result<(), SessionError> {
        Ok(self.dispatcher.stop_all()?)
    }

    /// Bound keys in scale order.
    pub fn keys(&self) -> &[char] {
        self.dispatcher.map().symbols()
    }

    /// Rendered note bound to `key`.
    pub fn note(&self, key: char) -> Option<&PcmBuffer> {
        self.dispatcher.map().lookup(key)
    }
}

/// Keyboard synthesizer exposed to Python.
#[pyclass]
pub struct OrcaBoard {
    session: SynthSession<AudioStreamHandle>,
}

impl OrcaBoard {
    fn stream(&self) -> PyResult<&AudioStreamHandle> {
        self.session
            .sink()
            .ok_or_else(|| SessionError::from(PlaybackError::NotRunning).into())
    }
}

#[pymethods]
impl OrcaBoard {
    /// Create a synth with the default bank.
    #[new]
    pub fn new() -> PyResult<Self> {
        Ok(OrcaBoard {
            session: SynthSession::new(SynthParams::default())?,
        })
    }

    /// Render a new bank and bind it to the keys.
    #[pyo3(signature = (duration=1.0, detune=5.0, base_freq=110.0, ramp=0.5, delay=0))]
    pub fn generate(
        &mut self,
        duration: f64,
        detune: f64,
        base_freq: f64,
        ramp: f64,
        delay: usize,
    ) -> PyResult<()> {
        self.session.regenerate(SynthParams {
            base_freq,
            detune,
            duration,
            ramp,
            roll: delay,
        })?;
        Ok(())
    }

    /// Current synthesis parameters.
    pub fn params<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let params = self.session.params();
        let dict = PyDict::new(py);
        dict.set_item("duration", params.duration)?;
        dict.set_item("detune", params.detune)?;
        dict.set_item("base_freq", params.base_freq)?;
        dict.set_item("ramp", params.ramp)?;
        dict.set_item("delay", params.roll)?;
        Ok(dict)
    }

    /// Open the default output device and start playing.
    pub fn run(&mut self) -> PyResult<()> {
        if self.session.is_running() {
            return Err(PyRuntimeError::new_err("OrcaBoard already running"));
        }

        let handle = AudioStreamHandle::open(SYNTH_FORMAT).map_err(SessionError::from)?;
        self.session.attach(handle)?;
        Ok(())
    }

    /// Stop every voice and close the stream.
    pub fn shut_down(&mut self) -> PyResult<()> {
        if let Some(mut handle) = self.session.detach() {
            if let Err(err) = handle.stop_all() {
                log::warn!("Failed to stop voices on shutdown: {err}");
            }
        }
        Ok(())
    }

    /// Play the note bound to `key`; returns whether the key was bound.
    pub fn key_down(&mut self, key: &str) -> PyResult<bool> {
        let trigger = self.session.key_down(parse_key(key)?)?;
        Ok(trigger == Trigger::Mapped)
    }

    /// Stop playback of all active voices.
    pub fn stop_all(&mut self) -> PyResult<()> {
        self.session.stop_all()?;
        Ok(())
    }

    /// Base frequencies offered as octave choices.
    #[staticmethod]
    pub fn base_freq_choices() -> Vec<f64> {
        BASE_FREQ_CHOICES.to_vec()
    }

    /// GUI slider ranges as `{name: (min, max)}`.
    #[staticmethod]
    pub fn slider_ranges(py: Python<'_>) -> PyResult<Bound<'_, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("duration", (DURATION_MIN, DURATION_MAX))?;
        dict.set_item("detune", (DETUNE_MIN, DETUNE_MAX))?;
        dict.set_item("ramp", (RAMP_MIN, RAMP_MAX))?;
        dict.set_item("delay", (ROLL_MIN, ROLL_MAX))?;
        Ok(dict)
    }

    /// Key symbols in scale order.
    pub fn keys(&self) -> Vec<char> {
        self.session.keys().to_vec()
    }

    /// The note bound to `key` as an `int16` array, or `None`.
    pub fn note<'py>(
        &self,
        py: Python<'py>,
        key: &str,
    ) -> PyResult<Option<Bound<'py, numpy::PyArray2<i16>>>> {
        self.session
            .note(parse_key(key)?)
            .map(|buffer| to_pyarray(py, buffer))
            .transpose()
    }

    /// Send a ping message to the audio thread.
    pub fn ping(&mut self) -> PyResult<()> {
        self.stream()?.ping().map_err(SessionError::from)?;
        Ok(())
    }

    /// Receive a message from the audio thread.
    pub fn receive_msg(&mut self) -> PyResult<Option<AudioMessage>> {
        Ok(self.stream()?.receive().map_err(SessionError::from)?)
    }
}
