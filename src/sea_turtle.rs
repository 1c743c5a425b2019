//! SeaTurtle: the drum-pad session.
//!
//! [`KitSession`] ties the sample kit to a dispatcher over the two pad groups. Selecting a
//! sample reloads it at once (so it can be previewed), but the pads keep playing the old kit
//! until the selection is confirmed.

use std::path::{Path, PathBuf};

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::audio_engine::audio_stream::AudioStreamHandle;
use crate::audio_engine::constants::{CATEGORIES, PAD_KEYS_A, PAD_KEYS_B};
use crate::audio_engine::dispatcher::{Dispatcher, Trigger};
use crate::audio_engine::errors::{PlaybackError, SessionError};
use crate::audio_engine::keymap::{KeyLookup, PadGroup, PadKeyMap};
use crate::audio_engine::sample_bank::{KitConfig, SampleKit};
use crate::audio_engine::sink::OutputSink;
use crate::messages::{AudioMessage, LoaderEvent, PcmBuffer, PcmFormat};
use crate::session::{parse_key, to_pyarray};

/// Drum kit plus the dispatcher that plays its pads.
pub struct KitSession<S> {
    kit: SampleKit,
    dispatcher: Dispatcher<PadKeyMap, S>,
}

impl<S: OutputSink> KitSession<S> {
    /// Loads the kit under `config` and maps it onto both pad groups.
    pub fn new(config: KitConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let kit = SampleKit::open(config, &CATEGORIES);
        let pads = kit.pad_map(&PAD_KEYS_A, &PAD_KEYS_B)?;
        Ok(Self {
            kit,
            dispatcher: Dispatcher::new(pads),
        })
    }

    pub fn kit(&self) -> &SampleKit {
        &self.kit
    }

    /// Format of the buffers the pads currently play.
    pub fn format(&self) -> PcmFormat {
        self.dispatcher.map().format()
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

    pub fn rescan(&mut self) {
        self.kit.rescan();
    }

    /// Loads `path` as the sample of `category`; the pads are not remapped.
    pub fn select(&mut self, category: &str, path: &Path) -> Result<(), SessionError> {
        Ok(self.kit.select(category, path)?)
    }

    /// Plays the sample currently loaded for `category`, ignoring the pad maps.
    pub fn test_sample(&mut self, category: &str) -> Result<(), SessionError> {
        let buffer = self.kit.buffer(category)?;
        Ok(self.dispatcher.play(buffer)?)
    }

    /// Reloads every selected sample and remaps both pad groups.
    pub fn confirm_all(&mut self) -> Result<(), SessionError> {
        self.kit.reload_all();
        let pads = self.kit.pad_map(&PAD_KEYS_A, &PAD_KEYS_B)?;
        self.dispatcher.replace_map(pads)?;
        log::debug!("Pad groups rebuilt");
        Ok(())
    }

    /// Key symbols of one pad group, in category order.
    pub fn pad_keys(&self, group: PadGroup) -> &[char] {
        self.dispatcher.map().group(group).symbols()
    }

    /// Buffer the pad bound to `key` plays.
    pub fn pad(&self, key: char) -> Option<&PcmBuffer> {
        self.dispatcher.map().lookup(key)
    }

    pub fn poll_event(&mut self) -> Option<LoaderEvent> {
        self.kit.poll_event()
    }
}

/// Drum pads exposed to Python.
#[pyclass]
pub struct SeaTurtle {
    session: KitSession<AudioStreamHandle>,
}

impl SeaTurtle {
    fn stream(&self) -> PyResult<&AudioStreamHandle> {
        self.session
            .sink()
            .ok_or_else(|| SessionError::from(PlaybackError::NotRunning).into())
    }
}

#[pymethods]
impl SeaTurtle {
    /// Load the kit from `samples_root` (default `samples`).
    #[new]
    #[pyo3(signature = (samples_root=None, clip_duration=None))]
    pub fn new(samples_root: Option<PathBuf>, clip_duration: Option<f64>) -> PyResult<Self> {
        let mut config = KitConfig::default();
        if let Some(samples_root) = samples_root {
            config.samples_root = samples_root;
        }
        if let Some(clip_duration) = clip_duration {
            config.clip_duration = clip_duration;
        }

        Ok(SeaTurtle {
            session: KitSession::new(config)?,
        })
    }

    /// Open the default output device in the kit's format and start playing.
    pub fn run(&mut self) -> PyResult<()> {
        if self.session.is_running() {
            return Err(PyRuntimeError::new_err("SeaTurtle already running"));
        }

        let handle = AudioStreamHandle::open(self.session.format()).map_err(SessionError::from)?;
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

    /// Play the pad bound to `key`; returns whether the key was bound.
    pub fn key_down(&mut self, key: &str) -> PyResult<bool> {
        let trigger = self.session.key_down(parse_key(key)?)?;
        Ok(trigger == Trigger::Mapped)
    }

    /// Stop playback of all active voices.
    pub fn stop_all(&mut self) -> PyResult<()> {
        self.session.stop_all()?;
        Ok(())
    }

    /// Sample categories in pad order.
    pub fn categories(&self) -> Vec<String> {
        self.session.kit().categories().map(str::to_string).collect()
    }

    /// Candidate sample files of `category`, sorted.
    pub fn candidates(&self, category: &str) -> PyResult<Vec<PathBuf>> {
        let set = self
            .session
            .kit()
            .set(category)
            .map_err(SessionError::from)?;
        Ok(set.candidates.clone())
    }

    /// The selected sample file of `category`, if any.
    pub fn active(&self, category: &str) -> PyResult<Option<PathBuf>> {
        let set = self
            .session
            .kit()
            .set(category)
            .map_err(SessionError::from)?;
        Ok(set.active.clone())
    }

    /// Re-list the sample files of every category.
    pub fn rescan(&mut self) {
        self.session.rescan();
    }

    /// Select and load a sample for `category`; takes effect on the pads after `confirm_all`.
    pub fn select(&mut self, category: &str, path: PathBuf) -> PyResult<()> {
        self.session.select(category, &path)?;
        Ok(())
    }

    /// Preview the sample loaded for `category`.
    pub fn test_sample(&mut self, category: &str) -> PyResult<()> {
        self.session.test_sample(category)?;
        Ok(())
    }

    /// Reload every selected sample and rebind the pads.
    pub fn confirm_all(&mut self) -> PyResult<()> {
        self.session.confirm_all()?;
        Ok(())
    }

    /// Poll for pending sample load notifications.
    ///
    /// Returns `None` when no notifications are available.
    pub fn poll_notifications(&mut self, py: Python<'_>) -> PyResult<Option<Py<PyAny>>> {
        let Some(event) = self.session.poll_event() else {
            return Ok(None);
        };

        let dict = PyDict::new(py);
        match event {
            LoaderEvent::Loaded {
                category,
                path,
                frames,
            } => {
                dict.set_item("type", "loaded")?;
                dict.set_item("category", category)?;
                dict.set_item("path", path)?;
                dict.set_item("frames", frames)?;
            }
            LoaderEvent::Error { category, error } => {
                dict.set_item("type", "error")?;
                dict.set_item("category", category)?;
                dict.set_item("msg", error)?;
            }
        }

        Ok(Some(dict.into_any().unbind()))
    }

    /// All pad keys, group A followed by group B.
    pub fn keys(&self) -> Vec<char> {
        let (a, b) = self.pad_keys();
        a.into_iter().chain(b).collect()
    }

    /// The two pad key groups.
    pub fn pad_keys(&self) -> (Vec<char>, Vec<char>) {
        (
            self.session.pad_keys(PadGroup::A).to_vec(),
            self.session.pad_keys(PadGroup::B).to_vec(),
        )
    }

    /// The buffer bound to pad `key` as an `int16` array, or `None`.
    pub fn pad<'py>(
        &self,
        py: Python<'py>,
        key: &str,
    ) -> PyResult<Option<Bound<'py, numpy::PyArray2<i16>>>> {
        self.session
            .pad(parse_key(key)?)
            .map(|buffer| to_pyarray(py, buffer))
            .transpose()
    }

    /// The sample loaded for `category` as an `int16` array.
    pub fn sample<'py>(
        &self,
        py: Python<'py>,
        category: &str,
    ) -> PyResult<Bound<'py, numpy::PyArray2<i16>>> {
        let buffer = self
            .session
            .kit()
            .buffer(category)
            .map_err(SessionError::from)?;
        to_pyarray(py, &buffer)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::errors::SampleLoadError;
    use crate::audio_engine::mixer::RtMixer;
    use crate::audio_engine::testutil::{write_kit, write_pcm16_wav};

    fn session(root: &Path) -> KitSession<RtMixer> {
        let config = KitConfig {
            samples_root: root.to_path_buf(),
            clip_duration: 0.01,
        };
        let mut session = KitSession::new(config).unwrap();
        let format = session.format();
        session.attach(RtMixer::new(format)).unwrap();
        session
    }

    #[test]
    fn test_pads_play_category_samples() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let mut session = session(tmp.path());

        assert_eq!(session.pad(' ').unwrap().samples[0], 1);
        assert_eq!(session.pad('b').unwrap().samples[0], 1);
        assert_eq!(session.pad('d').unwrap().samples[0], 8);
        assert_eq!(session.pad('m').unwrap().samples[0], 8);

        assert_eq!(session.key_down('f').unwrap(), Trigger::Mapped);
        assert_eq!(session.key_down('j').unwrap(), Trigger::Mapped);
        assert_eq!(session.key_down('x').unwrap(), Trigger::Unmapped);
        assert_eq!(session.sink().unwrap().active_voices(), 3);
    }

    #[test]
    fn test_pad_groups_share_buffers() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let session = session(tmp.path());

        let pads = session.dispatcher.map();
        assert_eq!(pads.group_of('v'), Some(PadGroup::A));
        assert_eq!(pads.group_of('n'), Some(PadGroup::B));
        let a = session.pad('v').unwrap();
        let b = session.pad('n').unwrap();
        assert!(std::sync::Arc::ptr_eq(&a.samples, &b.samples));
    }

    #[test]
    fn test_select_waits_for_confirm() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let alt = tmp.path().join("kicks").join("alt.wav");
        write_pcm16_wav(&alt, 2, 8_000, &[77; 16]).unwrap();
        let mut session = session(tmp.path());

        // "kicks" is the fifth category, bound to 'r' and 'u'.
        session.select("kicks", &alt).unwrap();
        assert_eq!(session.kit().buffer("kicks").unwrap().samples[0], 77);
        assert_eq!(session.pad('r').unwrap().samples[0], 5);

        session.confirm_all().unwrap();
        assert_eq!(session.pad('r').unwrap().samples[0], 77);
        assert_eq!(session.pad('u').unwrap().samples[0], 77);
    }

    #[test]
    fn test_test_sample_plays_selection() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let mut session = session(tmp.path());

        session.test_sample("cymbals").unwrap();
        assert_eq!(session.sink().unwrap().active_voices(), 1);
        assert!(matches!(
            session.test_sample("cowbell"),
            Err(SessionError::SampleLoad(_))
        ));
    }

    #[test]
    fn test_failed_sample_plays_silence() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let mut session = session(tmp.path());
        while session.poll_event().is_some() {}

        session
            .select("snares", &tmp.path().join("snares").join("missing.wav"))
            .unwrap();
        session.confirm_all().unwrap();

        let snare = session.pad('d').unwrap();
        assert!(snare.is_silent());
        assert_eq!(snare.frames(), session.pad('s').unwrap().frames());
        assert_eq!(session.key_down('d').unwrap(), Trigger::Mapped);

        let errors: Vec<_> = std::iter::from_fn(|| session.poll_event())
            .filter(|e| matches!(e, LoaderEvent::Error { .. }))
            .collect();
        // Once on select, once more on confirm.
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_pad_keys_per_group() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let session = session(tmp.path());

        assert_eq!(session.pad_keys(PadGroup::A), &PAD_KEYS_A);
        assert_eq!(session.pad_keys(PadGroup::B), &PAD_KEYS_B);
    }

    #[test]
    fn test_rejects_oversized_clip() {
        let tmp = tempfile::tempdir().unwrap();
        let config = KitConfig {
            samples_root: tmp.path().to_path_buf(),
            clip_duration: 1e12,
        };

        assert!(matches!(
            KitSession::<RtMixer>::new(config),
            Err(SessionError::SampleLoad(SampleLoadError::InvalidClipDuration(_)))
        ));
    }

    #[test]
    fn test_stop_all_silences_pads() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let mut session = session(tmp.path());

        for key in PAD_KEYS_A {
            session.key_down(key).unwrap();
        }
        assert_eq!(session.sink().unwrap().active_voices(), PAD_KEYS_A.len());

        session.stop_all().unwrap();
        assert_eq!(session.sink().unwrap().active_voices(), 0);
    }
}
