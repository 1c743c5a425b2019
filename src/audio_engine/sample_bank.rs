//! Sample sets of the drum kit.
//!
//! Every category is a directory under the samples root holding candidate `.wav` files. One
//! candidate per category is active at a time. Loading problems never escape this module: they
//! are logged, queued as [`LoaderEvent::Error`] for the GUI, and the category plays silence
//! until a sample loads again.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::audio_engine::constants::FALLBACK_SAMPLE_FORMAT;
use crate::audio_engine::errors::{KeyMapError, SampleLoadError};
use crate::audio_engine::keymap::PadKeyMap;
use crate::audio_engine::sample_loader::{SampleLoader, clip_frames, list_candidates};
use crate::messages::{LoaderEvent, PcmBuffer, PcmFormat};

/// Candidate files and current selection of one category.
#[derive(Debug, Clone)]
pub struct SampleSet {
    pub category: String,
    pub candidates: Vec<PathBuf>,
    pub active: Option<PathBuf>,
    loaded: Option<PcmBuffer>,
}

/// Where the kit lives on disk and how long each clip is.
#[derive(Debug, Clone, PartialEq)]
pub struct KitConfig {
    pub samples_root: PathBuf,
    pub clip_duration: f64,
}

impl KitConfig {
    /// Rejects clip lengths that are not finite, not positive or above `CLIP_DURATION_MAX`.
    pub fn validate(&self) -> Result<(), SampleLoadError> {
        use crate::audio_engine::constants::CLIP_DURATION_MAX;

        let duration = self.clip_duration;
        if !duration.is_finite() || duration <= 0.0 || duration > CLIP_DURATION_MAX {
            return Err(SampleLoadError::InvalidClipDuration(duration));
        }
        Ok(())
    }
}

impl Default for KitConfig {
    fn default() -> Self {
        use crate::audio_engine::constants::{DEFAULT_CLIP_DURATION, DEFAULT_SAMPLES_DIR};

        Self {
            samples_root: PathBuf::from(DEFAULT_SAMPLES_DIR),
            clip_duration: DEFAULT_CLIP_DURATION,
        }
    }
}

/// The loaded drum kit: one sample set per category, in category order.
#[derive(Debug)]
pub struct SampleKit {
    config: KitConfig,
    loader: SampleLoader,
    sets: Vec<SampleSet>,
    events: VecDeque<LoaderEvent>,
}

impl SampleKit {
    /// Scans the category directories and loads the first candidate of each.
    pub fn open(config: KitConfig, categories: &[&str]) -> Self {
        let loader = SampleLoader::new(config.clip_duration);
        let sets = categories
            .iter()
            .map(|category| SampleSet {
                category: category.to_string(),
                candidates: Vec::new(),
                active: None,
                loaded: None,
            })
            .collect();

        let mut kit = Self {
            config,
            loader,
            sets,
            events: VecDeque::new(),
        };
        kit.rescan();
        kit.reload_all();
        kit
    }

    /// Category names in kit order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|set| set.category.as_str())
    }

    fn index_of(&self, category: &str) -> Result<usize, SampleLoadError> {
        self.sets
            .iter()
            .position(|set| set.category == category)
            .ok_or_else(|| SampleLoadError::UnknownCategory(category.to_string()))
    }

    /// The sample set of `category`.
    pub fn set(&self, category: &str) -> Result<&SampleSet, SampleLoadError> {
        Ok(&self.sets[self.index_of(category)?])
    }

    /// Re-lists the candidate files of every category.
    ///
    /// Active selections are kept even if their file disappeared; the next reload reports it.
    pub fn rescan(&mut self) {
        for index in 0..self.sets.len() {
            let dir = self.config.samples_root.join(&self.sets[index].category);
            match list_candidates(&dir) {
                Ok(candidates) => self.sets[index].candidates = candidates,
                Err(err) => {
                    self.sets[index].candidates.clear();
                    self.report_error(index, &err);
                }
            }
        }
    }

    /// Makes `path` the active sample of `category` and loads it right away.
    ///
    /// The pad maps are not touched; call [`SampleKit::pad_map`] after confirming.
    ///
    /// # Errors
    ///
    /// Only [`SampleLoadError::UnknownCategory`]; load failures are queued as events.
    pub fn select(&mut self, category: &str, path: &Path) -> Result<(), SampleLoadError> {
        let index = self.index_of(category)?;
        self.sets[index].active = Some(path.to_path_buf());
        self.load(index);
        Ok(())
    }

    /// Reloads the active sample of every category (the first candidate if none is active).
    pub fn reload_all(&mut self) {
        for index in 0..self.sets.len() {
            self.load(index);
        }
    }

    fn load(&mut self, index: usize) {
        let set = &self.sets[index];
        let path = match set.active.clone().or_else(|| set.candidates.first().cloned()) {
            Some(path) => path,
            None => {
                let err = SampleLoadError::NoCandidates {
                    category: set.category.clone(),
                };
                self.sets[index].loaded = None;
                self.report_error(index, &err);
                return;
            }
        };

        match self.loader.load(&path) {
            Ok(buffer) => {
                let set = &mut self.sets[index];
                log::info!(
                    "Loaded {} sample {} ({}, {} frames)",
                    set.category,
                    path.display(),
                    buffer.format,
                    buffer.frames()
                );
                self.events.push_back(LoaderEvent::Loaded {
                    category: set.category.clone(),
                    path: path.display().to_string(),
                    frames: buffer.frames(),
                });
                set.active = Some(path);
                set.loaded = Some(buffer);
            }
            Err(err) => {
                self.sets[index].active = Some(path);
                self.sets[index].loaded = None;
                self.report_error(index, &err);
            }
        }
    }

    fn report_error(&mut self, index: usize, err: &SampleLoadError) {
        let category = self.sets[index].category.clone();
        log::warn!("Failed to load {category} sample: {err}");
        self.events.push_back(LoaderEvent::Error {
            category,
            error: err.to_string(),
        });
    }

    /// Format shared by every pad buffer.
    pub fn format(&self) -> PcmFormat {
        self.loader
            .reference_format()
            .unwrap_or(FALLBACK_SAMPLE_FORMAT)
    }

    /// Frame count shared by every pad buffer.
    pub fn frames(&self) -> usize {
        self.loader.reference_frames().unwrap_or_else(|| {
            clip_frames(
                self.config.clip_duration,
                FALLBACK_SAMPLE_FORMAT.sample_rate,
            )
        })
    }

    /// Current buffer of `category`; silence if its sample failed to load.
    pub fn buffer(&self, category: &str) -> Result<PcmBuffer, SampleLoadError> {
        let set = self.set(category)?;
        Ok(set
            .loaded
            .clone()
            .unwrap_or_else(|| PcmBuffer::silent(self.format(), self.frames())))
    }

    /// Current buffers of every category, in kit order.
    pub fn buffers(&self) -> Vec<PcmBuffer> {
        let silence = PcmBuffer::silent(self.format(), self.frames());
        self.sets
            .iter()
            .map(|set| set.loaded.clone().unwrap_or_else(|| silence.clone()))
            .collect()
    }

    /// Builds fresh pad groups over the current buffers.
    pub fn pad_map(&self, keys_a: &[char], keys_b: &[char]) -> Result<PadKeyMap, KeyMapError> {
        PadKeyMap::build(&self.buffers(), keys_a, keys_b)
    }

    /// Next queued load notification.
    pub fn poll_event(&mut self) -> Option<LoaderEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::audio_engine::constants::{CATEGORIES, PAD_KEYS_A, PAD_KEYS_B};
    use crate::audio_engine::keymap::KeyLookup;
    use crate::audio_engine::testutil::{write_kit, write_pcm16_wav};

    fn config(root: &Path) -> KitConfig {
        KitConfig {
            samples_root: root.to_path_buf(),
            clip_duration: 0.01,
        }
    }

    fn drain(kit: &mut SampleKit) -> Vec<LoaderEvent> {
        std::iter::from_fn(|| kit.poll_event()).collect()
    }

    #[test]
    fn test_open_loads_first_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        write_pcm16_wav(&tmp.path().join("kicks").join("zzz.wav"), 2, 8_000, &[9; 8]).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);

        assert_eq!(kit.format(), PcmFormat::pcm16(8_000, 2));
        assert_eq!(kit.frames(), 80);
        let kicks = kit.set("kicks").unwrap();
        assert_eq!(kicks.candidates.len(), 2);
        assert!(kicks.active.as_ref().unwrap().ends_with("kicks.wav"));

        let events = drain(&mut kit);
        assert_eq!(events.len(), CATEGORIES.len());
        assert!(
            events
                .iter()
                .all(|e| matches!(e, LoaderEvent::Loaded { frames: 80, .. }))
        );
    }

    #[test]
    fn test_buffers_follow_category_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();

        let kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        let buffers = kit.buffers();

        for (index, buffer) in buffers.iter().enumerate() {
            assert_eq!(buffer.samples[0], index as i16 + 1);
            // Short files are padded with silence up to the clip length.
            assert_eq!(buffer.frames(), 80);
            assert_eq!(*buffer.samples.last().unwrap(), 0);
        }
    }

    #[test]
    fn test_missing_file_becomes_silence() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        drain(&mut kit);

        kit.select("toms", &tmp.path().join("toms").join("gone.wav"))
            .unwrap();

        let events = drain(&mut kit);
        assert!(matches!(
            &events[..],
            [LoaderEvent::Error { category, error }]
                if category == "toms" && error.contains("does not exist")
        ));

        let toms = kit.buffer("toms").unwrap();
        let claps = kit.buffer("claps").unwrap();
        assert!(toms.is_silent());
        assert_eq!(toms.format, claps.format);
        assert_eq!(toms.frames(), claps.frames());
    }

    #[test]
    fn test_corrupt_file_becomes_silence() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let bad = tmp.path().join("open").join("bad.wav");
        fs::write(&bad, b"garbage").unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        drain(&mut kit);
        kit.select("open", &bad).unwrap();

        assert!(matches!(&drain(&mut kit)[..], [LoaderEvent::Error { .. }]));
        assert!(kit.buffer("open").unwrap().is_silent());
    }

    #[test]
    fn test_mismatched_format_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let slow = tmp.path().join("snares").join("slow.wav");
        write_pcm16_wav(&slow, 2, 22_050, &[1; 8]).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        drain(&mut kit);
        kit.select("snares", &slow).unwrap();

        let events = drain(&mut kit);
        assert!(matches!(
            &events[..],
            [LoaderEvent::Error { error, .. }] if error.contains("does not match")
        ));
        assert!(kit.buffer("snares").unwrap().is_silent());
        assert_eq!(kit.format(), PcmFormat::pcm16(8_000, 2));
    }

    #[test]
    fn test_missing_category_dir() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        fs::remove_dir_all(tmp.path().join("percs")).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        let errors = drain(&mut kit)
            .into_iter()
            .filter(|e| matches!(e, LoaderEvent::Error { category, .. } if category == "percs"))
            .count();

        // One for the failed scan, one for having nothing to load.
        assert_eq!(errors, 2);
        assert!(kit.buffer("percs").unwrap().is_silent());
        assert_eq!(kit.buffers().len(), CATEGORIES.len());
    }

    #[test]
    fn test_empty_kit_uses_fallback_format() {
        let tmp = tempfile::tempdir().unwrap();
        let kit = SampleKit::open(config(tmp.path()), &CATEGORIES);

        assert_eq!(kit.format(), FALLBACK_SAMPLE_FORMAT);
        assert!(kit.buffers().iter().all(|b| b.is_silent()));
        assert!(kit.pad_map(&PAD_KEYS_A, &PAD_KEYS_B).is_ok());
    }

    #[test]
    fn test_select_then_reload_all() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();
        let alt = tmp.path().join("claps").join("alt.wav");
        write_pcm16_wav(&alt, 2, 8_000, &[42; 8]).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        kit.select("claps", &alt).unwrap();
        assert_eq!(kit.buffer("claps").unwrap().samples[0], 42);

        kit.reload_all();
        assert_eq!(kit.set("claps").unwrap().active.as_deref(), Some(alt.as_path()));
        assert_eq!(kit.buffer("claps").unwrap().samples[0], 42);
    }

    #[test]
    fn test_clip_duration_bounds() {
        use crate::audio_engine::constants::CLIP_DURATION_MAX;

        let tmp = tempfile::tempdir().unwrap();
        assert!(config(tmp.path()).validate().is_ok());
        assert!(KitConfig::default().validate().is_ok());

        for clip_duration in [0.0, -1.0, f64::NAN, CLIP_DURATION_MAX + 1.0, 1e12] {
            let config = KitConfig {
                clip_duration,
                ..config(tmp.path())
            };
            assert!(matches!(
                config.validate(),
                Err(SampleLoadError::InvalidClipDuration(_))
            ));
        }
    }

    #[test]
    fn test_unknown_category() {
        let tmp = tempfile::tempdir().unwrap();
        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);

        assert!(matches!(
            kit.select("cowbell", Path::new("x.wav")),
            Err(SampleLoadError::UnknownCategory(_))
        ));
        assert!(kit.buffer("cowbell").is_err());
    }

    #[test]
    fn test_pad_map_over_kit() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();

        let kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        let pads = kit.pad_map(&PAD_KEYS_A, &PAD_KEYS_B).unwrap();

        for (index, (a, b)) in PAD_KEYS_A.iter().zip(PAD_KEYS_B).enumerate() {
            assert_eq!(pads.lookup(*a).unwrap().samples[0], index as i16 + 1);
            assert_eq!(pads.lookup(b).unwrap().samples[0], index as i16 + 1);
        }
    }

    #[test]
    fn test_rescan_picks_up_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        write_kit(tmp.path()).unwrap();

        let mut kit = SampleKit::open(config(tmp.path()), &CATEGORIES);
        write_pcm16_wav(&tmp.path().join("toms").join("b.wav"), 2, 8_000, &[1; 8]).unwrap();
        kit.rescan();

        assert_eq!(kit.set("toms").unwrap().candidates.len(), 2);
    }
}
