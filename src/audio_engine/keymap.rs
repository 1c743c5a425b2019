//! Key-to-buffer maps.
//!
//! A map is built wholesale from an ordered symbol list and an ordered buffer list and never
//! mutated afterwards; reconfiguration builds a new map and swaps it in. All buffers of one map
//! share a single [`PcmFormat`], which is what lets the dispatcher play any of them on one
//! output stream.

use std::collections::HashMap;

use crate::audio_engine::errors::KeyMapError;
use crate::messages::{PcmBuffer, PcmFormat};

/// Read access to a built key map, as needed by the dispatcher.
pub trait KeyLookup {
    /// Buffer bound to `key`, if any.
    fn lookup(&self, key: char) -> Option<&PcmBuffer>;

    /// Format shared by every buffer of the map.
    fn format(&self) -> PcmFormat;

    /// Frame count of the first buffer, used to size the silent fallback.
    fn reference_frames(&self) -> usize;
}

/// Injective mapping from keyboard symbol to PCM buffer.
#[derive(Debug, Clone)]
pub struct KeyMap {
    symbols: Vec<char>,
    entries: HashMap<char, PcmBuffer>,
    format: PcmFormat,
    reference_frames: usize,
}

impl KeyMap {
    /// Zips `symbols` with `buffers` positionally.
    ///
    /// # Errors
    ///
    /// - [`KeyMapError::LengthMismatch`] when the lists differ in length
    /// - [`KeyMapError::Empty`] when there is nothing to map
    /// - [`KeyMapError::DuplicateSymbol`] when a symbol repeats
    /// - [`KeyMapError::FormatMismatch`] when the buffers do not share one format
    pub fn build(symbols: &[char], buffers: &[PcmBuffer]) -> Result<Self, KeyMapError> {
        if symbols.len() != buffers.len() {
            return Err(KeyMapError::LengthMismatch {
                symbols: symbols.len(),
                buffers: buffers.len(),
            });
        }

        let first = buffers.first().ok_or(KeyMapError::Empty)?;
        let format = first.format;

        let mut entries = HashMap::with_capacity(symbols.len());
        for (&symbol, buffer) in symbols.iter().zip(buffers) {
            if buffer.format != format {
                return Err(KeyMapError::FormatMismatch {
                    expected: format,
                    found: buffer.format,
                });
            }
            if entries.insert(symbol, buffer.clone()).is_some() {
                return Err(KeyMapError::DuplicateSymbol(symbol));
            }
        }

        Ok(Self {
            symbols: symbols.to_vec(),
            entries,
            format,
            reference_frames: first.frames(),
        })
    }

    /// Symbols in the order they were mapped.
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn contains(&self, key: char) -> bool {
        self.entries.contains_key(&key)
    }
}

impl KeyLookup for KeyMap {
    fn lookup(&self, key: char) -> Option<&PcmBuffer> {
        self.entries.get(&key)
    }

    fn format(&self) -> PcmFormat {
        self.format
    }

    fn reference_frames(&self) -> usize {
        self.reference_frames
    }
}

/// One of the two keyboard halves of the drum pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadGroup {
    A,
    B,
}

/// Two disjoint key groups triggering the same set of pad buffers.
///
/// Both groups hold clones of the same [`PcmBuffer`]s, so the sample data exists once.
#[derive(Debug, Clone)]
pub struct PadKeyMap {
    group_a: KeyMap,
    group_b: KeyMap,
}

impl PadKeyMap {
    /// Maps `buffers` onto both key groups.
    ///
    /// # Errors
    ///
    /// Any [`KeyMap::build`] error, or [`KeyMapError::DuplicateSymbol`] when the groups overlap.
    pub fn build(
        buffers: &[PcmBuffer],
        keys_a: &[char],
        keys_b: &[char],
    ) -> Result<Self, KeyMapError> {
        let group_a = KeyMap::build(keys_a, buffers)?;
        let group_b = KeyMap::build(keys_b, buffers)?;

        if let Some(&shared) = keys_b.iter().find(|&&key| group_a.contains(key)) {
            return Err(KeyMapError::DuplicateSymbol(shared));
        }

        Ok(Self { group_a, group_b })
    }

    /// Group containing `key`, if any.
    pub fn group_of(&self, key: char) -> Option<PadGroup> {
        if self.group_a.contains(key) {
            Some(PadGroup::A)
        } else if self.group_b.contains(key) {
            Some(PadGroup::B)
        } else {
            None
        }
    }

    pub fn group(&self, group: PadGroup) -> &KeyMap {
        match group {
            PadGroup::A => &self.group_a,
            PadGroup::B => &self.group_b,
        }
    }
}

impl KeyLookup for PadKeyMap {
    fn lookup(&self, key: char) -> Option<&PcmBuffer> {
        self.group(self.group_of(key)?).lookup(key)
    }

    fn format(&self) -> PcmFormat {
        self.group_a.format()
    }

    fn reference_frames(&self) -> usize {
        self.group_a.reference_frames()
    }
}
