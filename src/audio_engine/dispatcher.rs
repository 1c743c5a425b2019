//! Key-event playback dispatcher.
//!
//! The dispatcher turns key-down symbols into voices: it looks the symbol up in the current
//! key map and submits the bound buffer to the output sink. Symbols without a binding play a
//! silent buffer of the same shape, so every key press costs the same and always produces a
//! voice.
//!
//! Key maps are replaced, never edited: [`Dispatcher::replace_map`] swaps in a freshly built map
//! with a single assignment.

use crate::audio_engine::errors::PlaybackError;
use crate::audio_engine::keymap::KeyLookup;
use crate::audio_engine::sink::OutputSink;
use crate::messages::PcmBuffer;

/// What a trigger ended up playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The symbol's buffer.
    Mapped,

    /// The silent fallback; the symbol has no binding.
    Unmapped,
}

/// Routes key events to an output sink.
pub struct Dispatcher<M, S> {
    map: M,
    silence: PcmBuffer,
    sink: Option<S>,
}

impl<M: KeyLookup, S: OutputSink> Dispatcher<M, S> {
    /// Creates a dispatcher with no sink attached.
    pub fn new(map: M) -> Self {
        let silence = PcmBuffer::silent(map.format(), map.reference_frames());
        Self {
            map,
            silence,
            sink: None,
        }
    }

    /// Attaches the sink voices are submitted to.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::FormatMismatch`] when the sink plays another format than the map.
    pub fn attach(&mut self, sink: S) -> Result<(), PlaybackError> {
        if sink.format() != self.map.format() {
            return Err(PlaybackError::FormatMismatch {
                expected: sink.format(),
                found: self.map.format(),
            });
        }
        self.sink = Some(sink);
        Ok(())
    }

    /// Detaches and returns the sink.
    pub fn detach(&mut self) -> Option<S> {
        self.sink.take()
    }

    pub fn is_running(&self) -> bool {
        self.sink.is_some()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Swaps in a newly built key map.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::FormatMismatch`] when a sink is attached and plays another format than
    /// `map`; the current map stays in place.
    pub fn replace_map(&mut self, map: M) -> Result<(), PlaybackError> {
        if let Some(sink) = &self.sink {
            if sink.format() != map.format() {
                return Err(PlaybackError::FormatMismatch {
                    expected: sink.format(),
                    found: map.format(),
                });
            }
        }

        self.silence = PcmBuffer::silent(map.format(), map.reference_frames());
        self.map = map;
        log::debug!("Key map replaced");
        Ok(())
    }

    /// Plays the buffer bound to `key`, or silence when nothing is bound.
    ///
    /// Never blocks and never queues behind earlier voices: repeated triggers overlap.
    pub fn trigger(&mut self, key: char) -> Result<Trigger, PlaybackError> {
        let sink = self.sink.as_mut().ok_or(PlaybackError::NotRunning)?;
        match self.map.lookup(key) {
            Some(buffer) => {
                sink.submit(buffer.clone())?;
                Ok(Trigger::Mapped)
            }
            None => {
                sink.submit(self.silence.clone())?;
                Ok(Trigger::Unmapped)
            }
        }
    }

    /// Plays an arbitrary buffer, bypassing the key map.
    pub fn play(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
        self.sink
            .as_mut()
            .ok_or(PlaybackError::NotRunning)?
            .submit(buffer)
    }

    /// Stops every playing voice.
    pub fn stop_all(&mut self) -> Result<(), PlaybackError> {
        self.sink
            .as_mut()
            .ok_or(PlaybackError::NotRunning)?
            .stop_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_engine::constants::{SYNTH_FORMAT, SYNTH_KEYS};
    use crate::audio_engine::keymap::{KeyMap, PadKeyMap};
    use crate::audio_engine::mixer::RtMixer;
    use crate::audio_engine::synth::{SynthParams, generate};
    use crate::messages::PcmFormat;

    const FORMAT: PcmFormat = PcmFormat::pcm16(44_100, 2);

    fn buffer(value: i16, frames: usize) -> PcmBuffer {
        PcmBuffer::new(FORMAT, vec![value; frames * 2])
    }

    fn running(map: KeyMap) -> Dispatcher<KeyMap, RtMixer> {
        let mut dispatcher = Dispatcher::new(map);
        dispatcher.attach(RtMixer::new(FORMAT)).unwrap();
        dispatcher
    }

    fn render_first(dispatcher: &mut Dispatcher<KeyMap, RtMixer>) -> f32 {
        let mut output = vec![0.0; 2];
        dispatcher.sink.as_mut().unwrap().render(&mut output);
        output[0]
    }

    #[test]
    fn test_trigger_mapped_key() {
        let map = KeyMap::build(&['a', 's'], &[buffer(8_192, 10), buffer(0, 10)]).unwrap();
        let mut dispatcher = running(map);

        assert_eq!(dispatcher.trigger('a'), Ok(Trigger::Mapped));
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 1);
        assert!(render_first(&mut dispatcher) > 0.0);
    }

    #[test]
    fn test_trigger_unmapped_plays_silence() {
        let map = KeyMap::build(&['a'], &[buffer(8_192, 10)]).unwrap();
        let mut dispatcher = running(map);

        assert_eq!(dispatcher.trigger('z'), Ok(Trigger::Unmapped));
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 1);
        assert_eq!(render_first(&mut dispatcher), 0.0);
    }

    #[test]
    fn test_silence_matches_reference_shape() {
        let map = KeyMap::build(&['a'], &[buffer(1, 123)]).unwrap();
        let dispatcher: Dispatcher<KeyMap, RtMixer> = Dispatcher::new(map);

        assert_eq!(dispatcher.silence.format, FORMAT);
        assert_eq!(dispatcher.silence.frames(), 123);
        assert!(dispatcher.silence.is_silent());
    }

    #[test]
    fn test_repeated_triggers_overlap() {
        let map = KeyMap::build(&['a'], &[buffer(1, 100)]).unwrap();
        let mut dispatcher = running(map);

        for _ in 0..5 {
            dispatcher.trigger('a').unwrap();
        }
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 5);
    }

    #[test]
    fn test_stop_all_with_voices_in_flight() {
        let map = KeyMap::build(&['a', 's'], &[buffer(1, 100), buffer(2, 100)]).unwrap();
        let mut dispatcher = running(map);

        dispatcher.trigger('a').unwrap();
        dispatcher.trigger('s').unwrap();
        dispatcher.trigger('q').unwrap();
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 3);

        dispatcher.stop_all().unwrap();
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 0);
    }

    #[test]
    fn test_not_running_without_sink() {
        let map = KeyMap::build(&['a'], &[buffer(1, 10)]).unwrap();
        let mut dispatcher: Dispatcher<KeyMap, RtMixer> = Dispatcher::new(map);

        assert!(!dispatcher.is_running());
        assert_eq!(dispatcher.trigger('a'), Err(PlaybackError::NotRunning));
        assert_eq!(dispatcher.stop_all(), Err(PlaybackError::NotRunning));
    }

    #[test]
    fn test_attach_rejects_other_format() {
        let map = KeyMap::build(&['a'], &[buffer(1, 10)]).unwrap();
        let mut dispatcher = Dispatcher::new(map);

        let result = dispatcher.attach(RtMixer::new(PcmFormat::pcm16(22_050, 2)));
        assert!(matches!(result, Err(PlaybackError::FormatMismatch { .. })));
        assert!(!dispatcher.is_running());
    }

    #[test]
    fn test_replace_map() {
        let map = KeyMap::build(&['a'], &[buffer(1, 10)]).unwrap();
        let mut dispatcher = running(map);

        let replacement = KeyMap::build(&['b'], &[buffer(2, 20)]).unwrap();
        dispatcher.replace_map(replacement).unwrap();

        assert_eq!(dispatcher.trigger('a'), Ok(Trigger::Unmapped));
        assert_eq!(dispatcher.trigger('b'), Ok(Trigger::Mapped));
        assert_eq!(dispatcher.silence.frames(), 20);
    }

    #[test]
    fn test_replace_map_keeps_old_map_on_mismatch() {
        let map = KeyMap::build(&['a'], &[buffer(1, 10)]).unwrap();
        let mut dispatcher = running(map);

        let mono = PcmBuffer::silent(PcmFormat::pcm16(44_100, 1), 10);
        let replacement = KeyMap::build(&['b'], &[mono]).unwrap();
        assert!(dispatcher.replace_map(replacement).is_err());
        assert_eq!(dispatcher.trigger('a'), Ok(Trigger::Mapped));
    }

    #[test]
    fn test_pad_groups_trigger_same_buffer() {
        let buffers = [buffer(4_096, 10), buffer(8_192, 10)];
        let pads = PadKeyMap::build(&buffers, &['f', 'v'], &['j', 'n']).unwrap();
        let mut dispatcher = Dispatcher::new(pads);
        dispatcher.attach(RtMixer::new(FORMAT)).unwrap();

        assert_eq!(dispatcher.trigger('v'), Ok(Trigger::Mapped));
        assert_eq!(dispatcher.trigger('n'), Ok(Trigger::Mapped));
        assert_eq!(dispatcher.trigger('x'), Ok(Trigger::Unmapped));
        assert_eq!(dispatcher.sink().unwrap().active_voices(), 3);
    }

    #[test]
    fn test_synth_bank_end_to_end() {
        let params = SynthParams {
            duration: 0.2,
            ..SynthParams::default()
        };
        let bank = generate(&params).unwrap();
        let map = KeyMap::build(&SYNTH_KEYS, &bank).unwrap();
        let mut dispatcher = Dispatcher::new(map);
        dispatcher.attach(RtMixer::new(SYNTH_FORMAT)).unwrap();

        for key in SYNTH_KEYS {
            assert_eq!(dispatcher.trigger(key), Ok(Trigger::Mapped));
        }
        assert_eq!(dispatcher.sink().unwrap().active_voices(), SYNTH_KEYS.len());
    }
}
