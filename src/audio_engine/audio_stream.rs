//! Audio Stream Module
//!
//! This module handles CPAL audio stream management including:
//! - Stream initialization in the format of the buffers to play
//! - Audio callback setup
//! - Real-time message processing
//! - Error handling for audio stream operations

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::Mutex;

use crate::audio_engine::constants::{MESSAGE_QUEUE_CAPACITY, STREAM_BUFFER_FRAMES};
use crate::audio_engine::errors::PlaybackError;
use crate::audio_engine::mixer::RtMixer;
use crate::audio_engine::sink::OutputSink;
use crate::messages::{AudioMessage, ControlMessage, PcmBuffer, PcmFormat};

/// Handle to the audio stream with associated message channels
pub struct AudioStreamHandle {
    pub stream: Stream,
    pub producer: Mutex<Producer<ControlMessage>>,
    pub consumer: Mutex<Consumer<AudioMessage>>,
    pub retired: Mutex<Consumer<PcmBuffer>>,
    pub format: PcmFormat,
}

/// Setup and configure the logger for audio operations
pub fn setup_logger() {
    // Users can override via `RUST_LOG`, e.g. `RUST_LOG=debug` when troubleshooting.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Create and configure the audio stream
///
/// This function:
/// 1. Sets up the default audio device
/// 2. Configures the stream with the rate and channel count of `format`
/// 3. Creates ring buffers for message passing
/// 4. Initializes the mixer
/// 5. Builds and returns the audio stream
pub fn create_audio_stream(format: PcmFormat) -> Result<AudioStreamHandle, PlaybackError> {
    setup_logger();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PlaybackError::Stream("No audio device found".to_string()))?;

    log::info!("Starting audio stream... ({format})");

    // Create ring buffer for incoming messages (Python->Rust)
    let (producer_in, mut consumer_in) = RingBuffer::new(MESSAGE_QUEUE_CAPACITY);

    // Create ring buffer for outgoing messages (Rust->Python)
    let (mut producer_out, consumer_out) = RingBuffer::new(MESSAGE_QUEUE_CAPACITY);

    // Buffers of ended voices (Rust->Python), released outside the callback
    let (retired_producer, retired_consumer) = RingBuffer::new(MESSAGE_QUEUE_CAPACITY);

    let mut mixer = RtMixer::with_retire_queue(format, retired_producer);

    let stream_config = StreamConfig {
        channels: format.channels,
        sample_rate: format.sample_rate,
        buffer_size: BufferSize::Fixed(STREAM_BUFFER_FRAMES),
    };

    // Create audio stream with callback
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                // Process incoming messages in real-time
                while let Ok(message) = consumer_in.pop() {
                    match message {
                        ControlMessage::Ping() => {
                            let _ = producer_out.push(AudioMessage::Pong());
                        }
                        ControlMessage::Play(buffer) => {
                            mixer.play(buffer);
                        }
                        ControlMessage::StopAll() => {
                            mixer.stop_all();
                            let _ = producer_out.push(AudioMessage::Stopped());
                        }
                    }
                }

                // Render audio
                mixer.render(data);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| PlaybackError::Stream(format!("Failed to create audio stream: {e}")))?;

    Ok(AudioStreamHandle {
        stream,
        producer: Mutex::new(producer_in),
        consumer: Mutex::new(consumer_out),
        retired: Mutex::new(retired_consumer),
        format,
    })
}

/// Start playing the audio stream
pub fn start_stream(stream: &Stream) -> Result<(), PlaybackError> {
    stream
        .play()
        .map_err(|e| PlaybackError::Stream(format!("Failed to start audio stream: {e}")))
}

impl AudioStreamHandle {
    /// Opens the default device in `format` and starts it.
    pub fn open(format: PcmFormat) -> Result<Self, PlaybackError> {
        let handle = create_audio_stream(format)?;
        start_stream(&handle.stream)?;
        Ok(handle)
    }

    /// Drops the buffers the audio thread has finished with.
    fn release_retired(&self) {
        if let Ok(mut retired) = self.retired.lock() {
            while retired.pop().is_ok() {}
        }
    }

    fn send(&self, message: ControlMessage) -> Result<(), PlaybackError> {
        self.release_retired();

        let mut producer_guard = self
            .producer
            .lock()
            .map_err(|_| PlaybackError::Stream("Failed to acquire producer lock".to_string()))?;

        producer_guard
            .push(message)
            .map_err(|_| PlaybackError::QueueFull)
    }

    /// Send a ping message to the audio thread.
    pub fn ping(&self) -> Result<(), PlaybackError> {
        self.send(ControlMessage::Ping())
    }

    /// Receive a message from the audio thread.
    pub fn receive(&self) -> Result<Option<AudioMessage>, PlaybackError> {
        self.release_retired();

        let mut consumer_guard = self
            .consumer
            .lock()
            .map_err(|_| PlaybackError::Stream("Failed to acquire consumer lock".to_string()))?;

        Ok(consumer_guard.pop().ok())
    }
}

impl OutputSink for AudioStreamHandle {
    fn format(&self) -> PcmFormat {
        self.format
    }

    fn submit(&mut self, buffer: PcmBuffer) -> Result<(), PlaybackError> {
        if buffer.format != self.format {
            return Err(PlaybackError::FormatMismatch {
                expected: self.format,
                found: buffer.format,
            });
        }
        self.send(ControlMessage::Play(buffer))
    }

    fn stop_all(&mut self) -> Result<(), PlaybackError> {
        self.send(ControlMessage::StopAll())
    }
}
