//! Recording sessions over an exclusively owned microphone.

use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::{Error, Result};

use super::permission::MediaErrorKind;

/// A microphone the recorder can open and close.
///
/// `open` corresponds to requesting the device (and permission); `close`
/// must stop every track so the device indicator turns off.
pub trait AudioInput {
    /// Acquire the device.
    fn open(&mut self) -> std::result::Result<(), MediaErrorKind>;

    /// Stop all tracks. Must be safe to call when already closed.
    fn close(&mut self);

    /// MIME type of the produced audio, e.g. `audio/webm;codecs=opus`.
    fn mime_type(&self) -> &str;
}

/// Lifecycle state of a [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// Nothing recorded yet, device closed
    Idle,
    /// Device open, accepting audio
    Recording,
    /// Recording finished, device closed
    Stopped,
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAudio {
    /// Encoded audio
    pub data: Bytes,
    /// MIME type of `data`
    pub mime_type: String,
    /// Wall-clock length of the recording
    pub duration: Duration,
}

/// One recording session at a time over a single microphone.
///
/// The recorder owns its input, so no other session can hold the device.
/// Dropping the recorder closes the device.
#[derive(Debug)]
pub struct Recorder<I: AudioInput> {
    input: I,
    state: RecorderState,
    buffer: BytesMut,
    started_at: Option<Instant>,
}

impl<I: AudioInput> Recorder<I> {
    /// Create an idle recorder.
    pub fn new(input: I) -> Self {
        Self {
            input,
            state: RecorderState::Idle,
            buffer: BytesMut::new(),
            started_at: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Whether the device is open.
    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Open the device and start a new recording.
    ///
    /// Fails with [`Error::DeviceBusy`] while a recording is in progress, or
    /// with [`Error::Media`] when the device cannot be opened.
    pub fn start(&mut self, now: Instant) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(Error::DeviceBusy);
        }
        self.input.open().map_err(|kind| {
            debug!(error = kind.name(), "Failed to open microphone");
            Error::Media(kind)
        })?;
        self.buffer.clear();
        self.started_at = Some(now);
        self.state = RecorderState::Recording;
        Ok(())
    }

    /// Append an encoded audio chunk.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(Error::InvalidCommand("Recorder is not recording".to_string()));
        }
        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Stop recording, close the device and return the audio.
    ///
    /// An empty recording is an error; the device is closed either way.
    pub fn stop(&mut self, now: Instant) -> Result<RecordedAudio> {
        if self.state != RecorderState::Recording {
            return Err(Error::InvalidCommand("Recorder is not recording".to_string()));
        }
        self.input.close();
        self.state = RecorderState::Stopped;

        let duration = self
            .started_at
            .take()
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default();
        let data = self.buffer.split().freeze();
        if data.is_empty() {
            return Err(Error::InvalidCommand("No audio was recorded".to_string()));
        }

        Ok(RecordedAudio {
            data,
            mime_type: self.input.mime_type().to_string(),
            duration,
        })
    }

    /// Discard the current recording and close the device.
    pub fn cancel(&mut self) {
        if self.state == RecorderState::Recording {
            self.input.close();
        }
        self.buffer.clear();
        self.started_at = None;
        self.state = RecorderState::Idle;
    }
}

impl<I: AudioInput> Drop for Recorder<I> {
    fn drop(&mut self) {
        if self.state == RecorderState::Recording {
            self.input.close();
        }
    }
}
