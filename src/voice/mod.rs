//! Voice input: microphone errors, recording sessions and transcription.

mod permission;
mod recorder;
mod transcription;

pub use permission::MediaErrorKind;
pub use recorder::{AudioInput, RecordedAudio, Recorder, RecorderState};
pub use transcription::{TranscriptionRequest, TranscriptionResult};
