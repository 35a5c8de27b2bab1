//! Voice transcription request and result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::MultipartPart;
use crate::error::{Error, Result};

use super::recorder::RecordedAudio;

/// Audio to transcribe, sent as a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    /// Recorded audio
    pub audio: RecordedAudio,
    /// Spoken language, e.g. `en` or `fa`
    pub language: String,
}

impl TranscriptionRequest {
    /// Create a request for recorded audio in the given language.
    pub fn new(audio: RecordedAudio, language: impl Into<String>) -> Self {
        Self {
            audio,
            language: language.into(),
        }
    }

    /// Upload file name, with an extension matching the MIME type.
    pub fn file_name(&self) -> String {
        format!("recording.{}", extension_for(&self.audio.mime_type))
    }

    /// Form parts: `file` then `language`.
    pub fn parts(&self) -> Result<Vec<MultipartPart>> {
        if self.audio.data.is_empty() {
            return Err(Error::InvalidCommand("Audio is empty".to_string()));
        }
        let language = self.language.trim();
        if language.is_empty() {
            return Err(Error::InvalidCommand("Language is required".to_string()));
        }
        Ok(vec![
            MultipartPart::file(
                "file",
                self.file_name(),
                self.audio.mime_type.clone(),
                self.audio.data.clone(),
            ),
            MultipartPart::text("language", language),
        ])
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/ogg" => "ogg",
        "audio/mp4" | "audio/x-m4a" | "audio/aac" => "m4a",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        _ => "webm",
    }
}

/// Result of a transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcribed text
    pub transcription: String,
    /// Provider usage report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    /// Estimated cost in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}
