//! Backend response types and decoding.
//!
//! # Module Structure
//!
//! - [`engagement`] - Discussion message types ([`Engagement`], [`UserInfo`], [`Priority`])
//! - [`wrappers`] - Newtype wrappers for type-safe response extraction

mod engagement;
pub mod wrappers;

pub use engagement::{CreatedBy, Engagement, Interaction, NewEngagement, Priority, UserInfo};
pub use wrappers::*;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ai::{AgentConfig, BuilderResponse};
use crate::command::CommandKind;
use crate::error::{Error, Result};
use crate::health::HealthReport;
use crate::utils::decode_body;
use crate::voice::TranscriptionResult;

/// A raw HTTP response, independent of any HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// `Content-Type` header, if present
    pub content_type: Option<String>,
    /// Body bytes
    pub body: Bytes,
}

impl HttpResponse {
    /// A JSON response with the given status.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: Bytes::from(body.to_string()),
        }
    }

    /// A response with a raw text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            body: Bytes::from(body.into()),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded to text using the declared charset.
    pub fn text_body(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Backend responses
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Messages of a discussion, in backend order
    Discussion(Vec<Engagement>),

    /// The message that was posted
    Posted(Engagement),

    /// Configured AI agents
    Agents(Vec<AgentConfig>),

    /// One AI agent
    Agent(AgentConfig),

    /// Output of an AI builder generation
    Generation(BuilderResponse),

    /// Result of a voice transcription
    Transcription(TranscriptionResult),

    /// A service health report (also decoded from `503` responses)
    Health(HealthReport),

    /// Arbitrary JSON (preload routes)
    Json(Value),

    /// Backend error response.
    ///
    /// Use helper methods like `is_not_found()` or `is_unauthorized()` to
    /// check for specific conditions.
    Error {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
}

impl Response {
    /// Decode the response to a command of the given kind.
    ///
    /// Bodies may be bare or wrapped in `{success, data, error|message}`.
    /// Non-2xx statuses, and envelopes with `success: false`, become
    /// [`Response::Error`].
    pub fn parse(kind: CommandKind, response: &HttpResponse) -> Result<Self> {
        let text = response.text_body();
        let body: Option<Value> = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };

        if kind == CommandKind::HealthCheck {
            if let Some(report) = body
                .as_ref()
                .filter(|v| v.get("status").is_some())
                .and_then(|v| serde_json::from_value::<HealthReport>(unwrap_envelope(v.clone())).ok())
            {
                return Ok(Response::Health(report));
            }
        }

        if !response.is_success() {
            return Ok(Response::Error {
                status: response.status,
                message: error_message(body.as_ref(), &text, response.status),
            });
        }

        if let Some(Value::Object(map)) = &body {
            if map.get("success") == Some(&Value::Bool(false)) {
                return Ok(Response::Error {
                    status: response.status,
                    message: error_message(body.as_ref(), &text, response.status),
                });
            }
        }

        let data = match body {
            Some(value) => unwrap_envelope(value),
            None if text.trim().is_empty() => Value::Null,
            None => {
                return Err(Error::InvalidResponse(format!(
                    "Response body is not JSON: {}",
                    truncate(&text)
                )))
            }
        };

        match kind {
            CommandKind::ListDiscussion => Ok(Response::Discussion(decode(data, "discussion")?)),
            CommandKind::PostDiscussion => Ok(Response::Posted(decode(data, "engagement")?)),
            CommandKind::ListAgents => Ok(Response::Agents(decode(data, "agent list")?)),
            CommandKind::GetAgent => Ok(Response::Agent(decode(data, "agent")?)),
            CommandKind::Generate => Ok(Response::Generation(decode(data, "generation")?)),
            CommandKind::Transcribe => {
                Ok(Response::Transcription(decode(data, "transcription")?))
            }
            CommandKind::HealthCheck => Ok(Response::Health(decode(data, "health report")?)),
            CommandKind::Preload => Ok(Response::Json(data)),
        }
    }

    /// Convert an error response into [`Error::Http`].
    pub fn into_result(self) -> Result<Self> {
        match self {
            Response::Error { status, message } => Err(Error::Http { status, message }),
            other => Ok(other),
        }
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Get the status code if this is an error response.
    pub fn error_status(&self) -> Option<u16> {
        match self {
            Response::Error { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error message if this is an error response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Check if this is an authentication error (401).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Response::Error { status: 401, .. })
    }

    /// Check if this is an access denied error (403).
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Response::Error { status: 403, .. })
    }

    /// Check if this is a "not found" error (404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Response::Error { status: 404, .. })
    }

    /// Check if this is a server-side error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, Response::Error { status: 500..=599, .. })
    }
}

/// Strip a `{success, data}` envelope, if present
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Result<T> {
    serde_json::from_value(data).map_err(|e| Error::InvalidResponse(format!("Invalid {what}: {e}")))
}

/// Error text from `error` (string or `{message}`), then `message`, then the raw body
fn error_message(body: Option<&Value>, text: &str, status: u16) -> String {
    let from_json = body.and_then(|value| {
        let error = value.get("error");
        error
            .and_then(Value::as_str)
            .or_else(|| error.and_then(|e| e.get("message")).and_then(Value::as_str))
            .or_else(|| value.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });
    from_json
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let raw = text.trim();
            (!raw.is_empty() && body.is_none()).then(|| truncate(raw))
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
