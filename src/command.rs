//! Backend command types and request encoding.

use bytes::Bytes;
use serde_json::Value;

use crate::ai::{BuilderRequest, RenderedRoute, RouteMethod};
use crate::error::{Error, Result};
use crate::response::NewEngagement;
use crate::voice::TranscriptionRequest;

/// Commands that can be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List the discussion attached to a record
    ListDiscussion(DiscussionQuery),

    /// Post a message (or reply) to a record's discussion
    PostDiscussion {
        /// Schema of the record
        schema_id: String,
        /// Record id
        instance_id: String,
        /// The message to post
        engagement: NewEngagement,
    },

    /// List configured AI agents
    ListAgents,

    /// Fetch one AI agent by id
    GetAgent(String),

    /// Run an AI builder generation
    Generate(BuilderRequest),

    /// Transcribe recorded audio
    Transcribe(TranscriptionRequest),

    /// Query a service health endpoint (absolute URL or backend path)
    HealthCheck {
        /// Health API location
        url: String,
    },

    /// Fetch a rendered preload route
    Preload(RenderedRoute),
}

/// Discriminant of a [`Command`], used to decode its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// [`Command::ListDiscussion`]
    ListDiscussion,
    /// [`Command::PostDiscussion`]
    PostDiscussion,
    /// [`Command::ListAgents`]
    ListAgents,
    /// [`Command::GetAgent`]
    GetAgent,
    /// [`Command::Generate`]
    Generate,
    /// [`Command::Transcribe`]
    Transcribe,
    /// [`Command::HealthCheck`]
    HealthCheck,
    /// [`Command::Preload`]
    Preload,
}

/// Selects the discussion of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionQuery {
    /// Schema of the record
    pub reference_schema_id: String,
    /// Record id
    pub reference_instance_id: String,
    /// Viewer, so the backend can report read state
    pub current_user_id: Option<String>,
}

impl DiscussionQuery {
    /// Query the discussion of a record.
    pub fn new(schema_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            reference_schema_id: schema_id.into(),
            reference_instance_id: instance_id.into(),
            current_user_id: None,
        }
    }

    /// Set the viewing user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.current_user_id = Some(user_id.into());
        self
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

impl Method {
    /// Method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name
    pub name: String,
    /// File name, for file parts
    pub file_name: Option<String>,
    /// Content type, for file parts
    pub content_type: Option<String>,
    /// Part contents
    pub data: Bytes,
}

impl MultipartPart {
    /// A plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// A file field.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: Some(content_type.into()),
            data,
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    /// No body
    Empty,
    /// JSON document
    Json(Value),
    /// Multipart form
    Multipart(Vec<MultipartPart>),
}

/// An encoded request, independent of any HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method
    pub method: Method,
    /// Path relative to the backend base URL, or an absolute URL
    pub path: String,
    /// Query parameters in order
    pub query: Vec<(String, String)>,
    /// Body
    pub body: HttpBody,
}

impl HttpRequest {
    fn get(path: String) -> Self {
        Self {
            method: Method::Get,
            path,
            query: Vec::new(),
            body: HttpBody::Empty,
        }
    }

    fn post(path: String, body: HttpBody) -> Self {
        Self {
            method: Method::Post,
            path,
            query: Vec::new(),
            body,
        }
    }

    /// Path with the url-encoded query appended.
    pub fn path_and_query(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.path)
    }
}

impl Command {
    /// The command's kind.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::ListDiscussion(_) => CommandKind::ListDiscussion,
            Command::PostDiscussion { .. } => CommandKind::PostDiscussion,
            Command::ListAgents => CommandKind::ListAgents,
            Command::GetAgent(_) => CommandKind::GetAgent,
            Command::Generate(_) => CommandKind::Generate,
            Command::Transcribe(_) => CommandKind::Transcribe,
            Command::HealthCheck { .. } => CommandKind::HealthCheck,
            Command::Preload(_) => CommandKind::Preload,
        }
    }

    /// Encode the command as an HTTP request.
    pub fn encode(&self) -> Result<HttpRequest> {
        let request = match self {
            Command::ListDiscussion(query) => {
                validate_parameter(&query.reference_schema_id)?;
                validate_parameter(&query.reference_instance_id)?;
                let mut request = HttpRequest::get("/api/engagements/discussion".to_string());
                request.query.push((
                    "referenceSchemaId".to_string(),
                    query.reference_schema_id.clone(),
                ));
                request.query.push((
                    "referenceInstanceId".to_string(),
                    query.reference_instance_id.clone(),
                ));
                if let Some(user) = &query.current_user_id {
                    validate_parameter(user)?;
                    request
                        .query
                        .push(("currentUserId".to_string(), user.clone()));
                }
                request
            }
            Command::PostDiscussion {
                schema_id,
                instance_id,
                engagement,
            } => {
                validate_segment(schema_id)?;
                validate_segment(instance_id)?;
                if engagement.message.trim().is_empty() {
                    return Err(Error::InvalidCommand(
                        "Message cannot be empty".to_string(),
                    ));
                }
                HttpRequest::post(
                    format!("/api/data/{schema_id}/{instance_id}/engagements/discussion"),
                    HttpBody::Json(serde_json::to_value(engagement)?),
                )
            }
            Command::ListAgents => HttpRequest::get("/api/ai-agents".to_string()),
            Command::GetAgent(id) => {
                validate_segment(id)?;
                HttpRequest::get(format!("/api/ai-agents/{id}"))
            }
            Command::Generate(request) => {
                validate_parameter(&request.agent_id)?;
                if request.user_prompt.trim().is_empty() {
                    return Err(Error::InvalidCommand("Prompt cannot be empty".to_string()));
                }
                HttpRequest::post(
                    "/api/ai-builder".to_string(),
                    HttpBody::Json(serde_json::to_value(request)?),
                )
            }
            Command::Transcribe(request) => HttpRequest::post(
                "/api/ai-builder/voice-transcription".to_string(),
                HttpBody::Multipart(request.parts()?),
            ),
            Command::HealthCheck { url } => {
                validate_parameter(url)?;
                HttpRequest::get(url.clone())
            }
            Command::Preload(route) => {
                validate_parameter(&route.path)?;
                if !route.path.starts_with('/') {
                    return Err(Error::InvalidCommand(format!(
                        "Preload route must be a backend path: {}",
                        route.path
                    )));
                }
                let mut request = match (route.method, &route.body) {
                    (RouteMethod::Get, _) => HttpRequest::get(route.path.clone()),
                    (RouteMethod::Post, Some(body)) => {
                        HttpRequest::post(route.path.clone(), HttpBody::Json(body.clone()))
                    }
                    (RouteMethod::Post, None) => {
                        HttpRequest::post(route.path.clone(), HttpBody::Empty)
                    }
                };
                request.query = route.query.clone();
                request
            }
        };
        Ok(request)
    }
}

/// Validate that a parameter is non-empty and has no control characters
fn validate_parameter(param: &str) -> Result<()> {
    if param.trim().is_empty() {
        return Err(Error::InvalidCommand(
            "Parameters cannot be empty".to_string(),
        ));
    }
    if param.chars().any(char::is_control) {
        return Err(Error::InvalidCommand(
            "Parameters cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// Validate a single path segment
fn validate_segment(segment: &str) -> Result<()> {
    validate_parameter(segment)?;
    if segment.contains(['/', '?', '#']) || segment == "." || segment == ".." {
        return Err(Error::InvalidCommand(format!(
            "Invalid path segment: {segment}"
        )));
    }
    Ok(())
}
