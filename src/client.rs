//! Sans-IO Gradian client implementation.

use url::Url;

use crate::command::{CommandKind, HttpRequest};
use crate::config::ClientConfig;
use crate::response::HttpResponse;
use crate::{Command, Error, Response, Result};

/// Sans-IO Gradian client.
///
/// This client handles protocol logic without performing any I/O operations.
/// Users must send the encoded requests with an HTTP library of their choice
/// and feed the responses back. One request is in flight at a time.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    state: ClientState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClientState {
    /// No request in flight
    Ready,
    /// Waiting for the response to a command
    WaitingForResponse(CommandKind),
}

impl Client {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("Invalid base URL '{base_url}'")));
        }
        Ok(Self {
            base_url,
            state: ClientState::Ready,
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.base_url)
    }

    /// Backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Encode a command for transmission to the backend.
    ///
    /// Fails while a previous request is still pending; call
    /// [`abandon`](Self::abandon) first to give up on it.
    pub fn encode_command(&mut self, command: Command) -> Result<HttpRequest> {
        if let ClientState::WaitingForResponse(kind) = self.state {
            return Err(Error::InvalidCommand(format!(
                "A {kind:?} request is still pending"
            )));
        }

        let request = command.encode()?;
        self.state = ClientState::WaitingForResponse(command.kind());
        Ok(request)
    }

    /// Decode the response to the pending request.
    ///
    /// The client is ready again afterwards, even if decoding fails.
    pub fn decode_response(&mut self, response: &HttpResponse) -> Result<Response> {
        let ClientState::WaitingForResponse(kind) = self.state else {
            return Err(Error::InvalidResponse("No request is pending".to_string()));
        };
        self.state = ClientState::Ready;
        Response::parse(kind, response)
    }

    /// Give up on the pending request, returning its kind.
    ///
    /// A late response to an abandoned request must be discarded by the caller.
    pub fn abandon(&mut self) -> Option<CommandKind> {
        match std::mem::replace(&mut self.state, ClientState::Ready) {
            ClientState::WaitingForResponse(kind) => Some(kind),
            ClientState::Ready => None,
        }
    }

    /// Full URL of an encoded request.
    ///
    /// Absolute `http`/`https` URLs (e.g. external health endpoints) are used
    /// as is, whatever the scheme's case; anything else is appended to the
    /// base URL, keeping its path prefix.
    pub fn url_for(&self, request: &HttpRequest) -> Result<Url> {
        let target = request.path_and_query();
        match Url::parse(&target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Ok(url),
            Ok(url) => {
                return Err(Error::InvalidCommand(format!(
                    "Unsupported URL scheme '{}' in '{target}'",
                    url.scheme()
                )))
            }
            Err(url::ParseError::RelativeUrlWithoutBase) => {}
            Err(e) => {
                return Err(Error::InvalidCommand(format!("Invalid URL '{target}': {e}")))
            }
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let separator = if target.starts_with('/') { "" } else { "/" };
        Url::parse(&format!("{base}{separator}{target}"))
            .map_err(|e| Error::InvalidCommand(format!("Invalid path '{target}': {e}")))
    }

    /// Get the current client state.
    pub fn state(&self) -> &str {
        match self.state {
            ClientState::Ready => "ready",
            ClientState::WaitingForResponse(_) => "waiting",
        }
    }

    /// Check if the client is ready to send commands.
    pub fn is_ready(&self) -> bool {
        self.state == ClientState::Ready
    }

    /// Kind of the pending request, if any.
    pub fn pending(&self) -> Option<CommandKind> {
        match self.state {
            ClientState::WaitingForResponse(kind) => Some(kind),
            ClientState::Ready => None,
        }
    }
}
