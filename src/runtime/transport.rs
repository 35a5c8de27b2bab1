//! Transport abstraction layer for HTTP integration.
//!
//! This module provides an `HttpTransport` trait that abstracts over HTTP
//! libraries. The sans-io [`Client`](crate::Client) produces
//! [`HttpRequest`]s; a transport delivers them and returns the raw
//! [`HttpResponse`].
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "reqwest-runtime")]
//! # {
//! use std::time::Duration;
//! use gradian_client::runtime::{HttpTransport, ReqwestTransport};
//! use gradian_client::{Client, Command};
//!
//! # #[tokio::main]
//! # async fn main() -> gradian_client::Result<()> {
//! let transport = ReqwestTransport::new(Duration::from_secs(60))?;
//! let mut client = Client::new("https://app.example.com")?;
//! let request = client.encode_command(Command::ListAgents)?;
//! let url = client.url_for(&request)?;
//! let response = transport.send(&url, &request).await?;
//! let agents = client.decode_response(&response)?;
//! # Ok(())
//! # }
//! # }
//! ```

use async_trait::async_trait;
use url::Url;

use crate::command::HttpRequest;
use crate::error::Result;
use crate::response::HttpResponse;

/// Delivers encoded requests to the backend.
///
/// # Bounds
///
/// Implementations must be `Send + Sync + 'static` so clients can be moved
/// into spawned tasks.
#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    /// Send a request and read the full response.
    ///
    /// Any HTTP status is a successful delivery; only failures to deliver
    /// (connection refused, timeout, ...) are errors, reported as
    /// [`Error::Transport`](crate::Error::Transport).
    async fn send(&self, url: &Url, request: &HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for std::sync::Arc<T> {
    async fn send(&self, url: &Url, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(url, request).await
    }
}

// ============================================================================
// Reqwest Implementation
// ============================================================================

/// A newtype wrapper around `reqwest::Client`.
///
/// This wrapper implements the `HttpTransport` trait for use with the tokio runtime.
#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
#[derive(Debug, Clone)]
pub struct ReqwestTransport(pub reqwest::Client);

#[cfg(feature = "reqwest-runtime")]
impl ReqwestTransport {
    /// Build a transport with a per-request timeout.
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::Error::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(ReqwestTransport(client))
    }
}

#[cfg(feature = "reqwest-runtime")]
fn multipart_form(parts: &[crate::command::MultipartPart]) -> Result<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        let mut field = reqwest::multipart::Part::bytes(part.data.to_vec());
        if let Some(file_name) = &part.file_name {
            field = field.file_name(file_name.clone());
        }
        if let Some(content_type) = &part.content_type {
            field = field.mime_str(content_type).map_err(|e| {
                crate::Error::InvalidCommand(format!("Invalid content type '{content_type}': {e}"))
            })?;
        }
        form = form.part(part.name.clone(), field);
    }
    Ok(form)
}

#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, url: &Url, request: &HttpRequest) -> Result<HttpResponse> {
        use crate::command::{HttpBody, Method};

        let builder = match request.method {
            Method::Get => self.0.get(url.clone()),
            Method::Post => self.0.post(url.clone()),
        };
        let builder = match &request.body {
            HttpBody::Empty => builder,
            HttpBody::Json(body) => builder.json(body),
            HttpBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| crate::Error::Transport(format!("Failed to send request: {e}")))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| crate::Error::Transport(format!("Failed to read response: {e}")))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
