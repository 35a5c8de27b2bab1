//! # gradian-client
//!
//! A sans-io client library for the Gradian application backend.
//!
//! This library covers the client-side core of a Gradian front end: record
//! discussions organized into reply threads, AI builder agents and their
//! response formats, voice transcription, and service health checks.
//!
//! ## Design Philosophy
//!
//! This library follows the "sans-io" design pattern:
//! - **Protocol Logic**: [`Client`] turns commands into [`HttpRequest`]s and
//!   decodes [`HttpResponse`]s, unwrapping the backend's response envelope
//! - **I/O Separation**: Requests are sent by a transport the caller chooses
//! - **Pure Core**: Thread building, rendering and schema validation need no I/O at all
//!
//! ## Examples
//!
//! ### Sans-IO Usage
//!
//! ```rust
//! use gradian_client::{Client, Command, HttpResponse, Response};
//! use serde_json::json;
//!
//! let mut client = Client::new("https://gradian.example.com")?;
//! let request = client.encode_command(Command::ListAgents)?;
//! assert_eq!(request.path, "/api/ai-agents");
//! // Send the request through your HTTP layer, then feed back the reply
//! let reply = HttpResponse::json(200, &json!({"success": true, "data": []}));
//! assert_eq!(client.decode_response(&reply)?, Response::Agents(vec![]));
//! # Ok::<(), gradian_client::Error>(())
//! ```
//!
//! ### With Runtime Integration
//!
//! ```rust,no_run
//! # #[cfg(feature = "reqwest-runtime")]
//! # {
//! use gradian_client::runtime::reqwest::GradianClient;
//! use gradian_client::threading::{render_rows, DiscussionExt, NoResolver};
//! use gradian_client::ClientConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_file("gradian.toml")?.with_env_overrides();
//! let mut client = GradianClient::connect(config)?;
//! let forest = client.fetch_threads("tickets", "t-1").await?;
//! for row in render_rows(&forest, &NoResolver, &client.languages()) {
//!     println!("{}{}: {}", "  ".repeat(row.depth), row.author.name, row.message);
//! }
//! # Ok(())
//! # }
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod ai;
pub mod cache;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod health;
pub mod i18n;
pub mod net_client;
pub mod response;
pub mod runtime;
pub mod threading;
pub mod utils;
pub mod voice;

// Mock backend for testing
pub mod mock;

pub use client::Client;
pub use command::{Command, CommandKind, DiscussionQuery, HttpRequest, Method};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use net_client::GradianClient;
pub use response::{Engagement, HttpResponse, NewEngagement, Response};
