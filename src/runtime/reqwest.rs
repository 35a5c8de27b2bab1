//! Reqwest integration for gradian-client.
//!
//! This module provides the [`GradianClient`] type alias for use with reqwest
//! on the Tokio runtime.
//!
//! # Example
//!
//! ```no_run
//! use gradian_client::runtime::reqwest::GradianClient;
//! use gradian_client::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_file("gradian.toml")?.with_env_overrides();
//!     let mut client = GradianClient::connect(config)?;
//!     let agents = client.list_agents().await?;
//!     println!("{} agents configured", agents.len());
//!     Ok(())
//! }
//! ```

/// Gradian client with reqwest integration.
///
/// This is a type alias for [`crate::net_client::GradianClient`] using
/// [`ReqwestTransport`](crate::runtime::transport::ReqwestTransport) as the transport.
///
/// See [`crate::net_client::GradianClient`] for full documentation of available methods.
pub type GradianClient =
    crate::net_client::GradianClient<crate::runtime::transport::ReqwestTransport>;
