//! HTTP runtime integrations for gradian-client.
//!
//! ## Transport Abstraction
//!
//! The [`transport`] submodule provides the [`HttpTransport`] trait which
//! abstracts over HTTP libraries.
//!
//! ## Runtime-Specific Clients
//!
//! - [`reqwest`] - A pre-configured [`GradianClient`](crate::net_client::GradianClient)
//!   type alias for reqwest on the Tokio runtime

pub mod transport;

pub use transport::HttpTransport;

#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
pub use transport::ReqwestTransport;

#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
pub mod reqwest;
