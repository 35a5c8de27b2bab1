//! Newtype wrappers for backend response data.
//!
//! These wrapper types provide type-safe access to response data extracted from
//! [`Response`](super::Response) variants. Each wrapper implements [`Deref`](std::ops::Deref)
//! to its inner type for ergonomic access to the underlying data.
//!
//! These types are used as return types for `TryFrom<Response>` conversions.
//! A [`Response::Error`](super::Response::Error) converts into
//! [`Error::Http`](crate::Error::Http) rather than a shape mismatch.

use std::ops::Deref;

use serde_json::Value;

use super::{Engagement, Response};
use crate::ai::{AgentConfig, BuilderResponse};
use crate::health::HealthReport;
use crate::voice::TranscriptionResult;
use crate::Error;

fn mismatch(expected: &str, response: Response) -> Error {
    match response {
        Response::Error { status, message } => Error::Http { status, message },
        _ => Error::InvalidResponse(format!("Expected {expected} response")),
    }
}

macro_rules! response_wrapper {
    ($(#[$meta:meta])* $name:ident($inner:ty), $variant:ident, $expected:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub $inner);

        impl Deref for $name {
            type Target = $inner;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl TryFrom<Response> for $name {
            type Error = Error;

            fn try_from(response: Response) -> Result<Self, Self::Error> {
                match response {
                    Response::$variant(inner) => Ok($name(inner)),
                    other => Err(mismatch($expected, other)),
                }
            }
        }
    };
}

response_wrapper!(
    /// Messages of a discussion, in backend order.
    ///
    /// Feed these to [`build_threads`](crate::threading::build_threads) to get
    /// the reply tree.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let messages: DiscussionList = response.try_into()?;
    /// let forest = build_threads(messages.0)?;
    /// ```
    DiscussionList(Vec<Engagement>),
    Discussion,
    "discussion"
);

response_wrapper!(
    /// The message created by a discussion post.
    PostedEngagement(Engagement),
    Posted,
    "posted engagement"
);

response_wrapper!(
    /// Configured AI agents.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let agents: AgentList = response.try_into()?;
    /// for agent in agents.iter() {
    ///     println!("{}: {}", agent.id, agent.response_format);
    /// }
    /// ```
    AgentList(Vec<AgentConfig>),
    Agents,
    "agent list"
);

response_wrapper!(
    /// One AI agent.
    AgentDetails(AgentConfig),
    Agent,
    "agent"
);

response_wrapper!(
    /// Output of an AI builder generation.
    Generation(BuilderResponse),
    Generation,
    "generation"
);

response_wrapper!(
    /// Result of a voice transcription.
    Transcription(TranscriptionResult),
    Transcription,
    "transcription"
);

response_wrapper!(
    /// A service health report.
    HealthCheck(HealthReport),
    Health,
    "health"
);

response_wrapper!(
    /// Raw JSON returned by a preload route.
    PreloadedData(Value),
    Json,
    "JSON"
);
