//! AI builder requests and generation supersession.

use std::future::Future;

use futures::future::{AbortHandle, Abortable, Aborted};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::agent::{AgentConfig, AgentResponse};

/// Body of `POST /api/ai-builder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderRequest {
    /// What the user asked for
    pub user_prompt: String,
    /// Agent that should handle the request
    pub agent_id: String,
    /// System prompt with preloaded context; the agent's own prompt when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl BuilderRequest {
    /// Create a request for an agent.
    pub fn new(agent_id: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            agent_id: agent_id.into(),
            system_prompt: None,
        }
    }

    /// Override the agent's system prompt, typically with
    /// [`PromptBuilder::system_prompt`](super::PromptBuilder::system_prompt).
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Token counts reported for a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    #[serde(default, alias = "promptTokens")]
    pub prompt_tokens: u64,
    /// Tokens in the completion
    #[serde(default, alias = "completionTokens")]
    pub completion_tokens: u64,
    /// Total tokens
    #[serde(default, alias = "totalTokens")]
    pub total_tokens: u64,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Result of `POST /api/ai-builder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderResponse {
    /// Raw model output
    pub response: String,
    /// Token usage, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl BuilderResponse {
    /// Interpret the output according to the agent's declared format.
    pub fn parse_for(&self, agent: &AgentConfig) -> Result<AgentResponse> {
        agent.parse_response(&self.response)
    }
}

/// Identifies one generation started by a [`BuilderSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationId(u64);

/// Tracks the in-flight generation of one builder view.
///
/// Only the most recent generation may complete: starting a new one aborts
/// the previous future, and a result that arrives for a superseded
/// generation is turned into [`Error::Aborted`].
///
/// # Example
///
/// ```
/// use gradian_client::ai::{BuilderResponse, BuilderSession};
///
/// # futures::executor::block_on(async {
/// let mut session = BuilderSession::new();
/// let (id, generation) = session.start(async {
///     Ok(BuilderResponse { response: "done".to_string(), token_usage: None })
/// });
/// let response = session.finish(id, generation.await).unwrap();
/// assert_eq!(response.response, "done");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct BuilderSession {
    next_id: u64,
    current: Option<(GenerationId, AbortHandle)>,
    total_usage: TokenUsage,
    completed: usize,
}

impl BuilderSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a generation, aborting any previous one.
    ///
    /// The returned future resolves to `Err(Aborted)` if it is superseded or
    /// cancelled before completing.
    pub fn start<F>(&mut self, generation: F) -> (GenerationId, Abortable<F>)
    where
        F: Future<Output = Result<BuilderResponse>>,
    {
        self.cancel();
        self.next_id += 1;
        let id = GenerationId(self.next_id);
        let (handle, registration) = AbortHandle::new_pair();
        self.current = Some((id, handle));
        (id, Abortable::new(generation, registration))
    }

    /// Record the outcome of a generation.
    ///
    /// Stale and aborted outcomes become [`Error::Aborted`], which callers
    /// should not surface as failures.
    pub fn finish(
        &mut self,
        id: GenerationId,
        outcome: std::result::Result<Result<BuilderResponse>, Aborted>,
    ) -> Result<BuilderResponse> {
        if self.current.as_ref().map(|(current, _)| *current) != Some(id) {
            debug!(generation = id.0, "Discarding result of superseded generation");
            return Err(Error::Aborted);
        }
        self.current = None;

        let response = outcome??;
        if let Some(usage) = response.token_usage {
            self.total_usage += usage;
        }
        self.completed += 1;
        Ok(response)
    }

    /// Abort the in-flight generation, if any.
    pub fn cancel(&mut self) {
        if let Some((id, handle)) = self.current.take() {
            debug!(generation = id.0, "Aborting in-flight generation");
            handle.abort();
        }
    }

    /// Whether a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.current.is_some()
    }

    /// Token usage summed over all completed generations.
    pub fn total_usage(&self) -> TokenUsage {
        self.total_usage
    }

    /// Number of generations that completed successfully.
    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl Drop for BuilderSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
