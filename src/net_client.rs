//! Generic async Gradian client implementation.
//!
//! This module provides a client that works with any transport implementing
//! the [`HttpTransport`] trait.
//!
//! # Overview
//!
//! The [`GradianClient`] struct combines a sans-io [`Client`] for protocol
//! logic with a transport for network I/O, plus the session state the
//! backend API needs: configuration and a short-lived cache of agent
//! configuration.
//!
//! # Examples
//!
//! ## Using with reqwest
//!
//! ```rust,no_run
//! # #[cfg(feature = "reqwest-runtime")]
//! # {
//! use gradian_client::runtime::reqwest::GradianClient;
//! use gradian_client::threading::{DiscussionExt, EngagementBuilder};
//! use gradian_client::ClientConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = GradianClient::connect(ClientConfig::default().with_env_overrides())?;
//!
//! let reply = EngagementBuilder::new().message("Approved").reply_to_id("e1").build()?;
//! let forest = client.post_and_refresh("tickets", "t-1", reply).await?;
//! println!("{} threads", forest.len());
//! # Ok(())
//! # }
//! # }
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::debug;

use crate::ai::{AgentConfig, BuilderRequest, PreloadRoute, PromptBuilder};
use crate::cache::TtlCache;
use crate::command::DiscussionQuery;
use crate::config::ClientConfig;
use crate::i18n::LanguageContext;
use crate::response::{
    AgentDetails, AgentList, DiscussionList, Generation, HealthCheck, NewEngagement,
    PostedEngagement, PreloadedData, Transcription,
};
use crate::runtime::HttpTransport;
use crate::voice::TranscriptionRequest;
use crate::{Client, Command, Response, Result};

const AGENT_LIST_KEY: &str = "agents";

/// Generic Gradian client that works with any transport implementation.
///
/// Requests are sent one at a time. If a previous call's future was dropped
/// before completing (for example because a generation was superseded), the
/// unfinished request is abandoned when the next one starts.
///
/// # Type Parameters
///
/// * `T` - The transport implementing [`HttpTransport`], typically
///   [`ReqwestTransport`](crate::runtime::ReqwestTransport) or, in tests,
///   [`MockTransport`](crate::mock::MockTransport)
pub struct GradianClient<T: HttpTransport> {
    /// The sans-io client handling protocol logic.
    client: Client,
    /// The transport for network I/O.
    transport: T,
    /// Session configuration.
    config: ClientConfig,
    /// Cached agent list and individual agents.
    agents: TtlCache<Vec<AgentConfig>>,
    agent_details: TtlCache<AgentConfig>,
}

#[cfg(feature = "reqwest-runtime")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest-runtime")))]
impl GradianClient<crate::runtime::ReqwestTransport> {
    /// Create a client using reqwest with the configured request timeout.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = crate::runtime::ReqwestTransport::new(config.request_timeout())?;
        Self::new(config, transport)
    }
}

impl<T: HttpTransport> GradianClient<T> {
    /// Create a client over a transport.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: Client::from_config(&config)?,
            transport,
            agents: TtlCache::new(config.cache_ttl()),
            agent_details: TtlCache::new(config.cache_ttl()),
            config,
        })
    }

    /// Session configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Language context for resolving localized text.
    pub fn languages(&self) -> LanguageContext {
        self.config.languages()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List the messages of a record's discussion.
    ///
    /// The configured current user is sent so the backend can report read state.
    pub async fn list_discussion(
        &mut self,
        schema_id: &str,
        instance_id: &str,
    ) -> Result<DiscussionList> {
        let mut query = DiscussionQuery::new(schema_id, instance_id);
        if let Some(user) = &self.config.current_user_id {
            query = query.for_user(user.clone());
        }
        let response = self.send_command(Command::ListDiscussion(query)).await?;
        response.try_into()
    }

    /// Post a message or reply to a record's discussion.
    pub async fn post_discussion(
        &mut self,
        schema_id: &str,
        instance_id: &str,
        engagement: NewEngagement,
    ) -> Result<PostedEngagement> {
        let response = self
            .send_command(Command::PostDiscussion {
                schema_id: schema_id.to_string(),
                instance_id: instance_id.to_string(),
                engagement,
            })
            .await?;
        response.try_into()
    }

    /// List configured AI agents, served from cache while fresh.
    pub async fn list_agents(&mut self) -> Result<AgentList> {
        if let Some(agents) = self.agents.get(AGENT_LIST_KEY, Instant::now()) {
            debug!("Serving agent list from cache");
            return Ok(AgentList(agents.clone()));
        }

        let agents: AgentList = self.send_command(Command::ListAgents).await?.try_into()?;
        let now = Instant::now();
        for agent in agents.iter() {
            self.agent_details.insert(agent.id.clone(), agent.clone(), now);
        }
        self.agents.insert(AGENT_LIST_KEY, agents.0.clone(), now);
        Ok(agents)
    }

    /// Fetch one AI agent, served from cache while fresh.
    pub async fn get_agent(&mut self, id: &str) -> Result<AgentDetails> {
        if let Some(agent) = self.agent_details.get(id, Instant::now()) {
            debug!(agent = id, "Serving agent from cache");
            return Ok(AgentDetails(agent.clone()));
        }

        let agent: AgentDetails = self
            .send_command(Command::GetAgent(id.to_string()))
            .await?
            .try_into()?;
        self.agent_details
            .insert(id.to_string(), agent.0.clone(), Instant::now());
        Ok(agent)
    }

    /// Drop cached agent configuration.
    pub fn invalidate_agents(&mut self) {
        self.agents.clear();
        self.agent_details.clear();
    }

    /// Run an AI builder generation.
    ///
    /// Wrap the returned future with
    /// [`BuilderSession::start`](crate::ai::BuilderSession::start) to have it
    /// aborted when a newer generation supersedes it.
    pub async fn generate(&mut self, request: BuilderRequest) -> Result<Generation> {
        let response = self.send_command(Command::Generate(request)).await?;
        response.try_into()
    }

    /// Transcribe recorded audio.
    pub async fn transcribe(&mut self, request: TranscriptionRequest) -> Result<Transcription> {
        let response = self.send_command(Command::Transcribe(request)).await?;
        response.try_into()
    }

    /// Query a service health endpoint.
    ///
    /// Endpoints that answer `503` with a report body yield the report.
    pub async fn check_health(&mut self, url: &str) -> Result<HealthCheck> {
        let response = self
            .send_command(Command::HealthCheck {
                url: url.to_string(),
            })
            .await?;
        response.try_into()
    }

    /// Fetch a preload route rendered with `params`.
    pub async fn preload(
        &mut self,
        route: &PreloadRoute,
        params: &BTreeMap<String, String>,
    ) -> Result<PreloadedData> {
        let rendered = route.render(params)?;
        let response = self.send_command(Command::Preload(rendered)).await?;
        response.try_into()
    }

    /// Build an agent's system prompt with the data of all its preload routes.
    ///
    /// Routes are fetched in order; the first failure is returned.
    pub async fn preload_context(
        &mut self,
        agent: &AgentConfig,
        params: &BTreeMap<String, String>,
    ) -> Result<String> {
        let mut prompt = PromptBuilder::new(agent.system_prompt.clone());
        for route in &agent.preload_routes {
            let data = self.preload(route, params).await?;
            prompt = prompt.preloaded(route, &data)?;
        }
        Ok(prompt.system_prompt())
    }

    /// Generate with an agent after injecting its preload routes into the
    /// system prompt.
    ///
    /// Agents without preload routes are sent as a plain request.
    pub async fn generate_for_agent(
        &mut self,
        agent: &AgentConfig,
        user_prompt: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Generation> {
        let mut request = BuilderRequest::new(agent.id.clone(), user_prompt);
        if !agent.preload_routes.is_empty() {
            let system_prompt = self.preload_context(agent, params).await?;
            request = request.with_system_prompt(system_prompt);
        }
        self.generate(request).await
    }

    /// Send a command and wait for the response.
    async fn send_command(&mut self, command: Command) -> Result<Response> {
        if let Some(kind) = self.client.abandon() {
            debug!(?kind, "Abandoning unfinished request");
        }

        let request = self.client.encode_command(command)?;
        let url = match self.client.url_for(&request) {
            Ok(url) => url,
            Err(e) => {
                self.client.abandon();
                return Err(e);
            }
        };

        debug!(method = request.method.as_str(), %url, "Sending request");
        let response = match self.transport.send(&url, &request).await {
            Ok(response) => response,
            Err(e) => {
                self.client.abandon();
                return Err(e);
            }
        };

        self.client.decode_response(&response)?.into_result()
    }
}
