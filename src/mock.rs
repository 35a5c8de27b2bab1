//! Mock Gradian backend for testing purposes.
//!
//! This module provides two mocks:
//!
//! - [`MockServer`] / [`ClientMockTest`] drive the sans-io [`Client`] through
//!   scripted command/response pairs, encoding each response to the HTTP
//!   form the backend would send.
//! - [`MockTransport`] implements [`HttpTransport`] with canned responses per
//!   route, for exercising [`GradianClient`](crate::net_client::GradianClient).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use url::Url;

use crate::command::{HttpRequest, Method};
use crate::health::HealthStatus;
use crate::response::HttpResponse;
use crate::runtime::HttpTransport;
use crate::{Client, Command, Error, Response, Result};

/// Base URL used by [`ClientMockTest`].
pub const MOCK_BASE_URL: &str = "http://mock.gradian.test";

/// A mock backend that simulates responses for testing.
///
/// The mock server accepts a series of expected request/response pairs
/// and validates that the client sends the expected commands in order.
pub struct MockServer {
    expected_interactions: VecDeque<(Command, Response)>,
    strict_mode: bool,
}

impl MockServer {
    /// Create a new mock server with a series of expected interactions.
    ///
    /// Each interaction consists of an expected command and the response
    /// that should be sent back to the client.
    pub fn new(interactions: Vec<(Command, Response)>) -> Self {
        Self {
            expected_interactions: interactions.into(),
            strict_mode: true,
        }
    }

    /// Create a new mock server in non-strict mode.
    ///
    /// In non-strict mode, unexpected commands result in a `404` error
    /// response rather than an error.
    pub fn new_relaxed(interactions: Vec<(Command, Response)>) -> Self {
        Self {
            expected_interactions: interactions.into(),
            strict_mode: false,
        }
    }

    /// Process a command from the client and return the appropriate response.
    ///
    /// Returns an error if the command doesn't match the expected sequence
    /// (in strict mode) or if there are no more expected interactions.
    pub fn handle_command(&mut self, command: &Command) -> Result<Response> {
        if let Some((expected_cmd, response)) = self.expected_interactions.pop_front() {
            if *command == expected_cmd {
                Ok(response)
            } else if self.strict_mode {
                Err(Error::InvalidCommand(format!(
                    "Expected command {expected_cmd:?}, got {command:?}"
                )))
            } else {
                // Return the interaction back to the queue and send an error
                self.expected_interactions
                    .push_front((expected_cmd, response));
                Ok(Response::Error {
                    status: 404,
                    message: "Route not found".to_string(),
                })
            }
        } else if self.strict_mode {
            Err(Error::InvalidCommand(
                "No more expected commands".to_string(),
            ))
        } else {
            Ok(Response::Error {
                status: 404,
                message: "No handler for command".to_string(),
            })
        }
    }

    /// Check if all expected interactions have been processed.
    pub fn is_complete(&self) -> bool {
        self.expected_interactions.is_empty()
    }

    /// Get the number of remaining expected interactions.
    pub fn remaining_interactions(&self) -> usize {
        self.expected_interactions.len()
    }

    /// Reset the mock server with a new set of interactions.
    pub fn reset(&mut self, interactions: Vec<(Command, Response)>) {
        self.expected_interactions = interactions.into();
    }
}

/// Test helper that combines a Client and MockServer for integration testing.
///
/// This helper simulates the complete request/response cycle, encoding commands
/// from the client and feeding responses back.
pub struct ClientMockTest {
    client: Client,
    mock_server: MockServer,
}

impl ClientMockTest {
    /// Create a new test setup with the given interactions.
    pub fn new(interactions: Vec<(Command, Response)>) -> Result<Self> {
        Ok(Self {
            client: Client::new(MOCK_BASE_URL)?,
            mock_server: MockServer::new(interactions),
        })
    }

    /// Create a new test setup in relaxed mode.
    pub fn new_relaxed(interactions: Vec<(Command, Response)>) -> Result<Self> {
        Ok(Self {
            client: Client::new(MOCK_BASE_URL)?,
            mock_server: MockServer::new_relaxed(interactions),
        })
    }

    /// Send a command through the client and get the response from the mock server.
    ///
    /// This simulates the complete network round-trip by encoding the command,
    /// processing it through the mock server, and feeding the HTTP form of the
    /// response back to the client.
    pub fn send_command(&mut self, command: Command) -> Result<Response> {
        // Encode command through client
        self.client.encode_command(command.clone())?;

        // Process command through mock server
        let response = match self.mock_server.handle_command(&command) {
            Ok(response) => response,
            Err(e) => {
                self.client.abandon();
                return Err(e);
            }
        };

        // Encode response and decode it through the client
        let encoded = encode_response(&response)?;
        self.client.decode_response(&encoded)
    }

    /// Get a reference to the client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a mutable reference to the client.
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Check if all expected interactions have been processed.
    pub fn is_complete(&self) -> bool {
        self.mock_server.is_complete()
    }

    /// Get the number of remaining expected interactions.
    pub fn remaining_interactions(&self) -> usize {
        self.mock_server.remaining_interactions()
    }
}

/// Encode a response as it would come from the backend.
///
/// Health reports with an unhealthy status are sent with `503`, like real
/// health endpoints do.
pub fn encode_response(response: &Response) -> Result<HttpResponse> {
    let (status, body) = match response {
        Response::Discussion(messages) => (200, serde_json::to_value(messages)?),
        Response::Posted(engagement) => (
            201,
            json!({"success": true, "data": serde_json::to_value(engagement)?}),
        ),
        Response::Agents(agents) => (
            200,
            json!({"success": true, "data": serde_json::to_value(agents)?}),
        ),
        Response::Agent(agent) => (
            200,
            json!({"success": true, "data": serde_json::to_value(agent)?}),
        ),
        Response::Generation(generation) => (200, serde_json::to_value(generation)?),
        Response::Transcription(result) => (200, serde_json::to_value(result)?),
        Response::Health(report) => {
            let status = if report.status == HealthStatus::Unhealthy {
                503
            } else {
                200
            };
            (status, serde_json::to_value(report)?)
        }
        Response::Json(value) => (200, json!({"success": true, "data": value})),
        Response::Error { status, message } => {
            (*status, json!({"success": false, "error": message}))
        }
    };
    Ok(HttpResponse::json(status, &body))
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), VecDeque<Result<HttpResponse>>>,
    fallback: HashMap<(Method, String), Result<HttpResponse>>,
    requests: Vec<(Url, HttpRequest)>,
}

/// An in-memory [`HttpTransport`] with canned responses per route.
///
/// Routes are matched on method and URL path, ignoring the query; absolute
/// routes (`https://...`) are matched on the full URL without query.
/// Queued responses are served once each, in order; a route registered with
/// [`always`](Self::always) answers every request after its queue is empty.
/// Unmatched requests get a `404`. Every request is recorded.
///
/// Clones share state, so a test can keep one handle for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    /// Queue a response for one request to a route.
    pub fn reply(&self, method: Method, route: &str, response: HttpResponse) -> &Self {
        self.with_state(|state| {
            state
                .routes
                .entry((method, route.to_string()))
                .or_default()
                .push_back(Ok(response));
        });
        self
    }

    /// Queue a JSON response for one request to a route.
    pub fn reply_json(&self, method: Method, route: &str, status: u16, body: Value) -> &Self {
        self.reply(method, route, HttpResponse::json(status, &body))
    }

    /// Queue a transport failure for one request to a route.
    pub fn fail(&self, method: Method, route: &str, message: &str) -> &Self {
        self.with_state(|state| {
            state
                .routes
                .entry((method, route.to_string()))
                .or_default()
                .push_back(Err(Error::Transport(message.to_string())));
        });
        self
    }

    /// Answer every request to a route with the same response.
    pub fn always(&self, method: Method, route: &str, response: HttpResponse) -> &Self {
        self.with_state(|state| {
            state
                .fallback
                .insert((method, route.to_string()), Ok(response));
        });
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<(Url, HttpRequest)> {
        self.with_state(|state| state.requests.clone())
    }

    /// Number of requests received for a route.
    pub fn request_count(&self, method: Method, route: &str) -> usize {
        self.with_state(|state| {
            state
                .requests
                .iter()
                .filter(|(url, request)| request.method == method && route_matches(route, url))
                .count()
        })
    }
}

fn route_key(url: &Url) -> [String; 2] {
    let mut without_query = url.clone();
    without_query.set_query(None);
    [url.path().to_string(), without_query.to_string()]
}

fn route_matches(route: &str, url: &Url) -> bool {
    route_key(url).iter().any(|key| key == route)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, url: &Url, request: &HttpRequest) -> Result<HttpResponse> {
        self.with_state(|state| {
            state.requests.push((url.clone(), request.clone()));
            for key in route_key(url) {
                let key = (request.method, key);
                if let Some(response) = state.routes.get_mut(&key).and_then(VecDeque::pop_front) {
                    return response;
                }
                if let Some(response) = state.fallback.get(&key) {
                    return response.clone();
                }
            }
            Ok(HttpResponse::json(
                404,
                &json!({"success": false, "error": format!("No mock for {}", url.path())}),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentConfig, ResponseFormat};
    use crate::health::HealthReport;

    #[test]
    fn test_mock_server_basic() {
        let agents = vec![AgentConfig::new("schema-builder", "p", ResponseFormat::Json)];
        let interactions = vec![
            (Command::ListAgents, Response::Agents(agents.clone())),
            (
                Command::GetAgent("schema-builder".to_string()),
                Response::Agent(agents[0].clone()),
            ),
        ];

        let mut mock = MockServer::new(interactions);
        assert_eq!(mock.remaining_interactions(), 2);

        let response = mock.handle_command(&Command::ListAgents).unwrap();
        assert_eq!(response, Response::Agents(agents));
        assert!(!mock.is_complete());
    }

    #[test]
    fn test_mock_server_strict_mode_rejects_unexpected() {
        let mut mock = MockServer::new(vec![(Command::ListAgents, Response::Agents(vec![]))]);
        assert!(mock
            .handle_command(&Command::GetAgent("x".to_string()))
            .is_err());
    }

    #[test]
    fn test_mock_server_relaxed_mode() {
        let mut mock = MockServer::new_relaxed(vec![(Command::ListAgents, Response::Agents(vec![]))]);
        let response = mock
            .handle_command(&Command::GetAgent("x".to_string()))
            .unwrap();
        assert!(response.is_not_found());
        assert_eq!(mock.remaining_interactions(), 1);
    }

    #[test]
    fn test_client_mock_round_trip() {
        let mut test = ClientMockTest::new(vec![(
            Command::ListAgents,
            Response::Agents(vec![AgentConfig::new("a", "p", ResponseFormat::Table)]),
        )])
        .unwrap();

        let response = test.send_command(Command::ListAgents).unwrap();
        if let Response::Agents(agents) = response {
            assert_eq!(agents[0].response_format, ResponseFormat::Table);
        } else {
            panic!("Expected Agents response");
        }
        assert!(test.is_complete());
        assert!(test.client().is_ready());
    }

    #[test]
    fn test_unhealthy_report_encoded_as_503() {
        let report = HealthReport {
            status: HealthStatus::Unhealthy,
            ..HealthReport::default()
        };
        let encoded = encode_response(&Response::Health(report)).unwrap();
        assert_eq!(encoded.status, 503);
    }

    #[test]
    fn test_strict_failure_leaves_client_ready() {
        let mut test = ClientMockTest::new(vec![]).unwrap();
        assert!(test.send_command(Command::ListAgents).is_err());
        assert!(test.client().is_ready());
    }

    #[tokio::test]
    async fn test_mock_transport_routes() {
        let transport = MockTransport::new();
        transport
            .reply_json(Method::Get, "/api/ai-agents", 200, json!([]))
            .fail(Method::Get, "/api/ai-agents", "connection reset");

        let url = Url::parse("http://mock.gradian.test/api/ai-agents?x=1").unwrap();
        let request = Command::ListAgents.encode().unwrap();

        assert_eq!(transport.send(&url, &request).await.unwrap().status, 200);
        assert!(matches!(
            transport.send(&url, &request).await,
            Err(Error::Transport(_))
        ));
        assert_eq!(transport.send(&url, &request).await.unwrap().status, 404);
        assert_eq!(transport.request_count(Method::Get, "/api/ai-agents"), 3);
    }
}
