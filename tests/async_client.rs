//! Async client tests over the in-memory transport.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gradian_client::ai::{AgentConfig, BuilderRequest, BuilderSession, PreloadRoute, ResponseFormat};
use gradian_client::command::HttpBody;
use gradian_client::health::HealthStatus;
use gradian_client::mock::{MockTransport, MOCK_BASE_URL};
use gradian_client::runtime::HttpTransport;
use gradian_client::threading::{render_rows, DiscussionExt, EngagementBuilder, NoResolver};
use gradian_client::{ClientConfig, Error, GradianClient, HttpRequest, HttpResponse, Method};
use serde_json::{json, Value};
use url::Url;

const DISCUSSION: &str = "/api/engagements/discussion";
const POST_DISCUSSION: &str = "/api/data/tickets/t-1/engagements/discussion";
const AGENTS: &str = "/api/ai-agents";
const BUILDER: &str = "/api/ai-builder";

fn config() -> ClientConfig {
    ClientConfig {
        base_url: MOCK_BASE_URL.to_string(),
        current_user_id: Some("u-1".to_string()),
        ..ClientConfig::default()
    }
}

fn client(transport: &MockTransport) -> GradianClient<MockTransport> {
    GradianClient::new(config(), transport.clone()).unwrap()
}

fn envelope(data: Value) -> Value {
    json!({"success": true, "data": data})
}

fn agent_json(id: &str, format: &str) -> Value {
    json!({"id": id, "label": id, "systemPrompt": "You help.", "responseFormat": format})
}

/// Stalls the first request forever, then answers like the inner mock.
struct StallFirst {
    stalled: AtomicBool,
    inner: MockTransport,
}

#[async_trait]
impl HttpTransport for StallFirst {
    async fn send(&self, url: &Url, request: &HttpRequest) -> gradian_client::Result<HttpResponse> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.inner.send(url, request).await
    }
}

#[tokio::test]
async fn test_fetch_threads_sends_current_user() {
    let transport = MockTransport::new();
    transport.reply_json(
        Method::Get,
        DISCUSSION,
        200,
        json!([
            {"id": "a", "createdAt": "2024-03-01T09:00:00Z", "message": "Can we ship?",
             "createdBy": {"id": "u-2", "firstName": {"en": "Sam", "fr": "Samuel"}}},
            {"id": "b", "createdAt": "2024-03-01T10:00:00Z", "message": "Yes",
             "referenceEngagementId": "a", "createdBy": "u-3"},
            {"id": "c", "createdAt": "2024-03-02T08:00:00Z", "message": "New topic"}
        ]),
    );

    let mut client = client(&transport);
    let forest = client.fetch_threads("tickets", "t-1").await.unwrap();

    let roots: Vec<&str> = forest.roots().iter().map(|n| n.id()).collect();
    assert_eq!(roots, vec!["c", "a"]);

    let rows = render_rows(&forest, &NoResolver, &client.languages());
    assert_eq!(rows[1].author.name, "Sam");
    assert_eq!(rows[2].author.name, "u-3");
    assert_eq!(rows[2].depth, 1);

    let (url, _) = &transport.requests()[0];
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(query.contains(&("currentUserId".to_string(), "u-1".to_string())));
    assert!(query.contains(&("referenceInstanceId".to_string(), "t-1".to_string())));
}

#[tokio::test]
async fn test_post_and_refresh_refetches() {
    let transport = MockTransport::new();
    transport
        .reply_json(
            Method::Post,
            POST_DISCUSSION,
            201,
            envelope(json!({"id": "b", "createdAt": "2024-03-01T10:00:00Z",
                            "message": "Approved", "referenceEngagementId": "a"})),
        )
        .reply_json(
            Method::Get,
            DISCUSSION,
            200,
            json!([
                {"id": "a", "createdAt": "2024-03-01T09:00:00Z", "message": "Approve?"},
                {"id": "b", "createdAt": "2024-03-01T10:00:00Z", "message": "Approved",
                 "referenceEngagementId": "a"}
            ]),
        );

    let mut client = client(&transport);
    let reply = EngagementBuilder::new()
        .message("  Approved ")
        .reply_to_id("a")
        .build()
        .unwrap();
    let forest = client
        .post_and_refresh("tickets", "t-1", reply)
        .await
        .unwrap();

    assert_eq!(forest.total_messages(), 2);
    assert_eq!(forest.find("a").map(|n| n.reply_count()), Some(1));
    assert_eq!(transport.request_count(Method::Get, DISCUSSION), 1);

    let (_, post) = &transport.requests()[0];
    assert_eq!(
        post.body,
        HttpBody::Json(json!({"message": "Approved", "referenceEngagementId": "a"}))
    );
}

#[tokio::test]
async fn test_agents_cached() {
    let transport = MockTransport::new();
    transport
        .reply_json(
            Method::Get,
            AGENTS,
            200,
            envelope(json!([agent_json("schema-builder", "json"), agent_json("writer", "markdown")])),
        )
        .reply_json(Method::Get, AGENTS, 200, envelope(json!([])));

    let mut client = client(&transport);
    let agents = client.list_agents().await.unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[1].response_format, ResponseFormat::Text);

    // Served from cache
    assert_eq!(client.list_agents().await.unwrap().len(), 2);
    let writer = client.get_agent("writer").await.unwrap();
    assert_eq!(writer.id, "writer");
    assert_eq!(transport.request_count(Method::Get, AGENTS), 1);
    assert_eq!(transport.request_count(Method::Get, "/api/ai-agents/writer"), 0);

    client.invalidate_agents();
    assert!(client.list_agents().await.unwrap().is_empty());
    assert_eq!(transport.request_count(Method::Get, AGENTS), 2);
}

#[tokio::test]
async fn test_unknown_agent_is_http_error() {
    let transport = MockTransport::new();
    transport.reply_json(
        Method::Get,
        "/api/ai-agents/ghost",
        404,
        json!({"success": false, "error": "Agent not found"}),
    );

    let mut client = client(&transport);
    let error = client.get_agent("ghost").await.unwrap_err();
    assert_eq!(
        error,
        Error::Http {
            status: 404,
            message: "Agent not found".to_string()
        }
    );
    assert_eq!(error.status(), Some(404));
}

#[tokio::test]
async fn test_health_503_with_report() {
    let transport = MockTransport::new();
    transport
        .always(
            Method::Get,
            "https://auth.example.com/health",
            HttpResponse::json(
                503,
                &json!({
                    "status": "unhealthy",
                    "checks": {"database": {"status": "unhealthy", "error": "timeout"}}
                }),
            ),
        )
        .reply(Method::Get, "/api/health", HttpResponse::text(500, "Internal Server Error"));

    let mut client = client(&transport);
    let report = client
        .check_health("https://auth.example.com/health")
        .await
        .unwrap();
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(
        report.checks["database"].message.as_deref(),
        Some("timeout")
    );

    let error = client.check_health("/api/health").await.unwrap_err();
    assert_eq!(error.status(), Some(500));
}

#[tokio::test]
async fn test_transport_failure_leaves_client_usable() {
    let transport = MockTransport::new();
    transport
        .fail(Method::Get, AGENTS, "connection refused")
        .reply_json(Method::Get, AGENTS, 200, envelope(json!([])));

    let mut client = client(&transport);
    assert!(matches!(
        client.list_agents().await,
        Err(Error::Transport(_))
    ));
    assert!(client.list_agents().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dropped_request_is_abandoned() {
    let inner = MockTransport::new();
    inner.reply_json(
        Method::Post,
        BUILDER,
        200,
        json!({"response": "done", "tokenUsage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}}),
    );
    let transport = StallFirst {
        stalled: AtomicBool::new(false),
        inner: inner.clone(),
    };
    let mut client = GradianClient::new(config(), transport).unwrap();

    let request = BuilderRequest::new("schema-builder", "A table of invoices");
    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), client.generate(request.clone())).await;
    assert!(timed_out.is_err());

    let generation = client.generate(request).await.unwrap();
    assert_eq!(generation.response, "done");
    assert_eq!(generation.token_usage.map(|u| u.total_tokens), Some(5));
}

#[tokio::test]
async fn test_superseded_generation_discarded() {
    let slow_transport = MockTransport::new();
    let fast_transport = MockTransport::new();
    fast_transport.reply_json(
        Method::Post,
        BUILDER,
        200,
        json!({"response": "second", "tokenUsage": {"totalTokens": 7}}),
    );
    let mut slow = client(&slow_transport);
    let mut fast = client(&fast_transport);

    let mut session = BuilderSession::new();
    let (first, first_generation) =
        session.start(async { slow.generate(BuilderRequest::new("a", "one")).await.map(|g| g.0) });
    let (second, second_generation) =
        session.start(async { fast.generate(BuilderRequest::new("a", "two")).await.map(|g| g.0) });

    let outcome = first_generation.await;
    assert!(outcome.is_err());
    assert_eq!(session.finish(first, outcome), Err(Error::Aborted));

    let response = session.finish(second, second_generation.await).unwrap();
    assert_eq!(response.response, "second");
    assert_eq!(session.total_usage().total_tokens, 7);
    assert_eq!(session.completed(), 1);
    assert_eq!(slow_transport.requests().len(), 0);
}

#[tokio::test]
async fn test_preload_context() {
    let transport = MockTransport::new();
    transport.reply_json(
        Method::Get,
        "/api/schemas/invoices",
        200,
        envelope(json!({"schema": {"id": "invoices", "fields": [{"id": "total"}]}})),
    );

    let mut route = PreloadRoute::new("/api/schemas/{schemaId}", "Current schema");
    route.json_path = Some("schema".to_string());
    let mut agent = AgentConfig::new("schema-builder", "You design schemas.", ResponseFormat::Json);
    agent.preload_routes.push(route);

    let mut params = BTreeMap::new();
    params.insert("schemaId".to_string(), "invoices".to_string());

    let mut client = client(&transport);
    let prompt = client.preload_context(&agent, &params).await.unwrap();
    assert!(prompt.starts_with("You design schemas."));
    assert!(prompt.contains("## Current schema"));
    assert!(prompt.contains("\"total\""));

    // Missing parameters fail before anything is sent
    let error = client
        .preload_context(&agent, &BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Template(_)));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_generate_for_agent_sends_preloaded_prompt() {
    let transport = MockTransport::new();
    transport
        .reply_json(
            Method::Get,
            "/api/schemas",
            200,
            envelope(json!([{"id": "customers"}])),
        )
        .reply_json(Method::Post, BUILDER, 200, json!({"response": "{}"}));

    let mut agent = AgentConfig::new("schema-builder", "You design schemas.", ResponseFormat::Json);
    agent
        .preload_routes
        .push(PreloadRoute::new("/api/schemas", "Existing schemas"));

    let mut client = client(&transport);
    client
        .generate_for_agent(&agent, "An invoices schema", &BTreeMap::new())
        .await
        .unwrap();

    let (_, request) = transport.requests().pop().unwrap();
    let HttpBody::Json(body) = request.body else {
        panic!("Expected JSON body");
    };
    assert_eq!(body["agentId"], "schema-builder");
    assert_eq!(body["userPrompt"], "An invoices schema");
    let system_prompt = body["systemPrompt"].as_str().unwrap();
    assert!(system_prompt.contains("## Existing schemas"));
    assert!(system_prompt.contains("customers"));
}
