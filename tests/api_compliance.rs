//! Backend API compliance tests for the sans-io client.
//!
//! These tests drive the client through the request/response shapes the
//! Gradian backend uses, via the mock server infrastructure.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use gradian_client::ai::{
    AgentConfig, AgentResponse, BuilderRequest, BuilderResponse, RenderedRoute, ResponseFormat,
    RouteMethod, TokenUsage,
};
use gradian_client::command::HttpBody;
use gradian_client::health::{CheckResult, HealthReport, HealthStatus};
use gradian_client::mock::ClientMockTest;
use gradian_client::response::{CreatedBy, Priority};
use gradian_client::voice::{RecordedAudio, TranscriptionRequest, TranscriptionResult};
use gradian_client::{
    Client, Command, CommandKind, DiscussionQuery, Engagement, Error, HttpResponse, Method,
    NewEngagement, Response,
};
use serde_json::json;

/// Discussion listing returns the flat message list unchanged
#[test]
fn test_list_discussion() {
    let messages = vec![
        Engagement::new("e1", "2024-05-01T08:00:00Z", "Is the invoice approved?"),
        Engagement::new("e2", "2024-05-01T09:30:00Z", "Yes, this morning")
            .in_reply_to("e1")
            .created_by(CreatedBy::Id("u-7".to_string())),
    ];
    let query = DiscussionQuery::new("invoices", "inv-42").for_user("u-1");
    let interactions = vec![(
        Command::ListDiscussion(query.clone()),
        Response::Discussion(messages.clone()),
    )];

    let mut test = ClientMockTest::new(interactions).unwrap();
    let response = test.send_command(Command::ListDiscussion(query)).unwrap();
    if let Response::Discussion(received) = response {
        assert_eq!(received, messages);
        assert_eq!(received[1].parent_id(), Some("e1"));
    } else {
        panic!("Expected Discussion response");
    }

    assert!(test.is_complete());
    assert_eq!(test.client().state(), "ready");
}

/// Posting returns the created message from the `{success, data}` envelope
#[test]
fn test_post_discussion_reply() {
    let reply = NewEngagement {
        message: "Looks good".to_string(),
        priority: Some(Priority::High),
        reference_engagement_id: Some("e1".to_string()),
    };
    let command = Command::PostDiscussion {
        schema_id: "invoices".to_string(),
        instance_id: "inv-42".to_string(),
        engagement: reply,
    };
    let created = Engagement::new("e3", "2024-05-02T10:00:00Z", "Looks good").in_reply_to("e1");

    let mut test =
        ClientMockTest::new(vec![(command.clone(), Response::Posted(created.clone()))]).unwrap();
    let response = test.send_command(command).unwrap();
    assert_eq!(response, Response::Posted(created));
}

/// Agent list and single agent, with their declared response formats
#[test]
fn test_agents() {
    let mut graph_agent = AgentConfig::new("graph-builder", "Draw graphs", ResponseFormat::Graph);
    graph_agent.require_approval = true;
    let agents = vec![
        AgentConfig::new("schema-builder", "Build schemas", ResponseFormat::Json),
        graph_agent.clone(),
    ];

    let interactions = vec![
        (Command::ListAgents, Response::Agents(agents.clone())),
        (
            Command::GetAgent("graph-builder".to_string()),
            Response::Agent(graph_agent.clone()),
        ),
    ];
    let mut test = ClientMockTest::new(interactions).unwrap();

    let response = test.send_command(Command::ListAgents).unwrap();
    assert_eq!(response, Response::Agents(agents));

    let response = test
        .send_command(Command::GetAgent("graph-builder".to_string()))
        .unwrap();
    if let Response::Agent(agent) = response {
        assert_eq!(agent.response_format, ResponseFormat::Graph);
        assert!(agent.require_approval);
    } else {
        panic!("Expected Agent response");
    }
    assert!(test.is_complete());
}

/// Generation output is interpreted by the agent's format
#[test]
fn test_generation_parsed_by_format() {
    let request = BuilderRequest::new("schema-builder", "A schema for invoices");
    let generation = BuilderResponse {
        response: "```json\n{\"id\": \"invoices\", \"fields\": []}\n```".to_string(),
        token_usage: Some(TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 40,
            total_tokens: 160,
        }),
    };
    let mut test = ClientMockTest::new(vec![(
        Command::Generate(request.clone()),
        Response::Generation(generation.clone()),
    )])
    .unwrap();

    let response = test.send_command(Command::Generate(request)).unwrap();
    let Response::Generation(received) = response else {
        panic!("Expected Generation response");
    };
    assert_eq!(received, generation);

    let agent = AgentConfig::new("schema-builder", "p", ResponseFormat::Json);
    let parsed = received.parse_for(&agent).unwrap();
    assert_eq!(parsed.format(), ResponseFormat::Json);
    assert_eq!(
        parsed.as_json().and_then(|v| v.get("id")),
        Some(&json!("invoices"))
    );

    let text_agent = AgentConfig::new("writer", "p", ResponseFormat::Text);
    assert!(matches!(
        received.parse_for(&text_agent).unwrap(),
        AgentResponse::Text(_)
    ));
}

/// Transcription uploads a multipart form and decodes the text
#[test]
fn test_transcription() {
    let audio = RecordedAudio {
        data: Bytes::from_static(b"OggS\x00\x02"),
        mime_type: "audio/webm;codecs=opus".to_string(),
        duration: Duration::from_secs(3),
    };
    let request = TranscriptionRequest::new(audio, "fa");

    let encoded = Command::Transcribe(request.clone()).encode().unwrap();
    assert_eq!(encoded.method, Method::Post);
    assert_eq!(encoded.path, "/api/ai-builder/voice-transcription");
    let HttpBody::Multipart(parts) = &encoded.body else {
        panic!("Expected multipart body");
    };
    assert_eq!(parts[0].name, "file");
    assert_eq!(parts[0].file_name.as_deref(), Some("recording.webm"));
    assert_eq!(parts[1].name, "language");
    assert_eq!(parts[1].data, Bytes::from_static(b"fa"));

    let result = TranscriptionResult {
        transcription: "salam".to_string(),
        usage: None,
        estimated_cost: Some(0.0004),
    };
    let mut test = ClientMockTest::new(vec![(
        Command::Transcribe(request.clone()),
        Response::Transcription(result.clone()),
    )])
    .unwrap();
    assert_eq!(
        test.send_command(Command::Transcribe(request)).unwrap(),
        Response::Transcription(result)
    );
}

/// An unhealthy report answered with 503 still decodes as a report
#[test]
fn test_health_check_unhealthy() {
    let mut checks = BTreeMap::new();
    checks.insert(
        "database".to_string(),
        CheckResult {
            status: HealthStatus::Unhealthy,
            message: Some("connection refused".to_string()),
            response_time: None,
        },
    );
    let report = HealthReport {
        status: HealthStatus::Unhealthy,
        checks,
        ..HealthReport::default()
    };
    let command = Command::HealthCheck {
        url: "/api/health".to_string(),
    };

    let mut test =
        ClientMockTest::new(vec![(command.clone(), Response::Health(report.clone()))]).unwrap();
    let response = test.send_command(command).unwrap();
    let Response::Health(received) = response else {
        panic!("Expected Health response");
    };
    assert!(!received.is_healthy());
    assert_eq!(received.failing_checks()[0].0, "database");
}

/// Preload routes return arbitrary JSON
#[test]
fn test_preload() {
    let route = RenderedRoute {
        method: RouteMethod::Get,
        path: "/api/schemas".to_string(),
        query: vec![("summary".to_string(), "true".to_string())],
        body: None,
    };
    let data = json!([{"id": "invoices"}, {"id": "customers"}]);

    let mut test = ClientMockTest::new(vec![(
        Command::Preload(route.clone()),
        Response::Json(data.clone()),
    )])
    .unwrap();
    assert_eq!(
        test.send_command(Command::Preload(route)).unwrap(),
        Response::Json(data)
    );
}

/// Backend errors surface as error responses, not client failures
#[test]
fn test_error_responses() {
    let interactions = vec![
        (
            Command::GetAgent("missing".to_string()),
            Response::Error {
                status: 404,
                message: "Agent not found".to_string(),
            },
        ),
        (
            Command::ListAgents,
            Response::Error {
                status: 401,
                message: "Unauthorized".to_string(),
            },
        ),
    ];
    let mut test = ClientMockTest::new(interactions).unwrap();

    let response = test
        .send_command(Command::GetAgent("missing".to_string()))
        .unwrap();
    assert!(response.is_not_found());
    assert_eq!(response.error_message(), Some("Agent not found"));

    let response = test.send_command(Command::ListAgents).unwrap();
    assert!(response.is_unauthorized());
    assert_eq!(
        response.into_result(),
        Err(Error::Http {
            status: 401,
            message: "Unauthorized".to_string()
        })
    );
    assert!(test.client().is_ready());
}

/// Relaxed mode answers unexpected commands with 404
#[test]
fn test_relaxed_mode() {
    let mut test =
        ClientMockTest::new_relaxed(vec![(Command::ListAgents, Response::Agents(vec![]))]).unwrap();

    let response = test
        .send_command(Command::GetAgent("other".to_string()))
        .unwrap();
    assert!(response.is_not_found());
    assert_eq!(test.remaining_interactions(), 1);

    assert_eq!(
        test.send_command(Command::ListAgents).unwrap(),
        Response::Agents(vec![])
    );
    assert!(test.is_complete());
}

/// Invalid parameters are rejected before anything is sent
#[test]
fn test_invalid_commands_rejected() {
    let mut test = ClientMockTest::new(vec![]).unwrap();

    assert!(matches!(
        test.send_command(Command::GetAgent("../admin".to_string())),
        Err(Error::InvalidCommand(_))
    ));
    assert!(matches!(
        test.send_command(Command::PostDiscussion {
            schema_id: "invoices".to_string(),
            instance_id: "inv-42".to_string(),
            engagement: NewEngagement {
                message: "   ".to_string(),
                priority: None,
                reference_engagement_id: None,
            },
        }),
        Err(Error::InvalidCommand(_))
    ));
    assert!(matches!(
        test.send_command(Command::Generate(BuilderRequest::new("a", ""))),
        Err(Error::InvalidCommand(_))
    ));
    assert!(test.client().is_ready());
}

/// Raw backend shapes decoded without the mock's encoder
#[test]
fn test_raw_backend_bodies() {
    let mut client = Client::new("https://gradian.example.com/app").unwrap();

    // Bare array
    let request = client
        .encode_command(Command::ListDiscussion(DiscussionQuery::new("tickets", "t 1")))
        .unwrap();
    let url = client.url_for(&request).unwrap();
    assert_eq!(url.path(), "/app/api/engagements/discussion");
    assert_eq!(
        url.query(),
        Some("referenceSchemaId=tickets&referenceInstanceId=t+1")
    );
    let body = json!([{"id": "e1", "createdAt": "2024-01-01T00:00:00Z", "message": "hi"}]);
    let response = client
        .decode_response(&HttpResponse::json(200, &body))
        .unwrap();
    assert!(matches!(response, Response::Discussion(ref m) if m.len() == 1));

    // Envelope with success false and a 200 status
    client.encode_command(Command::ListAgents).unwrap();
    let body = json!({"success": false, "error": "Agents are disabled"});
    let response = client
        .decode_response(&HttpResponse::json(200, &body))
        .unwrap();
    assert_eq!(response.error_message(), Some("Agents are disabled"));

    // Plain-text error page
    client.encode_command(Command::ListAgents).unwrap();
    let response = client
        .decode_response(&HttpResponse::text(502, "Bad Gateway"))
        .unwrap();
    assert_eq!(response.error_status(), Some(502));
    assert!(response.is_server_error());

    // Non-JSON success body
    client
        .encode_command(Command::GetAgent("a".to_string()))
        .unwrap();
    assert!(matches!(
        client.decode_response(&HttpResponse::text(200, "<html>")),
        Err(Error::InvalidResponse(_))
    ));
    assert!(client.is_ready());
}

/// Only one request may be outstanding at a time
#[test]
fn test_single_outstanding_request() {
    let mut client = Client::new("https://gradian.example.com").unwrap();
    client.encode_command(Command::ListAgents).unwrap();
    assert_eq!(client.pending(), Some(CommandKind::ListAgents));
    assert!(client.encode_command(Command::ListAgents).is_err());

    assert_eq!(client.abandon(), Some(CommandKind::ListAgents));
    assert!(client
        .decode_response(&HttpResponse::json(200, &json!([])))
        .is_err());
}
