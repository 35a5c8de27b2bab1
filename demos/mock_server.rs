//! Example demonstrating the mock backend for testing Gradian client code.
//!
//! This example shows how to use the mock server to simulate backend
//! responses and test client behavior in isolation.

use gradian_client::ai::{AgentConfig, BuilderRequest, BuilderResponse, ResponseFormat};
use std::time::Instant;

use gradian_client::health::{HealthMonitor, HealthReport, HealthStatus, MonitoredService};
use gradian_client::mock::ClientMockTest;
use gradian_client::{ClientConfig, Command, Response};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Gradian Mock Server Example ===\n");

    let agent = AgentConfig::new("schema-builder", "You design schemas.", ResponseFormat::Json);
    let request = BuilderRequest::new("schema-builder", "A schema for invoices");

    // Define a sequence of expected request/response pairs
    let interactions = vec![
        // Client lists the available agents
        (Command::ListAgents, Response::Agents(vec![agent.clone()])),
        // Client runs a generation
        (
            Command::Generate(request.clone()),
            Response::Generation(BuilderResponse {
                response: r#"{"id": "invoices", "singular_name": "Invoice", "plural_name": "Invoices", "sections": [], "fields": []}"#
                    .to_string(),
                token_usage: None,
            }),
        ),
        // Client checks the backend's health
        (
            Command::HealthCheck {
                url: "/api/health".to_string(),
            },
            Response::Health(HealthReport {
                status: HealthStatus::Degraded,
                ..HealthReport::default()
            }),
        ),
    ];

    // Create a test environment with the mock server
    let mut test = ClientMockTest::new(interactions)?;

    println!("1. Listing agents:");
    match test.send_command(Command::ListAgents)? {
        Response::Agents(agents) => {
            for agent in agents {
                println!("  - {} ({})", agent.id, agent.response_format);
            }
        }
        _ => println!("Unexpected response"),
    }

    println!("\n2. Generating:");
    match test.send_command(Command::Generate(request))? {
        Response::Generation(generation) => {
            let parsed = generation.parse_for(&agent)?;
            println!("Parsed as {}: {:?}", parsed.format(), parsed.as_json());
            if let Some(schema) = parsed.as_json() {
                match gradian_client::ai::validate_schema(schema) {
                    Ok(()) => println!("Schema passes approval"),
                    Err(e) => println!("Schema rejected: {e}"),
                }
            }
        }
        _ => println!("Unexpected response"),
    }

    println!("\n3. Health check:");
    match test.send_command(Command::HealthCheck {
        url: "/api/health".to_string(),
    })? {
        Response::Health(report) => {
            println!("Backend is {}", report.status);

            // Schedule the next poll at the configured interval
            let config = ClientConfig::default();
            let mut monitor = HealthMonitor::from_config(&config)?;
            let now = Instant::now();
            monitor.register(MonitoredService::new("api", "API", "/api/health"), now);
            monitor.record_success("api", report, now)?;
            println!(
                "Next poll in {}s, {} service(s) due now",
                monitor.interval().as_secs(),
                monitor.due(now).len()
            );
        }
        _ => println!("Unexpected response"),
    }

    println!("\nAll interactions complete: {}", test.is_complete());
    println!("Client state: {}", test.client().state());

    println!("\n=== Mock Server Example Complete ===");
    Ok(())
}
