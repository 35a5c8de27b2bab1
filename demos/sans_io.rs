//! Example demonstrating basic sans-io usage of gradian-client.
//!
//! This example shows how to use the sans-io client directly,
//! handling HTTP I/O manually.

use gradian_client::{Client, Command, DiscussionQuery, HttpResponse, Response};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Gradian Sans-IO Example ===\n");

    // Create a new sans-io client
    let mut client = Client::new("https://gradian.example.com")?;
    println!("Client created in state: {}", client.state());

    // Example 1: Encode a command
    println!("\n1. Encoding commands:");

    let query = DiscussionQuery::new("tickets", "t-1").for_user("u-1");
    let request = client.encode_command(Command::ListDiscussion(query))?;
    println!(
        "{} {}",
        request.method.as_str(),
        client.url_for(&request)?
    );
    println!("Client state while waiting: {}", client.state());

    // Example 2: Decode the reply
    println!("\n2. Decoding responses:");

    // Simulate the backend's reply
    let reply = HttpResponse::json(
        200,
        &json!([
            {"id": "e1", "createdAt": "2024-03-01T09:00:00Z", "message": "Can we ship Friday?"},
            {"id": "e2", "createdAt": "2024-03-01T10:00:00Z", "message": "Yes",
             "referenceEngagementId": "e1"}
        ]),
    );
    match client.decode_response(&reply)? {
        Response::Discussion(messages) => {
            println!("Received {} messages:", messages.len());
            for message in messages {
                println!("  - {} (reply to {:?}): {}", message.id, message.parent_id(), message.message);
            }
        }
        _ => println!("Unexpected response"),
    }

    // Example 3: Errors arrive as responses
    println!("\n3. Error envelopes:");
    client.encode_command(Command::GetAgent("missing".to_string()))?;
    let reply = HttpResponse::json(404, &json!({"success": false, "error": "Agent not found"}));
    let response = client.decode_response(&reply)?;
    println!(
        "Status {:?}: {:?}",
        response.error_status(),
        response.error_message()
    );

    println!("\nIs ready: {}", client.is_ready());
    println!("\n=== Sans-IO Example Complete ===");
    Ok(())
}
