//! Example rendering a discussion as an indented thread.
//!
//! Builds the reply tree from a flat message list and prints one row per
//! message, with guide lines and resolved author names.

use std::collections::HashMap;

use gradian_client::i18n::LanguageContext;
use gradian_client::response::{CreatedBy, Engagement};
use gradian_client::threading::{build_threads, render_rows, ResolvedUser, ThreadRow};

fn prefix(row: &ThreadRow) -> String {
    let mut prefix = String::new();
    for &guide in &row.ancestor_guides {
        prefix.push_str(if guide { "│  " } else { "   " });
    }
    if row.depth > 0 {
        prefix.push_str(if row.is_last_sibling { "└─ " } else { "├─ " });
    }
    prefix
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Discussion Thread Example ===\n");

    let by = |id: &str| CreatedBy::Id(id.to_string());
    let messages = vec![
        Engagement::new("e1", "2024-03-01T09:00:00Z", "Can we ship Friday?").created_by(by("u1")),
        Engagement::new("e2", "2024-03-01T09:20:00Z", "QA is still running")
            .in_reply_to("e1")
            .created_by(by("u2")),
        Engagement::new("e3", "2024-03-01T09:45:00Z", "Two failures left")
            .in_reply_to("e2")
            .created_by(by("u3")),
        Engagement::new("e4", "2024-03-01T11:00:00Z", "Then Monday")
            .in_reply_to("e1")
            .created_by(by("u1")),
        Engagement::new("e5", "2024-03-02T08:00:00Z", "Release notes are drafted")
            .created_by(by("u4")),
        Engagement::new("e6", "2024-03-02T08:30:00Z", "Reply to a deleted message")
            .in_reply_to("gone"),
    ];

    // A user directory the application already has
    let mut users = HashMap::new();
    users.insert(
        "u1".to_string(),
        ResolvedUser {
            name: Some("Ada Lovelace".to_string()),
            avatar: None,
        },
    );
    users.insert(
        "u2".to_string(),
        ResolvedUser {
            name: Some("Grace Hopper".to_string()),
            avatar: None,
        },
    );

    let forest = build_threads(messages)?;
    println!(
        "{} threads, {} messages, deepest reply at level {}",
        forest.len(),
        forest.total_messages(),
        forest.max_depth()
    );
    if !forest.dropped().is_empty() {
        println!("Not shown (parent missing): {:?}", forest.dropped());
    }
    println!();

    for row in render_rows(&forest, &users, &LanguageContext::default()) {
        println!(
            "{}[{}] {}: {}",
            prefix(&row),
            row.author.initials,
            row.author.name,
            row.message
        );
    }

    println!("\n=== Thread Example Complete ===");
    Ok(())
}
