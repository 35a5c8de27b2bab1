//! High-level threading API for discussions.
//!
//! This module turns the flat engagement list of a record's discussion into
//! reply trees and display rows. It provides:
//!
//! - **Thread building**: Organizing engagements into ordered reply trees
//! - **Rendering**: Flattening trees into indented rows with resolved authors
//! - **Message composition**: Building new messages and replies for posting
//! - **Extension traits**: Adding high-level methods to Gradian clients
//!
//! # Overview
//!
//! - [`ThreadNode`]: A node in the thread tree containing an engagement and its replies
//! - [`DiscussionForest`]: All threads of a discussion, newest thread first
//! - [`ThreadRow`]: One rendered, indented row
//! - [`UserResolver`]: Looks up display names and avatars for authors
//! - [`EngagementBuilder`]: A fluent builder for composing new messages
//! - [`DiscussionExt`]: Extension trait adding discussion operations to clients
//!
//! # Example
//!
//! ```
//! use gradian_client::i18n::LanguageContext;
//! use gradian_client::response::Engagement;
//! use gradian_client::threading::{build_threads, render_rows, NoResolver};
//!
//! let forest = build_threads(vec![
//!     Engagement::new("q", "2024-03-01T09:00:00Z", "Can we ship Friday?"),
//!     Engagement::new("a", "2024-03-01T10:00:00Z", "Yes").in_reply_to("q"),
//! ])?;
//!
//! for row in render_rows(&forest, &NoResolver, &LanguageContext::default()) {
//!     println!("{}{}", "  ".repeat(row.depth), row.message);
//! }
//! # Ok::<(), gradian_client::Error>(())
//! ```

mod algorithm;
mod author;
mod builder;
mod ext;
mod render;
mod types;

// Re-export public types
pub use algorithm::build_threads;
pub use author::{resolve_author, AuthorDisplay, NoResolver, ResolvedUser, UserResolver};
pub use builder::EngagementBuilder;
pub use ext::DiscussionExt;
pub use render::{render_rows, ThreadRow};
pub use types::{DiscussionForest, ThreadNode, ThreadNodeIterator};
