//! Flattening a discussion forest into display rows.

use crate::i18n::LanguageContext;
use crate::response::Priority;

use super::author::{resolve_author, AuthorDisplay, UserResolver};
use super::types::{DiscussionForest, ThreadNode};

/// One visually indented row of a rendered discussion.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRow {
    /// Engagement id
    pub id: String,
    /// Nesting depth (0 for thread roots)
    pub depth: usize,
    /// Whether to draw a continuation line below this row: true if it has
    /// replies or a younger sibling that is rendered later
    pub show_connector: bool,
    /// Whether this row is the last among its siblings
    pub is_last_sibling: bool,
    /// For each ancestor level (outermost first), whether that ancestor still
    /// has siblings below it, so a vertical guide passes this row
    pub ancestor_guides: Vec<bool>,
    /// Resolved author
    pub author: AuthorDisplay,
    /// Message body
    pub message: String,
    /// Priority, if set
    pub priority: Option<Priority>,
    /// Creation time as received
    pub created_at: String,
    /// Number of direct replies
    pub reply_count: usize,
}

/// Flatten a forest into display rows in reading order.
///
/// Rows come out depth-first: each root followed by its replies, oldest
/// first. Author names are resolved through `resolver` and `languages`.
///
/// # Example
///
/// ```
/// use gradian_client::i18n::LanguageContext;
/// use gradian_client::response::Engagement;
/// use gradian_client::threading::{build_threads, render_rows, NoResolver};
///
/// let forest = build_threads(vec![
///     Engagement::new("a", "2024-01-01T00:00:00Z", "question"),
///     Engagement::new("b", "2024-01-02T00:00:00Z", "answer").in_reply_to("a"),
/// ]).unwrap();
///
/// let rows = render_rows(&forest, &NoResolver, &LanguageContext::default());
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].depth, 1);
/// assert!(rows[0].show_connector);
/// assert!(!rows[1].show_connector);
/// ```
pub fn render_rows(
    forest: &DiscussionForest,
    resolver: &dyn UserResolver,
    languages: &LanguageContext,
) -> Vec<ThreadRow> {
    let mut rows = Vec::with_capacity(forest.total_messages());

    // (node, depth, is_last_sibling, guides of the ancestors)
    let mut stack: Vec<(&ThreadNode, usize, bool, Vec<bool>)> = Vec::new();
    push_siblings(&mut stack, forest.roots(), 0, &[]);

    while let Some((node, depth, is_last, guides)) = stack.pop() {
        rows.push(ThreadRow {
            id: node.engagement.id.clone(),
            depth,
            show_connector: node.has_replies() || !is_last,
            is_last_sibling: is_last,
            ancestor_guides: guides.clone(),
            author: resolve_author(&node.engagement, resolver, languages),
            message: node.engagement.message.clone(),
            priority: node.engagement.priority,
            created_at: node.engagement.created_at.clone(),
            reply_count: node.reply_count(),
        });

        let mut child_guides = guides;
        child_guides.push(!is_last);
        push_siblings(&mut stack, &node.children, depth + 1, &child_guides);
    }

    rows
}

fn push_siblings<'a>(
    stack: &mut Vec<(&'a ThreadNode, usize, bool, Vec<bool>)>,
    siblings: &'a [ThreadNode],
    depth: usize,
    guides: &[bool],
) {
    let last = siblings.len().saturating_sub(1);
    // Reverse so the first sibling is popped first
    for (position, node) in siblings.iter().enumerate().rev() {
        stack.push((node, depth, position == last, guides.to_vec()));
    }
}
