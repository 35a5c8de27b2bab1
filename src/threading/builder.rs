//! Composing new discussion posts.

use crate::error::{Error, Result};
use crate::response::{Engagement, NewEngagement, Priority};

/// Builder for composing discussion messages and replies.
///
/// # Example
///
/// ```
/// use gradian_client::response::{Engagement, Priority};
/// use gradian_client::threading::EngagementBuilder;
///
/// let parent = Engagement::new("e1", "2024-01-01T00:00:00Z", "Is this approved?");
/// let reply = EngagementBuilder::new()
///     .message("Yes, approved.")
///     .priority(Priority::High)
///     .reply_to(&parent)
///     .build()
///     .unwrap();
///
/// assert_eq!(reply.reference_engagement_id.as_deref(), Some("e1"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngagementBuilder {
    message: Option<String>,
    priority: Option<Priority>,
    reference_engagement_id: Option<String>,
}

impl EngagementBuilder {
    /// Create a new engagement builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message body (required).
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Make this a reply to an existing engagement.
    pub fn reply_to(mut self, parent: &Engagement) -> Self {
        self.reference_engagement_id = Some(parent.id.clone());
        self
    }

    /// Make this a reply, using just the parent id.
    pub fn reply_to_id(mut self, parent_id: impl Into<String>) -> Self {
        self.reference_engagement_id = Some(parent_id.into());
        self
    }

    /// Build the request body.
    ///
    /// Returns an error if the message is missing or blank.
    pub fn build(self) -> Result<NewEngagement> {
        let message = self
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| Error::InvalidCommand("Message is required".to_string()))?;

        let reference_engagement_id = self
            .reference_engagement_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(NewEngagement {
            message,
            priority: self.priority,
            reference_engagement_id,
        })
    }
}
