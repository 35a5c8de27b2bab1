//! Discussion engagement types.

use serde::{Deserialize, Serialize};

use crate::i18n::{LanguageContext, LocalizedText};
use crate::utils::timestamp_millis;

/// Priority of a discussion message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority
    Medium,
    /// High priority
    High,
    /// Urgent
    Urgent,
}

impl Priority {
    /// Wire name of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

/// User information embedded in an engagement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User id
    pub id: String,
    /// Localized first name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<LocalizedText>,
    /// Localized last name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<LocalizedText>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Login name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserInfo {
    /// Full name resolved for the given languages, if any name is present.
    pub fn full_name(&self, languages: &LanguageContext) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_ref()?.resolve(languages))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Author of an engagement: a bare user id or an embedded user object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedBy {
    /// Plain user id
    Id(String),
    /// Embedded user information
    User(UserInfo),
}

impl CreatedBy {
    /// The author's user id.
    pub fn user_id(&self) -> &str {
        match self {
            CreatedBy::Id(id) => id,
            CreatedBy::User(user) => &user.id,
        }
    }

    /// The embedded user information, if present.
    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            CreatedBy::Id(_) => None,
            CreatedBy::User(user) => Some(user),
        }
    }
}

/// A per-user read receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// User who read the engagement
    pub user_id: String,
    /// When it was read (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
}

/// A discussion message attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    /// Unique id
    pub id: String,
    /// Id of the parent message; absent or empty for root messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_engagement_id: Option<String>,
    /// Creation time (ISO-8601)
    #[serde(default)]
    pub created_at: String,
    /// Message body
    #[serde(default)]
    pub message: String,
    /// Optional priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<CreatedBy>,
    /// Read receipts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,
    /// Schema of the record this discussion belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_schema_id: Option<String>,
    /// Instance of the record this discussion belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_instance_id: Option<String>,
    /// Last update time (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Engagement {
    /// Create a root engagement with the minimum required fields.
    pub fn new(
        id: impl Into<String>,
        created_at: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            reference_engagement_id: None,
            created_at: created_at.into(),
            message: message.into(),
            priority: None,
            created_by: None,
            interactions: Vec::new(),
            reference_schema_id: None,
            reference_instance_id: None,
            updated_at: None,
        }
    }

    /// Set the parent engagement id.
    pub fn in_reply_to(mut self, parent_id: impl Into<String>) -> Self {
        self.reference_engagement_id = Some(parent_id.into());
        self
    }

    /// Set the author.
    pub fn created_by(mut self, author: CreatedBy) -> Self {
        self.created_by = Some(author);
        self
    }

    /// The parent id, treating an empty string as absent.
    pub fn parent_id(&self) -> Option<&str> {
        self.reference_engagement_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Check if this engagement starts a thread.
    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    /// Creation time in epoch milliseconds (0 if unparseable).
    pub fn created_at_millis(&self) -> i64 {
        timestamp_millis(&self.created_at)
    }

    /// Author user id, if known.
    pub fn author_id(&self) -> Option<&str> {
        self.created_by.as_ref().map(CreatedBy::user_id)
    }

    /// When the given user read this engagement.
    pub fn read_at(&self, user_id: &str) -> Option<&str> {
        self.interactions
            .iter()
            .find(|i| i.user_id == user_id)
            .and_then(|i| i.read_at.as_deref())
    }

    /// Check if the given user has read this engagement.
    ///
    /// Authors have implicitly read their own messages.
    pub fn is_read_by(&self, user_id: &str) -> bool {
        self.author_id() == Some(user_id) || self.read_at(user_id).is_some()
    }
}

/// Body of a new discussion post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEngagement {
    /// Message body
    pub message: String,
    /// Optional priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Parent engagement for replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_engagement_id: Option<String>,
}
