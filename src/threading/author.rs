//! Author display resolution.

use std::collections::HashMap;

use crate::i18n::LanguageContext;
use crate::response::{Engagement, UserInfo};
use crate::utils::initials;

/// Display information for an engagement's author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorDisplay {
    /// Author user id (empty when the engagement has no author)
    pub user_id: String,
    /// Name to display
    pub name: String,
    /// Avatar URL, if any
    pub avatar: Option<String>,
    /// Fallback initials for avatar placeholders
    pub initials: String,
}

/// User data supplied by an external resolver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedUser {
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
}

/// Looks up users by id, typically from a user directory the caller already has.
///
/// Implemented for closures and for maps of `user id -> ResolvedUser`.
pub trait UserResolver {
    /// Resolve a user id, returning `None` when the user is unknown.
    fn resolve(&self, user_id: &str) -> Option<ResolvedUser>;
}

impl<F> UserResolver for F
where
    F: Fn(&str) -> Option<ResolvedUser>,
{
    fn resolve(&self, user_id: &str) -> Option<ResolvedUser> {
        self(user_id)
    }
}

impl UserResolver for HashMap<String, ResolvedUser> {
    fn resolve(&self, user_id: &str) -> Option<ResolvedUser> {
        self.get(user_id).cloned()
    }
}

/// A resolver that knows no users.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl UserResolver for NoResolver {
    fn resolve(&self, _user_id: &str) -> Option<ResolvedUser> {
        None
    }
}

/// Resolve author display data for an engagement.
///
/// Precedence: the external resolver, then fields of an embedded `createdBy`
/// object, then the raw user id. Name and avatar fall back independently.
/// Never fails: with no data at all the raw id is the name.
pub fn resolve_author(
    engagement: &Engagement,
    resolver: &dyn UserResolver,
    languages: &LanguageContext,
) -> AuthorDisplay {
    let user_id = engagement.author_id().unwrap_or_default().to_string();
    let embedded: Option<&UserInfo> = engagement.created_by.as_ref().and_then(|c| c.user());
    let external = if user_id.is_empty() {
        None
    } else {
        resolver.resolve(&user_id)
    };

    let name = external
        .as_ref()
        .and_then(|u| u.name.clone())
        .filter(|n| !n.trim().is_empty())
        .or_else(|| embedded.and_then(|u| u.full_name(languages)))
        .or_else(|| {
            embedded
                .and_then(|u| u.username.clone())
                .filter(|n| !n.trim().is_empty())
        })
        .unwrap_or_else(|| user_id.clone());

    let avatar = external
        .and_then(|u| u.avatar)
        .or_else(|| embedded.and_then(|u| u.avatar.clone()))
        .filter(|a| !a.trim().is_empty());

    AuthorDisplay {
        initials: initials(&name),
        user_id,
        name,
        avatar,
    }
}
