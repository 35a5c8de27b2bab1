//! Extension trait for high-level discussion operations.
//!
//! This module defines the `DiscussionExt` trait which adds thread-aware
//! operations to Gradian clients.

use async_trait::async_trait;

use crate::error::Result;
use crate::net_client::GradianClient;
use crate::response::NewEngagement;
use crate::runtime::HttpTransport;

use super::algorithm::build_threads;
use super::types::DiscussionForest;

/// Extension trait adding discussion-thread operations to Gradian clients.
///
/// # Example
///
/// ```no_run
/// # #[cfg(feature = "reqwest-runtime")]
/// # {
/// use gradian_client::threading::DiscussionExt;
/// # use gradian_client::runtime::reqwest::GradianClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut client = GradianClient::connect(Default::default())?;
/// let forest = client.fetch_threads("tickets", "t-1").await?;
/// for thread in forest.iter().take(5) {
///     println!("{}: {} replies", thread.id(), thread.reply_count());
/// }
/// # Ok(())
/// # }
/// # }
/// ```
#[async_trait]
pub trait DiscussionExt {
    /// Fetch a record's discussion and build its reply tree.
    async fn fetch_threads(&mut self, schema_id: &str, instance_id: &str)
        -> Result<DiscussionForest>;

    /// Post a message, then refetch and rebuild the whole discussion.
    ///
    /// The posted message is never merged into a previously built tree.
    async fn post_and_refresh(
        &mut self,
        schema_id: &str,
        instance_id: &str,
        engagement: NewEngagement,
    ) -> Result<DiscussionForest>;
}

/// Blanket implementation of `DiscussionExt` for all `GradianClient<T>` where `T: HttpTransport`.
#[async_trait]
impl<T: HttpTransport> DiscussionExt for GradianClient<T> {
    async fn fetch_threads(
        &mut self,
        schema_id: &str,
        instance_id: &str,
    ) -> Result<DiscussionForest> {
        let messages = self.list_discussion(schema_id, instance_id).await?;
        build_threads(messages.0)
    }

    async fn post_and_refresh(
        &mut self,
        schema_id: &str,
        instance_id: &str,
        engagement: NewEngagement,
    ) -> Result<DiscussionForest> {
        self.post_discussion(schema_id, instance_id, engagement)
            .await?;
        self.fetch_threads(schema_id, instance_id).await
    }
}
