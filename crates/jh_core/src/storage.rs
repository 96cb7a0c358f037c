use async_trait::async_trait;

use crate::models::{Comment, Like, PostCounters, Report, ReportStatus, WriteBatch};
use crate::Result;

#[async_trait]
pub trait ModerationStore: Send + Sync {
    /// Applies every write in the batch atomically. A failing write leaves the store untouched.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Counters for a post, including posts that were deleted by moderation
    async fn get_post(&self, post_id: &str) -> Result<Option<PostCounters>>;

    async fn get_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>>;

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>>;

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>>;

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>>;
}
