//! Likes, comments and the report queue. Every operation that touches a
//! counter commits the record and the counter change as one batch.

use std::sync::Arc;

use chrono::Utc;
use jh_core::{
    Comment, ContentType, Counter, Error, Like, ModerationAction, ModerationStore, PostCounters,
    Report, ReportStatus, Result, WriteBatch,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SPAM_SCORE_THRESHOLD: f64 = 0.7;
pub const REPORT_COUNT_THRESHOLD: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    Dismiss,
    DeleteContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionSignal {
    #[serde(default)]
    pub post_text: String,
    pub spam_score: f64,
    pub report_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionDecision {
    pub should_suppress: bool,
    pub reason: String,
}

fn required(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_input(format!("{} must not be empty", what)));
    }
    Ok(value.to_string())
}

#[derive(Clone)]
pub struct Moderator {
    store: Arc<dyn ModerationStore>,
}

impl Moderator {
    pub fn new(store: Arc<dyn ModerationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ModerationStore> {
        &self.store
    }

    pub async fn register_post(&self, post_id: &str) -> Result<PostCounters> {
        let post_id = required(post_id, "post id")?;
        let mut batch = WriteBatch::new();
        batch.create_post(post_id.as_str());
        self.store.commit(batch).await?;
        self.live_post(&post_id).await
    }

    async fn live_post(&self, post_id: &str) -> Result<PostCounters> {
        self.store
            .get_post(post_id)
            .await?
            .filter(|post| !post.deleted)
            .ok_or_else(|| Error::not_found(format!("post {}", post_id)))
    }

    pub async fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<LikeState> {
        let user_id = required(user_id, "user id")?;
        self.live_post(post_id).await?;

        // The like can change between the read and the commit. Retry once.
        let liked = match self.flip_like(post_id, &user_id).await {
            Err(Error::InvalidInput(_)) | Err(Error::NotFound(_)) => {
                tracing::debug!("Like by {} on post {} changed underneath, retrying", user_id, post_id);
                self.flip_like(post_id, &user_id).await?
            }
            other => other?,
        };

        let post = self.live_post(post_id).await?;
        tracing::debug!(
            "{} {} post {} ({} likes)",
            user_id,
            if liked { "liked" } else { "unliked" },
            post_id,
            post.like_count
        );
        Ok(LikeState {
            liked,
            like_count: post.like_count,
        })
    }

    async fn flip_like(&self, post_id: &str, user_id: &str) -> Result<bool> {
        let existing = self.store.get_like(post_id, user_id).await?;
        let mut batch = WriteBatch::new();
        if existing.is_some() {
            batch
                .delete_like(post_id, user_id)
                .increment(post_id, Counter::Likes, -1);
        } else {
            batch
                .set_like(Like {
                    post_id: post_id.to_string(),
                    user_id: user_id.to_string(),
                    created_at: Utc::now(),
                })
                .increment(post_id, Counter::Likes, 1);
        }
        self.store.commit(batch).await?;
        Ok(existing.is_none())
    }

    pub async fn add_comment(&self, post_id: &str, author_id: &str, content: &str) -> Result<Comment> {
        let author_id = required(author_id, "author id")?;
        let content = required(content, "comment")?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author_id,
            content,
            created_at: Utc::now(),
        };
        let mut batch = WriteBatch::new();
        batch
            .add_comment(comment.clone())
            .increment(post_id, Counter::Comments, 1);
        self.store.commit(batch).await?;
        Ok(comment)
    }

    pub async fn submit_report(
        &self,
        reporter_id: &str,
        content_type: ContentType,
        content_id: &str,
        reason: &str,
    ) -> Result<Report> {
        let report = Report {
            id: Uuid::new_v4().to_string(),
            reporter_id: required(reporter_id, "reporter id")?,
            content_type,
            content_id: required(content_id, "content id")?,
            reason: required(reason, "reason")?,
            status: ReportStatus::Open,
            created_at: Utc::now(),
            moderator_id: None,
            action_taken: None,
        };

        let mut batch = WriteBatch::new();
        batch.create_report(report.clone());
        if content_type == ContentType::Post {
            batch.increment(report.content_id.as_str(), Counter::Reports, 1);
        }
        self.store.commit(batch).await?;
        tracing::info!("Report {} opened on {} {}", report.id, content_type, report.content_id);
        Ok(report)
    }

    pub async fn open_reports(&self) -> Result<Vec<Report>> {
        self.store.list_reports(Some(ReportStatus::Open)).await
    }

    pub async fn resolve_report(
        &self,
        report_id: &str,
        resolution: Resolution,
        moderator_id: &str,
    ) -> Result<Report> {
        let moderator_id = required(moderator_id, "moderator id")?;
        let report = self
            .store
            .get_report(report_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("report {}", report_id)))?;
        if report.status != ReportStatus::Open {
            return Err(Error::invalid_input(format!(
                "report {} is already {}",
                report.id, report.status
            )));
        }

        let mut batch = WriteBatch::new();
        let action = match resolution {
            Resolution::Dismiss => ModerationAction::Dismiss,
            Resolution::DeleteContent => {
                if report.content_type != ContentType::Post {
                    return Err(Error::invalid_input(format!(
                        "deleting {} content is not supported",
                        report.content_type
                    )));
                }
                let exists = self
                    .store
                    .get_post(&report.content_id)
                    .await?
                    .is_some_and(|post| !post.deleted);
                if exists {
                    batch.delete_post(report.content_id.as_str());
                    ModerationAction::Delete
                } else {
                    tracing::warn!("Post {} was already gone when report {} was handled", report.content_id, report.id);
                    ModerationAction::DismissDeleted
                }
            }
        };
        batch.update_report(
            report.id.as_str(),
            ReportStatus::Resolved,
            Some(action),
            Some(moderator_id),
        );
        self.store.commit(batch).await?;
        tracing::info!("Report {} resolved with {}", report.id, action);

        self.store
            .get_report(&report.id)
            .await?
            .ok_or_else(|| Error::not_found(format!("report {}", report.id)))
    }

    pub fn should_suppress(&self, signal: &SuppressionSignal) -> SuppressionDecision {
        suppression_decision(signal)
    }
}

pub fn suppression_decision(signal: &SuppressionSignal) -> SuppressionDecision {
    let mut reasons = Vec::new();
    if signal.spam_score > SPAM_SCORE_THRESHOLD {
        reasons.push(format!(
            "spam score {:.2} is above {}",
            signal.spam_score, SPAM_SCORE_THRESHOLD
        ));
    }
    if signal.report_count > REPORT_COUNT_THRESHOLD {
        reasons.push(format!(
            "{} user reports exceed the limit of {}",
            signal.report_count, REPORT_COUNT_THRESHOLD
        ));
    }

    if reasons.is_empty() {
        SuppressionDecision {
            should_suppress: false,
            reason: "No suppression signals.".to_string(),
        }
    } else {
        SuppressionDecision {
            should_suppress: true,
            reason: format!("Suppressed: {}.", reasons.join(" and ")),
        }
    }
}
