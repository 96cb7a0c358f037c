use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::invalid_input(format!(
                        "unknown {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Comment,
    User,
    Service,
}

string_enum!(ContentType {
    Post => "post",
    Comment => "comment",
    User => "user",
    Service => "service",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Open,
    InProgress,
    Resolved,
    Dismissed,
}

string_enum!(ReportStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Dismissed => "dismissed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Delete,
    Dismiss,
    /// The content was already gone when the moderator acted.
    DismissDeleted,
}

string_enum!(ModerationAction {
    Delete => "delete",
    Dismiss => "dismiss",
    DismissDeleted => "dismiss_deleted",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Likes,
    Comments,
    Reports,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounters {
    pub post_id: String,
    pub like_count: u64,
    pub comment_count: u64,
    pub report_count: u64,
    pub deleted: bool,
}

impl PostCounters {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            like_count: 0,
            comment_count: 0,
            report_count: 0,
            deleted: false,
        }
    }

    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Likes => self.like_count,
            Counter::Comments => self.comment_count,
            Counter::Reports => self.report_count,
        }
    }

    /// Applies a signed delta, saturating at zero.
    pub fn apply(&mut self, counter: Counter, delta: i64) {
        let slot = match counter {
            Counter::Likes => &mut self.like_count,
            Counter::Comments => &mut self.comment_count,
            Counter::Reports => &mut self.report_count,
        };
        *slot = if delta >= 0 {
            slot.saturating_add(delta as u64)
        } else {
            slot.saturating_sub(delta.unsigned_abs())
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub post_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub reporter_id: String,
    pub content_type: ContentType,
    pub content_id: String,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<ModerationAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    CreatePost {
        post_id: String,
    },
    DeletePost {
        post_id: String,
    },
    Increment {
        post_id: String,
        counter: Counter,
        delta: i64,
    },
    SetLike(Like),
    DeleteLike {
        post_id: String,
        user_id: String,
    },
    AddComment(Comment),
    CreateReport(Report),
    UpdateReport {
        report_id: String,
        status: ReportStatus,
        action: Option<ModerationAction>,
        moderator_id: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn create_post(&mut self, post_id: impl Into<String>) -> &mut Self {
        self.push(WriteOp::CreatePost {
            post_id: post_id.into(),
        })
    }

    pub fn delete_post(&mut self, post_id: impl Into<String>) -> &mut Self {
        self.push(WriteOp::DeletePost {
            post_id: post_id.into(),
        })
    }

    pub fn increment(&mut self, post_id: impl Into<String>, counter: Counter, delta: i64) -> &mut Self {
        self.push(WriteOp::Increment {
            post_id: post_id.into(),
            counter,
            delta,
        })
    }

    pub fn set_like(&mut self, like: Like) -> &mut Self {
        self.push(WriteOp::SetLike(like))
    }

    pub fn delete_like(&mut self, post_id: impl Into<String>, user_id: impl Into<String>) -> &mut Self {
        self.push(WriteOp::DeleteLike {
            post_id: post_id.into(),
            user_id: user_id.into(),
        })
    }

    pub fn add_comment(&mut self, comment: Comment) -> &mut Self {
        self.push(WriteOp::AddComment(comment))
    }

    pub fn create_report(&mut self, report: Report) -> &mut Self {
        self.push(WriteOp::CreateReport(report))
    }

    pub fn update_report(
        &mut self,
        report_id: impl Into<String>,
        status: ReportStatus,
        action: Option<ModerationAction>,
        moderator_id: Option<String>,
    ) -> &mut Self {
        self.push(WriteOp::UpdateReport {
            report_id: report_id.into(),
            status,
            action,
            moderator_id,
        })
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_apply_saturates() {
        let mut post = PostCounters::new("p1");
        post.apply(Counter::Likes, 2);
        post.apply(Counter::Likes, -5);
        post.apply(Counter::Comments, 1);
        assert_eq!(post.get(Counter::Likes), 0);
        assert_eq!(post.get(Counter::Comments), 1);
        assert_eq!(post.get(Counter::Reports), 0);
    }

    #[test]
    fn test_string_enums_round_trip_text() {
        assert_eq!("dismiss_deleted".parse::<ModerationAction>().unwrap(), ModerationAction::DismissDeleted);
        assert_eq!(ReportStatus::InProgress.as_str(), "in_progress");
        assert!("banana".parse::<ContentType>().is_err());
        assert_eq!(
            serde_json::to_string(&ModerationAction::DismissDeleted).unwrap(),
            "\"dismiss_deleted\""
        );
    }

    #[test]
    fn test_batch_builder_keeps_order() {
        let mut batch = WriteBatch::new();
        batch
            .delete_like("p1", "u1")
            .increment("p1", Counter::Likes, -1);
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.ops()[0], WriteOp::DeleteLike { .. }));
        assert!(matches!(
            batch.ops()[1],
            WriteOp::Increment { counter: Counter::Likes, delta: -1, .. }
        ));
    }
}
