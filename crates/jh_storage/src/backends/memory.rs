use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jh_core::{
    Comment, Error, Like, ModerationStore, PostCounters, Report, ReportStatus, Result, WriteBatch,
    WriteOp,
};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    posts: HashMap<String, PostCounters>,
    likes: HashMap<(String, String), Like>,
    comments: Vec<Comment>,
    reports: Vec<Report>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_post_mut(&mut self, post_id: &str) -> Result<&mut PostCounters> {
        self.posts
            .get_mut(post_id)
            .filter(|post| !post.deleted)
            .ok_or_else(|| Error::not_found(format!("post {}", post_id)))
    }

    fn apply(&mut self, op: WriteOp) -> Result<Undo> {
        let undo = match op {
            WriteOp::CreatePost { post_id } => {
                if self.posts.contains_key(&post_id) {
                    return Err(Error::invalid_input(format!("post {} already exists", post_id)));
                }
                self.posts.insert(post_id.clone(), PostCounters::new(post_id.as_str()));
                Undo::RemovePost(post_id)
            }
            WriteOp::DeletePost { post_id } => {
                let post = self.live_post_mut(&post_id)?;
                let before = post.clone();
                post.deleted = true;
                Undo::RestorePost(before)
            }
            WriteOp::Increment {
                post_id,
                counter,
                delta,
            } => {
                let post = self.live_post_mut(&post_id)?;
                let before = post.clone();
                post.apply(counter, delta);
                Undo::RestorePost(before)
            }
            WriteOp::SetLike(like) => {
                self.live_post_mut(&like.post_id)?;
                let key = (like.post_id.clone(), like.user_id.clone());
                if self.likes.contains_key(&key) {
                    return Err(Error::invalid_input(format!(
                        "user {} already likes post {}",
                        like.user_id, like.post_id
                    )));
                }
                self.likes.insert(key.clone(), like);
                Undo::RemoveLike(key)
            }
            WriteOp::DeleteLike { post_id, user_id } => {
                match self.likes.remove(&(post_id.clone(), user_id.clone())) {
                    Some(like) => Undo::RestoreLike(like),
                    None => {
                        return Err(Error::not_found(format!("like by {} on post {}", user_id, post_id)))
                    }
                }
            }
            WriteOp::AddComment(comment) => {
                self.live_post_mut(&comment.post_id)?;
                self.comments.push(comment);
                Undo::PopComment
            }
            WriteOp::CreateReport(report) => {
                if self.reports.iter().any(|r| r.id == report.id) {
                    return Err(Error::invalid_input(format!("report {} already exists", report.id)));
                }
                self.reports.push(report);
                Undo::PopReport
            }
            WriteOp::UpdateReport {
                report_id,
                status,
                action,
                moderator_id,
            } => {
                let index = self
                    .reports
                    .iter()
                    .position(|r| r.id == report_id)
                    .ok_or_else(|| Error::not_found(format!("report {}", report_id)))?;
                let report = &mut self.reports[index];
                if report.status == ReportStatus::Resolved {
                    return Err(Error::invalid_input(format!("report {} is already resolved", report_id)));
                }
                let before = report.clone();
                report.status = status;
                report.action_taken = action;
                report.moderator_id = moderator_id;
                Undo::RestoreReport(index, before)
            }
        };
        Ok(undo)
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::RemovePost(post_id) => {
                self.posts.remove(&post_id);
            }
            Undo::RestorePost(post) => {
                self.posts.insert(post.post_id.clone(), post);
            }
            Undo::RemoveLike(key) => {
                self.likes.remove(&key);
            }
            Undo::RestoreLike(like) => {
                self.likes.insert((like.post_id.clone(), like.user_id.clone()), like);
            }
            Undo::PopComment => {
                self.comments.pop();
            }
            Undo::PopReport => {
                self.reports.pop();
            }
            Undo::RestoreReport(index, report) => {
                self.reports[index] = report;
            }
        }
    }
}

// Inverse of one applied write, replayed newest first when a batch fails.
#[derive(Debug)]
enum Undo {
    RemovePost(String),
    RestorePost(PostCounters),
    RemoveLike((String, String)),
    RestoreLike(Like),
    PopComment,
    PopReport,
    RestoreReport(usize, Report),
}

/// Process-local store. Writes land in place and a failing batch is rolled
/// back from its undo log, so a commit only touches the entries it names.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModerationStore for MemoryStorage {
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut store = self.store.write().await;
        let mut undo = Vec::new();
        for op in batch.into_ops() {
            match store.apply(op) {
                Ok(step) => undo.push(step),
                Err(err) => {
                    while let Some(step) = undo.pop() {
                        store.revert(step);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<PostCounters>> {
        Ok(self.store.read().await.posts.get(post_id).cloned())
    }

    async fn get_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>> {
        let store = self.store.read().await;
        Ok(store
            .likes
            .get(&(post_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let store = self.store.read().await;
        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>> {
        let store = self.store.read().await;
        Ok(store.reports.iter().find(|r| r.id == report_id).cloned())
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let store = self.store.read().await;
        let mut reports: Vec<Report> = store
            .reports
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(reports)
    }
}
