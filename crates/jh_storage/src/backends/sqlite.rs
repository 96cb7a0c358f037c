use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use jh_core::{
    Comment, Counter, Error, Like, ModerationStore, PostCounters, Report, ReportStatus, Result,
    WriteBatch, WriteOp,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        post_id TEXT PRIMARY KEY,
        like_count INTEGER NOT NULL DEFAULT 0,
        comment_count INTEGER NOT NULL DEFAULT 0,
        report_count INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS likes (
        post_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (post_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        post_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id TEXT PRIMARY KEY,
        reporter_id TEXT NOT NULL,
        content_type TEXT NOT NULL,
        content_id TEXT NOT NULL,
        reason TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        moderator_id TEXT,
        action_taken TEXT
    )
    "#,
];

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

// Fixed-width timestamps so text ordering matches time ordering.
fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(row: &SqliteRow) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get("created_at").map_err(db_error("read created_at"))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("bad timestamp {:?}: {}", raw, e)))
}

fn counter_column(counter: Counter) -> &'static str {
    match counter {
        Counter::Likes => "like_count",
        Counter::Comments => "comment_count",
        Counter::Reports => "report_count",
    }
}

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(db_error("parse database path"))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(db_error("connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("migration {}: {}", i, e)))?;
        }
        tracing::info!("SQLite moderation store ready at {}", db_path.display());

        Ok(Self { pool, db_path })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn ensure_live_post(tx: &mut Transaction<'_, Sqlite>, post_id: &str) -> Result<()> {
        let found = sqlx::query("SELECT 1 FROM posts WHERE post_id = ? AND deleted = 0")
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_error("look up post"))?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("post {}", post_id))),
        }
    }

    async fn apply(tx: &mut Transaction<'_, Sqlite>, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::CreatePost { post_id } => {
                let done = sqlx::query("INSERT OR IGNORE INTO posts (post_id) VALUES (?)")
                    .bind(&post_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(db_error("create post"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::invalid_input(format!("post {} already exists", post_id)));
                }
            }
            WriteOp::DeletePost { post_id } => {
                let done = sqlx::query("UPDATE posts SET deleted = 1 WHERE post_id = ? AND deleted = 0")
                    .bind(&post_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(db_error("delete post"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::not_found(format!("post {}", post_id)));
                }
            }
            WriteOp::Increment {
                post_id,
                counter,
                delta,
            } => {
                let column = counter_column(counter);
                let sql = format!(
                    "UPDATE posts SET {col} = MAX({col} + ?, 0) WHERE post_id = ? AND deleted = 0",
                    col = column
                );
                let done = sqlx::query(&sql)
                    .bind(delta)
                    .bind(&post_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(db_error("update counter"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::not_found(format!("post {}", post_id)));
                }
            }
            WriteOp::SetLike(like) => {
                Self::ensure_live_post(tx, &like.post_id).await?;
                let done = sqlx::query(
                    "INSERT OR IGNORE INTO likes (post_id, user_id, created_at) VALUES (?, ?, ?)",
                )
                .bind(&like.post_id)
                .bind(&like.user_id)
                .bind(encode_time(&like.created_at))
                .execute(&mut **tx)
                .await
                .map_err(db_error("store like"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::invalid_input(format!(
                        "user {} already likes post {}",
                        like.user_id, like.post_id
                    )));
                }
            }
            WriteOp::DeleteLike { post_id, user_id } => {
                let done = sqlx::query("DELETE FROM likes WHERE post_id = ? AND user_id = ?")
                    .bind(&post_id)
                    .bind(&user_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(db_error("delete like"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::not_found(format!("like by {} on post {}", user_id, post_id)));
                }
            }
            WriteOp::AddComment(comment) => {
                Self::ensure_live_post(tx, &comment.post_id).await?;
                sqlx::query(
                    "INSERT INTO comments (id, post_id, author_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&comment.id)
                .bind(&comment.post_id)
                .bind(&comment.author_id)
                .bind(&comment.content)
                .bind(encode_time(&comment.created_at))
                .execute(&mut **tx)
                .await
                .map_err(db_error("store comment"))?;
            }
            WriteOp::CreateReport(report) => {
                let done = sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO reports
                    (id, reporter_id, content_type, content_id, reason, status, created_at, moderator_id, action_taken)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&report.id)
                .bind(&report.reporter_id)
                .bind(report.content_type.as_str())
                .bind(&report.content_id)
                .bind(&report.reason)
                .bind(report.status.as_str())
                .bind(encode_time(&report.created_at))
                .bind(report.moderator_id.as_deref())
                .bind(report.action_taken.map(|a| a.as_str()))
                .execute(&mut **tx)
                .await
                .map_err(db_error("store report"))?;
                if done.rows_affected() == 0 {
                    return Err(Error::invalid_input(format!("report {} already exists", report.id)));
                }
            }
            WriteOp::UpdateReport {
                report_id,
                status,
                action,
                moderator_id,
            } => {
                let done = sqlx::query(
                    "UPDATE reports SET status = ?, action_taken = ?, moderator_id = ? WHERE id = ? AND status != ?",
                )
                .bind(status.as_str())
                .bind(action.map(|a| a.as_str()))
                .bind(moderator_id.as_deref())
                .bind(&report_id)
                .bind(ReportStatus::Resolved.as_str())
                .execute(&mut **tx)
                .await
                .map_err(db_error("update report"))?;
                if done.rows_affected() == 0 {
                    let exists = sqlx::query("SELECT 1 FROM reports WHERE id = ?")
                        .bind(&report_id)
                        .fetch_optional(&mut **tx)
                        .await
                        .map_err(db_error("load report"))?
                        .is_some();
                    return Err(if exists {
                        Error::invalid_input(format!("report {} is already resolved", report_id))
                    } else {
                        Error::not_found(format!("report {}", report_id))
                    });
                }
            }
        }
        Ok(())
    }

    fn post_from_row(row: &SqliteRow) -> Result<PostCounters> {
        let count = |column: &str| -> Result<u64> {
            let value: i64 = row.try_get(column).map_err(db_error("read post"))?;
            Ok(value.max(0) as u64)
        };
        Ok(PostCounters {
            post_id: row.try_get("post_id").map_err(db_error("read post"))?,
            like_count: count("like_count")?,
            comment_count: count("comment_count")?,
            report_count: count("report_count")?,
            deleted: row.try_get::<i64, _>("deleted").map_err(db_error("read post"))? != 0,
        })
    }

    fn report_from_row(row: &SqliteRow) -> Result<Report> {
        let text = |column: &str| -> Result<String> { row.try_get(column).map_err(db_error("read report")) };
        let action: Option<String> = row.try_get("action_taken").map_err(db_error("read report"))?;
        Ok(Report {
            id: text("id")?,
            reporter_id: text("reporter_id")?,
            content_type: text("content_type")?.parse()?,
            content_id: text("content_id")?,
            reason: text("reason")?,
            status: text("status")?.parse()?,
            created_at: decode_time(row)?,
            moderator_id: row.try_get("moderator_id").map_err(db_error("read report"))?,
            action_taken: action.map(|a| a.parse()).transpose()?,
        })
    }
}

#[async_trait]
impl ModerationStore for SQLiteStorage {
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;
        for op in batch.into_ops() {
            // Dropping `tx` on error rolls the whole batch back.
            Self::apply(&mut tx, op).await?;
        }
        tx.commit().await.map_err(db_error("commit transaction"))
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<PostCounters>> {
        let row = sqlx::query("SELECT * FROM posts WHERE post_id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get post"))?;
        row.as_ref().map(Self::post_from_row).transpose()
    }

    async fn get_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>> {
        let row = sqlx::query("SELECT * FROM likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get like"))?;
        row.map(|row| {
            Ok(Like {
                post_id: row.try_get("post_id").map_err(db_error("read like"))?,
                user_id: row.try_get("user_id").map_err(db_error("read like"))?,
                created_at: decode_time(&row)?,
            })
        })
        .transpose()
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query("SELECT * FROM comments WHERE post_id = ? ORDER BY created_at ASC")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list comments"))?;

        let mut comments = Vec::with_capacity(rows.len());
        for row in rows {
            let text = |column: &str| -> Result<String> { row.try_get(column).map_err(db_error("read comment")) };
            comments.push(Comment {
                id: text("id")?,
                post_id: text("post_id")?,
                author_id: text("author_id")?,
                content: text("content")?,
                created_at: decode_time(&row)?,
            });
        }
        Ok(comments)
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get report"))?;
        row.as_ref().map(Self::report_from_row).transpose()
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM reports WHERE status = ? ORDER BY created_at ASC")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM reports ORDER BY created_at ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_error("list reports"))?;

        rows.iter().map(Self::report_from_row).collect()
    }
}
