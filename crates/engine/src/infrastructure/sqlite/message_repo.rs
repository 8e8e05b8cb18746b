//! Message persistence and cursor pagination.
//!
//! The cursor is the `seq` rowid of the last message on the previous page.

use async_trait::async_trait;
use grupa_domain::{Message, MessageBody, MessageDraft, MessageId, Page, PageRequest, StorageId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::cascade::delete_messages;
use super::helpers::{db_err, opt_ts, ts, RowExt};
use crate::infrastructure::ports::{MessageRepo, MessageScope, RepoError, ThreadStats};

pub struct SqliteMessageRepo {
    pool: SqlitePool,
}

impl SqliteMessageRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &SqliteRow) -> Result<Message, RepoError> {
    let draft = MessageDraft {
        workspace_id: row.id("workspace_id")?,
        member_id: row.id("member_id")?,
        body: MessageBody::new(row.text("body")?).map_err(RepoError::serialization)?,
        image: row.opt_id("image")?,
        channel_id: row.opt_id("channel_id")?,
        conversation_id: row.opt_id("conversation_id")?,
        parent_message_id: row.opt_id("parent_message_id")?,
    };
    Ok(Message::from_parts(
        row.id("id")?,
        draft,
        row.datetime("created_at")?,
        row.opt_datetime("updated_at")?,
    ))
}

fn opt_key<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

#[async_trait]
impl MessageRepo for SqliteMessageRepo {
    async fn get(&self, id: MessageId) -> Result<Option<Message>, RepoError> {
        sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("message_get"))?
            .map(|row| row_to_message(&row))
            .transpose()
    }

    async fn save(&self, message: &Message) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO messages (
                id, workspace_id, member_id, body, image,
                channel_id, conversation_id, parent_message_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                image = excluded.image,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(message.id().to_string())
        .bind(message.workspace_id().to_string())
        .bind(message.member_id().to_string())
        .bind(message.body().as_str())
        .bind(opt_key(message.image()))
        .bind(opt_key(message.channel_id()))
        .bind(opt_key(message.conversation_id()))
        .bind(opt_key(message.parent_message_id()))
        .bind(ts(message.created_at()))
        .bind(opt_ts(message.updated_at()))
        .execute(&self.pool)
        .await
        .map_err(db_err("message_save"))?;
        Ok(())
    }

    async fn list_page(
        &self,
        scope: MessageScope,
        page: &PageRequest,
    ) -> Result<Page<Message>, RepoError> {
        let before: Option<i64> = match page.cursor.as_deref().filter(|c| !c.is_empty()) {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| RepoError::serialization(format!("invalid cursor: {}", raw)))?,
            ),
            None => None,
        };
        let limit = page.limit();

        let rows = sqlx::query(
            r#"
            SELECT * FROM messages
            WHERE channel_id IS ?
              AND conversation_id IS ?
              AND parent_message_id IS ?
              AND (? IS NULL OR seq < ?)
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(opt_key(scope.channel_id))
        .bind(opt_key(scope.conversation_id))
        .bind(opt_key(scope.parent_message_id))
        .bind(before)
        .bind(before)
        .bind(i64::from(limit) + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("message_list_page"))?;

        let is_done = rows.len() <= limit as usize;
        let rows = &rows[..rows.len().min(limit as usize)];

        let continue_cursor = match rows.last() {
            Some(row) => row
                .try_get::<i64, _>("seq")
                .map_err(|e| RepoError::serialization(format!("seq: {}", e)))?
                .to_string(),
            None => page.cursor.clone().unwrap_or_default(),
        };
        let messages = rows.iter().map(row_to_message).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            page: messages,
            is_done,
            continue_cursor,
        })
    }

    async fn thread_stats(&self, parent_id: MessageId) -> Result<ThreadStats, RepoError> {
        let key = parent_id.to_string();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM messages WHERE parent_message_id = ?")
            .bind(&key)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("message_thread_stats"))?
            .try_get("n")
            .map_err(|e| RepoError::serialization(format!("n: {}", e)))?;

        let last_reply = sqlx::query(
            "SELECT * FROM messages WHERE parent_message_id = ? ORDER BY seq DESC LIMIT 1",
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("message_thread_stats"))?
        .map(|row| row_to_message(&row))
        .transpose()?;

        Ok(ThreadStats {
            count: u32::try_from(count).unwrap_or(u32::MAX),
            last_reply,
        })
    }

    async fn delete_cascade(&self, id: MessageId) -> Result<Vec<StorageId>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err("message_delete"))?;
        let images = delete_messages(&mut tx, vec![id.to_string()]).await?;
        tx.commit().await.map_err(db_err("message_delete"))?;
        tracing::debug!(message_id = %id, images = images.len(), "Message deleted with replies");
        Ok(images)
    }
}
