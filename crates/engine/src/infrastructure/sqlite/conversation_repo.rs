//! Direct-message conversation persistence.

use async_trait::async_trait;
use grupa_domain::{Conversation, ConversationId, MemberId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::helpers::{db_err, ts, RowExt};
use crate::infrastructure::ports::{ConversationRepo, RepoError};

pub struct SqliteConversationRepo {
    pool: SqlitePool,
}

impl SqliteConversationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_conversation(row: &SqliteRow) -> Result<Conversation, RepoError> {
    Ok(Conversation {
        id: row.id("id")?,
        workspace_id: row.id("workspace_id")?,
        member_one_id: row.id("member_one_id")?,
        member_two_id: row.id("member_two_id")?,
        created_at: row.datetime("created_at")?,
    })
}

#[async_trait]
impl ConversationRepo for SqliteConversationRepo {
    async fn get(&self, id: ConversationId) -> Result<Option<Conversation>, RepoError> {
        sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("conversation_get"))?
            .map(|row| row_to_conversation(&row))
            .transpose()
    }

    async fn find_between(
        &self,
        workspace_id: WorkspaceId,
        a: MemberId,
        b: MemberId,
    ) -> Result<Option<Conversation>, RepoError> {
        let (a, b) = (a.to_string(), b.to_string());
        sqlx::query(
            r#"
            SELECT * FROM conversations
            WHERE workspace_id = ?
              AND ((member_one_id = ? AND member_two_id = ?)
                OR (member_one_id = ? AND member_two_id = ?))
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(workspace_id.to_string())
        .bind(&a)
        .bind(&b)
        .bind(&b)
        .bind(&a)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("conversation_find_between"))?
        .map(|row| row_to_conversation(&row))
        .transpose()
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, workspace_id, member_one_id, member_two_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.workspace_id.to_string())
        .bind(conversation.member_one_id.to_string())
        .bind(conversation.member_two_id.to_string())
        .bind(ts(conversation.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err("conversation_save"))?;
        Ok(())
    }
}
