//! Reaction persistence.

use async_trait::async_trait;
use grupa_domain::{MemberId, MessageId, Reaction, ReactionId, ReactionValue};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::helpers::{db_err, ts, RowExt};
use crate::infrastructure::ports::{ReactionRepo, RepoError};

pub struct SqliteReactionRepo {
    pool: SqlitePool,
}

impl SqliteReactionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_reaction(row: &SqliteRow) -> Result<Reaction, RepoError> {
    Ok(Reaction {
        id: row.id("id")?,
        workspace_id: row.id("workspace_id")?,
        message_id: row.id("message_id")?,
        member_id: row.id("member_id")?,
        value: ReactionValue::new(row.text("value")?).map_err(RepoError::serialization)?,
        created_at: row.datetime("created_at")?,
    })
}

#[async_trait]
impl ReactionRepo for SqliteReactionRepo {
    async fn list_for_message(&self, message_id: MessageId) -> Result<Vec<Reaction>, RepoError> {
        let rows = sqlx::query("SELECT * FROM reactions WHERE message_id = ? ORDER BY rowid")
            .bind(message_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("reaction_list"))?;
        rows.iter().map(row_to_reaction).collect()
    }

    async fn find(
        &self,
        message_id: MessageId,
        member_id: MemberId,
        value: &ReactionValue,
    ) -> Result<Option<Reaction>, RepoError> {
        sqlx::query("SELECT * FROM reactions WHERE message_id = ? AND member_id = ? AND value = ?")
            .bind(message_id.to_string())
            .bind(member_id.to_string())
            .bind(value.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("reaction_find"))?
            .map(|row| row_to_reaction(&row))
            .transpose()
    }

    async fn save(&self, reaction: &Reaction) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO reactions (id, workspace_id, message_id, member_id, value, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reaction.id.to_string())
        .bind(reaction.workspace_id.to_string())
        .bind(reaction.message_id.to_string())
        .bind(reaction.member_id.to_string())
        .bind(reaction.value.as_str())
        .bind(ts(reaction.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err("reaction_save"))?;
        Ok(())
    }

    async fn delete(&self, id: ReactionId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM reactions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err("reaction_delete"))?;
        Ok(())
    }
}
