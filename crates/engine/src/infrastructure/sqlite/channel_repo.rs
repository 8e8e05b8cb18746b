//! Channel persistence.

use async_trait::async_trait;
use grupa_domain::{Channel, ChannelId, ChannelName, StorageId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};

use super::cascade::{delete_messages, message_ids_where};
use super::helpers::{db_err, ts, RowExt};
use crate::infrastructure::ports::{ChannelRepo, RepoError};

pub struct SqliteChannelRepo {
    pool: SqlitePool,
}

impl SqliteChannelRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_channel(row: &SqliteRow) -> Result<Channel, RepoError> {
    Ok(Channel {
        id: row.id("id")?,
        workspace_id: row.id("workspace_id")?,
        name: ChannelName::new(row.text("name")?).map_err(RepoError::serialization)?,
        created_at: row.datetime("created_at")?,
    })
}

pub(super) async fn insert_channel(
    conn: &mut SqliteConnection,
    channel: &Channel,
) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO channels (id, workspace_id, name, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET name = excluded.name
        "#,
    )
    .bind(channel.id.to_string())
    .bind(channel.workspace_id.to_string())
    .bind(channel.name.as_str())
    .bind(ts(channel.created_at))
    .execute(&mut *conn)
    .await
    .map_err(db_err("channel_save"))?;
    Ok(())
}

#[async_trait]
impl ChannelRepo for SqliteChannelRepo {
    async fn get(&self, id: ChannelId) -> Result<Option<Channel>, RepoError> {
        sqlx::query("SELECT * FROM channels WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("channel_get"))?
            .map(|row| row_to_channel(&row))
            .transpose()
    }

    async fn find_by_name(
        &self,
        workspace_id: WorkspaceId,
        name: &ChannelName,
    ) -> Result<Option<Channel>, RepoError> {
        sqlx::query("SELECT * FROM channels WHERE workspace_id = ? AND name = ?")
            .bind(workspace_id.to_string())
            .bind(name.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("channel_find_by_name"))?
            .map(|row| row_to_channel(&row))
            .transpose()
    }

    async fn list_in_workspace(&self, workspace_id: WorkspaceId) -> Result<Vec<Channel>, RepoError> {
        let rows = sqlx::query("SELECT * FROM channels WHERE workspace_id = ? ORDER BY created_at, rowid")
            .bind(workspace_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("channel_list"))?;
        rows.iter().map(row_to_channel).collect()
    }

    async fn save(&self, channel: &Channel) -> Result<(), RepoError> {
        let mut conn = self.pool.acquire().await.map_err(db_err("channel_save"))?;
        insert_channel(&mut conn, channel).await
    }

    async fn delete_cascade(&self, id: ChannelId) -> Result<Vec<StorageId>, RepoError> {
        let key = id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err("channel_delete"))?;

        let message_ids = message_ids_where(&mut tx, "channel_id", &key).await?;
        let images = delete_messages(&mut tx, message_ids).await?;

        sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await
            .map_err(db_err("channel_delete"))?;

        tx.commit().await.map_err(db_err("channel_delete"))?;
        tracing::info!(channel_id = %id, images = images.len(), "Channel deleted with messages");
        Ok(images)
    }
}
