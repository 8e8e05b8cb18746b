//! Workspace persistence, including creation and the full cascade delete.

use async_trait::async_trait;
use grupa_domain::{
    Channel, JoinCode, Member, StorageId, UserId, Workspace, WorkspaceId, WorkspaceName,
};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::cascade::{delete_messages, message_ids_where};
use super::channel_repo::insert_channel;
use super::helpers::{db_err, ts, RowExt};
use super::member_repo::insert_member;
use crate::infrastructure::ports::{RepoError, WorkspaceRepo};

pub struct SqliteWorkspaceRepo {
    pool: SqlitePool,
}

impl SqliteWorkspaceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_workspace(row: &SqliteRow) -> Result<Workspace, RepoError> {
    let name = WorkspaceName::new(row.text("name")?).map_err(RepoError::serialization)?;
    let join_code = JoinCode::parse(&row.text("join_code")?).map_err(RepoError::serialization)?;
    Ok(Workspace::from_parts(
        row.id("id")?,
        name,
        row.id("user_id")?,
        join_code,
        row.datetime("created_at")?,
    ))
}

#[async_trait]
impl WorkspaceRepo for SqliteWorkspaceRepo {
    async fn get(&self, id: WorkspaceId) -> Result<Option<Workspace>, RepoError> {
        sqlx::query("SELECT * FROM workspaces WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("workspace_get"))?
            .map(|row| row_to_workspace(&row))
            .transpose()
    }

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<Workspace>, RepoError> {
        sqlx::query("SELECT * FROM workspaces WHERE join_code = ? ORDER BY created_at LIMIT 1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("workspace_find_by_join_code"))?
            .map(|row| row_to_workspace(&row))
            .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Workspace>, RepoError> {
        let rows = sqlx::query(
            r#"
            SELECT w.* FROM workspaces w
            JOIN members m ON m.workspace_id = w.id
            WHERE m.user_id = ?
            ORDER BY w.created_at, w.rowid
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("workspace_list_for_user"))?;

        rows.iter().map(row_to_workspace).collect()
    }

    async fn create(
        &self,
        workspace: &Workspace,
        owner: &Member,
        default_channel: &Channel,
    ) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err("workspace_create"))?;

        sqlx::query(
            "INSERT INTO workspaces (id, name, user_id, join_code, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(workspace.id().to_string())
        .bind(workspace.name().as_str())
        .bind(workspace.owner_id().to_string())
        .bind(workspace.join_code().as_str())
        .bind(ts(workspace.created_at()))
        .execute(&mut *tx)
        .await
        .map_err(db_err("workspace_create"))?;

        insert_member(&mut tx, owner).await?;
        insert_channel(&mut tx, default_channel).await?;

        tx.commit().await.map_err(db_err("workspace_create"))?;
        Ok(())
    }

    async fn save(&self, workspace: &Workspace) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE workspaces SET name = ?, join_code = ? WHERE id = ?")
            .bind(workspace.name().as_str())
            .bind(workspace.join_code().as_str())
            .bind(workspace.id().to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err("workspace_save"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Workspace", workspace.id()));
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: WorkspaceId) -> Result<Vec<StorageId>, RepoError> {
        let key = id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err("workspace_delete"))?;

        let message_ids = message_ids_where(&mut tx, "workspace_id", &key).await?;
        let images = delete_messages(&mut tx, message_ids).await?;

        for sql in [
            "DELETE FROM reactions WHERE workspace_id = ?",
            "DELETE FROM conversations WHERE workspace_id = ?",
            "DELETE FROM channels WHERE workspace_id = ?",
            "DELETE FROM members WHERE workspace_id = ?",
            "DELETE FROM workspaces WHERE id = ?",
        ] {
            sqlx::query(sql)
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(db_err("workspace_delete"))?;
        }

        tx.commit().await.map_err(db_err("workspace_delete"))?;
        tracing::info!(workspace_id = %id, images = images.len(), "Workspace deleted with contents");
        Ok(images)
    }
}
