//! Membership persistence.

use async_trait::async_trait;
use grupa_domain::{Member, MemberId, MemberRole, StorageId, UserId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{SqliteConnection, SqlitePool};

use super::cascade::{delete_messages, message_ids_where};
use super::helpers::{db_err, placeholders, ts, RowExt};
use crate::infrastructure::ports::{MemberRepo, RepoError};

pub struct SqliteMemberRepo {
    pool: SqlitePool,
}

impl SqliteMemberRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_member(row: &SqliteRow) -> Result<Member, RepoError> {
    let role: MemberRole = row.text("role")?.parse().map_err(RepoError::serialization)?;
    Ok(Member {
        id: row.id("id")?,
        user_id: row.id("user_id")?,
        workspace_id: row.id("workspace_id")?,
        role,
        created_at: row.datetime("created_at")?,
    })
}

pub(super) async fn insert_member(
    conn: &mut SqliteConnection,
    member: &Member,
) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO members (id, user_id, workspace_id, role, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET role = excluded.role
        "#,
    )
    .bind(member.id.to_string())
    .bind(member.user_id.to_string())
    .bind(member.workspace_id.to_string())
    .bind(member.role.as_str())
    .bind(ts(member.created_at))
    .execute(&mut *conn)
    .await
    .map_err(db_err("member_save"))?;
    Ok(())
}

#[async_trait]
impl MemberRepo for SqliteMemberRepo {
    async fn get(&self, id: MemberId) -> Result<Option<Member>, RepoError> {
        sqlx::query("SELECT * FROM members WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("member_get"))?
            .map(|row| row_to_member(&row))
            .transpose()
    }

    async fn find(
        &self,
        workspace_id: WorkspaceId,
        user_id: UserId,
    ) -> Result<Option<Member>, RepoError> {
        sqlx::query("SELECT * FROM members WHERE workspace_id = ? AND user_id = ?")
            .bind(workspace_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("member_find"))?
            .map(|row| row_to_member(&row))
            .transpose()
    }

    async fn list_in_workspace(&self, workspace_id: WorkspaceId) -> Result<Vec<Member>, RepoError> {
        let rows = sqlx::query("SELECT * FROM members WHERE workspace_id = ? ORDER BY created_at, rowid")
            .bind(workspace_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("member_list"))?;
        rows.iter().map(row_to_member).collect()
    }

    async fn save(&self, member: &Member) -> Result<(), RepoError> {
        let mut conn = self.pool.acquire().await.map_err(db_err("member_save"))?;
        insert_member(&mut conn, member).await
    }

    async fn delete_cascade(&self, id: MemberId) -> Result<Vec<StorageId>, RepoError> {
        let key = id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err("member_delete"))?;

        let mut doomed = message_ids_where(&mut tx, "member_id", &key).await?;

        let conversation_ids: Vec<String> = sqlx::query(
            "SELECT id FROM conversations WHERE member_one_id = ? OR member_two_id = ?",
        )
        .bind(&key)
        .bind(&key)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("member_delete"))?
        .iter()
        .map(|row| row.text("id"))
        .collect::<Result<_, _>>()?;

        for conversation_id in &conversation_ids {
            doomed.extend(message_ids_where(&mut tx, "conversation_id", conversation_id).await?);
        }
        doomed.sort();
        doomed.dedup();

        let images = delete_messages(&mut tx, doomed).await?;

        sqlx::query("DELETE FROM reactions WHERE member_id = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await
            .map_err(db_err("member_delete"))?;

        if !conversation_ids.is_empty() {
            let sql = format!(
                "DELETE FROM conversations WHERE id IN ({})",
                placeholders(conversation_ids.len())
            );
            let mut q = sqlx::query(&sql);
            for conversation_id in &conversation_ids {
                q = q.bind(conversation_id);
            }
            q.execute(&mut *tx).await.map_err(db_err("member_delete"))?;
        }

        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(&key)
            .execute(&mut *tx)
            .await
            .map_err(db_err("member_delete"))?;

        tx.commit().await.map_err(db_err("member_delete"))?;
        tracing::info!(
            member_id = %id,
            conversations = conversation_ids.len(),
            images = images.len(),
            "Member removed with authored content"
        );
        Ok(images)
    }
}
