//! Sessions and pending sign-in codes.

use async_trait::async_trait;
use grupa_domain::{Email, PendingVerification, Session};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::helpers::{db_err, ts, RowExt};
use crate::infrastructure::ports::{AuthRepo, RepoError};

pub struct SqliteAuthRepo {
    pool: SqlitePool,
}

impl SqliteAuthRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_session(row: &SqliteRow) -> Result<Session, RepoError> {
    Ok(Session {
        id: row.id("id")?,
        user_id: row.id("user_id")?,
        token_hash: row.text("token_hash")?,
        created_at: row.datetime("created_at")?,
        expires_at: row.datetime("expires_at")?,
    })
}

#[async_trait]
impl AuthRepo for SqliteAuthRepo {
    async fn save_session(&self, session: &Session) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.token_hash)
        .bind(ts(session.created_at))
        .bind(ts(session.expires_at))
        .execute(&self.pool)
        .await
        .map_err(db_err("session_save"))?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>, RepoError> {
        sqlx::query("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("session_find"))?
            .map(|row| row_to_session(&row))
            .transpose()
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(db_err("session_delete"))?;
        Ok(())
    }

    async fn replace_verification(&self, pending: &PendingVerification) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err("verification_replace"))?;

        sqlx::query("DELETE FROM verification_codes WHERE email = ?")
            .bind(pending.email.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_err("verification_replace"))?;

        sqlx::query("INSERT INTO verification_codes (email, code_hash, expires_at) VALUES (?, ?, ?)")
            .bind(pending.email.as_str())
            .bind(&pending.code_hash)
            .bind(ts(pending.expires_at))
            .execute(&mut *tx)
            .await
            .map_err(db_err("verification_replace"))?;

        tx.commit().await.map_err(db_err("verification_replace"))?;
        Ok(())
    }

    async fn take_verification(
        &self,
        email: &Email,
        code_hash: &str,
        max_failed_attempts: u32,
    ) -> Result<Option<PendingVerification>, RepoError> {
        let mut tx = self.pool.begin().await.map_err(db_err("verification_take"))?;

        let Some(row) = sqlx::query(
            "SELECT code_hash, expires_at, failed_attempts FROM verification_codes WHERE email = ? LIMIT 1",
        )
        .bind(email.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("verification_take"))?
        else {
            return Ok(None);
        };

        if row.text("code_hash")? == code_hash {
            sqlx::query("DELETE FROM verification_codes WHERE email = ?")
                .bind(email.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err("verification_take"))?;
            tx.commit().await.map_err(db_err("verification_take"))?;

            return Ok(Some(PendingVerification {
                email: email.clone(),
                code_hash: code_hash.to_string(),
                expires_at: row.datetime("expires_at")?,
            }));
        }

        let failed = row
            .try_get::<i64, _>("failed_attempts")
            .map_err(|e| RepoError::serialization(format!("failed_attempts: {}", e)))?
            + 1;
        if failed >= i64::from(max_failed_attempts) {
            tracing::info!(
                email = %email,
                attempts = failed,
                "Dropping sign-in code after repeated failures"
            );
            sqlx::query("DELETE FROM verification_codes WHERE email = ?")
                .bind(email.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err("verification_take"))?;
        } else {
            sqlx::query("UPDATE verification_codes SET failed_attempts = ? WHERE email = ?")
                .bind(failed)
                .bind(email.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err("verification_take"))?;
        }
        tx.commit().await.map_err(db_err("verification_take"))?;

        Ok(None)
    }
}
