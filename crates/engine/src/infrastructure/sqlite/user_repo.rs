//! User persistence.

use async_trait::async_trait;
use grupa_domain::{Email, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;

use super::helpers::{db_err, opt_ts, ts, RowExt};
use crate::infrastructure::ports::{RepoError, UserRepo};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User, RepoError> {
    let email = row
        .opt_text("email")?
        .map(Email::new)
        .transpose()
        .map_err(RepoError::serialization)?;
    Ok(User {
        id: row.id("id")?,
        name: row.opt_text("name")?,
        email,
        image: row.opt_text("image")?,
        email_verification_time: row.opt_datetime("email_verification_time")?,
        created_at: row.datetime("created_at")?,
    })
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepoError> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("user_get"))?
            .map(|row| row_to_user(&row))
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepoError> {
        sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("user_find_by_email"))?
            .map(|row| row_to_user(&row))
            .transpose()
    }

    async fn save(&self, user: &User) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, image, email_verification_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                image = excluded.image,
                email_verification_time = excluded.email_verification_time
            "#,
        )
        .bind(user.id.to_string())
        .bind(user.name.as_deref())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(user.image.as_deref())
        .bind(opt_ts(user.email_verification_time))
        .bind(ts(user.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err("user_save"))?;
        Ok(())
    }
}
