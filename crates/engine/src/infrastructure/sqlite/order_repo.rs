//! Pickup order persistence.

use async_trait::async_trait;
use grupa_domain::{Order, OrderCode, OrderId, OrderName, OrderRecord, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::helpers::{db_err, opt_ts, ts, RowExt};
use crate::infrastructure::ports::{OrderRepo, RepoError};

pub struct SqliteOrderRepo {
    pool: SqlitePool,
}

impl SqliteOrderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_order(row: &SqliteRow) -> Result<Order, RepoError> {
    let name = row
        .opt_text("name")?
        .map(OrderName::new)
        .transpose()
        .map_err(RepoError::serialization)?;
    let is_active: bool = row
        .try_get("is_active")
        .map_err(|e| RepoError::serialization(format!("is_active: {}", e)))?;

    Ok(Order::from_record(OrderRecord {
        id: row.id("id")?,
        owner_id: row.id("user_id")?,
        name,
        code: OrderCode::parse(&row.text("code")?).map_err(RepoError::serialization)?,
        created_at: row.datetime("created_at")?,
        est_ready_time: row.datetime("est_ready_time")?,
        is_active,
        ready_time: row.opt_datetime("ready_time")?,
        delivery_time: row.opt_datetime("delivery_time")?,
        turn_off_sound_time: row.opt_datetime("turn_off_sound_time")?,
    }))
}

#[async_trait]
impl OrderRepo for SqliteOrderRepo {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("order_get"))?
            .map(|row| row_to_order(&row))
            .transpose()
    }

    async fn find_active_by_code(&self, code: &OrderCode) -> Result<Option<Order>, RepoError> {
        sqlx::query(
            "SELECT * FROM orders WHERE code = ? AND is_active = 1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("order_find_active_by_code"))?
        .map(|row| row_to_order(&row))
        .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepoError> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC, rowid DESC")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("order_list_for_user"))?;
        rows.iter().map(row_to_order).collect()
    }

    async fn save(&self, order: &Order) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, name, code, created_at, est_ready_time,
                is_active, ready_time, delivery_time, turn_off_sound_time
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                is_active = excluded.is_active,
                ready_time = excluded.ready_time,
                delivery_time = excluded.delivery_time,
                turn_off_sound_time = excluded.turn_off_sound_time
            "#,
        )
        .bind(order.id().to_string())
        .bind(order.owner_id().to_string())
        .bind(order.name().map(|n| n.as_str()))
        .bind(order.code().as_str())
        .bind(ts(order.created_at()))
        .bind(ts(order.est_ready_time()))
        .bind(order.is_active())
        .bind(opt_ts(order.ready_time()))
        .bind(opt_ts(order.delivery_time()))
        .bind(opt_ts(order.turn_off_sound_time()))
        .execute(&self.pool)
        .await
        .map_err(db_err("order_save"))?;
        Ok(())
    }
}
