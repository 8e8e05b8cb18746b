//! Multi-table deletes shared by the cascading repository operations.
//!
//! Every function here runs on a connection that the caller holds inside a
//! transaction.

use std::collections::HashSet;
use std::str::FromStr;

use grupa_domain::StorageId;
use sqlx::SqliteConnection;

use super::helpers::{db_err, placeholders, RowExt};
use crate::infrastructure::ports::RepoError;

/// SQLite's default bound-parameter limit is far above this.
const CHUNK: usize = 500;

/// Ids of messages matching `WHERE {column} = ?`.
pub(super) async fn message_ids_where(
    conn: &mut SqliteConnection,
    column: &'static str,
    value: &str,
) -> Result<Vec<String>, RepoError> {
    let sql = format!("SELECT id FROM messages WHERE {} = ?", column);
    let rows = sqlx::query(&sql)
        .bind(value)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err("message_ids_where"))?;
    rows.iter().map(|r| r.text("id")).collect()
}

/// Delete the given messages, every reply beneath them and all their
/// reactions. Returns the image storage ids those messages referenced that no
/// surviving message still points at.
pub(super) async fn delete_messages(
    conn: &mut SqliteConnection,
    roots: Vec<String>,
) -> Result<Vec<StorageId>, RepoError> {
    let mut seen: HashSet<String> = roots.iter().cloned().collect();
    let mut all = roots;
    let mut frontier = all.clone();

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for chunk in frontier.chunks(CHUNK) {
            let sql = format!(
                "SELECT id FROM messages WHERE parent_message_id IN ({})",
                placeholders(chunk.len())
            );
            let mut q = sqlx::query(&sql);
            for id in chunk {
                q = q.bind(id);
            }
            let rows = q
                .fetch_all(&mut *conn)
                .await
                .map_err(db_err("collect_replies"))?;
            for row in rows {
                let id = row.text("id")?;
                if seen.insert(id.clone()) {
                    next.push(id);
                }
            }
        }
        all.extend(next.iter().cloned());
        frontier = next;
    }

    let mut images: Vec<String> = Vec::new();
    for chunk in all.chunks(CHUNK) {
        let marks = placeholders(chunk.len());

        let sql = format!(
            "SELECT image FROM messages WHERE image IS NOT NULL AND id IN ({})",
            marks
        );
        let mut q = sqlx::query(&sql);
        for id in chunk {
            q = q.bind(id);
        }
        for row in q
            .fetch_all(&mut *conn)
            .await
            .map_err(db_err("collect_images"))?
        {
            images.push(row.text("image")?);
        }

        for table_sql in [
            format!("DELETE FROM reactions WHERE message_id IN ({})", marks),
            format!("DELETE FROM messages WHERE id IN ({})", marks),
        ] {
            let mut q = sqlx::query(&table_sql);
            for id in chunk {
                q = q.bind(id);
            }
            q.execute(&mut *conn)
                .await
                .map_err(db_err("delete_messages"))?;
        }
    }

    images.sort();
    images.dedup();

    // Storage ids can be attached to more than one message.
    let mut orphaned = Vec::new();
    for raw in images {
        let still_used = sqlx::query("SELECT 1 FROM messages WHERE image = ? LIMIT 1")
            .bind(&raw)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err("image_references"))?
            .is_some();
        if still_used {
            continue;
        }
        match StorageId::from_str(&raw) {
            Ok(id) => orphaned.push(id),
            Err(e) => tracing::warn!(image = %raw, error = %e, "Skipping malformed image id"),
        }
    }

    Ok(orphaned)
}
