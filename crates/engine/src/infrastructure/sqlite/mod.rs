//! SQLite database implementations.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

mod cascade;
mod helpers;
mod schema;

mod auth_repo;
mod channel_repo;
mod conversation_repo;
mod member_repo;
mod message_repo;
mod order_repo;
mod reaction_repo;
mod user_repo;
mod workspace_repo;


pub use auth_repo::SqliteAuthRepo;
pub use channel_repo::SqliteChannelRepo;
pub use conversation_repo::SqliteConversationRepo;
pub use member_repo::SqliteMemberRepo;
pub use message_repo::SqliteMessageRepo;
pub use order_repo::SqliteOrderRepo;
pub use reaction_repo::SqliteReactionRepo;
pub use user_repo::SqliteUserRepo;
pub use workspace_repo::SqliteWorkspaceRepo;

/// All SQLite repositories sharing one pool.
pub struct SqliteRepositories {
    pub user: Arc<SqliteUserRepo>,
    pub auth: Arc<SqliteAuthRepo>,
    pub workspace: Arc<SqliteWorkspaceRepo>,
    pub member: Arc<SqliteMemberRepo>,
    pub channel: Arc<SqliteChannelRepo>,
    pub conversation: Arc<SqliteConversationRepo>,
    pub message: Arc<SqliteMessageRepo>,
    pub reaction: Arc<SqliteReactionRepo>,
    pub order: Arc<SqliteOrderRepo>,
}

impl SqliteRepositories {
    /// Open (creating if missing) the database file and apply the schema.
    pub async fn connect(path: &Path) -> Result<Self, RepoError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepoError::database("connect", e))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
            .map_err(|e| RepoError::database("connect", e))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // A single connection serializes writers; cascades run in transactions
        // on that connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| RepoError::database("connect", e))?;

        schema::ensure_schema(&pool).await?;
        tracing::info!(path = %path.display(), "SQLite database ready");

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            user: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth: Arc::new(SqliteAuthRepo::new(pool.clone())),
            workspace: Arc::new(SqliteWorkspaceRepo::new(pool.clone())),
            member: Arc::new(SqliteMemberRepo::new(pool.clone())),
            channel: Arc::new(SqliteChannelRepo::new(pool.clone())),
            conversation: Arc::new(SqliteConversationRepo::new(pool.clone())),
            message: Arc::new(SqliteMessageRepo::new(pool.clone())),
            reaction: Arc::new(SqliteReactionRepo::new(pool.clone())),
            order: Arc::new(SqliteOrderRepo::new(pool)),
        }
    }
}
