//! Table and index definitions. Applied idempotently at startup.

use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT UNIQUE,
        image TEXT,
        email_verification_time TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        token_hash TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS verification_codes (
        email TEXT NOT NULL,
        code_hash TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        failed_attempts INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_verification_codes_email ON verification_codes(email)",
    r#"
    CREATE TABLE IF NOT EXISTS workspaces (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        user_id TEXT NOT NULL,
        join_code TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_workspaces_join_code ON workspaces(join_code)",
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        workspace_id TEXT NOT NULL,
        role TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (workspace_id, user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_members_user ON members(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS channels (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (workspace_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        member_one_id TEXT NOT NULL,
        member_two_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_conversations_workspace ON conversations(workspace_id)",
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        workspace_id TEXT NOT NULL,
        member_id TEXT NOT NULL,
        body TEXT NOT NULL,
        image TEXT,
        channel_id TEXT,
        conversation_id TEXT,
        parent_message_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_workspace ON messages(workspace_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_member ON messages(member_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_parent ON messages(parent_message_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_image ON messages(image) WHERE image IS NOT NULL",
    r#"
    CREATE TABLE IF NOT EXISTS reactions (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        message_id TEXT NOT NULL,
        member_id TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (message_id, member_id, value)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_reactions_workspace ON reactions(workspace_id)",
    "CREATE INDEX IF NOT EXISTS idx_reactions_member ON reactions(member_id)",
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT,
        code TEXT NOT NULL,
        created_at TEXT NOT NULL,
        est_ready_time TEXT NOT NULL,
        is_active INTEGER NOT NULL,
        ready_time TEXT,
        delivery_time TEXT,
        turn_off_sound_time TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_orders_code_active ON orders(code, is_active)",
    "CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_active_code ON orders(code) WHERE is_active = 1",
];

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("schema", e))?;
    }
    tracing::debug!(statements = STATEMENTS.len(), "SQLite schema ensured");
    Ok(())
}
