use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// A persisted credential row for one chat.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredential {
    pub chat_id: i64,
    pub api_key: String,
    pub app_id: Option<String>,
    pub created_at: String,
}

/// Initialize the database schema
pub fn init_database_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS credentials (
            chat_id INTEGER PRIMARY KEY,
            api_key TEXT NOT NULL,
            app_id TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create credentials table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Store or replace the API key for a chat. A stored app selection is
/// kept when the key is replaced.
pub fn upsert_credential(conn: &Connection, chat_id: i64, api_key: &str) -> Result<()> {
    info!("Upserting credential for chat_id: {}", chat_id);

    conn.execute(
        "INSERT INTO credentials (chat_id, api_key) VALUES (?1, ?2)
         ON CONFLICT(chat_id) DO UPDATE SET api_key = excluded.api_key",
        params![chat_id, api_key],
    )
    .context("Failed to upsert credential")?;

    Ok(())
}

/// Fetch the stored credential for a chat, if any.
pub fn fetch_credential(conn: &Connection, chat_id: i64) -> Result<Option<StoredCredential>> {
    let mut stmt = conn
        .prepare("SELECT chat_id, api_key, app_id, created_at FROM credentials WHERE chat_id = ?1")
        .context("Failed to prepare credential query")?;

    let credential = stmt
        .query_row(params![chat_id], |row| {
            Ok(StoredCredential {
                chat_id: row.get(0)?,
                api_key: row.get(1)?,
                app_id: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()
        .context("Failed to read credential")?;

    Ok(credential)
}

/// Record (or clear) the selected app for a chat. Returns false when the
/// chat has no stored credential row to update.
pub fn update_selected_app(conn: &Connection, chat_id: i64, app_id: Option<&str>) -> Result<bool> {
    info!("Updating selected app for chat_id: {}", chat_id);

    let rows_affected = conn
        .execute(
            "UPDATE credentials SET app_id = ?1 WHERE chat_id = ?2",
            params![app_id, chat_id],
        )
        .context("Failed to update selected app")?;

    Ok(rows_affected > 0)
}

/// Delete the stored credential for a chat. Returns false if none existed.
pub fn delete_credential(conn: &Connection, chat_id: i64) -> Result<bool> {
    info!("Deleting credential for chat_id: {}", chat_id);

    let rows_affected = conn
        .execute(
            "DELETE FROM credentials WHERE chat_id = ?1",
            params![chat_id],
        )
        .context("Failed to delete credential")?;

    Ok(rows_affected > 0)
}
