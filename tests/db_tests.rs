mod common;

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use tokio::sync::Mutex;

use common::MockPlatform;
use koyeb_bot::bot::{handle_text, BotDeps};
use koyeb_bot::db::{
    delete_credential, fetch_credential, init_database_schema, update_selected_app,
    upsert_credential,
};

fn test_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_database_schema(&conn)?;
    Ok(conn)
}

#[test]
fn test_upsert_and_fetch_credential() -> Result<()> {
    let conn = test_connection()?;

    assert!(fetch_credential(&conn, 42)?.is_none());

    upsert_credential(&conn, 42, "abc123")?;
    let stored = fetch_credential(&conn, 42)?.unwrap();
    assert_eq!(stored.chat_id, 42);
    assert_eq!(stored.api_key, "abc123");
    assert!(stored.app_id.is_none());

    Ok(())
}

#[test]
fn test_upsert_replaces_key_and_keeps_app_selection() -> Result<()> {
    let conn = test_connection()?;

    upsert_credential(&conn, 42, "old-key")?;
    assert!(update_selected_app(&conn, 42, Some("app-1"))?);

    upsert_credential(&conn, 42, "new-key")?;
    let stored = fetch_credential(&conn, 42)?.unwrap();
    assert_eq!(stored.api_key, "new-key");
    assert_eq!(stored.app_id.as_deref(), Some("app-1"));

    Ok(())
}

#[test]
fn test_update_selected_app_without_row() -> Result<()> {
    let conn = test_connection()?;
    assert!(!update_selected_app(&conn, 7, Some("app-1"))?);
    Ok(())
}

#[test]
fn test_clear_selected_app() -> Result<()> {
    let conn = test_connection()?;

    upsert_credential(&conn, 42, "abc123")?;
    update_selected_app(&conn, 42, Some("app-1"))?;
    assert!(update_selected_app(&conn, 42, None)?);

    let stored = fetch_credential(&conn, 42)?.unwrap();
    assert!(stored.app_id.is_none());
    Ok(())
}

#[test]
fn test_delete_credential() -> Result<()> {
    let conn = test_connection()?;

    upsert_credential(&conn, 42, "abc123")?;
    assert!(delete_credential(&conn, 42)?);
    assert!(!delete_credential(&conn, 42)?);
    assert!(fetch_credential(&conn, 42)?.is_none());
    Ok(())
}

/// A stored credential restores the session on the chat's first message
/// after a restart: re-authenticated, app selection recovered.
#[tokio::test]
async fn test_session_hydration_from_stored_credential() -> Result<()> {
    let conn = test_connection()?;
    upsert_credential(&conn, 42, "abc123")?;
    update_selected_app(&conn, 42, Some("app-1"))?;

    let platform = MockPlatform::new();
    let deps = BotDeps::new(platform.clone(), Some(Arc::new(Mutex::new(conn))));

    let replies = handle_text(&deps, 42, "/status").await?;
    assert!(replies[0].contains("logged in"));
    assert!(replies[0].contains("app-1"));
    assert_eq!(platform.calls(), vec!["authenticate abc123"]);

    deps.sessions
        .update(42, |s| {
            assert!(s.logged_in);
            assert_eq!(s.auth_token.as_deref(), Some("token-abc123"));
            assert_eq!(s.selected_app_id.as_deref(), Some("app-1"));
        })
        .await;
    Ok(())
}

/// A revoked stored key leaves the chat logged out without any chat noise.
#[tokio::test]
async fn test_hydration_with_invalid_stored_key() -> Result<()> {
    let conn = test_connection()?;
    upsert_credential(&conn, 42, "revoked")?;

    let platform = MockPlatform::failing_auth();
    let deps = BotDeps::new(platform.clone(), Some(Arc::new(Mutex::new(conn))));

    let replies = handle_text(&deps, 42, "/status").await?;
    assert!(replies[0].contains("logged out"));

    // Hydration is attempted only once per session.
    handle_text(&deps, 42, "/status").await?;
    assert_eq!(platform.calls(), vec!["authenticate revoked"]);
    Ok(())
}

/// Logging in through the dialog persists the credential; logging out
/// removes it.
#[tokio::test]
async fn test_login_and_logout_round_trip_persistence() -> Result<()> {
    let conn = test_connection()?;
    let platform = MockPlatform::new();
    let deps = BotDeps::new(platform.clone(), Some(Arc::new(Mutex::new(conn))));

    handle_text(&deps, 42, "/login").await?;
    handle_text(&deps, 42, "abc123").await?;
    {
        let db = deps.credentials.as_ref().unwrap();
        let conn = db.lock().await;
        assert_eq!(fetch_credential(&conn, 42)?.unwrap().api_key, "abc123");
    }

    handle_text(&deps, 42, "/logout").await?;
    {
        let db = deps.credentials.as_ref().unwrap();
        let conn = db.lock().await;
        assert!(fetch_credential(&conn, 42)?.is_none());
    }
    Ok(())
}
