mod common;

use anyhow::Result;

use common::{deps_with, MockPlatform};
use koyeb_bot::bot::handle_text;
use koyeb_bot::dialogue::{DialogKind, PendingDialog};
use koyeb_bot::session::SessionStore;

/// Concurrent updates for the same chat serialize; none is lost.
#[tokio::test]
async fn test_concurrent_updates_are_not_lost() -> Result<()> {
    let store = SessionStore::new();
    store
        .update(1, |s| {
            s.pending_dialog = Some(PendingDialog::new(DialogKind::SetEnvVar));
        })
        .await;

    let mut tasks = Vec::new();
    for i in 0..50 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .update(1, move |s| {
                    if let Some(pending) = s.pending_dialog.as_mut() {
                        pending.push(format!("value-{i}"));
                    }
                })
                .await;
        }));
    }
    for task in tasks {
        task.await?;
    }

    store
        .update(1, |s| {
            assert_eq!(s.pending_dialog.as_ref().unwrap().collected.len(), 50);
        })
        .await;
    Ok(())
}

/// Different chats run through the full pipeline in parallel without
/// observing each other's state.
#[tokio::test]
async fn test_chats_are_processed_independently() -> Result<()> {
    let platform = MockPlatform::new();
    let deps = deps_with(platform.clone());

    let mut tasks = Vec::new();
    for chat_id in 1..=8i64 {
        let deps = deps.clone();
        tasks.push(tokio::spawn(async move {
            handle_text(&deps, chat_id, "/login").await?;
            handle_text(&deps, chat_id, &format!("key-{chat_id}")).await
        }));
    }
    for task in tasks {
        let replies = task.await??;
        assert_eq!(replies, vec!["Logged in successfully!"]);
    }

    for chat_id in 1..=8i64 {
        deps.sessions
            .update(chat_id, |s| {
                assert!(s.logged_in);
                assert_eq!(s.auth_token.as_deref(), Some(&*format!("token-key-{chat_id}")));
            })
            .await;
    }
    Ok(())
}

/// A dialog begun by one message is visible to the next message for the
/// same chat, even when the messages race.
#[tokio::test]
async fn test_dialog_entry_is_not_lost_under_races() -> Result<()> {
    let platform = MockPlatform::new();
    let deps = deps_with(platform.clone());

    for round in 0..20 {
        let chat_id = 100 + round;
        let begin = {
            let deps = deps.clone();
            tokio::spawn(async move { handle_text(&deps, chat_id, "/login").await })
        };
        let status = {
            let deps = deps.clone();
            tokio::spawn(async move { handle_text(&deps, chat_id, "/status").await })
        };
        begin.await??;
        status.await??;

        // However the two interleaved, the dialog entry must not be lost.
        deps.sessions
            .update(chat_id, |s| {
                assert_eq!(s.pending_dialog.as_ref().unwrap().kind, DialogKind::Login);
            })
            .await;
    }
    Ok(())
}
