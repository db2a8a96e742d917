//! Per-character typing reveal of assistant replies.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use neural_core::{ChatEvent, MessageId};

/// Spawn a task that reveals `text` one character per `interval`.
///
/// Emits a [`ChatEvent::RevealProgress`] after each character. Stops early
/// when `token` is cancelled.
pub fn spawn_reveal(
    message_id: MessageId,
    text: &str,
    interval: Duration,
    events: broadcast::Sender<ChatEvent>,
    token: CancellationToken,
) -> JoinHandle<()> {
    let total = text.chars().count();
    tokio::spawn(async move {
        for visible in 1..=total {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%message_id, visible, total, "Reveal cancelled");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
            let _ = events.send(ChatEvent::RevealProgress {
                message_id,
                visible,
                total,
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn test_reveal_emits_every_character() {
        let (tx, mut rx) = broadcast::channel(16);
        let id = Uuid::new_v4();
        let handle = spawn_reveal(
            id,
            "こんにちは",
            Duration::from_millis(30),
            tx,
            CancellationToken::new(),
        );
        handle.await.unwrap();

        let mut seen = Vec::new();
        while let Ok(ChatEvent::RevealProgress { visible, total, .. }) = rx.try_recv() {
            assert_eq!(total, 5);
            seen.push(visible);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_stops_on_cancel() {
        let (tx, mut rx) = broadcast::channel(64);
        let token = CancellationToken::new();
        let handle = spawn_reveal(
            Uuid::new_v4(),
            &"x".repeat(40),
            Duration::from_millis(30),
            tx,
            token.clone(),
        );

        tokio::time::sleep(Duration::from_millis(95)).await;
        token.cancel();
        handle.await.unwrap();

        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_finishes_immediately() {
        let (tx, mut rx) = broadcast::channel(4);
        spawn_reveal(
            Uuid::new_v4(),
            "",
            Duration::from_millis(30),
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
