//! The dispatch loop.
//!
//! Waits on the relay mailbox, the idle timer and the close signal.
//! Each envelope is fanned out from one registry snapshot, one spawned
//! task per recipient, so a member that never reads cannot stall the
//! loop or the other members.
use std::time::Duration;

use tokio::sync::mpsc;

use crate::types::StopReason;

use super::{Recipient, Relay, Shared};

/// Drain the relay mailbox until idle or closed.
pub(super) async fn dispatch_loop<T: Clone + Send + 'static>(
    shared: &Shared<T>,
    relay_rx: &mut mpsc::Receiver<Relay<T>>,
    timeout: Option<Duration>,
) -> StopReason {
    tracing::debug!(?timeout, "dispatch started");

    let reason = loop {
        let relay = tokio::select! {
            biased;

            _ = shared.close.notified() => break StopReason::Closed,

            received = relay_rx.recv() => match received {
                Some(relay) => relay,
                // The group holds a sender, so this only happens mid-teardown.
                None => break StopReason::Closed,
            },

            _ = idle(timeout) => break StopReason::Idle,
        };

        fan_out(shared, relay);
    };

    tracing::debug!(%reason, "dispatch stopped");
    reason
}

/// Deliver one envelope to everyone but its sender.
fn fan_out<T: Clone + Send + 'static>(shared: &Shared<T>, relay: Relay<T>) {
    let Relay {
        sender,
        payload,
        accepted,
    } = relay;

    // The sender may have given up waiting; the envelope is still delivered.
    let _ = accepted.send(());

    let mut spawned = 0usize;
    for recipient in shared.snapshot() {
        if Some(recipient.id) == sender {
            continue;
        }
        tokio::spawn(deliver(recipient, payload.clone()));
        spawned += 1;
    }

    tracing::trace!(sender = ?sender, recipients = spawned, "envelope dispatched");
}

/// Fire-and-forget delivery into one inbox.
///
/// Waits as long as the inbox is full. Ends quietly if the member's
/// receiver has been dropped.
async fn deliver<T>(recipient: Recipient<T>, payload: T) {
    if recipient.tx.send(payload).await.is_err() {
        tracing::trace!(member = %recipient.id, "inbox closed, delivery dropped");
    }
}

/// Idle timer. Never fires without a timeout.
async fn idle(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
