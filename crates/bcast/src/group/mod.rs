//! Broadcast group: membership registry plus the dispatch loop.
//!
//! A group owns one relay mailbox. Members (and the group itself) push
//! envelopes into it; a single dispatch run drains it and fans every
//! payload out to all registered members except the one that sent it.
mod dispatch;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::Instrument;

use crate::config::GroupConfig;
use crate::error::BcastError;
use crate::member::Member;
use crate::types::{GroupId, MemberId, StopReason};

/// Envelopes queued in the relay mailbox before a sender has to wait for room.
///
/// Senders still wait for acceptance, so this only smooths out contention.
const RELAY_MAILBOX_CAP: usize = 1;

// ── Relay envelope ───────────────────────────────────────────────────────

/// A payload on its way through the relay mailbox.
pub(crate) struct Relay<T> {
    /// `None` for group-wide sends.
    pub(crate) sender: Option<MemberId>,
    pub(crate) payload: T,
    /// Fired by the dispatch loop once it has taken the envelope.
    pub(crate) accepted: oneshot::Sender<()>,
}

/// Push an envelope into the relay mailbox and wait until the dispatch
/// loop has taken it.
pub(crate) async fn submit<T>(
    relay_tx: mpsc::Sender<Relay<T>>,
    sender: Option<MemberId>,
    payload: T,
) -> Result<(), BcastError> {
    let (accepted, ack) = oneshot::channel();
    relay_tx
        .send(Relay {
            sender,
            payload,
            accepted,
        })
        .await
        .map_err(|_| BcastError::GroupGone)?;
    drop(relay_tx);
    ack.await.map_err(|_| BcastError::GroupGone)
}

// ── Shared state ─────────────────────────────────────────────────────────

/// State shared by every handle on a group.
///
/// Members only hold a `Weak` to it.
pub(crate) struct Shared<T> {
    pub(crate) id: GroupId,
    config: GroupConfig,
    /// Outbound channels in join order. Never locked across an await.
    members: Mutex<IndexMap<MemberId, mpsc::Sender<T>>>,
    next_member: AtomicU64,
    pub(crate) relay_tx: mpsc::Sender<Relay<T>>,
    /// Single consumer: held for the whole of a dispatch run.
    relay_rx: tokio::sync::Mutex<mpsc::Receiver<Relay<T>>>,
    close: Notify,
}

impl<T> Shared<T> {
    fn registry(&self) -> MutexGuard<'_, IndexMap<MemberId, mpsc::Sender<T>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, tx: mpsc::Sender<T>) -> MemberId {
        let id = MemberId(self.next_member.fetch_add(1, Ordering::Relaxed));
        let count = {
            let mut members = self.registry();
            members.insert(id, tx);
            members.len()
        };
        tracing::debug!(group = %self.id, member = %id, count, "member joined");
        id
    }

    /// Remove a member. Absent ids are a no-op.
    pub(crate) fn unregister(&self, id: MemberId) -> bool {
        let (removed, count) = {
            let mut members = self.registry();
            let removed = members.shift_remove(&id).is_some();
            (removed, members.len())
        };
        if removed {
            tracing::debug!(group = %self.id, member = %id, count, "member left");
        }
        removed
    }

    /// Consistent copy of the registry, taken under the lock.
    fn snapshot(&self) -> Vec<Recipient<T>> {
        self.registry()
            .iter()
            .map(|(id, tx)| Recipient {
                id: *id,
                tx: tx.clone(),
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.registry().len()
    }
}

// ── Recipient ────────────────────────────────────────────────────────────

/// One entry of a membership snapshot: a member id and its outbound channel.
pub struct Recipient<T> {
    id: MemberId,
    tx: mpsc::Sender<T>,
}

impl<T> Recipient<T> {
    /// The member this channel delivers to.
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Outbound channel into the member's inbox.
    pub fn sender(&self) -> &mpsc::Sender<T> {
        &self.tx
    }
}

impl<T> Clone for Recipient<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
        }
    }
}

impl<T> fmt::Debug for Recipient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipient").field("id", &self.id).finish()
    }
}

// ── Group ────────────────────────────────────────────────────────────────

/// A broadcast group.
///
/// Cheap to clone: clones share the same registry and relay mailbox.
/// Nothing is delivered until some task drives the dispatch loop with
/// [`broadcast_for`](Self::broadcast_for), [`broadcast`](Self::broadcast)
/// or [`run`](Self::run).
///
/// ```rust
/// # async fn example() -> Result<(), bcast::BcastError> {
/// use std::time::Duration;
///
/// let group = bcast::Group::<String>::new();
/// let alice = group.join();
/// let mut bob = group.join();
///
/// let dispatcher = group.clone();
/// tokio::spawn(async move { dispatcher.broadcast_for(Duration::from_millis(100)).await });
///
/// alice.send("hello".to_string()).await?;
/// assert_eq!(bob.recv().await.as_deref(), Some("hello"));
/// # Ok(())
/// # }
/// ```
pub struct Group<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Group<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Group<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("id", &self.shared.id)
            .field("members", &self.shared.len())
            .finish()
    }
}

impl<T: Clone + Send + 'static> Default for Group<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Group<T> {
    /// Create an empty group with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GroupConfig::default())
    }

    /// Create an empty group.
    pub fn with_config(config: GroupConfig) -> Self {
        let (relay_tx, relay_rx) = mpsc::channel(RELAY_MAILBOX_CAP);
        let shared = Shared {
            id: GroupId::new(),
            config,
            members: Mutex::new(IndexMap::new()),
            next_member: AtomicU64::new(0),
            relay_tx,
            relay_rx: tokio::sync::Mutex::new(relay_rx),
            close: Notify::new(),
        };
        tracing::debug!(group = %shared.id, "group created");
        Self {
            shared: Arc::new(shared),
        }
    }

    /// This group's identity.
    pub fn id(&self) -> &GroupId {
        &self.shared.id
    }

    /// Join the group: allocate an inbox and register it.
    ///
    /// Never waits on the dispatch loop. The new member only sees
    /// envelopes dispatched after this call returns.
    pub fn join(&self) -> Member<T> {
        let (tx, rx) = mpsc::channel(self.shared.config.inbox_capacity);
        let id = self.shared.register(tx);
        Member::new(id, Arc::downgrade(&self.shared), rx)
    }

    /// Register an outbound channel created elsewhere.
    ///
    /// The caller keeps the receiving half. Pair with [`remove`](Self::remove).
    pub fn add(&self, tx: mpsc::Sender<T>) -> MemberId {
        self.shared.register(tx)
    }

    /// Remove a member from the registry.
    ///
    /// Returns `false` if it was not registered. The member's inbox is left open.
    pub fn remove(&self, id: MemberId) -> bool {
        self.shared.unregister(id)
    }

    /// Snapshot of the current members, in join order.
    pub fn members(&self) -> Vec<Recipient<T>> {
        self.shared.snapshot()
    }

    /// Number of registered members, read under the registry lock.
    pub fn member_count(&self) -> usize {
        self.shared.len()
    }

    /// Broadcast a payload to every member.
    ///
    /// Waits until the dispatch loop has taken the envelope.
    pub async fn send(&self, payload: T) -> Result<(), BcastError> {
        submit(self.shared.relay_tx.clone(), None, payload).await
    }

    /// Alias for [`broadcast_for`](Self::broadcast_for).
    pub async fn broadcasting(&self, timeout: Duration) -> Result<StopReason, BcastError> {
        self.broadcast_for(timeout).await
    }

    /// Run the dispatch loop until no envelope arrives for `timeout`.
    ///
    /// A zero `timeout` runs until [`close`](Self::close).
    pub async fn broadcast_for(&self, timeout: Duration) -> Result<StopReason, BcastError> {
        if timeout.is_zero() {
            return self.broadcast().await;
        }
        self.dispatch(Some(timeout)).await
    }

    /// Run the dispatch loop until [`close`](Self::close).
    pub async fn broadcast(&self) -> Result<StopReason, BcastError> {
        self.dispatch(None).await
    }

    /// Run the dispatch loop with the configured idle timeout.
    pub async fn run(&self) -> Result<StopReason, BcastError> {
        self.broadcast_for(self.shared.config.idle_timeout).await
    }

    /// Stop the dispatch loop.
    ///
    /// Deliveries already spawned are not cancelled. If no run is active
    /// the signal is kept and the next run stops at once. This includes a
    /// run that already returned on idle: a `close()` racing an idle stop
    /// ends the following run with [`StopReason::Closed`].
    pub fn close(&self) {
        tracing::debug!(group = %self.shared.id, "close requested");
        self.shared.close.notify_one();
    }

    async fn dispatch(&self, timeout: Option<Duration>) -> Result<StopReason, BcastError> {
        let Ok(mut relay_rx) = self.shared.relay_rx.try_lock() else {
            return Err(BcastError::AlreadyDispatching {
                group_id: self.shared.id.to_string(),
            });
        };
        let span = tracing::debug_span!("dispatch", group = %self.shared.id);
        Ok(dispatch::dispatch_loop(&self.shared, &mut relay_rx, timeout)
            .instrument(span)
            .await)
    }
}
