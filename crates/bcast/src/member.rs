//! Member handle: a participant's view of a group.
use std::fmt;
use std::sync::Weak;

use tokio::sync::mpsc;

use crate::error::BcastError;
use crate::group::{submit, Shared};
use crate::types::MemberId;

/// A member of a [`Group`](crate::Group).
///
/// Owns its inbox. Holds only a weak reference to the group, so it
/// does not keep the group alive. Dropping the member leaves the group.
pub struct Member<T> {
    id: MemberId,
    group: Weak<Shared<T>>,
    inbox: mpsc::Receiver<T>,
}

impl<T> Member<T> {
    pub(crate) fn new(id: MemberId, group: Weak<Shared<T>>, inbox: mpsc::Receiver<T>) -> Self {
        Self { id, group, inbox }
    }

    /// This member's identity within its group.
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Send a payload to every other member.
    ///
    /// Waits until the dispatch loop has taken the envelope.
    pub async fn send(&self, payload: T) -> Result<(), BcastError> {
        let relay_tx = match self.group.upgrade() {
            Some(shared) => shared.relay_tx.clone(),
            None => return Err(BcastError::GroupGone),
        };
        submit(relay_tx, Some(self.id), payload).await
    }

    /// Wait for the next delivered payload.
    ///
    /// Returns `None` once the group is gone and nothing is left in flight.
    pub async fn recv(&mut self) -> Option<T> {
        self.inbox.recv().await
    }

    /// Take a delivered payload if one is ready.
    pub fn try_recv(&mut self) -> Option<T> {
        self.inbox.try_recv().ok()
    }

    /// Direct access to the inbox, e.g. for `tokio::select!`.
    pub fn inbox(&mut self) -> &mut mpsc::Receiver<T> {
        &mut self.inbox
    }

    /// Leave the group.
    ///
    /// Idempotent. The inbox stays open so deliveries already in flight
    /// can still be received.
    pub fn close(&self) {
        if let Some(shared) = self.group.upgrade() {
            shared.unregister(self.id);
        }
    }
}

impl<T> Drop for Member<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("id", &self.id)
            .field("attached", &(self.group.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{BcastError, Group};

    #[test]
    fn test_close_is_idempotent() {
        let group = Group::<u32>::new();
        let member = group.join();
        member.close();
        member.close();
        assert_eq!(group.member_count(), 0);
    }

    #[test]
    fn test_drop_leaves_group() {
        let group = Group::<u32>::new();
        let keep = group.join();
        {
            let _gone = group.join();
            assert_eq!(group.member_count(), 2);
        }
        assert_eq!(group.member_count(), 1);
        assert_eq!(group.members()[0].id(), keep.id());
    }

    #[tokio::test]
    async fn test_send_after_group_dropped() {
        let group = Group::<u32>::new();
        let member = group.join();
        drop(group);

        let err = member.send(1).await.unwrap_err();
        assert!(matches!(err, BcastError::GroupGone));
        // Closing a detached member is harmless.
        member.close();
    }

    #[tokio::test]
    async fn test_recv_none_when_group_dropped() {
        let group = Group::<u32>::new();
        let mut member = group.join();
        drop(group);
        assert_eq!(member.recv().await, None);
    }

    #[tokio::test]
    async fn test_inbox_stays_open_after_close() {
        let group = Group::<u32>::new();
        let mut member = group.join();
        let in_flight = group.members()[0].sender().clone();
        member.close();

        in_flight.send(42).await.unwrap();
        assert_eq!(member.inbox().recv().await, Some(42));
    }

    #[test]
    fn test_debug_reports_attachment() {
        let group = Group::<u32>::new();
        let member = group.join();
        assert!(format!("{member:?}").contains("attached: true"));
        drop(group);
        assert!(format!("{member:?}").contains("attached: false"));
    }
}
