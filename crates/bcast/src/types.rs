use std::fmt;

// ── GroupId ──────────────────────────────────────────────────────────────

/// Unique group identifier (e.g., "grp-<uuid>").
///
/// Only used to tell groups apart in logs and errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(pub String);

impl GroupId {
    /// Create a new random group ID.
    pub fn new() -> Self {
        Self(format!("grp-{}", uuid::Uuid::new_v4()))
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GroupId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── MemberId ─────────────────────────────────────────────────────────────

/// Identity of a member within its group.
///
/// Allocated from a per-group monotonic counter, never reused.
/// Envelopes carry it to tell the dispatcher whom to skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemberId(pub(crate) u64);

impl MemberId {
    /// Raw counter value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", self.0)
    }
}

// ── Dispatch loop ────────────────────────────────────────────────────────

/// Why a dispatch run returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No envelope arrived within the idle timeout.
    Idle,
    /// [`Group::close`](crate::Group::close) was called.
    Closed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Idle => f.write_str("idle"),
            StopReason::Closed => f.write_str("closed"),
        }
    }
}
