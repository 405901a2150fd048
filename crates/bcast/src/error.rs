/// Errors returned by broadcast groups.
///
/// Fan-out itself never fails: undeliverable messages are dropped
/// silently. These variants only cover a handle outliving its group
/// and misuse of the single-consumer relay mailbox.
#[derive(Debug, thiserror::Error)]
pub enum BcastError {
    #[error("broadcast group is gone")]
    GroupGone,

    #[error("group {group_id} is already dispatching")]
    AlreadyDispatching { group_id: String },
}
