//! In-process broadcast groups.
//!
//! Members join a [`Group`], send payloads through it, and receive every
//! payload sent by the other members. No member needs to know who else
//! is in the group.
//!
//! One task drives the group's dispatch loop. It drains a single relay
//! mailbox and hands each payload to every current member except its
//! sender, one spawned task per delivery. Delivery is best-effort and
//! unordered across senders.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bcast::{Group, StopReason};
//!
//! # async fn example() -> Result<(), bcast::BcastError> {
//! let group = Group::<u64>::new();
//! let mut members: Vec<_> = (0..4).map(|_| group.join()).collect();
//!
//! let dispatcher = group.clone();
//! let run = tokio::spawn(async move { dispatcher.broadcast_for(Duration::from_millis(50)).await });
//!
//! members[0].send(1).await?;
//! for member in &mut members[1..] {
//!     assert_eq!(member.recv().await, Some(1));
//! }
//!
//! assert_eq!(run.await.unwrap()?, StopReason::Idle);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod group;
mod member;
mod types;

pub use config::GroupConfig;
pub use error::BcastError;
pub use group::{Group, Recipient};
pub use member::Member;
pub use types::{GroupId, MemberId, StopReason};
