//! Generic in-process lock manager
//!
//! This crate provides a synchronization primitive that mediates concurrent
//! access by transactions to a collection of keyed records. It supports:
//! - Caller-defined lock modes with an arbitrary contention matrix
//! - FIFO scheduling of compatibility groups per record
//! - Deadlock detection over a global wait-for graph, with pluggable
//!   victim selection
//! - RAII lock guards
//!
//! # Architecture
//!
//! The manager is generic over three identifier types: the record id (the
//! unit of locking), the transaction id (the logical unit of work), and the
//! lock mode. Each record gets a lazily created queue of request groups;
//! requests within a group are pairwise compatible and granted together,
//! while groups are granted strictly in FIFO order. Blocked transactions
//! wait on a per-record condition variable and re-run the deadlock probe on
//! every timeout tick; a probe that finds a wait-for cycle denies one
//! participant's request, chosen by the [`VictimPolicy`].
//!
//! ```
//! use keylock::{ContentionMatrix, LockManager, LockManagerConfig, RwMode};
//!
//! let manager: LockManager<u64, u64, RwMode> =
//!     LockManager::new(ContentionMatrix::read_write(), LockManagerConfig::default());
//!
//! assert!(manager.lock(&0, 1, RwMode::Read));
//! assert!(manager.lock(&0, 2, RwMode::Read)); // readers share
//! manager.unlock(&0, 1);
//! manager.unlock(&0, 2);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod guard;
pub mod indexed_list;
pub mod manager;
pub mod matrix;
pub mod mode;
pub mod policy;
pub mod queue;
pub mod request;

// Re-export main types
pub use config::LockManagerConfig;
pub use error::{Error, Result};
pub use guard::{GuardState, LockGuard};
pub use manager::LockManager;
pub use matrix::ContentionMatrix;
pub use mode::{LockMode, RwMode};
pub use policy::{FnPolicy, MaxTxnId, VictimPolicy};
pub use queue::{GroupId, NULL_GROUP_ID};
