//! Error types for the lock manager

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers.
///
/// Lock denial is not an error: `LockManager::lock` reports it as a plain
/// `false` return. The variants here cover guard misuse only.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("guard already holds a lock")]
    AlreadyLocked,

    #[error("guard does not hold a lock")]
    NotLocked,
}
