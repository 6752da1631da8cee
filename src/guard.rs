//! RAII lock ownership
//!
//! A guard ties a single record lock to a scope: it acquires in the
//! constructor and releases on drop. Guards are move-only; moving one
//! leaves nothing behind to release, so ownership transfers cleanly.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::manager::LockManager;
use crate::mode::LockMode;

/// Ownership state of a [`LockGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No lock is held and no attempt has been denied.
    None,
    /// The lock is held and will be released on drop.
    Owned,
    /// The last acquisition attempt was denied to break a deadlock (or was
    /// a duplicate request). Nothing will be released on drop.
    Denied,
}

/// Scoped ownership wrapper around [`LockManager::lock`] /
/// [`LockManager::unlock`] for one record.
pub struct LockGuard<'a, R, T, M>
where
    R: Clone + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Ord + Debug,
    M: LockMode + Debug,
{
    manager: &'a LockManager<R, T, M>,
    record: R,
    txn: T,
    mode: M,
    state: GuardState,
}

impl<'a, R, T, M> LockGuard<'a, R, T, M>
where
    R: Clone + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Ord + Debug,
    M: LockMode + Debug,
{
    /// Acquire a lock on `record` and wrap it in a guard. The returned
    /// guard is in the `Owned` state on grant, `Denied` otherwise.
    pub fn new(manager: &'a LockManager<R, T, M>, record: R, txn: T, mode: M) -> Self {
        let owned = manager.lock(&record, txn, mode);
        Self {
            manager,
            record,
            txn,
            mode,
            state: if owned {
                GuardState::Owned
            } else {
                GuardState::Denied
            },
        }
    }

    /// Create a guard without acquiring; call [`lock`](Self::lock) later.
    pub fn deferred(manager: &'a LockManager<R, T, M>, record: R, txn: T, mode: M) -> Self {
        Self {
            manager,
            record,
            txn,
            mode,
            state: GuardState::None,
        }
    }

    /// Create a guard adopting a lock the caller already acquired; the
    /// guard becomes responsible for releasing it.
    pub fn adopted(manager: &'a LockManager<R, T, M>, record: R, txn: T, mode: M) -> Self {
        Self {
            manager,
            record,
            txn,
            mode,
            state: GuardState::Owned,
        }
    }

    /// Acquire the lock. Returns `Ok(true)` on grant, `Ok(false)` on
    /// denial, or [`Error::AlreadyLocked`] if the guard already owns it.
    pub fn lock(&mut self) -> Result<bool> {
        if self.state == GuardState::Owned {
            return Err(Error::AlreadyLocked);
        }
        let owned = self.manager.lock(&self.record, self.txn, self.mode);
        self.state = if owned {
            GuardState::Owned
        } else {
            GuardState::Denied
        };
        Ok(owned)
    }

    /// Release the lock. Returns [`Error::NotLocked`] unless the guard owns
    /// it.
    pub fn unlock(&mut self) -> Result<()> {
        if self.state != GuardState::Owned {
            return Err(Error::NotLocked);
        }
        self.state = GuardState::None;
        self.manager.unlock(&self.record, self.txn);
        Ok(())
    }

    /// Disassociate from the lock without releasing it. If the guard was
    /// `Owned`, the caller is now responsible for unlocking.
    pub fn release(&mut self) -> GuardState {
        std::mem::replace(&mut self.state, GuardState::None)
    }

    /// Whether the guard currently owns the lock.
    pub fn owns_lock(&self) -> bool {
        self.state == GuardState::Owned
    }

    /// Whether the last acquisition attempt was denied.
    pub fn is_denied(&self) -> bool {
        self.state == GuardState::Denied
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn txn(&self) -> T {
        self.txn
    }

    pub fn mode(&self) -> M {
        self.mode
    }
}

impl<R, T, M> Drop for LockGuard<'_, R, T, M>
where
    R: Clone + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Ord + Debug,
    M: LockMode + Debug,
{
    fn drop(&mut self) {
        if self.state == GuardState::Owned {
            self.manager.unlock(&self.record, self.txn);
        }
    }
}
