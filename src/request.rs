//! Lock requests and compatibility groups
//!
//! A request records one transaction's outstanding claim on one record. A
//! group batches pairwise-compatible requests so they can be granted
//! simultaneously; groups are the unit of FIFO scheduling in the per-record
//! queue.

use std::hash::Hash;

use crate::indexed_list::{self, IndexedList};
use crate::matrix::ContentionMatrix;
use crate::mode::LockMode;

/// One transaction's outstanding request on one record.
#[derive(Debug, Clone)]
pub struct LockRequest<M> {
    mode: M,
    /// Set by deadlock recovery. Terminal for this request: the waking
    /// transaction removes it and must retry from scratch.
    denied: bool,
}

impl<M: LockMode> LockRequest<M> {
    pub(crate) fn new(mode: M) -> Self {
        Self {
            mode,
            denied: false,
        }
    }

    /// The requested lock mode.
    pub fn mode(&self) -> M {
        self.mode
    }

    /// Whether the request was denied to break a deadlock.
    pub fn is_denied(&self) -> bool {
        self.denied
    }

    pub(crate) fn deny(&mut self) {
        self.denied = true;
    }
}

/// An ordered batch of pairwise-compatible requests on the same record.
///
/// All members of a group may hold the lock simultaneously. Admission is
/// all-or-nothing: a candidate joins only if it contends with no current
/// non-denied member.
pub struct LockRequestGroup<T, M> {
    requests: IndexedList<T, LockRequest<M>>,
}

impl<T, M> LockRequestGroup<T, M>
where
    T: Copy + Eq + Hash,
    M: LockMode,
{
    pub(crate) fn new() -> Self {
        Self {
            requests: IndexedList::new(),
        }
    }

    /// Admit a request into the group if it contends with none of the
    /// existing members. Denied members are skipped: they are queued only
    /// for their transaction to clean up and should not block compatible
    /// arrivals. A prior request by the same transaction also rejects
    /// admission.
    pub fn try_admit(&mut self, txn: T, mode: M, matrix: &ContentionMatrix) -> bool {
        for (_, request) in self.requests.iter() {
            if !request.is_denied() && matrix.conflicts(request.mode(), mode) {
                return false;
            }
        }
        self.requests.push_back(txn, LockRequest::new(mode))
    }

    pub fn request(&self, txn: &T) -> Option<&LockRequest<M>> {
        self.requests.get(txn)
    }

    pub fn request_mut(&mut self, txn: &T) -> Option<&mut LockRequest<M>> {
        self.requests.get_mut(txn)
    }

    pub fn remove(&mut self, txn: &T) -> Option<LockRequest<M>> {
        self.requests.remove(txn)
    }

    pub fn contains(&self, txn: &T) -> bool {
        self.requests.contains_key(txn)
    }

    /// Iterate members in admission order.
    pub fn iter(&self) -> indexed_list::Iter<'_, T, LockRequest<M>> {
        self.requests.iter()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
