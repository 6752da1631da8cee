//! Per-record request queue
//!
//! A FIFO of request groups, each tagged with a monotonically increasing
//! group id. The front group is the granted one; later groups wait their
//! turn. An auxiliary transaction-to-group map gives O(1) access to any
//! queued request.

use std::collections::HashMap;
use std::hash::Hash;

use crate::indexed_list::{self, IndexedList};
use crate::matrix::ContentionMatrix;
use crate::mode::LockMode;
use crate::request::{LockRequest, LockRequestGroup};

/// Identifier of a request group within a queue.
pub type GroupId = u64;

/// Reserved null group id. Real group ids start at 1.
pub const NULL_GROUP_ID: GroupId = 0;

/// FIFO of lock request groups for a single record.
pub struct LockRequestQueue<T, M> {
    /// Groups in admission order, keyed by group id.
    groups: IndexedList<GroupId, LockRequestGroup<T, M>>,
    /// Transaction to group id, covering every request in the queue.
    group_of: HashMap<T, GroupId>,
}

impl<T, M> LockRequestQueue<T, M>
where
    T: Copy + Eq + Hash,
    M: LockMode,
{
    pub fn new() -> Self {
        Self {
            groups: IndexedList::new(),
            group_of: HashMap::new(),
        }
    }

    /// Admit a request, returning the id of the group it joined.
    ///
    /// An empty queue gets a fresh group with id 1. A request compatible
    /// with every non-denied member of the last group piggybacks on it;
    /// otherwise a new trailing group is created. A transaction with a
    /// request already anywhere in the queue is rejected with
    /// [`NULL_GROUP_ID`] and the queue is left unchanged.
    pub fn admit(&mut self, txn: T, mode: M, matrix: &ContentionMatrix) -> GroupId {
        if self.groups.is_empty() {
            let group_id = NULL_GROUP_ID + 1;
            let mut group = LockRequestGroup::new();
            let admitted = group.try_admit(txn, mode, matrix);
            debug_assert!(admitted, "admission into an empty group cannot fail");
            self.groups.push_back(group_id, group);
            self.group_of.insert(txn, group_id);
            return group_id;
        }

        if self.group_of.contains_key(&txn) {
            return NULL_GROUP_ID;
        }

        let (&last_id, last_group) = self.groups.back_mut().expect("queue is nonempty");
        if last_group.try_admit(txn, mode, matrix) {
            self.group_of.insert(txn, last_id);
            return last_id;
        }

        let group_id = last_id + 1;
        let mut group = LockRequestGroup::new();
        let admitted = group.try_admit(txn, mode, matrix);
        debug_assert!(admitted, "admission into an empty group cannot fail");
        self.groups.push_back(group_id, group);
        self.group_of.insert(txn, group_id);
        group_id
    }

    pub fn request(&self, txn: &T) -> Option<&LockRequest<M>> {
        let group_id = self.group_of.get(txn)?;
        self.groups.get(group_id)?.request(txn)
    }

    /// Mark the transaction's request as denied.
    ///
    /// Panics if no request exists: denial is only ever applied to a request
    /// the deadlock probe just found in this queue.
    pub fn deny(&mut self, txn: &T) {
        let group_id = self.group_of.get(txn).expect("request exists in queue");
        self.groups
            .get_mut(group_id)
            .expect("group map is consistent")
            .request_mut(txn)
            .expect("group map is consistent")
            .deny();
    }

    /// Remove the transaction's request, dropping its group if emptied.
    pub fn remove(&mut self, txn: &T) -> Option<LockRequest<M>> {
        let group_id = self.group_of.remove(txn)?;
        let group = self
            .groups
            .get_mut(&group_id)
            .expect("group map is consistent");
        let request = group.remove(txn).expect("group map is consistent");
        if group.is_empty() {
            self.groups.remove(&group_id);
        }
        Some(request)
    }

    pub fn contains(&self, txn: &T) -> bool {
        self.group_of.contains_key(txn)
    }

    /// Id of the group holding the transaction's request, if any.
    pub fn group_id_of(&self, txn: &T) -> Option<GroupId> {
        self.group_of.get(txn).copied()
    }

    /// Id of the front (oldest) group.
    pub fn front_group_id(&self) -> Option<GroupId> {
        self.groups.front().map(|(&group_id, _)| group_id)
    }

    /// Iterate groups in FIFO order.
    pub fn iter(&self) -> indexed_list::Iter<'_, GroupId, LockRequestGroup<T, M>> {
        self.groups.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<T, M> Default for LockRequestQueue<T, M>
where
    T: Copy + Eq + Hash,
    M: LockMode,
{
    fn default() -> Self {
        Self::new()
    }
}
