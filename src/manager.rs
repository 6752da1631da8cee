//! Lock manager
//!
//! The orchestrator: a lock table mapping records to request queues, a
//! global wait-for graph, and the wait/notify discipline tying them
//! together. All state is serialized under one latch; blocked transactions
//! wait on per-record condition variables and re-run the deadlock probe on
//! every timeout tick.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::LockManagerConfig;
use crate::graph::DependencyGraph;
use crate::matrix::ContentionMatrix;
use crate::mode::LockMode;
use crate::policy::{MaxTxnId, VictimPolicy};
use crate::queue::{GroupId, LockRequestQueue, NULL_GROUP_ID};

/// Per-record lock state: the request queue, the condition variable its
/// waiters block on, and the id of the currently granted group.
struct LockTableEntry<T, M> {
    queue: LockRequestQueue<T, M>,
    condvar: Arc<Condvar>,
    granted_group_id: GroupId,
}

impl<T, M> LockTableEntry<T, M>
where
    T: Copy + Eq + Hash,
    M: LockMode,
{
    fn new() -> Self {
        Self {
            queue: LockRequestQueue::new(),
            condvar: Arc::new(Condvar::new()),
            // The first group admitted into an empty queue gets id 1.
            granted_group_id: NULL_GROUP_ID + 1,
        }
    }
}

/// Everything the latch protects: the lock table and the wait-for graph.
/// The deadlock probe needs a consistent snapshot of both, which is why a
/// single mutex covers them.
struct State<R, T, M> {
    table: HashMap<R, LockTableEntry<T, M>>,
    graph: DependencyGraph<T>,
}

/// A synchronization primitive mediating concurrent access by transactions
/// to a collection of keyed records.
///
/// Unlike a mutex or reader-writer lock, the manager is parameterized by an
/// arbitrary set of lock modes and a [`ContentionMatrix`] declaring which
/// mode pairs conflict. Requests on a record are granted in FIFO order of
/// compatibility groups; lock-order cycles across records are detected by a
/// periodic probe and broken by denying one participant, chosen by the
/// [`VictimPolicy`].
///
/// Record and transaction identifiers are caller-defined. A transaction is a
/// logical execution context, not necessarily an OS thread, but each `lock`
/// call blocks the calling thread until the request is granted or denied.
///
/// # Caller contract
///
/// A transaction proceeds synchronously: it must not issue a `lock` call
/// while a previous `lock` call of the same transaction is still blocked.
/// The deadlock probe relies on each transaction having at most one waiting
/// request system-wide when picking its victim.
pub struct LockManager<R, T, M> {
    matrix: ContentionMatrix,
    scan_interval: Duration,
    policy: Box<dyn VictimPolicy<T>>,
    /// The global latch.
    state: Mutex<State<R, T, M>>,
}

impl<R, T, M> LockManager<R, T, M>
where
    R: Clone + Eq + Hash + Debug,
    T: Copy + Eq + Hash + Ord + Debug,
    M: LockMode + Debug,
{
    /// Create a manager with the default victim policy (largest transaction
    /// id loses).
    pub fn new(matrix: ContentionMatrix, config: LockManagerConfig) -> Self {
        Self::with_policy(matrix, config, Box::new(MaxTxnId))
    }

    /// Create a manager with a caller-supplied victim policy.
    pub fn with_policy(
        matrix: ContentionMatrix,
        config: LockManagerConfig,
        policy: Box<dyn VictimPolicy<T>>,
    ) -> Self {
        Self {
            matrix,
            scan_interval: config.scan_interval,
            policy,
            state: Mutex::new(State {
                table: HashMap::new(),
                graph: DependencyGraph::new(),
            }),
        }
    }

    /// Acquire a lock on `record` in the given mode.
    ///
    /// Blocks until the request is granted or denied. Returns `true` on
    /// grant. Returns `false` without blocking if `txn` already has a
    /// request on this record, and after blocking if the request was denied
    /// as a deadlock victim; a denied transaction must release its other
    /// locks and retry from scratch.
    pub fn lock(&self, record: &R, txn: T, mode: M) -> bool {
        let mut state = self.state.lock();

        let condvar = {
            let State { table, graph } = &mut *state;
            let entry = table
                .entry(record.clone())
                .or_insert_with(LockTableEntry::new);

            let group_id = entry.queue.admit(txn, mode, &self.matrix);
            if group_id == NULL_GROUP_ID {
                tracing::debug!(?record, ?txn, "duplicate lock request rejected");
                return false;
            }
            if group_id == entry.granted_group_id {
                tracing::debug!(?record, ?txn, ?mode, "lock granted");
                return true;
            }

            // The request landed behind the granted group: record that this
            // transaction waits for every earlier group, and that every
            // later group waits for it, then block.
            insert_dependencies(graph, &entry.queue, txn);
            tracing::debug!(?record, ?txn, ?mode, group_id, "lock request queued");
            entry.condvar.clone()
        };

        loop {
            {
                let entry = state
                    .table
                    .get(record)
                    .expect("entry outlives its waiting requests");
                let request = entry
                    .queue
                    .request(&txn)
                    .expect("waiting request stays queued");
                if request.is_denied() {
                    break;
                }
                if entry.queue.group_id_of(&txn) == Some(entry.granted_group_id) {
                    tracing::debug!(?record, ?txn, ?mode, "lock granted after wait");
                    return true;
                }
            }

            if condvar.wait_for(&mut state, self.scan_interval).timed_out() {
                self.deadlock_probe(&mut state, record, txn);
            }
        }

        // Denied: clean up our own request and its edges. Every edge
        // involving the denied request lives in this record's queue, so no
        // other queue needs to be touched.
        let notify = {
            let State { table, graph } = &mut *state;
            let entry = table.get_mut(record).expect("entry outlives its waiting requests");
            remove_dependencies(graph, &entry.queue, txn);
            entry.queue.remove(&txn);
            Self::settle_queue(table, record)
        };
        drop(state);
        if let Some(condvar) = notify {
            condvar.notify_all();
        }
        tracing::debug!(?record, ?txn, "lock request denied to break deadlock");
        false
    }

    /// Release a granted lock on `record`.
    ///
    /// A no-op if the transaction has no request here or is still waiting;
    /// releasing is only meaningful for what was actually acquired.
    pub fn unlock(&self, record: &R, txn: T) {
        let mut state = self.state.lock();

        let notify = {
            let State { table, graph } = &mut *state;
            let Some(entry) = table.get_mut(record) else {
                return;
            };
            if entry.queue.group_id_of(&txn) != Some(entry.granted_group_id) {
                return;
            }

            remove_dependencies(graph, &entry.queue, txn);
            entry.queue.remove(&txn);
            tracing::debug!(?record, ?txn, "lock released");
            Self::settle_queue(table, record)
        };

        // Notify after releasing the latch to reduce contention.
        drop(state);
        if let Some(condvar) = notify {
            condvar.notify_all();
        }
    }

    /// Re-establish the queue invariants after a request was removed: erase
    /// the table entry if the queue emptied, otherwise advance the granted
    /// group to the front and hand back the condvar to notify.
    fn settle_queue(
        table: &mut HashMap<R, LockTableEntry<T, M>>,
        record: &R,
    ) -> Option<Arc<Condvar>> {
        let entry = table.get_mut(record)?;
        if entry.queue.is_empty() {
            table.remove(record);
            return None;
        }
        let front = entry.queue.front_group_id().expect("queue is nonempty");
        if front == entry.granted_group_id {
            return None;
        }
        entry.granted_group_id = front;
        tracing::debug!(?record, group_id = front, "granted group advanced");
        Some(entry.condvar.clone())
    }

    /// Look for a wait-for cycle involving the probing transaction and, if
    /// one exists, deny the victim's waiting request. Runs under the latch
    /// from the timed-wait path of `lock`.
    fn deadlock_probe(&self, state: &mut State<R, T, M>, record: &R, txn: T) {
        // A denied prober is already on its way out; skip the scan.
        let denied = state
            .table
            .get(record)
            .and_then(|entry| entry.queue.request(&txn))
            .map(|request| request.is_denied())
            .unwrap_or(true);
        if denied {
            return;
        }

        let cycle = state.graph.find_cycle_from(txn);
        if cycle.is_empty() {
            return;
        }

        let victim = self.policy.select(&cycle);
        tracing::warn!(?victim, cycle_len = cycle.len(), "deadlock detected");

        // A transaction has at most one waiting request system-wide, so the
        // first one found is the only one. Denying it and waking the
        // record's waiters is enough to break the cycle.
        for entry in state.table.values_mut() {
            if entry.queue.contains(&victim)
                && entry.queue.group_id_of(&victim) != Some(entry.granted_group_id)
            {
                entry.queue.deny(&victim);
                entry.condvar.notify_all();
                break;
            }
        }
    }
}

/// Record both wait directions for a freshly queued transaction: it waits
/// for every member of every group ahead of its own, and every member of
/// every group behind it waits for it. Idempotent.
fn insert_dependencies<T, M>(
    graph: &mut DependencyGraph<T>,
    queue: &LockRequestQueue<T, M>,
    txn: T,
) where
    T: Copy + Eq + Hash + Ord,
    M: LockMode,
{
    let group_id = queue
        .group_id_of(&txn)
        .expect("transaction was just admitted");

    let mut behind = false;
    for (&other_group_id, group) in queue.iter() {
        if other_group_id == group_id {
            behind = true;
            continue;
        }
        for (&other, _) in group.iter() {
            if behind {
                graph.add(other, txn);
            } else {
                graph.add(txn, other);
            }
        }
    }
}

/// Remove both wait directions for a transaction leaving a queue. Safe to
/// call with edges already gone.
fn remove_dependencies<T, M>(
    graph: &mut DependencyGraph<T>,
    queue: &LockRequestQueue<T, M>,
    txn: T,
) where
    T: Copy + Eq + Hash + Ord,
    M: LockMode,
{
    let group_id = queue
        .group_id_of(&txn)
        .expect("transaction has a request in this queue");

    let mut behind = false;
    for (&other_group_id, group) in queue.iter() {
        if other_group_id == group_id {
            behind = true;
            continue;
        }
        for (&other, _) in group.iter() {
            if behind {
                graph.remove_edge(other, txn);
            } else {
                graph.remove_edge(txn, other);
            }
        }
    }
}
