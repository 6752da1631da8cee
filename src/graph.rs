//! Transaction dependency graph
//!
//! A directed wait-for graph over transaction identifiers: an edge `a -> b`
//! means `a` is waiting for `b` to release a lock. The graph spans all
//! records, so lock-order cycles across records show up as graph cycles.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Directed wait-for graph with cycle detection.
pub struct DependencyGraph<T> {
    edges: HashMap<T, HashSet<T>>,
}

impl<T> DependencyGraph<T>
where
    T: Copy + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// Record that `a` waits for `b`. Re-adding an existing edge is a no-op.
    pub fn add(&mut self, a: T, b: T) {
        self.edges.entry(a).or_default().insert(b);
    }

    /// Remove the edge `a -> b` if it exists.
    pub fn remove_edge(&mut self, a: T, b: T) {
        if let Some(targets) = self.edges.get_mut(&a) {
            targets.remove(&b);
            if targets.is_empty() {
                self.edges.remove(&a);
            }
        }
    }

    /// Remove every edge into and out of `a`.
    pub fn remove_node(&mut self, a: T) {
        self.edges.remove(&a);
        self.edges.retain(|_, targets| {
            targets.remove(&a);
            !targets.is_empty()
        });
    }

    pub fn depends_on(&self, a: &T, b: &T) -> bool {
        self.edges.get(a).is_some_and(|targets| targets.contains(b))
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Find the members of a cycle reachable from `origin`, or an empty set
    /// if none exists. When several cycles are reachable, the first one the
    /// depth-first walk encounters is reported; breaking any one cycle is
    /// enough, the rest surface on a later scan.
    pub fn find_cycle_from(&self, origin: T) -> BTreeSet<T> {
        // Three-color DFS: absent = unseen, false = in progress, true = done.
        // Revisiting an in-progress node closes a cycle; the parent chain
        // from that node back to itself is the cycle.
        let mut finished = HashMap::new();
        let mut parent = HashMap::new();

        let mut cycle = BTreeSet::new();
        if let Some(found) = self.visit(origin, &mut finished, &mut parent) {
            cycle.insert(found);
            let mut node = parent[&found];
            while node != found {
                cycle.insert(node);
                node = parent[&node];
            }
        }
        cycle
    }

    fn visit(
        &self,
        node: T,
        finished: &mut HashMap<T, bool>,
        parent: &mut HashMap<T, T>,
    ) -> Option<T> {
        finished.insert(node, false);

        if let Some(targets) = self.edges.get(&node) {
            for &next in targets {
                match finished.get(&next) {
                    Some(true) => continue,
                    Some(false) => {
                        parent.insert(next, node);
                        return Some(next);
                    }
                    None => {
                        parent.insert(next, node);
                        if let Some(found) = self.visit(next, finished, parent) {
                            return Some(found);
                        }
                    }
                }
            }
        }

        finished.insert(node, true);
        None
    }
}

impl<T> Default for DependencyGraph<T>
where
    T: Copy + Eq + Hash + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}
