//! Deadlock victim selection
//!
//! When the probe finds a wait-for cycle, one participating transaction is
//! denied to break it. Which one is a policy decision supplied by the
//! caller; the default picks the largest identifier.

use std::collections::BTreeSet;

/// Chooses the transaction to deny from the members of a wait-for cycle.
///
/// `select` is called with a nonempty candidate set while the lock manager
/// holds its internal latch, so implementations should be quick and must not
/// call back into the manager.
pub trait VictimPolicy<T>: Send + Sync {
    fn select(&self, candidates: &BTreeSet<T>) -> T;
}

/// Default policy: deny the transaction with the largest identifier.
pub struct MaxTxnId;

impl<T> VictimPolicy<T> for MaxTxnId
where
    T: Copy + Ord,
{
    fn select(&self, candidates: &BTreeSet<T>) -> T {
        *candidates
            .iter()
            .next_back()
            .expect("candidate set is nonempty")
    }
}

/// Adapter turning a plain function or closure into a policy.
pub struct FnPolicy<F>(pub F);

impl<T, F> VictimPolicy<T> for FnPolicy<F>
where
    F: Fn(&BTreeSet<T>) -> T + Send + Sync,
{
    fn select(&self, candidates: &BTreeSet<T>) -> T {
        (self.0)(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_policy_selects_largest() {
        let candidates: BTreeSet<u64> = [3, 1, 2].into_iter().collect();
        assert_eq!(MaxTxnId.select(&candidates), 3);
    }

    #[test]
    fn test_fn_policy() {
        let policy = FnPolicy(|candidates: &BTreeSet<u64>| *candidates.iter().next().unwrap());
        let candidates: BTreeSet<u64> = [3, 1, 2].into_iter().collect();
        assert_eq!(policy.select(&candidates), 1);
    }
}
