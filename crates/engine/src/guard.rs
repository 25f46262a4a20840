//! Serialization of purchase bookings.
//!
//! A booking reads the spent balance of a contract, decides, then writes a
//! new purchase. Two bookings on the same contract must never interleave
//! inside that span, or both could pass the credit check on the same stale
//! balance. [`ContractGuard`] hands out one permit per key at a time.
//!
//! Keys are contract ids under [`GuardScope::PerContract`], so bookings on
//! unrelated contracts run in parallel. [`GuardScope::Global`] maps every
//! contract onto a single key and serializes all bookings of the process.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::Deserialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardScope {
    /// One lock per contract id.
    #[default]
    PerContract,
    /// One lock for the whole process.
    Global,
}

type Slot = Arc<AsyncMutex<()>>;

/// Lock table keyed by contract id.
///
/// Slots are created on first use and dropped again once nobody holds or
/// waits on them, so the table only grows with the number of contracts being
/// booked concurrently.
#[derive(Debug, Default)]
pub struct ContractGuard {
    scope: GuardScope,
    slots: Mutex<HashMap<i32, Slot>>,
}

/// Exclusive right to book against a contract. Released on drop.
#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct GuardPermit<'a> {
    guard: &'a ContractGuard,
    key: i32,
    lock: Option<OwnedMutexGuard<()>>,
}

impl ContractGuard {
    pub fn new(scope: GuardScope) -> Self {
        Self {
            scope,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> GuardScope {
        self.scope
    }

    fn key(&self, contract_id: i32) -> i32 {
        match self.scope {
            GuardScope::PerContract => contract_id,
            GuardScope::Global => 0,
        }
    }

    /// Waits until no other permit for `contract_id` is alive.
    pub async fn acquire(&self, contract_id: i32) -> GuardPermit<'_> {
        let key = self.key(contract_id);
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };
        let lock = slot.lock_owned().await;
        GuardPermit {
            guard: self,
            key,
            lock: Some(lock),
        }
    }

    /// Number of keys currently held or waited on.
    pub fn active_keys(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, key: i32, lock: OwnedMutexGuard<()>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        // The table's own reference is the last one: no holder, no waiter.
        if slots
            .get(&key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&key);
        }
    }
}

impl GuardPermit<'_> {
    pub fn contract_key(&self) -> i32 {
        self.key
    }
}

impl Drop for GuardPermit<'_> {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            self.guard.release(self.key, lock);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[tokio::test]
    async fn permits_on_same_contract_exclude_each_other() {
        let guard = ContractGuard::new(GuardScope::PerContract);
        let permit = guard.acquire(7).await;

        let waiting = tokio::time::timeout(Duration::from_millis(50), guard.acquire(7)).await;
        assert!(waiting.is_err());

        drop(permit);
        let again = tokio::time::timeout(Duration::from_millis(50), guard.acquire(7)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn different_contracts_do_not_block() {
        let guard = ContractGuard::new(GuardScope::PerContract);
        let _first = guard.acquire(1).await;
        let second = tokio::time::timeout(Duration::from_millis(50), guard.acquire(2)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn global_scope_serializes_everything() {
        let guard = ContractGuard::new(GuardScope::Global);
        let first = guard.acquire(1).await;
        assert_eq!(first.contract_key(), 0);
        let second = tokio::time::timeout(Duration::from_millis(50), guard.acquire(2)).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn idle_slots_are_pruned() {
        let guard = ContractGuard::new(GuardScope::PerContract);
        {
            let _a = guard.acquire(1).await;
            let _b = guard.acquire(2).await;
            assert_eq!(guard.active_keys(), 2);
        }
        assert_eq!(guard.active_keys(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn critical_section_is_never_shared() {
        let guard = Arc::new(ContractGuard::new(GuardScope::PerContract));
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let guard = Arc::clone(&guard);
            let inside = Arc::clone(&inside);
            let peak = Arc::clone(&peak);
            tasks.spawn(async move {
                let _permit = guard.acquire(42).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(guard.active_keys(), 0);
    }
}
