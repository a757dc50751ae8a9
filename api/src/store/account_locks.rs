//! Per-account mutex registry (§4.4). Any operation that reads-modifies-
//! writes balance state on a single account — Commit, Cancel, Delete, a
//! consistent-snapshot GetBalance, or genesis-Balance creation during
//! Account Create — holds this lock for the lifetime of its critical
//! section.
//!
//! Acquisition order never nests two locks on distinct accounts: every
//! operation touches exactly one account's lock, so deadlock is impossible
//! by construction (§4.4).

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use payloads::AccountId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct AccountLockTable {
    locks: StdMutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

/// RAII guard: the account's lock is released when this value is dropped,
/// so it cannot be forgotten on an early return or a propagated `?`.
pub struct AccountLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl AccountLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the exclusive lock for `account_id`, creating its entry if
    /// this is the first caller to touch it.
    pub async fn lock(&self, account_id: AccountId) -> AccountLockGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap();
            locks.entry(account_id).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        AccountLockGuard { _guard: guard }
    }

    /// Opportunistically drop table entries for accounts nobody else
    /// references anymore. Called from `Delete`; this is a memory
    /// optimization, not a correctness requirement — a concurrent caller
    /// that already holds (or is waiting on) the `Arc` keeps it alive
    /// regardless of whether the table still has a copy.
    pub fn prune(&self, account_id: AccountId) {
        let mut locks = self.locks.lock().unwrap();
        if let Some(mutex) = locks.get(&account_id) {
            if Arc::strong_count(mutex) == 1 {
                locks.remove(&account_id);
            }
        }
    }
}
