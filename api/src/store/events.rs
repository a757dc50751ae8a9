//! Replaces the source system's event callbacks (`AccountCreated`,
//! `EntryAppended`, `EntryCommitted`, ...) with a single observer trait.
//!
//! Every call site invokes `notify` only after the enclosing
//! `sqlx::Transaction::commit` has returned `Ok`, so an observer can never
//! see an event for a transaction that later rolled back.

use payloads::{AccountId, EntryId};

#[derive(Debug, Clone)]
pub enum LedgerEvent {
    AccountCreated { account_id: AccountId },
    AccountDeleted { account_id: AccountId },
    EntryAppended { account_id: AccountId, entry_id: EntryId },
    EntryCanceled { account_id: AccountId, entry_id: EntryId },
    Committed { account_id: AccountId, balance_entry_id: EntryId },
}

pub trait Observer: Send + Sync {
    fn notify(&self, event: &LedgerEvent);
}

/// The reference observer: logs every event at `info` via `tracing`, the
/// same channel every other component in this crate uses.
pub struct LoggingObserver;

impl Observer for LoggingObserver {
    fn notify(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::AccountCreated { account_id } => {
                tracing::info!(%account_id, "account created");
            }
            LedgerEvent::AccountDeleted { account_id } => {
                tracing::info!(%account_id, "account deleted");
            }
            LedgerEvent::EntryAppended { account_id, entry_id } => {
                tracing::info!(%account_id, %entry_id, "entry appended");
            }
            LedgerEvent::EntryCanceled { account_id, entry_id } => {
                tracing::info!(%account_id, %entry_id, "entry canceled");
            }
            LedgerEvent::Committed { account_id, balance_entry_id } => {
                tracing::info!(%account_id, %balance_entry_id, "committed");
            }
        }
    }
}
