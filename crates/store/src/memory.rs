//! In-memory store implementations.
//!
//! Intended for tests/dev. Same per-chat single-writer discipline as the file
//! store, without durability.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

use settlebook_core::{ChatId, ExternalRef, TransactionId};
use settlebook_ledger::{GroupConfig, GroupConfigPatch, NewTransaction, Transaction};

use crate::r#trait::{
    ConfigStore, DEFAULT_LOCK_TIMEOUT, PeriodFilter, StoreError, TransactionStore,
};

type Shard = Arc<Mutex<Vec<Transaction>>>;

/// In-memory per-chat transaction log.
#[derive(Debug)]
pub struct MemoryStore {
    shards: DashMap<ChatId, Shard>,
    /// id -> owning chat, so reference-addressed operations skip a full scan.
    index: DashMap<TransactionId, ChatId>,
    next_id: AtomicU64,
    lock_timeout: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shards: DashMap::new(),
            index: DashMap::new(),
            next_id: AtomicU64::new(0),
            lock_timeout,
        }
    }

    fn shard(&self, chat_id: ChatId) -> Shard {
        self.shards.entry(chat_id).or_default().clone()
    }

    fn lock<'a>(
        &self,
        shard: &'a Mutex<Vec<Transaction>>,
        chat_id: ChatId,
    ) -> Result<MutexGuard<'a, Vec<Transaction>>, StoreError> {
        shard.try_lock_for(self.lock_timeout).ok_or_else(|| {
            StoreError::Busy(format!(
                "chat {chat_id} writer lock not acquired within {:?}",
                self.lock_timeout
            ))
        })
    }

    #[cfg(test)]
    pub(crate) fn shard_handle(&self, chat_id: ChatId) -> Shard {
        self.shard(chat_id)
    }
}

impl TransactionStore for MemoryStore {
    fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let chat_id = new.chat_id;
        let shard = self.shard(chat_id);
        let mut log = self.lock(&shard, chat_id)?;

        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let txn = Transaction::from_new(id, new);
        log.push(txn.clone());
        self.index.insert(id, chat_id);
        Ok(txn)
    }

    fn attach_external_ref(
        &self,
        id: TransactionId,
        external_ref: ExternalRef,
    ) -> Result<(), StoreError> {
        let chat_id = *self.index.get(&id).ok_or(StoreError::NotFound)?;
        let shard = self.shard(chat_id);
        let mut log = self.lock(&shard, chat_id)?;

        let txn = log
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?;
        match txn.external_ref {
            Some(existing) if existing == external_ref => Ok(()),
            Some(existing) => Err(StoreError::Conflict(format!(
                "transaction {id} already references {existing}, refusing {external_ref}"
            ))),
            None => {
                txn.external_ref = Some(external_ref);
                Ok(())
            }
        }
    }

    fn remove_by_external_ref(
        &self,
        external_ref: ExternalRef,
    ) -> Result<Option<Transaction>, StoreError> {
        let shards: Vec<(ChatId, Shard)> = self
            .shards
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (chat_id, shard) in shards {
            let mut log = self.lock(&shard, chat_id)?;
            if let Some(pos) = log.iter().position(|t| t.external_ref == Some(external_ref)) {
                let txn = log.remove(pos);
                self.index.remove(&txn.id);
                return Ok(Some(txn));
            }
        }
        Ok(None)
    }

    fn list(&self, chat_id: ChatId, filter: PeriodFilter) -> Result<Vec<Transaction>, StoreError> {
        let shard = self.shard(chat_id);
        let log = self.lock(&shard, chat_id)?;
        Ok(log.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    fn remove_period(
        &self,
        chat_id: ChatId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let shard = self.shard(chat_id);
        let mut log = self.lock(&shard, chat_id)?;

        let (removed, kept): (Vec<Transaction>, Vec<Transaction>) = log
            .drain(..)
            .partition(|t| t.created_at >= start && t.created_at < end);
        *log = kept;
        for txn in &removed {
            self.index.remove(&txn.id);
        }
        Ok(removed)
    }
}

/// In-memory keyed config collection.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    configs: DashMap<ChatId, GroupConfig>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, chat_id: ChatId) -> Result<GroupConfig, StoreError> {
        Ok(self
            .configs
            .entry(chat_id)
            .or_insert_with(|| GroupConfig::unconfigured(chat_id))
            .clone())
    }

    fn set(&self, chat_id: ChatId, patch: GroupConfigPatch) -> Result<GroupConfig, StoreError> {
        let mut entry = self
            .configs
            .entry(chat_id)
            .or_insert_with(|| GroupConfig::unconfigured(chat_id));
        patch.apply(&mut entry);
        Ok(entry.clone())
    }
}
