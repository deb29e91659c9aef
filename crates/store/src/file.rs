//! Durable JSON-file store.
//!
//! One file per chat (`chat_<id>.json`) plus one `configs.json`. Every write
//! goes to a temporary sibling first and is moved into place with
//! `fs::rename`, so an external observer only ever sees the previous state or
//! the fully-written next state. In-memory state is committed only after the
//! rename succeeds; a failed write leaves both the file and the log untouched.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use settlebook_core::{ChatId, ExternalRef, TransactionId};
use settlebook_ledger::{GroupConfig, GroupConfigPatch, NewTransaction, Transaction};

use crate::r#trait::{
    ConfigStore, DEFAULT_LOCK_TIMEOUT, PeriodFilter, StoreError, TransactionStore,
};

const CHAT_FILE_PREFIX: &str = "chat_";
const CONFIG_FILE: &str = "configs.json";

/// Serialize, write to a temporary sibling, fsync, then atomically replace.
fn persist_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug)]
struct ChatLog {
    path: PathBuf,
    txns: Vec<Transaction>,
}

impl ChatLog {
    /// Apply `mutate` to a copy, persist the copy, and only then commit it.
    fn commit<R>(
        &mut self,
        mutate: impl FnOnce(&mut Vec<Transaction>) -> R,
    ) -> Result<R, StoreError> {
        let mut next = self.txns.clone();
        let out = mutate(&mut next);
        persist_json(&self.path, &next)?;
        self.txns = next;
        Ok(out)
    }
}

type Shard = Arc<Mutex<ChatLog>>;

/// Durable per-chat transaction log.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    shards: DashMap<ChatId, Shard>,
    /// id -> owning chat, rebuilt from disk on open.
    index: DashMap<TransactionId, ChatId>,
    next_id: AtomicU64,
    lock_timeout: Duration,
}

impl FileStore {
    /// Open (or create) a store rooted at `dir`, loading every existing chat
    /// log and resuming id assignment after the highest id on disk.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_lock_timeout(dir, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn open_with_lock_timeout(
        dir: impl Into<PathBuf>,
        lock_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let store = Self {
            dir,
            shards: DashMap::new(),
            index: DashMap::new(),
            next_id: AtomicU64::new(0),
            lock_timeout,
        };

        let mut max_id = 0u64;
        for entry in fs::read_dir(&store.dir)? {
            let path = entry?.path();
            let Some(chat_id) = parse_chat_file(&path) else {
                continue;
            };
            let data = fs::read(&path)?;
            let txns: Vec<Transaction> = serde_json::from_slice(&data)?;
            for txn in &txns {
                max_id = max_id.max(txn.id.as_u64());
                store.index.insert(txn.id, chat_id);
            }
            store
                .shards
                .insert(chat_id, Arc::new(Mutex::new(ChatLog { path, txns })));
        }
        store.next_id.store(max_id, Ordering::SeqCst);

        Ok(store)
    }

    fn shard(&self, chat_id: ChatId) -> Shard {
        self.shards
            .entry(chat_id)
            .or_insert_with(|| {
                let path = self.dir.join(format!("{CHAT_FILE_PREFIX}{chat_id}.json"));
                Arc::new(Mutex::new(ChatLog {
                    path,
                    txns: Vec::new(),
                }))
            })
            .clone()
    }

    fn lock<'a>(
        &self,
        shard: &'a Mutex<ChatLog>,
        chat_id: ChatId,
    ) -> Result<MutexGuard<'a, ChatLog>, StoreError> {
        shard.try_lock_for(self.lock_timeout).ok_or_else(|| {
            StoreError::Busy(format!(
                "chat {chat_id} writer lock not acquired within {:?}",
                self.lock_timeout
            ))
        })
    }
}

/// `chat_<id>.json` -> chat id. Temporary files and foreign names are skipped.
fn parse_chat_file(path: &Path) -> Option<ChatId> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let raw = stem.strip_prefix(CHAT_FILE_PREFIX)?;
    raw.parse::<i64>().ok().map(ChatId::new)
}

impl TransactionStore for FileStore {
    fn append(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let chat_id = new.chat_id;
        let shard = self.shard(chat_id);
        let mut log = self.lock(&shard, chat_id)?;

        let id = TransactionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let txn = Transaction::from_new(id, new);
        log.commit(|txns| txns.push(txn.clone()))?;
        self.index.insert(id, chat_id);
        debug!(chat_id = %chat_id, id = %id, "transaction appended");
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

        let existing = log
            .txns
            .iter()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound)?
            .external_ref;
        match existing {
            Some(current) if current == external_ref => Ok(()),
            Some(current) => Err(StoreError::Conflict(format!(
                "transaction {id} already references {current}, refusing {external_ref}"
            ))),
            None => log.commit(|txns| {
                if let Some(txn) = txns.iter_mut().find(|t| t.id == id) {
                    txn.external_ref = Some(external_ref);
                }
            }),
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
            let Some(pos) = log
                .txns
                .iter()
                .position(|t| t.external_ref == Some(external_ref))
            else {
                continue;
            };
            let txn = log.commit(|txns| txns.remove(pos))?;
            self.index.remove(&txn.id);
            debug!(chat_id = %chat_id, id = %txn.id, "transaction removed by external ref");
            return Ok(Some(txn));
        }
        Ok(None)
    }

    fn list(&self, chat_id: ChatId, filter: PeriodFilter) -> Result<Vec<Transaction>, StoreError> {
        let shard = self.shard(chat_id);
        let log = self.lock(&shard, chat_id)?;
        Ok(log
            .txns
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    fn remove_period(
        &self,
        chat_id: ChatId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, StoreError> {
        let shard = self.shard(chat_id);
        let mut log = self.lock(&shard, chat_id)?;

        let removed: Vec<Transaction> = log
            .txns
            .iter()
            .filter(|t| t.created_at >= start && t.created_at < end)
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(removed);
        }

        log.commit(|txns| txns.retain(|t| !(t.created_at >= start && t.created_at < end)))?;
        for txn in &removed {
            self.index.remove(&txn.id);
        }
        debug!(chat_id = %chat_id, count = removed.len(), "period reset removed transactions");
        Ok(removed)
    }
}

/// Durable keyed config collection (single `configs.json`).
///
/// Config updates are rare; one lock over the whole collection is enough, the
/// per-chat discipline applies to the transaction log only.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    configs: RwLock<Vec<GroupConfig>>,
}

impl FileConfigStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let path = dir.join(CONFIG_FILE);

        let configs = if path.exists() {
            serde_json::from_slice(&fs::read(&path)?)?
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            configs: RwLock::new(configs),
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn get(&self, chat_id: ChatId) -> Result<GroupConfig, StoreError> {
        if let Some(config) = self
            .configs
            .read()
            .iter()
            .find(|c| c.chat_id == chat_id)
        {
            return Ok(config.clone());
        }

        // First access: create the zero-valued default (not yet configured).
        // Persisting it is unnecessary, the default is deterministic.
        let mut configs = self.configs.write();
        if let Some(config) = configs.iter().find(|c| c.chat_id == chat_id) {
            return Ok(config.clone());
        }
        let config = GroupConfig::unconfigured(chat_id);
        configs.push(config.clone());
        Ok(config)
    }

    fn set(&self, chat_id: ChatId, patch: GroupConfigPatch) -> Result<GroupConfig, StoreError> {
        let mut configs = self.configs.write();

        let mut next = configs.clone();
        let config = match next.iter_mut().find(|c| c.chat_id == chat_id) {
            Some(config) => {
                patch.apply(config);
                config.clone()
            }
            None => {
                let mut config = GroupConfig::unconfigured(chat_id);
                patch.apply(&mut config);
                next.push(config.clone());
                config
            }
        };

        persist_json(&self.path, &next)?;
        *configs = next;
        debug!(chat_id = %chat_id, "group config updated");
        Ok(config)
    }
}
