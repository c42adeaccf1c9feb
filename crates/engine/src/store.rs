//! Per-key-locked inventory store.
//!
//! All mutations to one `ItemKey` are serialized through that row's mutex.
//! Multi-row units lock every touched row in a canonical key order, apply
//! every change, then run the caller's follow-up (ledger appends, order
//! hooks) while still holding the locks; if anything fails, the rows are
//! restored from pre-mutation snapshots. Partial application is never
//! observable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use stocksmith_core::{CompanyId, StockError, StockResult};
use stocksmith_inventory::{AppliedDelta, InventoryItem, ItemKey, StockChange, StockPolicy};

/// Attempts to take a contended row lock before giving up with `Conflict`.
const LOCK_RETRY_ATTEMPTS: u32 = 200;
const LOCK_RETRY_BACKOFF: Duration = Duration::from_micros(100);

/// One requested change to one row, part of an atomic batch.
#[derive(Debug, Clone)]
pub struct StockMutation {
    pub key: ItemKey,
    pub change: StockChange,
    /// Expiry date stamped on the row under the same lock as the change,
    /// so it commits and rolls back with the rest of the unit.
    pub expiry: Option<NaiveDate>,
}

impl StockMutation {
    pub fn new(key: ItemKey, change: StockChange) -> Self {
        Self {
            key,
            change,
            expiry: None,
        }
    }

    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Result of one applied mutation: the signed deltas and the row after.
#[derive(Debug, Clone)]
pub struct AppliedOutcome {
    pub key: ItemKey,
    pub applied: AppliedDelta,
    pub item: InventoryItem,
}

/// Current-state store for inventory rows.
///
/// `apply_batch_with` is the only mutation primitive; everything else is
/// reads and row metadata. The `then` callback runs inside the same unit
/// as the mutations, holding the row locks: a failure there rolls every
/// row back before the error surfaces.
pub trait InventoryStore: Send + Sync {
    fn get(&self, key: &ItemKey) -> StockResult<Option<InventoryItem>>;

    /// Row lookup, creating an empty row on first use.
    fn get_or_create(&self, key: &ItemKey) -> StockResult<InventoryItem>;

    /// Snapshot of every row for one company.
    fn list(&self, company: CompanyId) -> StockResult<Vec<InventoryItem>>;

    fn set_locked(&self, key: &ItemKey, locked: bool) -> StockResult<InventoryItem>;

    fn set_expiry(&self, key: &ItemKey, expiry: Option<NaiveDate>) -> StockResult<InventoryItem>;

    /// Apply a batch of mutations atomically, then run `then` under the
    /// same locks. All-or-nothing: any validation failure or `then` error
    /// leaves every row exactly as it was.
    fn apply_batch_with<F>(
        &self,
        ops: &[StockMutation],
        policy: StockPolicy,
        then: F,
    ) -> StockResult<Vec<AppliedOutcome>>
    where
        F: FnOnce(&[AppliedOutcome]) -> StockResult<()>;

    /// Single-mutation convenience over `apply_batch_with`.
    fn apply_change(
        &self,
        key: &ItemKey,
        change: StockChange,
        policy: StockPolicy,
    ) -> StockResult<AppliedOutcome> {
        let mut outcomes = self.apply_batch_with(
            &[StockMutation::new(key.clone(), change)],
            policy,
            |_| Ok(()),
        )?;
        outcomes
            .pop()
            .ok_or_else(|| StockError::infrastructure("batch returned no outcome"))
    }
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn get(&self, key: &ItemKey) -> StockResult<Option<InventoryItem>> {
        (**self).get(key)
    }

    fn get_or_create(&self, key: &ItemKey) -> StockResult<InventoryItem> {
        (**self).get_or_create(key)
    }

    fn list(&self, company: CompanyId) -> StockResult<Vec<InventoryItem>> {
        (**self).list(company)
    }

    fn set_locked(&self, key: &ItemKey, locked: bool) -> StockResult<InventoryItem> {
        (**self).set_locked(key, locked)
    }

    fn set_expiry(&self, key: &ItemKey, expiry: Option<NaiveDate>) -> StockResult<InventoryItem> {
        (**self).set_expiry(key, expiry)
    }

    fn apply_batch_with<F>(
        &self,
        ops: &[StockMutation],
        policy: StockPolicy,
        then: F,
    ) -> StockResult<Vec<AppliedOutcome>>
    where
        F: FnOnce(&[AppliedOutcome]) -> StockResult<()>,
    {
        (**self).apply_batch_with(ops, policy, then)
    }
}

/// In-memory store: one mutex per row, a read-write map around them.
///
/// The outer map lock is held only to look up or insert row handles, never
/// across a row mutation, so independent keys proceed fully in parallel.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    rows: RwLock<HashMap<ItemKey, Arc<Mutex<InventoryItem>>>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &ItemKey, create: bool) -> StockResult<Option<Arc<Mutex<InventoryItem>>>> {
        {
            let rows = self
                .rows
                .read()
                .map_err(|_| StockError::infrastructure("store lock poisoned"))?;
            if let Some(handle) = rows.get(key) {
                return Ok(Some(Arc::clone(handle)));
            }
        }
        if !create {
            return Ok(None);
        }
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StockError::infrastructure("store lock poisoned"))?;
        let handle = rows
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(InventoryItem::new(key.clone(), Utc::now()))));
        Ok(Some(Arc::clone(handle)))
    }

    fn lock_row<'a>(
        handle: &'a Mutex<InventoryItem>,
    ) -> StockResult<MutexGuard<'a, InventoryItem>> {
        for _ in 0..LOCK_RETRY_ATTEMPTS {
            match handle.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::WouldBlock) => thread::sleep(LOCK_RETRY_BACKOFF),
                Err(TryLockError::Poisoned(_)) => {
                    return Err(StockError::infrastructure("row lock poisoned"));
                }
            }
        }
        Err(StockError::conflict("row lock contention, retries exhausted"))
    }

    fn with_row<T>(
        &self,
        key: &ItemKey,
        f: impl FnOnce(&mut InventoryItem) -> T,
    ) -> StockResult<T> {
        let handle = self
            .handle(key, true)?
            .ok_or_else(|| StockError::infrastructure("row handle missing"))?;
        let mut guard = Self::lock_row(&handle)?;
        Ok(f(&mut guard))
    }
}

impl InventoryStore for InMemoryInventoryStore {
    fn get(&self, key: &ItemKey) -> StockResult<Option<InventoryItem>> {
        match self.handle(key, false)? {
            None => Ok(None),
            Some(handle) => {
                let guard = Self::lock_row(&handle)?;
                Ok(Some(guard.clone()))
            }
        }
    }

    fn get_or_create(&self, key: &ItemKey) -> StockResult<InventoryItem> {
        self.with_row(key, |item| item.clone())
    }

    fn list(&self, company: CompanyId) -> StockResult<Vec<InventoryItem>> {
        let handles: Vec<Arc<Mutex<InventoryItem>>> = {
            let rows = self
                .rows
                .read()
                .map_err(|_| StockError::infrastructure("store lock poisoned"))?;
            rows.iter()
                .filter(|(key, _)| key.company == company)
                .map(|(_, handle)| Arc::clone(handle))
                .collect()
        };
        let mut items = Vec::with_capacity(handles.len());
        for handle in &handles {
            items.push(Self::lock_row(handle)?.clone());
        }
        Ok(items)
    }

    fn set_locked(&self, key: &ItemKey, locked: bool) -> StockResult<InventoryItem> {
        self.with_row(key, |item| {
            if locked {
                item.lock(Utc::now());
            } else {
                item.unlock(Utc::now());
            }
            item.clone()
        })
    }

    fn set_expiry(&self, key: &ItemKey, expiry: Option<NaiveDate>) -> StockResult<InventoryItem> {
        self.with_row(key, |item| {
            item.set_expiry_date(expiry, Utc::now());
            item.clone()
        })
    }

    fn apply_batch_with<F>(
        &self,
        ops: &[StockMutation],
        policy: StockPolicy,
        then: F,
    ) -> StockResult<Vec<AppliedOutcome>>
    where
        F: FnOnce(&[AppliedOutcome]) -> StockResult<()>,
    {
        if ops.is_empty() {
            then(&[])?;
            return Ok(Vec::new());
        }

        // Unique keys in canonical order; locking in one global order makes
        // concurrent multi-row units deadlock-free.
        let mut keys: Vec<&ItemKey> = Vec::new();
        for op in ops {
            if !keys.contains(&&op.key) {
                keys.push(&op.key);
            }
        }
        keys.sort_by_key(|k| k.lock_order());

        let mut handles = Vec::with_capacity(keys.len());
        for key in &keys {
            let handle = self
                .handle(key, true)?
                .ok_or_else(|| StockError::infrastructure("row handle missing"))?;
            handles.push(((*key).clone(), handle));
        }

        let mut guards: Vec<MutexGuard<'_, InventoryItem>> = Vec::with_capacity(handles.len());
        for (_, handle) in &handles {
            guards.push(Self::lock_row(handle)?);
        }

        let index: HashMap<&ItemKey, usize> = handles
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (key, i))
            .collect();

        // Pre-mutation snapshots for rollback.
        let snapshots: Vec<InventoryItem> = guards.iter().map(|g| (**g).clone()).collect();

        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            let row = index[&op.key];
            match guards[row].apply_change(&op.change, policy, now) {
                Ok(applied) => {
                    if op.expiry.is_some() {
                        guards[row].set_expiry_date(op.expiry, now);
                    }
                    outcomes.push(AppliedOutcome {
                        key: op.key.clone(),
                        applied,
                        item: guards[row].clone(),
                    });
                }
                Err(err) => {
                    for (guard, snapshot) in guards.iter_mut().zip(&snapshots) {
                        **guard = snapshot.clone();
                    }
                    return Err(err);
                }
            }
        }

        if let Err(err) = then(&outcomes) {
            for (guard, snapshot) in guards.iter_mut().zip(&snapshots) {
                **guard = snapshot.clone();
            }
            return Err(err);
        }

        Ok(outcomes)
    }
}
