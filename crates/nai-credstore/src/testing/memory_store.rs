//! In-memory duplicate-key store for testing.
//!
//! Provides a BTreeMap-based store that doesn't persist data. Values under
//! one key are kept in insertion order, which is their duplicate order.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{RecordError, StoreError, StoreErrorKind};
use crate::record::CredentialRecord;
use crate::store::{DupCursor, DupStore};

/// Injected failures, keyed by the store key they fire on.
#[derive(Default)]
struct Faults {
    open: Option<StoreErrorKind>,
    seek: BTreeMap<Vec<u8>, StoreErrorKind>,
    next_dup: BTreeMap<Vec<u8>, StoreErrorKind>,
}

/// In-memory multimap store for testing.
#[derive(Default)]
pub struct MemoryStore {
    /// Key -> duplicate values in insertion order
    entries: RefCell<BTreeMap<Vec<u8>, Vec<Vec<u8>>>>,
    /// Failures to report instead of data
    faults: RefCell<Faults>,
    /// Cursors currently open
    live: Cell<usize>,
    /// Cursors opened over the store's lifetime
    opened: Cell<usize>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` as the last duplicate under `key`.
    pub fn insert(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.entries
            .borrow_mut()
            .entry(key.as_ref().to_vec())
            .or_default()
            .push(value.as_ref().to_vec());
    }

    /// Encode `record` and append it under `local_id`.
    pub fn insert_credential(
        &self,
        local_id: impl AsRef<[u8]>,
        record: &CredentialRecord<'_>,
    ) -> Result<(), RecordError> {
        let raw = record.encode()?;
        self.insert(local_id, raw);
        Ok(())
    }

    /// Number of values stored under `key`.
    pub fn dup_count(&self, key: &[u8]) -> usize {
        self.entries.borrow().get(key).map_or(0, Vec::len)
    }

    /// Make every subsequent [`DupStore::cursor`] call fail.
    pub fn fail_open(&self, kind: StoreErrorKind) {
        self.faults.borrow_mut().open = Some(kind);
    }

    /// Make seeking `key` fail.
    pub fn fail_seek(&self, key: impl AsRef<[u8]>, kind: StoreErrorKind) {
        self.faults
            .borrow_mut()
            .seek
            .insert(key.as_ref().to_vec(), kind);
    }

    /// Make advancing through the duplicates of `key` fail.
    pub fn fail_next_dup(&self, key: impl AsRef<[u8]>, kind: StoreErrorKind) {
        self.faults
            .borrow_mut()
            .next_dup
            .insert(key.as_ref().to_vec(), kind);
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        *self.faults.borrow_mut() = Faults::default();
    }

    /// Cursors opened and not yet dropped.
    pub fn live_cursors(&self) -> usize {
        self.live.get()
    }

    /// Cursors opened in total.
    pub fn opened_cursors(&self) -> usize {
        self.opened.get()
    }

    fn value_at(&self, key: &[u8], index: usize) -> Option<Vec<u8>> {
        self.entries
            .borrow()
            .get(key)
            .and_then(|values| values.get(index))
            .cloned()
    }
}

impl DupStore for MemoryStore {
    type Cursor<'a> = MemoryCursor<'a>;

    fn cursor(&self) -> Result<MemoryCursor<'_>, StoreError> {
        if let Some(kind) = self.faults.borrow().open.clone() {
            return Err(StoreError::new(kind).with_context("open cursor"));
        }
        self.live.set(self.live.get() + 1);
        self.opened.set(self.opened.get() + 1);
        Ok(MemoryCursor {
            store: self,
            position: None,
        })
    }
}

/// Cursor over a [`MemoryStore`]; releases its slot when dropped.
pub struct MemoryCursor<'a> {
    store: &'a MemoryStore,
    /// Current key and duplicate index
    position: Option<(Vec<u8>, usize)>,
}

impl DupCursor for MemoryCursor<'_> {
    fn seek_exact(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(kind) = self.store.faults.borrow().seek.get(key).cloned() {
            self.position = None;
            return Err(StoreError::new(kind));
        }
        let value = self.store.value_at(key, 0);
        self.position = value.as_ref().map(|_| (key.to_vec(), 0));
        Ok(value)
    }

    fn next_dup(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        let Some((key, index)) = self.position.as_mut() else {
            return Ok(None);
        };
        if let Some(kind) = self.store.faults.borrow().next_dup.get(key.as_slice()).cloned() {
            return Err(StoreError::new(kind));
        }
        let value = self.store.value_at(key, *index + 1);
        if value.is_some() {
            *index += 1;
        }
        Ok(value)
    }
}

impl Drop for MemoryCursor<'_> {
    fn drop(&mut self) {
        self.store.live.set(self.store.live.get().saturating_sub(1));
    }
}
