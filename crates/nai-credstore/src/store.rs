//! Storage collaborator interface.
//!
//! The credential layer needs very little from the underlying database: an
//! ordered multimap where one key may own several values in a stable
//! duplicate order, probed by exact key and walked duplicate by duplicate.
//! Transactions, page caches and locking stay with the backend.
//!
//! A [`DupStore`] is a handle already bound to the caller's transaction
//! context; this layer neither opens nor commits transactions. Cursors
//! release their backend handle when dropped, so every exit path of a
//! resolution (success, not found, error, early abandon) releases them.
//!
//! Errors returned here reach the resolver's caller with their kind intact.
//! A [`StoreError`] without context gets the store's configured name
//! attached on the way out.

use crate::error::StoreError;

/// A cursor over one store, positioned on at most one key at a time.
pub trait DupCursor {
    /// Position on the first value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent; the cursor is then
    /// unpositioned and [`next_dup`](Self::next_dup) yields nothing.
    fn seek_exact(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Advance to the next duplicate value of the current key.
    ///
    /// Returns `Ok(None)` once the duplicates of the current key are used up.
    fn next_dup(&mut self) -> Result<Option<Vec<u8>>, StoreError>;
}

/// An ordered multimap store within a caller-supplied transaction context.
pub trait DupStore {
    /// Cursor type, borrowing the store handle.
    type Cursor<'a>: DupCursor
    where
        Self: 'a;

    /// Open a cursor on this store.
    fn cursor(&self) -> Result<Self::Cursor<'_>, StoreError>;
}
