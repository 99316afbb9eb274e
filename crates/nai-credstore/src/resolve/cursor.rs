//! Credential cursor: merges disclosure duplicates with local-identity
//! duplicates into one stream of credentials.
//!
//! ```text
//!              ┌──────────────┐ first record handed out
//!   open ───▶  │ Pending(raw) │ ─────────────────────────┐
//!              └──────────────┘                          ▼
//!                                              ┌────────────────┐ next_dup hit
//!                                              │ IteratingInner │ ◀───────┐
//!                                              └────────────────┘ ────────┘
//!                        re-seek hit                    │ inner used up
//!              ┌─────────────────────────────┐          ▼
//!              │                             │ ┌────────────────┐ dangling key
//!              └──── IteratingInner ◀─────── └─│  ProbingOuter  │ ◀──────┐
//!                                              └────────────────┘ ───────┘
//!                                                       │ outer used up,
//!                                                       ▼ no outer, or error
//!                                              ┌────────────────┐
//!                                              │   Exhausted    │
//!                                              └────────────────┘
//! ```
//!
//! Each transition takes the state out and puts the successor back, so an
//! error returned mid-transition leaves the cursor `Exhausted`.

use core::iter::FusedIterator;
use core::mem;

use tracing::{debug, trace};

use super::{store_failure, StoreNames};
use crate::error::ResolveError;
use crate::flags::CredentialFilter;
use crate::record::{decode_flags, Credential, CredentialRecord, DecodeOptions};
use crate::store::{DupCursor, DupStore};

/// Position of the merge between the two stores.
#[derive(Debug, PartialEq, Eq)]
enum CursorState {
    /// The first record of the current local identity, fetched by the probe
    /// that opened or refilled the cursor
    Pending(Vec<u8>),
    /// Walking the duplicates of the current local identity
    IteratingInner,
    /// Taking the next local-identity key from the disclosure duplicates
    ProbingOuter,
    /// Nothing further will be yielded
    Exhausted,
}

/// The disclosure side of a remote-identity resolution.
pub(super) struct Disclosure<'s, D: DupStore + 's> {
    /// Cursor positioned on the matched pattern key
    pub(super) cursor: D::Cursor<'s>,
    /// The pattern key that matched
    pub(super) pattern_key: Vec<u8>,
}

/// Cursor over the credentials found by a [`Resolver`](super::Resolver).
///
/// Holds open cursors on both stores; dropping it releases them.
pub struct CredentialCursor<'s, L: DupStore + 's, D: DupStore + 's> {
    inner: L::Cursor<'s>,
    outer: Option<Disclosure<'s, D>>,
    local_id: Vec<u8>,
    state: CursorState,
    options: DecodeOptions,
    names: StoreNames,
}

impl<'s, L: DupStore + 's, D: DupStore + 's> CredentialCursor<'s, L, D> {
    pub(super) fn new(
        inner: L::Cursor<'s>,
        outer: Option<Disclosure<'s, D>>,
        local_id: Vec<u8>,
        first: Vec<u8>,
        options: DecodeOptions,
        names: StoreNames,
    ) -> Self {
        Self {
            inner,
            outer,
            local_id,
            state: CursorState::Pending(first),
            options,
            names,
        }
    }

    /// The local-identity key of the most recently fetched record.
    pub fn local_id(&self) -> &[u8] {
        &self.local_id
    }

    /// The disclosure pattern key that matched, for remote-identity
    /// resolutions.
    pub fn pattern_key(&self) -> Option<&[u8]> {
        self.outer.as_ref().map(|outer| outer.pattern_key.as_slice())
    }

    /// Whether the cursor will yield nothing further.
    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Decode and return the next credential.
    ///
    /// Returns `Ok(None)` once exhausted. Any error also exhausts the cursor.
    pub fn next_credential(&mut self) -> Result<Option<Credential>, ResolveError> {
        let Some(raw) = self.next_raw()? else {
            return Ok(None);
        };
        self.decode(&raw).map(Some)
    }

    /// Return the next credential accepted by `filter`.
    ///
    /// Only the flags word of rejected records is read, so a rejected record
    /// with a malformed body is skipped rather than reported.
    pub fn next_matching(
        &mut self,
        filter: &CredentialFilter,
    ) -> Result<Option<Credential>, ResolveError> {
        while let Some(raw) = self.next_raw()? {
            let flags = match decode_flags(&raw) {
                Ok(flags) => flags,
                Err(err) => {
                    self.state = CursorState::Exhausted;
                    return Err(err.into());
                }
            };
            if filter.accepts(flags) {
                return self.decode(&raw).map(Some);
            }
            debug!(
                local_id = %self.local_id.escape_ascii(),
                flags = flags.bits(),
                "credential skipped by filter"
            );
        }
        Ok(None)
    }

    fn decode(&mut self, raw: &[u8]) -> Result<Credential, ResolveError> {
        match CredentialRecord::decode_with(raw, &self.options) {
            Ok(record) => Ok(record.to_credential(&self.local_id)),
            Err(err) => {
                debug!(
                    local_id = %self.local_id.escape_ascii(),
                    error = %err,
                    "malformed credential record"
                );
                self.state = CursorState::Exhausted;
                Err(err.into())
            }
        }
    }

    /// Fetch the next raw record, advancing through both stores as needed.
    fn next_raw(&mut self) -> Result<Option<Vec<u8>>, ResolveError> {
        loop {
            match mem::replace(&mut self.state, CursorState::Exhausted) {
                CursorState::Pending(raw) => {
                    self.state = CursorState::IteratingInner;
                    return Ok(Some(raw));
                }
                CursorState::IteratingInner => {
                    let next = self
                        .inner
                        .next_dup()
                        .map_err(|err| store_failure(&self.names.localid, "next_dup", err))?;
                    match next {
                        Some(raw) => {
                            trace!(local_id = %self.local_id.escape_ascii(), "next local duplicate");
                            self.state = CursorState::IteratingInner;
                            return Ok(Some(raw));
                        }
                        None if self.outer.is_some() => self.state = CursorState::ProbingOuter,
                        None => {}
                    }
                }
                CursorState::ProbingOuter => {
                    let Some(outer) = self.outer.as_mut() else {
                        continue;
                    };
                    let next_key = outer
                        .cursor
                        .next_dup()
                        .map_err(|err| store_failure(&self.names.disclose, "next_dup", err))?;
                    let Some(next_key) = next_key else {
                        continue;
                    };
                    trace!(
                        selector = %outer.pattern_key.escape_ascii(),
                        local_id = %next_key.escape_ascii(),
                        "next disclosure duplicate"
                    );
                    let first = self
                        .inner
                        .seek_exact(&next_key)
                        .map_err(|err| store_failure(&self.names.localid, "seek_exact", err))?;
                    match first {
                        Some(raw) => {
                            self.local_id = next_key;
                            self.state = CursorState::IteratingInner;
                            return Ok(Some(raw));
                        }
                        None => {
                            debug!(
                                local_id = %next_key.escape_ascii(),
                                "disclosed local identity has no credentials"
                            );
                            self.state = CursorState::ProbingOuter;
                        }
                    }
                }
                CursorState::Exhausted => return Ok(None),
            }
        }
    }
}

impl<'s, L: DupStore + 's, D: DupStore + 's> Iterator for CredentialCursor<'s, L, D> {
    type Item = Result<Credential, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_credential().transpose()
    }
}

impl<'s, L: DupStore + 's, D: DupStore + 's> FusedIterator for CredentialCursor<'s, L, D> {}

impl<'s, L: DupStore + 's, D: DupStore + 's> core::fmt::Debug for CredentialCursor<'s, L, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialCursor")
            .field("local_id", &self.local_id.escape_ascii().to_string())
            .field("pattern_key", &self.pattern_key().map(|k| k.escape_ascii().to_string()))
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
