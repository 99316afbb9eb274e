//! Resolution of local credentials.
//!
//! Two entry points open a [`CredentialCursor`]:
//!
//! - [`Resolver::resolve_by_local_key`]: exact probe of the local-identity store
//! - [`Resolver::resolve_by_remote_identity`]: generalize the remote identity
//!   step by step, probe the disclosure store with each rendered pattern, and
//!   follow the first hit into the local-identity store
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - A cursor is returned only once a first credential record exists
//! - The disclosure pattern used is the most specific one present
//!
//! ## Acceptable Partial Failure
//! - Disclosed local identities without credentials, past the first, are
//!   skipped while iterating
//!
//! ## Forbidden States
//! - A store cursor left open after the resolution failed
//! - A store error reported as `NotFound`

mod cursor;

pub use cursor::CredentialCursor;

use nai_identity::{Identity, Selector};
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{Lookup, ResolveError, StoreError};
use crate::store::{DupCursor, DupStore};
use cursor::Disclosure;

/// Store names carried for log and error context.
#[derive(Clone, Debug)]
pub(crate) struct StoreNames {
    pub(crate) localid: String,
    pub(crate) disclose: String,
}

/// Log a store failure and wrap it, naming the store unless the backend
/// already attached context.
pub(crate) fn store_failure(db: &str, operation: &'static str, err: StoreError) -> ResolveError {
    warn!(db, operation, error = %err, "credential store failure");
    let err = match err.context {
        Some(_) => err,
        None => err.with_context(db),
    };
    ResolveError::Store(err)
}

/// Credential resolver over a local-identity store and a disclosure store.
///
/// Both handles are expected to be bound to the same transaction context
/// for the lifetime of any cursor opened from them.
pub struct Resolver<'s, L: DupStore + 's, D: DupStore + 's> {
    localid: &'s L,
    disclose: &'s D,
    config: ResolverConfig,
}

impl<'s, L: DupStore + 's, D: DupStore + 's> Resolver<'s, L, D> {
    /// Create a resolver with the default configuration.
    pub fn new(localid: &'s L, disclose: &'s D) -> Self {
        Self::with_config(localid, disclose, ResolverConfig::default())
    }

    /// Create a resolver with an explicit configuration.
    pub fn with_config(localid: &'s L, disclose: &'s D, config: ResolverConfig) -> Self {
        Self {
            localid,
            disclose,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn names(&self) -> StoreNames {
        StoreNames {
            localid: self.config.localid_db.clone(),
            disclose: self.config.disclose_db.clone(),
        }
    }

    fn localid_failure(
        &self,
        operation: &'static str,
    ) -> impl FnOnce(StoreError) -> ResolveError + '_ {
        move |err| store_failure(&self.config.localid_db, operation, err)
    }

    fn disclose_failure(
        &self,
        operation: &'static str,
    ) -> impl FnOnce(StoreError) -> ResolveError + '_ {
        move |err| store_failure(&self.config.disclose_db, operation, err)
    }

    /// Open a cursor over the credentials stored under `key`.
    pub fn resolve_by_local_key(
        &self,
        key: &[u8],
    ) -> Result<CredentialCursor<'s, L, D>, ResolveError> {
        self.open_local(key.to_vec(), None)
    }

    /// Open a cursor over the credentials disclosed to `remote`.
    ///
    /// `remote` is the stable rendering `[user@]domain` of the peer. Patterns
    /// are tried from the identity itself down to the root `.`; the first one
    /// present in the disclosure store is used and no later step is tried.
    pub fn resolve_by_remote_identity(
        &self,
        remote: &[u8],
    ) -> Result<CredentialCursor<'s, L, D>, ResolveError> {
        let identity = Identity::parse(remote);
        let mut selector = Selector::new(&identity)?;

        let disclose: &'s D = self.disclose;
        let mut outer = disclose.cursor().map_err(self.disclose_failure("open"))?;
        let mut key = Vec::with_capacity(selector.rendered_len());

        loop {
            key.clear();
            selector.render_into(&mut key);
            debug!(selector = %key.escape_ascii(), "probing disclosure store");

            let hit = outer
                .seek_exact(&key)
                .map_err(self.disclose_failure("seek_exact"))?;
            if let Some(local_id) = hit {
                debug!(
                    selector = %key.escape_ascii(),
                    local_id = %local_id.escape_ascii(),
                    "disclosure selector matched"
                );
                let disclosure = Disclosure {
                    cursor: outer,
                    pattern_key: key,
                };
                return self.open_local(local_id, Some(disclosure));
            }

            if !selector.advance() {
                debug!(remote = %remote.escape_ascii(), "no disclosure selector matched");
                return Err(ResolveError::NotFound(Lookup::Selector));
            }
        }
    }

    fn open_local(
        &self,
        local_id: Vec<u8>,
        outer: Option<Disclosure<'s, D>>,
    ) -> Result<CredentialCursor<'s, L, D>, ResolveError> {
        let localid: &'s L = self.localid;
        let mut inner = localid.cursor().map_err(self.localid_failure("open"))?;
        let first = inner
            .seek_exact(&local_id)
            .map_err(self.localid_failure("seek_exact"))?;
        let Some(first) = first else {
            debug!(local_id = %local_id.escape_ascii(), "local identity not found");
            return Err(ResolveError::NotFound(Lookup::LocalId));
        };
        Ok(CredentialCursor::new(
            inner,
            outer,
            local_id,
            first,
            self.config.decode_options(),
            self.names(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;
    use crate::testing::MemoryStore;

    fn record() -> Vec<u8> {
        let mut raw = crate::flags::CredentialFlags::NO_PKCS11
            .bits()
            .to_be_bytes()
            .to_vec();
        raw.extend_from_slice(&[0u8; 20]);
        raw
    }

    #[test]
    fn test_most_specific_pattern_wins() {
        let localid = MemoryStore::new();
        let disclose = MemoryStore::new();
        disclose.insert(b".", b"fallback");
        disclose.insert(b".example.com", b"wide");
        disclose.insert(b"mail.example.com", b"narrow");
        for key in [&b"fallback"[..], &b"wide"[..], &b"narrow"[..]] {
            localid.insert(key, record());
        }

        let resolver = Resolver::new(&localid, &disclose);
        let cursor = resolver
            .resolve_by_remote_identity(b"alice@mail.example.com")
            .unwrap();
        assert_eq!(cursor.pattern_key(), Some(&b"mail.example.com"[..]));
        assert_eq!(cursor.local_id(), b"narrow");

        let cursor = resolver.resolve_by_remote_identity(b"bob@example.org").unwrap();
        assert_eq!(cursor.pattern_key(), Some(&b"."[..]));
    }

    #[test]
    fn test_full_identity_probed_first() {
        let localid = MemoryStore::new();
        let disclose = MemoryStore::new();
        disclose.insert(b"alice@example.com", b"alice-cred");
        disclose.insert(b"example.com", b"domain-cred");
        localid.insert(b"alice-cred", record());
        localid.insert(b"domain-cred", record());

        let resolver = Resolver::new(&localid, &disclose);
        let cursor = resolver.resolve_by_remote_identity(b"alice@example.com").unwrap();
        assert_eq!(cursor.local_id(), b"alice-cred");

        let cursor = resolver.resolve_by_remote_identity(b"carol@example.com").unwrap();
        assert_eq!(cursor.local_id(), b"domain-cred");
    }

    #[test]
    fn test_malformed_identity_opens_nothing() {
        let localid = MemoryStore::new();
        let disclose = MemoryStore::new();
        let resolver = Resolver::new(&localid, &disclose);

        for remote in [&b"@example.com"[..], &b"alice@"[..], &b""[..]] {
            assert!(matches!(
                resolver.resolve_by_remote_identity(remote),
                Err(ResolveError::MalformedIdentity(_))
            ));
        }
        assert_eq!(disclose.opened_cursors(), 0);
    }

    #[test]
    fn test_store_failure_keeps_backend_context() {
        let localid = MemoryStore::new();
        let disclose = MemoryStore::new();
        disclose.fail_open(StoreErrorKind::ConnectionFailed);

        let resolver = Resolver::new(&localid, &disclose);
        let result = resolver.resolve_by_remote_identity(b"example.com");
        match result {
            Err(ResolveError::Store(err)) => {
                assert_eq!(err.kind, StoreErrorKind::ConnectionFailed);
                assert_eq!(err.context.as_deref(), Some("open cursor"));
            }
            Err(other) => panic!("expected store error, got {other:?}"),
            Ok(_) => panic!("expected store error"),
        }
        assert_eq!(localid.opened_cursors() + disclose.opened_cursors(), 0);
    }

    #[test]
    fn test_store_failure_names_store() {
        let localid = MemoryStore::new();
        let disclose = MemoryStore::new();
        disclose.fail_seek(b".com", StoreErrorKind::timeout("seek"));

        let config = ResolverConfig {
            disclose_db: String::from("peers.db"),
            ..ResolverConfig::default()
        };
        let resolver = Resolver::with_config(&localid, &disclose, config);
        assert_eq!(resolver.config().disclose_db, "peers.db");
        let result = resolver.resolve_by_remote_identity(b"mail.example.com");
        match result {
            Err(ResolveError::Store(err)) => {
                assert_eq!(err.context.as_deref(), Some("peers.db"));
            }
            Err(other) => panic!("expected store error, got {other:?}"),
            Ok(_) => panic!("expected store error"),
        }
        assert_eq!(disclose.live_cursors(), 0);
    }
}
