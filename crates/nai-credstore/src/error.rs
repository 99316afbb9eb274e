//! Error types for the credential store layer.
//!
//! The taxonomy keeps four outcomes apart so that a caller can tell "no
//! policy exists for this peer" from "configuration or data is corrupt" and
//! from "the storage layer is unhealthy":
//!
//! - [`ResolveError::MalformedIdentity`]: the remote identity is not well-formed
//! - [`ResolveError::MalformedRecord`]: a stored credential violates the wire layout
//! - [`ResolveError::NotFound`]: a normal, expected empty lookup
//! - [`ResolveError::Store`]: the store failed; never retried here

use nai_identity::IdentityError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Specific kinds of store failures.
///
/// A missing key is not a failure and has no kind here: stores report it as
/// `Ok(None)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum StoreErrorKind {
    /// Connection to the storage backend failed
    #[error("connection to store failed")]
    ConnectionFailed,

    /// Store operation timed out
    #[error("store operation timed out during {operation}")]
    Timeout {
        /// What operation was being attempted
        operation: String,
    },

    /// Stored data failed an integrity check
    #[error("store data is corrupt")]
    Corrupt,

    /// The transaction context was chosen as a deadlock victim
    #[error("store deadlock detected")]
    Deadlock,

    /// Storage backend unavailable
    #[error("store unavailable")]
    Unavailable,

    /// Unknown error (fallback for backend messages)
    #[error("{0}")]
    Unknown(String),
}

impl StoreErrorKind {
    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create an unknown error from a backend message.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}

/// A failure reported by the storage collaborator.
///
/// The resolver hands these to its caller with `kind` unchanged. When the
/// backend left `context` empty, the resolver fills it with the configured
/// store name ([`ResolverConfig::localid_db`] or
/// [`ResolverConfig::disclose_db`]); backend context is never replaced.
///
/// [`ResolverConfig::localid_db`]: crate::ResolverConfig::localid_db
/// [`ResolverConfig::disclose_db`]: crate::ResolverConfig::disclose_db
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct StoreError {
    /// The specific error kind
    pub kind: StoreErrorKind,
    /// Optional additional context
    pub context: Option<String>,
}

impl StoreError {
    /// Create a store error without context.
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Attach context, replacing any already present.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl From<StoreErrorKind> for StoreError {
    fn from(kind: StoreErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Violations of the credential record wire layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum RecordError {
    /// The record does not extend past its 4-byte flags word
    #[error("credential record of {len} bytes has nothing past its flags")]
    TooShort {
        /// Length of the record
        len: usize,
    },

    /// No NUL terminates the key locator within the record
    #[error("key locator is not NUL-terminated")]
    UnterminatedKeyLocator,

    /// The public credential is below the sanity floor
    #[error("public data of {len} bytes is below the {min} byte floor")]
    PublicDataTooShort {
        /// Length of the public data
        len: usize,
        /// Floor that was applied
        min: usize,
    },

    /// The key locator does not use the `pkcs11:` URI scheme
    #[error("key locator is not a pkcs11: URI")]
    NotPkcs11Uri,

    /// A key locator to encode contains a NUL byte
    #[error("key locator contains an embedded NUL")]
    EmbeddedNul,

    /// No key locator was given although NO_PKCS11 is clear
    #[error("key locator required unless NO_PKCS11 is set")]
    MissingKeyLocator,

    /// A key locator was given although NO_PKCS11 is set
    #[error("key locator given while NO_PKCS11 is set")]
    UnexpectedKeyLocator,
}

/// Which probe came up empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    /// Exact-key probe of the local-identity store
    LocalId,
    /// Every generalization step of the remote identity in the disclosure store
    Selector,
}

impl core::fmt::Display for Lookup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Lookup::LocalId => write!(f, "local identity"),
            Lookup::Selector => write!(f, "disclosure selector"),
        }
    }
}

/// Errors from credential resolution.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The remote identity is not well-formed
    #[error("malformed identity: {0}")]
    MalformedIdentity(#[from] IdentityError),

    /// A stored credential record is malformed
    #[error("malformed credential record: {0}")]
    MalformedRecord(#[from] RecordError),

    /// Nothing applicable was found
    #[error("no matching {0} found")]
    NotFound(Lookup),

    /// The store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Check if this is an expected empty lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }

    /// Check if this points at corrupt configuration or data.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            ResolveError::MalformedIdentity(_) | ResolveError::MalformedRecord(_)
        )
    }
}

/// Errors loading a resolver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for the expected shape
    #[error("invalid resolver configuration: {0}")]
    Json(#[from] serde_json::Error),
}
