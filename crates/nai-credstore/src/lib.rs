//! NAI Credential Store Layer
//!
//! Finds the local credentials a TLS proxy should present to a peer:
//!
//! - **Record**: wire codec of stored credential records
//! - **Flags**: credential flags word and flag-level filtering
//! - **Store**: duplicate-key store traits implemented by the database layer
//! - **Resolve**: lookup by local key or by remote identity, merged into one
//!   credential cursor
//! - **Config**: store names and record validation settings
//!
//! # Design Principles
//!
//! 1. **Most specific wins**: the first disclosure pattern found ends the search
//! 2. **Empty is not broken**: `NotFound` stays distinct from corrupt data and
//!    from store failures
//! 3. **Scoped handles**: store cursors are released when the credential
//!    cursor is dropped, whatever the exit path
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                           nai-credstore                               │
//! │                                                                       │
//! │  remote id ──▶ Selector steps ──▶ disclosure store (pattern -> local) │
//! │                                          │ first hit                  │
//! │                                          ▼                            │
//! │  local key ─────────────────────▶ local-identity store (local -> rec) │
//! │                                          │                            │
//! │                                          ▼                            │
//! │                         CredentialCursor (merges duplicates)          │
//! │                                          │                            │
//! │                                          ▼                            │
//! │                          Credential { flags, locator, public data }   │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod flags;
pub mod record;
pub mod resolve;
pub mod store;
pub mod testing;

pub use config::ResolverConfig;
pub use error::{ConfigError, Lookup, RecordError, ResolveError, StoreError, StoreErrorKind};
pub use flags::{CredentialFilter, CredentialFlags, CredentialKind, Role};
pub use record::{
    decode, decode_flags, Credential, CredentialRecord, DecodeOptions, MIN_PUBLIC_DATA_LEN,
};
pub use resolve::{CredentialCursor, Resolver};
pub use store::{DupCursor, DupStore};
pub use testing::MemoryStore;
