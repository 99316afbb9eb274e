//! Network Access Identifier Layer
//!
//! Peers present identities as NAIs, either `user@domain` or a bare
//! `domain`. This crate provides the pieces needed to find the disclosure
//! policy that applies to such a peer:
//!
//! - **Identity**: borrowed `user@domain` views, parsing and rendering
//! - **Selector**: stepwise generalization from most to least specific
//! - **Matching**: does a (possibly generalized) pattern apply to an identity
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - A selector is built only from an identity whose domain is non-empty
//!   and whose user, if present, is non-empty
//! - Every step of a selector renders no longer than the step before it
//!
//! ## Acceptable Partial Failure
//! - Parsing accepts any byte string; well-formedness is checked by the
//!   consumer that needs it
//!
//! ## Forbidden States
//! - A selector outliving the buffer its identity was parsed from
//! - A generalization that does not end at the root domain `.`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      nai-identity                             │
//! │                                                               │
//! │   remote id bytes ──▶ Identity::parse ──▶ Selector::new       │
//! │                                              │                │
//! │                              render() per step (lookup key)   │
//! │                                              │                │
//! │                              advance() until root `.`         │
//! │                                                               │
//! │   matches(identity, pattern)  (policy checks, no storage)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod identity;
pub mod matching;
pub mod selector;

pub use error::IdentityError;
pub use identity::{Identity, Pattern};
pub use matching::matches;
pub use selector::{Selector, Steps, ROOT_DOMAIN};
