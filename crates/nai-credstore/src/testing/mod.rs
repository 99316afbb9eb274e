//! Testing utilities for the credential store layer.
//!
//! Provides an in-memory duplicate-key store with fault injection and cursor
//! accounting, for exercising the resolver without a database.

mod memory_store;

pub use memory_store::{MemoryCursor, MemoryStore};
