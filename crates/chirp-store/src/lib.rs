#![forbid(unsafe_code)]
//! Persistence for the chirp social backend.
//!
//! `SocialStore` is the injected contract the server talks to; nothing
//! resolves a global handle. Two backends: `MemoryStore` for tests and
//! ephemeral runs, `RedbStore` for durable single-node deployments.

mod backend;
mod memory;
mod redb_backend;

pub use backend::{SocialStore, StoreError, StoreErrorCode};
pub use memory::MemoryStore;
pub use redb_backend::RedbStore;

pub const CRATE_NAME: &str = "chirp-store";
