//! Catalog persistence
//!
//! The ledger itself is purely in-memory. Loading the initial catalog and
//! snapshotting its current state are done by an implementation of
//! [`CatalogPersistence`], picked at start-up.
mod in_memory;
mod json_file;

pub use self::{in_memory::*, json_file::*};

use crate::auction::Item;
use anyhow::Result;
use std::sync::Arc;

/// Somewhere a catalog can be loaded from and snapshotted into
///
/// Must be thread-safe; snapshots are taken from a service thread.
pub trait CatalogPersistence {
    /// The initial set of items
    fn load(&self) -> Result<Vec<Item>>;

    /// Store the current state of all items, replacing any previous snapshot
    fn snapshot(&self, items: &[Item]) -> Result<()>;
}

pub type SharedCatalogPersistence = Arc<dyn CatalogPersistence + Send + Sync + 'static>;
