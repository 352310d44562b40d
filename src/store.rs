//! Item Store
//!
//! Owns every item of the catalog. Each item sits behind its own lock so
//! bids on different items never contend; the index itself is only written
//! while the catalog is being loaded.
use crate::auction::{BidError, Item, ItemId};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub type ItemEntry = Arc<Mutex<Item>>;
pub type SharedItemStore = Arc<ItemStore>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate item id: {0}")]
    DuplicateId(ItemId),
    #[error("item {0}: minimum increment must be positive")]
    NonPositiveIncrement(ItemId),
    #[error("item {0}: current bid is below the opening bid")]
    BidBelowOpening(ItemId),
    #[error("item {0}: highest bidder does not match the bid history")]
    InconsistentBidder(ItemId),
    #[error("item {0}: current bid leaves no room for another increment")]
    BidOutOfRange(ItemId),
}

#[derive(Default)]
struct Inner {
    // insertion order
    entries: Vec<ItemEntry>,
    index: BTreeMap<ItemId, usize>,
}

#[derive(Default)]
pub struct ItemStore {
    inner: RwLock<Inner>,
}

impl ItemStore {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Result<Self, CatalogError> {
        let store = Self::default();
        for item in items {
            store.insert(item)?;
        }
        Ok(store)
    }

    pub fn new_shared(items: impl IntoIterator<Item = Item>) -> Result<SharedItemStore, CatalogError> {
        Ok(Arc::new(Self::new(items)?))
    }

    pub fn insert(&self, item: Item) -> Result<(), CatalogError> {
        check_item(&item)?;

        let mut inner = self.inner.write();
        if inner.index.contains_key(&item.id) {
            return Err(CatalogError::DuplicateId(item.id));
        }
        let pos = inner.entries.len();
        inner.index.insert(item.id, pos);
        inner.entries.push(Arc::new(Mutex::new(item)));
        Ok(())
    }

    pub fn get(&self, id: ItemId) -> Result<Item, BidError> {
        Ok(self.entry(id)?.lock().clone())
    }

    pub fn list(&self) -> Vec<Item> {
        self.entries().iter().map(|e| e.lock().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Lockable handle to a single item
    ///
    /// Only the ledger mutates through this.
    pub(crate) fn entry(&self, id: ItemId) -> Result<ItemEntry, BidError> {
        let inner = self.inner.read();
        inner
            .index
            .get(&id)
            .map(|&pos| inner.entries[pos].clone())
            .ok_or(BidError::ItemNotFound(id))
    }

    /// Handles to all items, so per-item locks are taken after the index lock is released
    fn entries(&self) -> Vec<ItemEntry> {
        self.inner.read().entries.clone()
    }
}

fn check_item(item: &Item) -> Result<(), CatalogError> {
    if item.min_increment <= rust_decimal::Decimal::ZERO {
        return Err(CatalogError::NonPositiveIncrement(item.id));
    }
    if item.current_bid < item.opening_bid {
        return Err(CatalogError::BidBelowOpening(item.id));
    }
    if item.highest_bidder.is_some() != (item.current_bid > item.opening_bid) {
        return Err(CatalogError::InconsistentBidder(item.id));
    }
    if item.next_valid_bid().is_none() {
        return Err(CatalogError::BidOutOfRange(item.id));
    }
    Ok(())
}
