//! Bid Ledger
//!
//! The authoritative record of each item's current bid and who holds it.
//! All bid placement goes through here; the store only hands out the
//! per-item locks.
use crate::auction::{self, Amount, BidError, Identity, Item, ItemId, ItemStatus, Timestamp};
use crate::store::SharedItemStore;
use std::sync::Arc;
use tracing::{debug, info};

pub type SharedBidLedger = Arc<BidLedger>;

pub struct BidLedger {
    store: SharedItemStore,
}

impl BidLedger {
    pub fn new(store: SharedItemStore) -> Self {
        Self { store }
    }

    pub fn new_shared(store: SharedItemStore) -> SharedBidLedger {
        Arc::new(Self::new(store))
    }

    /// Place a bid of `amount` by `bidder` on `item_id`
    ///
    /// Validation and the update happen under the item's lock, so of two
    /// racing bids the second one is checked against the first one's
    /// amount. On rejection the item is left as it was.
    pub fn place_bid(
        &self,
        item_id: ItemId,
        bidder: &Identity,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, BidError> {
        let entry = self.store.entry(item_id)?;
        let mut item = entry.lock();

        if let Err(e) = auction::validate(&item, amount, now) {
            debug!(?item_id, %bidder, %amount, error = %e, "bid rejected");
            return Err(e);
        }

        item.current_bid = amount;
        item.highest_bidder = Some(bidder.clone());
        info!(?item_id, %bidder, %amount, "bid accepted");

        Ok(item.current_bid)
    }

    /// Items `identity` currently holds the highest bid on, open or closed
    pub fn bids_by(&self, identity: &Identity) -> Vec<Item> {
        self.store
            .list()
            .into_iter()
            .filter(|item| item.highest_bidder.as_ref() == Some(identity))
            .collect()
    }

    pub fn status(&self, item_id: ItemId, now: Timestamp) -> Result<ItemStatus, BidError> {
        Ok(self.store.get(item_id)?.status(now))
    }

    /// Who won `item_id`; `None` while still open or if nobody bid
    pub fn winner(&self, item_id: ItemId, now: Timestamp) -> Result<Option<Identity>, BidError> {
        let item = self.store.get(item_id)?;
        Ok(match item.status(now) {
            ItemStatus::Open => None,
            ItemStatus::Closed => item.highest_bidder,
        })
    }

    pub fn get(&self, item_id: ItemId) -> Result<Item, BidError> {
        self.store.get(item_id)
    }

    pub fn list(&self) -> Vec<Item> {
        self.store.list()
    }
}
