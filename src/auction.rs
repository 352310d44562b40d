//! Auction items and bid validation
//!
//! Everything in here is pure: the current time is always passed in,
//! never read from the system clock.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub type ItemId = u64;
pub type Amount = Decimal;
pub type Timestamp = DateTime<Utc>;

/// Display name of whoever is bidding
///
/// Not a credential, just a name the caller picked.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Trims `name`, refusing empty names
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_owned()))
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidError {
    #[error("unknown item: {0}")]
    ItemNotFound(ItemId),
    #[error("auction already closed")]
    AuctionClosed,
    #[error("bid is too low, must be at least {minimum}")]
    BidTooLow { minimum: Amount },
    #[error("bid is too high, must be at most {maximum}")]
    BidTooHigh { maximum: Amount },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Open,
    Closed,
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(ItemStatus::Open),
            "closed" => Ok(ItemStatus::Closed),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Number of lots sold under this listing
    #[serde(default = "default_lot_count")]
    pub lot_count: u32,
    pub opening_bid: Amount,
    pub current_bid: Amount,
    pub min_increment: Amount,
    pub end_time: Timestamp,
    #[serde(default)]
    pub highest_bidder: Option<Identity>,
}

fn default_lot_count() -> u32 {
    1
}

impl Item {
    /// A fresh item with no bids yet
    pub fn new(
        id: ItemId,
        name: impl Into<String>,
        opening_bid: Amount,
        min_increment: Amount,
        end_time: Timestamp,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            category: String::new(),
            location: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            lot_count: default_lot_count(),
            opening_bid,
            current_bid: opening_bid,
            min_increment,
            end_time,
            highest_bidder: None,
        }
    }

    pub fn status(&self, now: Timestamp) -> ItemStatus {
        status(self, now)
    }

    /// Lowest amount the next bid can be, `None` if it is not representable
    pub fn next_valid_bid(&self) -> Option<Amount> {
        increased(self.current_bid, self.min_increment)
    }

    /// Highest bid that still leaves room for one more increment
    pub fn max_valid_bid(&self) -> Amount {
        Amount::MAX
            .checked_sub(self.min_increment)
            .unwrap_or(Amount::ZERO)
    }

    fn is_outbidded_by(&self, amount: Amount) -> bool {
        self.next_valid_bid()
            .map_or(false, |minimum| minimum <= amount)
    }
}

/// `amount + increment`, unless that overflows or rounds back down to `amount`
fn increased(amount: Amount, increment: Amount) -> Option<Amount> {
    amount
        .checked_add(increment)
        .filter(|next| *next > amount)
}

/// Open until the clock reaches `end_time`, closed from then on
pub fn status(item: &Item, now: Timestamp) -> ItemStatus {
    if now >= item.end_time {
        ItemStatus::Closed
    } else {
        ItemStatus::Open
    }
}

/// Check `amount` against the current state of `item`
pub fn validate(item: &Item, amount: Amount, now: Timestamp) -> Result<(), BidError> {
    if status(item, now) == ItemStatus::Closed {
        return Err(BidError::AuctionClosed);
    }
    if !item.is_outbidded_by(amount) {
        return Err(BidError::BidTooLow {
            minimum: item.next_valid_bid().unwrap_or(Amount::MAX),
        });
    }
    // every accepted bid must itself be outbiddable
    if increased(amount, item.min_increment).is_none() {
        return Err(BidError::BidTooHigh {
            maximum: item.max_valid_bid(),
        });
    }
    Ok(())
}
