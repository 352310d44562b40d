//! Sample catalog and catalog filtering
use crate::auction::{Amount, Item, ItemStatus, Timestamp};
use chrono::Duration;
use serde::{de, Deserialize, Deserializer};
use std::{fmt, str::FromStr};

struct Seed {
    category: &'static str,
    location: &'static str,
    latitude: f64,
    longitude: f64,
    lot_count: u32,
    opening_bid: i64,
    min_increment: i64,
    // relative to catalog load time
    ends_in_days: i64,
}

#[rustfmt::skip]
const SEEDS: &[Seed] = &[
    Seed { category: "Estate", location: "New York", latitude: 40.7128, longitude: -74.0060, lot_count: 45, opening_bid: 15000, min_increment: 500, ends_in_days: 1 },
    Seed { category: "Vehicle", location: "Los Angeles", latitude: 34.0522, longitude: -118.2437, lot_count: 1, opening_bid: 25000, min_increment: 500, ends_in_days: 2 },
    Seed { category: "Art", location: "Chicago", latitude: 41.8781, longitude: -87.6298, lot_count: 25, opening_bid: 5000, min_increment: 100, ends_in_days: 3 },
    Seed { category: "Estate", location: "Houston", latitude: 29.7604, longitude: -95.3698, lot_count: 120, opening_bid: 35000, min_increment: 1000, ends_in_days: -4 },
    Seed { category: "Industrial", location: "Philadelphia", latitude: 39.9526, longitude: -75.1652, lot_count: 75, opening_bid: 50000, min_increment: 1000, ends_in_days: 5 },
    Seed { category: "Jewelry", location: "Boston", latitude: 42.3601, longitude: -71.0589, lot_count: 10, opening_bid: 8000, min_increment: 250, ends_in_days: 6 },
    Seed { category: "Vehicle", location: "Atlanta", latitude: 33.7490, longitude: -84.3880, lot_count: 1, opening_bid: 30000, min_increment: 500, ends_in_days: 7 },
    Seed { category: "Estate", location: "Nashville", latitude: 36.1627, longitude: -86.7816, lot_count: 85, opening_bid: 45000, min_increment: 1000, ends_in_days: 8 },
    Seed { category: "Art", location: "San Francisco", latitude: 37.7749, longitude: -122.4194, lot_count: 15, opening_bid: 12000, min_increment: 250, ends_in_days: 9 },
    Seed { category: "Industrial", location: "Washington DC", latitude: 38.9072, longitude: -77.0369, lot_count: 50, opening_bid: 28000, min_increment: 500, ends_in_days: -10 },
];

/// The built-in demo catalog, with end times relative to `now`
pub fn sample_items(now: Timestamp) -> Vec<Item> {
    SEEDS
        .iter()
        .zip(1..)
        .map(|(seed, id)| {
            let mut item = Item::new(
                id,
                format!("Auction {id}"),
                Amount::from(seed.opening_bid),
                Amount::from(seed.min_increment),
                now + Duration::days(seed.ends_in_days),
            );
            item.description = format!(
                "{} auction in {}, {} lot(s)",
                seed.category, seed.location, seed.lot_count
            );
            item.category = seed.category.to_owned();
            item.location = seed.location.to_owned();
            item.latitude = seed.latitude;
            item.longitude = seed.longitude;
            item.lot_count = seed.lot_count;
            item
        })
        .collect()
}

/// What a catalog listing is narrowed down by
///
/// Empty fields match everything. In a query string, `status` and
/// `category` take comma-separated lists (`?status=open,closed`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CatalogFilter {
    #[serde(default, deserialize_with = "comma_separated")]
    pub status: Vec<ItemStatus>,
    #[serde(default, deserialize_with = "comma_separated")]
    pub category: Vec<String>,
    /// Case-insensitive search over name and location
    pub q: Option<String>,
}

impl CatalogFilter {
    pub fn matches(&self, item: &Item, now: Timestamp) -> bool {
        if !self.status.is_empty() && !self.status.contains(&item.status(now)) {
            return false;
        }
        if !self.category.is_empty()
            && !self
                .category
                .iter()
                .any(|c| item.category.eq_ignore_ascii_case(c))
        {
            return false;
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let q = q.to_lowercase();
            if !item.name.to_lowercase().contains(&q) && !item.location.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, items: Vec<Item>, now: Timestamp) -> Vec<Item> {
        items
            .into_iter()
            .filter(|item| self.matches(item, now))
            .collect()
    }
}

fn comma_separated<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    String::deserialize(deserializer)?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(de::Error::custom))
        .collect()
}
