use crate::{
    auction::Timestamp,
    catalog,
    persistence::{InMemoryPersistence, JsonFilePersistence, SharedCatalogPersistence},
};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// In-memory auction bid ledger with an HTTP front-end
#[derive(Parser, Debug, Clone)]
#[command(name = "auction-ledger", version)]
pub struct Options {
    /// Address the HTTP server listens on
    #[arg(long, env = "AUCTION_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// JSON file to load the catalog from; the sample catalog is used if absent
    #[arg(long, env = "AUCTION_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// JSON file to periodically snapshot the catalog into
    #[arg(long, env = "AUCTION_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Seconds between two snapshots
    #[arg(long, env = "AUCTION_SNAPSHOT_INTERVAL_SECS", default_value_t = 30)]
    pub snapshot_interval_secs: u64,
}

impl Options {
    /// Where the initial catalog comes from
    pub fn catalog_source(&self, now: Timestamp) -> SharedCatalogPersistence {
        match &self.catalog {
            Some(path) => JsonFilePersistence::new_shared(path.clone()),
            None => InMemoryPersistence::new_shared(catalog::sample_items(now)),
        }
    }

    pub fn snapshot_target(&self) -> Option<SharedCatalogPersistence> {
        self.snapshot
            .as_ref()
            .map(|path| JsonFilePersistence::new_shared(path.clone()))
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_secs)
    }
}
