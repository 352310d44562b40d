//! Periodic catalog snapshots
use super::LoopService;
use crate::{ledger::SharedBidLedger, persistence::SharedCatalogPersistence};
use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct SnapshotService {
    ledger: SharedBidLedger,
    persistence: SharedCatalogPersistence,
    interval: Duration,
    last_snapshot: Instant,
}

impl SnapshotService {
    pub fn new(
        ledger: SharedBidLedger,
        persistence: SharedCatalogPersistence,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            persistence,
            interval,
            last_snapshot: Instant::now(),
        }
    }

    pub fn snapshot_now(&mut self) -> Result<()> {
        let items = self.ledger.list();
        self.persistence.snapshot(&items)?;
        self.last_snapshot = Instant::now();
        debug!(count = items.len(), "catalog snapshot taken");
        Ok(())
    }
}

impl LoopService for SnapshotService {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(POLL_INTERVAL);

        if self.last_snapshot.elapsed() < self.interval {
            return Ok(());
        }

        // a failed snapshot is retried on the next interval, bidding goes on
        if let Err(e) = self.snapshot_now() {
            warn!(error = %e, "catalog snapshot failed");
            self.last_snapshot = Instant::now();
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.snapshot_now()
    }
}
