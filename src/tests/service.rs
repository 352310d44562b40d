use super::*;
use crate::{
    auction::BidError,
    ledger::BidLedger,
    persistence::{CatalogPersistence, InMemoryPersistence},
    service::{ApiError, LoopService, ServiceControl, SnapshotService},
    session::SessionError,
    store::ItemStore,
};
use anyhow::{bail, Result};
use axum::http::StatusCode;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration as StdDuration,
};

struct Counter {
    iterations: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

impl LoopService for Counter {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn run_iteration(&mut self) -> Result<()> {
        let n = self.iterations.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_after.map_or(false, |limit| n >= limit) {
            bail!("counter gave up");
        }
        std::thread::sleep(StdDuration::from_millis(1));
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn counter(fail_after: Option<usize>) -> (Counter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let iterations = Arc::new(AtomicUsize::new(0));
    let shutdowns = Arc::new(AtomicUsize::new(0));
    (
        Counter {
            iterations: iterations.clone(),
            shutdowns: shutdowns.clone(),
            fail_after,
        },
        iterations,
        shutdowns,
    )
}

#[test]
fn stop_all_ends_every_loop() -> Result<()> {
    let svc_ctr = ServiceControl::new();
    let (a, a_iterations, a_shutdowns) = counter(None);
    let (b, _, b_shutdowns) = counter(None);

    let handles = vec![svc_ctr.spawn_loop(a), svc_ctr.spawn_loop(b)];
    while a_iterations.load(Ordering::SeqCst) == 0 {
        std::thread::sleep(StdDuration::from_millis(1));
    }
    svc_ctr.stop_all();

    for handle in handles {
        handle.join()?;
    }
    assert_eq!(a_shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(b_shutdowns.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn failing_service_stops_the_others() {
    let svc_ctr = ServiceControl::new();
    let (failing, _, failing_shutdowns) = counter(Some(3));
    let (healthy, _, healthy_shutdowns) = counter(None);

    let healthy = svc_ctr.spawn_loop(healthy);
    let failing = svc_ctr.spawn_loop(failing);

    assert!(failing.join().is_err());
    assert!(healthy.join().is_ok());
    assert_eq!(failing_shutdowns.load(Ordering::SeqCst), 0);
    assert_eq!(healthy_shutdowns.load(Ordering::SeqCst), 1);
}

#[test]
fn snapshot_service_writes_on_shutdown() -> Result<()> {
    let ledger = BidLedger::new_shared(ItemStore::new_shared(vec![test_item(1)])?);
    let target = Arc::new(InMemoryPersistence::new(vec![]));

    let mut service = SnapshotService::new(ledger.clone(), target.clone(), StdDuration::from_secs(3600));
    // well before the interval, nothing is written
    service.run_iteration()?;
    assert!(target.load()?.is_empty());

    ledger.place_bid(1, &who("alice"), amount(110), t0())?;
    service.shutdown()?;
    assert_eq!(target.load()?, ledger.list());
    Ok(())
}

#[test]
fn snapshot_service_writes_every_interval() -> Result<()> {
    let ledger = BidLedger::new_shared(ItemStore::new_shared(vec![test_item(1)])?);
    let target = Arc::new(InMemoryPersistence::new(vec![]));

    let mut service = SnapshotService::new(ledger.clone(), target.clone(), StdDuration::ZERO);
    service.run_iteration()?;
    assert_eq!(target.load()?, vec![test_item(1)]);
    Ok(())
}

#[test]
fn api_errors_map_to_http_statuses() {
    let cases = [
        (ApiError::from(BidError::ItemNotFound(1)), StatusCode::NOT_FOUND),
        (ApiError::from(BidError::AuctionClosed), StatusCode::CONFLICT),
        (
            ApiError::from(BidError::BidTooLow {
                minimum: amount(120),
            }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            ApiError::from(BidError::BidTooHigh {
                maximum: amount(1000),
            }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (ApiError::from(SessionError::EmptyName), StatusCode::BAD_REQUEST),
        (ApiError::MalformedSession, StatusCode::BAD_REQUEST),
        (ApiError::MissingSession, StatusCode::UNAUTHORIZED),
    ];

    for (error, status) in cases {
        assert_eq!(error.status(), status, "{error}");
    }

    assert_eq!(
        ApiError::from(BidError::BidTooLow {
            minimum: amount(120)
        })
        .to_string(),
        "bid is too low, must be at least 120"
    );
}
