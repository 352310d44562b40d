mod auction;
mod catalog;
mod config;
mod ledger;
mod persistence;
mod service;
mod session;
mod store;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let opts = config::Options::parse();

    let items = opts.catalog_source(Utc::now()).load()?;
    let store = store::ItemStore::new_shared(items)?;
    info!(items = store.len(), "catalog loaded");

    let ledger = ledger::BidLedger::new_shared(store);
    let sessions = session::SessionRegistry::new_shared();

    let svc_ctr = service::ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            info!("Stopping all services...");
            svc_ctr.stop_all();
        }
    })?;

    let mut handles = vec![svc_ctr.spawn_loop(service::Ui::new(
        opts.listen,
        ledger.clone(),
        sessions,
    )?)];

    if let Some(target) = opts.snapshot_target() {
        handles.push(svc_ctr.spawn_loop(service::SnapshotService::new(
            ledger.clone(),
            target,
            opts.snapshot_interval(),
        )));
    }

    for handle in handles {
        handle.join()?
    }

    Ok(())
}
