pub mod snapshot;
pub mod ui;

pub use self::{snapshot::*, ui::*};
use anyhow::{bail, format_err, Result};
use std::{
    sync::{
        atomic::{self, AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use tracing::{error, info};

/// A service that is a loop that does something
pub trait LoopService: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_iteration(&mut self) -> Result<()>;

    /// Called once after the loop stops without error
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Service execution control instance
///
/// All services are basically a loop, and we would like to be able to
/// gracefully terminate them, and handle and top-level error of any
/// of them by gracefully stopping everything else.
#[derive(Clone, Default)]
pub struct ServiceControl {
    stop_all: Arc<AtomicBool>,
}

impl ServiceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_all(&self) {
        self.stop_all.store(true, Ordering::SeqCst);
    }

    pub fn spawn_loop(&self, mut service: impl LoopService + 'static) -> JoinHandle {
        let name = service.name();
        info!(service = name, "starting");
        self.spawn_loop_raw(name, move |stopping| {
            if stopping {
                service.shutdown()
            } else {
                service.run_iteration()
            }
        })
    }

    /// Start a new service as a loop, with a certain body
    ///
    /// This will take care of checking termination condition and
    /// handling any errors returned by `f`. `f` is called with `true`
    /// exactly once after the loop ends cleanly.
    fn spawn_loop_raw<F>(&self, name: &'static str, mut f: F) -> JoinHandle
    where
        F: FnMut(bool) -> Result<()> + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));

        JoinHandle::new(
            stop.clone(),
            thread::spawn({
                let stop_all = self.stop_all.clone();
                move || match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    while !stop.load(atomic::Ordering::SeqCst)
                        && !stop_all.load(atomic::Ordering::SeqCst)
                    {
                        if let Err(e) = f(false) {
                            error!(service = name, error = %e, "service failed, stopping all");
                            stop_all.store(true, atomic::Ordering::SeqCst);
                            return Err(e);
                        }
                    }
                    f(true)?;
                    info!(service = name, "stopped");
                    Ok(())
                })) {
                    Err(_e) => {
                        error!(service = name, "service panicked, stopping all");
                        stop_all.store(true, atomic::Ordering::SeqCst);
                        bail!("service {name} panicked");
                    }
                    Ok(res) => res,
                }
            }),
        )
    }
}

/// Simple thread join wrapper that joins the thread on drop
pub struct JoinHandle {
    stop: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<Result<()>>>,
}

impl JoinHandle {
    fn new(stop: Arc<AtomicBool>, handle: thread::JoinHandle<Result<()>>) -> Self {
        JoinHandle {
            stop,
            thread: Some(handle),
        }
    }
}

impl JoinHandle {
    fn join_mut(&mut self) -> Result<()> {
        if let Some(h) = self.thread.take() {
            h.join().map_err(|e| format_err!("join failed: {:?}", e))?
        } else {
            Ok(())
        }
    }

    pub fn join(mut self) -> Result<()> {
        self.join_mut()
    }
}

impl Drop for JoinHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Err(e) = self.join_mut() {
            error!(error = %e, "service ended with an error");
        }
    }
}
