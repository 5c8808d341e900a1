//! Background reclamation of expired links.
//!
//! Expired links are also reclaimed lazily when someone clicks them, but a
//! link nobody visits again would stay in storage forever. The sweeper runs
//! [`ShortenerService::sweep_expired`] on a fixed interval until it is stopped.
//! Links that ran out of clicks are not swept; they go once their time is up.

use crate::service::ShortenerService;
use crate::settings::SweeperSettings;
use std::sync::Arc;
use tinylink_generator::Generator;
use tinylink_storage::Persistence;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace};

/// A handle to the running sweeper task.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Starts sweeping `service` as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<G: Generator, P: Persistence>(
        service: Arc<ShortenerService<G, P>>,
        settings: SweeperSettings,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sweeper_loop(service, settings, shutdown_rx));

        info!(
            interval_secs = settings.interval.as_secs(),
            "background sweeper started"
        );

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Signals the sweeper to stop. An in-flight sweep finishes first.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the sweeper and waits for the task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "sweeper task ended abnormally");
            }
        }
        info!("background sweeper stopped");
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn sweeper_loop<G: Generator, P: Persistence>(
    service: Arc<ShortenerService<G, P>>,
    settings: SweeperSettings,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // shutdown wins over a tick that is due at the same time
        tokio::select! {
            biased;
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("sweeper received shutdown signal");
                    return;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        if *shutdown_rx.borrow() {
            debug!("sweeper received shutdown signal");
            return;
        }

        // sweeping flushes to disk, keep it off the async workers
        let sweep_service = Arc::clone(&service);
        match tokio::task::spawn_blocking(move || sweep_service.sweep_expired()).await {
            Ok(0) => trace!("sweep found nothing to reclaim"),
            Ok(reclaimed) => info!(
                reclaimed,
                remaining = service.links().len(),
                "sweep reclaimed expired links"
            ),
            Err(e) => error!(error = %e, "sweep task failed"),
        }
    }
}
