//! Deferred, coalescing persistence of identity state.
//!
//! A single reusable job: `request` is idempotent while a run is pending,
//! so any number of schedule calls before the worker wakes collapse into
//! one execution. The worker snapshots the record store at execution time
//! and writes the identity list (and resolving keys, under privacy) back
//! to the settings store. Write failures are terminal for that attempt
//! only; the next identity change re-triggers a fresh one.
//!
//! The worker lives as long as its scheduler handle: dropping the host
//! wakes the worker one last time so it can exit instead of parking
//! forever on the record store and backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bthost_settings::SettingsBackend;
use tokio::sync::{Mutex, Notify};
use tracing::{error, info};

use crate::config::IdentityConfig;
use crate::keys::{ID_KEY, IRK_KEY};
use crate::records::IdentityRecords;

pub(crate) struct SaveScheduler {
    pending: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SaveScheduler {
    /// Spawn the worker task. Must run inside a tokio runtime.
    pub(crate) fn spawn(
        config: IdentityConfig,
        records: Arc<Mutex<IdentityRecords>>,
        backend: Arc<dyn SettingsBackend>,
    ) -> Self {
        let pending = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());

        let worker_pending = Arc::clone(&pending);
        let worker_shutdown = Arc::clone(&shutdown);
        let worker_notify = Arc::clone(&notify);
        tokio::spawn(async move {
            loop {
                worker_notify.notified().await;
                if worker_shutdown.load(Ordering::SeqCst) {
                    break;
                }
                // Clear before reading state so a request that lands while
                // the write is in flight schedules another run.
                worker_pending.store(false, Ordering::SeqCst);
                save_identity(&config, &records, backend.as_ref()).await;
            }
        });

        Self {
            pending,
            shutdown,
            notify,
        }
    }

    /// Schedule one write-back. A no-op while one is already pending;
    /// never blocks the caller.
    pub(crate) fn request(&self) {
        if !self.pending.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }
}

impl Drop for SaveScheduler {
    fn drop(&mut self) {
        // Wake the worker so it observes the shutdown flag and exits.
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

async fn save_identity(
    config: &IdentityConfig,
    records: &Mutex<IdentityRecords>,
    backend: &dyn SettingsBackend,
) {
    info!("saving identity information");

    let (ids, irks) = {
        let records = records.lock().await;
        let irks = config.privacy.then(|| records.encode_resolving_keys());
        (records.encode_identities(), irks)
    };

    if let Err(err) = backend.save_one(ID_KEY, &ids).await {
        error!(%err, "failed to save identity list");
    }

    if let Some(irks) = irks {
        if let Err(err) = backend.save_one(IRK_KEY, &irks).await {
            error!(%err, "failed to save resolving keys");
        }
    }
}
