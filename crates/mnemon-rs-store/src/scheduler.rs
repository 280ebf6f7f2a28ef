//! Write-behind save scheduler.
//!
//! A single bounded channel feeds N worker threads. Enqueueing never blocks:
//! when the queue is full (or already closed) the record is handed back and
//! the caller saves synchronously. Shutdown closes the drain signal first,
//! waits briefly for workers to switch into drain mode, closes the queue,
//! then joins the workers under a 30-second deadline.

use crate::error::StoreError;
use crate::model::Memory;
use crate::store::Shared;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Grace period between signalling shutdown and closing the queue.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);
/// Ceiling on the total drain time during close.
const DRAIN_DEADLINE: Duration = Duration::from_secs(30);

/// Bounded queue plus worker pool for background record saves.
pub(crate) struct SaveScheduler {
    queue: Mutex<Option<Sender<Memory>>>,
    shutdown: Mutex<Option<Sender<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SaveScheduler {
    /// Spawn `worker_threads` workers behind a queue of `queue_size` slots.
    pub(crate) fn start(shared: Arc<Shared>, queue_size: usize, worker_threads: usize) -> Self {
        let (queue_tx, queue_rx) = bounded::<Memory>(queue_size);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let workers = (0..worker_threads)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                let queue_rx = queue_rx.clone();
                let shutdown_rx = shutdown_rx.clone();
                std::thread::Builder::new()
                    .name(format!("mnemon-save-{worker}"))
                    .spawn(move || worker_loop(shared, queue_rx, shutdown_rx))
                    .expect("spawn save worker")
            })
            .collect();

        SaveScheduler {
            queue: Mutex::new(Some(queue_tx)),
            shutdown: Mutex::new(Some(shutdown_tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Try to enqueue a record for background save.
    ///
    /// Returns the record when the queue is full or already closed so the
    /// caller can fall back to a synchronous save.
    pub(crate) fn try_enqueue(&self, record: Memory) -> Result<(), Memory> {
        match self.queue.lock().as_ref() {
            Some(queue) => queue.try_send(record).map_err(|err| err.into_inner()),
            None => Err(record),
        }
    }

    /// Signal shutdown, drain the queue, and join the workers.
    pub(crate) fn shutdown(&self) -> Result<(), StoreError> {
        let Some(signal) = self.shutdown.lock().take() else {
            return Ok(());
        };
        drop(signal);

        // Let workers observe the signal and enter drain mode before the
        // queue disconnects.
        std::thread::sleep(SHUTDOWN_GRACE);
        drop(self.queue.lock().take());

        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        let (done_tx, done_rx) = bounded::<()>(1);
        std::thread::spawn(move || {
            for worker in workers {
                let _ = worker.join();
            }
            let _ = done_tx.send(());
        });

        match done_rx.recv_timeout(DRAIN_DEADLINE) {
            Ok(()) => {
                debug!("all save workers completed");
                Ok(())
            }
            Err(_) => {
                warn!("timeout waiting for save workers to complete");
                Err(StoreError::Timeout)
            }
        }
    }
}

/// Worker loop: save queued records until shutdown, then drain and exit.
fn worker_loop(shared: Arc<Shared>, queue: Receiver<Memory>, shutdown: Receiver<()>) {
    loop {
        select! {
            recv(queue) -> record => match record {
                Ok(record) => save(&shared, &record),
                Err(_) => {
                    debug!("save worker exiting (queue closed)");
                    return;
                }
            },
            recv(shutdown) -> _ => {
                debug!("save worker draining (shutdown signalled)");
                while let Ok(record) = queue.try_recv() {
                    save(&shared, &record);
                }
                return;
            }
        }
    }
}

fn save(shared: &Shared, record: &Memory) {
    if let Err(err) = shared.write_back(record) {
        error!(
            "failed to save memory asynchronously (id={}, error={err})",
            record.id
        );
    }
}
