//! Background last-used timestamp updater
//!
//! API-key validation records when a key was last used, but that bookkeeping
//! must never add latency or failure risk to the validation hot path. Updates
//! are queued on a bounded channel with `try_send` - a full queue drops the
//! update, and worker-side store failures are logged and discarded. The
//! timestamp is advisory metadata, eventually and approximately accurate,
//! never consulted for authorization decisions.
//!
//! The worker has an explicit shutdown command that drains queued updates
//! before exiting, so in-flight updates are not silently lost on process
//! exit.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::store::CredentialStore;

/// Channel buffer size - validation bursts beyond this drop updates
const CHANNEL_BUFFER: usize = 64;

/// Commands sent to the updater task
enum TouchCommand {
    Touch(Uuid),
    Shutdown,
}

/// Handle for enqueueing last-used updates
///
/// Cheap to clone. Sending never blocks and never fails the caller.
#[derive(Clone)]
pub struct LastUsedHandle {
    tx: mpsc::Sender<TouchCommand>,
}

impl LastUsedHandle {
    /// Queue a last-used update for a key (non-blocking, fire-and-forget)
    ///
    /// If the queue is full the update is dropped - the next validation of
    /// the same key will land one.
    pub fn touch(&self, key_id: Uuid) {
        if self.tx.try_send(TouchCommand::Touch(key_id)).is_err() {
            trace!(key_id = %key_id, "last-used queue full, update dropped");
        }
    }

    /// Request shutdown; the worker drains queued updates before exiting
    pub fn shutdown(&self) {
        let _ = self.tx.try_send(TouchCommand::Shutdown);
    }
}

/// Worker that applies queued last-used updates to the store
pub struct LastUsedUpdater {
    store: Arc<dyn CredentialStore>,
    rx: mpsc::Receiver<TouchCommand>,
}

impl LastUsedUpdater {
    /// Create an updater and its handle
    ///
    /// The updater must be spawned as a task using `run()`.
    pub fn new(store: Arc<dyn CredentialStore>) -> (Self, LastUsedHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        (Self { store, rx }, LastUsedHandle { tx })
    }

    /// Run the updater loop
    ///
    /// Runs until shutdown is requested or every handle is dropped, then
    /// drains whatever is still queued.
    pub async fn run(mut self) {
        debug!("last-used updater started");

        loop {
            match self.rx.recv().await {
                Some(TouchCommand::Touch(key_id)) => self.apply(key_id).await,
                Some(TouchCommand::Shutdown) | None => break,
            }
        }

        // Drain: no new sends are accepted, queued updates still land.
        self.rx.close();
        while let Some(cmd) = self.rx.recv().await {
            if let TouchCommand::Touch(key_id) = cmd {
                self.apply(key_id).await;
            }
        }

        debug!("last-used updater stopped");
    }

    async fn apply(&self, key_id: Uuid) {
        if let Err(e) = self.store.update_api_key_last_used(key_id).await {
            warn!(key_id = %key_id, error = %e, "last-used update failed");
        }
    }
}

/// Spawn the updater as a background task
///
/// Returns the handle and the task's join handle. Call
/// `LastUsedHandle::shutdown` and await the join handle to drain on exit.
pub fn spawn(store: Arc<dyn CredentialStore>) -> (LastUsedHandle, tokio::task::JoinHandle<()>) {
    let (updater, handle) = LastUsedUpdater::new(store);
    let task = tokio::spawn(updater.run());
    (handle, task)
}
