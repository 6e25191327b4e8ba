use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{LibraryRefresher, PhotoUploader, SyncConfig, TaskId, UploadEvent, UploadTask};

/// Serializes pending uploads into exactly one in-flight remote operation
///
/// `enqueue` only appends - it never blocks and always succeeds. A drain
/// worker owned by the queue pops tasks strictly FIFO and runs each to a
/// terminal outcome before touching the next; the worker slot is claimed
/// with a compare-and-swap on the drain flag, so overlapping enqueue calls
/// can never start two workers. A task that exhausts its retries surfaces
/// as a `Failed` event and does not stop the tasks behind it. There is no
/// cancellation: an enqueued task always reaches a terminal outcome.
///
/// Must be used from within a tokio runtime - the drain worker is spawned
/// on first demand.
#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    pending: Mutex<VecDeque<UploadTask>>,
    /// True while a drain worker owns the head of the queue
    draining: AtomicBool,
    uploader: PhotoUploader,
    refresher: LibraryRefresher,
    events: broadcast::Sender<UploadEvent>,
}

impl UploadQueue {
    /// Create a new queue around an uploader and refresher
    pub fn new(uploader: PhotoUploader, refresher: LibraryRefresher, config: SyncConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                uploader,
                refresher,
                events,
            }),
        }
    }

    /// Subscribe to lifecycle events
    ///
    /// The channel is lossy for subscribers that fall behind; missing an
    /// event never affects queue execution.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.inner.events.subscribe()
    }

    /// Append an upload task and trigger draining
    ///
    /// Safe to call from any number of overlapping caller contexts; the
    /// append itself is atomic and the drain trigger is idempotent.
    pub fn enqueue<S: Into<String>>(
        &self,
        owner_id: S,
        bytes: Bytes,
        is_verification: bool,
    ) -> TaskId {
        let task = UploadTask::new(owner_id, bytes, is_verification);
        let task_id = task.task_id.clone();
        let owner_id = task.owner_id.clone();

        self.inner.pending.lock().push_back(task);
        debug!(%task_id, "upload task enqueued");
        self.inner.emit(UploadEvent::Enqueued {
            task_id: task_id.clone(),
            owner_id,
            at: Utc::now(),
        });

        self.trigger_drain();
        task_id
    }

    /// Number of tasks waiting behind the one in flight
    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Whether a drain worker is currently active
    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst)
    }

    /// Wait until the queue has no pending tasks and no active worker
    pub async fn idle(&self) {
        while self.is_draining() || self.pending_len() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn trigger_drain(&self) {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                QueueInner::drain(inner).await;
            });
        }
    }
}

impl QueueInner {
    /// Run tasks until the pending list stays empty
    async fn drain(inner: Arc<Self>) {
        debug!("drain worker started");
        loop {
            loop {
                let task = inner.pending.lock().pop_front();
                let Some(task) = task else { break };
                inner.run_task(task).await;
            }

            inner.draining.store(false, Ordering::SeqCst);

            // A task appended between the final pop and the flag clearing
            // saw `draining == true` and did not start a worker; re-claim
            // the slot rather than strand it.
            if inner.pending.lock().is_empty() {
                break;
            }
            if inner
                .draining
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                break;
            }
        }
        debug!("drain worker stopped");
    }

    /// Run one task to its terminal outcome
    async fn run_task(&self, task: UploadTask) {
        let UploadTask {
            task_id,
            owner_id,
            bytes,
            is_verification_photo,
            ..
        } = task;

        self.emit(UploadEvent::Started {
            task_id: task_id.clone(),
            at: Utc::now(),
        });

        match self
            .uploader
            .upload(&owner_id, bytes, is_verification_photo)
            .await
        {
            Ok(photo_id) => {
                info!(%task_id, %photo_id, "upload task completed");
                self.emit(UploadEvent::Succeeded {
                    task_id,
                    photo_id,
                    at: Utc::now(),
                });

                match self.refresher.refresh(&owner_id).await {
                    Ok(photos) => {
                        self.emit(UploadEvent::LibraryRefreshed {
                            owner_id,
                            photos,
                            at: Utc::now(),
                        });
                    }
                    Err(error) => {
                        warn!(%error, "library refresh after upload failed");
                    }
                }
            }
            Err(error) => {
                error!(%task_id, %error, "upload task failed");
                self.emit(UploadEvent::Failed {
                    task_id,
                    error: error.to_string(),
                    at: Utc::now(),
                });
            }
        }
    }

    fn emit(&self, event: UploadEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
