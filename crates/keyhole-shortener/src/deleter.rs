use keyhole_core::{DeleteRequest, Store};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::error;

/// Default capacity of the deletion queue.
pub const QUEUE_CAPACITY: usize = 100;

/// The asynchronous soft-deletion subsystem.
///
/// A bounded queue feeding a fixed pool of workers, one per available
/// processing unit, each calling `batch_delete` on the active backend.
/// Deletion is fire-and-forget: apply failures are logged and dropped,
/// never retried, and the enqueuing caller gets no feedback. When the
/// queue is full, [`enqueue`](Deleter::enqueue) blocks the caller until
/// a slot frees up rather than dropping or rejecting work.
pub struct Deleter {
    tx: mpsc::Sender<DeleteRequest>,
    workers: Vec<JoinHandle<()>>,
}

impl Deleter {
    /// Spawns the worker pool against `store` with default sizing.
    pub fn spawn(store: Arc<dyn Store>) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_options(store, QUEUE_CAPACITY, workers)
    }

    /// Spawns with explicit queue capacity and worker count.
    ///
    /// At least one worker always runs: with none, the receiver would
    /// be dropped here, closing the channel and turning every later
    /// enqueue into a silent discard.
    pub fn with_options(store: Arc<dyn Store>, capacity: usize, workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers)
            .map(|_| tokio::spawn(run_worker(store.clone(), rx.clone())))
            .collect();
        Self { tx, workers }
    }

    /// Hands a deletion request to the worker pool.
    ///
    /// Returns as soon as the request is on the queue; completes only
    /// when queue space is available (explicit backpressure). A request
    /// accepted here cannot be un-enqueued by cancelling the caller.
    pub async fn enqueue(&self, req: DeleteRequest) {
        if self.tx.send(req).await.is_err() {
            error!("delete queue closed, request dropped");
        }
    }

    /// Closes the queue and waits for the workers to drain it.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

async fn run_worker(store: Arc<dyn Store>, rx: Arc<Mutex<mpsc::Receiver<DeleteRequest>>>) {
    loop {
        // the receiver lock is released before the delete is applied
        let req = rx.lock().await.recv().await;
        let Some(req) = req else {
            break;
        };
        if let Err(err) = store.batch_delete(req).await {
            error!(error = %err, "batch delete failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keyhole_core::{Link, Result, StoreError, UserId};
    use std::time::Duration;
    use tokio::time::timeout;

    /// Store double that records every delete request it receives.
    #[derive(Default)]
    struct RecordingStore {
        deletes: Mutex<Vec<DeleteRequest>>,
        fail: bool,
        park: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Records each request, then never completes the delete.
        fn parking() -> Self {
            Self {
                park: true,
                ..Self::default()
            }
        }

        async fn recorded(&self) -> usize {
            self.deletes.lock().await.len()
        }
    }

    #[async_trait]
    impl Store for RecordingStore {
        async fn add(&self, link: Link) -> Result<String> {
            Ok(link.hash)
        }

        async fn get_by_hash(&self, hash: &str) -> Result<Link> {
            Err(StoreError::NotFound(hash.to_string()))
        }

        async fn get_by_user(&self, _user_id: UserId) -> Result<Vec<Link>> {
            Ok(Vec::new())
        }

        async fn batch_add(&self, _links: Vec<Link>) -> Result<()> {
            Ok(())
        }

        async fn batch_delete(&self, req: DeleteRequest) -> Result<()> {
            self.deletes.lock().await.push(req);
            if self.park {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(StoreError::Query("simulated failure".into()));
            }
            Ok(())
        }

        async fn create_user(&self) -> Result<UserId> {
            Ok(keyhole_core::NO_OWNER)
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn workers_apply_enqueued_deletes() {
        let store = Arc::new(RecordingStore::default());
        let deleter = Deleter::with_options(store.clone(), QUEUE_CAPACITY, 2);

        deleter
            .enqueue(DeleteRequest::new(1, vec!["aaaaaaaa".into()]))
            .await;
        deleter
            .enqueue(DeleteRequest::new(2, vec!["bbbbbbbb".into(), "cccccccc".into()]))
            .await;
        deleter.shutdown().await;

        let deletes = store.deletes.lock().await;
        assert_eq!(deletes.len(), 2);
        let users: Vec<_> = deletes.iter().map(|d| d.user_id).collect();
        assert!(users.contains(&1));
        assert!(users.contains(&2));
    }

    #[tokio::test]
    async fn full_queue_blocks_the_enqueuing_caller() {
        let store = Arc::new(RecordingStore::parking());
        // one worker, parked forever on its first delete
        let deleter = Deleter::with_options(store.clone(), 2, 1);

        deleter.enqueue(DeleteRequest::new(1, vec![])).await;
        // wait for the worker to dequeue and park, so the queue is
        // deterministically empty before we fill it
        for _ in 0..100 {
            if store.recorded().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.recorded().await, 1);

        deleter.enqueue(DeleteRequest::new(2, vec![])).await;
        deleter.enqueue(DeleteRequest::new(3, vec![])).await;

        let blocked = timeout(
            Duration::from_millis(50),
            deleter.enqueue(DeleteRequest::new(4, vec![])),
        )
        .await;
        assert!(
            blocked.is_err(),
            "enqueue past capacity should block until a slot frees"
        );
    }

    #[tokio::test]
    async fn a_worker_always_runs_even_when_zero_are_requested() {
        let store = Arc::new(RecordingStore::default());
        let deleter = Deleter::with_options(store.clone(), QUEUE_CAPACITY, 0);

        // with no worker the channel would be closed and this request
        // silently discarded
        deleter
            .enqueue(DeleteRequest::new(1, vec!["aaaaaaaa".into()]))
            .await;
        deleter.shutdown().await;

        assert_eq!(store.recorded().await, 1);
    }

    #[tokio::test]
    async fn apply_failures_are_swallowed() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let store = Arc::new(RecordingStore::failing());
        let deleter = Deleter::with_options(store.clone(), QUEUE_CAPACITY, 1);

        deleter
            .enqueue(DeleteRequest::new(1, vec!["aaaaaaaa".into()]))
            .await;
        deleter
            .enqueue(DeleteRequest::new(1, vec!["bbbbbbbb".into()]))
            .await;
        deleter.shutdown().await;

        // both requests were attempted despite the first one failing
        assert_eq!(store.deletes.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn shutdown_drains_the_queue() {
        let store = Arc::new(RecordingStore::default());
        let deleter = Deleter::with_options(store.clone(), QUEUE_CAPACITY, 1);

        for user in 0..10 {
            deleter.enqueue(DeleteRequest::new(user, vec![])).await;
        }
        deleter.shutdown().await;

        assert_eq!(store.deletes.lock().await.len(), 10);
    }
}
