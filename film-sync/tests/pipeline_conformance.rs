use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use film_blob::{BlobError, BlobInfo, BlobResult, BlobStore, MemoryBlobStore, PutResult};
use film_docs::{DocumentStore, Fields, Filter, MemoryDocumentStore};
use film_sync::types::fields;
use film_sync::{
    DeletionCoordinator, LibraryRefresher, PhotoId, PhotoUploader, SyncConfig, SyncError,
    UploadEvent, UploadQueue,
};

/// Test factory functions

fn test_config() -> SyncConfig {
    SyncConfig::default().with_retry_delay(Duration::from_millis(5))
}

struct Pipeline {
    docs: Arc<MemoryDocumentStore>,
    queue: UploadQueue,
    refresher: LibraryRefresher,
}

fn build_pipeline(store: Arc<dyn BlobStore>) -> Pipeline {
    let docs = Arc::new(MemoryDocumentStore::new());
    let config = test_config();
    let uploader = PhotoUploader::new(store, docs.clone(), config.clone());
    let refresher = LibraryRefresher::new(docs.clone(), config.clone());
    let queue = UploadQueue::new(uploader, refresher.clone(), config);
    Pipeline {
        docs,
        queue,
        refresher,
    }
}

async fn next_event(events: &mut broadcast::Receiver<UploadEvent>) -> UploadEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Collect terminal outcomes (success or exhausted-retry failure) in the
/// order they are emitted
async fn collect_terminal(
    events: &mut broadcast::Receiver<UploadEvent>,
    count: usize,
) -> Vec<UploadEvent> {
    let mut terminal = Vec::new();
    while terminal.len() < count {
        let event = next_event(events).await;
        if event.is_terminal() {
            terminal.push(event);
        }
    }
    terminal
}

fn injected_failure() -> BlobError {
    BlobError::backend(std::io::Error::new(
        std::io::ErrorKind::Other,
        "injected storage failure",
    ))
}

/// Records put concurrency so overlapping remote writes are detectable
struct ProbeBlobStore {
    inner: MemoryBlobStore,
    active: AtomicUsize,
    max_overlap: AtomicUsize,
    put_keys: Mutex<Vec<String>>,
}

impl ProbeBlobStore {
    fn new() -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            active: AtomicUsize::new(0),
            max_overlap: AtomicUsize::new(0),
            put_keys: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStore for ProbeBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_overlap.fetch_max(now_active, Ordering::SeqCst);
        self.put_keys.lock().push(key.to_string());

        // Hold the slot briefly so overlap, if it existed, would be seen
        tokio::time::sleep(Duration::from_millis(2)).await;
        let result = self.inner.put(key, bytes).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn url_for(&self, key: &str) -> BlobResult<String> {
        self.inner.url_for(key).await
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.delete(key).await
    }

    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>> {
        self.inner.head(key).await
    }
}

/// Fails every put of one specific payload; everything else succeeds
struct PoisonBlobStore {
    inner: MemoryBlobStore,
    poison: &'static [u8],
}

impl PoisonBlobStore {
    fn new(poison: &'static [u8]) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            poison,
        }
    }
}

#[async_trait]
impl BlobStore for PoisonBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult> {
        if bytes.as_ref() == self.poison {
            return Err(injected_failure());
        }
        self.inner.put(key, bytes).await
    }

    async fn url_for(&self, key: &str) -> BlobResult<String> {
        self.inner.url_for(key).await
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.delete(key).await
    }

    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>> {
        self.inner.head(key).await
    }
}

/// Fails the first N puts, then succeeds; counts every attempt
struct CountdownBlobStore {
    inner: MemoryBlobStore,
    failures_left: AtomicU32,
    puts: AtomicU32,
}

impl CountdownBlobStore {
    fn failing_first(failures: u32) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            failures_left: AtomicU32::new(failures),
            puts: AtomicU32::new(0),
        }
    }

    fn put_count(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for CountdownBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(injected_failure());
        }
        self.inner.put(key, bytes).await
    }

    async fn url_for(&self, key: &str) -> BlobResult<String> {
        self.inner.url_for(key).await
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        self.inner.delete(key).await
    }

    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>> {
        self.inner.head(key).await
    }
}

/// Stores normally but refuses every delete
struct FailingDeleteStore {
    inner: Arc<MemoryBlobStore>,
}

#[async_trait]
impl BlobStore for FailingDeleteStore {
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult> {
        self.inner.put(key, bytes).await
    }

    async fn url_for(&self, key: &str) -> BlobResult<String> {
        self.inner.url_for(key).await
    }

    async fn delete(&self, _key: &str) -> BlobResult<()> {
        Err(injected_failure())
    }

    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>> {
        self.inner.head(key).await
    }
}

/// Seed a photo record directly, bypassing the upload path
async fn seed_photo(docs: &MemoryDocumentStore, owner: &str, key: &str) -> PhotoId {
    docs.create(
        "photos",
        Fields::new()
            .set(fields::AUTHOR_UID, owner)
            .set(fields::EMBEDDINGS, Vec::<f64>::new())
            .set(fields::FILEPATH, format!("memory://{}", key))
            .set(fields::STORAGE_PATH, key)
            .set(fields::IS_VERIFICATION_PHOTO, false)
            .set_server_timestamp(fields::CREATED_AT),
    )
    .await
    .unwrap()
}

/// Seed an aggregate document holding the given photo ids
async fn seed_aggregate(docs: &MemoryDocumentStore, owner: &str, photo_ids: Vec<&str>) -> film_docs::DocId {
    docs.create(
        "user_photos",
        Fields::new()
            .set("owner_uid", owner)
            .set(fields::PHOTO_IDS, photo_ids),
    )
    .await
    .unwrap()
}

/// P1. Serialization: concurrent enqueues never overlap remote writes
#[tokio::test]
async fn test_concurrent_enqueues_execute_serially() {
    let store = Arc::new(ProbeBlobStore::new());
    let pipeline = build_pipeline(store.clone());
    let mut events = pipeline.queue.subscribe();

    let mut handles = Vec::new();
    for i in 0..5u8 {
        let queue = pipeline.queue.clone();
        handles.push(tokio::spawn(async move {
            queue.enqueue("u1", Bytes::from(vec![i]), false)
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let outcomes = collect_terminal(&mut events, 5).await;
    assert!(outcomes
        .iter()
        .all(|event| matches!(event, UploadEvent::Succeeded { .. })));

    // Exactly 5 remote writes, never two in flight at once
    assert_eq!(store.put_keys.lock().len(), 5);
    assert_eq!(store.max_overlap.load(Ordering::SeqCst), 1);
}

/// P2. FIFO: tasks reach terminal outcomes in enqueue order
#[tokio::test]
async fn test_tasks_complete_in_enqueue_order() {
    let pipeline = build_pipeline(Arc::new(MemoryBlobStore::new()));
    let mut events = pipeline.queue.subscribe();

    let mut enqueued = Vec::new();
    for i in 0..4u8 {
        enqueued.push(pipeline.queue.enqueue("u1", Bytes::from(vec![i]), false));
    }

    let outcomes = collect_terminal(&mut events, 4).await;
    let completed: Vec<_> = outcomes
        .iter()
        .map(|event| event.task_id().unwrap().clone())
        .collect();
    assert_eq!(completed, enqueued);
}

/// P3. Isolation + the A/B/C example: a task that fails every attempt does
/// not prevent later tasks from executing, and outcomes stay FIFO
#[tokio::test]
async fn test_failing_task_does_not_halt_queue() {
    let pipeline = build_pipeline(Arc::new(PoisonBlobStore::new(b"poison-payload")));
    let mut events = pipeline.queue.subscribe();

    let task_a = pipeline
        .queue
        .enqueue("u1", Bytes::from_static(b"photo-a"), false);
    let task_b = pipeline
        .queue
        .enqueue("u1", Bytes::from_static(b"poison-payload"), false);
    let task_c = pipeline
        .queue
        .enqueue("u1", Bytes::from_static(b"photo-c"), false);

    let outcomes = collect_terminal(&mut events, 3).await;

    let mut photo_ids = Vec::new();
    match &outcomes[0] {
        UploadEvent::Succeeded { task_id, photo_id, .. } => {
            assert_eq!(task_id, &task_a);
            photo_ids.push(photo_id.clone());
        }
        other => panic!("expected A to succeed, got: {:?}", other),
    }
    match &outcomes[1] {
        UploadEvent::Failed { task_id, .. } => assert_eq!(task_id, &task_b),
        other => panic!("expected B to fail, got: {:?}", other),
    }
    match &outcomes[2] {
        UploadEvent::Succeeded { task_id, photo_id, .. } => {
            assert_eq!(task_id, &task_c);
            photo_ids.push(photo_id.clone());
        }
        other => panic!("expected C to succeed, got: {:?}", other),
    }

    // A and C are both visible through a subsequent refresh; B left nothing
    let library = pipeline.refresher.refresh("u1").await.unwrap();
    let library_ids: Vec<_> = library.iter().map(|record| record.id.clone()).collect();
    assert_eq!(library_ids, photo_ids);
}

/// P4. Retry bound: two transient failures are absorbed, the third attempt
/// lands
#[tokio::test]
async fn test_upload_succeeds_on_third_attempt() {
    let store = Arc::new(CountdownBlobStore::failing_first(2));
    let docs = Arc::new(MemoryDocumentStore::new());
    let uploader = PhotoUploader::new(store.clone(), docs.clone(), test_config());

    let photo_id = uploader
        .upload("u1", Bytes::from_static(b"jpeg"), false)
        .await
        .unwrap();

    assert_eq!(store.put_count(), 3);
    assert!(docs.get("photos", &photo_id).await.unwrap().is_some());
}

/// P4. Retry bound: the budget is three attempts total - no fourth attempt
/// is ever made
#[tokio::test]
async fn test_upload_fails_after_exhausting_attempts() {
    let store = Arc::new(CountdownBlobStore::failing_first(3));
    let docs = Arc::new(MemoryDocumentStore::new());
    let uploader = PhotoUploader::new(store.clone(), docs.clone(), test_config());

    let result = uploader.upload("u1", Bytes::from_static(b"jpeg"), false).await;

    match result {
        Err(SyncError::UploadFailed { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected UploadFailed, got: {:?}", other),
    }
    assert_eq!(store.put_count(), 3);
    assert_eq!(docs.collection_len("photos"), 0);
}

/// P5. Refresh truth: the refreshed list equals the full canonical remote
/// set for the owner, not a locally patched view
#[tokio::test]
async fn test_refresh_returns_canonical_owner_set() {
    let pipeline = build_pipeline(Arc::new(MemoryBlobStore::new()));
    let mut events = pipeline.queue.subscribe();

    // Another session's record for a different owner must never leak in
    seed_photo(&pipeline.docs, "someone-else", "users/someone-else/photos/1.jpg").await;

    pipeline
        .queue
        .enqueue("u1", Bytes::from_static(b"jpeg"), false);

    let uploaded_id = loop {
        if let UploadEvent::Succeeded { photo_id, .. } = next_event(&mut events).await {
            break photo_id;
        }
    };
    let refreshed = loop {
        if let UploadEvent::LibraryRefreshed { photos, .. } = next_event(&mut events).await {
            break photos;
        }
    };

    let refreshed_ids: Vec<_> = refreshed.iter().map(|record| record.id.clone()).collect();
    assert!(refreshed_ids.contains(&uploaded_id));

    let canonical = pipeline
        .docs
        .query("photos", Filter::field_eq(fields::AUTHOR_UID, "u1"))
        .await
        .unwrap();
    let canonical_ids: Vec<_> = canonical.iter().map(|doc| doc.id.clone()).collect();
    assert_eq!(refreshed_ids, canonical_ids);

    // A record created by another device shows up on the next pull
    let remote_id = seed_photo(&pipeline.docs, "u1", "users/u1/photos/999.jpg").await;
    let next = pipeline.refresher.refresh("u1").await.unwrap();
    let next_ids: Vec<_> = next.iter().map(|record| record.id.clone()).collect();
    assert!(next_ids.contains(&uploaded_id));
    assert!(next_ids.contains(&remote_id));
}

/// P6. Deletion atomicity: the record and every aggregate reference vanish
/// together
#[tokio::test]
async fn test_delete_removes_record_and_all_references() {
    let store = Arc::new(MemoryBlobStore::new());
    let docs = Arc::new(MemoryDocumentStore::new());
    let config = test_config();

    let target = seed_photo(&docs, "u1", "users/u1/photos/1.jpg").await;
    let keeper = seed_photo(&docs, "u1", "users/u1/photos/2.jpg").await;
    store
        .put("users/u1/photos/1.jpg", Bytes::from_static(b"jpeg"))
        .await
        .unwrap();

    let first_agg =
        seed_aggregate(&docs, "friend-1", vec![target.as_str(), keeper.as_str()]).await;
    let second_agg = seed_aggregate(&docs, "friend-2", vec![target.as_str()]).await;

    let deleter = DeletionCoordinator::new(store.clone(), docs.clone(), config);
    deleter.delete(&target).await.unwrap();

    assert!(docs.get("photos", &target).await.unwrap().is_none());
    assert!(docs.get("photos", &keeper).await.unwrap().is_some());

    let first = docs.get("user_photos", &first_agg).await.unwrap().unwrap();
    let first_ids = first.array_field(fields::PHOTO_IDS).unwrap();
    assert!(!first_ids.contains(&serde_json::json!(target.as_str())));
    assert!(first_ids.contains(&serde_json::json!(keeper.as_str())));

    let second = docs.get("user_photos", &second_agg).await.unwrap().unwrap();
    assert!(second.array_field(fields::PHOTO_IDS).unwrap().is_empty());

    // Blob goes last, after the batch committed
    assert!(!store.contains("users/u1/photos/1.jpg").await);
}

/// P7. Orphan tolerance: a failed blob deletion after the committed batch
/// still reports overall success
#[tokio::test]
async fn test_blob_deletion_failure_is_tolerated() {
    let inner = Arc::new(MemoryBlobStore::new());
    let store = Arc::new(FailingDeleteStore {
        inner: inner.clone(),
    });
    let docs = Arc::new(MemoryDocumentStore::new());

    let target = seed_photo(&docs, "u1", "users/u1/photos/1.jpg").await;
    inner
        .put("users/u1/photos/1.jpg", Bytes::from_static(b"jpeg"))
        .await
        .unwrap();
    let aggregate = seed_aggregate(&docs, "friend-1", vec![target.as_str()]).await;

    let deleter = DeletionCoordinator::new(store, docs.clone(), test_config());
    deleter.delete(&target).await.unwrap();

    // No surviving reference, even though the blob is still there
    assert!(docs.get("photos", &target).await.unwrap().is_none());
    let agg = docs.get("user_photos", &aggregate).await.unwrap().unwrap();
    assert!(agg.array_field(fields::PHOTO_IDS).unwrap().is_empty());
    assert!(inner.contains("users/u1/photos/1.jpg").await);
}

/// Deleting a photo that was never uploaded (or is already gone) succeeds
#[tokio::test]
async fn test_delete_of_absent_photo_is_idempotent() {
    let store = Arc::new(MemoryBlobStore::new());
    let docs = Arc::new(MemoryDocumentStore::new());
    let deleter = DeletionCoordinator::new(store, docs, test_config());

    deleter.delete(&PhotoId::from("never-existed")).await.unwrap();
}

/// Verification gate: present only once a verification photo is uploaded
#[tokio::test]
async fn test_verification_photo_gate() {
    let pipeline = build_pipeline(Arc::new(MemoryBlobStore::new()));
    let mut events = pipeline.queue.subscribe();

    assert!(!pipeline
        .refresher
        .has_verification_photo("u1")
        .await
        .unwrap());

    pipeline
        .queue
        .enqueue("u1", Bytes::from_static(b"selfie"), true);
    collect_terminal(&mut events, 1).await;

    assert!(pipeline
        .refresher
        .has_verification_photo("u1")
        .await
        .unwrap());
    assert!(!pipeline
        .refresher
        .has_verification_photo("u2")
        .await
        .unwrap());
}
