//! In-memory collaborators for reconciler and batch tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use imgsync_core::{
    reconcile::{Collaborators, Reconciler},
    storage::{StorageError, StorageGateway, UploadResult},
    FetchError, ImageTransformer, ProbeOutcome, Prober, RunMode, SourceFetcher, StorageKey, Table,
    TransformError,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use url::Url;

pub const PUBLIC_BASE: &str = "https://test-bucket.s3.test";

pub fn public_url(key: &str) -> String {
    format!("{}/{}", PUBLIC_BASE, key)
}

pub fn table(csv: &str) -> Table {
    Table::from_bytes(csv.as_bytes()).unwrap()
}

pub fn dry_run() -> RunMode {
    RunMode::default()
}

pub fn real_run() -> RunMode {
    RunMode {
        dry_run: false,
        ..RunMode::default()
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: Mutex<Vec<String>>,
    head_calls: AtomicUsize,
    fail_exists_for: Mutex<HashSet<String>>,
    fail_put_for: Mutex<HashSet<String>>,
}

impl FakeStorage {
    pub fn with_object(self, key: &str) -> Self {
        self.objects.lock().unwrap().insert(key.to_string(), b"existing".to_vec());
        self
    }

    pub fn failing_exists(self, key: &str) -> Self {
        self.fail_exists_for.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn failing_put(self, key: &str) -> Self {
        self.fail_put_for.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageGateway for FakeStorage {
    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exists_for.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::Head {
                key: key.to_string(),
                reason: "ServiceUnavailable: slow down".to_string(),
            });
        }
        Ok(self.objects.lock().unwrap().contains_key(key.as_str()))
    }

    async fn put(&self, key: &StorageKey, bytes: Vec<u8>) -> Result<UploadResult, StorageError> {
        if self.fail_put_for.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::Put {
                key: key.to_string(),
                reason: "AccessDenied: Access Denied".to_string(),
            });
        }
        let size = bytes.len();
        self.puts.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(UploadResult {
            key: key.to_string(),
            checksum: "fake".to_string(),
            size,
        })
    }

    fn public_url(&self, key: &StorageKey) -> String {
        public_url(key.as_str())
    }
}

// ============================================================================
// Prober
// ============================================================================

/// Answers from a per-URL script; the last answer repeats
pub struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<ProbeOutcome>>>,
    fallback: ProbeOutcome,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedProber {
    fn default() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback: ProbeOutcome::status(200),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedProber {
    pub fn script(self, url: &str, outcomes: &[ProbeOutcome]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.iter().copied().collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().copied().unwrap_or(self.fallback),
            None => self.fallback,
        }
    }
}

// ============================================================================
// Fetcher
// ============================================================================

#[derive(Default)]
pub struct FakeFetcher {
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn failing(self, url: &str) -> Self {
        self.failing.lock().unwrap().insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url.as_str()) {
            return Err(FetchError::Transport {
                url: url.to_string(),
                reason: "connection failed".to_string(),
            });
        }
        Ok(format!("source:{}", url).into_bytes())
    }
}

// ============================================================================
// Transformer
// ============================================================================

/// Prefixes the input with the target size; rejects inputs containing `corrupt`
#[derive(Default)]
pub struct FakeTransformer {
    calls: AtomicUsize,
}

impl FakeTransformer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageTransformer for FakeTransformer {
    fn transform(&self, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = String::from_utf8_lossy(bytes);
        if text.contains("corrupt") {
            return Err(TransformError::Decode("unsupported image format".to_string()));
        }
        Ok(format!("jpeg {}x{} of {}", width, height, text).into_bytes())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub storage: Arc<FakeStorage>,
    pub prober: Arc<ScriptedProber>,
    pub fetcher: Arc<FakeFetcher>,
    pub transformer: Arc<FakeTransformer>,
}

impl Harness {
    pub fn new(storage: FakeStorage, prober: ScriptedProber) -> Self {
        Self::with_fetcher(storage, prober, FakeFetcher::default())
    }

    pub fn with_fetcher(storage: FakeStorage, prober: ScriptedProber, fetcher: FakeFetcher) -> Self {
        Self {
            storage: Arc::new(storage),
            prober: Arc::new(prober),
            fetcher: Arc::new(fetcher),
            transformer: Arc::new(FakeTransformer::default()),
        }
    }

    pub fn reconciler(&self, mode: RunMode) -> Reconciler {
        Reconciler::new(
            Collaborators {
                storage: self.storage.clone(),
                prober: self.prober.clone(),
                fetcher: self.fetcher.clone(),
                transformer: self.transformer.clone(),
            },
            mode,
        )
    }

    /// Nothing was fetched, transformed or written
    pub fn assert_no_side_effects(&self) {
        assert!(self.storage.puts().is_empty(), "unexpected puts: {:?}", self.storage.puts());
        assert!(self.fetcher.calls().is_empty(), "unexpected fetches: {:?}", self.fetcher.calls());
        assert_eq!(self.transformer.calls(), 0);
    }
}
