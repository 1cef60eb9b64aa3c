//! Worker registration and the fetch-handling execution context.
//!
//! The registry is the page side's entry point: it performs the capability
//! check, installs a worker (precache, route table), activates it, and swaps
//! it in as the active worker so that every existing client handle is claimed
//! immediately. The worker itself runs in its own task and receives fetch
//! events over a channel; there is no shared state with the page side.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use super::cache::{CachedResponse, ResponseCache};
use super::error::FetchError;
use super::routes::{default_table, FetchRequest, RouteTable, Strategy, SHELL_DOCUMENT};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the fetch-event channel.
/// A page issues at most a handful of concurrent requests; 32 gives headroom.
const FETCH_CHANNEL_SIZE: usize = 32;

/// HTTP request timeout in seconds.
/// 30s allows for slow origins while failing fast enough to fall back to cache.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Network seam
// ============================================================================

/// A fetched network response body with its content type.
#[derive(Debug, Clone)]
pub struct NetworkResponse {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Outbound network access for the worker, behind a trait so strategies are
/// testable without a live network.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<NetworkResponse, FetchError>;
}

/// Network client backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url: &str) -> Result<NetworkResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();
        Ok(NetworkResponse { body, content_type })
    }
}

// ============================================================================
// Worker execution context
// ============================================================================

struct FetchEvent {
    request: FetchRequest,
    reply: oneshot::Sender<Result<CachedResponse, FetchError>>,
}

/// Handle held by page clients; routes fetches into the worker context.
#[derive(Clone)]
pub struct WorkerClient {
    tx: mpsc::Sender<FetchEvent>,
}

impl WorkerClient {
    pub async fn fetch(&self, request: FetchRequest) -> Result<CachedResponse, FetchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(FetchEvent {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| FetchError::WorkerGone)?;
        reply_rx.await.map_err(|_| FetchError::WorkerGone)?
    }
}

/// One installed worker: its route table, cache, and network access.
struct CacheWorker {
    routes: RouteTable,
    cache: ResponseCache,
    network: Arc<dyn Network>,
}

impl CacheWorker {
    async fn run(self, mut rx: mpsc::Receiver<FetchEvent>) {
        while let Some(event) = rx.recv().await {
            let result = self.handle_fetch(&event.request).await;
            if event.reply.send(result).is_err() {
                debug!("fetch requester went away before the reply");
            }
        }
        debug!("cache worker stopping: all clients dropped");
    }

    async fn handle_fetch(&self, request: &FetchRequest) -> Result<CachedResponse, FetchError> {
        match self.routes.resolve(request) {
            Some(route) => match route.strategy() {
                Strategy::CacheOnly => {
                    let key = route.cache_key(request);
                    self.from_cache(key)
                        .ok_or_else(|| FetchError::CacheMiss(key.to_string()))
                }
                Strategy::NetworkFirst => self.network_first(&request.url).await,
                Strategy::CacheFirst => self.cache_first(&request.url).await,
            },
            // Unrouted requests pass through to the network untouched.
            None => self.passthrough(&request.url).await,
        }
    }

    async fn network_first(&self, url: &str) -> Result<CachedResponse, FetchError> {
        match self.network.fetch(url).await {
            Ok(fetched) => {
                debug!(url, "network-first: serving fresh network response");
                let response = CachedResponse::new(url, fetched.content_type, fetched.body);
                self.store(&response);
                Ok(response)
            }
            Err(network_error) => match self.from_cache(url) {
                Some(cached) => {
                    debug!(url, error = %network_error, "network-first: network failed, serving cached response");
                    Ok(cached)
                }
                None => {
                    debug!(url, error = %network_error, "network-first: network failed with no cached fallback");
                    Err(network_error)
                }
            },
        }
    }

    async fn cache_first(&self, url: &str) -> Result<CachedResponse, FetchError> {
        if let Some(cached) = self.from_cache(url) {
            debug!(url, age_minutes = cached.age_minutes(), "cache-first: serving cached response");
            return Ok(cached);
        }

        let fetched = self.network.fetch(url).await?;
        debug!(url, "cache-first: cache miss, serving network response");
        let response = CachedResponse::new(url, fetched.content_type, fetched.body);
        self.store(&response);
        Ok(response)
    }

    async fn passthrough(&self, url: &str) -> Result<CachedResponse, FetchError> {
        let fetched = self.network.fetch(url).await?;
        Ok(CachedResponse::new(url, fetched.content_type, fetched.body))
    }

    /// Cache read errors are treated as a miss.
    fn from_cache(&self, key: &str) -> Option<CachedResponse> {
        match self.cache.get(key) {
            Ok(hit) => hit,
            Err(error) => {
                debug!(key, error = %error, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Cache write errors do not fail the response being served.
    fn store(&self, response: &CachedResponse) {
        if let Err(error) = self.cache.put(response) {
            warn!(url = %response.url, error = %error, "failed to write response to cache");
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Successful registration outcome.
pub struct Registration {
    pub scope: String,
    pub client: WorkerClient,
}

/// Page-side fetch handle that follows the currently active worker. A handle
/// created before registration starts working the moment a worker activates
/// and claims it.
#[derive(Clone)]
pub struct Controller {
    active: Arc<RwLock<Option<WorkerClient>>>,
}

impl Controller {
    pub async fn fetch(&self, request: FetchRequest) -> Result<CachedResponse, FetchError> {
        let client = self.active.read().await.clone();
        match client {
            Some(client) => client.fetch(request).await,
            None => Err(FetchError::NotControlled),
        }
    }
}

/// Capability gate and registration entry point.
pub struct WorkerRegistry {
    enabled: bool,
    cache_dir: PathBuf,
    shell_document: PathBuf,
    precache: Vec<String>,
    network: Arc<dyn Network>,
    active: Arc<RwLock<Option<WorkerClient>>>,
}

impl WorkerRegistry {
    pub fn new(network: Arc<dyn Network>, cache_dir: PathBuf, shell_document: PathBuf) -> Self {
        Self {
            enabled: true,
            cache_dir,
            shell_document,
            precache: Vec::new(),
            network,
            active: Arc::new(RwLock::new(None)),
        }
    }

    /// Extra URLs to precache at install time.
    pub fn with_precache(mut self, urls: Vec<String>) -> Self {
        self.precache = urls;
        self
    }

    /// Turn worker support off; `register` is then never called by the shell.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Worker capability check.
    pub fn is_supported(&self) -> bool {
        self.enabled
    }

    /// Fetch handle for a page client.
    pub fn controller(&self) -> Controller {
        Controller {
            active: Arc::clone(&self.active),
        }
    }

    /// Install and activate a worker for `script`. The new worker skips the
    /// waiting phase and claims all existing clients immediately.
    pub async fn register(&self, script: &str) -> Result<Registration> {
        let scope = scope_for(script);
        debug!(script, scope = %scope, "installing cache worker");

        let cache = ResponseCache::new(self.cache_dir.clone())?;
        self.precache_assets(&cache).await?;
        let routes = default_table(&self.precache);
        debug!(routes = routes.len(), "route table installed");

        let (tx, rx) = mpsc::channel(FETCH_CHANNEL_SIZE);
        let worker = CacheWorker {
            routes,
            cache,
            network: Arc::clone(&self.network),
        };
        tokio::spawn(worker.run(rx));

        // Activation: skip the waiting phase and claim open clients.
        let client = WorkerClient { tx };
        *self.active.write().await = Some(client.clone());
        info!(scope = %scope, "cache worker activated, clients claimed");

        Ok(Registration { scope, client })
    }

    /// Install-time precache: the shell document from the build output on
    /// disk, plus every declared manifest URL from the network.
    async fn precache_assets(&self, cache: &ResponseCache) -> Result<()> {
        let shell = std::fs::read(&self.shell_document).with_context(|| {
            format!(
                "Failed to read shell document {}",
                self.shell_document.display()
            )
        })?;
        cache.put(&CachedResponse::new(
            SHELL_DOCUMENT,
            Some("text/html".to_string()),
            shell,
        ))?;

        for url in &self.precache {
            let fetched = self
                .network
                .fetch(url)
                .await
                .map_err(|error| anyhow!("Failed to precache {}: {}", url, error))?;
            cache.put(&CachedResponse::new(
                url.clone(),
                fetched.content_type,
                fetched.body,
            ))?;
        }

        debug!(entries = self.precache.len() + 1, "precache complete");
        Ok(())
    }
}

/// Registration scope: the directory of the worker script.
fn scope_for(script: &str) -> String {
    match script.rfind('/') {
        Some(idx) => script[..=idx].to_string(),
        None => "/".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
