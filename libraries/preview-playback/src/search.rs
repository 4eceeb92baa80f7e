//! Catalog search
//!
//! Wraps a [`CatalogSource`] with the player's search policy:
//! - empty queries never reach the catalog
//! - catalog failures become an empty result set with a notice for the user
//! - results are capped at the configured limit
//! - typed queries are debounced; a newer query supersedes a pending one

use crate::config::PlayerConfig;
use preview_core::{CatalogSource, Track};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of one search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query as searched (trimmed)
    pub query: String,

    /// Matching tracks, in catalog order
    pub tracks: Vec<Track>,

    /// Non-fatal message for the user, set when the catalog failed
    pub notice: Option<String>,
}

impl SearchResults {
    fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            ..Default::default()
        }
    }
}

struct SearchInner {
    catalog: Arc<dyn CatalogSource>,
    limit: usize,
    debounce: Duration,
    results_tx: watch::Sender<SearchResults>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// Search front-end over a catalog
#[derive(Clone)]
pub struct SearchService {
    inner: Arc<SearchInner>,
}

impl SearchService {
    /// Create a search service using the limits and debounce from `config`
    pub fn new(catalog: Arc<dyn CatalogSource>, config: &PlayerConfig) -> Self {
        let (results_tx, _) = watch::channel(SearchResults::default());
        Self {
            inner: Arc::new(SearchInner {
                catalog,
                limit: config.search_limit,
                debounce: config.search_debounce(),
                results_tx,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Run a search right away, without publishing it
    pub async fn search(&self, query: &str) -> SearchResults {
        let query = query.trim();
        if query.is_empty() {
            return SearchResults::empty(query);
        }

        match self.inner.catalog.search(query).await {
            Ok(mut tracks) => {
                tracks.truncate(self.inner.limit);
                debug!(query, count = tracks.len(), "Search completed");
                SearchResults {
                    query: query.to_string(),
                    tracks,
                    notice: None,
                }
            }
            Err(e) => {
                warn!(query, error = %e, "Catalog search failed, showing no results");
                SearchResults {
                    notice: Some(format!("Search failed: {e}")),
                    ..SearchResults::empty(query)
                }
            }
        }
    }

    /// Cancel any pending debounced search, search now, and publish
    pub async fn search_now(&self, query: &str) -> SearchResults {
        self.cancel_pending();
        let results = self.search(query).await;
        self.inner.results_tx.send_replace(results.clone());
        results
    }

    /// Schedule a debounced search for a query being typed
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, query: impl Into<String>) {
        let query = query.into();
        let service = self.clone();
        let debounce = self.inner.debounce;

        let mut pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let results = service.search(&query).await;
            service.inner.results_tx.send_replace(results);
        }));
    }

    /// Latest published results
    pub fn results(&self) -> SearchResults {
        self.inner.results_tx.borrow().clone()
    }

    /// Observe published results
    pub fn watch_results(&self) -> watch::Receiver<SearchResults> {
        self.inner.results_tx.subscribe()
    }

    fn cancel_pending(&self) {
        let pending = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pending) = pending {
            pending.abort();
        }
    }
}
