//! Request lifecycle for one search box.
//!
//! State lives in a `watch` channel so any number of renderers can follow it.
//! Every submission takes a fresh generation number; an outcome is applied
//! only while its generation is still the newest one handed out, so a slow
//! response to an old query can never clobber a newer one.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::{SearchResult, SearchService};
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Succeeded(SearchResult),
    Failed(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn result(&self) -> Option<&SearchResult> {
        match self {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Generation tag of a submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

pub struct SearchOrchestrator {
    service: Arc<dyn SearchService>,
    state: watch::Sender<RequestState>,
    latest: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(service: Arc<dyn SearchService>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            service,
            state,
            latest: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn latest_generation(&self) -> Generation {
        Generation(self.latest.load(Ordering::SeqCst))
    }

    /// Run one query to completion and return its generation.
    pub async fn submit_query(&self, query: impl Into<String>) -> Generation {
        let guard = LoadingGuard::new(self, self.begin());
        guard.run(query.into()).await
    }

    /// Like `submit_query`, but the state is already `Loading` when this
    /// returns and the call itself runs on a spawned task. Aborting the
    /// handle, even before the task first runs, clears the loading state.
    pub fn spawn_query(self: &Arc<Self>, query: impl Into<String>) -> JoinHandle<Generation> {
        let guard = LoadingGuard::new(self.clone(), self.begin());
        let query = query.into();
        tokio::spawn(guard.run(query))
    }

    /// Move to `Loading` under a new generation, dropping any earlier result
    /// or error.
    pub fn begin(&self) -> Generation {
        let mut generation = Generation(0);
        self.state.send_modify(|state| {
            generation = Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
            *state = RequestState::Loading;
        });
        generation
    }

    /// Apply an outcome if `generation` is still current. Returns whether it
    /// was applied.
    pub fn complete(
        &self,
        generation: Generation,
        outcome: Result<SearchResult, SearchError>,
    ) -> bool {
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != generation.0 {
                return false;
            }
            *state = match outcome {
                Ok(result) => RequestState::Succeeded(result),
                Err(err) => RequestState::Failed(err.user_message()),
            };
            true
        });

        if !applied {
            tracing::debug!(
                generation = generation.0,
                latest = self.latest.load(Ordering::SeqCst),
                "discarding stale search response"
            );
            return false;
        }
        match &*self.state.borrow() {
            RequestState::Succeeded(result) => tracing::info!(
                generation = generation.0,
                sources = result.sources.len(),
                "search succeeded"
            ),
            RequestState::Failed(message) => {
                tracing::warn!(generation = generation.0, %message, "search failed")
            }
            _ => {}
        }
        true
    }

    /// Back to `Idle` if `generation` is current and still loading.
    fn abandon(&self, generation: Generation) {
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) == generation.0 && state.is_loading() {
                *state = RequestState::Idle;
                true
            } else {
                false
            }
        });
    }
}

/// Owns one in-flight query. Dropped without finishing, it puts the state
/// back to `Idle` if that query is still the current one.
struct LoadingGuard<O>
where
    O: Deref<Target = SearchOrchestrator>,
{
    orchestrator: O,
    generation: Generation,
    armed: bool,
}

impl<O> LoadingGuard<O>
where
    O: Deref<Target = SearchOrchestrator>,
{
    fn new(orchestrator: O, generation: Generation) -> Self {
        Self {
            orchestrator,
            generation,
            armed: true,
        }
    }

    async fn run(mut self, query: String) -> Generation {
        let generation = self.generation;
        tracing::info!(generation = generation.0, %query, "search started");

        let outcome = self.orchestrator.service.search(&query).await;
        self.armed = false;

        self.orchestrator.complete(generation, outcome);
        generation
    }
}

impl<O> Drop for LoadingGuard<O>
where
    O: Deref<Target = SearchOrchestrator>,
{
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(generation = self.generation.0, "search dropped before completion");
            self.orchestrator.abandon(self.generation);
        }
    }
}
