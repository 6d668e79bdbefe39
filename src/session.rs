//! Search session state and the controller that drives paging.
//!
//! Every command is split in two: a synchronous `begin_*` that performs the
//! state transition and hands out a [`FetchTicket`], and [`complete`] which
//! applies the fetch outcome. The event loop runs tickets on spawned tasks;
//! `start_search` / `load_next_page` compose both halves for direct callers.
//!
//! Each ticket carries the generation it was issued under. A new search or a
//! reset bumps the generation, so a page that lands after it was superseded
//! is dropped instead of overwriting the newer session.
//!
//! [`complete`]: PaginationController::complete

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::forge::IssueFetcher;
use crate::types::{Credential, Issue, Page, RepositorySpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Everything the presentation layer renders. Only the controller writes it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub spec: Option<RepositorySpec>,
    pub credential: Option<Credential>,
    pub issues: Vec<Issue>,
    pub status: Status,
    pub error: Option<String>,
    pub next_page: Option<String>,
}

impl SessionState {
    pub fn has_more(&self) -> bool {
        self.status == Status::Ready && self.next_page.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Replaces whatever the session held.
    FirstPage,
    /// Appended after the issues already loaded.
    NextPage,
}

/// A fetch the controller has committed to. Run it, then hand the outcome
/// back through [`PaginationController::complete`] with `generation`.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub spec: RepositorySpec,
    pub credential: Option<Credential>,
    pub continuation: Option<String>,
}

impl FetchTicket {
    pub async fn run(&self, fetcher: &dyn IssueFetcher) -> Result<Page> {
        fetcher
            .fetch_page(
                &self.spec,
                self.credential.as_ref(),
                self.continuation.as_deref(),
            )
            .await
    }
}

pub struct PaginationController {
    fetcher: Arc<dyn IssueFetcher>,
    state: SessionState,
    generation: u64,
    in_flight: Option<FetchKind>,
}

impl std::fmt::Debug for PaginationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationController")
            .field("status", &self.state.status)
            .field("issues", &self.state.issues.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl PaginationController {
    pub fn new(fetcher: Arc<dyn IssueFetcher>) -> Self {
        Self {
            fetcher,
            state: SessionState::default(),
            generation: 0,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn fetcher(&self) -> Arc<dyn IssueFetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Validate `raw` as `owner/name` and start a fresh session.
    ///
    /// Malformed input moves straight to `Error` without a fetch. Any
    /// session in progress, including one still loading, is superseded.
    pub fn begin_search(
        &mut self,
        raw: &str,
        credential: Option<Credential>,
    ) -> Option<FetchTicket> {
        self.generation += 1;
        self.in_flight = None;

        let spec = match RepositorySpec::parse(raw) {
            Ok(spec) => spec,
            Err(e) => {
                debug!(input = raw, "rejected repository input");
                self.state = SessionState {
                    status: Status::Error,
                    error: Some(e.to_string()),
                    ..SessionState::default()
                };
                return None;
            }
        };

        info!(repo = %spec, generation = self.generation, "starting issue search");
        self.state = SessionState {
            spec: Some(spec.clone()),
            credential: credential.clone(),
            status: Status::Loading,
            ..SessionState::default()
        };
        self.in_flight = Some(FetchKind::FirstPage);

        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::FirstPage,
            spec,
            credential,
            continuation: None,
        })
    }

    /// Request the page after the last one loaded. No-op unless the session
    /// is `Ready` with a continuation.
    pub fn begin_next_page(&mut self) -> Option<FetchTicket> {
        if self.state.status != Status::Ready {
            return None;
        }
        let continuation = self.state.next_page.clone()?;
        let spec = self.state.spec.clone()?;

        self.generation += 1;
        self.state.status = Status::Loading;
        self.in_flight = Some(FetchKind::NextPage);
        debug!(repo = %spec, generation = self.generation, "loading next page");

        Some(FetchTicket {
            generation: self.generation,
            kind: FetchKind::NextPage,
            spec,
            credential: self.state.credential.clone(),
            continuation: Some(continuation),
        })
    }

    /// Apply a fetch outcome. Returns `false` when the outcome belongs to a
    /// superseded request and was discarded.
    pub fn complete(&mut self, generation: u64, outcome: Result<Page>) -> bool {
        if generation != self.generation || self.state.status != Status::Loading {
            debug!(
                generation,
                current = self.generation,
                "discarding stale page result"
            );
            return false;
        }
        let kind = self.in_flight.take().unwrap_or(FetchKind::FirstPage);

        match outcome {
            Ok(page) => {
                match kind {
                    FetchKind::FirstPage => self.state.issues = page.issues,
                    FetchKind::NextPage => self.state.issues.extend(page.issues),
                }
                self.state.next_page = page.next_page;
                self.state.error = None;
                self.state.status = Status::Ready;
            }
            Err(e) => {
                // A failed page forgets the whole session, not just the tail.
                info!(error = %e, ?kind, "issue fetch failed");
                self.state.issues.clear();
                self.state.next_page = None;
                self.state.error = Some(e.to_string());
                self.state.status = Status::Error;
            }
        }
        true
    }

    /// Return to idle. Refused while a fetch is in flight.
    pub fn reset(&mut self) -> bool {
        if self.state.status == Status::Loading {
            return false;
        }
        self.generation += 1;
        self.in_flight = None;
        self.state = SessionState::default();
        true
    }

    pub async fn start_search(&mut self, raw: &str, credential: Option<Credential>) {
        if let Some(ticket) = self.begin_search(raw, credential) {
            let outcome = ticket.run(self.fetcher.as_ref()).await;
            self.complete(ticket.generation, outcome);
        }
    }

    pub async fn load_next_page(&mut self) {
        if let Some(ticket) = self.begin_next_page() {
            let outcome = ticket.run(self.fetcher.as_ref()).await;
            self.complete(ticket.generation, outcome);
        }
    }
}
