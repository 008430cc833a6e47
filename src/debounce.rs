use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::types::SourceResult;

/// The result set currently shown to the user, with the text that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub query: String,
    pub sources: Vec<SourceResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Pending,
}

/// Turns a stream of input changes into at most one query per quiet period.
///
/// Each change cancels the previously scheduled (not yet fired) query. A fired
/// query runs to completion in the background, but its results are committed
/// only if no newer input arrived in the meantime.
pub struct QueryController<S> {
    quiet: Duration,
    search: Arc<S>,
    timer: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
    committed: Arc<watch::Sender<Option<Arc<ResultSet>>>>,
}

impl<S, Fut> QueryController<S>
where
    S: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<SourceResult>> + Send + 'static,
{
    pub fn new(quiet: Duration, search: S) -> Self {
        let (committed, _) = watch::channel(None);
        Self {
            quiet,
            search: Arc::new(search),
            timer: None,
            generation: Arc::new(AtomicU64::new(0)),
            committed: Arc::new(committed),
        }
    }

    /// Watch the committed result set. Every commit fully replaces the previous one.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ResultSet>>> {
        self.committed.subscribe()
    }

    pub fn state(&self) -> State {
        match &self.timer {
            Some(timer) if !timer.is_finished() => State::Pending,
            _ => State::Idle,
        }
    }

    /// Record an input change. Empty text schedules nothing.
    pub fn input(&mut self, text: &str) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if text.is_empty() {
            return;
        }

        let query = text.to_string();
        let quiet = self.quiet;
        let search = Arc::clone(&self.search);
        let latest = Arc::clone(&self.generation);
        let committed = Arc::clone(&self.committed);

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            tracing::debug!("Firing query #{generation}");
            // Detached so that later input only cancels the timer, never the request.
            tokio::spawn(async move {
                let sources = (*search)(query.clone()).await;
                committed.send_if_modified(|current| {
                    if latest.load(Ordering::SeqCst) != generation {
                        tracing::debug!("Dropping results of superseded query #{generation}");
                        return false;
                    }
                    tracing::info!("Committing {} source results", sources.len());
                    *current = Some(Arc::new(ResultSet { query, sources }));
                    true
                });
            });
        }));
    }
}

impl<S> Drop for QueryController<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
