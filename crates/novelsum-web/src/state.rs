use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use novelsum_core::{Config, GraphRankSummarizer, NeuralSummarizer, PdfBackend, Session};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub config: Config,
    pub pdf_backend: Arc<dyn PdfBackend>,
    pub neural: NeuralSummarizer,
    pub graph_rank: GraphRankSummarizer,
    pub sessions: DashMap<String, Session>,
}

impl AppState {
    pub fn new(
        config: Config,
        pdf_backend: Arc<dyn PdfBackend>,
        neural: NeuralSummarizer,
        graph_rank: GraphRankSummarizer,
    ) -> Self {
        Self {
            config,
            pdf_backend,
            neural,
            graph_rank,
            sessions: DashMap::new(),
        }
    }

    /// Register a fresh session and return its id.
    pub fn create_session(&self) -> String {
        self.evict_idle(self.config.session_ttl());
        let id = loop {
            let candidate = new_session_id();
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        self.sessions
            .insert(id.clone(), Session::new(self.config.default_params));
        tracing::debug!(session = %id, active = self.sessions.len(), "session created");
        id
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many went.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.idle_for() <= ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle sessions");
        }
        evicted
    }
}

/// 128-bit random id, hex encoded.
fn new_session_id() -> String {
    format!("{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..))
}

/// Periodically evict idle sessions until the runtime shuts down.
pub fn spawn_session_reaper(state: Arc<AppState>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            state.evict_idle(state.config.session_ttl());
        }
    })
}
