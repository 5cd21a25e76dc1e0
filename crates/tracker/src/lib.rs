use chrono::Utc;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{error, info};

use shared::domain::SessionState;
use storage::{StateStore, StorageError};

pub mod balance;
pub mod dispatch;
pub mod mode;

pub use balance::{format_hms, recommend, Deficit, Recommendation};
pub use dispatch::{summary_report, Command, HELP_TEXT};
pub use mode::transition;

pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of wall-clock time as fractional Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Owns the session: every command runs load, transition and save while
/// holding one lock, so concurrent webhook deliveries cannot drop updates.
pub struct Tracker {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    session: Mutex<()>,
    storage_timeout: Duration,
}

impl Tracker {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            session: Mutex::new(()),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Runs `text` as a command at the instant `now` and returns the reply.
    pub async fn handle(&self, text: &str, now: f64) -> Result<String, StorageError> {
        let _session = self.session.lock().await;
        self.apply(Command::parse(text), now).await
    }

    /// Like [`Tracker::handle`], reading the clock once the session lock is held.
    pub async fn handle_now(&self, text: &str) -> Result<String, StorageError> {
        let _session = self.session.lock().await;
        let now = self.clock.now();
        self.apply(Command::parse(text), now).await
    }

    /// Current state with elapsed time flushed in, without persisting it.
    pub async fn snapshot(&self) -> Result<SessionState, StorageError> {
        let _session = self.session.lock().await;
        let state = self.timed("load", self.store.load()).await?;
        let (state, _) = transition(state, self.clock.now(), None);
        Ok(state)
    }

    pub async fn reset(&self) -> Result<(), StorageError> {
        let _session = self.session.lock().await;
        self.timed("reset", self.store.reset()).await?;
        info!(store = %self.store.describe(), "session reset");
        Ok(())
    }

    async fn apply(&self, command: Command, now: f64) -> Result<String, StorageError> {
        let state = self.timed("load", self.store.load()).await?;
        let (next, event) = transition(state, now, command.requested_mode());
        self.timed("save", self.store.save(&next)).await?;

        info!(?command, mode = ?next.mode, "command applied");
        let reply = match command {
            Command::Switch(switched) => event.unwrap_or_else(|| mode::confirmation(switched)),
            Command::Summary => summary_report(&next),
            Command::Help => HELP_TEXT.to_string(),
        };
        Ok(reply)
    }

    async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        let result = match tokio::time::timeout(self.storage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                operation,
                timeout_ms: u64::try_from(self.storage_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };
        if let Err(error) = &result {
            error!(operation, store = %self.store.describe(), %error, "session storage failed");
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
