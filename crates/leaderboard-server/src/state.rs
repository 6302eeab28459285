use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use leaderboard_core::ScoreStore;
use tracing::info;

pub type SharedState = Arc<AppState>;

/// State shared by every request handler
#[derive(Debug)]
pub struct AppState {
    store: Mutex<ScoreStore>,
    started: Instant,
}

impl AppState {
    pub fn new(store: ScoreStore) -> SharedState {
        Arc::new(Self {
            store: Mutex::new(store),
            started: Instant::now(),
        })
    }

    /// Exclusive access to the store.
    ///
    /// Hold the guard for the whole operation so the snapshot write of a
    /// mutation is never interleaved with another request. A request that
    /// panicked while holding the lock leaves the store usable: mutations
    /// only append or clear after validation, so the records stay consistent.
    pub fn store(&self) -> MutexGuard<'_, ScoreStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seconds since the state was created
    pub fn uptime(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Final best-effort snapshot write
    pub fn flush(&self) -> bool {
        let store = self.store();
        info!("Saving {} scores before shutdown...", store.len());
        store.flush()
    }
}
