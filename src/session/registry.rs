use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Held for the whole load-mutate-save span of one turn.
pub type SessionGuard = OwnedMutexGuard<()>;

/// Keyed single-writer guards: at most one turn per session id runs at a
/// time, while different ids proceed independently.
#[derive(Default)]
pub struct SessionRegistry {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Entries only the map references have no holder and no waiter.
        locks.retain(|key, lock| key == session_id || Arc::strong_count(lock) > 1);

        locks
            .entry(session_id.to_owned())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        self.slot(session_id).lock_owned().await
    }

    /// Number of tracked session ids.
    pub fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}
