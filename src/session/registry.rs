use std::sync::Arc;

use cached::{Cached, TimedCache};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::SessionState;

/// A session behind its own lock; interactions within one session are serialized.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Default time a session may sit unused before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3600;

/// Owns every live session, keyed by the id stored in the session cookie.
///
/// Each lookup restarts the session's idle clock. A session left unused for
/// longer than the idle timeout is dropped along with any data it loaded.
pub struct SessionRegistry {
    sessions: Mutex<TimedCache<Uuid, SharedSession>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT_SECS)
    }
}

impl SessionRegistry {
    pub fn new(idle_timeout_secs: u64) -> Self {
        Self {
            sessions: Mutex::new(TimedCache::with_lifespan_and_refresh(
                idle_timeout_secs,
                true,
            )),
        }
    }

    /// Returns the session for `id`, starting a new one when the id is
    /// missing, unknown or expired. The flag tells whether a session was created.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession, bool) {
        let mut sessions = self.sessions.lock().await;
        sessions.flush();

        if let Some(id) = id {
            if let Some(session) = sessions.cache_get(&id) {
                return (id, session.clone(), false);
            }
        }

        let id = Uuid::new_v4();
        let session: SharedSession = Arc::new(Mutex::new(SessionState::new()));
        sessions.cache_set(id, session.clone());
        debug!("Started session {}", id);
        (id, session, true)
    }

    /// Number of sessions that have not expired.
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        sessions.flush();
        sessions.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
