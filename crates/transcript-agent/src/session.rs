use std::sync::{Arc, Mutex};

/// Opaque resumption token for the upstream conversation.
///
/// Lifecycle: unset, then captured from the first lifecycle-init event of a
/// turn, reused for every later query, and cleared explicitly when the
/// conversation is reset. The handle is shared between the service and its
/// query tasks; only the query task writes to it.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Option<String>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session id, when one has been captured.
    pub fn get(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Records the id announced by a lifecycle-init event.
    pub fn capture(&self, session_id: impl Into<String>) {
        *self.lock() = Some(session_id.into());
    }

    /// Forgets the session so the next query starts a fresh conversation.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_and_clear_follow_the_lifecycle() {
        let session = SessionHandle::new();
        assert_eq!(session.get(), None);
        session.capture("sess-1");
        assert_eq!(session.get(), Some("sess-1".to_string()));
        session.capture("sess-2");
        assert_eq!(session.get(), Some("sess-2".to_string()));
        session.clear();
        assert_eq!(session.get(), None);
    }

    #[test]
    fn clones_share_the_same_state() {
        let session = SessionHandle::new();
        let shared = session.clone();
        shared.capture("sess-1");
        assert_eq!(session.get(), Some("sess-1".to_string()));
    }
}
