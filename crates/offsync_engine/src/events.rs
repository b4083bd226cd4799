//! Sync lifecycle hooks.
//!
//! Listeners observe (and may steer) the replay of individual sync log
//! entries. Dispatch is first-responder: listeners are consulted in
//! registration order and the first one to return an action wins.

use crate::error::EngineResult;
use offsync_http::{Request, Response};
use parking_lot::RwLock;

/// When a listener fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEventType {
    /// Before an entry's network replay.
    BeforeSyncRequest,
    /// After an entry's successful replay.
    SyncRequest,
}

/// Payload handed to listeners.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    /// Id of the sync log entry being replayed.
    pub request_id: String,
    /// The request (a clone; mutating it has no effect).
    pub request: Request,
    /// The server response, present for [`SyncEventType::SyncRequest`].
    pub response: Option<Response>,
}

/// What a listener wants the sync cycle to do.
#[derive(Debug, Clone)]
pub enum SyncAction {
    /// Abort the remaining replay; `sync()` resolves successfully.
    Stop,
    /// Drop this entry without a network call and continue.
    Skip,
    /// Replay this substitute request instead of the logged one.
    Replay(Request),
}

/// A sync lifecycle hook.
pub trait SyncEventListener: Send + Sync {
    /// Inspects an event. `Ok(None)` falls through to the next listener.
    fn on_event(&self, event: &SyncEvent) -> EngineResult<Option<SyncAction>>;
}

/// Handle for removing a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    event_type: SyncEventType,
    url_filter: Option<String>,
    listener: std::sync::Arc<dyn SyncEventListener>,
}

/// Ordered listener registry with per-listener URL filters.
#[derive(Default)]
pub struct ListenerRegistry {
    inner: RwLock<Registrations>,
}

#[derive(Default)]
struct Registrations {
    next_id: u64,
    entries: Vec<Registration>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event type.
    ///
    /// With a `url_filter`, the listener only sees events whose request
    /// URL contains the filter as a substring; `None` matches every URL.
    pub fn add_listener(
        &self,
        event_type: SyncEventType,
        listener: std::sync::Arc<dyn SyncEventListener>,
        url_filter: Option<&str>,
    ) -> ListenerId {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.entries.push(Registration {
            id,
            event_type,
            url_filter: url_filter.map(str::to_string),
            listener,
        });
        id
    }

    /// Removes a listener. Returns true if it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|r| r.id != id);
        inner.entries.len() != before
    }

    /// Dispatches an event to the first matching listener that returns an
    /// action.
    pub fn dispatch(
        &self,
        event_type: SyncEventType,
        event: &SyncEvent,
    ) -> EngineResult<Option<SyncAction>> {
        let listeners = {
            let inner = self.inner.read();
            inner
                .entries
                .iter()
                .filter(|r| r.event_type == event_type)
                .filter(|r| {
                    r.url_filter
                        .as_deref()
                        .map_or(true, |f| event.request.url.contains(f))
                })
                .map(|r| std::sync::Arc::clone(&r.listener))
                .collect::<Vec<_>>()
        };
        for listener in listeners {
            if let Some(action) = listener.on_event(event)? {
                return Ok(Some(action));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        action: Option<SyncAction>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(action: Option<SyncAction>) -> Arc<Self> {
            Arc::new(Self {
                action,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SyncEventListener for Scripted {
        fn on_event(&self, _event: &SyncEvent) -> EngineResult<Option<SyncAction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.action.clone())
        }
    }

    fn event(url: &str) -> SyncEvent {
        SyncEvent {
            request_id: "id".to_string(),
            request: Request::put(url),
            response: None,
        }
    }

    #[test]
    fn first_responder_wins() {
        let registry = ListenerRegistry::new();
        let first = Scripted::new(Some(SyncAction::Skip));
        let second = Scripted::new(Some(SyncAction::Stop));
        registry.add_listener(SyncEventType::BeforeSyncRequest, first.clone(), None);
        registry.add_listener(SyncEventType::BeforeSyncRequest, second.clone(), None);

        let action = registry
            .dispatch(SyncEventType::BeforeSyncRequest, &event("http://x/items"))
            .unwrap();
        assert!(matches!(action, Some(SyncAction::Skip)));
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn none_falls_through() {
        let registry = ListenerRegistry::new();
        let silent = Scripted::new(None);
        let stopper = Scripted::new(Some(SyncAction::Stop));
        registry.add_listener(SyncEventType::BeforeSyncRequest, silent.clone(), None);
        registry.add_listener(SyncEventType::BeforeSyncRequest, stopper, None);

        let action = registry
            .dispatch(SyncEventType::BeforeSyncRequest, &event("http://x/items"))
            .unwrap();
        assert!(matches!(action, Some(SyncAction::Stop)));
        assert_eq!(silent.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn url_filter_and_type_select_listeners() {
        let registry = ListenerRegistry::new();
        let items_only = Scripted::new(Some(SyncAction::Skip));
        let wrong_type = Scripted::new(Some(SyncAction::Stop));
        registry.add_listener(
            SyncEventType::BeforeSyncRequest,
            items_only.clone(),
            Some("/items"),
        );
        registry.add_listener(SyncEventType::SyncRequest, wrong_type.clone(), None);

        let action = registry
            .dispatch(SyncEventType::BeforeSyncRequest, &event("http://x/users"))
            .unwrap();
        assert!(action.is_none());

        let action = registry
            .dispatch(SyncEventType::BeforeSyncRequest, &event("http://x/items/1"))
            .unwrap();
        assert!(matches!(action, Some(SyncAction::Skip)));
        assert_eq!(wrong_type.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn removed_listener_is_not_consulted() {
        let registry = ListenerRegistry::new();
        let listener = Scripted::new(Some(SyncAction::Stop));
        let id = registry.add_listener(SyncEventType::BeforeSyncRequest, listener.clone(), None);

        assert!(registry.remove_listener(id));
        assert!(!registry.remove_listener(id));

        let action = registry
            .dispatch(SyncEventType::BeforeSyncRequest, &event("http://x"))
            .unwrap();
        assert!(action.is_none());
        assert_eq!(listener.calls.load(Ordering::SeqCst), 0);
    }
}
