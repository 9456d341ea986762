//! Event listener registry.
//!
//! Listeners are registered per event type or for every event. Each dispatch
//! pass works on a snapshot of the table, so listeners may register or
//! unregister others (or themselves) while an event is being delivered.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chatlink::{Dispatcher, Event, Result};
//!
//! let dispatcher = Arc::new(Dispatcher::new());
//! let id = dispatcher.on("message-created", |event: Arc<Event>| async move {
//!     println!("{}", event.require_message()?.content);
//!     Ok(())
//! });
//! dispatcher.off(id);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::ListenerId;
use crate::protocol::Event;

// ============================================================================
// EventListener
// ============================================================================

/// Receives dispatched events.
///
/// Implemented for every `Fn(Arc<Event>) -> impl Future<Output = Result<()>>`.
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    /// Handles one event.
    ///
    /// An error or a panic is logged by the dispatcher and does not affect
    /// other listeners.
    async fn on_event(&self, event: Arc<Event>) -> Result<()>;
}

#[async_trait]
impl<F, Fut> EventListener for F
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn on_event(&self, event: Arc<Event>) -> Result<()> {
        self(event).await
    }
}

// ============================================================================
// Types
// ============================================================================

/// One registered listener.
#[derive(Clone)]
struct Registration {
    id: ListenerId,
    /// `None` matches every event type.
    event_type: Option<String>,
    listener: Arc<dyn EventListener>,
}

impl Registration {
    fn matches(&self, event_type: &str) -> bool {
        self.event_type.as_deref().is_none_or(|t| t == event_type)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes events to registered listeners.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`; share it through an `Arc` between the
/// session engine, the webhook server and application code.
#[derive(Default)]
pub struct Dispatcher {
    /// Copy-on-write listener table, in registration order.
    listeners: RwLock<Arc<Vec<Registration>>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event type.
    pub fn on(&self, event_type: impl Into<String>, listener: impl EventListener) -> ListenerId {
        self.register(Some(event_type.into()), Arc::new(listener))
    }

    /// Registers a listener for every event.
    pub fn on_any(&self, listener: impl EventListener) -> ListenerId {
        self.register(None, Arc::new(listener))
    }

    /// Unregisters a listener.
    ///
    /// Returns `false` if the id was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut guard = self.listeners.write();
        if !guard.iter().any(|r| r.id == id) {
            return false;
        }

        let remaining: Vec<_> = guard.iter().filter(|r| r.id != id).cloned().collect();
        *guard = Arc::new(remaining);
        debug!(%id, "Listener removed");
        true
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers an event to every matching listener, in registration order.
    ///
    /// Listeners run one after another. Every failure is logged; the first
    /// one is returned after all listeners ran. A panicking listener counts
    /// as a failure.
    ///
    /// # Errors
    ///
    /// Returns the first listener error, or [`Error::ListenerPanic`].
    pub async fn dispatch(&self, event: Event) -> Result<()> {
        let snapshot = Arc::clone(&self.listeners.read());
        let event = Arc::new(event);
        let mut first_error = None;

        for registration in snapshot.iter().filter(|r| r.matches(&event.event_type)) {
            trace!(listener = %registration.id, event_id = event.id, "Dispatching");

            let outcome = AssertUnwindSafe(registration.listener.on_event(Arc::clone(&event)))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(Error::listener_panic(
                        registration.id.to_string(),
                        panic_message(payload.as_ref()),
                    ))
                });

            if let Err(e) = outcome {
                warn!(
                    listener = %registration.id,
                    event_id = event.id,
                    event_type = %event.event_type,
                    error = %e,
                    "Listener failed"
                );
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn register(&self, event_type: Option<String>, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = ListenerId::generate();
        let mut guard = self.listeners.write();

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(Registration {
            id,
            event_type,
            listener,
        });
        *guard = Arc::new(next);

        debug!(%id, "Listener registered");
        id
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;

    fn event(event_type: &str, id: u64) -> Event {
        Event {
            id,
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Box<dyn EventListener>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);
        let make = move |name: &'static str| -> Box<dyn EventListener> {
            let log = Arc::clone(&shared);
            Box::new(move |event: Arc<Event>| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push(format!("{name}:{}", event.id));
                    Ok::<(), Error>(())
                }
            })
        };
        (log, make)
    }

    struct Boxed(Box<dyn EventListener>);

    #[async_trait]
    impl EventListener for Boxed {
        async fn on_event(&self, event: Arc<Event>) -> Result<()> {
            self.0.on_event(event).await
        }
    }

    #[tokio::test]
    async fn test_routes_by_type() {
        let dispatcher = Dispatcher::new();
        let (log, make) = recorder();
        dispatcher.on("message-created", Boxed(make("msg")));
        dispatcher.on_any(Boxed(make("any")));

        dispatcher
            .dispatch(event("message-created", 1))
            .await
            .expect("dispatch");
        dispatcher
            .dispatch(event("guild-added", 2))
            .await
            .expect("dispatch");

        assert_eq!(*log.lock(), ["msg:1", "any:1", "any:2"]);
    }

    #[tokio::test]
    async fn test_off() {
        let dispatcher = Dispatcher::new();
        let (log, make) = recorder();
        let id = dispatcher.on_any(Boxed(make("a")));
        assert_eq!(dispatcher.len(), 1);

        assert!(dispatcher.off(id));
        assert!(!dispatcher.off(id));
        assert!(dispatcher.is_empty());

        dispatcher.dispatch(event("x", 1)).await.expect("dispatch");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_others() {
        let dispatcher = Dispatcher::new();
        let (log, make) = recorder();
        dispatcher.on_any(|_event: Arc<Event>| async { Err::<(), _>(Error::transport("boom")) });
        dispatcher.on_any(Boxed(make("after")));

        let result = dispatcher.dispatch(event("x", 5)).await;
        assert!(matches!(result, Err(Error::Transport { .. })));
        assert_eq!(*log.lock(), ["after:5"]);
    }

    #[tokio::test]
    async fn test_register_during_dispatch_uses_snapshot() {
        let dispatcher = Arc::new(Dispatcher::new());
        let (log, make) = recorder();
        let make = Arc::new(make);

        let inner = Arc::clone(&dispatcher);
        let inner_make = Arc::clone(&make);
        dispatcher.on_any(move |_event: Arc<Event>| {
            let inner = Arc::clone(&inner);
            let inner_make = Arc::clone(&inner_make);
            async move {
                inner.on_any(Boxed((*inner_make)("late")));
                Ok::<(), Error>(())
            }
        });

        dispatcher.dispatch(event("x", 1)).await.expect("first pass");
        assert!(log.lock().is_empty());
        assert_eq!(dispatcher.len(), 2);

        dispatcher.dispatch(event("x", 2)).await.expect("second pass");
        assert_eq!(*log.lock(), ["late:2"]);
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_stop_others() {
        let dispatcher = Dispatcher::new();
        let (log, make) = recorder();
        dispatcher.on_any(|event: Arc<Event>| async move {
            if event.id == 9 {
                panic!("listener bug");
            }
            Ok::<(), Error>(())
        });
        dispatcher.on_any(Boxed(make("after")));

        let err = dispatcher.dispatch(event("x", 9)).await.unwrap_err();
        match err {
            Error::ListenerPanic { message, .. } => assert_eq!(message, "listener bug"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*log.lock(), ["after:9"]);

        dispatcher.dispatch(event("x", 10)).await.expect("healthy pass");
        assert_eq!(*log.lock(), ["after:9", "after:10"]);
    }
}
