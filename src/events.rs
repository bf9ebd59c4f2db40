//! Client events
//!
//! Lets the application layer react to logging, session changes and
//! navigation requests without the core knowing about any UI.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use crate::auth::{NavigationIntent, UserInfo};
use crate::http::RequestLogEntry;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The application asked for it
    UserRequested,
    /// A refresh could not be performed or was rejected
    RefreshFailed,
    /// A request was still unauthorized after a successful refresh
    RetryRejected,
}

/// Something that happened inside the client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A request/response pair was appended to the request log
    RequestLogged(RequestLogEntry),
    /// Login stored new credentials
    LoggedIn(Option<UserInfo>),
    /// A refresh stored a new access token
    TokenRefreshed,
    /// Stored credentials were cleared
    LoggedOut(LogoutReason),
    /// The application should navigate
    Navigate(NavigationIntent),
}

/// Callback type for client events
pub type EventCallback = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Registry of event callbacks
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<EventCallback>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for every future event
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(Arc::new(callback)),
            Err(_) => tracing::error!("Event listener registry poisoned; callback dropped"),
        }
    }

    /// Delivers an event to every callback
    ///
    /// Callbacks run without the registry locked, so they may subscribe.
    /// A panicking callback is logged and skipped.
    pub fn emit(&self, event: ClientEvent) {
        let listeners: Vec<EventCallback> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(_) => {
                tracing::error!("Event listener registry poisoned; event dropped");
                return;
            }
        };

        for listener in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                tracing::error!("Event callback panicked while handling {:?}", event);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[test]
    fn test_emit_reaches_all_listeners() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let count = count.clone();
            bus.subscribe(move |event| {
                if *event == ClientEvent::TokenRefreshed {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        bus.emit(ClientEvent::TokenRefreshed);
        assert_eq!(bus.listener_count(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = count.clone();

        bus.subscribe(|_| panic!("listener bug"));
        bus.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(ClientEvent::LoggedOut(LogoutReason::UserRequested));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_subscribe_while_handling() {
        let bus = Arc::new(EventBus::new());
        let registered = Arc::new(AtomicBool::new(false));

        let inner_bus = Arc::downgrade(&bus);
        let flag = registered.clone();
        bus.subscribe(move |_| {
            if let Some(bus) = inner_bus.upgrade() {
                if !flag.swap(true, Ordering::SeqCst) {
                    bus.subscribe(|_| {});
                }
            }
        });

        bus.emit(ClientEvent::TokenRefreshed);
        assert!(registered.load(Ordering::SeqCst));
        assert_eq!(bus.listener_count(), 2);
    }
}
