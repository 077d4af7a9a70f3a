//! The three-slot event registry exposed to host applications.
//!
//! Grounded on `original_source/engineio/client.py`'s `Client.on`/
//! `_trigger_event`: registration is restricted to a fixed set of event
//! names, and invocation is always synchronous (§9 resolves the `run_async`
//! ambiguity present in the original in favor of always-synchronous).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;

use crate::packet::PacketData;

/// Data delivered to the `message` callback, preserving the text/binary
/// distinction carried by the wire packet.
#[derive(Debug, Clone)]
pub enum MessageData {
    Text(String),
    Binary(Bytes),
}

impl From<PacketData> for MessageData {
    fn from(data: PacketData) -> Self {
        match data {
            PacketData::Text(s) => MessageData::Text(s),
            PacketData::Binary(b) => MessageData::Binary(b),
        }
    }
}

type ConnectHandler = Arc<dyn Fn() + Send + Sync>;
type DisconnectHandler = Arc<dyn Fn() + Send + Sync>;
type MessageHandler = Arc<dyn Fn(MessageData) + Send + Sync>;

/// Holds up to one callback per event name. Mirrors the Python client's
/// `handlers` dict, specialized to Rust's lack of a single dynamically-typed
/// callback slot.
#[derive(Default, Clone)]
pub struct EventRegistry {
    connect: Option<ConnectHandler>,
    disconnect: Option<DisconnectHandler>,
    message: Option<MessageHandler>,
}

impl EventRegistry {
    pub fn on_connect<F>(&mut self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.connect = Some(Arc::new(handler));
    }

    pub fn on_disconnect<F>(&mut self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.disconnect = Some(Arc::new(handler));
    }

    pub fn on_message<F>(&mut self, handler: F)
    where
        F: Fn(MessageData) + Send + Sync + 'static,
    {
        self.message = Some(Arc::new(handler));
    }

    /// Invoke the `connect` callback, catching and logging any panic rather
    /// than letting it unwind into the caller (an application callback
    /// error must never take down a background activity).
    pub(crate) fn trigger_connect(&self) {
        if let Some(handler) = &self.connect {
            let handler = handler.clone();
            if std::panic::catch_unwind(AssertUnwindSafe(move || handler())).is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("connect handler panicked");
            }
        }
    }

    pub(crate) fn trigger_disconnect(&self) {
        if let Some(handler) = &self.disconnect {
            let handler = handler.clone();
            if std::panic::catch_unwind(AssertUnwindSafe(move || handler())).is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("disconnect handler panicked");
            }
        }
    }

    pub(crate) fn trigger_message(&self, data: MessageData) {
        if let Some(handler) = &self.message {
            let handler = handler.clone();
            if std::panic::catch_unwind(AssertUnwindSafe(move || handler(data))).is_err() {
                #[cfg(feature = "tracing")]
                tracing::error!("message handler panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn connect_handler_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let mut registry = EventRegistry::default();
        let fired2 = fired.clone();
        registry.on_connect(move || fired2.store(true, Ordering::SeqCst));
        registry.trigger_connect();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn message_handler_receives_data() {
        let received = Arc::new(AtomicUsize::new(0));
        let mut registry = EventRegistry::default();
        let received2 = received.clone();
        registry.on_message(move |data| {
            if let MessageData::Text(s) = data {
                received2.store(s.len(), Ordering::SeqCst);
            }
        });
        registry.trigger_message(MessageData::Text("hello".into()));
        assert_eq!(received.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn panicking_handler_does_not_propagate() {
        let mut registry = EventRegistry::default();
        registry.on_connect(|| panic!("boom"));
        registry.trigger_connect(); // must not panic the test
    }

    #[test]
    fn unset_handlers_are_no_ops() {
        let registry = EventRegistry::default();
        registry.trigger_connect();
        registry.trigger_disconnect();
        registry.trigger_message(MessageData::Text("x".into()));
    }
}
