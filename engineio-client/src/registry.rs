//! The process-wide registry of connected sessions and its SIGINT hook.
//!
//! Grounded on `original_source/engineio/client.py`'s module-level
//! `connected_clients` list and `signal_handler`/`original_signal_handler`
//! dance. §9 of `SPEC_FULL.md` keeps both alternatives the original design
//! notes floated: the hook installs itself lazily on first `connect`, and is
//! also exposed as an explicit opt-in the host can call deterministically.

use std::sync::{Arc, Mutex, Once, Weak};

use once_cell::sync::Lazy;

use crate::session::Client;

static CONNECTED_CLIENTS: Lazy<Mutex<Vec<Weak<Client>>>> = Lazy::new(|| Mutex::new(Vec::new()));
static SIGINT_INSTALLED: Once = Once::new();

pub(crate) fn register(client: &Arc<Client>) {
    let mut clients = CONNECTED_CLIENTS.lock().unwrap();
    clients.retain(|w| w.strong_count() > 0);
    clients.push(Arc::downgrade(client));
}

pub(crate) fn unregister(client: &Arc<Client>) {
    let mut clients = CONNECTED_CLIENTS.lock().unwrap();
    clients.retain(|w| match w.upgrade() {
        Some(existing) => !Arc::ptr_eq(&existing, client),
        None => false,
    });
}

pub(crate) fn ensure_sigint_handler_installed() {
    SIGINT_INSTALLED.call_once(spawn_sigint_task);
}

/// Explicitly install the SIGINT hook, for hosts that would rather not rely
/// on the lazy on-first-connect installation. Safe to call more than once,
/// and safe to call before any client has connected.
pub fn install_sigint_handler() {
    SIGINT_INSTALLED.call_once(spawn_sigint_task);
}

fn spawn_sigint_task() {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        #[cfg(feature = "tracing")]
        tracing::info!("SIGINT received, disconnecting all connected clients");
        let clients: Vec<Arc<Client>> = {
            let guard = CONNECTED_CLIENTS.lock().unwrap();
            guard.iter().filter_map(Weak::upgrade).collect()
        };
        for client in clients {
            client.disconnect(true).await;
        }
        // Re-raise the default SIGINT disposition rather than silently
        // swallowing it, the nearest async equivalent of the original's
        // "chain to the previously installed handler".
        std::process::exit(130);
    });
}
