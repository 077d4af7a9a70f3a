//! The outbound packet queue: a thread-safe FIFO with blocking recv,
//! non-blocking try-recv, and a task-done/join facility — the async
//! analogue of Python's `queue.Queue` + `queue.join()` used by the original
//! writer/disconnect pair.
//!
//! `None` is the sentinel `⊥`: "no more work, terminate the writer".

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, Mutex, Notify};

use crate::packet::Packet;

pub struct OutQueue {
    tx: mpsc::UnboundedSender<Option<Packet>>,
    rx: Mutex<mpsc::UnboundedReceiver<Option<Packet>>>,
    pending: AtomicUsize,
    drained: Notify,
}

impl OutQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Enqueue a packet (or the sentinel). Valid in any session state for
    /// the sentinel; callers are responsible for only enqueueing real
    /// packets while CONNECTED (see `Client::send`).
    pub fn enqueue(&self, item: Option<Packet>) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        // An unbounded channel only fails to send once every receiver has
        // been dropped, which only happens after the writer task has
        // already exited; nothing downstream is waiting on this item then.
        let _ = self.tx.send(item);
    }

    /// Block (with no timeout) for the next item.
    pub async fn recv(&self) -> Option<Option<Packet>> {
        self.rx.lock().await.recv().await
    }

    /// Take an item only if one is immediately available.
    pub async fn try_recv(&self) -> Option<Option<Packet>> {
        self.rx.lock().await.try_recv().ok()
    }

    /// Mark one previously-dequeued item as fully handled.
    pub fn ack(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Wait until every enqueued item so far has been acknowledged.
    ///
    /// `notified()` is captured before the pending count is checked, not
    /// after: `notify_waiters()` only wakes tasks already registered as
    /// waiters, so checking first and constructing the `Notified` future
    /// second would drop any `ack()` that lands in between, hanging forever.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}
