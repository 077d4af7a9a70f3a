//! The liveness prober: sends a keepalive PING once per `ping_interval` and
//! fails the session if the previous one was never answered with a PONG.
//!
//! Grounded on `original_source/engineio/client.py`'s `_ping_task`: check
//! pending → if still pending, the peer missed the last round trip, so this
//! is the one place liveness loss (§4.5 step 1) is detected and reacted to;
//! otherwise set pending and enqueue a PING, then sleep. The first PING goes
//! out immediately at connect time, with no leading sleep. `ping_timeout` is
//! not used here — it only bounds the writer's queue wait (§4.3).

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::packet::Packet;
use crate::session::{Client, SessionState};

pub(crate) async fn run(client: Arc<Client>) {
    let Some(queue) = client.queue() else { return };
    let Some(pong_pending) = client.pong_pending() else { return };
    let Some(ping_interval) = client.ping_interval() else { return };

    while client.state() == SessionState::Connected {
        if pong_pending.load(Ordering::SeqCst) {
            #[cfg(feature = "tracing")]
            tracing::error!("pong not received before next ping, aborting connection");
            client.fatal_reset().await;
            break;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("sending keepalive ping");
        pong_pending.store(true, Ordering::SeqCst);
        queue.enqueue(Some(Packet::Ping(None)));

        tokio::time::sleep(ping_interval).await;
    }
}
