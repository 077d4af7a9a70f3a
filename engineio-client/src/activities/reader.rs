//! The reader activity: pulls packets from the current transport and
//! dispatches them — keepalive PING/PONG handling, application messages,
//! and server-initiated CLOSE.
//!
//! Grounded on `original_source/engineio/client.py`'s `read_loop` (both the
//! polling and websocket variants share this dispatch table) and on the
//! teacher's `forward_to_handler` in `engineioxide/src/transport/ws.rs` for
//! the receive-then-dispatch shape.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::packet::Packet;
use crate::session::{Client, SessionState};

pub(crate) async fn run(client: Arc<Client>) {
    let Some(transport) = client.current_transport() else { return };

    while client.state() == SessionState::Connected {
        match transport.recv().await {
            Ok(packets) => {
                for packet in packets {
                    dispatch(&client, packet).await;
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("reader lost the transport: {err}");
                client.fatal_reset().await;
                break;
            }
        }
    }

    // Defensive: preserved from the original's `if self.state == 'connected':
    // self.disconnect()` safety net on loop exit. In practice every break
    // path above has already moved state off CONNECTED, so this rarely
    // fires; `join_reader: false` avoids the reader awaiting its own handle.
    if client.state() == SessionState::Connected {
        client.disconnect_inner(false, false).await;
    }

    if let Some(handle) = client.take_writer_handle() {
        let _ = handle.await;
    }
}

/// Applies one inbound packet's effect: delivered to `run`'s receive loop,
/// and reused by `Client::connect` to dispatch packets bundled into the
/// polling handshake response after the CONNECTED transition (§4.1 point 3).
pub(crate) async fn dispatch(client: &Arc<Client>, packet: Packet) {
    match packet {
        Packet::Message(data) => client.deliver_message(data),
        Packet::Pong(_) => {
            if let Some(flag) = client.pong_pending() {
                flag.store(false, Ordering::SeqCst);
            }
        }
        Packet::Noop => {}
        Packet::Open(_) | Packet::Close | Packet::Ping(_) | Packet::Upgrade => {
            #[cfg(feature = "tracing")]
            tracing::error!("unexpected {} packet from server after connect", packet.packet_type());
        }
    }
}
