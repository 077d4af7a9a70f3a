//! The transport abstraction: a tagged-variant capability set
//! `{ send_batch, recv_one, close }`, shared by the polling and websocket
//! implementations so the reader/writer activities never need per-transport
//! branches (see the design note on this in `SPEC_FULL.md` §9).

pub mod polling;
pub mod ws;

use async_trait::async_trait;

use crate::error::Error;
use crate::packet::Packet;

/// Which of the two interchangeable transports is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Polling,
    WebSocket,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Polling => f.write_str("polling"),
            TransportKind::WebSocket => f.write_str("websocket"),
        }
    }
}

/// Common capability set both transports provide once a session is live.
///
/// `send_batch` hands the writer's coalesced batch to the transport in one
/// call (a single POST for polling, one frame per packet for websocket).
/// `recv_one` pulls the next application-visible unit from the transport: a
/// whole decoded payload for polling (all packets in that response), or one
/// decoded packet for websocket.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    async fn send_batch(&self, packets: &[Packet]) -> Result<(), Error>;

    async fn recv(&self) -> Result<Vec<Packet>, Error>;

    async fn close(&self);
}
