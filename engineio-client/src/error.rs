//! Error types returned by the public API and used internally by the
//! background activities to decide when a session must be torn down.

use crate::packet::Packet;

/// Errors that can be produced while driving an Engine.IO client session.
///
/// Setup errors (everything up to and including [`Error::NoOpenPacket`]) are
/// surfaced synchronously from [`crate::Client::connect`]. The remaining
/// variants are only ever observed internally by a background activity, which
/// logs them and resets the session; they are not expected to reach an
/// application directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `connect` was called while the client was not in the `disconnected` state.
    #[error("client is already connected")]
    AlreadyConnected,

    /// None of the requested transports are supported by this client.
    #[error("no valid transport provided")]
    NoValidTransports,

    /// The server refused the connection outright (connection reset, DNS
    /// failure, TLS failure, ...).
    #[error("connection refused by the server")]
    ConnectionRefused,

    /// The server replied with a non-200 status code during the handshake or
    /// a polling round trip.
    #[error("unexpected status code {0} in server response")]
    UnexpectedStatus(u16),

    /// The response body could not be decoded as an Engine.IO payload.
    #[error("unexpected response from server")]
    MalformedResponse,

    /// The handshake response did not contain an OPEN packet.
    #[error("OPEN packet not returned by server")]
    NoOpenPacket,

    /// The writer's queue sat empty past `ping_timeout`; the prober should
    /// have enqueued a PING well before this point, so observing it is a
    /// protocol-level invariant violation rather than ordinary backpressure.
    #[error("send queue timed out waiting for a packet")]
    QueueEmpty,

    /// A packet was received that was not valid in its context (wrong type,
    /// or valid type with an unexpected payload).
    #[error("unexpected packet: {0:?}")]
    BadPacket(Packet),

    /// A lower-level HTTP failure from the polling transport.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A lower-level WebSocket failure from the websocket transport.
    #[error(transparent)]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    /// A packet or OPEN descriptor failed to deserialize as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The connection URL supplied by the application could not be parsed.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
