//! The WebSocket transport: direct connect and upgrade-from-polling probe.
//!
//! Grounded on `engineioxide/src/transport/ws.rs` (`upgrade_handshake`,
//! `init_handshake`, and the frame-mapping loop in `forward_to_socket`/
//! `forward_to_handler` — this module is their client-side mirror image) and
//! on `original_source/engineio/client.py`'s `_connect_websocket`.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::Error;
use crate::packet::{OpenPacket, Packet, PacketData};
use crate::transport::{Transport, TransportKind};
use crate::url::build_engineio_url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketTransport {
    tx: Mutex<SplitSink<WsStream, Message>>,
    rx: Mutex<SplitStream<WsStream>>,
}

fn build_request(
    url: &str,
    headers: &HashMap<String, String>,
) -> Result<http::Request<()>, Error> {
    let mut request = url.into_client_request().map_err(Error::Ws)?;
    let header_map = request.headers_mut();
    for (k, v) in headers {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(k.as_bytes()),
            http::header::HeaderValue::from_str(v),
        ) {
            header_map.insert(name, value);
        }
    }
    Ok(request)
}

async fn dial(url: &str, headers: &HashMap<String, String>) -> Result<WsStream, Error> {
    let request = build_request(url, headers)?;
    let (stream, _response) = connect_async(request).await.map_err(|e| match e {
        tokio_tungstenite::tungstenite::Error::Io(_) => Error::ConnectionRefused,
        other => Error::Ws(other),
    })?;
    Ok(stream)
}

fn packet_to_message(packet: &Packet) -> Message {
    if packet.is_binary() {
        let data = match packet {
            Packet::Message(PacketData::Binary(b)) => b.clone(),
            _ => unreachable!("only MESSAGE packets carry binary payload"),
        };
        Message::Binary(data.to_vec())
    } else {
        Message::Text(
            String::from_utf8(packet.encode().to_vec()).expect("non-binary packets are utf8"),
        )
    }
}

fn message_to_packet(message: Message) -> Result<Packet, Error> {
    match message {
        Message::Text(s) => Packet::decode_text(&s),
        Message::Binary(b) => Ok(Packet::decode_binary(bytes::Bytes::from(b))),
        Message::Close(_) => Ok(Packet::Close),
        _ => Err(Error::MalformedResponse),
    }
}

impl WebSocketTransport {
    /// Attempt to upgrade an existing polling session to WebSocket. Returns
    /// `None` (never an [`Error`]) on any probe failure, per §4.2: an
    /// unsuccessful upgrade must leave the polling session intact rather
    /// than surface a hard error to the caller.
    pub async fn upgrade(
        url: &str,
        headers: &HashMap<String, String>,
        path: &str,
        sid: &str,
    ) -> Option<Self> {
        let ws_url = build_engineio_url(url, path, TransportKind::WebSocket).ok()?;
        let ws_url = format!("{ws_url}&sid={sid}");

        #[cfg(feature = "tracing")]
        tracing::info!("attempting websocket upgrade to {ws_url}");

        let stream = dial(&ws_url, headers).await.ok()?;
        let (mut tx, mut rx) = stream.split();

        tx.send(packet_to_message(&Packet::ping_probe())).await.ok()?;
        let reply = rx.next().await?.ok()?;
        let packet = message_to_packet(reply).ok()?;
        if !packet.is_pong_probe() {
            #[cfg(feature = "tracing")]
            tracing::warn!("websocket upgrade failed: no PONG packet");
            return None;
        }
        tx.send(packet_to_message(&Packet::Upgrade)).await.ok()?;

        #[cfg(feature = "tracing")]
        tracing::info!("websocket upgrade was successful");

        Some(Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        })
    }

    /// Connect directly over WebSocket, without an existing polling session.
    pub async fn connect(
        url: &str,
        headers: &HashMap<String, String>,
        path: &str,
    ) -> Result<(Self, OpenPacket), Error> {
        let ws_url = build_engineio_url(url, path, TransportKind::WebSocket)?;

        #[cfg(feature = "tracing")]
        tracing::info!("attempting websocket connection to {ws_url}");

        let stream = dial(&ws_url, headers).await?;
        let (tx, mut rx) = stream.split();

        let message = rx.next().await.ok_or(Error::ConnectionRefused)??;
        let packet = message_to_packet(message)?;
        let open = match packet {
            Packet::Open(open) => open,
            _ => return Err(Error::NoOpenPacket),
        };

        #[cfg(feature = "tracing")]
        tracing::info!("websocket connection accepted with sid={}", open.sid);

        Ok((
            Self {
                tx: Mutex::new(tx),
                rx: Mutex::new(rx),
            },
            open,
        ))
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn send_batch(&self, packets: &[Packet]) -> Result<(), Error> {
        let mut tx = self.tx.lock().await;
        for packet in packets {
            tx.send(packet_to_message(packet)).await.map_err(Error::Ws)?;
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<Packet>, Error> {
        let mut rx = self.rx.lock().await;
        let message = rx.next().await.ok_or(Error::ConnectionRefused)??;
        Ok(vec![message_to_packet(message)?])
    }

    async fn close(&self) {
        let mut tx = self.tx.lock().await;
        let _ = tx.send(Message::Close(None)).await;
    }
}
