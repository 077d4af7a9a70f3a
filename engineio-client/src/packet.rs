//! Engine.IO v3 packet framing: one ASCII digit type byte followed by the
//! packet payload. See the protocol notes in `transport/polling.rs` and
//! `transport/ws.rs` for how packets are batched per transport.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The seven packet types defined by the Engine.IO protocol, in their wire
/// ordinal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
}

impl PacketType {
    fn ordinal(self) -> u8 {
        match self {
            PacketType::Open => 0,
            PacketType::Close => 1,
            PacketType::Ping => 2,
            PacketType::Pong => 3,
            PacketType::Message => 4,
            PacketType::Upgrade => 5,
            PacketType::Noop => 6,
        }
    }

    fn from_ordinal(b: u8) -> Option<Self> {
        Some(match b {
            0 => PacketType::Open,
            1 => PacketType::Close,
            2 => PacketType::Ping,
            3 => PacketType::Pong,
            4 => PacketType::Message,
            5 => PacketType::Upgrade,
            6 => PacketType::Noop,
            _ => return None,
        })
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PacketType::Open => "OPEN",
            PacketType::Close => "CLOSE",
            PacketType::Ping => "PING",
            PacketType::Pong => "PONG",
            PacketType::Message => "MESSAGE",
            PacketType::Upgrade => "UPGRADE",
            PacketType::Noop => "NOOP",
        };
        f.write_str(name)
    }
}

/// A packet's payload: either absent, text, or binary. Preserved distinctly
/// so the transport layer can pick the right wire representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketData {
    Text(String),
    Binary(Bytes),
}

impl From<String> for PacketData {
    fn from(s: String) -> Self {
        PacketData::Text(s)
    }
}

impl From<&str> for PacketData {
    fn from(s: &str) -> Self {
        PacketData::Text(s.to_string())
    }
}

impl From<Bytes> for PacketData {
    fn from(b: Bytes) -> Self {
        PacketData::Binary(b)
    }
}

impl From<Vec<u8>> for PacketData {
    fn from(b: Vec<u8>) -> Self {
        PacketData::Binary(Bytes::from(b))
    }
}

impl PacketData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PacketData::Text(s) => Some(s),
            PacketData::Binary(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, PacketData::Binary(_))
    }
}

/// The server's handshake descriptor, carried as the data of the first OPEN
/// packet. Durations arrive on the wire in milliseconds; the client converts
/// them to seconds once, here, rather than at every use site.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpenPacket {
    pub sid: String,
    pub upgrades: Vec<String>,
    #[serde(rename = "pingInterval")]
    pub ping_interval_ms: u64,
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,
}

impl OpenPacket {
    pub fn ping_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ping_interval_ms)
    }

    pub fn ping_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ping_timeout_ms)
    }
}

/// A single Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(OpenPacket),
    Close,
    Ping(Option<PacketData>),
    Pong(Option<PacketData>),
    Message(PacketData),
    Upgrade,
    Noop,
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::Open(_) => PacketType::Open,
            Packet::Close => PacketType::Close,
            Packet::Ping(_) => PacketType::Ping,
            Packet::Pong(_) => PacketType::Pong,
            Packet::Message(_) => PacketType::Message,
            Packet::Upgrade => PacketType::Upgrade,
            Packet::Noop => PacketType::Noop,
        }
    }

    /// The literal probe PING sent to gate a websocket upgrade.
    pub fn ping_probe() -> Packet {
        Packet::Ping(Some(PacketData::Text("probe".to_string())))
    }

    /// The literal probe PONG a successful upgrade must echo back.
    pub fn is_pong_probe(&self) -> bool {
        matches!(self, Packet::Pong(Some(PacketData::Text(s))) if s == "probe")
    }

    /// True if this packet carries binary payload bytes (used to pick the
    /// `Message::Binary` websocket frame kind).
    pub fn is_binary(&self) -> bool {
        match self {
            Packet::Message(data) | Packet::Ping(Some(data)) | Packet::Pong(Some(data)) => {
                data.is_binary()
            }
            _ => false,
        }
    }

    /// Encode this packet as the bytes that go on the wire, *without* any
    /// payload length prefix (that is the payload codec's job, see
    /// `payload.rs`).
    pub fn encode(&self) -> Bytes {
        match self {
            Packet::Message(PacketData::Binary(b)) => b.clone(),
            _ => {
                let mut out = Vec::with_capacity(1);
                out.push(b'0' + self.packet_type().ordinal());
                match self {
                    Packet::Open(open) => {
                        out.extend_from_slice(
                            serde_json::to_string(open).unwrap_or_default().as_bytes(),
                        );
                    }
                    Packet::Ping(Some(PacketData::Text(s)))
                    | Packet::Pong(Some(PacketData::Text(s)))
                    | Packet::Message(PacketData::Text(s)) => {
                        out.extend_from_slice(s.as_bytes());
                    }
                    Packet::Ping(Some(PacketData::Binary(b)))
                    | Packet::Pong(Some(PacketData::Binary(b))) => {
                        out.extend_from_slice(b);
                    }
                    Packet::Ping(None)
                    | Packet::Pong(None)
                    | Packet::Close
                    | Packet::Upgrade
                    | Packet::Noop => {}
                    Packet::Message(PacketData::Binary(_)) => unreachable!(),
                }
                Bytes::from(out)
            }
        }
    }

    /// Decode a single text packet (one EIO3 payload element, or one
    /// websocket text frame).
    pub fn decode_text(s: &str) -> Result<Packet, Error> {
        let mut chars = s.chars();
        let type_char = chars.next().ok_or(Error::MalformedResponse)?;
        let ordinal = type_char.to_digit(10).ok_or(Error::MalformedResponse)? as u8;
        let packet_type = PacketType::from_ordinal(ordinal).ok_or(Error::MalformedResponse)?;
        let rest = chars.as_str();
        Ok(match packet_type {
            PacketType::Open => {
                Packet::Open(serde_json::from_str(rest).map_err(Error::Json)?)
            }
            PacketType::Close => Packet::Close,
            PacketType::Ping if rest.is_empty() => Packet::Ping(None),
            PacketType::Ping => Packet::Ping(Some(PacketData::Text(rest.to_string()))),
            PacketType::Pong if rest.is_empty() => Packet::Pong(None),
            PacketType::Pong => Packet::Pong(Some(PacketData::Text(rest.to_string()))),
            PacketType::Message => Packet::Message(PacketData::Text(rest.to_string())),
            PacketType::Upgrade => Packet::Upgrade,
            PacketType::Noop => Packet::Noop,
        })
    }

    /// Decode a single binary packet (one websocket binary frame). v3 has no
    /// type byte on binary frames received over an already-binary-clean
    /// transport: the whole frame is message data.
    pub fn decode_binary(b: Bytes) -> Packet {
        Packet::Message(PacketData::Binary(b))
    }

    /// Encode this packet as one element of a text EIO3 payload: a type
    /// digit followed by text data, or a `b` marker followed by base64 for
    /// binary packets (payloads are always text, even when they carry binary
    /// packets — see `payload.rs`).
    pub(crate) fn encode_for_payload(&self) -> String {
        match self {
            Packet::Message(PacketData::Binary(b)) => {
                format!("b{}", BASE64.encode(b))
            }
            other => String::from_utf8(other.encode().to_vec())
                .expect("non-binary packets encode as utf8"),
        }
    }

    /// Decode one payload element produced by `encode_for_payload`.
    pub(crate) fn decode_payload_segment(segment: &str) -> Result<Packet, Error> {
        if let Some(b64) = segment.strip_prefix('b') {
            let bytes = BASE64.decode(b64).map_err(|_| Error::MalformedResponse)?;
            return Ok(Packet::Message(PacketData::Binary(Bytes::from(bytes))));
        }
        Packet::decode_text(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_message_text() {
        let p = Packet::Message(PacketData::Text("hello".into()));
        let encoded = p.encode();
        let decoded = Packet::decode_text(std::str::from_utf8(&encoded).unwrap()).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn round_trips_ping_probe() {
        let p = Packet::ping_probe();
        let encoded = p.encode();
        assert_eq!(&encoded[..], b"2probe");
        let decoded = Packet::decode_text("2probe").unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn pong_probe_is_recognized() {
        let pkt = Packet::decode_text("3probe").unwrap();
        assert!(pkt.is_pong_probe());
        let other = Packet::decode_text("3notprobe").unwrap();
        assert!(!other.is_pong_probe());
    }

    #[test]
    fn decodes_open_packet() {
        let raw = r#"0{"sid":"abc","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":5000}"#;
        let pkt = Packet::decode_text(raw).unwrap();
        match pkt {
            Packet::Open(open) => {
                assert_eq!(open.sid, "abc");
                assert_eq!(open.upgrades, vec!["websocket".to_string()]);
                assert_eq!(open.ping_interval().as_secs(), 25);
                assert_eq!(open.ping_timeout().as_secs(), 5);
            }
            other => panic!("expected OPEN, got {other:?}"),
        }
    }

    #[test]
    fn close_and_noop_have_no_payload() {
        assert_eq!(Packet::decode_text("1").unwrap(), Packet::Close);
        assert_eq!(Packet::decode_text("6").unwrap(), Packet::Noop);
    }

    #[test]
    fn rejects_unknown_type_byte() {
        assert!(Packet::decode_text("9nope").is_err());
        assert!(Packet::decode_text("").is_err());
    }

    #[test]
    fn binary_message_round_trips_without_type_byte() {
        let p = Packet::Message(PacketData::Binary(Bytes::from_static(b"\x01\x02\x03")));
        let encoded = p.encode();
        assert_eq!(&encoded[..], b"\x01\x02\x03");
        let decoded = Packet::decode_binary(encoded);
        assert_eq!(p, decoded);
    }

    #[test]
    fn binary_message_round_trips_through_payload_segment() {
        let p = Packet::Message(PacketData::Binary(Bytes::from_static(b"\x01\x02\x03")));
        let segment = p.encode_for_payload();
        assert!(segment.starts_with('b'));
        let decoded = Packet::decode_payload_segment(&segment).unwrap();
        assert_eq!(p, decoded);
    }
}
