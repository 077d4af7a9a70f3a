//! EIO3 payload framing: one or more packets concatenated for a single HTTP
//! polling round trip. Each packet is prefixed by its *character* count (not
//! byte count — the reference JavaScript client counts UTF-16 code units,
//! and counting `chars()` is the closest equivalent for the ASCII/UTF-8
//! packets this client ever produces) followed by `:`.
//!
//! Grounded on the length-prefix comment in the teacher's
//! `transport/polling/mod.rs` (`packet.chars().count()`), generalized here
//! from "one packet" to "a batch of packets concatenated back to back".

use bytes::Bytes;
use memchr::memchr;

use crate::error::Error;
use crate::packet::Packet;

/// Encode a batch of packets as a single EIO3 payload body.
pub fn encode(packets: &[Packet]) -> Bytes {
    let mut out = String::new();
    for packet in packets {
        let segment = packet.encode_for_payload();
        out.push_str(&segment.chars().count().to_string());
        out.push(':');
        out.push_str(&segment);
    }
    Bytes::from(out.into_bytes())
}

/// Decode an EIO3 payload body into its constituent packets.
pub fn decode(body: &[u8]) -> Result<Vec<Packet>, Error> {
    let text = std::str::from_utf8(body).map_err(|_| Error::MalformedResponse)?;
    let mut packets = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let colon = memchr(b':', rest.as_bytes()).ok_or(Error::MalformedResponse)?;
        let len: usize = rest[..colon]
            .parse()
            .map_err(|_| Error::MalformedResponse)?;
        let after_colon = &rest[colon + 1..];
        let mut chars = after_colon.char_indices();
        let byte_len = match chars.nth(len) {
            Some((idx, _)) => idx,
            None => after_colon.len(),
        };
        if byte_len > after_colon.len() {
            return Err(Error::MalformedResponse);
        }
        let segment = &after_colon[..byte_len];
        packets.push(Packet::decode_payload_segment(segment)?);
        rest = &after_colon[byte_len..];
    }
    Ok(packets)
}
