//! The HTTP long-polling transport.
//!
//! Grounded on `engineioxide/src/transport/polling/mod.rs` (`open_req`,
//! `polling_req`, `post_req` — the server-side mirror of the three requests
//! this module issues) and on `original_source/engineio/client.py`'s
//! `_connect_polling` and the polling branches of `_writer_task`/`read_loop`.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;
use crate::packet::{OpenPacket, Packet};
use crate::payload;
use crate::transport::{Transport, TransportKind};
use crate::url::{build_engineio_url, url_timestamp};

pub struct PollingTransport {
    http: reqwest::Client,
    /// The polling endpoint, already carrying `&sid=<sid>`.
    base_url: String,
    headers: HeaderMap,
}

fn to_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(k.as_bytes()),
            HeaderValue::from_str(v),
        ) {
            map.insert(name, value);
        }
    }
    map
}

impl PollingTransport {
    /// Perform the initial polling handshake GET and return the connected
    /// transport together with the server's OPEN descriptor.
    ///
    /// This is a free-standing constructor rather than part of the
    /// [`Transport`] trait: the trait's capability set assumes a session is
    /// already open, while this function is what *opens* it.
    pub async fn connect(
        url: &str,
        headers: &HashMap<String, String>,
        path: &str,
    ) -> Result<(Self, OpenPacket, Vec<Packet>), Error> {
        let http = reqwest::Client::new();
        let header_map = to_header_map(headers);
        let handshake_url = build_engineio_url(url, path, TransportKind::Polling)?;

        #[cfg(feature = "tracing")]
        tracing::info!("attempting polling connection to {handshake_url}");

        let resp = http
            .get(format!("{handshake_url}{}", url_timestamp()))
            .headers(header_map.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::ConnectionRefused
                } else {
                    Error::Http(e)
                }
            })?;

        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(Error::Http)?;
        let packets = payload::decode(&body)?;

        let mut open = None;
        let mut extra = Vec::new();
        for packet in packets {
            match packet {
                Packet::Open(descriptor) if open.is_none() => open = Some(descriptor),
                other => extra.push(other),
            }
        }
        let open = open.ok_or(Error::NoOpenPacket)?;

        #[cfg(feature = "tracing")]
        if !extra.is_empty() {
            tracing::debug!("{} extra packet(s) found in handshake response", extra.len());
        }

        let base_url = format!("{handshake_url}&sid={}", open.sid);
        Ok((
            Self {
                http,
                base_url,
                headers: header_map,
            },
            open,
            extra,
        ))
    }
}

#[async_trait]
impl Transport for PollingTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    async fn send_batch(&self, packets: &[Packet]) -> Result<(), Error> {
        let body = payload::encode(packets);
        let resp = self
            .http
            .post(&self.base_url)
            .headers(self.headers.clone())
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::ConnectionRefused
                } else {
                    Error::Http(e)
                }
            })?;
        if resp.status().as_u16() != 200 {
            return Err(Error::UnexpectedStatus(resp.status().as_u16()));
        }
        Ok(())
    }

    async fn recv(&self) -> Result<Vec<Packet>, Error> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, url_timestamp()))
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::ConnectionRefused
                } else {
                    Error::Http(e)
                }
            })?;
        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }
        let body = resp.bytes().await.map_err(Error::Http)?;
        payload::decode(&body)
    }

    async fn close(&self) {
        // Polling has no persistent connection to tear down; the server
        // learns of the close via the CLOSE packet sent through `send_batch`.
    }
}
