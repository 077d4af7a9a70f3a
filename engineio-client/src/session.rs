//! The session state machine: `Client`, its lifecycle (`connect` / `send` /
//! `disconnect` / `wait` / `transport`), and the bookkeeping shared with the
//! three background activities in `activities/`.
//!
//! Grounded directly on `original_source/engineio/client.py`'s `Client`
//! class; the split between "engine-wide config" and "per-connection state"
//! mirrors the teacher crate's `EngineIo<H>` (engine-wide) vs
//! `Socket<H::Data>` (per-session) split, collapsed here into a single
//! struct since a client only ever owns one session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::activities::{prober, reader, writer};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::events::EventRegistry;
use crate::packet::{Packet, PacketData};
use crate::queue::OutQueue;
use crate::registry;
use crate::transport::polling::PollingTransport;
use crate::transport::ws::WebSocketTransport;
use crate::transport::{Transport, TransportKind};

/// The three lifecycle states a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Disconnecting,
}

/// Everything that is only meaningful once a session is open, set together
/// at connect/upgrade time and otherwise read-only (the transport handle
/// aside, which is swapped exactly once on a successful upgrade).
#[derive(Clone)]
struct ConnectedData {
    transport: Arc<dyn Transport>,
    queue: Arc<OutQueue>,
    sid: String,
    ping_interval: Duration,
    ping_timeout: Duration,
    pong_pending: Arc<AtomicBool>,
    disconnect_fired: Arc<AtomicBool>,
}

#[derive(Default)]
struct ActivityHandles {
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    prober: Option<JoinHandle<()>>,
}

/// An Engine.IO client session.
///
/// Always held behind an `Arc` (`Client::new()` returns one directly): the
/// three background activities each carry a clone of it as their only
/// back-reference, per the arena/handle discipline in `SPEC_FULL.md` §9.
pub struct Client {
    state: StdRwLock<SessionState>,
    events: StdRwLock<EventRegistry>,
    data: StdRwLock<Option<ConnectedData>>,
    activities: StdMutex<ActivityHandles>,
}

impl Client {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: StdRwLock::new(SessionState::Disconnected),
            events: StdRwLock::new(EventRegistry::default()),
            data: StdRwLock::new(None),
            activities: StdMutex::new(ActivityHandles::default()),
        })
    }

    pub fn on_connect<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.events.write().unwrap().on_connect(handler);
    }

    pub fn on_disconnect<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.events.write().unwrap().on_disconnect(handler);
    }

    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(crate::events::MessageData) + Send + Sync + 'static,
    {
        self.events.write().unwrap().on_message(handler);
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().unwrap()
    }

    /// The name of the transport currently in use, or `None` if not
    /// connected (mirrors `current_transport ∈ { none, POLLING, WEBSOCKET }`).
    pub fn transport(&self) -> Option<TransportKind> {
        if self.state() != SessionState::Connected {
            return None;
        }
        self.connected_data().map(|d| d.transport.kind())
    }

    /// The server-assigned session id, or `None` if not connected. Mirrors
    /// the original client's public `sid` attribute.
    pub fn sid(&self) -> Option<String> {
        self.connected_data().map(|d| d.sid)
    }

    /// Block until the reader activity terminates. A no-op if the reader
    /// has already terminated (or was never started).
    pub async fn wait(self: &Arc<Self>) {
        if let Some(handle) = self.take_reader_handle() {
            let _ = handle.await;
        }
    }

    /// Queue an application message for sending. Silently dropped if the
    /// session is not CONNECTED (§3: "A Packet may be enqueued only while
    /// state = CONNECTED").
    pub fn send(&self, data: impl Into<PacketData>) {
        if self.state() != SessionState::Connected {
            return;
        }
        if let Some(conn) = self.connected_data() {
            let packet = Packet::Message(data.into());
            #[cfg(feature = "tracing")]
            tracing::debug!("sending packet {} data {:?}", packet.packet_type(), packet);
            conn.queue.enqueue(Some(packet));
        }
    }

    /// Establish a session. See `SPEC_FULL.md` §4.1.
    pub async fn connect(self: &Arc<Self>, url: &str, config: ClientConfig) -> Result<(), Error> {
        if self.state() != SessionState::Disconnected {
            return Err(Error::AlreadyConnected);
        }
        if config.allowed_transports.is_empty() {
            return Err(Error::NoValidTransports);
        }

        let allowed = config.allowed_transports.clone();
        let path = config.path.clone();
        let headers = config.headers.clone();

        match allowed[0] {
            TransportKind::WebSocket => {
                let (transport, open) = WebSocketTransport::connect(url, &headers, &path).await?;
                self.finish_connect(Arc::new(transport), &open.sid, open.ping_interval(), open.ping_timeout());
                self.spawn_activities();
            }
            TransportKind::Polling => {
                let (transport, open, extra) =
                    PollingTransport::connect(url, &headers, &path).await?;
                self.finish_connect(
                    Arc::new(transport),
                    &open.sid,
                    open.ping_interval(),
                    open.ping_timeout(),
                );

                // §4.1 point 3: packets bundled into the handshake response
                // besides OPEN are delivered now, once CONNECTED, not dropped.
                for packet in extra {
                    reader::dispatch(self, packet).await;
                }

                let mut upgraded = false;
                if allowed.contains(&TransportKind::WebSocket) {
                    if let Some(ws) =
                        WebSocketTransport::upgrade(url, &headers, &path, &open.sid).await
                    {
                        self.swap_transport(Arc::new(ws));
                        upgraded = true;
                    }
                }
                self.spawn_activities();
                let _ = upgraded;
            }
        }
        Ok(())
    }

    /// Graceful disconnect. See `SPEC_FULL.md` §4.7.
    pub async fn disconnect(self: &Arc<Self>, abort: bool) {
        self.disconnect_inner(abort, true).await;
    }

    pub(crate) async fn disconnect_inner(self: &Arc<Self>, abort: bool, join_reader: bool) {
        if self.state() != SessionState::Connected {
            self.reset();
            return;
        }
        let conn = self.connected_data();
        if let Some(conn) = &conn {
            conn.queue.enqueue(Some(Packet::Close));
            conn.queue.enqueue(None);
        }
        self.set_state(SessionState::Disconnecting);

        if !abort {
            if let Some(conn) = &conn {
                conn.queue.join().await;
            }
        }
        if let Some(conn) = &conn {
            if conn.transport.kind() == TransportKind::WebSocket {
                conn.transport.close().await;
            }
        }
        if !abort && join_reader {
            if let Some(handle) = self.take_reader_handle() {
                let _ = handle.await;
            }
        }
        self.set_state(SessionState::Disconnected);
        // The prober is deliberately not joined here: it has no
        // cancellation token (§5) and may be mid-`sleep(ping_interval)`,
        // which can run for tens of seconds. §4.7's disconnect sequence
        // only waits on the queue drain and the reader; the prober notices
        // the state flip above next time it wakes and winds down on its own.
        registry::unregister(self);
        self.fire_disconnect_once();
    }

    /// Error-driven teardown used by a background activity that detects a
    /// fatal transport condition (including liveness loss, §4.5 step 1):
    /// closes the WebSocket if one is held, wakes the writer via the
    /// sentinel, flips state directly to DISCONNECTED, fires `disconnect`
    /// once. No CLOSE packet, no drains — see §7.
    pub(crate) async fn fatal_reset(self: &Arc<Self>) {
        if let Some(conn) = self.connected_data() {
            if conn.transport.kind() == TransportKind::WebSocket {
                conn.transport.close().await;
            }
            conn.queue.enqueue(None);
        }
        self.set_state(SessionState::Disconnected);
        registry::unregister(self);
        self.fire_disconnect_once();
    }

    /// State-flip-only reset used when `disconnect` is called outside the
    /// CONNECTED state (a no-op boundary case, see §8).
    fn reset(self: &Arc<Self>) {
        self.set_state(SessionState::Disconnected);
        registry::unregister(self);
        self.fire_disconnect_once();
    }

    fn fire_disconnect_once(&self) {
        if let Some(conn) = self.connected_data() {
            if !conn.disconnect_fired.swap(true, Ordering::SeqCst) {
                self.events.read().unwrap().trigger_disconnect();
            }
        }
    }

    fn finish_connect(
        self: &Arc<Self>,
        transport: Arc<dyn Transport>,
        sid: &str,
        ping_interval: Duration,
        ping_timeout: Duration,
    ) {
        *self.data.write().unwrap() = Some(ConnectedData {
            transport,
            queue: Arc::new(OutQueue::new()),
            sid: sid.to_string(),
            ping_interval,
            ping_timeout,
            pong_pending: Arc::new(AtomicBool::new(false)),
            disconnect_fired: Arc::new(AtomicBool::new(false)),
        });
        self.set_state(SessionState::Connected);
        registry::register(self);
        registry::ensure_sigint_handler_installed();
        self.events.read().unwrap().trigger_connect();
    }

    fn swap_transport(&self, transport: Arc<dyn Transport>) {
        if let Some(conn) = self.data.write().unwrap().as_mut() {
            conn.transport = transport;
        }
    }

    fn spawn_activities(self: &Arc<Self>) {
        let reader_handle = tokio::spawn(reader::run(self.clone()));
        let writer_handle = tokio::spawn(writer::run(self.clone()));
        let prober_handle = tokio::spawn(prober::run(self.clone()));
        let mut handles = self.activities.lock().unwrap();
        handles.reader = Some(reader_handle);
        handles.writer = Some(writer_handle);
        handles.prober = Some(prober_handle);
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap() = state;
    }

    fn connected_data(&self) -> Option<ConnectedData> {
        self.data.read().unwrap().clone()
    }

    pub(crate) fn take_reader_handle(&self) -> Option<JoinHandle<()>> {
        self.activities.lock().unwrap().reader.take()
    }

    pub(crate) fn take_writer_handle(&self) -> Option<JoinHandle<()>> {
        self.activities.lock().unwrap().writer.take()
    }

    pub(crate) fn queue(&self) -> Option<Arc<OutQueue>> {
        self.connected_data().map(|d| d.queue)
    }

    pub(crate) fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        self.connected_data().map(|d| d.transport)
    }

    pub(crate) fn ping_interval(&self) -> Option<Duration> {
        self.connected_data().map(|d| d.ping_interval)
    }

    pub(crate) fn ping_timeout(&self) -> Option<Duration> {
        self.connected_data().map(|d| d.ping_timeout)
    }

    pub(crate) fn pong_pending(&self) -> Option<Arc<AtomicBool>> {
        self.connected_data().map(|d| d.pong_pending)
    }

    pub(crate) fn deliver_message(&self, data: PacketData) {
        self.events
            .read()
            .unwrap()
            .trigger_message(data.into());
    }
}
