//! An Engine.IO v3 client: a bidirectional, session-oriented message pipe
//! over HTTP, negotiating long-polling and WebSocket transports the same
//! way the reference `engine.io-client` does.
//!
//! ```no_run
//! # async fn doc() -> Result<(), engineio_client::Error> {
//! use engineio_client::{Client, ClientConfig};
//!
//! let client = Client::new();
//! client.on_message(|data| println!("{data:?}"));
//! client.connect("http://localhost:3000", ClientConfig::default()).await?;
//! client.send("hello");
//! client.disconnect(false).await;
//! # Ok(())
//! # }
//! ```

mod activities;
mod config;
mod error;
mod events;
mod packet;
mod payload;
mod queue;
mod registry;
mod session;
mod transport;
mod url;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::Error;
pub use events::MessageData;
pub use packet::PacketData;
pub use registry::install_sigint_handler;
pub use session::{Client, SessionState};
pub use transport::TransportKind;
