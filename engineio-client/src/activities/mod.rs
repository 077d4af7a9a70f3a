//! The three background activities that keep a connected session alive:
//! the writer (batches and flushes the outbound queue), the reader (pulls
//! and dispatches inbound packets), and the prober (enforces ping/pong
//! liveness). Each is spawned once per connection by `Client::connect` and
//! carries only an `Arc<Client>` back-reference — see `SPEC_FULL.md` §4.3,
//! §4.4, §4.5.

pub mod prober;
pub mod reader;
pub mod writer;
