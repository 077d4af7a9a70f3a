//! The writer activity: drains the outbound queue in batches and hands each
//! batch to the current transport.
//!
//! Grounded on `original_source/engineio/client.py`'s `_writer_task` — the
//! drain-while-available loop below reproduces its exact control flow,
//! including the two different ways the sentinel can end the task — and on
//! the teacher's `forward_to_socket` in `engineioxide/src/transport/ws.rs`,
//! whose `recv().await` then `while let Ok(..) = try_recv()` shape this
//! mirrors.

use std::sync::Arc;

use crate::packet::Packet;
use crate::session::Client;
use crate::transport::TransportKind;

pub(crate) async fn run(client: Arc<Client>) {
    let Some(queue) = client.queue() else { return };
    let Some(transport) = client.current_transport() else { return };
    let patience = client.ping_timeout().unwrap_or_default();

    loop {
        let first = match tokio::time::timeout(patience, queue.recv()).await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(_elapsed) => {
                #[cfg(feature = "tracing")]
                tracing::error!("packet queue is empty, aborting writer");
                // A protocol-level invariant violation (§4.3/§6 QueueEmpty):
                // the prober should have enqueued a PING well before this
                // deadline. Reset the whole session, not just this task, so
                // the reader and prober observe the state change and unwind
                // in turn, same as any other fatal transport error.
                client.fatal_reset().await;
                break;
            }
        };

        let batch = match first {
            None => {
                // Sentinel as the very first item: stop immediately, no
                // further draining is attempted. It is still one dequeued
                // item and must be acknowledged so `disconnect(abort=false)`'s
                // `queue.join()` can observe the drain completing.
                queue.ack();
                Vec::new()
            }
            Some(packet) => {
                let mut batch = vec![packet];
                loop {
                    match queue.try_recv().await {
                        Some(Some(packet)) => batch.push(packet),
                        Some(None) => {
                            // Sentinel consumed mid-drain: acknowledge it too,
                            // it never makes it into `batch` to be acked below.
                            queue.ack();
                            break;
                        }
                        None => break,
                    }
                }
                batch
            }
        };

        if batch.is_empty() {
            break;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("writing {} packet(s)", batch.len());

        let send_result = if transport.kind() == TransportKind::WebSocket {
            send_individually(transport.as_ref(), &batch).await
        } else {
            transport.send_batch(&batch).await
        };

        match send_result {
            Ok(()) => {
                for _ in &batch {
                    queue.ack();
                }
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!("writer could not flush batch: {err}");
                for _ in &batch {
                    queue.ack();
                }
                client.fatal_reset().await;
                break;
            }
        }

        if batch.iter().any(|p| matches!(p, Packet::Close)) {
            break;
        }
    }
}

/// Websocket packets are each acknowledged individually rather than as one
/// unit, since each is its own frame on the wire — see `SPEC_FULL.md` §4.3.
async fn send_individually(
    transport: &dyn crate::transport::Transport,
    batch: &[Packet],
) -> Result<(), crate::error::Error> {
    for packet in batch {
        transport.send_batch(std::slice::from_ref(packet)).await?;
    }
    Ok(())
}
