//! WebSocket read pump: turns inbound frames into transport events.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use distro_protocol::envelope::Frame;

use crate::transport::{TransportEvent, decode_frame};
use crate::types::DisconnectReason;

/// Reads messages from the WebSocket and forwards decoded events.
///
/// Any inbound message resets the `pong_wait` deadline; if nothing arrives
/// within it the connection is considered dead. Returns why the loop ended.
pub(crate) async fn read_pump<S>(
    mut read: S,
    events_tx: &mpsc::Sender<TransportEvent>,
    write_tx: &mpsc::Sender<tungstenite::Message>,
    pong_wait: Duration,
    max_message_size: usize,
    cancel: &CancellationToken,
) -> DisconnectReason
where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let pong_deadline = tokio::time::sleep(pong_wait);
    tokio::pin!(pong_deadline);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return DisconnectReason::ClientClose,

            () = &mut pong_deadline => {
                warn!("pong timeout, connection dead");
                return DisconnectReason::PingTimeout;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        pong_deadline.as_mut().reset(tokio::time::Instant::now() + pong_wait);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                let Some(event) = decode_text(&text, max_message_size) else {
                                    continue;
                                };
                                if events_tx.send(event).await.is_err() {
                                    debug!("event receiver gone, stopping read pump");
                                    return DisconnectReason::ClientClose;
                                }
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(frame) => {
                                debug!(frame = ?frame, "received close frame");
                                return DisconnectReason::ServerClose;
                            }
                            _ => {} // Binary and raw frames are not part of the protocol.
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        let _ = events_tx
                            .send(TransportEvent::Error { message: e.to_string() })
                            .await;
                        return DisconnectReason::TransportError;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        return DisconnectReason::ServerClose;
                    }
                }
            }
        }
    }
}

/// Decodes a text message, dropping anything oversized, malformed or not
/// meant for the client.
fn decode_text(text: &str, max_message_size: usize) -> Option<TransportEvent> {
    if text.len() > max_message_size {
        warn!("message too large ({} bytes), dropping", text.len());
        return None;
    }

    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!("failed to parse frame: {e}");
            return None;
        }
    };

    match decode_frame(&frame) {
        Ok(event) => {
            trace!(event = %frame.event, "received frame");
            Some(event)
        }
        Err(e) => {
            warn!(event = %frame.event, "dropping frame: {e}");
            None
        }
    }
}
