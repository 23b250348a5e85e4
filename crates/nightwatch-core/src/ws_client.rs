// WebSocket client: connects to the game server, forwards inbound frames to
// the event loop, writes outbound commands, and reconnects when dropped.

use std::fmt::Display;
use std::time::Duration;

use futures_util::stream::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};

use crate::protocol::OutboundCommand;

/// Transport events delivered to the application layer.
#[derive(Debug, PartialEq)]
pub enum WsEvent {
    /// A connection to the server is open.
    Connected { addr: String },
    /// The connection was lost or closed.
    Disconnected,
    /// A text frame from the server (raw JSON string).
    Message(String),
}

/// Why a single connection session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server closed the socket or the socket failed.
    Dropped,
    /// The event loop hung up; stop for good.
    EventReceiverGone,
    /// No more outbound commands will ever arrive; stop for good.
    OutboundClosed,
}

/// Connect to `url` and keep the connection alive until the event loop goes
/// away. Every successful connect emits [`WsEvent::Connected`] and every loss
/// emits [`WsEvent::Disconnected`]; a failed attempt emits nothing and is
/// retried after `reconnect_delay`.
pub async fn run(
    url: String,
    reconnect_delay: Duration,
    tx: mpsc::Sender<WsEvent>,
    mut out_rx: mpsc::Receiver<OutboundCommand>,
) -> anyhow::Result<()> {
    loop {
        info!("Connecting to {url}");
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => {
                info!("Connected to {url}");
                if tx
                    .send(WsEvent::Connected { addr: url.clone() })
                    .await
                    .is_err()
                {
                    break;
                }

                let (mut write, read) = ws_stream.split();
                let end = run_session(read, &mut write, &tx, &mut out_rx, &url).await;
                info!("Session with {url} ended: {end:?}");

                if tx.send(WsEvent::Disconnected).await.is_err() {
                    break;
                }
                if end != SessionEnd::Dropped {
                    break;
                }
            }
            Err(e) => {
                warn!("Connection to {url} failed: {e}");
            }
        }

        if !wait_for_retry(reconnect_delay, &mut out_rx).await {
            break;
        }
    }

    info!("WebSocket client stopped");
    Ok(())
}

/// Sleep out the reconnect delay. Commands issued while offline are dropped
/// rather than replayed on the next connection. Returns `false` when the
/// outbound channel closed in the meantime.
async fn wait_for_retry(delay: Duration, out_rx: &mut mpsc::Receiver<OutboundCommand>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = out_rx.recv() => match cmd {
                Some(cmd) => warn!("Not connected, dropping {}", cmd.event_name()),
                None => return false,
            },
        }
    }
}

/// Drive one open connection: forward text frames from `read` to `tx` and
/// write commands from `out_rx` to `write`, until either side ends.
///
/// Generic over the stream and sink so it can be tested with in-memory
/// streams without opening sockets.
pub async fn run_session<St, Si>(
    mut read: St,
    write: &mut Si,
    tx: &mpsc::Sender<WsEvent>,
    out_rx: &mut mpsc::Receiver<OutboundCommand>,
    addr: &str,
) -> SessionEnd
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                        return SessionEnd::EventReceiverGone;
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Server {addr} sent close frame");
                    return SessionEnd::Dropped;
                }
                Some(Err(e)) => {
                    warn!("WebSocket error from {addr}: {e}");
                    return SessionEnd::Dropped;
                }
                None => return SessionEnd::Dropped,
                Some(Ok(_)) => {
                    // Binary, Ping, Pong and raw frames carry nothing for us.
                }
            },
            cmd = out_rx.recv() => match cmd {
                Some(cmd) => {
                    let frame = cmd.to_json();
                    debug!("Writing {frame}");
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        warn!("Failed to send {} to {addr}: {e}", cmd.event_name());
                        return SessionEnd::Dropped;
                    }
                }
                None => return SessionEnd::OutboundClosed,
            },
        }
    }
}
