// file: src/transport.rs
// description: persistent bidirectional connection handles and the tokio-tungstenite transport
// reference: https://docs.rs/tokio-tungstenite/latest/tokio_tungstenite/

use crate::{
    error::{ChannelError, Result},
    events::TransportEvents,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::{sync::mpsc, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// Creates connection handles. Each handle reports exactly one `closed` event
/// at the end of its life, preceded by `opened` if the connection came up.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Url, events: TransportEvents) -> Box<dyn Connection>;
}

/// A live connection owned by exactly one channel.
pub trait Connection: Send {
    fn send(&mut self, text: String) -> Result<()>;

    /// Starts an orderly close. Dropping the handle must also release it.
    fn close(&mut self);
}

#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct TungsteniteConnector {
    connect_timeout: Duration,
}

impl TungsteniteConnector {
    /// `connect_timeout` bounds the TCP connect, TLS and HTTP upgrade together.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TungsteniteConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Connector for TungsteniteConnector {
    fn connect(&self, endpoint: &Url, events: TransportEvents) -> Box<dyn Connection> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(
            endpoint.clone(),
            self.connect_timeout,
            events,
            outgoing_rx,
        ));
        Box::new(TungsteniteConnection {
            outgoing: outgoing_tx,
        })
    }
}

pub struct TungsteniteConnection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Connection for TungsteniteConnection {
    fn send(&mut self, text: String) -> Result<()> {
        self.outgoing
            .send(Outgoing::Text(text))
            .map_err(|_| ChannelError::NotConnected)
    }

    fn close(&mut self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

impl Drop for TungsteniteConnection {
    fn drop(&mut self) {
        // The socket task either completes the close handshake or stops dialing.
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn run_socket(
    endpoint: Url,
    connect_timeout: Duration,
    events: TransportEvents,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
) {
    let handle = events.handle();

    let connected = tokio::select! {
        result = timeout(connect_timeout, connect_async(endpoint.as_str())) => result,
        _ = wait_for_close(&mut outgoing) => {
            debug!(%handle, "Close requested before connection was established");
            events.closed("");
            return;
        }
    };

    let ws_stream = match connected {
        Ok(Ok((ws_stream, _))) => ws_stream,
        Ok(Err(e)) => {
            error!(%handle, %endpoint, "Failed to connect to WebSocket: {}", e);
            events.error(ChannelError::WebSocketError(e));
            events.closed("");
            return;
        }
        Err(_) => {
            error!(%handle, %endpoint, "WebSocket connection timed out after {:?}", connect_timeout);
            events.error(ChannelError::ConnectTimeout(connect_timeout));
            events.closed("");
            return;
        }
    };

    info!(%handle, "WebSocket connection established to {}", endpoint);
    events.opened();

    let (mut write, mut read) = ws_stream.split();
    let mut close_reason = String::new();

    loop {
        tokio::select! {
            command = outgoing.recv() => match command {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        error!(%handle, "Failed to send frame: {}", e);
                        events.error(ChannelError::WebSocketError(e));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    debug!(%handle, "Closing WebSocket on request");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    trace!(%handle, "Received text message: {}", text.as_str());
                    events.message(text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    warn!(%handle, "Binary messages not supported ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(frame) = frame {
                        close_reason = frame.reason.to_string();
                    }
                    warn!(%handle, reason = %close_reason, "Received close frame");
                    break;
                }
                Some(Ok(_)) => {
                    // ping/pong and raw frames are handled by tungstenite
                }
                Some(Err(e)) => {
                    error!(%handle, "WebSocket stream error: {}", e);
                    events.error(ChannelError::WebSocketError(e));
                    break;
                }
                None => {
                    info!(%handle, "WebSocket stream ended");
                    break;
                }
            },
        }
    }

    events.closed(close_reason);
}

async fn wait_for_close(outgoing: &mut mpsc::UnboundedReceiver<Outgoing>) {
    loop {
        match outgoing.recv().await {
            Some(Outgoing::Close) | None => return,
            Some(Outgoing::Text(_)) => {
                warn!("Dropping frame queued before the connection opened");
            }
        }
    }
}
