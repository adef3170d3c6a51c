use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::channel::{Transport, TransportEvent, ABNORMAL_CLOSURE, NO_STATUS_RECEIVED};
use super::messages::{encode_voice_input, parse_inbound, VoiceInputMessage};
use crate::session::EventSink;

struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    live: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Events from one connection, muted once the connection is closed locally
#[derive(Clone)]
struct ConnectionEvents {
    sink: EventSink<TransportEvent>,
    live: Arc<AtomicBool>,
}

impl ConnectionEvents {
    fn emit(&self, event: TransportEvent) {
        if self.live.load(Ordering::SeqCst) {
            self.sink.emit(event);
        }
    }
}

/// WebSocket channel to the assistant service
#[derive(Default)]
pub struct WebSocketTransport {
    connection: Option<Connection>,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run_connection(
        address: String,
        mut outbound: mpsc::UnboundedReceiver<Message>,
        events: ConnectionEvents,
    ) {
        let request = match address.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                error!("Invalid transport address {}: {}", address, e);
                events.emit(TransportEvent::ConnectFailed(e.to_string()));
                return;
            }
        };

        let ws_stream = match tokio_tungstenite::connect_async(request).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                error!("Failed to connect to {}: {}", address, e);
                events.emit(TransportEvent::ConnectFailed(e.to_string()));
                return;
            }
        };

        info!("Connected to assistant service at {}", address);
        events.emit(TransportEvent::Opened);

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                message = outbound.recv() => match message {
                    Some(message) => {
                        let closing = matches!(message, Message::Close(_));
                        if let Err(e) = write.send(message).await {
                            error!("Failed to send message: {}", e);
                        }
                        if closing {
                            break;
                        }
                    }
                    None => break,
                },
                inbound = read.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received message ({} bytes)", text.len());
                        events.emit(TransportEvent::Message(parse_inbound(&text)));
                    }
                    Some(Ok(Message::Binary(bin))) => {
                        warn!("Unexpected binary message ({} bytes)", bin.len());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame
                            .map(|frame| u16::from(frame.code))
                            .unwrap_or(NO_STATUS_RECEIVED);
                        info!("Connection closed by server (code={})", code);
                        events.emit(TransportEvent::Closed { code });
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Failed to read message: {}", e);
                        events.emit(TransportEvent::Error(e.to_string()));
                        events.emit(TransportEvent::Closed { code: ABNORMAL_CLOSURE });
                        break;
                    }
                    None => {
                        warn!("Connection dropped without a close frame");
                        events.emit(TransportEvent::Closed { code: ABNORMAL_CLOSURE });
                        break;
                    }
                },
            }
        }

        debug!("Connection task finished");
    }
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn open(&mut self, address: &str, events: EventSink<TransportEvent>) -> Result<()> {
        self.close().await?;

        address
            .into_client_request()
            .with_context(|| format!("Invalid transport address: {}", address))?;

        info!("Connecting to assistant service at {}", address);

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let live = Arc::new(AtomicBool::new(true));
        let connection_events = ConnectionEvents {
            sink: events,
            live: Arc::clone(&live),
        };

        let task = tokio::spawn(Self::run_connection(
            address.to_string(),
            outbound_rx,
            connection_events,
        ));

        self.connection = Some(Connection {
            outbound,
            live,
            task,
        });

        Ok(())
    }

    async fn send(&mut self, message: &VoiceInputMessage) -> Result<()> {
        let connection = self
            .connection
            .as_ref()
            .context("Transport is not connected")?;

        let payload = encode_voice_input(message);
        connection
            .outbound
            .send(Message::Text(payload))
            .context("Connection is no longer running")?;

        debug!("Queued voice input ({} chars)", message.message.len());

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        info!("Closing assistant connection");

        connection.live.store(false, Ordering::SeqCst);

        if connection.task.is_finished() {
            return Ok(());
        }

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed(""),
        };
        if connection.outbound.send(Message::Close(Some(frame))).is_err() {
            connection.task.abort();
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection
            .as_ref()
            .map(|connection| !connection.task.is_finished())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.live.store(false, Ordering::SeqCst);
            connection.task.abort();
        }
    }
}
