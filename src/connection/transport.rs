use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::machine::Event;
use crate::errors::{ClientError, ClientResult};

pub const NORMAL_CLOSE: u16 = 1000;
pub const NO_STATUS_CLOSE: u16 = 1005;
pub const ABNORMAL_CLOSE: u16 = 1006;

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Creates sockets for the connection manager.
///
/// `open` only constructs: an `Err` means the socket never existed. Everything
/// after that (open, messages, errors, close) is reported through `events`,
/// tagged with `generation`.
pub trait Transport: Send {
    fn open(
        &mut self,
        url: &str,
        generation: u64,
        events: EventSender,
    ) -> ClientResult<Box<dyn Socket>>;
}

/// Handle to a socket created by a `Transport`.
pub trait Socket: Send {
    fn send_text(&self, text: String) -> ClientResult<()>;
    /// Starts a normal close. The outcome still arrives as a close event.
    fn close(&self);
}

/// Real transport over tokio-tungstenite; one task per socket.
#[derive(Debug, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(
        &mut self,
        url: &str,
        generation: u64,
        events: EventSender,
    ) -> ClientResult<Box<dyn Socket>> {
        let request = build_request(url)?;
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        info!(generation, "Connecting to backend at {}", url);
        tokio::spawn(run_socket(request, generation, outbound_rx, events));

        Ok(Box::new(WsSocket {
            outbound: outbound_tx,
        }))
    }
}

/// Validates the URL the way a socket constructor would: it must parse and
/// use the ws or wss scheme.
pub fn build_request(url: &str) -> ClientResult<Request> {
    let request = url
        .into_client_request()
        .map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    match request.uri().scheme_str() {
        Some("ws") | Some("wss") => Ok(request),
        other => Err(ClientError::UnsupportedScheme {
            scheme: other.unwrap_or_default().to_string(),
        }),
    }
}

enum Outbound {
    Text(String),
    Close,
}

struct WsSocket {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Socket for WsSocket {
    fn send_text(&self, text: String) -> ClientResult<()> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| ClientError::SocketClosed)
    }

    fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

async fn run_socket(
    request: Request,
    generation: u64,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
) {
    let stream = tokio::select! {
        result = connect_async(request) => match result {
            Ok((stream, _)) => stream,
            Err(e) => {
                let _ = events.send(Event::TransportError {
                    generation,
                    reason: e.to_string(),
                });
                let _ = events.send(Event::Closed {
                    generation,
                    code: ABNORMAL_CLOSE,
                    reason: String::new(),
                    clean: false,
                });
                return;
            }
        },
        _ = close_requested(&mut outbound) => {
            debug!(generation, "Close requested before the handshake finished");
            let _ = events.send(Event::Closed {
                generation,
                code: NORMAL_CLOSE,
                reason: "Closed by client".to_string(),
                clean: true,
            });
            return;
        }
    };

    info!(generation, "WebSocket connected");
    let _ = events.send(Event::Opened { generation });

    let (mut write, mut read) = stream.split();
    let mut close_frame: Option<(u16, String)> = None;
    let mut closing = false;

    loop {
        tokio::select! {
            command = outbound.recv(), if !closing => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        warn!(generation, "WebSocket send failed: {}", e);
                    }
                }
                Some(Outbound::Close) | None => {
                    closing = true;
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        warn!(generation, "Failed to send close frame: {}", e);
                    }
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(Event::MessageReceived { generation, text });
                }
                Some(Ok(Message::Close(frame))) => {
                    close_frame = Some(match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                        None => (NO_STATUS_CLOSE, String::new()),
                    });
                }
                Some(Ok(_)) => {
                    debug!(generation, "Ignoring non-text frame");
                }
                Some(Err(WsError::ConnectionClosed)) | Some(Err(WsError::AlreadyClosed))
                    if close_frame.is_some() =>
                {
                    break;
                }
                Some(Err(e)) => {
                    let _ = events.send(Event::TransportError {
                        generation,
                        reason: e.to_string(),
                    });
                    close_frame = None;
                    break;
                }
                None => break,
            }
        }
    }

    let event = match close_frame {
        Some((code, reason)) => Event::Closed {
            generation,
            code,
            reason,
            clean: true,
        },
        None => Event::Closed {
            generation,
            code: ABNORMAL_CLOSE,
            reason: String::new(),
            clean: false,
        },
    };
    let _ = events.send(event);
}

/// Resolves once the owner asks for a close or drops the socket handle.
async fn close_requested(outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    loop {
        match outbound.recv().await {
            Some(Outbound::Text(_)) => {
                debug!("Dropping outbound message queued before open");
            }
            Some(Outbound::Close) | None => return,
        }
    }
}
