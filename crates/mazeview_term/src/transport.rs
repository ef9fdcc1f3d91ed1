//! WebSocket transport on tokio-tungstenite.
//!
//! Each connection runs as its own task. Lifecycle events flow back to the
//! main loop over one unbounded channel, tagged with the connection id;
//! outgoing text goes to the task over a per-connection channel. Dropping
//! that sender is how a connection is closed.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use mazeview::connection::{ConnectionId, SocketEvent, Transport};
use mazeview::error::TransportError;

pub type EventSender = UnboundedSender<(ConnectionId, SocketEvent)>;
pub type EventReceiver = UnboundedReceiver<(ConnectionId, SocketEvent)>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub struct WsTransport {
    events: EventSender,
    outgoing: HashMap<ConnectionId, UnboundedSender<String>>,
}

impl WsTransport {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            outgoing: HashMap::new(),
        }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<(), TransportError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Open(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.outgoing.insert(id, tx);
        handle.spawn(run_socket(id, url.clone(), self.events.clone(), rx));
        Ok(())
    }

    fn send_text(&mut self, id: ConnectionId, text: &str) -> Result<(), TransportError> {
        let tx = self.outgoing.get(&id).ok_or(TransportError::NotOpen)?;
        tx.send(text.to_string())
            .map_err(|_| TransportError::Send("socket task has exited".to_string()))
    }

    fn close(&mut self, id: ConnectionId) {
        self.outgoing.remove(&id);
    }
}

async fn run_socket(
    id: ConnectionId,
    url: Url,
    events: EventSender,
    mut outgoing: UnboundedReceiver<String>,
) {
    // Send errors only mean the main loop is gone; nothing is left to tell.
    let emit = |event: SocketEvent| {
        let _ = events.send((id, event));
    };

    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            emit(SocketEvent::Error(e.to_string()));
            emit(SocketEvent::Closed {
                code: None,
                reason: e.to_string(),
            });
            return;
        }
    };
    emit(SocketEvent::Opened);
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            text = outgoing.recv() => match text {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        emit(SocketEvent::Error(e.to_string()));
                        emit(SocketEvent::Closed { code: None, reason: e.to_string() });
                        return;
                    }
                }
                None => {
                    debug!("Closing connection {:?}", id);
                    let _ = write.close().await;
                    return;
                }
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => emit(SocketEvent::Message(text)),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(f) => (Some(u16::from(f.code)), f.reason.to_string()),
                        None => (None, String::new()),
                    };
                    emit(SocketEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(SocketEvent::Error(e.to_string()));
                    emit(SocketEvent::Closed { code: None, reason: e.to_string() });
                    return;
                }
                None => {
                    emit(SocketEvent::Closed { code: None, reason: String::new() });
                    return;
                }
            },
        }
    }
}
