//! Duplex channel lifecycle: connect, send, receive, reconnect-on-loss.
//!
//! The manager never touches a socket directly. Hosts implement [`Transport`]
//! and feed lifecycle events back through [`ConnectionManager::handle`],
//! tagged with the [`ConnectionId`] they were opened with. Events from a
//! superseded connection are ignored.

use std::time::Duration;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{ClientError, TransportError};
use crate::protocol::{Action, Outbound};

/// Fixed path the server exposes its socket on.
pub const SOCKET_PATH: &str = "/ws";

/// Derive the socket address from the hosting page's origin.
///
/// `https` pages get `wss`, everything else `ws`. Host and port are kept; the
/// path is always [`SOCKET_PATH`].
pub fn socket_url(page_origin: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidServerUrl {
        url: page_origin.to_string(),
        reason,
    };

    let page = Url::parse(page_origin).map_err(|e| invalid(e.to_string()))?;
    let scheme = match page.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let host = page
        .host_str()
        .ok_or_else(|| invalid("no host".to_string()))?;
    let authority = match page.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    Url::parse(&format!("{scheme}://{authority}{SOCKET_PATH}")).map_err(|e| invalid(e.to_string()))
}

/// Identity of one connection attempt. Every reconnect gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

/// Lifecycle events a transport reports for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Error(String),
    Closed { code: Option<u16>, reason: String },
}

/// A duplex text-message socket.
pub trait Transport {
    /// Begin connecting. Completion (or failure) is reported later as
    /// [`SocketEvent::Opened`] / [`SocketEvent::Closed`] for `id`.
    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<(), TransportError>;

    fn send_text(&mut self, id: ConnectionId, text: &str) -> Result<(), TransportError>;

    /// Release everything held for `id`. Also called for connections that
    /// already closed on their own.
    fn close(&mut self, id: ConnectionId);
}

/// What the client should do in response to a socket event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkUpdate {
    /// The channel just opened; the settings request has been sent.
    Opened,
    /// A raw payload to validate and dispatch.
    Inbound(String),
    /// The channel closed; schedule exactly one reconnect after `retry_in`.
    Lost { retry_in: Duration },
    /// Nothing to do (logged error, duplicate close, stale connection).
    Ignored,
}

pub struct ConnectionManager<T> {
    transport: T,
    url: Url,
    state: LinkState,
    current: Option<ConnectionId>,
    next_id: u64,
    attempts: u64,
    reconnect_delay: Duration,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, url: Url, reconnect_delay: Duration) -> Self {
        Self {
            transport,
            url,
            state: LinkState::Closed,
            current: None,
            next_id: 0,
            attempts: 0,
            reconnect_delay,
        }
    }

    /// Start a new connection attempt, superseding any live one.
    pub fn connect(&mut self) -> Result<ConnectionId, TransportError> {
        if let (Some(old), LinkState::Connecting | LinkState::Open) = (self.current, self.state) {
            debug!("Superseding connection {:?}", old);
            self.transport.close(old);
        }

        self.next_id += 1;
        self.attempts += 1;
        let id = ConnectionId(self.next_id);
        self.current = Some(id);
        self.state = LinkState::Connecting;
        info!("Connecting to {} (attempt {})", self.url, self.attempts);

        if let Err(e) = self.transport.open(id, &self.url) {
            self.state = LinkState::Closed;
            return Err(e);
        }
        Ok(id)
    }

    /// Fire-and-forget send. Dropped (returns `false`) unless the channel is open.
    pub fn send(&mut self, msg: &Outbound) -> bool {
        let Some(id) = self.current.filter(|_| self.state == LinkState::Open) else {
            debug!("Dropping {:?}: channel not open", msg);
            return false;
        };

        let text = match msg.encode() {
            Ok(t) => t,
            Err(e) => {
                error!("Could not encode {:?}: {}", msg, e);
                return false;
            }
        };

        match self.transport.send_text(id, &text) {
            Ok(()) => true,
            Err(e) => {
                error!("Send failed: {}", e);
                false
            }
        }
    }

    pub fn handle(&mut self, id: ConnectionId, event: SocketEvent) -> LinkUpdate {
        if self.current != Some(id) {
            debug!("Ignoring {:?} from stale connection {:?}", event, id);
            return LinkUpdate::Ignored;
        }

        match event {
            SocketEvent::Opened => {
                if self.state != LinkState::Connecting {
                    return LinkUpdate::Ignored;
                }
                self.state = LinkState::Open;
                info!("Socket connection established");
                // The server is the source of truth for settings at connect time.
                self.send(&Outbound::Action(Action::GetSettings));
                LinkUpdate::Opened
            }
            SocketEvent::Message(text) => {
                if self.state == LinkState::Closed {
                    return LinkUpdate::Ignored;
                }
                LinkUpdate::Inbound(text)
            }
            SocketEvent::Error(e) => {
                error!("Socket error: {}", e);
                LinkUpdate::Ignored
            }
            SocketEvent::Closed { code, reason } => {
                if self.state == LinkState::Closed {
                    return LinkUpdate::Ignored;
                }
                self.state = LinkState::Closed;
                // Release whatever the transport still holds for this id.
                self.transport.close(id);
                warn!(
                    "Socket connection closed (code={:?}, reason={:?}); retrying in {:?}",
                    code, reason, self.reconnect_delay
                );
                LinkUpdate::Lost {
                    retry_in: self.reconnect_delay,
                }
            }
        }
    }

    /// Close the live connection without scheduling anything.
    pub fn close(&mut self) {
        if let Some(id) = self.current {
            if self.state != LinkState::Closed {
                self.transport.close(id);
            }
        }
        self.state = LinkState::Closed;
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    pub fn current(&self) -> Option<ConnectionId> {
        self.current
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
