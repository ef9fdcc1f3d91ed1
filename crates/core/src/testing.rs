//! In-memory stand-ins for host resources.
//!
//! Used by the unit tests, the integration tests under `tests/`, and the
//! benches; no socket is involved.

use serde_json::Value;
use url::Url;

use crate::connection::{ConnectionId, Transport};
use crate::error::TransportError;

/// A [`Transport`] that records every call instead of talking to a server.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub opened: Vec<(ConnectionId, Url)>,
    pub sent: Vec<(ConnectionId, String)>,
    pub closed: Vec<ConnectionId>,
    /// When set, `open` fails synchronously.
    pub refuse_open: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sent payloads parsed back into JSON, in order.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent
            .iter()
            .filter_map(|(_, text)| serde_json::from_str(text).ok())
            .collect()
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Transport for RecordingTransport {
    fn open(&mut self, id: ConnectionId, url: &Url) -> Result<(), TransportError> {
        if self.refuse_open {
            return Err(TransportError::Open("connection refused".to_string()));
        }
        self.opened.push((id, url.clone()));
        Ok(())
    }

    fn send_text(&mut self, id: ConnectionId, text: &str) -> Result<(), TransportError> {
        self.sent.push((id, text.to_string()));
        Ok(())
    }

    fn close(&mut self, id: ConnectionId) {
        self.closed.push(id);
    }
}
