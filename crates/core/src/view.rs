//! Game view model: the last snapshot the server sent us.

use std::rc::Rc;

use crate::protocol::Snapshot;

/// Current known state of the world.
///
/// Written only by the inbound-message path and read by the renderer and the
/// control surface. Replacement rebinds the whole snapshot, so a reader never
/// sees fields from two different snapshots.
#[derive(Debug, Clone)]
pub struct GameView {
    current: Rc<Snapshot>,
    received: bool,
    accepted: u64,
    rejected: u64,
}

impl GameView {
    pub fn new() -> Self {
        Self {
            current: Rc::new(Snapshot::initial()),
            received: false,
            accepted: 0,
            rejected: 0,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    /// Shared handle to the current snapshot; stays valid across later replacements.
    pub fn shared(&self) -> Rc<Snapshot> {
        Rc::clone(&self.current)
    }

    /// False until the first valid snapshot has been applied.
    pub fn has_received(&self) -> bool {
        self.received
    }

    pub fn replace(&mut self, snapshot: Snapshot) {
        self.current = Rc::new(snapshot);
        self.received = true;
        self.accepted += 1;
    }

    pub fn note_rejected(&mut self) {
        self.rejected += 1;
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}

impl Default for GameView {
    fn default() -> Self {
        Self::new()
    }
}
