//! Textual status and score readouts shown next to the maze.

use crate::protocol::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBoard {
    status: String,
    score: String,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            status: "Connecting...".to_string(),
            score: "0".to_string(),
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn score(&self) -> &str {
        &self.score
    }

    pub fn connected(&mut self) {
        self.set("Connected (AI Controlled)");
    }

    pub fn disconnected(&mut self) {
        self.set("Disconnected");
    }

    /// Reflect a control-mode flip before the server has acknowledged it.
    pub fn control_mode(&mut self, player_controlled: bool) {
        self.set(mode_text(player_controlled));
    }

    pub fn snapshot(&mut self, snapshot: &Snapshot, player_controlled: bool) {
        self.score = snapshot.score.to_string();
        let text = if snapshot.game_over {
            match (snapshot.won, player_controlled) {
                (true, true) => "You Win!",
                (true, false) => "AI Wins!",
                (false, _) => "Game Over",
            }
        } else {
            mode_text(player_controlled)
        };
        self.set(text);
    }

    fn set(&mut self, text: &str) {
        if self.status != text {
            self.status.clear();
            self.status.push_str(text);
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

fn mode_text(player_controlled: bool) -> &'static str {
    if player_controlled {
        "Player Controlled"
    } else {
        "AI Controlled"
    }
}
