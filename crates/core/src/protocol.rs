//! Wire protocol shared with the maze server.
//!
//! Every frame on the socket is one JSON text message. Outbound messages are
//! single-key objects (`{"controlMode": true}`, `{"gameSpeed": 1.2}`,
//! `{"action": "up"}`); inbound messages are either a settings envelope
//! (`{"settings": {...}}`) or a full game snapshot.

use serde::Serialize;

/// Default view width, in cells, shown before the first snapshot arrives.
pub const DEFAULT_GRID_WIDTH: usize = 20;
/// Default view height, in cells, shown before the first snapshot arrives.
pub const DEFAULT_GRID_HEIGHT: usize = 15;

// ═══════════════════════════════════════════════════════════════════════════
// Cells and grid
// ═══════════════════════════════════════════════════════════════════════════

/// What occupies one grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellTag {
    #[default]
    Empty,
    Wall,
    PlayerMarker,
    GoalMarker,
}

impl CellTag {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(CellTag::Empty),
            1 => Some(CellTag::Wall),
            2 => Some(CellTag::PlayerMarker),
            3 => Some(CellTag::GoalMarker),
            _ => None,
        }
    }
}

/// Row-major matrix of cell tags.
///
/// `width` and `height` are the dimensions the server declared. Rows are kept
/// exactly as received, so a row may be shorter or longer than `width`; use
/// [`Grid::get`] for guarded reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    rows: Vec<Vec<CellTag>>,
}

impl Grid {
    pub fn new(width: usize, height: usize, rows: Vec<Vec<CellTag>>) -> Self {
        Self {
            width,
            height,
            rows,
        }
    }

    /// A `width × height` grid with Wall tags on the border and Empty inside.
    pub fn bordered(width: usize, height: usize) -> Self {
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| {
                        let edge = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
                        if edge {
                            CellTag::Wall
                        } else {
                            CellTag::Empty
                        }
                    })
                    .collect()
            })
            .collect();
        Self::new(width, height, rows)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rows(&self) -> &[Vec<CellTag>] {
        &self.rows
    }

    /// Guarded cell read: `None` for missing rows or cells.
    pub fn get(&self, x: usize, y: usize) -> Option<CellTag> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// True when every declared row exists and holds exactly `width` cells.
    pub fn is_uniform(&self) -> bool {
        self.rows.len() == self.height && self.rows.iter().all(|r| r.len() == self.width)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Snapshot and settings
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// One complete server-authoritative description of the maze and game status.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub player: Position,
    pub goal: Position,
    pub score: i64,
    pub game_over: bool,
    pub won: bool,
}

impl Snapshot {
    /// The placeholder world held before the server has said anything.
    pub fn initial() -> Self {
        Self {
            grid: Grid::bordered(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT),
            player: Position::new(1, 1),
            goal: Position::new(
                DEFAULT_GRID_WIDTH as i64 - 2,
                DEFAULT_GRID_HEIGHT as i64 - 2,
            ),
            score: 0,
            game_over: false,
            won: false,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Server-held configuration pushed to the client. Unknown keys are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Settings {
    pub game_speed: Option<f64>,
}

/// A validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Settings(Settings),
    Snapshot(Snapshot),
}

// ═══════════════════════════════════════════════════════════════════════════
// Outbound messages
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Values of the outbound `action` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    GetSettings,
}

impl From<Direction> for Action {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => Action::Up,
            Direction::Down => Action::Down,
            Direction::Left => Action::Left,
            Direction::Right => Action::Right,
        }
    }
}

/// Client → server message. Serializes as a single-key object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outbound {
    ControlMode(bool),
    GameSpeed(f64),
    Action(Action),
}

impl Outbound {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_messages_are_single_key_objects() {
        let cases = [
            (Outbound::ControlMode(true), json!({"controlMode": true})),
            (Outbound::GameSpeed(1.5), json!({"gameSpeed": 1.5})),
            (Outbound::Action(Action::Left), json!({"action": "left"})),
            (
                Outbound::Action(Action::GetSettings),
                json!({"action": "getSettings"}),
            ),
        ];
        for (msg, expected) in cases {
            let text = msg.encode().unwrap();
            let v: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn initial_snapshot_is_a_bordered_default_maze() {
        let s = Snapshot::initial();
        assert_eq!(s.grid.width(), 20);
        assert_eq!(s.grid.height(), 15);
        assert!(s.grid.is_uniform());
        assert_eq!(s.player, Position::new(1, 1));
        assert_eq!(s.goal, Position::new(18, 13));
        assert_eq!(s.score, 0);
        assert!(!s.game_over);

        for x in 0..20 {
            assert_eq!(s.grid.get(x, 0), Some(CellTag::Wall));
            assert_eq!(s.grid.get(x, 14), Some(CellTag::Wall));
        }
        for y in 0..15 {
            assert_eq!(s.grid.get(0, y), Some(CellTag::Wall));
            assert_eq!(s.grid.get(19, y), Some(CellTag::Wall));
        }
        assert_eq!(s.grid.get(1, 1), Some(CellTag::Empty));
    }

    #[test]
    fn guarded_reads_skip_missing_cells() {
        let g = Grid::new(3, 2, vec![vec![CellTag::Wall]]);
        assert_eq!(g.get(0, 0), Some(CellTag::Wall));
        assert_eq!(g.get(2, 0), None);
        assert_eq!(g.get(0, 1), None);
        assert!(!g.is_uniform());
    }
}
