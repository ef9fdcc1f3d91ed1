//! Inbound payload classification and validation.
//!
//! A payload is a settings message iff its top-level object carries a
//! `settings` key; such payloads never go through grid checks. Everything else
//! must be a snapshot with a non-empty `maze.cells` sequence of sequences.
//!
//! Rows are not required to match `maze.width`: ragged data is accepted here
//! and the renderer skips missing cells.

use serde_json::{Map, Value};

use crate::error::Rejection;
use crate::protocol::{CellTag, Grid, Inbound, Position, Settings, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Settings,
    Snapshot,
}

/// Discriminate a parsed payload without validating it.
pub fn classify(value: &Value) -> Option<MessageKind> {
    let obj = value.as_object()?;
    if obj.contains_key("settings") {
        Some(MessageKind::Settings)
    } else {
        Some(MessageKind::Snapshot)
    }
}

/// Parse and validate one raw text frame.
pub fn validate(raw: &str) -> Result<Inbound, Rejection> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Rejection::NotJson(e.to_string()))?;
    validate_value(&value)
}

pub fn validate_value(value: &Value) -> Result<Inbound, Rejection> {
    let obj = value.as_object().ok_or(Rejection::NotAnObject)?;

    match classify(value) {
        Some(MessageKind::Settings) => parse_settings(&obj["settings"]).map(Inbound::Settings),
        Some(MessageKind::Snapshot) => parse_snapshot(obj).map(Inbound::Snapshot),
        None => Err(Rejection::NotAnObject),
    }
}

fn parse_settings(v: &Value) -> Result<Settings, Rejection> {
    let obj = v
        .as_object()
        .ok_or_else(|| Rejection::BadSettings("expected an object".to_string()))?;

    let game_speed = match obj.get("gameSpeed") {
        None | Some(Value::Null) => None,
        Some(s) => {
            let speed = s
                .as_f64()
                .ok_or_else(|| Rejection::BadSettings("gameSpeed is not a number".to_string()))?;
            if !speed.is_finite() || speed <= 0.0 {
                return Err(Rejection::BadSettings(format!(
                    "gameSpeed must be positive (got {speed})"
                )));
            }
            Some(speed)
        }
    };

    Ok(Settings { game_speed })
}

fn parse_snapshot(obj: &Map<String, Value>) -> Result<Snapshot, Rejection> {
    let maze = obj
        .get("maze")
        .and_then(Value::as_object)
        .ok_or(Rejection::MissingGrid)?;
    let cells = maze.get("cells").ok_or(Rejection::MissingGrid)?;
    let rows = cells.as_array().ok_or(Rejection::CellsNotSequence)?;
    if rows.is_empty() {
        return Err(Rejection::EmptyCells);
    }

    let mut grid_rows = Vec::with_capacity(rows.len());
    for (y, row) in rows.iter().enumerate() {
        let row = row.as_array().ok_or(Rejection::RowNotSequence { row: y })?;
        let mut tags = Vec::with_capacity(row.len());
        for (x, cell) in row.iter().enumerate() {
            let tag = cell
                .as_u64()
                .and_then(CellTag::from_code)
                .ok_or_else(|| Rejection::UnknownCell {
                    row: y,
                    col: x,
                    code: cell.to_string(),
                })?;
            tags.push(tag);
        }
        grid_rows.push(tags);
    }

    let width = dimension(maze.get("width"))?;
    let height = dimension(maze.get("height"))?;

    Ok(Snapshot {
        grid: Grid::new(width, height, grid_rows),
        player: Position::new(int_field(obj, "player_x")?, int_field(obj, "player_y")?),
        goal: Position::new(int_field(obj, "goal_x")?, int_field(obj, "goal_y")?),
        score: int_field(obj, "score")?,
        game_over: bool_field(obj, "game_over")?,
        won: bool_field(obj, "won")?,
    })
}

fn dimension(v: Option<&Value>) -> Result<usize, Rejection> {
    v.and_then(as_integer)
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .ok_or(Rejection::BadDimensions)
}

// Integral floats (`2.0`) are accepted; servers written in loosely typed
// languages emit them.
fn as_integer(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn int_field(obj: &Map<String, Value>, field: &'static str) -> Result<i64, Rejection> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(v) => as_integer(v).ok_or(Rejection::BadField { field }),
    }
}

fn bool_field(obj: &Map<String, Value>, field: &'static str) -> Result<bool, Rejection> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(v) => v.as_bool().ok_or(Rejection::BadField { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_json(cells: Value) -> String {
        json!({
            "maze": { "cells": cells, "width": 3, "height": 2 },
            "player_x": 1, "player_y": 0,
            "goal_x": 2, "goal_y": 1,
            "score": 4, "game_over": false, "won": false
        })
        .to_string()
    }

    #[test]
    fn rejects_missing_or_malformed_grids() {
        let bad = [
            json!({}).to_string(),
            json!({"maze": {}}).to_string(),
            json!({"maze": 7}).to_string(),
            json!({"player_x": 1}).to_string(),
            snapshot_json(json!(5)),
            snapshot_json(json!("cells")),
            snapshot_json(json!({"0": [1]})),
            snapshot_json(json!([])),
            snapshot_json(json!([[1, 1, 1], 0])),
            snapshot_json(json!([null])),
        ];
        for raw in &bad {
            assert!(validate(raw).is_err(), "accepted {raw}");
        }

        assert_eq!(
            validate(&snapshot_json(json!([]))),
            Err(Rejection::EmptyCells)
        );
        assert_eq!(
            validate(&snapshot_json(json!([[1, 1, 1], "x"]))),
            Err(Rejection::RowNotSequence { row: 1 })
        );
    }

    #[test]
    fn rejects_non_json_and_non_objects() {
        assert!(matches!(validate("{not json"), Err(Rejection::NotJson(_))));
        assert_eq!(validate("[1,2]"), Err(Rejection::NotAnObject));
        assert_eq!(validate("42"), Err(Rejection::NotAnObject));
    }

    #[test]
    fn settings_key_wins_regardless_of_grid_shape() {
        let raws = [
            json!({"settings": {"gameSpeed": 1.3}}),
            json!({"settings": {"gameSpeed": 1.3}, "maze": 5}),
            json!({"settings": {"gameSpeed": 1.3}, "maze": {"cells": []}}),
            json!({"settings": {"gameSpeed": 1.3, "difficulty": "hard"}}),
        ];
        for raw in &raws {
            assert_eq!(classify(raw), Some(MessageKind::Settings));
            match validate(&raw.to_string()) {
                Ok(Inbound::Settings(s)) => assert_eq!(s.game_speed, Some(1.3)),
                other => panic!("expected settings, got {other:?}"),
            }
        }
    }

    #[test]
    fn settings_without_speed_is_empty() {
        let raw = json!({"settings": {}}).to_string();
        assert_eq!(
            validate(&raw),
            Ok(Inbound::Settings(Settings { game_speed: None }))
        );
    }

    #[test]
    fn malformed_settings_are_rejected() {
        for raw in [
            json!({"settings": 3}),
            json!({"settings": {"gameSpeed": "fast"}}),
            json!({"settings": {"gameSpeed": 0.0}}),
            json!({"settings": {"gameSpeed": -1.0}}),
        ] {
            assert!(matches!(
                validate(&raw.to_string()),
                Err(Rejection::BadSettings(_))
            ));
        }
    }

    #[test]
    fn accepts_well_formed_snapshot() {
        let raw = snapshot_json(json!([[1, 1, 1], [1, 0, 3]]));
        let Ok(Inbound::Snapshot(s)) = validate(&raw) else {
            panic!("expected snapshot");
        };
        assert_eq!(s.grid.width(), 3);
        assert_eq!(s.grid.height(), 2);
        assert!(s.grid.is_uniform());
        assert_eq!(s.grid.get(2, 1), Some(CellTag::GoalMarker));
        assert_eq!(s.player, Position::new(1, 0));
        assert_eq!(s.goal, Position::new(2, 1));
        assert_eq!(s.score, 4);
    }

    #[test]
    fn accepts_ragged_rows() {
        let raw = snapshot_json(json!([[1, 1, 1], [1]]));
        let Ok(Inbound::Snapshot(s)) = validate(&raw) else {
            panic!("ragged rows should pass validation");
        };
        assert!(!s.grid.is_uniform());
        assert_eq!(s.grid.get(2, 1), None);
    }

    #[test]
    fn rejects_unknown_cell_codes_and_bad_dims() {
        assert!(matches!(
            validate(&snapshot_json(json!([[1, 9, 1]]))),
            Err(Rejection::UnknownCell { row: 0, col: 1, .. })
        ));
        assert!(matches!(
            validate(&snapshot_json(json!([[1, "w", 1]]))),
            Err(Rejection::UnknownCell { .. })
        ));

        let zero_width = json!({"maze": {"cells": [[1]], "width": 0, "height": 1}}).to_string();
        assert_eq!(validate(&zero_width), Err(Rejection::BadDimensions));
        let no_height = json!({"maze": {"cells": [[1]], "width": 1}}).to_string();
        assert_eq!(validate(&no_height), Err(Rejection::BadDimensions));
    }

    #[test]
    fn status_fields_default_when_absent_but_must_be_typed() {
        let raw = json!({"maze": {"cells": [[0]], "width": 1, "height": 1}}).to_string();
        let Ok(Inbound::Snapshot(s)) = validate(&raw) else {
            panic!("expected snapshot");
        };
        assert_eq!(s.score, 0);
        assert!(!s.game_over);

        let raw = json!({
            "maze": {"cells": [[0]], "width": 1, "height": 1},
            "game_over": "yes"
        })
        .to_string();
        assert_eq!(
            validate(&raw),
            Err(Rejection::BadField { field: "game_over" })
        );

        let raw = json!({
            "maze": {"cells": [[0]], "width": 1.0, "height": 1},
            "score": 12.0
        })
        .to_string();
        let Ok(Inbound::Snapshot(s)) = validate(&raw) else {
            panic!("integral floats should be accepted");
        };
        assert_eq!(s.score, 12);
    }
}
