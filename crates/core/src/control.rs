//! Local control surface: control mode, speed, grid lines, key mapping.
//!
//! Control mode and grid-line visibility are client-owned and never changed
//! by the server. Speed is a mirror of a server-held value: local edits are
//! written optimistically and pushed, inbound settings overwrite it.

use tracing::{debug, info, warn};

use crate::connection::{ConnectionManager, Transport};
use crate::protocol::{Action, Direction, Outbound, Settings, Snapshot};

pub const SPEED_MIN: f64 = 0.5;
pub const SPEED_MAX: f64 = 2.0;
pub const SPEED_STEP: f64 = 0.1;

pub const HELP_TEXT: &str =
    "Use Arrow Keys or WASD to navigate the maze when in player control mode";

/// Physical keys the client distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    W,
    A,
    S,
    D,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` value.
    pub fn from_code(code: &str) -> Self {
        match code {
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "KeyW" => Key::W,
            "KeyA" => Key::A,
            "KeyS" => Key::S,
            "KeyD" => Key::D,
            _ => Key::Other,
        }
    }

    pub fn from_char(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'w' => Key::W,
            'a' => Key::A,
            's' => Key::S,
            'd' => Key::D,
            _ => Key::Other,
        }
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::ArrowUp | Key::W => Some(Direction::Up),
            Key::ArrowDown | Key::S => Some(Direction::Down),
            Key::ArrowLeft | Key::A => Some(Direction::Left),
            Key::ArrowRight | Key::D => Some(Direction::Right),
            Key::Other => None,
        }
    }
}

/// Outcome of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Not a direction key.
    Ignored,
    /// A direction key, but control mode is off or the round is over.
    Gated,
    /// Forwarded as an action. `sent` is false if the channel was not open.
    Forwarded { direction: Direction, sent: bool },
}

impl KeyDisposition {
    /// Whether the host should suppress the key's default behavior (scrolling).
    pub fn suppress_default(self) -> bool {
        matches!(self, KeyDisposition::Forwarded { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSurface {
    control_mode: bool,
    show_grid: bool,
    speed: f64,
}

impl ControlSurface {
    pub fn new(initial_speed: f64, show_grid: bool) -> Self {
        Self {
            control_mode: false,
            show_grid,
            speed: clamp_speed(initial_speed).unwrap_or(1.0),
        }
    }

    pub fn control_mode(&self) -> bool {
        self.control_mode
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Flip control mode and push it if the channel is open. Returns the new mode.
    pub fn toggle_control_mode<T: Transport>(&mut self, link: &mut ConnectionManager<T>) -> bool {
        self.control_mode = !self.control_mode;
        info!(
            "Control mode: {}",
            if self.control_mode { "player" } else { "ai" }
        );
        link.send(&Outbound::ControlMode(self.control_mode));
        self.control_mode
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    /// Set speed from local input. Values are clamped to the slider range;
    /// non-finite input is ignored. Returns the applied speed.
    pub fn set_speed<T: Transport>(
        &mut self,
        value: f64,
        link: &mut ConnectionManager<T>,
    ) -> Option<f64> {
        let Some(speed) = clamp_speed(value) else {
            warn!("Ignoring non-finite speed input {}", value);
            return None;
        };
        self.speed = speed;
        link.send(&Outbound::GameSpeed(speed));
        Some(speed)
    }

    /// Step the speed by `steps` slider increments.
    pub fn nudge_speed<T: Transport>(
        &mut self,
        steps: i32,
        link: &mut ConnectionManager<T>,
    ) -> Option<f64> {
        let target = ((self.speed / SPEED_STEP).round() + steps as f64) * SPEED_STEP;
        // Keep one decimal so the pushed value matches the label.
        let target = (target * 10.0).round() / 10.0;
        self.set_speed(target, link)
    }

    /// Reconcile server-pushed settings into the mirror.
    ///
    /// Only the speed is touched; control mode and grid lines stay local.
    pub fn apply_settings(&mut self, settings: &Settings) -> bool {
        match settings.game_speed {
            Some(speed) if speed.is_finite() && speed > 0.0 => {
                debug!("Server speed {} (was {})", speed, self.speed);
                self.speed = speed;
                true
            }
            _ => false,
        }
    }

    /// Forward a direction key when player control is on and the round is live.
    pub fn handle_key<T: Transport>(
        &self,
        key: Key,
        snapshot: &Snapshot,
        link: &mut ConnectionManager<T>,
    ) -> KeyDisposition {
        let Some(direction) = key.direction() else {
            return KeyDisposition::Ignored;
        };
        if !self.control_mode || snapshot.game_over {
            return KeyDisposition::Gated;
        }
        let sent = link.send(&Outbound::Action(Action::from(direction)));
        KeyDisposition::Forwarded { direction, sent }
    }

    pub fn control_button_label(&self) -> &'static str {
        if self.control_mode {
            "Watch AI"
        } else {
            "Take Control"
        }
    }

    pub fn grid_button_label(&self) -> &'static str {
        if self.show_grid {
            "Hide Grid"
        } else {
            "Show Grid"
        }
    }

    pub fn speed_label(&self) -> String {
        format!("{:.1}x", self.speed)
    }
}

fn clamp_speed(v: f64) -> Option<f64> {
    v.is_finite().then(|| v.clamp(SPEED_MIN, SPEED_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{socket_url, SocketEvent};
    use crate::testing::RecordingTransport;
    use serde_json::json;
    use std::time::Duration;

    fn open_link() -> ConnectionManager<RecordingTransport> {
        let mut link = ConnectionManager::new(
            RecordingTransport::new(),
            socket_url("http://localhost:8080").unwrap(),
            Duration::from_millis(2000),
        );
        let id = link.connect().unwrap();
        link.handle(id, SocketEvent::Opened);
        link.transport_mut().clear_sent();
        link
    }

    fn closed_link() -> ConnectionManager<RecordingTransport> {
        ConnectionManager::new(
            RecordingTransport::new(),
            socket_url("http://localhost:8080").unwrap(),
            Duration::from_millis(2000),
        )
    }

    #[test]
    fn every_direction_has_two_keys() {
        let pairs = [
            ("ArrowUp", "KeyW", Direction::Up),
            ("ArrowDown", "KeyS", Direction::Down),
            ("ArrowLeft", "KeyA", Direction::Left),
            ("ArrowRight", "KeyD", Direction::Right),
        ];
        for (primary, alt, dir) in pairs {
            assert_eq!(Key::from_code(primary).direction(), Some(dir));
            assert_eq!(Key::from_code(alt).direction(), Some(dir));
        }
        assert_eq!(Key::from_code("Space").direction(), None);
        assert_eq!(Key::from_char('W'), Key::W);
    }

    #[test]
    fn keys_are_gated_by_control_mode_and_game_over() {
        let mut link = open_link();
        let mut controls = ControlSurface::new(0.7, true);
        let mut snap = Snapshot::initial();

        assert_eq!(
            controls.handle_key(Key::ArrowUp, &snap, &mut link),
            KeyDisposition::Gated
        );
        assert!(link.transport().sent.is_empty());

        controls.toggle_control_mode(&mut link);
        link.transport_mut().clear_sent();
        let d = controls.handle_key(Key::ArrowUp, &snap, &mut link);
        assert_eq!(
            d,
            KeyDisposition::Forwarded {
                direction: Direction::Up,
                sent: true
            }
        );
        assert!(d.suppress_default());
        assert_eq!(link.transport().sent_json(), vec![json!({"action": "up"})]);

        snap.game_over = true;
        link.transport_mut().clear_sent();
        assert_eq!(
            controls.handle_key(Key::D, &snap, &mut link),
            KeyDisposition::Gated
        );
        assert!(link.transport().sent.is_empty());
    }

    #[test]
    fn other_keys_have_no_side_effect() {
        let mut link = open_link();
        let mut controls = ControlSurface::new(0.7, true);
        controls.toggle_control_mode(&mut link);
        link.transport_mut().clear_sent();
        let d = controls.handle_key(Key::Other, &Snapshot::initial(), &mut link);
        assert_eq!(d, KeyDisposition::Ignored);
        assert!(!d.suppress_default());
        assert!(link.transport().sent.is_empty());
    }

    #[test]
    fn toggles_push_when_open_and_update_labels() {
        let mut link = open_link();
        let mut controls = ControlSurface::new(0.7, true);
        assert_eq!(controls.control_button_label(), "Take Control");

        assert!(controls.toggle_control_mode(&mut link));
        assert_eq!(controls.control_button_label(), "Watch AI");
        assert!(!controls.toggle_control_mode(&mut link));
        assert_eq!(
            link.transport().sent_json(),
            vec![json!({"controlMode": true}), json!({"controlMode": false})]
        );

        assert_eq!(controls.grid_button_label(), "Hide Grid");
        assert!(!controls.toggle_grid());
        assert_eq!(controls.grid_button_label(), "Show Grid");
        assert_eq!(link.transport().sent.len(), 2);
    }

    #[test]
    fn local_changes_apply_even_when_disconnected() {
        let mut link = closed_link();
        let mut controls = ControlSurface::new(0.7, true);
        assert!(controls.toggle_control_mode(&mut link));
        assert_eq!(controls.set_speed(1.4, &mut link), Some(1.4));
        assert_eq!(controls.speed(), 1.4);
        assert!(link.transport().sent.is_empty());
    }

    #[test]
    fn speed_is_clamped_and_pushed() {
        let mut link = open_link();
        let mut controls = ControlSurface::new(0.7, true);
        assert_eq!(controls.speed_label(), "0.7x");

        assert_eq!(controls.set_speed(5.0, &mut link), Some(2.0));
        assert_eq!(controls.set_speed(0.1, &mut link), Some(0.5));
        assert_eq!(controls.set_speed(f64::NAN, &mut link), None);
        assert_eq!(controls.speed(), 0.5);
        assert_eq!(
            link.transport().sent_json(),
            vec![json!({"gameSpeed": 2.0}), json!({"gameSpeed": 0.5})]
        );

        assert_eq!(controls.nudge_speed(3, &mut link), Some(0.8));
        assert_eq!(controls.speed_label(), "0.8x");
    }

    #[test]
    fn inbound_settings_only_touch_speed() {
        let mut link = open_link();
        let mut controls = ControlSurface::new(0.7, false);
        controls.toggle_control_mode(&mut link);

        assert!(controls.apply_settings(&Settings {
            game_speed: Some(1.3)
        }));
        assert_eq!(controls.speed(), 1.3);
        assert_eq!(controls.speed_label(), "1.3x");
        assert!(controls.control_mode());
        assert!(!controls.show_grid());

        assert!(!controls.apply_settings(&Settings { game_speed: None }));
        assert_eq!(controls.speed(), 1.3);
    }
}
