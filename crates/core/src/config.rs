//! Client configuration.
//!
//! Every field has a serde default so a partial (or empty) JSON file is a
//! valid config. Hosts layer their own overrides (CLI flags, page origin) on
//! top of what is loaded here.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
pub const DEFAULT_BASE_FPS: u32 = 20;
pub const DEFAULT_SPEED: f64 = 0.7;

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}

fn default_base_fps() -> u32 {
    DEFAULT_BASE_FPS
}

fn default_initial_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_true() -> bool {
    true
}

fn default_surface_width() -> u32 {
    640
}

fn default_surface_height() -> u32 {
    480
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the page hosting the game; the socket address is derived from it.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Nominal frame rate at speed 1.0.
    #[serde(default = "default_base_fps")]
    pub base_fps: u32,
    /// Speed shown until the server reports its own.
    #[serde(default = "default_initial_speed")]
    pub initial_speed: f64,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_surface_width")]
    pub surface_width: u32,
    #[serde(default = "default_surface_height")]
    pub surface_height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            base_fps: default_base_fps(),
            initial_speed: default_initial_speed(),
            show_grid: default_true(),
            surface_width: default_surface_width(),
            surface_height: default_surface_height(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Load `path`, falling back to defaults when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Base frame interval at speed 1.0, in milliseconds.
    pub fn base_frame_ms(&self) -> f64 {
        1000.0 / self.base_fps.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let cfg = ClientConfig::from_json("{}").unwrap();
        assert_eq!(cfg, ClientConfig::default());
        assert_eq!(cfg.reconnect_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.base_frame_ms(), 50.0);
        assert_eq!(cfg.initial_speed, 0.7);
        assert!(cfg.show_grid);
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg =
            ClientConfig::from_json(r#"{"server_url":"https://maze.example","show_grid":false}"#)
                .unwrap();
        assert_eq!(cfg.server_url, "https://maze.example");
        assert!(!cfg.show_grid);
        assert_eq!(cfg.base_fps, 20);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ClientConfig::from_json("{\"base_fps\": \"fast\"}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let dir = std::env::temp_dir().join(format!("mazeview-cfg-{}", std::process::id()));
        let path = dir.join("config.json");
        let cfg = ClientConfig {
            show_grid: false,
            reconnect_delay_ms: 500,
            ..ClientConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), cfg);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join("mazeview-definitely-missing/config.json");
        assert_eq!(
            ClientConfig::load_or_default(&path).unwrap(),
            ClientConfig::default()
        );
    }
}
