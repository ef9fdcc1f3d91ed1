//! # mazeview
//!
//! Spectator and controller client for a server-driven maze game.
//!
//! The server owns the maze, runs the game loop and optionally an AI agent.
//! This crate is the host-neutral part of the client: it validates inbound
//! snapshots, keeps the last known world, forwards player input, and paints
//! frames onto an abstract [`surface::Surface`] at a speed-dependent cadence.
//!
//! ## Quick Start
//!
//! ```
//! use mazeview::prelude::*;
//! use mazeview::testing::RecordingTransport;
//!
//! let mut client = MazeClient::new(ClientConfig::default(), RecordingTransport::new()).unwrap();
//! let mut surface = RecordingSurface::new(640.0, 480.0);
//! let mut sched = VirtualScheduler::new();
//! client.start(&surface, &mut sched).unwrap();
//!
//! // Feed one snapshot and paint the first frame.
//! client.handle_inbound(r#"{"maze":{"cells":[[1,1],[1,0]],"width":2,"height":2},"score":3}"#);
//! while let Some(task) = sched.pop_due() {
//!     client.run_task(task, &mut surface, &mut sched);
//! }
//! assert_eq!(client.view().snapshot().score, 3);
//! ```
//!
//! ## Hosts
//!
//! Hosts supply three things: a [`connection::Transport`] (socket), a
//! [`surface::Surface`] (drawing), and a [`schedule::Scheduler`] (timers).
//! `mazeview_term` runs in a terminal on tokio; `mazeview_web` runs in the
//! browser on `web-sys`.
//!
//! ## Modules
//!
//! - [`validate`]: inbound payload checks
//! - [`connection`]: socket lifecycle and reconnect
//! - [`control`]: control mode, speed, grid lines, key mapping
//! - [`render`]: frame painting and cadence
//! - [`client`]: the context tying them together

pub mod client;
pub mod config;
pub mod connection;
pub mod control;
pub mod error;
pub mod protocol;
pub mod render;
pub mod schedule;
pub mod status;
pub mod surface;
pub mod testing;
pub mod validate;
pub mod view;

/// Prelude module for convenient imports.
///
/// ```
/// use mazeview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::MazeClient;
    pub use crate::config::ClientConfig;
    pub use crate::connection::{
        socket_url, ConnectionId, ConnectionManager, LinkState, LinkUpdate, SocketEvent, Transport,
    };
    pub use crate::control::{ControlSurface, Key, KeyDisposition, HELP_TEXT};
    pub use crate::error::{ClientError, ConfigError, Rejection, SurfaceError, TransportError};
    pub use crate::protocol::{CellTag, Direction, Grid, Inbound, Outbound, Position, Settings, Snapshot};
    pub use crate::render::{frame_delay, paint_frame, Palette, RenderLoop};
    pub use crate::schedule::{Scheduler, Task, VirtualScheduler};
    pub use crate::status::StatusBoard;
    pub use crate::surface::{DrawOp, Font, RecordingSurface, Rgba, Surface, TextAlign};
    pub use crate::view::GameView;
}
