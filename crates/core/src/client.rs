//! The client context: one value owning everything the hosts drive.
//!
//! Hosts hold a single [`MazeClient`] and forward their callbacks (socket
//! events, key presses, button clicks, timer expiries) into its handler
//! methods. Each handler runs to completion with `&mut self`.

use tracing::{error, info, warn};

use crate::config::ClientConfig;
use crate::connection::{socket_url, ConnectionId, ConnectionManager, LinkUpdate, SocketEvent, Transport};
use crate::control::{ControlSurface, Key, KeyDisposition};
use crate::error::{ClientError, SurfaceError};
use crate::protocol::Inbound;
use crate::render::RenderLoop;
use crate::schedule::{Scheduler, Task};
use crate::status::StatusBoard;
use crate::surface::Surface;
use crate::validate::validate;
use crate::view::GameView;

pub struct MazeClient<T> {
    config: ClientConfig,
    view: GameView,
    controls: ControlSurface,
    status: StatusBoard,
    link: ConnectionManager<T>,
    render: RenderLoop,
    shutdown: bool,
}

impl<T: Transport> MazeClient<T> {
    /// Build the context. Fails if the configured server origin is not a usable URL.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        let url = socket_url(&config.server_url)?;
        info!("Socket endpoint {}", url);
        let link = ConnectionManager::new(transport, url, config.reconnect_delay());
        Ok(Self {
            view: GameView::new(),
            controls: ControlSurface::new(config.initial_speed, config.show_grid),
            status: StatusBoard::new(),
            link,
            render: RenderLoop::new(config.base_frame_ms()),
            shutdown: false,
            config,
        })
    }

    /// Check the surface, open the first connection and schedule the first frame.
    pub fn start<S, Q>(&mut self, surface: &S, scheduler: &mut Q) -> Result<(), ClientError>
    where
        S: Surface + ?Sized,
        Q: Scheduler + ?Sized,
    {
        let (w, h) = surface.size();
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(SurfaceError::Unavailable(format!("surface extent is {w}x{h}")).into());
        }
        self.connect(scheduler);
        scheduler.schedule(std::time::Duration::ZERO, Task::Frame);
        Ok(())
    }

    fn connect<Q: Scheduler + ?Sized>(&mut self, scheduler: &mut Q) {
        if let Err(e) = self.link.connect() {
            error!("{}", e);
            self.lost(scheduler);
        }
    }

    fn lost<Q: Scheduler + ?Sized>(&mut self, scheduler: &mut Q) {
        self.status.disconnected();
        if !self.shutdown {
            scheduler.schedule(self.link.reconnect_delay(), Task::Reconnect);
        }
    }

    pub fn handle_socket_event<Q: Scheduler + ?Sized>(
        &mut self,
        id: ConnectionId,
        event: SocketEvent,
        scheduler: &mut Q,
    ) {
        match self.link.handle(id, event) {
            LinkUpdate::Opened => self.status.connected(),
            LinkUpdate::Inbound(raw) => self.handle_inbound(&raw),
            LinkUpdate::Lost { .. } => self.lost(scheduler),
            LinkUpdate::Ignored => {}
        }
    }

    /// Validate one raw payload and apply it. Rejected payloads change nothing
    /// but the reject counter.
    pub fn handle_inbound(&mut self, raw: &str) {
        match validate(raw) {
            Ok(Inbound::Settings(settings)) => {
                self.controls.apply_settings(&settings);
            }
            Ok(Inbound::Snapshot(snapshot)) => {
                self.status.snapshot(&snapshot, self.controls.control_mode());
                self.view.replace(snapshot);
            }
            Err(rejection) => {
                warn!("Dropping inbound message: {}", rejection);
                self.view.note_rejected();
            }
        }
    }

    /// Re-enter a scheduled loop. Nothing runs or reschedules after shutdown.
    pub fn run_task<S, Q>(&mut self, task: Task, surface: &mut S, scheduler: &mut Q)
    where
        S: Surface + ?Sized,
        Q: Scheduler + ?Sized,
    {
        if self.shutdown {
            return;
        }
        match task {
            Task::Frame => {
                let delay = self.render.tick(
                    surface,
                    &self.view,
                    self.controls.show_grid(),
                    self.controls.speed(),
                );
                scheduler.schedule(delay, Task::Frame);
            }
            Task::Reconnect => self.connect(scheduler),
        }
    }

    pub fn handle_key(&mut self, key: Key) -> KeyDisposition {
        self.controls
            .handle_key(key, self.view.snapshot(), &mut self.link)
    }

    pub fn toggle_control_mode(&mut self) -> bool {
        let mode = self.controls.toggle_control_mode(&mut self.link);
        self.status.control_mode(mode);
        mode
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.controls.toggle_grid()
    }

    pub fn set_speed(&mut self, value: f64) -> Option<f64> {
        self.controls.set_speed(value, &mut self.link)
    }

    pub fn nudge_speed(&mut self, steps: i32) -> Option<f64> {
        self.controls.nudge_speed(steps, &mut self.link)
    }

    /// Stop both loops and close the live connection.
    pub fn shutdown(&mut self) {
        if self.shutdown {
            return;
        }
        info!(
            "Shutting down after {} frames, {} snapshots",
            self.render.frames(),
            self.view.accepted_count()
        );
        self.shutdown = true;
        self.link.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn view(&self) -> &GameView {
        &self.view
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn link(&self) -> &ConnectionManager<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.link
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::VirtualScheduler;
    use crate::surface::RecordingSurface;
    use crate::testing::RecordingTransport;
    use std::time::Duration;

    #[test]
    fn start_rejects_empty_surface() {
        let mut client = MazeClient::new(ClientConfig::default(), RecordingTransport::new()).unwrap();
        let mut sched = VirtualScheduler::new();
        let err = client
            .start(&RecordingSurface::new(0.0, 480.0), &mut sched)
            .unwrap_err();
        assert!(matches!(err, ClientError::Surface(SurfaceError::Unavailable(_))));
        assert_eq!(sched.pending(), 0);
        assert!(client.link().transport().opened.is_empty());
    }

    #[test]
    fn bad_server_url_is_fatal() {
        let config = ClientConfig {
            server_url: "nowhere".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            MazeClient::new(config, RecordingTransport::new()),
            Err(ClientError::InvalidServerUrl { .. })
        ));
    }

    #[test]
    fn refused_open_schedules_reconnect() {
        let mut transport = RecordingTransport::new();
        transport.refuse_open = true;
        let mut client = MazeClient::new(ClientConfig::default(), transport).unwrap();
        let mut sched = VirtualScheduler::new();
        client
            .start(&RecordingSurface::new(640.0, 480.0), &mut sched)
            .unwrap();
        assert_eq!(client.status().status(), "Disconnected");
        assert_eq!(sched.pending_of(Task::Reconnect), 1);
        assert_eq!(sched.pending_of(Task::Frame), 1);
        assert!(sched
            .history()
            .contains(&(Duration::from_millis(2000), Task::Reconnect)));
    }
}
