//! mazeview - terminal spectator and controller for the maze game server
//!
//! Connects to the server's `/ws` socket, mirrors every snapshot into a
//! character-cell rendition of the maze and forwards arrow/WASD keys while in
//! player control mode.
//!
//! Storage locations:
//! - config: `<config dir>/mazeview/config.json`
//! - log:    `<data dir>/mazeview/mazeview.log`

use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use crossterm::event::{Event, EventStream};
use crossterm::terminal;
use futures_util::StreamExt;
use tracing::{debug, error, info, warn, Level};

use mazeview::client::MazeClient;
use mazeview::config::ClientConfig;
use mazeview::connection::Transport;
use mazeview::control::HELP_TEXT;
use mazeview::error::ConfigError;

mod input;
mod paths;
mod scheduler;
mod term_surface;
mod transport;

use input::{Command, KEY_HELP};
use paths::AppPaths;
use scheduler::TermScheduler;
use term_surface::{TermSurface, TerminalGuard};
use transport::{EventReceiver, WsTransport};

#[derive(Parser, Debug)]
#[command(name = "mazeview-term", version, about = "Watch or play the maze game from a terminal")]
struct Cli {
    /// Origin of the maze server (the page URL a browser would open)
    #[arg(long, env = "MAZEVIEW_SERVER")]
    server: Option<String>,
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Initial game speed, 0.5 to 2.0
    #[arg(long)]
    speed: Option<f64>,
    /// Start with grid lines hidden
    #[arg(long)]
    no_grid: bool,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(speed) = self.speed {
            config.initial_speed = speed;
        }
        if self.no_grid {
            config.show_grid = false;
        }
    }
}

fn init_logging(path: &Path, verbose: bool) -> io::Result<()> {
    // The terminal is in raw mode on the alternate screen; log to a file.
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match ClientConfig::load_or_default(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::Io(e)) => {
            warn!("Could not read {}: {}; using defaults", path.display(), e);
            Ok(ClientConfig::default())
        }
        Err(e) => Err(e),
    }
}

fn footer_lines<T: Transport>(client: &MazeClient<T>) -> Vec<String> {
    let controls = client.controls();
    vec![
        format!(
            "{}   Score: {}",
            client.status().status(),
            client.status().score()
        ),
        format!(
            "{} | {} | Speed {} | {}",
            controls.control_button_label(),
            controls.grid_button_label(),
            controls.speed_label(),
            KEY_HELP
        ),
        HELP_TEXT.to_string(),
    ]
}

fn apply_command<T: Transport>(client: &mut MazeClient<T>, command: Command) {
    match command {
        Command::Move(key) => {
            let disposition = client.handle_key(key);
            debug!("{:?} -> {:?}", key, disposition);
        }
        Command::ToggleControl => {
            client.toggle_control_mode();
        }
        Command::ToggleGrid => {
            client.toggle_grid();
        }
        Command::Speed(steps) => {
            client.nudge_speed(steps);
        }
        Command::Quit => {}
    }
}

async fn run<W: Write>(
    client: &mut MazeClient<WsTransport>,
    surface: &mut TermSurface<W>,
    sched: &mut TermScheduler,
    events: &mut EventReceiver,
) -> Result<(), Box<dyn Error>> {
    let mut keys = EventStream::new();

    loop {
        surface.set_footer(footer_lines(client));

        tokio::select! {
            Some((id, event)) = events.recv() => {
                client.handle_socket_event(id, event, sched);
            }
            Some(task) = sched.next(), if !sched.is_empty() => {
                client.run_task(task, surface, sched);
            }
            key = keys.next() => match key {
                Some(Ok(Event::Key(k))) => match input::command_for(&k) {
                    Some(Command::Quit) => break,
                    Some(command) => apply_command(client, command),
                    None => {}
                },
                Some(Ok(Event::Resize(cols, rows))) => surface.resize_cells(cols, rows),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
        }
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Setup application paths and logging
    let paths = AppPaths::new()?;
    init_logging(&paths.log_file(), cli.verbose)?;

    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let file_config = load_config(&config_path)?;
    let mut config = file_config.clone();
    cli.apply(&mut config);
    info!(
        "Starting mazeview (server {}, speed {}, grid {})",
        config.server_url, config.initial_speed, config.show_grid
    );

    let (events_tx, mut events_rx) = transport::event_channel();
    let mut client = MazeClient::new(config.clone(), WsTransport::new(events_tx))?;

    let (cols, rows) = terminal::size()?;
    let mut surface = TermSurface::new(
        BufWriter::with_capacity(16384, io::stdout()),
        config.surface_width as f64,
        config.surface_height as f64,
        cols,
        rows,
    );
    let mut sched = TermScheduler::new();

    let guard = TerminalGuard::enter()?;
    client.start(&surface, &mut sched)?;
    let result = run(&mut client, &mut surface, &mut sched, &mut events_rx).await;
    client.shutdown();
    drop(guard);

    // Grid visibility is the one preference that outlives a session.
    let mut saved = file_config;
    saved.show_grid = client.controls().show_grid();
    if let Err(e) = saved.save(&config_path) {
        error!("Could not save {}: {}", config_path.display(), e);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazeview::testing::RecordingTransport;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "mazeview-term",
            "--server",
            "https://maze.example.com",
            "--speed",
            "1.5",
            "--no-grid",
        ]);
        let mut config = ClientConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.server_url, "https://maze.example.com");
        assert_eq!(config.initial_speed, 1.5);
        assert!(!config.show_grid);
        assert_eq!(config.reconnect_delay_ms, 2000);
    }

    #[test]
    fn footer_reflects_client_state() {
        let mut client = MazeClient::new(ClientConfig::default(), RecordingTransport::new()).unwrap();
        let lines = footer_lines(&client);
        assert_eq!(lines[0], "Connecting...   Score: 0");
        assert!(lines[1].starts_with("Take Control | Hide Grid | Speed 0.7x"));

        apply_command(&mut client, Command::ToggleControl);
        apply_command(&mut client, Command::Speed(2));
        let lines = footer_lines(&client);
        assert!(lines[0].starts_with("Player Controlled"));
        assert!(lines[1].contains("Speed 0.9x"));
        assert_eq!(lines[2], HELP_TEXT);
    }

    #[test]
    fn unreadable_config_path_falls_back_to_defaults() {
        // A directory cannot be read as a file.
        let dir = std::env::temp_dir();
        let config = load_config(&dir).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let path = std::env::temp_dir().join(format!("mazeview-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        let _ = std::fs::remove_file(&path);
    }
}
