//! Render loop: paints the current view onto a [`Surface`] once per cycle.
//!
//! A cycle never returns an error to its caller. Drawing failures are logged
//! and counted at the frame boundary, and the next cycle is still scheduled.

use std::time::Duration;

use tracing::{debug, error};

use crate::error::SurfaceError;
use crate::protocol::{CellTag, Position, Snapshot};
use crate::surface::{Font, Rgba, Surface, TextAlign};
use crate::view::GameView;

pub const LOADING_TEXT: &str = "Loading...";
pub const WON_TEXT: &str = "MAZE SOLVED!";
pub const LOST_TEXT: &str = "GAME OVER";
pub const NEXT_ROUND_TEXT: &str = "New maze will generate shortly...";

/// Player circle radius as a fraction of the smaller cell side.
const PLAYER_RADIUS: f64 = 0.4;
/// Goal square inset on each side, as a fraction of the cell.
const GOAL_INSET: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: Rgba,
    pub wall: Rgba,
    pub player: Rgba,
    pub goal: Rgba,
    pub empty: Rgba,
    pub grid_line: Rgba,
    pub text: Rgba,
    pub goal_cross: Rgba,
    pub dim: Rgba,
    pub banner: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0xf0, 0xf0, 0xf0),
            wall: Rgba::rgb(0x33, 0x33, 0x33),
            player: Rgba::rgb(0x42, 0x85, 0xf4),
            goal: Rgba::rgb(0xea, 0x43, 0x35),
            empty: Rgba::WHITE,
            grid_line: Rgba::rgb(0xcc, 0xcc, 0xcc),
            text: Rgba::BLACK,
            goal_cross: Rgba::WHITE,
            dim: Rgba::rgba(0, 0, 0, 0.5),
            banner: Rgba::WHITE,
        }
    }
}

impl Palette {
    pub fn cell(&self, tag: CellTag) -> Rgba {
        match tag {
            CellTag::Empty => self.empty,
            CellTag::Wall => self.wall,
            CellTag::PlayerMarker => self.player,
            CellTag::GoalMarker => self.goal,
        }
    }
}

/// Longest gap between two frames, whatever speed the server pushes.
pub const MAX_FRAME_DELAY_MS: f64 = 1000.0;

/// Delay before the next cycle: `base_frame_ms / speed`, capped at
/// [`MAX_FRAME_DELAY_MS`].
///
/// A speed that is not a finite positive number counts as 1.0.
pub fn frame_delay(base_frame_ms: f64, speed: f64) -> Duration {
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        1.0
    };
    let ms = (base_frame_ms / speed).clamp(0.0, MAX_FRAME_DELAY_MS);
    Duration::from_nanos((ms * 1_000_000.0).round() as u64)
}

/// Paint one complete frame of `view`.
pub fn paint_frame<S: Surface + ?Sized>(
    surface: &mut S,
    view: &GameView,
    show_grid: bool,
    palette: &Palette,
) -> Result<(), SurfaceError> {
    let (w, h) = surface.size();
    surface.fill_rect(0.0, 0.0, w, h, palette.background)?;

    if !view.has_received() {
        surface.text(
            LOADING_TEXT,
            w / 2.0,
            h / 2.0,
            Font::regular(20.0),
            TextAlign::Center,
            palette.text,
        )?;
        return surface.present();
    }

    // Hold our own handle so the whole frame reads one snapshot.
    let snapshot = view.shared();
    let cell_w = w / snapshot.grid.width() as f64;
    let cell_h = h / snapshot.grid.height() as f64;

    paint_cells(surface, &snapshot, cell_w, cell_h, show_grid, palette)?;
    paint_player(surface, snapshot.player, cell_w, cell_h, palette)?;
    paint_goal(surface, snapshot.goal, cell_w, cell_h, palette)?;

    surface.text(
        &format!("Score: {}", snapshot.score),
        10.0,
        25.0,
        Font::regular(16.0),
        TextAlign::Left,
        palette.text,
    )?;

    if snapshot.game_over {
        paint_game_over(surface, snapshot.won, w, h, palette)?;
    }

    surface.present()
}

fn paint_cells<S: Surface + ?Sized>(
    surface: &mut S,
    snapshot: &Snapshot,
    cell_w: f64,
    cell_h: f64,
    show_grid: bool,
    palette: &Palette,
) -> Result<(), SurfaceError> {
    let grid = &snapshot.grid;
    // Walk the cells that were received, clipped to the declared size. The
    // declared size alone says nothing about how much data arrived.
    for (y, row) in grid.rows().iter().enumerate().take(grid.height()) {
        for (x, &tag) in row.iter().enumerate().take(grid.width()) {
            let px = x as f64 * cell_w;
            let py = y as f64 * cell_h;
            surface.fill_rect(px, py, cell_w, cell_h, palette.cell(tag))?;
            if show_grid {
                surface.stroke_rect(px, py, cell_w, cell_h, palette.grid_line, 1.0)?;
            }
        }
    }
    Ok(())
}

fn paint_player<S: Surface + ?Sized>(
    surface: &mut S,
    at: Position,
    cell_w: f64,
    cell_h: f64,
    palette: &Palette,
) -> Result<(), SurfaceError> {
    let cx = at.x as f64 * cell_w + cell_w / 2.0;
    let cy = at.y as f64 * cell_h + cell_h / 2.0;
    surface.fill_circle(cx, cy, cell_w.min(cell_h) * PLAYER_RADIUS, palette.player)
}

fn paint_goal<S: Surface + ?Sized>(
    surface: &mut S,
    at: Position,
    cell_w: f64,
    cell_h: f64,
    palette: &Palette,
) -> Result<(), SurfaceError> {
    let gx = at.x as f64 * cell_w;
    let gy = at.y as f64 * cell_h;
    let (x0, y0) = (gx + cell_w * GOAL_INSET, gy + cell_h * GOAL_INSET);
    let (x1, y1) = (gx + cell_w * (1.0 - GOAL_INSET), gy + cell_h * (1.0 - GOAL_INSET));

    surface.fill_rect(x0, y0, x1 - x0, y1 - y0, palette.goal)?;
    surface.line(x0, y0, x1, y1, palette.goal_cross, 2.0)?;
    surface.line(x1, y0, x0, y1, palette.goal_cross, 2.0)
}

fn paint_game_over<S: Surface + ?Sized>(
    surface: &mut S,
    won: bool,
    w: f64,
    h: f64,
    palette: &Palette,
) -> Result<(), SurfaceError> {
    surface.fill_rect(0.0, 0.0, w, h, palette.dim)?;
    let banner = if won { WON_TEXT } else { LOST_TEXT };
    surface.text(
        banner,
        w / 2.0,
        h / 2.0 - 20.0,
        Font::bold(40.0),
        TextAlign::Center,
        palette.banner,
    )?;
    surface.text(
        NEXT_ROUND_TEXT,
        w / 2.0,
        h / 2.0 + 30.0,
        Font::regular(20.0),
        TextAlign::Center,
        palette.banner,
    )
}

/// Per-cycle bookkeeping for the paint loop.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    palette: Palette,
    base_frame_ms: f64,
    frames: u64,
    failures: u64,
}

impl RenderLoop {
    pub fn new(base_frame_ms: f64) -> Self {
        Self::with_palette(base_frame_ms, Palette::default())
    }

    pub fn with_palette(base_frame_ms: f64, palette: Palette) -> Self {
        Self {
            palette,
            base_frame_ms,
            frames: 0,
            failures: 0,
        }
    }

    /// Paint one frame and return the delay before the next one.
    ///
    /// `speed` is read fresh on every call.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        view: &GameView,
        show_grid: bool,
        speed: f64,
    ) -> Duration {
        self.frames += 1;
        if let Err(e) = paint_frame(surface, view, show_grid, &self.palette) {
            self.failures += 1;
            error!("Frame {} failed: {}", self.frames, e);
        }
        let delay = frame_delay(self.base_frame_ms, speed);
        if self.frames % 200 == 0 {
            debug!(
                "Painted {} frames ({} failed), next in {:?}",
                self.frames, self.failures, delay
            );
        }
        delay
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}
