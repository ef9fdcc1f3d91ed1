//! Character-cell rendition of the drawing surface.
//!
//! The client paints in logical pixels (the configured surface size); this
//! surface maps those onto a grid of terminal cells by cell center. Frames are
//! composed into `front`, diffed against the previously flushed `back`, and
//! only changed cells are written, all batched with `queue!`.

use std::io::{self, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use mazeview::error::SurfaceError;
use mazeview::surface::{Font, Rgba, Surface, TextAlign};

/// Rows below the maze for status, controls and help.
pub const FOOTER_ROWS: usize = 3;

const FOOTER_FG: Rgba = Rgba::rgb(0xdd, 0xdd, 0xdd);
const FOOTER_BG: Rgba = Rgba::rgb(0x22, 0x22, 0x22);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Rgba,
    bg: Rgba,
    bold: bool,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: FOOTER_FG,
        bg: FOOTER_BG,
        bold: false,
    };

    /// Never equal to a painted cell; forces a full repaint.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Rgba::rgba(0, 0, 0, 0.0),
        bg: Rgba::rgba(0, 0, 0, 0.0),
        bold: true,
    };
}

fn term_color(c: Rgba) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

pub struct TermSurface<W: Write> {
    writer: W,
    width: f64,
    height: f64,
    cols: usize,
    /// Canvas rows, not counting the footer.
    rows: usize,
    footer: Vec<String>,
    front: Vec<Cell>,
    back: Vec<Cell>,
    needs_clear: bool,
}

impl<W: Write> TermSurface<W> {
    pub fn new(writer: W, width: f64, height: f64, term_cols: u16, term_rows: u16) -> Self {
        let mut s = Self {
            writer,
            width,
            height,
            cols: 0,
            rows: 0,
            footer: Vec::new(),
            front: Vec::new(),
            back: Vec::new(),
            needs_clear: true,
        };
        s.resize_cells(term_cols, term_rows);
        s
    }

    /// Adapt to a new terminal size. The logical pixel size is unchanged.
    pub fn resize_cells(&mut self, term_cols: u16, term_rows: u16) {
        self.cols = (term_cols as usize).max(1);
        self.rows = (term_rows as usize).saturating_sub(FOOTER_ROWS).max(1);
        let total = self.cols * (self.rows + FOOTER_ROWS);
        self.front = vec![Cell::BLANK; total];
        self.back = vec![Cell::INVALID; total];
        self.needs_clear = true;
    }

    /// Lines shown under the canvas on the next `present`.
    pub fn set_footer(&mut self, lines: Vec<String>) {
        self.footer = lines;
    }

    fn idx(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    fn px_per_col(&self) -> f64 {
        self.width / self.cols as f64
    }

    fn px_per_row(&self) -> f64 {
        self.height / self.rows as f64
    }

    fn col_of(&self, x: f64) -> usize {
        ((x / self.px_per_col()).floor().max(0.0) as usize).min(self.cols - 1)
    }

    fn row_of(&self, y: f64) -> usize {
        ((y / self.px_per_row()).floor().max(0.0) as usize).min(self.rows - 1)
    }

    /// Cells whose centers fall inside `[start, start + len)`.
    fn span(start: f64, len: f64, px_per: f64, count: usize) -> Range<usize> {
        let edge = |v: f64| ((v / px_per - 0.5).ceil().max(0.0) as usize).min(count);
        edge(start)..edge(start + len)
    }

    /// Covered cells of a rect, or the single cell under its center when the
    /// rect is smaller than one cell.
    fn cover(&self, x: f64, y: f64, w: f64, h: f64) -> (Range<usize>, Range<usize>) {
        let cols = Self::span(x, w, self.px_per_col(), self.cols);
        let rows = Self::span(y, h, self.px_per_row(), self.rows);
        if cols.is_empty() || rows.is_empty() {
            let c = self.col_of(x + w / 2.0);
            let r = self.row_of(y + h / 2.0);
            (c..c + 1, r..r + 1)
        } else {
            (cols, rows)
        }
    }

    fn put_str(&mut self, col: usize, row: usize, text: &str, fg: Rgba, bold: bool) {
        for (i, ch) in text.chars().enumerate() {
            let c = col + i;
            if c >= self.cols {
                break;
            }
            let i = self.idx(c, row);
            let cell = &mut self.front[i];
            cell.ch = ch;
            cell.fg = fg;
            cell.bold = bold;
        }
    }

    fn compose_footer(&mut self) {
        for r in 0..FOOTER_ROWS {
            let row = self.rows + r;
            for c in 0..self.cols {
                let i = self.idx(c, row);
                self.front[i] = Cell::BLANK;
            }
            if let Some(line) = self.footer.get(r).cloned() {
                self.put_str(0, row, &line, FOOTER_FG, r == 0);
            }
        }
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        if self.needs_clear {
            queue!(self.writer, ResetColor, Clear(ClearType::All))?;
            self.needs_clear = false;
        }
        for row in 0..self.rows + FOOTER_ROWS {
            for col in 0..self.cols {
                let i = self.idx(col, row);
                let cell = self.front[i];
                if cell == self.back[i] {
                    continue;
                }
                let weight = if cell.bold {
                    Attribute::Bold
                } else {
                    Attribute::NormalIntensity
                };
                queue!(
                    self.writer,
                    MoveTo(col as u16, row as u16),
                    SetForegroundColor(term_color(cell.fg)),
                    SetBackgroundColor(term_color(cell.bg)),
                    SetAttribute(weight),
                    Print(cell.ch)
                )?;
            }
        }
        self.writer.flush()?;
        self.back.clone_from(&self.front);
        Ok(())
    }

    #[cfg(test)]
    fn cell(&self, col: usize, row: usize) -> Cell {
        self.front[self.idx(col, row)]
    }

    #[cfg(test)]
    fn row_text(&self, row: usize) -> String {
        (0..self.cols).map(|c| self.cell(c, row).ch).collect()
    }
}

fn draw_err(e: io::Error) -> SurfaceError {
    SurfaceError::Draw(e.to_string())
}

impl<W: Write> Surface for TermSurface<W> {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) -> Result<(), SurfaceError> {
        let (cols, rows) = self.cover(x, y, w, h);
        let opaque = color.a >= 1.0;
        for r in rows {
            for c in cols.clone() {
                let i = self.idx(c, r);
                let cell = &mut self.front[i];
                if opaque {
                    *cell = Cell {
                        ch: ' ',
                        fg: cell.fg,
                        bg: color,
                        bold: false,
                    };
                } else {
                    cell.bg = color.over(cell.bg);
                    cell.fg = color.over(cell.fg);
                }
            }
        }
        Ok(())
    }

    fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
        _line_width: f64,
    ) -> Result<(), SurfaceError> {
        let cols = Self::span(x, w, self.px_per_col(), self.cols);
        let rows = Self::span(y, h, self.px_per_row(), self.rows);
        // Too small to outline without hiding the fill.
        if cols.len() < 2 || rows.len() < 2 {
            return Ok(());
        }
        for r in rows.clone() {
            for c in cols.clone() {
                let edge = r == rows.start || r + 1 == rows.end || c == cols.start || c + 1 == cols.end;
                let i = self.idx(c, r);
                let cell = &mut self.front[i];
                if edge && cell.ch == ' ' {
                    cell.ch = '·';
                    cell.fg = color;
                }
            }
        }
        Ok(())
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba) -> Result<(), SurfaceError> {
        let (pw, ph) = (self.px_per_col(), self.px_per_row());
        let cols = Self::span(cx - r, 2.0 * r, pw, self.cols);
        let rows = Self::span(cy - r, 2.0 * r, ph, self.rows);
        let mut hit = false;
        for row in rows {
            for col in cols.clone() {
                let dx = (col as f64 + 0.5) * pw - cx;
                let dy = (row as f64 + 0.5) * ph - cy;
                if dx * dx + dy * dy <= r * r {
                    let i = self.idx(col, row);
                    self.front[i].bg = color;
                    hit = true;
                }
            }
        }
        if !hit {
            let i = self.idx(self.col_of(cx), self.row_of(cy));
            let cell = &mut self.front[i];
            cell.ch = '●';
            cell.fg = color;
        }
        Ok(())
    }

    fn line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Rgba,
        _line_width: f64,
    ) -> Result<(), SurfaceError> {
        let (c0, r0) = (self.col_of(x0) as f64, self.row_of(y0) as f64);
        let (c1, r1) = (self.col_of(x1) as f64, self.row_of(y1) as f64);
        let glyph = if (x1 - x0) * (y1 - y0) >= 0.0 { '╲' } else { '╱' };
        let steps = (c1 - c0).abs().max((r1 - r0).abs()) as usize;
        for s in 0..=steps {
            let t = if steps == 0 { 0.0 } else { s as f64 / steps as f64 };
            let col = (c0 + (c1 - c0) * t).round() as usize;
            let row = (r0 + (r1 - r0) * t).round() as usize;
            let i = self.idx(col, row);
            let cell = &mut self.front[i];
            cell.ch = match cell.ch {
                '╲' | '╱' | '╳' if cell.ch != glyph => '╳',
                _ => glyph,
            };
            cell.fg = color;
        }
        Ok(())
    }

    fn text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font,
        align: TextAlign,
        color: Rgba,
    ) -> Result<(), SurfaceError> {
        let row = self.row_of(y);
        let anchor = self.col_of(x);
        let col = match align {
            TextAlign::Left => anchor,
            TextAlign::Center => anchor.saturating_sub(text.chars().count() / 2),
        };
        self.put_str(col, row, text, color, font.bold);
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.compose_footer();
        self.flush_diff().map_err(draw_err)
    }
}

/// Raw mode plus alternate screen for as long as the guard lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            io::stdout(),
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazeview::protocol::{Grid, Position, Snapshot};
    use mazeview::render::{paint_frame, Palette};
    use mazeview::view::GameView;

    fn surface(cols: u16, rows: u16) -> TermSurface<Vec<u8>> {
        // 10x10 logical pixels per cell.
        let canvas_rows = rows as usize - FOOTER_ROWS;
        TermSurface::new(
            Vec::new(),
            cols as f64 * 10.0,
            canvas_rows as f64 * 10.0,
            cols,
            rows,
        )
    }

    #[test]
    fn fill_covers_cells_by_center() {
        let mut s = surface(8, 7);
        let red = Rgba::rgb(255, 0, 0);
        s.fill_rect(10.0, 0.0, 20.0, 10.0, red).unwrap();
        assert_eq!(s.cell(0, 0).bg, FOOTER_BG);
        assert_eq!(s.cell(1, 0).bg, red);
        assert_eq!(s.cell(2, 0).bg, red);
        assert_eq!(s.cell(3, 0).bg, FOOTER_BG);
    }

    #[test]
    fn tiny_rect_still_marks_one_cell() {
        let mut s = surface(8, 7);
        let red = Rgba::rgb(255, 0, 0);
        s.fill_rect(41.0, 21.0, 2.0, 2.0, red).unwrap();
        assert_eq!(s.cell(4, 2).bg, red);
    }

    #[test]
    fn translucent_fill_dims() {
        let mut s = surface(4, 4);
        s.fill_rect(0.0, 0.0, 40.0, 10.0, Rgba::WHITE).unwrap();
        s.fill_rect(0.0, 0.0, 40.0, 10.0, Rgba::rgba(0, 0, 0, 0.5)).unwrap();
        assert_eq!(s.cell(0, 0).bg, Rgba::rgb(128, 128, 128));
    }

    #[test]
    fn centered_text_and_crossed_lines() {
        let mut s = surface(20, 8);
        s.text("GAME", 100.0, 20.0, Font::bold(40.0), TextAlign::Center, Rgba::WHITE)
            .unwrap();
        assert_eq!(&s.row_text(2)[8..12], "GAME");
        assert!(s.cell(8, 2).bold);

        s.line(0.0, 0.0, 29.0, 29.0, Rgba::WHITE, 2.0).unwrap();
        s.line(29.0, 0.0, 0.0, 29.0, Rgba::WHITE, 2.0).unwrap();
        assert_eq!(s.cell(1, 1).ch, '╳');
        assert_eq!(s.cell(0, 0).ch, '╲');
        assert_eq!(s.cell(2, 0).ch, '╱');
    }

    #[test]
    fn present_writes_only_changes() {
        let mut s = surface(10, 6);
        s.set_footer(vec!["AI Controlled".to_string()]);
        s.present().unwrap();
        let first = s.writer.len();
        assert!(first > 0);
        assert!(s.row_text(3).starts_with("AI Control"));

        s.present().unwrap();
        assert_eq!(s.writer.len() - first, 0);
    }

    #[test]
    fn paints_a_whole_frame() {
        let mut view = GameView::new();
        view.replace(Snapshot {
            grid: Grid::bordered(20, 15),
            player: Position::new(2, 1),
            goal: Position::new(18, 13),
            score: 10,
            game_over: false,
            won: false,
        });
        let mut s = TermSurface::new(Vec::new(), 640.0, 480.0, 80, 24);
        paint_frame(&mut s, &view, true, &Palette::default()).unwrap();
        assert!(s.row_text(1).contains("Score: 10"));
        // Top-left maze cell is a wall.
        assert_eq!(s.cell(0, 0).bg, Palette::default().wall);
    }
}
