//! Abstract 2D drawing surface.
//!
//! Coordinates are pixels with the origin at the top-left corner. Hosts
//! implement [`Surface`] on top of whatever they draw with (a canvas 2D
//! context, a terminal cell buffer); [`RecordingSurface`] keeps the call list
//! for tests and benches.

use crate::error::SurfaceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgba = Rgba::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let h = hex.strip_prefix('#')?;
        if h.len() != 6 {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(h.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?))
    }

    /// CSS color string (`#rrggbb` when opaque, `rgba(...)` otherwise).
    pub fn css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }

    /// Composite `self` over an opaque `under` color.
    pub fn over(&self, under: Rgba) -> Rgba {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |top: u8, bottom: u8| {
            (top as f32 * a + bottom as f32 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
        };
        Rgba::rgb(
            mix(self.r, under.r),
            mix(self.g, under.g),
            mix(self.b, under.b),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size_px: f64,
    pub bold: bool,
}

impl Font {
    pub const fn regular(size_px: f64) -> Self {
        Self {
            size_px,
            bold: false,
        }
    }

    pub const fn bold(size_px: f64) -> Self {
        Self {
            size_px,
            bold: true,
        }
    }

    /// CSS font shorthand.
    pub fn css(&self) -> String {
        if self.bold {
            format!("bold {}px Arial", self.size_px)
        } else {
            format!("{}px Arial", self.size_px)
        }
    }
}

pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (f64, f64);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba)
        -> Result<(), SurfaceError>;

    fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError>;

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba) -> Result<(), SurfaceError>;

    #[allow(clippy::too_many_arguments)]
    fn line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError>;

    fn text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        font: Font,
        align: TextAlign,
        color: Rgba,
    ) -> Result<(), SurfaceError>;

    /// Flush the finished frame. Surfaces that draw immediately keep the default.
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
        line_width: f64,
    },
    FillCircle {
        cx: f64,
        cy: f64,
        r: f64,
        color: Rgba,
    },
    Line {
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Rgba,
        line_width: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        font: Font,
        align: TextAlign,
        color: Rgba,
    },
    Present,
}

/// Surface that stores the calls it receives.
///
/// `fail_after` makes every call past the given count return an error, which
/// is how tests exercise per-frame failure handling.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: f64,
    height: f64,
    ops: Vec<DrawOp>,
    calls: usize,
    fail_after: Option<usize>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            calls: 0,
            fail_after: None,
        }
    }

    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn set_fail_after(&mut self, calls: Option<usize>) {
        self.fail_after = calls;
        self.calls = 0;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Take the recorded ops, leaving the list empty.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, op: DrawOp) -> Result<(), SurfaceError> {
        self.calls += 1;
        if let Some(limit) = self.fail_after {
            if self.calls > limit {
                return Err(SurfaceError::Draw(format!("injected failure at call {}", self.calls)));
            }
        }
        self.ops.push(op);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.record(DrawOp::FillRect { x, y, w, h, color })
    }

    fn stroke_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError> {
        self.record(DrawOp::StrokeRect {
            x,
            y,
            w,
            h,
            color,
            line_width,
        })
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgba) -> Result<(), SurfaceError> {
        self.record(DrawOp::FillCircle { cx, cy, r, color })
    }

    fn line(
        &mut self,
        x0: f64,
        y0: f64,
        x1: f64,
        y1: f64,
        color: Rgba,
        line_width: f64,
    ) -> Result<(), SurfaceError> {
        self.record(DrawOp::Line {
            x0,
            y0,
            x1,
            y1,
            color,
            line_width,
        })
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
        self.record(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font,
            align,
            color,
        })
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.record(DrawOp::Present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_and_css_agree() {
        let c = Rgba::from_hex("#4285F4").unwrap();
        assert_eq!(c, Rgba::rgb(0x42, 0x85, 0xf4));
        assert_eq!(c.css(), "#4285f4");
        assert_eq!(Rgba::rgba(0, 0, 0, 0.5).css(), "rgba(0, 0, 0, 0.5)");
        assert_eq!(Rgba::from_hex("4285F4"), None);
        assert_eq!(Rgba::from_hex("#42"), None);
    }

    #[test]
    fn translucent_black_halves_white() {
        let c = Rgba::rgba(0, 0, 0, 0.5).over(Rgba::WHITE);
        assert_eq!(c, Rgba::rgb(128, 128, 128));
    }

    #[test]
    fn recording_surface_fails_on_demand() {
        let mut s = RecordingSurface::new(10.0, 10.0).failing_after(1);
        assert!(s.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::BLACK).is_ok());
        assert!(s.fill_rect(0.0, 0.0, 1.0, 1.0, Rgba::BLACK).is_err());
        assert_eq!(s.ops().len(), 1);
    }
}
