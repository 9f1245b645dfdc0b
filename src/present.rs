// ============================================================================
// PRESENTER — where the output surface lands on screen
// ============================================================================
//
// The blit target is a square no larger than MAX_VIEWPORT_SIDE, centred on
// the screen.  Inside that square the surface is scaled to fit against a
// reference aspect ratio taken from the screen.

use crate::error::TileResult;

/// Upper bound on the presented square's side, in screen units.
pub const MAX_VIEWPORT_SIDE: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in screen units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Square blit region for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Top-left corner.  May be negative on very narrow screens.
    pub x: i32,
    pub y: i32,
    pub side: u32,
    /// Aspect ratio the surface is fitted against.
    pub aspect: f32,
}

impl Viewport {
    /// Square of side `min(screen_height, 1024)` centred at
    /// `(screen_width / 2, screen_height / 2)`.
    pub fn centered(screen: ScreenSize, surface_aspect: f32) -> Self {
        let side = screen.height.min(MAX_VIEWPORT_SIDE);
        let cx = (screen.width / 2) as i32;
        let cy = (screen.height / 2) as i32;
        let half = (side / 2) as i32;
        Self {
            x: cx - half,
            y: cy - half,
            side,
            aspect: fit_aspect(screen, surface_aspect),
        }
    }

    /// Scale-to-fit rectangle inside the square, preserving `self.aspect`.
    pub fn fit(&self) -> FitRect {
        let side = self.side as f32;
        let (w, h) = if self.aspect >= 1.0 {
            (side, side / self.aspect)
        } else {
            (side * self.aspect, side)
        };
        FitRect {
            x: self.x as f32 + (side - w) * 0.5,
            y: self.y as f32 + (side - h) * 0.5,
            width: w,
            height: h,
        }
    }
}

/// Reference aspect ratio: whole-number ratio of the screen's half extents.
/// A portrait screen yields zero, in which case the surface's own aspect is
/// used.
pub fn fit_aspect(screen: ScreenSize, surface_aspect: f32) -> f32 {
    let half_w = screen.width / 2;
    let half_h = screen.height / 2;
    let ratio = if half_h == 0 { 0 } else { half_w / half_h };
    if ratio == 0 {
        if surface_aspect.is_finite() && surface_aspect > 0.0 {
            surface_aspect
        } else {
            1.0
        }
    } else {
        ratio as f32
    }
}

/// Draws an output surface into a viewport.  Must not write to the surface.
pub trait SurfacePresenter<S> {
    fn present(&mut self, surface: &S, viewport: &Viewport) -> TileResult<()>;
}
