//! Rendering seam between the reconciler and the raster backend.

use wire::{Point, Tool};

/// A raster surface the reconciler renders onto.
///
/// Implementations own pixel-level concerns (composite mode for the eraser,
/// line caps, snapshot decoding); the reconciler only decides *what* is
/// visible and in what order.
pub trait CanvasSurface {
    /// Draw one stroke segment from `from` to `to`.
    fn draw_segment(&mut self, from: Point, to: Point, color: &str, size: f64, tool: Tool);

    /// Wipe the surface to blank.
    fn clear(&mut self);

    /// Replace the surface content with a decoded snapshot blob.
    fn show_snapshot(&mut self, blob: &str);
}
