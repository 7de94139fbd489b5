//! Pan/zoom surface wrapping the rendered content.
//!
//! Content coordinates map to screen coordinates as
//! `screen = content * scale + offset`. Markers are drawn into the content
//! before this transform, so they pan and scale with the pages.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output surface dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Scale + translation applied to the content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanZoom {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Default for PanZoom {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl PanZoom {
    pub const MIN_SCALE: f64 = 0.1;
    pub const MAX_SCALE: f64 = 8.0;

    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale: clamp_scale(scale),
            offset_x: finite_or_zero(offset_x),
            offset_y: finite_or_zero(offset_y),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset_x == 0.0 && self.offset_y == 0.0
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += finite_or_zero(dx);
        self.offset_y += finite_or_zero(dy);
    }

    /// Multiply the scale by `factor`, keeping the content point under the
    /// screen-space cursor fixed.
    pub fn zoom_at(&mut self, cursor_x: f64, cursor_y: f64, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_scale = clamp_scale(self.scale * factor);
        let content_x = (cursor_x - self.offset_x) / self.scale;
        let content_y = (cursor_y - self.offset_y) / self.scale;
        self.offset_x = cursor_x - content_x * new_scale;
        self.offset_y = cursor_y - content_y * new_scale;
        self.scale = new_scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn to_content(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) / self.scale, (y - self.offset_y) / self.scale)
    }
}

fn clamp_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(PanZoom::MIN_SCALE, PanZoom::MAX_SCALE)
    } else {
        1.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Project `content` through `pan_zoom` onto a surface of `viewport` size.
///
/// With no viewport the surface is the content's own size. Content that
/// falls outside the surface is clipped; uncovered areas show `background`.
/// Only the visible part of the content is resampled, so the cost follows
/// the viewport size rather than `content × scale`.
pub fn compose_viewport(
    content: &RgbaImage,
    pan_zoom: &PanZoom,
    viewport: Option<ViewportSize>,
    background: [u8; 4],
) -> RgbaImage {
    let size = viewport.unwrap_or(ViewportSize::new(content.width(), content.height()));

    if pan_zoom.is_identity() && size.width == content.width() && size.height == content.height() {
        return content.clone();
    }

    let mut surface = RgbaImage::from_pixel(size.width, size.height, Rgba(background));
    let Some(region) = visible_region(content, pan_zoom, size) else {
        debug!("Viewport {}x{}: content fully off-screen", size.width, size.height);
        return surface;
    };

    let scale = pan_zoom.scale;
    let scaled_w = (region.width as f64 * scale).round().max(1.0) as u32;
    let scaled_h = (region.height as f64 * scale).round().max(1.0) as u32;
    let x = pan_zoom.offset_x.round() as i64 + (region.x as f64 * scale).round() as i64;
    let y = pan_zoom.offset_y.round() as i64 + (region.y as f64 * scale).round() as i64;
    debug!(
        "Viewport {}x{}: content region {}x{}+{}+{} → {}x{} at ({}, {})",
        size.width,
        size.height,
        region.width,
        region.height,
        region.x,
        region.y,
        scaled_w,
        scaled_h,
        x,
        y
    );

    let visible = imageops::crop_imm(content, region.x, region.y, region.width, region.height);
    if scaled_w == region.width && scaled_h == region.height {
        imageops::overlay(&mut surface, &visible.to_image(), x, y);
    } else {
        let scaled = imageops::resize(&*visible, scaled_w, scaled_h, FilterType::Triangle);
        imageops::overlay(&mut surface, &scaled, x, y);
    }
    surface
}

/// Content-pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// The part of `content` that lands inside the viewport, widened by the
/// resampling filter's reach so edge pixels blend as in a full resize.
fn visible_region(content: &RgbaImage, pan_zoom: &PanZoom, size: ViewportSize) -> Option<Region> {
    let scale = pan_zoom.scale;
    let margin = (1.0 / scale).max(1.0).ceil() + 1.0;
    let (left, top) = pan_zoom.to_content(0.0, 0.0);
    let (right, bottom) = pan_zoom.to_content(size.width as f64, size.height as f64);

    let span = |lo: f64, hi: f64, extent: u32| -> Option<(u32, u32)> {
        let start = (lo.floor() - margin).clamp(0.0, extent as f64) as u32;
        let end = (hi.ceil() + margin).clamp(0.0, extent as f64) as u32;
        (end > start).then_some((start, end - start))
    };
    let (x, width) = span(left, right, content.width())?;
    let (y, height) = span(top, bottom, content.height())?;
    Some(Region {
        x,
        y,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut pz = PanZoom::default();
        pz.pan(30.0, -12.0);
        let before = pz.to_content(200.0, 150.0);
        pz.zoom_at(200.0, 150.0, 2.5);
        let after = pz.to_content(200.0, 150.0);
        assert!((before.0 - after.0).abs() < 1e-9);
        assert!((before.1 - after.1).abs() < 1e-9);
        assert_eq!(pz.scale(), 2.5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut pz = PanZoom::default();
        pz.zoom_at(0.0, 0.0, 1000.0);
        assert_eq!(pz.scale(), PanZoom::MAX_SCALE);
        pz.zoom_at(0.0, 0.0, 1e-9);
        assert_eq!(pz.scale(), PanZoom::MIN_SCALE);
        pz.zoom_at(0.0, 0.0, -1.0);
        assert_eq!(pz.scale(), PanZoom::MIN_SCALE);
    }

    #[test]
    fn screen_and_content_are_inverse() {
        let pz = PanZoom::new(1.5, 10.0, 20.0);
        let (sx, sy) = pz.to_screen(4.0, 8.0);
        assert_eq!((sx, sy), (16.0, 32.0));
        assert_eq!(pz.to_content(sx, sy), (4.0, 8.0));
    }

    #[test]
    fn reset_returns_to_identity() {
        let mut pz = PanZoom::new(3.0, 5.0, 5.0);
        pz.reset();
        assert!(pz.is_identity());
    }

    #[test]
    fn identity_compose_is_a_copy() {
        let content = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]));
        let out = compose_viewport(&content, &PanZoom::default(), None, [0, 0, 0, 255]);
        assert_eq!(out, content);
    }

    #[test]
    fn pan_shifts_and_clips_content() {
        let content = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let pz = PanZoom::new(1.0, 6.0, -4.0);
        let out = compose_viewport(&content, &pz, Some(ViewportSize::new(10, 10)), [0, 0, 0, 255]);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(7, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(7, 6), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zoomed_content_fills_viewport() {
        let content = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let pz = PanZoom::new(2.0, 0.0, 0.0);
        let out = compose_viewport(&content, &pz, Some(ViewportSize::new(20, 20)), [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(19, 19), &Rgba([0, 0, 255, 255]));
    }

    /// Resize everything, then clip: the straightforward composition.
    fn full_resize_compose(
        content: &RgbaImage,
        pz: &PanZoom,
        size: ViewportSize,
        background: [u8; 4],
    ) -> RgbaImage {
        let w = (content.width() as f64 * pz.scale()).round() as u32;
        let h = (content.height() as f64 * pz.scale()).round() as u32;
        let scaled = imageops::resize(content, w, h, FilterType::Triangle);
        let mut surface = RgbaImage::from_pixel(size.width, size.height, Rgba(background));
        let (ox, oy) = pz.offset();
        imageops::overlay(&mut surface, &scaled, ox.round() as i64, oy.round() as i64);
        surface
    }

    fn checkerboard(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            if (x / 3 + y / 5) % 2 == 0 {
                Rgba([250, 240, 10, 255])
            } else {
                Rgba([10, 20, 200, 255])
            }
        })
    }

    #[test]
    fn cropped_zoom_matches_full_resize() {
        let content = checkerboard(60, 80);
        let size = ViewportSize::new(100, 90);
        let pz = PanZoom::new(8.0, -136.0, -200.0);
        let fast = compose_viewport(&content, &pz, Some(size), [0, 0, 0, 255]);
        let slow = full_resize_compose(&content, &pz, size, [0, 0, 0, 255]);
        assert_eq!(fast, slow);
    }

    #[test]
    fn cropped_zoom_matches_at_content_edge() {
        let content = checkerboard(40, 30);
        let size = ViewportSize::new(120, 120);
        let pz = PanZoom::new(4.0, -100.0, -60.0);
        let fast = compose_viewport(&content, &pz, Some(size), [9, 9, 9, 255]);
        let slow = full_resize_compose(&content, &pz, size, [9, 9, 9, 255]);
        assert_eq!(fast, slow);
        assert_eq!(fast.get_pixel(119, 119), &Rgba([9, 9, 9, 255]));
    }

    #[test]
    fn tall_content_at_max_zoom_only_resamples_the_window() {
        let content = checkerboard(800, 12_000);
        let pz = PanZoom::new(PanZoom::MAX_SCALE, 0.0, 0.0);
        let size = ViewportSize::new(400, 300);

        let region = visible_region(&content, &pz, size).unwrap();
        assert!(region.width <= 53 && region.height <= 40, "{region:?}");

        let out = compose_viewport(&content, &pz, Some(size), [0, 0, 0, 255]);
        assert_eq!(out.dimensions(), (400, 300));
        assert_eq!(out.get_pixel(0, 0), content.get_pixel(0, 0));
    }

    #[test]
    fn off_screen_content_leaves_background() {
        let content = checkerboard(10, 10);
        let pz = PanZoom::new(2.0, 500.0, 0.0);
        assert!(visible_region(&content, &pz, ViewportSize::new(50, 50)).is_none());
        let out = compose_viewport(&content, &pz, Some(ViewportSize::new(50, 50)), [7, 7, 7, 255]);
        assert!(out.pixels().all(|p| *p == Rgba([7, 7, 7, 255])));
    }
}
