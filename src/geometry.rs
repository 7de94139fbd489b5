//! Map space, pixel space, and the transform between them.
//!
//! Map space is the abstract coordinate system markers are defined in; its
//! vertical axis grows upward. Pixel space is relative to the container's
//! top-left origin and its vertical axis grows downward, so the transform
//! inverts `y`.

use crate::error::ViewerError;
use serde::{Deserialize, Serialize};

/// A point of interest in map-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
}

impl Marker {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangular extent of map space used to normalise marker positions.
///
/// Invariant: `xmax > xmin` and `ymax > ymin`. [`MapBounds::new`] enforces
/// it; [`MapBounds::new_unchecked`] leaves it to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl MapBounds {
    /// Build validated bounds.
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Self, ViewerError> {
        let bounds = Self::new_unchecked(xmin, xmax, ymin, ymax);
        bounds.validate()?;
        Ok(bounds)
    }

    /// Build bounds without checking the extent invariant.
    pub const fn new_unchecked(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Check finiteness and that both extents are positive.
    pub fn validate(&self) -> Result<(), ViewerError> {
        let all = [self.xmin, self.xmax, self.ymin, self.ymax];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ViewerError::InvalidBounds(format!(
                "all bounds must be finite, got {:?}",
                self
            )));
        }
        if self.xmax <= self.xmin {
            return Err(ViewerError::InvalidBounds(format!(
                "xmax ({}) must be greater than xmin ({})",
                self.xmax, self.xmin
            )));
        }
        if self.ymax <= self.ymin {
            return Err(ViewerError::InvalidBounds(format!(
                "ymax ({}) must be greater than ymin ({})",
                self.ymax, self.ymin
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Whether the marker lies inside the bounds (edges included).
    pub fn contains(&self, marker: &Marker) -> bool {
        (self.xmin..=self.xmax).contains(&marker.x) && (self.ymin..=self.ymax).contains(&marker.y)
    }
}

/// Live pixel dimensions of the rendering container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True once the container has a usable, positive size.
    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A position in pixel space, relative to the container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Map a marker into the pixel space of a container.
///
/// ```text
/// px = (x - xmin) / (xmax - xmin) * W
/// py = (ymax - y) / (ymax - ymin) * H
/// ```
///
/// No clamping: markers outside `bounds` land outside the container.
/// Degenerate bounds or an unmeasured container yield non-finite or
/// collapsed output; callers guard with [`MapBounds::validate`] and
/// [`ContainerSize::is_measured`].
///
/// # Example
/// ```rust
/// use pdfmap::geometry::{map_to_pixel, ContainerSize, MapBounds, Marker};
///
/// let bounds = MapBounds::new(2.0, 12.0, 3.0, 23.0).unwrap();
/// let p = map_to_pixel(&Marker::new(4.0, 7.0), &bounds, ContainerSize::new(1000.0, 2000.0));
/// assert!((p.x - 200.0).abs() < 1e-9);
/// assert!((p.y - 1600.0).abs() < 1e-9);
/// ```
pub fn map_to_pixel(marker: &Marker, bounds: &MapBounds, container: ContainerSize) -> PixelPoint {
    let x_range = bounds.xmax - bounds.xmin;
    let y_range = bounds.ymax - bounds.ymin;

    let x = (marker.x - bounds.xmin) / x_range * container.width;
    let y = (bounds.ymax - marker.y) / y_range * container.height;

    PixelPoint { x, y }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn bounds() -> MapBounds {
        MapBounds::new(2.0, 12.0, 3.0, 23.0).unwrap()
    }

    fn container() -> ContainerSize {
        ContainerSize::new(1000.0, 2000.0)
    }

    fn assert_point(p: PixelPoint, x: f64, y: f64) {
        assert!((p.x - x).abs() < EPS, "x: expected {x}, got {}", p.x);
        assert!((p.y - y).abs() < EPS, "y: expected {y}, got {}", p.y);
    }

    #[test]
    fn example_markers_land_where_expected() {
        let b = bounds();
        let c = container();
        assert_point(map_to_pixel(&Marker::new(11.0, 5.0), &b, c), 900.0, 1800.0);
        assert_point(map_to_pixel(&Marker::new(4.0, 7.0), &b, c), 200.0, 1600.0);
        assert_point(map_to_pixel(&Marker::new(4.0, 4.0), &b, c), 200.0, 1900.0);
    }

    #[test]
    fn bound_edges_map_to_container_edges() {
        let b = bounds();
        let c = container();
        assert_point(map_to_pixel(&Marker::new(b.xmin, b.ymax), &b, c), 0.0, 0.0);
        assert_point(map_to_pixel(&Marker::new(b.xmax, b.ymin), &b, c), c.width, c.height);
    }

    #[test]
    fn transform_is_monotonic() {
        let b = bounds();
        let c = container();
        let mut last_x = f64::NEG_INFINITY;
        let mut last_y = f64::INFINITY;
        for step in 0..=20 {
            let v = 2.0 + step as f64 * 0.75;
            let p = map_to_pixel(&Marker::new(v, v), &b, c);
            assert!(p.x > last_x, "px must increase with x");
            assert!(p.y < last_y, "py must decrease with y");
            last_x = p.x;
            last_y = p.y;
        }
    }

    #[test]
    fn markers_outside_bounds_are_not_clamped() {
        let p = map_to_pixel(&Marker::new(0.0, 25.0), &bounds(), container());
        assert!(p.x < 0.0);
        assert!(p.y < 0.0);
        assert!(!bounds().contains(&Marker::new(0.0, 25.0)));
    }

    #[test]
    fn degenerate_bounds_rejected() {
        assert!(matches!(
            MapBounds::new(5.0, 5.0, 0.0, 1.0),
            Err(ViewerError::InvalidBounds(_))
        ));
        assert!(MapBounds::new(0.0, 1.0, 3.0, 2.0).is_err());
        assert!(MapBounds::new(0.0, f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn degenerate_bounds_give_non_finite_output() {
        let b = MapBounds::new_unchecked(5.0, 5.0, 0.0, 1.0);
        let p = map_to_pixel(&Marker::new(6.0, 0.5), &b, container());
        assert!(!p.x.is_finite());
    }

    #[test]
    fn unmeasured_container() {
        assert!(!ContainerSize::new(0.0, 100.0).is_measured());
        assert!(!ContainerSize::new(100.0, f64::NAN).is_measured());
        assert!(ContainerSize::new(1.0, 1.0).is_measured());
    }
}
