//! Marker overlay: place markers in pixel space and rasterise them.
//!
//! Placement and drawing are split so the state machine can produce
//! placements (cheap, pure) without owning any pixels.

use crate::geometry::{map_to_pixel, ContainerSize, MapBounds, Marker, PixelPoint};
use image::{Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// A marker resolved to a position inside a measured container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPlacement {
    /// Index into the configured marker list.
    pub index: usize,
    pub marker: Marker,
    /// Left/top offset from the container origin.
    pub position: PixelPoint,
    /// Whether `position` lies within the container.
    pub inside: bool,
}

/// Where a marker's box sits relative to its pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerAnchor {
    /// The position is the box's left/top offset. (default)
    #[default]
    TopLeft,
    /// The position is the box's centre.
    Center,
}

/// Fixed visual appearance shared by every marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    /// Diameter of the marker disc in pixels.
    pub size_px: u32,
    pub color: [u8; 4],
    pub anchor: MarkerAnchor,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size_px: 10,
            color: [220, 30, 30, 230],
            anchor: MarkerAnchor::TopLeft,
        }
    }
}

/// Resolve every marker against the container.
///
/// Returns nothing until the container has been measured.
pub fn place_markers(
    markers: &[Marker],
    bounds: &MapBounds,
    container: Option<ContainerSize>,
) -> Vec<MarkerPlacement> {
    let Some(container) = container.filter(ContainerSize::is_measured) else {
        return Vec::new();
    };

    markers
        .iter()
        .enumerate()
        .map(|(index, marker)| {
            let position = map_to_pixel(marker, bounds, container);
            let inside = (0.0..=container.width).contains(&position.x)
                && (0.0..=container.height).contains(&position.y);
            MarkerPlacement {
                index,
                marker: *marker,
                position,
                inside,
            }
        })
        .collect()
}

/// Draw placements onto `canvas`. Returns how many touched at least one pixel.
///
/// Pixels outside the canvas are clipped; non-finite positions are skipped.
pub fn draw_markers(canvas: &mut RgbaImage, placements: &[MarkerPlacement], style: &MarkerStyle) -> usize {
    placements
        .iter()
        .filter(|p| draw_marker(canvas, p.position, style))
        .count()
}

fn draw_marker(canvas: &mut RgbaImage, position: PixelPoint, style: &MarkerStyle) -> bool {
    if !position.x.is_finite() || !position.y.is_finite() || style.size_px == 0 {
        return false;
    }

    let size = style.size_px as f64;
    let (left, top) = match style.anchor {
        MarkerAnchor::TopLeft => (position.x, position.y),
        MarkerAnchor::Center => (position.x - size / 2.0, position.y - size / 2.0),
    };
    let radius = size / 2.0;
    let (cx, cy) = (left + radius, top + radius);

    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    if left >= w || top >= h || left + size <= 0.0 || top + size <= 0.0 {
        return false;
    }

    let x0 = left.floor().max(0.0) as u32;
    let y0 = top.floor().max(0.0) as u32;
    let x1 = (left + size).ceil().min(w) as u32;
    let y1 = (top + size).ceil().min(h) as u32;

    let color = Rgba(style.color);
    let mut touched = false;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                canvas.get_pixel_mut(x, y).blend(&color);
                touched = true;
            }
        }
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> MapBounds {
        MapBounds::new(2.0, 12.0, 3.0, 23.0).unwrap()
    }

    fn example_markers() -> Vec<Marker> {
        vec![
            Marker::new(11.0, 5.0),
            Marker::new(4.0, 7.0),
            Marker::new(4.0, 4.0),
        ]
    }

    #[test]
    fn nothing_placed_before_measurement() {
        assert!(place_markers(&example_markers(), &bounds(), None).is_empty());
        assert!(
            place_markers(&example_markers(), &bounds(), Some(ContainerSize::new(0.0, 0.0)))
                .is_empty()
        );
    }

    #[test]
    fn placements_follow_input_order() {
        let placed = place_markers(
            &example_markers(),
            &bounds(),
            Some(ContainerSize::new(1000.0, 2000.0)),
        );
        assert_eq!(placed.len(), 3);
        assert_eq!(
            placed.iter().map(|p| p.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!((placed[0].position.x - 900.0).abs() < 1e-9);
        assert!((placed[2].position.y - 1900.0).abs() < 1e-9);
        assert!(placed.iter().all(|p| p.inside));
    }

    #[test]
    fn outside_marker_flagged() {
        let placed = place_markers(
            &[Marker::new(20.0, 5.0)],
            &bounds(),
            Some(ContainerSize::new(100.0, 100.0)),
        );
        assert!(!placed[0].inside);
    }

    #[test]
    fn draws_disc_at_top_left_anchor() {
        let mut canvas = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let style = MarkerStyle {
            size_px: 10,
            color: [255, 0, 0, 255],
            anchor: MarkerAnchor::TopLeft,
        };
        let placement = MarkerPlacement {
            index: 0,
            marker: Marker::new(0.0, 0.0),
            position: PixelPoint::new(10.0, 10.0),
            inside: true,
        };
        assert_eq!(draw_markers(&mut canvas, &[placement], &style), 1);
        // centre of the box is painted, the anchor corner is not
        assert_eq!(canvas.get_pixel(15, 15), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn center_anchor_straddles_position() {
        let mut canvas = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        let style = MarkerStyle {
            size_px: 6,
            color: [0, 255, 0, 255],
            anchor: MarkerAnchor::Center,
        };
        let placement = MarkerPlacement {
            index: 0,
            marker: Marker::new(0.0, 0.0),
            position: PixelPoint::new(10.0, 10.0),
            inside: true,
        };
        draw_markers(&mut canvas, &[placement], &style);
        assert_eq!(canvas.get_pixel(9, 9), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn off_canvas_markers_are_clipped() {
        let mut canvas = RgbaImage::new(10, 10);
        let style = MarkerStyle::default();
        let placements = [
            PixelPoint::new(-50.0, -50.0),
            PixelPoint::new(500.0, 5.0),
            PixelPoint::new(f64::NAN, 1.0),
            PixelPoint::new(7.0, 7.0),
        ]
        .into_iter()
        .enumerate()
        .map(|(index, position)| MarkerPlacement {
            index,
            marker: Marker::new(0.0, 0.0),
            position,
            inside: false,
        })
        .collect::<Vec<_>>();

        assert_eq!(draw_markers(&mut canvas, &placements, &style), 1);
    }
}
