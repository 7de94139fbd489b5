//! Result types returned by [`crate::compose::render_view`].

use crate::encode::to_data_uri;
use crate::error::{PageError, ViewerError};
use crate::geometry::ContainerSize;
use crate::overlay::MarkerPlacement;
use crate::viewport::PanZoom;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// A composed document view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewOutput {
    /// Final viewport image, after pan/zoom.
    #[serde(skip)]
    pub image: RgbaImage,

    /// File name of the rendered document.
    pub document: String,

    /// Pages reported by the renderer.
    pub page_count: usize,

    /// Measured size of the stacked page content, before pan/zoom.
    pub container: ContainerSize,

    /// One entry per configured marker, in content (container) pixels.
    pub placements: Vec<MarkerPlacement>,

    /// Markers that touched at least one content pixel.
    pub markers_drawn: usize,

    /// Transform that produced `image` from the content.
    pub pan_zoom: PanZoom,

    /// Pages that failed to rasterise and were drawn blank.
    pub page_errors: Vec<PageError>,

    /// `data:image/png;base64,…` of `image`, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data_uri: Option<String>,

    pub stats: ViewStats,
}

impl ViewOutput {
    /// Fill [`image_data_uri`](Self::image_data_uri) from the composed image.
    pub fn embed_image(&mut self) -> Result<(), ViewerError> {
        self.image_data_uri = Some(to_data_uri(&self.image)?);
        Ok(())
    }

    /// Placements that fell inside the map bounds.
    pub fn visible_markers(&self) -> impl Iterator<Item = &MarkerPlacement> {
        self.placements.iter().filter(|p| p.inside)
    }
}

/// Timing for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStats {
    pub load_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}
