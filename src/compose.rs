//! Top-level entry points: open a document, drive a viewer session through
//! selection and load, stack the pages, overlay the markers, and project the
//! result through the pan/zoom surface.
//!
//! ```text
//! path ─▶ intake ─▶ FilesSelected ─▶ load (spawn_blocking) ─▶ LoadSucceeded
//!                                                                 │
//!   image ◀─ pan/zoom ◀─ draw markers ◀─ ContainerMeasured ◀─ stack pages
//! ```

use crate::config::ViewerConfig;
use crate::document::{document_from_bytes, open_document, DocumentHandle};
use crate::encode::encode_png;
use crate::error::{PageError, ViewerError};
use crate::geometry::ContainerSize;
use crate::output::{ViewOutput, ViewStats};
use crate::overlay::draw_markers;
use crate::progress::ProgressCallback;
use crate::renderer::{render_pages, DocumentRenderer, PdfiumRenderer, RenderedPage};
use crate::session::{ViewerEvent, ViewerSession};
use crate::viewer::ViewerState;
use crate::viewport::compose_viewport;
use image::{imageops, Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Height/width ratio of a blank placeholder when no page rendered (A4).
const PLACEHOLDER_ASPECT: f64 = 1.414;

/// Render a PDF with its marker overlay.
///
/// # Errors
/// Fatal errors only: intake rejection, undecodable document, zero pages,
/// pdfium binding failure. Individual page failures are reported in
/// [`ViewOutput::page_errors`].
///
/// # Example
/// ```rust,no_run
/// use pdfmap::{render_view, ViewerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = render_view("site-plan.pdf", &ViewerConfig::default()).await?;
/// for p in &output.placements {
///     println!("marker {} at ({:.1}, {:.1})", p.index, p.position.x, p.position.y);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn render_view(
    input: impl AsRef<Path>,
    config: &ViewerConfig,
) -> Result<ViewOutput, ViewerError> {
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfiumRenderer::from_config(config));
    render_view_with(input, config, renderer).await
}

/// [`render_view`] with a caller-supplied renderer.
pub async fn render_view_with(
    input: impl AsRef<Path>,
    config: &ViewerConfig,
    renderer: Arc<dyn DocumentRenderer>,
) -> Result<ViewOutput, ViewerError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Opening view: {}", input.display());

    let document = open_document(input, &config.file_filter)?;
    compose_document(document, config, renderer, total_start).await
}

/// Render the view and write it to `output_path` as PNG.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn render_view_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ViewerConfig,
) -> Result<ViewOutput, ViewerError> {
    let output = render_view(input, config).await?;
    write_png(&output.image, output_path.as_ref()).await?;
    Ok(output)
}

/// Render a PDF held in memory.
///
/// The bytes go through a managed temp file that is removed on return.
pub async fn view_from_bytes(
    bytes: &[u8],
    config: &ViewerConfig,
) -> Result<ViewOutput, ViewerError> {
    let total_start = Instant::now();
    let document = document_from_bytes(bytes)?;
    let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfiumRenderer::from_config(config));
    compose_document(document, config, renderer, total_start).await
}

/// Synchronous wrapper around [`render_view`].
///
/// Creates a temporary tokio runtime internally.
pub fn render_view_sync(
    input: impl AsRef<Path>,
    config: &ViewerConfig,
) -> Result<ViewOutput, ViewerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ViewerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(render_view(input, config))
}

/// Write `image` as PNG via a sibling temp file and rename.
pub async fn write_png(image: &RgbaImage, path: &Path) -> Result<(), ViewerError> {
    let png = encode_png(image)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ViewerError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("png.tmp");
    tokio::fs::write(&tmp_path, &png)
        .await
        .map_err(|e| ViewerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ViewerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Wrote {} ({} bytes)", path.display(), png.len());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn compose_document(
    document: DocumentHandle,
    config: &ViewerConfig,
    renderer: Arc<dyn DocumentRenderer>,
    total_start: Instant,
) -> Result<ViewOutput, ViewerError> {
    let progress = config.progress_callback.as_ref();
    if let Some(cb) = progress {
        cb.on_document_selected(document.name());
    }

    // ── Step 1: Select and load ──────────────────────────────────────────
    let mut session = ViewerSession::new(config, renderer);
    session.handle_event(ViewerEvent::FilesSelected(vec![document.clone()]));

    let load_start = Instant::now();
    session.settle().await;
    let load_duration_ms = load_start.elapsed().as_millis() as u64;

    let failure = match session.state() {
        ViewerState::DocumentFailed {
            document, reason, ..
        } => Some((document.path().to_path_buf(), reason.clone())),
        _ => None,
    };
    if let Some((path, detail)) = failure {
        return Err(session
            .take_load_error()
            .unwrap_or(ViewerError::CorruptDocument { path, detail }));
    }

    let page_count = session.viewer().page_count();
    if page_count == 0 {
        return Err(ViewerError::EmptyDocument {
            path: document.path().to_path_buf(),
        });
    }
    if let Some(cb) = progress {
        cb.on_document_loaded(page_count);
    }

    // ── Step 2: Rasterise every page the frame asks for ──────────────────
    let page_numbers: Vec<usize> = session
        .frame()
        .pages
        .iter()
        .map(|p| p.page_number)
        .collect();

    let render_start = Instant::now();
    let rendered = render_pages(
        session.renderer(),
        document.clone(),
        page_numbers,
        config.page_width,
    )
    .await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} pages in {}ms", rendered.len(), render_duration_ms);

    // ── Step 3: Stack pages and measure the container ────────────────────
    let (mut content, page_errors) = stack_pages(rendered, config, progress, page_count)?;
    let container = ContainerSize::new(content.width() as f64, content.height() as f64);
    session.handle_event(ViewerEvent::ContainerMeasured(container));

    // ── Step 4: Overlay markers ──────────────────────────────────────────
    let frame = session.frame();
    let markers_drawn = draw_markers(&mut content, &frame.markers, &config.marker_style);
    let outside = frame.markers.iter().filter(|p| !p.inside).count();
    if outside > 0 {
        warn!("{} marker(s) fall outside the map bounds and are clipped", outside);
    }

    // ── Step 5: Project through the pan/zoom surface ─────────────────────
    let pan_zoom = *session.pan_zoom();
    let image = compose_viewport(&content, &pan_zoom, config.viewport, config.background);

    if let Some(cb) = progress {
        cb.on_view_complete(page_count, markers_drawn);
    }

    let stats = ViewStats {
        load_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "View complete: {} pages, {}/{} markers drawn, {}ms total",
        page_count,
        markers_drawn,
        frame.markers.len(),
        stats.total_duration_ms
    );

    Ok(ViewOutput {
        image,
        document: document.name().to_string(),
        page_count,
        container,
        placements: frame.markers,
        markers_drawn,
        pan_zoom,
        page_errors,
        image_data_uri: None,
        stats,
    })
}

/// Stack pages top to bottom, centred, separated by `page_gap`.
///
/// Failed pages become white placeholders sized like the first page that
/// did render.
fn stack_pages(
    rendered: Vec<RenderedPage>,
    config: &ViewerConfig,
    progress: Option<&ProgressCallback>,
    total_pages: usize,
) -> Result<(RgbaImage, Vec<PageError>), ViewerError> {
    let mut images: Vec<RgbaImage> = Vec::with_capacity(rendered.len());
    let mut failed: Vec<(usize, PageError)> = Vec::new();

    for (slot, (page_number, result)) in rendered.into_iter().enumerate() {
        match result {
            Ok(img) => {
                if let Some(cb) = progress {
                    cb.on_page_rendered(page_number, total_pages);
                }
                images.push(img.to_rgba8());
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(cb) = progress {
                    cb.on_page_error(page_number, total_pages, &e.to_string());
                }
                failed.push((slot, e));
                images.push(RgbaImage::new(0, 0));
            }
        }
    }

    let (placeholder_w, placeholder_h) = images
        .iter()
        .find(|img| img.width() > 0)
        .map(|img| img.dimensions())
        .unwrap_or((
            config.page_width,
            (config.page_width as f64 * PLACEHOLDER_ASPECT).round() as u32,
        ));
    for (slot, _) in &failed {
        images[*slot] = RgbaImage::from_pixel(placeholder_w, placeholder_h, Rgba([255, 255, 255, 255]));
    }

    let width = images.iter().map(|i| i.width()).max().unwrap_or(0).max(1);
    let height = stacked_height(&images, config.page_gap).ok_or_else(|| {
        ViewerError::InvalidConfig(format!(
            "{} pages with a {}px gap exceed the maximum image height",
            images.len(),
            config.page_gap
        ))
    })?;

    let mut content = RgbaImage::from_pixel(width, height, Rgba(config.background));
    let mut y: i64 = 0;
    for img in &images {
        let x = ((width - img.width()) / 2) as i64;
        imageops::overlay(&mut content, img, x, y);
        y += img.height() as i64 + config.page_gap as i64;
    }
    debug!("Stacked {} pages into {}x{} content", images.len(), width, height);

    Ok((content, failed.into_iter().map(|(_, e)| e).collect()))
}

/// Total height of `images` stacked with `gap` between them; `None` on overflow.
fn stacked_height(images: &[RgbaImage], gap: u32) -> Option<u32> {
    let gaps = u32::try_from(images.len().saturating_sub(1))
        .ok()?
        .checked_mul(gap)?;
    images
        .iter()
        .try_fold(gaps, |acc, img| acc.checked_add(img.height()))
        .map(|h| h.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn page(w: u32, h: u32, shade: u8) -> Result<DynamicImage, PageError> {
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            w,
            h,
            Rgba([shade, shade, shade, 255]),
        )))
    }

    fn config() -> ViewerConfig {
        ViewerConfig::builder()
            .page_gap(4)
            .background([0, 0, 0, 255])
            .build()
            .unwrap()
    }

    #[test]
    fn pages_stack_with_gaps() {
        let rendered = vec![(1, page(100, 50, 200)), (2, page(100, 30, 100))];
        let (content, errors) = stack_pages(rendered, &config(), None, 2).unwrap();
        assert!(errors.is_empty());
        assert_eq!(content.dimensions(), (100, 84));
        assert_eq!(content.get_pixel(0, 0), &Rgba([200, 200, 200, 255]));
        assert_eq!(content.get_pixel(0, 51), &Rgba([0, 0, 0, 255]));
        assert_eq!(content.get_pixel(0, 54), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn narrower_pages_are_centred() {
        let rendered = vec![(1, page(100, 10, 200)), (2, page(50, 10, 100))];
        let (content, _) = stack_pages(rendered, &config(), None, 2).unwrap();
        assert_eq!(content.get_pixel(10, 15), &Rgba([0, 0, 0, 255]));
        assert_eq!(content.get_pixel(25, 15), &Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn failed_page_becomes_placeholder() {
        let rendered = vec![
            (
                1,
                Err(PageError::RenderFailed {
                    page: 1,
                    detail: "boom".into(),
                }),
            ),
            (2, page(80, 40, 10)),
        ];
        let (content, errors) = stack_pages(rendered, &config(), None, 2).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].page(), 1);
        assert_eq!(content.dimensions(), (80, 84));
        assert_eq!(content.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn oversized_gap_is_an_error_not_a_panic() {
        let mut cfg = config();
        cfg.page_gap = 3_000_000_000;
        let rendered = vec![
            (1, page(10, 10, 0)),
            (2, page(10, 10, 0)),
            (3, page(10, 10, 0)),
        ];
        let err = stack_pages(rendered, &cfg, None, 3).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn stacked_height_detects_overflow() {
        let pages = vec![RgbaImage::new(1, 10), RgbaImage::new(1, 20)];
        assert_eq!(stacked_height(&pages, 5), Some(35));
        assert_eq!(stacked_height(&pages, u32::MAX), None);
        assert_eq!(stacked_height(&[], 5), Some(1));
    }
}
