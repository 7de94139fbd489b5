//! Document renderer: decode a document, report its page count, and
//! rasterise pages.
//!
//! [`DocumentRenderer`] is the seam between the viewer and the decoding
//! engine. [`PdfiumRenderer`] is the production implementation; tests plug
//! in stubs.
//!
//! pdfium is blocking and keeps thread-local state, so the async helpers
//! [`load_document`] and [`render_pages`] run it on
//! `tokio::task::spawn_blocking`.

use crate::config::ViewerConfig;
use crate::document::DocumentHandle;
use crate::error::{PageError, ViewerError};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of rasterising one page: `(page_number_1based, image or error)`.
pub type RenderedPage = (usize, Result<DynamicImage, PageError>);

/// Decodes documents and rasterises their pages.
pub trait DocumentRenderer: Send + Sync {
    /// Decode `document` and return its page count.
    fn load(&self, document: &DocumentHandle) -> Result<usize, ViewerError>;

    /// Rasterise one page (1-indexed) at `target_width` pixels.
    fn render_page(
        &self,
        document: &DocumentHandle,
        page_number: usize,
        target_width: u32,
    ) -> Result<DynamicImage, PageError>;

    /// Rasterise several pages. Fails only when the document itself cannot
    /// be opened; per-page failures are returned in place.
    fn render_many(
        &self,
        document: &DocumentHandle,
        page_numbers: &[usize],
        target_width: u32,
    ) -> Result<Vec<RenderedPage>, ViewerError> {
        Ok(page_numbers
            .iter()
            .map(|&n| (n, self.render_page(document, n, target_width)))
            .collect())
    }
}

/// pdfium-backed renderer.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    library: Option<PathBuf>,
    password: Option<String>,
    max_rendered_pixels: u32,
}

impl Default for PdfiumRenderer {
    fn default() -> Self {
        Self {
            library: None,
            password: None,
            max_rendered_pixels: 2000,
        }
    }
}

impl PdfiumRenderer {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            library: config.pdfium_library.clone(),
            password: config.password.clone(),
            max_rendered_pixels: config.max_rendered_pixels,
        }
    }

    /// Bind pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system library.
    ///
    /// A directory is accepted and resolved to the platform library name
    /// inside it.
    fn bind(&self) -> Result<Pdfium, ViewerError> {
        let explicit = self
            .library
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let path = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                Pdfium::bind_to_library(&path).map_err(|e| {
                    ViewerError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
                })?
            }
            None => Pdfium::bind_to_system_library()
                .map_err(|e| ViewerError::PdfiumBindingFailed(e.to_string()))?,
        };

        Ok(Pdfium::new(bindings))
    }
}

/// Map a pdfium open failure onto the fatal error taxonomy.
fn open_error(path: &Path, password: Option<&str>, e: PdfiumError) -> ViewerError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ViewerError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ViewerError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ViewerError::CorruptDocument {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

impl DocumentRenderer for PdfiumRenderer {
    fn load(&self, document: &DocumentHandle) -> Result<usize, ViewerError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();
        let doc = pdfium
            .load_pdf_from_file(document.path(), password)
            .map_err(|e| open_error(document.path(), password, e))?;

        let total_pages = doc.pages().len() as usize;
        info!("PDF loaded: {} pages", total_pages);
        Ok(total_pages)
    }

    fn render_page(
        &self,
        document: &DocumentHandle,
        page_number: usize,
        target_width: u32,
    ) -> Result<DynamicImage, PageError> {
        let mut rendered = self
            .render_many(document, &[page_number], target_width)
            .map_err(|e| PageError::RenderFailed {
                page: page_number,
                detail: e.to_string(),
            })?;
        match rendered.pop() {
            Some((_, result)) => result,
            None => Err(PageError::RenderFailed {
                page: page_number,
                detail: "renderer returned no image".into(),
            }),
        }
    }

    fn render_many(
        &self,
        document: &DocumentHandle,
        page_numbers: &[usize],
        target_width: u32,
    ) -> Result<Vec<RenderedPage>, ViewerError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();
        let doc = pdfium
            .load_pdf_from_file(document.path(), password)
            .map_err(|e| open_error(document.path(), password, e))?;

        let pages = doc.pages();
        let total_pages = pages.len() as usize;

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width as i32)
            .set_maximum_height(self.max_rendered_pixels as i32);

        let mut results = Vec::with_capacity(page_numbers.len());

        for &page_number in page_numbers {
            if page_number == 0 || page_number > total_pages {
                warn!(
                    "Skipping page {} (out of range, total={})",
                    page_number, total_pages
                );
                results.push((
                    page_number,
                    Err(PageError::RenderFailed {
                        page: page_number,
                        detail: format!("out of range (document has {total_pages} pages)"),
                    }),
                ));
                continue;
            }

            let page = match pages.get((page_number - 1) as u16) {
                Ok(page) => page,
                Err(e) => {
                    results.push((
                        page_number,
                        Err(PageError::RenderFailed {
                            page: page_number,
                            detail: format!("{:?}", e),
                        }),
                    ));
                    continue;
                }
            };

            let result = page
                .render_with_config(&render_config)
                .map(|bitmap| bitmap.as_image())
                .map_err(|e| PageError::RenderFailed {
                    page: page_number,
                    detail: format!("{:?}", e),
                });

            if let Ok(ref image) = result {
                debug!(
                    "Rendered page {} → {}x{} px",
                    page_number,
                    image.width(),
                    image.height()
                );
            }
            results.push((page_number, result));
        }

        Ok(results)
    }
}

/// Decode a document off the async executor and return its page count.
pub async fn load_document(
    renderer: Arc<dyn DocumentRenderer>,
    document: DocumentHandle,
) -> Result<usize, ViewerError> {
    let start = Instant::now();
    let pages = tokio::task::spawn_blocking(move || renderer.load(&document))
        .await
        .map_err(|e| ViewerError::Internal(format!("Load task panicked: {}", e)))??;
    debug!("Load finished in {}ms", start.elapsed().as_millis());
    Ok(pages)
}

/// Rasterise the given pages off the async executor.
pub async fn render_pages(
    renderer: Arc<dyn DocumentRenderer>,
    document: DocumentHandle,
    page_numbers: Vec<usize>,
    target_width: u32,
) -> Result<Vec<RenderedPage>, ViewerError> {
    tokio::task::spawn_blocking(move || {
        renderer.render_many(&document, &page_numbers, target_width)
    })
    .await
    .map_err(|e| ViewerError::Internal(format!("Render task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    struct FixedRenderer {
        pages: usize,
    }

    impl DocumentRenderer for FixedRenderer {
        fn load(&self, _document: &DocumentHandle) -> Result<usize, ViewerError> {
            Ok(self.pages)
        }

        fn render_page(
            &self,
            _document: &DocumentHandle,
            page_number: usize,
            target_width: u32,
        ) -> Result<DynamicImage, PageError> {
            if page_number > self.pages {
                return Err(PageError::RenderFailed {
                    page: page_number,
                    detail: "no such page".into(),
                });
            }
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                target_width,
                10,
                Rgba([0, 0, 0, 255]),
            )))
        }
    }

    #[test]
    fn open_error_classification() {
        let path = Path::new("x.pdf");
        let e = open_error(path, None, PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert!(matches!(e, ViewerError::PasswordRequired { .. }));

        let e = open_error(path, Some("pw"), PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::PasswordError,
        ));
        assert!(matches!(e, ViewerError::WrongPassword { .. }));

        let e = open_error(path, None, PdfiumError::PdfiumLibraryInternalError(
            PdfiumInternalError::FormatError,
        ));
        assert!(matches!(e, ViewerError::CorruptDocument { .. }));
    }

    #[test]
    fn default_render_many_keeps_page_errors_in_place() {
        let r = FixedRenderer { pages: 2 };
        let doc = DocumentHandle::new("/tmp/a.pdf", 1);
        let out = r.render_many(&doc, &[1, 3, 2], 50).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].1.is_ok());
        assert_eq!(out[1].0, 3);
        assert!(out[1].1.is_err());
        assert_eq!(out[2].1.as_ref().unwrap().width(), 50);
    }

    #[tokio::test]
    async fn async_helpers_run_on_blocking_pool() {
        let r: Arc<dyn DocumentRenderer> = Arc::new(FixedRenderer { pages: 4 });
        let doc = DocumentHandle::new("/tmp/a.pdf", 1);
        assert_eq!(load_document(Arc::clone(&r), doc.clone()).await.unwrap(), 4);
        let pages = render_pages(r, doc, vec![1, 2], 20).await.unwrap();
        assert_eq!(pages.len(), 2);
    }
}
