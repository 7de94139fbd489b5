//! The viewer's selection and load state machine, and its render pass.
//!
//! ```text
//!               select(file)                 load ok(token, n)
//! NoDocument ───────────────▶ DocumentSelected ───────────────▶ DocumentLoaded
//!                                 ▲    │  load err(token)              │
//!                                 │    ▼                               │
//!                                 │ DocumentFailed                     │
//!                                 └────────── select(file) ◀───────────┘
//! ```
//!
//! Every selection issues a fresh [`LoadToken`] and resets the page count in
//! the same transition. Load results carry the token of the request that
//! produced them; results for anything but the current token are dropped.

use crate::config::ViewerConfig;
use crate::document::DocumentHandle;
use crate::geometry::{ContainerSize, MapBounds, Marker};
use crate::overlay::{place_markers, MarkerPlacement};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Generation number of a load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Where the viewer is in the selection/load flow.
#[derive(Debug, Clone)]
pub enum ViewerState {
    /// Nothing selected yet.
    NoDocument,
    /// A document was picked; its load is in flight.
    DocumentSelected {
        document: DocumentHandle,
        token: LoadToken,
    },
    /// The renderer reported the page count for the current document.
    DocumentLoaded {
        document: DocumentHandle,
        token: LoadToken,
        page_count: usize,
    },
    /// The renderer could not decode the current document.
    DocumentFailed {
        document: DocumentHandle,
        token: LoadToken,
        reason: String,
    },
}

impl ViewerState {
    pub fn document(&self) -> Option<&DocumentHandle> {
        match self {
            ViewerState::NoDocument => None,
            ViewerState::DocumentSelected { document, .. }
            | ViewerState::DocumentLoaded { document, .. }
            | ViewerState::DocumentFailed { document, .. } => Some(document),
        }
    }

    pub fn token(&self) -> Option<LoadToken> {
        match self {
            ViewerState::NoDocument => None,
            ViewerState::DocumentSelected { token, .. }
            | ViewerState::DocumentLoaded { token, .. }
            | ViewerState::DocumentFailed { token, .. } => Some(*token),
        }
    }

    /// Short state name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ViewerState::NoDocument => "NoDocument",
            ViewerState::DocumentSelected { .. } => "DocumentSelected",
            ViewerState::DocumentLoaded { .. } => "DocumentLoaded",
            ViewerState::DocumentFailed { .. } => "DocumentFailed",
        }
    }
}

/// One page the renderer is asked to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUnit {
    /// 1-indexed.
    pub page_number: usize,
}

/// Output of one render pass.
#[derive(Debug, Clone)]
pub struct Frame {
    pub document: Option<DocumentHandle>,
    pub pages: Vec<PageUnit>,
    pub markers: Vec<MarkerPlacement>,
}

impl Frame {
    pub fn is_empty(&self) -> bool {
        self.document.is_none()
    }
}

/// The viewer: owns the document state, the marker set, and the last
/// container measurement.
#[derive(Debug, Clone)]
pub struct Viewer {
    state: ViewerState,
    generation: u64,
    container: Option<ContainerSize>,
    markers: Vec<Marker>,
    bounds: MapBounds,
}

impl Viewer {
    pub fn new(markers: Vec<Marker>, bounds: MapBounds) -> Self {
        Self {
            state: ViewerState::NoDocument,
            generation: 0,
            container: None,
            markers,
            bounds,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.markers.clone(), config.bounds)
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn document(&self) -> Option<&DocumentHandle> {
        self.state.document()
    }

    /// Pages reported for the current document; 0 until it has loaded.
    pub fn page_count(&self) -> usize {
        match self.state {
            ViewerState::DocumentLoaded { page_count, .. } => page_count,
            _ => 0,
        }
    }

    pub fn current_token(&self) -> Option<LoadToken> {
        self.state.token()
    }

    pub fn container(&self) -> Option<ContainerSize> {
        self.container
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    /// Handle a file-selection event.
    ///
    /// Only the first file is taken. An empty selection is ignored and
    /// returns `None`; otherwise the document is replaced, the page count
    /// drops to 0, and the token for the new load is returned.
    pub fn select_files(&mut self, files: Vec<DocumentHandle>) -> Option<LoadToken> {
        let document = files.into_iter().next()?;
        self.generation += 1;
        let token = LoadToken(self.generation);
        info!(
            "Selected '{}' (load #{}, was {})",
            document.name(),
            token.0,
            self.state.name()
        );
        self.state = ViewerState::DocumentSelected { document, token };
        Some(token)
    }

    /// Apply a load-success result. Returns `false` when it was stale.
    pub fn on_load_success(&mut self, token: LoadToken, page_count: usize) -> bool {
        match &self.state {
            ViewerState::DocumentSelected {
                document,
                token: current,
            } if *current == token => {
                info!("Loaded '{}': {} pages", document.name(), page_count);
                self.state = ViewerState::DocumentLoaded {
                    document: document.clone(),
                    token,
                    page_count,
                };
                true
            }
            _ => {
                debug!(
                    "Discarding stale load result #{} (state {}, current {:?})",
                    token.0,
                    self.state.name(),
                    self.current_token()
                );
                false
            }
        }
    }

    /// Apply a load-failure result. Returns `false` when it was stale.
    pub fn on_load_failure(&mut self, token: LoadToken, reason: impl Into<String>) -> bool {
        match &self.state {
            ViewerState::DocumentSelected {
                document,
                token: current,
            } if *current == token => {
                let reason = reason.into();
                warn!("Failed to load '{}': {}", document.name(), reason);
                self.state = ViewerState::DocumentFailed {
                    document: document.clone(),
                    token,
                    reason,
                };
                true
            }
            _ => {
                debug!("Discarding stale load failure #{}", token.0);
                false
            }
        }
    }

    /// Record the container's current pixel size.
    pub fn measure_container(&mut self, size: ContainerSize) {
        debug!("Container measured: {}x{}", size.width, size.height);
        self.container = Some(size);
    }

    /// Run the render pass for the current state.
    ///
    /// No document: an empty frame. Otherwise one page unit per loaded page
    /// (numbered from 1) and, once the container is measured, one placement
    /// per marker. A failed document renders nothing.
    pub fn frame(&self) -> Frame {
        let document = match &self.state {
            ViewerState::NoDocument | ViewerState::DocumentFailed { .. } => {
                return Frame {
                    document: None,
                    pages: Vec::new(),
                    markers: Vec::new(),
                }
            }
            other => other.document().cloned(),
        };

        let pages = (1..=self.page_count())
            .map(|page_number| PageUnit { page_number })
            .collect();

        Frame {
            document,
            pages,
            markers: place_markers(&self.markers, &self.bounds, self.container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Viewer {
        Viewer::from_config(&ViewerConfig::default())
    }

    fn doc(name: &str) -> DocumentHandle {
        DocumentHandle::new(format!("/tmp/{name}"), 100)
    }

    #[test]
    fn starts_empty() {
        let v = viewer();
        assert!(matches!(v.state(), ViewerState::NoDocument));
        assert_eq!(v.page_count(), 0);
        assert!(v.frame().is_empty());
    }

    #[test]
    fn empty_selection_is_ignored() {
        let mut v = viewer();
        assert!(v.select_files(vec![]).is_none());
        assert!(matches!(v.state(), ViewerState::NoDocument));

        let t = v.select_files(vec![doc("a.pdf")]).unwrap();
        v.on_load_success(t, 4);
        assert!(v.select_files(vec![]).is_none());
        assert_eq!(v.page_count(), 4);
        assert_eq!(v.document().unwrap().name(), "a.pdf");
    }

    #[test]
    fn takes_first_of_many_files() {
        let mut v = viewer();
        v.select_files(vec![doc("first.pdf"), doc("second.pdf")]);
        assert_eq!(v.document().unwrap().name(), "first.pdf");
    }

    #[test]
    fn load_success_yields_numbered_pages() {
        let mut v = viewer();
        let t = v.select_files(vec![doc("a.pdf")]).unwrap();
        assert!(v.on_load_success(t, 3));
        let frame = v.frame();
        assert_eq!(
            frame.pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn reselect_resets_page_count() {
        let mut v = viewer();
        let t1 = v.select_files(vec![doc("long.pdf")]).unwrap();
        v.on_load_success(t1, 40);
        let t2 = v.select_files(vec![doc("short.pdf")]).unwrap();
        assert!(t2 > t1);
        assert_eq!(v.page_count(), 0);
        assert!(v.frame().pages.is_empty());
        assert!(matches!(v.state(), ViewerState::DocumentSelected { .. }));
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut v = viewer();
        let t1 = v.select_files(vec![doc("a.pdf")]).unwrap();
        let t2 = v.select_files(vec![doc("b.pdf")]).unwrap();

        assert!(!v.on_load_success(t1, 99));
        assert_eq!(v.page_count(), 0);
        assert!(!v.on_load_failure(t1, "boom"));
        assert!(matches!(v.state(), ViewerState::DocumentSelected { .. }));

        assert!(v.on_load_success(t2, 2));
        assert_eq!(v.page_count(), 2);
        // a duplicate delivery for the same token is also ignored
        assert!(!v.on_load_success(t2, 7));
        assert_eq!(v.page_count(), 2);
    }

    #[test]
    fn failure_renders_nothing() {
        let mut v = viewer();
        v.measure_container(ContainerSize::new(100.0, 100.0));
        let t = v.select_files(vec![doc("bad.pdf")]).unwrap();
        assert!(v.on_load_failure(t, "not a PDF"));
        assert!(matches!(v.state(), ViewerState::DocumentFailed { .. }));
        let frame = v.frame();
        assert!(frame.is_empty());
        assert!(frame.markers.is_empty());

        // recoverable by selecting another file
        let t2 = v.select_files(vec![doc("good.pdf")]).unwrap();
        assert!(v.on_load_success(t2, 1));
    }

    #[test]
    fn markers_wait_for_measurement() {
        let mut v = viewer();
        let t = v.select_files(vec![doc("a.pdf")]).unwrap();
        v.on_load_success(t, 1);
        assert!(v.frame().markers.is_empty());

        v.measure_container(ContainerSize::new(1000.0, 2000.0));
        let markers = v.frame().markers;
        assert_eq!(markers.len(), 3);
        assert!((markers[0].position.x - 900.0).abs() < 1e-9);
        assert!((markers[0].position.y - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn no_markers_without_document() {
        let mut v = viewer();
        v.measure_container(ContainerSize::new(1000.0, 2000.0));
        assert!(v.frame().markers.is_empty());
    }
}
