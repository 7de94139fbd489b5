//! Event loop around the [`Viewer`].
//!
//! Every state change arrives as a [`ViewerEvent`] and is applied by
//! [`ViewerSession::handle_event`], one at a time. Loads run off the loop:
//! selecting a file spawns a task that decodes the document and posts
//! `LoadSucceeded` / `LoadFailed` back into the session's channel. The
//! viewer's generation token drops results that arrive for a superseded
//! selection, whatever order they are delivered in.

use crate::config::ViewerConfig;
use crate::document::DocumentHandle;
use crate::error::ViewerError;
use crate::geometry::ContainerSize;
use crate::renderer::{load_document, DocumentRenderer};
use crate::viewer::{Frame, LoadToken, Viewer, ViewerState};
use crate::viewport::PanZoom;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

/// Inputs to the viewer's event loop.
#[derive(Debug)]
pub enum ViewerEvent {
    /// The file picker changed. Empty means nothing was picked.
    FilesSelected(Vec<DocumentHandle>),
    /// The renderer decoded the document for `token`.
    LoadSucceeded { token: LoadToken, page_count: usize },
    /// The renderer failed to decode the document for `token`.
    LoadFailed { token: LoadToken, error: ViewerError },
    /// The container was (re)measured.
    ContainerMeasured(ContainerSize),
    /// Drag the content by a screen-space delta.
    Pan { dx: f64, dy: f64 },
    /// Zoom by `factor` around a screen-space cursor.
    Zoom {
        cursor_x: f64,
        cursor_y: f64,
        factor: f64,
    },
    /// Back to the identity transform.
    ResetView,
}

/// Cloneable handle for posting events into a session.
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<ViewerEvent>);

impl EventSender {
    /// Post an event. Returns `false` once the session is gone.
    pub fn send(&self, event: ViewerEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

/// A viewer plus its pan/zoom surface, renderer, and event channel.
pub struct ViewerSession {
    viewer: Viewer,
    pan_zoom: PanZoom,
    renderer: Arc<dyn DocumentRenderer>,
    sender: EventSender,
    events: UnboundedReceiverStream<ViewerEvent>,
    pending_loads: usize,
    load_error: Option<ViewerError>,
}

impl ViewerSession {
    pub fn new(config: &ViewerConfig, renderer: Arc<dyn DocumentRenderer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            viewer: Viewer::from_config(config),
            pan_zoom: config.pan_zoom,
            renderer,
            sender: EventSender(tx),
            events: UnboundedReceiverStream::new(rx),
            pending_loads: 0,
            load_error: None,
        }
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn state(&self) -> &ViewerState {
        self.viewer.state()
    }

    pub fn pan_zoom(&self) -> &PanZoom {
        &self.pan_zoom
    }

    pub fn renderer(&self) -> Arc<dyn DocumentRenderer> {
        Arc::clone(&self.renderer)
    }

    /// Loads spawned whose result has not been received yet.
    pub fn pending_loads(&self) -> usize {
        self.pending_loads
    }

    pub fn frame(&self) -> Frame {
        self.viewer.frame()
    }

    /// The error behind the current `DocumentFailed` state, if not yet taken.
    pub fn take_load_error(&mut self) -> Option<ViewerError> {
        self.load_error.take()
    }

    /// Apply one event. Must be called from within a tokio runtime, since
    /// a selection spawns the load task.
    ///
    /// Returns `true` when the event changed viewer or view state.
    pub fn handle_event(&mut self, event: ViewerEvent) -> bool {
        trace!("event: {:?}", event);
        match event {
            ViewerEvent::FilesSelected(files) => match self.viewer.select_files(files) {
                Some(token) => {
                    self.load_error = None;
                    self.spawn_load(token);
                    true
                }
                None => {
                    debug!("Empty file selection ignored");
                    false
                }
            },
            ViewerEvent::LoadSucceeded { token, page_count } => {
                self.pending_loads = self.pending_loads.saturating_sub(1);
                self.viewer.on_load_success(token, page_count)
            }
            ViewerEvent::LoadFailed { token, error } => {
                self.pending_loads = self.pending_loads.saturating_sub(1);
                let applied = self.viewer.on_load_failure(token, error.to_string());
                if applied {
                    self.load_error = Some(error);
                }
                applied
            }
            ViewerEvent::ContainerMeasured(size) => {
                self.viewer.measure_container(size);
                true
            }
            ViewerEvent::Pan { dx, dy } => {
                self.pan_zoom.pan(dx, dy);
                true
            }
            ViewerEvent::Zoom {
                cursor_x,
                cursor_y,
                factor,
            } => {
                self.pan_zoom.zoom_at(cursor_x, cursor_y, factor);
                true
            }
            ViewerEvent::ResetView => {
                self.pan_zoom.reset();
                true
            }
        }
    }

    /// Wait for the next posted event and apply it.
    ///
    /// Returns `None` only if the channel closed.
    pub async fn process_next(&mut self) -> Option<bool> {
        let event = self.events.next().await?;
        Some(self.handle_event(event))
    }

    /// Apply events until every spawned load has reported back.
    pub async fn settle(&mut self) -> &ViewerState {
        while self.pending_loads > 0 {
            if self.process_next().await.is_none() {
                break;
            }
        }
        self.viewer.state()
    }

    fn spawn_load(&mut self, token: LoadToken) {
        let Some(document) = self.viewer.document().cloned() else {
            return;
        };
        self.pending_loads += 1;

        let renderer = Arc::clone(&self.renderer);
        let sender = self.sender.clone();
        debug!("Spawning load #{} for '{}'", token.generation(), document.name());

        tokio::spawn(async move {
            let event = match load_document(renderer, document).await {
                Ok(page_count) => ViewerEvent::LoadSucceeded { token, page_count },
                Err(error) => ViewerEvent::LoadFailed { token, error },
            };
            sender.send(event);
        });
    }
}
