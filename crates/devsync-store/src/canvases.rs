//! In-memory canvas collection.

use std::sync::Arc;

use devsync_shared::{Canvas, CanvasComment};
use tracing::debug;

use crate::clock::Clock;
use crate::seed;

/// Ordered list of canvases, most recently created first.
pub struct CanvasStore {
    canvases: Vec<Canvas>,
    clock: Arc<dyn Clock>,
}

impl CanvasStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_canvases(clock, Vec::new())
    }

    pub fn with_canvases(clock: Arc<dyn Clock>, canvases: Vec<Canvas>) -> Self {
        Self { canvases, clock }
    }

    /// A store holding the three sample canvases.
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        Self::with_canvases(clock, seed::canvases())
    }

    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    pub fn len(&self) -> usize {
        self.canvases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canvases.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Canvas> {
        self.canvases.iter().find(|c| c.id == id)
    }

    /// Replace the whole collection.
    pub fn set_canvases(&mut self, canvases: Vec<Canvas>) {
        self.canvases = canvases;
    }

    /// Upsert by id, stamping `updated_at` with the current time.
    ///
    /// An existing canvas is replaced where it stands; an unknown id is
    /// prepended. Returns the stored canvas.
    pub fn save_canvas(&mut self, mut canvas: Canvas) -> &Canvas {
        canvas.updated_at = self.clock.now();

        let idx = match self.canvases.iter().position(|c| c.id == canvas.id) {
            Some(idx) => {
                debug!(id = %canvas.id, "canvas updated");
                self.canvases[idx] = canvas;
                idx
            }
            None => {
                debug!(id = %canvas.id, "canvas inserted");
                self.canvases.insert(0, canvas);
                0
            }
        };
        &self.canvases[idx]
    }

    /// A fresh, unsaved canvas. Call [`Self::save_canvas`] to keep it.
    pub fn create_canvas(&self, title: impl Into<String>, template: Option<String>) -> Canvas {
        Canvas::new(title, template, self.clock.now())
    }

    /// Flip the starred flag. Returns the new value, or `None` for an unknown id.
    pub fn toggle_starred(&mut self, id: &str) -> Option<bool> {
        let canvas = self.canvases.iter_mut().find(|c| c.id == id)?;
        canvas.starred = !canvas.starred;
        Some(canvas.starred)
    }

    pub fn starred(&self) -> impl Iterator<Item = &Canvas> {
        self.canvases.iter().filter(|c| c.starred)
    }

    /// Append a comment to the thread of `block_id`. Returns `false` when
    /// the canvas does not exist.
    pub fn add_comment(&mut self, canvas_id: &str, block_id: &str, comment: CanvasComment) -> bool {
        let now = self.clock.now();
        let Some(canvas) = self.canvases.iter_mut().find(|c| c.id == canvas_id) else {
            return false;
        };
        canvas
            .comments
            .entry(block_id.to_string())
            .or_default()
            .push(comment);
        canvas.updated_at = now;
        true
    }
}
