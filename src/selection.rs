//! Mouse-drag selection state machine.
//!
//! The overlay feeds pointer events in global logical coordinates; this module
//! decides what they mean. It knows nothing about Wayland so the whole
//! interaction can be exercised in tests.

use crate::geometry::{Point, Rect};

/// Spans narrower or shorter than this are treated as a stray click.
pub const MIN_SELECTION_SIZE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Dragging { start: Point, current: Point },
    Captured(Rect),
    Cancelled,
}

/// What a button release did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// No drag was in progress.
    Ignored,
    /// The drag was too small and has been discarded; back to idle.
    Discarded,
    Captured(Rect),
}

#[derive(Debug, Clone)]
pub struct Selection {
    phase: Phase,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Captured(_) | Phase::Cancelled)
    }

    /// The captured region, once the selection has finished with one.
    pub fn result(&self) -> Option<Rect> {
        match self.phase {
            Phase::Captured(rect) => Some(rect),
            _ => None,
        }
    }

    /// Rectangle to draw while dragging.
    pub fn current_rect(&self) -> Option<Rect> {
        match self.phase {
            Phase::Dragging { start, current } => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    pub fn press(&mut self, at: Point) {
        if let Phase::Idle = self.phase {
            log::debug!("Selection started at {:.1},{:.1}", at.x, at.y);
            self.phase = Phase::Dragging { start: at, current: at };
        }
    }

    /// Returns the live rectangle when a drag is in progress.
    pub fn motion(&mut self, at: Point) -> Option<Rect> {
        if let Phase::Dragging { current, .. } = &mut self.phase {
            *current = at;
        }
        self.current_rect()
    }

    pub fn release(&mut self, at: Point) -> Release {
        let Phase::Dragging { start, .. } = self.phase else {
            return Release::Ignored;
        };

        let width = (at.x - start.x).abs();
        let height = (at.y - start.y).abs();
        if width < MIN_SELECTION_SIZE || height < MIN_SELECTION_SIZE {
            log::debug!("Discarding {:.1}x{:.1} selection", width, height);
            self.phase = Phase::Idle;
            return Release::Discarded;
        }

        let rect = Rect::from_corners(start, at);
        log::info!("Selected region {}", rect);
        self.phase = Phase::Captured(rect);
        Release::Captured(rect)
    }

    pub fn cancel(&mut self) {
        if !self.is_finished() {
            log::info!("Selection cancelled");
            self.phase = Phase::Cancelled;
        }
    }
}
