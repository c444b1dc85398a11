//! Pointer input handling for mouse/touch/pen strokes.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are CSS pixels relative to the drawing surface, times are
/// milliseconds on any monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        pointer_id: i32,
        position: Point,
        time_ms: f64,
    },
    Move {
        pointer_id: i32,
        position: Point,
        time_ms: f64,
    },
    Up {
        pointer_id: i32,
        position: Point,
        time_ms: f64,
    },
    /// Pointer left the surface or the platform cancelled it.
    Cancel { pointer_id: i32 },
}

/// What the surface should do in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeAction {
    Begin { position: Point, time_ms: f64 },
    Extend { position: Point, time_ms: f64 },
    /// Extend to the final position, then finish.
    End { position: Point, time_ms: f64 },
    /// Finish without a final position.
    Finish,
}

/// Tracks which pointer owns the stroke in progress.
///
/// Only the pointer that started a stroke can extend or finish it; other
/// pointers (a second finger, a palm) are ignored until it lifts.
#[derive(Debug, Clone, Default)]
pub struct StrokeTracker {
    active: Option<i32>,
}

impl StrokeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the active pointer (after clear or resize).
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Translate a pointer event into a stroke action.
    pub fn handle(&mut self, event: PointerEvent) -> Option<StrokeAction> {
        match event {
            PointerEvent::Down {
                pointer_id,
                position,
                time_ms,
            } => {
                if self.active.is_some() {
                    return None;
                }
                self.active = Some(pointer_id);
                Some(StrokeAction::Begin { position, time_ms })
            }
            PointerEvent::Move {
                pointer_id,
                position,
                time_ms,
            } => (self.active == Some(pointer_id))
                .then_some(StrokeAction::Extend { position, time_ms }),
            PointerEvent::Up {
                pointer_id,
                position,
                time_ms,
            } => {
                if self.active != Some(pointer_id) {
                    return None;
                }
                self.active = None;
                Some(StrokeAction::End { position, time_ms })
            }
            PointerEvent::Cancel { pointer_id } => {
                if self.active != Some(pointer_id) {
                    return None;
                }
                self.active = None;
                Some(StrokeAction::Finish)
            }
        }
    }
}
