// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Drag: a pointer-driven drag gesture state machine.
//!
//! [`DragState`] tracks one click-and-drag interaction for one draggable element.
//! It knows nothing about trees, listeners, or repainting. Feed it pointer down,
//! move, and up events and it reports the position the element should take.
//!
//! ## States
//!
//! - **Idle**: no active gesture. Moves and ups are ignored.
//! - **Dragging**: entered by [`DragState::on_down`], which captures the element's
//!   position and the pointer position at press time. Left by [`DragState::on_up`]
//!   or [`DragState::cancel`].
//!
//! While dragging, a move to pointer position `p` places the element at
//! `element_start - pointer_start + p`, so the grab offset between pointer and
//! element is preserved.
//!
//! ## Bounds
//!
//! An optional bounds rectangle clamps the element position. Each axis is clamped
//! independently: X into `[bounds.x0, bounds.x1]` and Y into `[bounds.y0, bounds.y1]`.
//!
//! ```
//! use kurbo::{Point, Rect};
//! use proscenium_drag::DragState;
//!
//! let mut drag = DragState::with_bounds(Rect::new(0.0, 0.0, 100.0, 50.0));
//!
//! // Grab an element sitting at (10, 10) with the pointer at (15, 12).
//! drag.on_down(None, Point::new(10.0, 10.0), Point::new(15.0, 12.0));
//! assert!(drag.is_dragging());
//!
//! // Moving the pointer by (+20, +5) moves the element by the same amount.
//! assert_eq!(drag.on_move(None, Point::new(35.0, 17.0)), Some(Point::new(30.0, 15.0)));
//!
//! // Dragging far outside the bounds pins the element to the edges.
//! assert_eq!(drag.on_move(None, Point::new(500.0, -80.0)), Some(Point::new(100.0, 0.0)));
//!
//! assert!(drag.on_up(None));
//! assert_eq!(drag.on_move(None, Point::new(0.0, 0.0)), None);
//! ```
//!
//! ## Pointers
//!
//! The gesture belongs to the pointer that started it. Moves and ups from other
//! pointers are ignored while a drag is in progress. A `None` pointer id means
//! the primary pointer (id 1).
//!
//! This crate is `no_std`.

#![no_std]

use core::num::NonZeroU64;

use kurbo::{Point, Rect};

/// Pointer identifier for telling concurrent pointers apart.
pub type PointerId = NonZeroU64;

/// The pointer assumed when an event carries no pointer id.
pub const PRIMARY_POINTER: PointerId = NonZeroU64::MIN;

/// Positions captured when a drag starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragStart {
    /// Pointer that owns the gesture.
    pub pointer_id: PointerId,
    /// Element position at press time.
    pub element: Point,
    /// Pointer position at press time.
    pub pointer: Point,
}

/// Drag gesture state machine for a single draggable element.
#[derive(Clone, Debug, Default)]
pub struct DragState {
    /// Captured start, present while dragging.
    start: Option<DragStart>,
    /// Optional rectangle the element position is clamped into.
    pub bounds: Option<Rect>,
}

impl DragState {
    /// Create an idle drag state without bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an idle drag state that clamps positions into `bounds`.
    ///
    /// The rectangle is normalized so `x0 <= x1` and `y0 <= y1`.
    pub fn with_bounds(bounds: Rect) -> Self {
        Self {
            start: None,
            bounds: Some(bounds.abs()),
        }
    }

    /// Record a pointer down and enter the dragging state.
    ///
    /// A down while already dragging restarts the gesture from the new positions.
    pub fn on_down(&mut self, pointer_id: Option<PointerId>, element: Point, pointer: Point) {
        self.start = Some(DragStart {
            pointer_id: pointer_id.unwrap_or(PRIMARY_POINTER),
            element,
            pointer,
        });
    }

    /// Process a pointer move.
    ///
    /// Returns the new element position while dragging with the owning pointer,
    /// `None` otherwise.
    pub fn on_move(&self, pointer_id: Option<PointerId>, pointer: Point) -> Option<Point> {
        let start = self.start?;
        if start.pointer_id != pointer_id.unwrap_or(PRIMARY_POINTER) {
            return None;
        }
        let candidate = start.element - start.pointer + pointer.to_vec2();
        Some(self.clamp(candidate.to_point()))
    }

    /// Process a pointer up and return to idle.
    ///
    /// Returns `true` if this ended a drag owned by `pointer_id`.
    pub fn on_up(&mut self, pointer_id: Option<PointerId>) -> bool {
        match self.start {
            Some(start) if start.pointer_id == pointer_id.unwrap_or(PRIMARY_POINTER) => {
                self.start = None;
                true
            }
            _ => false,
        }
    }

    /// Abandon any gesture in progress.
    ///
    /// Returns `true` if a drag was active.
    pub fn cancel(&mut self) -> bool {
        self.start.take().is_some()
    }

    /// Whether a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    /// The captured start of the current drag, if any.
    pub fn start(&self) -> Option<&DragStart> {
        self.start.as_ref()
    }

    /// Clamp a position into the bounds, one axis at a time.
    pub fn clamp(&self, position: Point) -> Point {
        match self.bounds {
            Some(b) => Point::new(
                position.x.max(b.x0).min(b.x1),
                position.y.max(b.y0).min(b.y1),
            ),
            None => position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_ignores_move_and_up() {
        let mut drag = DragState::new();
        assert!(!drag.is_dragging());
        assert_eq!(drag.on_move(None, Point::new(5.0, 5.0)), None);
        assert!(!drag.on_up(None));
        assert!(!drag.cancel());
    }

    #[test]
    fn move_preserves_grab_offset() {
        let mut drag = DragState::new();
        drag.on_down(None, Point::new(100.0, 40.0), Point::new(110.0, 45.0));
        assert_eq!(
            drag.on_move(None, Point::new(110.0, 45.0)),
            Some(Point::new(100.0, 40.0))
        );
        assert_eq!(
            drag.on_move(None, Point::new(90.0, 65.0)),
            Some(Point::new(80.0, 60.0))
        );
    }

    #[test]
    fn axes_clamp_independently() {
        let mut drag = DragState::with_bounds(Rect::new(0.0, 10.0, 50.0, 20.0));
        drag.on_down(None, Point::ZERO, Point::ZERO);

        // X inside, Y above the range.
        assert_eq!(
            drag.on_move(None, Point::new(25.0, 100.0)),
            Some(Point::new(25.0, 20.0))
        );
        // X below, Y inside.
        assert_eq!(
            drag.on_move(None, Point::new(-5.0, 15.0)),
            Some(Point::new(0.0, 15.0))
        );
        // Y is never clamped against the X range.
        assert_eq!(
            drag.on_move(None, Point::new(40.0, 12.0)),
            Some(Point::new(40.0, 12.0))
        );
    }

    #[test]
    fn bounds_are_normalized() {
        let drag = DragState::with_bounds(Rect::new(50.0, 20.0, 0.0, 10.0));
        assert_eq!(drag.clamp(Point::new(60.0, 0.0)), Point::new(50.0, 10.0));
    }

    #[test]
    fn other_pointers_are_ignored() {
        let p1 = NonZeroU64::new(1).unwrap();
        let p2 = NonZeroU64::new(2).unwrap();
        let mut drag = DragState::new();
        drag.on_down(Some(p2), Point::ZERO, Point::ZERO);

        assert_eq!(drag.on_move(Some(p1), Point::new(3.0, 3.0)), None);
        assert_eq!(drag.on_move(None, Point::new(3.0, 3.0)), None);
        assert!(!drag.on_up(Some(p1)));
        assert!(drag.is_dragging());

        assert_eq!(
            drag.on_move(Some(p2), Point::new(3.0, 4.0)),
            Some(Point::new(3.0, 4.0))
        );
        assert!(drag.on_up(Some(p2)));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn down_while_dragging_restarts() {
        let mut drag = DragState::new();
        drag.on_down(None, Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        drag.on_down(None, Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(drag.start().map(|s| s.element), Some(Point::new(10.0, 10.0)));
        assert_eq!(
            drag.on_move(None, Point::new(1.0, 1.0)),
            Some(Point::new(11.0, 11.0))
        );
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut drag = DragState::new();
        drag.on_down(None, Point::ZERO, Point::ZERO);
        assert!(drag.cancel());
        assert!(!drag.is_dragging());
        assert_eq!(drag.on_move(None, Point::new(1.0, 1.0)), None);
    }
}
