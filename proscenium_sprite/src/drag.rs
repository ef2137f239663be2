// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag wiring: connects a [`DragState`] to a sprite's pointer events.
//!
//! A pointer down on the sprite starts the gesture and registers move and end
//! listeners on the sprite's stage, so the drag follows the pointer anywhere
//! over the surface. The end listener removes both stage listeners again.

use alloc::rc::Rc;
use core::cell::RefCell;

use kurbo::Rect;
use proscenium_drag::DragState;
use proscenium_transform::TransformResolver;

use crate::error::{SceneError, reject};
use crate::events::{Event, EventKind, EventTarget, ListenerId};
use crate::tree::Tree;
use crate::types::{SpriteId, StageId};

#[derive(Debug)]
struct DragSession {
    state: DragState,
    /// Stage move/end listeners of the gesture in progress.
    stage_listeners: Option<(StageId, ListenerId, ListenerId)>,
}

/// Per-sprite drag registration.
#[derive(Debug)]
pub(crate) struct DragBinding {
    down: ListenerId,
    session: Rc<RefCell<DragSession>>,
}

fn remove_stage_listeners<R: TransformResolver + 'static>(
    tree: &mut Tree<R>,
    (stage, on_move, on_end): (StageId, ListenerId, ListenerId),
) {
    let target = EventTarget::Stage(stage);
    tree.remove_event_listener(target, EventKind::TouchMove, Some(on_move));
    tree.remove_event_listener(target, EventKind::TouchEnd, Some(on_end));
}

impl<R: TransformResolver + 'static> Tree<R> {
    /// Make a sprite draggable, optionally clamped into `bounds` (in the
    /// parent's coordinates).
    ///
    /// Enabling again replaces the previous binding.
    ///
    /// ```
    /// use kurbo::{Point, Rect};
    /// use proscenium_sprite::{Event, PointerEvent, SpriteOptions, Tree, hit_rect};
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.insert(SpriteOptions::named("root"));
    /// let knob = tree.insert(
    ///     SpriteOptions::named("knob")
    ///         .at(10.0, 10.0)
    ///         .with_extra_hit_test(hit_rect(Rect::new(0.0, 0.0, 20.0, 20.0))),
    /// );
    /// tree.append_child(root, knob).unwrap();
    /// let stage = tree.attach_stage(root).unwrap();
    /// tree.enable_drag(knob, None).unwrap();
    ///
    /// let at = |x, y| PointerEvent::at(Point::new(x, y));
    /// tree.dispatch_pointer(stage, &Event::TouchStart(at(15.0, 15.0)));
    /// tree.dispatch_pointer(stage, &Event::TouchMove(at(45.0, 25.0)));
    /// tree.dispatch_pointer(stage, &Event::TouchEnd(at(45.0, 25.0)));
    ///
    /// assert_eq!(tree.position(knob), Some(Point::new(40.0, 20.0)));
    /// assert!(!tree.is_dragging(knob));
    /// ```
    pub fn enable_drag(&mut self, id: SpriteId, bounds: Option<Rect>) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return reject(SceneError::StaleSprite(id));
        }
        self.disable_drag(id);

        let session = Rc::new(RefCell::new(DragSession {
            state: bounds.map_or_else(DragState::new, DragState::with_bounds),
            stage_listeners: None,
        }));
        let down_session = session.clone();
        let down = self.add_event_listener(
            EventTarget::Sprite(id),
            EventKind::TouchStart,
            move |tree, event| {
                let Some(pointer) = event.pointer() else {
                    return;
                };
                let (Some(stage), Some(position)) = (tree.stage_of(id), tree.position(id)) else {
                    return;
                };
                let leftover = {
                    let mut session = down_session.borrow_mut();
                    session
                        .state
                        .on_down(pointer.pointer_id, position, pointer.position);
                    session.stage_listeners.take()
                };
                // A gesture that never saw its pointer up.
                if let Some(listeners) = leftover {
                    remove_stage_listeners(tree, listeners);
                }
                log::trace!("drag start on {id:?} at {position:?}");

                let move_session = down_session.clone();
                let on_move = tree.add_event_listener(
                    EventTarget::Stage(stage),
                    EventKind::TouchMove,
                    move |tree, event| {
                        let Some(pointer) = event.pointer() else {
                            return;
                        };
                        let next = move_session
                            .borrow()
                            .state
                            .on_move(pointer.pointer_id, pointer.position);
                        if let Some(next) = next {
                            tree.set_position(id, next);
                            tree.mark_dirty(stage);
                        }
                    },
                );
                let end_session = down_session.clone();
                let on_end = tree.add_event_listener(
                    EventTarget::Stage(stage),
                    EventKind::TouchEnd,
                    move |tree, event: &Event| {
                        let Some(pointer) = event.pointer() else {
                            return;
                        };
                        let listeners = {
                            let mut session = end_session.borrow_mut();
                            if !session.state.on_up(pointer.pointer_id) {
                                return;
                            }
                            session.stage_listeners.take()
                        };
                        if let Some(listeners) = listeners {
                            remove_stage_listeners(tree, listeners);
                        }
                        log::trace!("drag end on {id:?}");
                    },
                );
                if let (Ok(on_move), Ok(on_end)) = (on_move, on_end) {
                    down_session.borrow_mut().stage_listeners = Some((stage, on_move, on_end));
                }
            },
        )?;
        self.drags.insert(id, DragBinding { down, session });
        Ok(())
    }

    /// Remove the pointer-down listener installed by [`enable_drag`](Self::enable_drag).
    ///
    /// A drag already in progress keeps following the pointer until it is
    /// released. Returns `false` if the sprite was not draggable.
    pub fn disable_drag(&mut self, id: SpriteId) -> bool {
        let Some(binding) = self.drags.remove(&id) else {
            return false;
        };
        self.remove_event_listener(
            EventTarget::Sprite(id),
            EventKind::TouchStart,
            Some(binding.down),
        );
        true
    }

    /// Abandon every gesture tracked through `stage`'s listeners.
    pub(crate) fn cancel_drags_on(&mut self, stage: StageId) {
        for (id, binding) in &self.drags {
            let mut session = binding.session.borrow_mut();
            if session.stage_listeners.is_some_and(|(s, ..)| s == stage) {
                session.stage_listeners = None;
                session.state.cancel();
                log::trace!("drag on {id:?} cancelled with {stage:?}");
            }
        }
    }

    /// Whether a drag of this sprite is in progress.
    pub fn is_dragging(&self, id: SpriteId) -> bool {
        self.drags
            .get(&id)
            .is_some_and(|b| b.session.borrow().state.is_dragging())
    }
}
