// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named events and synchronous listener dispatch.
//!
//! Listeners are keyed by an [`EventTarget`] (a sprite or a stage) and an
//! [`EventKind`]. Dispatch is synchronous and runs handlers in registration
//! order. The handler list is snapshotted before the first handler runs, so
//! handlers may freely edit the tree and add or remove listeners; those changes
//! take effect on the next dispatch.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use hashbrown::HashMap;
use kurbo::Point;
use proscenium_drag::PointerId;
use proscenium_transform::{CssTransformResolver, TransformResolver};
use smallvec::SmallVec;

use crate::error::{SceneError, reject};
use crate::tree::Tree;
use crate::types::{HitTestResult, SpriteId, StageId};

/// Something listeners can be registered on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventTarget {
    /// A single sprite.
    Sprite(SpriteId),
    /// A whole stage; receives every pointer event routed through it.
    Stage(StageId),
}

/// The kind of an [`Event`], used to register listeners.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    /// Pointer went down.
    TouchStart,
    /// Pointer moved.
    TouchMove,
    /// Pointer went up.
    TouchEnd,
    /// The sprite joined a stage.
    Attached,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::Attached,
    ];

    /// The conventional lowercase event name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Attached => "attached",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event name that is not one of the [`EventKind`]s.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind `{0}`")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownEventKind(s.into()))
    }
}

/// Pointer payload. `position` is in the stage's coordinate space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Identifies the pointer for multi-touch input; `None` for a single mouse.
    pub pointer_id: Option<PointerId>,
    /// Where the pointer is.
    pub position: Point,
}

impl PointerEvent {
    /// A pointer event for the single implicit pointer.
    pub const fn at(position: Point) -> Self {
        Self {
            pointer_id: None,
            position,
        }
    }
}

/// An event delivered to listeners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    /// Pointer went down.
    TouchStart(PointerEvent),
    /// Pointer moved.
    TouchMove(PointerEvent),
    /// Pointer went up.
    TouchEnd(PointerEvent),
    /// The receiving sprite joined this stage.
    Attached(StageId),
}

impl Event {
    /// The event's kind.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::TouchStart(_) => EventKind::TouchStart,
            Self::TouchMove(_) => EventKind::TouchMove,
            Self::TouchEnd(_) => EventKind::TouchEnd,
            Self::Attached(_) => EventKind::Attached,
        }
    }

    /// The pointer payload of pointer events.
    pub const fn pointer(&self) -> Option<&PointerEvent> {
        match self {
            Self::TouchStart(p) | Self::TouchMove(p) | Self::TouchEnd(p) => Some(p),
            Self::Attached(_) => None,
        }
    }
}

/// Handle of a registered listener, unique for the lifetime of a tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// An event handler. It receives the tree mutably, so it can edit it.
pub type Handler<R = CssTransformResolver> = Rc<dyn Fn(&mut Tree<R>, &Event)>;

type Bucket<R> = SmallVec<[(ListenerId, Handler<R>); 2]>;

/// Listener registry of a tree.
pub(crate) struct Listeners<R: TransformResolver> {
    map: HashMap<(EventTarget, EventKind), Bucket<R>>,
    next_id: u64,
}

impl<R: TransformResolver> Listeners<R> {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
            next_id: 0,
        }
    }

    fn add(&mut self, target: EventTarget, kind: EventKind, handler: Handler<R>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.map.entry((target, kind)).or_default().push((id, handler));
        id
    }

    fn remove(&mut self, target: EventTarget, kind: EventKind, id: Option<ListenerId>) -> usize {
        let Some(bucket) = self.map.get_mut(&(target, kind)) else {
            return 0;
        };
        let before = bucket.len();
        match id {
            Some(id) => bucket.retain(|(l, _)| *l != id),
            None => bucket.clear(),
        }
        let removed = before - bucket.len();
        if bucket.is_empty() {
            self.map.remove(&(target, kind));
        }
        removed
    }

    /// Drop every listener of `target`.
    pub(crate) fn remove_target(&mut self, target: EventTarget) {
        self.map.retain(|(t, _), _| *t != target);
    }

    fn snapshot(&self, target: EventTarget, kind: EventKind) -> SmallVec<[Handler<R>; 2]> {
        self.map
            .get(&(target, kind))
            .map(|bucket| bucket.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    fn count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.map.get(&(target, kind)).map_or(0, |b| b.len())
    }
}

impl<R: TransformResolver> fmt::Debug for Listeners<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total: usize = self.map.values().map(|b| b.len()).sum();
        f.debug_struct("Listeners")
            .field("keys", &self.map.len())
            .field("total", &total)
            .finish_non_exhaustive()
    }
}

impl<R: TransformResolver + 'static> Tree<R> {
    fn target_alive(&self, target: EventTarget) -> bool {
        match target {
            EventTarget::Sprite(id) => self.is_alive(id),
            EventTarget::Stage(stage) => self.is_stage_alive(stage),
        }
    }

    /// Register `handler` for `kind` events on `target`.
    ///
    /// Listeners are dropped automatically when their sprite is destroyed or their
    /// stage detached.
    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        handler: impl Fn(&mut Self, &Event) + 'static,
    ) -> Result<ListenerId, SceneError> {
        if !self.target_alive(target) {
            return match target {
                EventTarget::Sprite(id) => reject(SceneError::StaleSprite(id)),
                EventTarget::Stage(stage) => reject(SceneError::StaleStage(stage)),
            };
        }
        Ok(self.listeners.add(target, kind, Rc::new(handler)))
    }

    /// Remove one listener, or all listeners of `kind` on `target` when `id` is `None`.
    ///
    /// Returns how many were removed.
    pub fn remove_event_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        id: Option<ListenerId>,
    ) -> usize {
        self.listeners.remove(target, kind, id)
    }

    /// Number of listeners registered for `kind` on `target`.
    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.listeners.count(target, kind)
    }

    /// Run every listener for `event` on `target`, in registration order.
    ///
    /// Returns how many handlers ran.
    pub fn dispatch_event(&mut self, target: EventTarget, event: &Event) -> usize {
        let handlers = self.listeners.snapshot(target, event.kind());
        for handler in &handlers {
            handler(self, event);
        }
        handlers.len()
    }

    /// Route a pointer event through a stage.
    ///
    /// The event goes first to the frontmost sprite under its position, then
    /// bubbles through that sprite's ancestors up to the stage root, and finally
    /// reaches the stage itself. The route is fixed before any handler runs.
    /// Returns the hit test result used for routing. Events without a pointer
    /// payload, and stale stages, route nowhere.
    pub fn dispatch_pointer(&mut self, stage: StageId, event: &Event) -> HitTestResult {
        let Some(pointer) = event.pointer() else {
            return HitTestResult::MISS;
        };
        if !self.is_stage_alive(stage) {
            return HitTestResult::MISS;
        }
        let hit = self.hit_test_stage(stage, pointer.position);
        let mut route: SmallVec<[SpriteId; 8]> = SmallVec::new();
        let mut current = hit.target;
        while let Some(id) = current {
            route.push(id);
            current = self.parent_of(id);
        }
        for id in route {
            self.dispatch_event(EventTarget::Sprite(id), event);
        }
        self.dispatch_event(EventTarget::Stage(stage), event);
        hit
    }
}
