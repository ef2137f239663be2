// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the sprite tree: identifiers, flags, type tags, and hooks.

use alloc::rc::Rc;
use kurbo::{Point, Rect};

use crate::paint::PaintContext;

/// Identifier for a sprite in the tree (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SpriteId(pub(crate) u32, pub(crate) u32);

impl SpriteId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for an attached stage (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StageId(pub(crate) u32, pub(crate) u32);

impl StageId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Sprite flags gating rendering and hit testing.
    ///
    /// A cleared flag excludes the sprite's whole subtree, not just the sprite.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SpriteFlags: u8 {
        /// Sprite is visible (participates in rendering and hit testing).
        const VISIBLE        = 0b0000_0001;
        /// Sprite receives pointer events (participates in hit testing).
        const POINTER_EVENTS = 0b0000_0010;
    }
}

impl Default for SpriteFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::POINTER_EVENTS
    }
}

/// Explicit runtime type tag of a sprite, compared by equality.
///
/// Higher-level sprite kinds (text, image, shape, ...) pick their own tag and
/// find each other with [`Tree::children_by_type`](crate::Tree::children_by_type).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(pub &'static str);

impl TypeTag {
    /// Tag of a plain sprite.
    pub const SPRITE: Self = Self("Sprite");

    /// The tag's name.
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        Self::SPRITE
    }
}

/// Result of a hit test. A `None` target means no hit here or below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HitTestResult {
    /// The frontmost sprite under the point, if any.
    pub target: Option<SpriteId>,
}

impl HitTestResult {
    /// No sprite was hit.
    pub const MISS: Self = Self { target: None };

    /// `target` was hit.
    pub const fn hit(target: SpriteId) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Whether a sprite was hit.
    pub const fn is_hit(&self) -> bool {
        self.target.is_some()
    }
}

/// Paint callback, invoked with the sprite's alpha and translation already applied.
pub type PaintHook = Rc<dyn Fn(&mut dyn PaintContext)>;

/// Custom hit geometry: `(sprite, point, world_origin) -> result`.
///
/// `sprite` is the sprite that owns the hook, `point` is the query point and
/// `world_origin` is the sprite's accumulated offset, both in the coordinate
/// space the hit test started in. The hook may report any target, so a
/// composite sprite can resolve a press to one of its logical parts.
pub type HitTestHook = Rc<dyn Fn(SpriteId, Point, Point) -> HitTestResult>;

/// Hit geometry for a rectangle given in the sprite's local coordinates.
///
/// A hit targets the sprite that owns the hook.
///
/// ```
/// use kurbo::{Point, Rect};
/// use proscenium_sprite::{SpriteOptions, Tree, hit_rect};
///
/// let mut tree = Tree::new();
/// let id = tree.insert(SpriteOptions::default());
/// let hook = hit_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
/// assert_eq!(hook(id, Point::new(25.0, 25.0), Point::new(20.0, 20.0)).target, Some(id));
/// assert!(!hook(id, Point::new(5.0, 5.0), Point::new(20.0, 20.0)).is_hit());
/// ```
pub fn hit_rect(local: Rect) -> HitTestHook {
    Rc::new(move |id: SpriteId, point: Point, origin: Point| {
        if (local + origin.to_vec2()).contains(point) {
            HitTestResult::hit(id)
        } else {
            HitTestResult::MISS
        }
    })
}
