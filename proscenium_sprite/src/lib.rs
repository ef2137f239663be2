// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Proscenium Sprite: a retained-mode 2D sprite tree.
//!
//! This crate is the display-list layer beneath a canvas-like paint surface. It
//! holds a forest of positioned, nestable sprites and provides:
//!
//! - Structural editing with atomic reparenting: a sprite is never in two child
//!   lists, and stage membership propagates through whole subtrees.
//! - A back-to-front render traversal that accumulates offset and opacity and
//!   scopes every sprite's paint state.
//! - Frontmost-first hit testing and hit-area bounds.
//! - Name and type queries, and allow-listed attribute access by name.
//! - A pointer-driven drag gesture with optional per-axis clamping.
//!
//! ## Stages
//!
//! A stage is the attachment root of a hierarchy. Sprites only render and hit
//! test while attached to a stage; each stage carries a repaint flag that every
//! edit to an attached sprite sets. When to render is up to the frame driver:
//! check [`Tree::needs_repaint`] and call [`Tree::render_stage`] with your
//! [`PaintContext`].
//!
//! ## Geometry
//!
//! Positions are plain offsets relative to the parent and accumulate down the
//! tree. Each sprite also stores a flat affine matrix, set from transform text
//! through a [`TransformResolver`], which this crate does not composite into
//! world space. Hit geometry comes from per-sprite [`HitTestHook`]s, for example
//! [`hit_rect`].
//!
//! ## Events
//!
//! Listeners are registered per sprite or per stage and dispatched synchronously;
//! [`Tree::dispatch_pointer`] routes pointer input to the frontmost sprite under
//! the pointer, bubbles it through that sprite's ancestors, and then delivers it
//! to the stage.
//!
//! ## Errors and logging
//!
//! No edit is fatal. A rejected edit leaves the tree untouched, returns a
//! [`SceneError`], and is logged at `debug` level through the `log` facade.
//! Stage propagation and drag transitions log at `trace` level.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use proscenium_sprite::{SpriteOptions, Tree, hit_rect};
//!
//! let mut tree = Tree::new();
//! let root = tree.insert(SpriteOptions::named("root"));
//! let back = tree.insert(
//!     SpriteOptions::named("back").with_extra_hit_test(hit_rect(Rect::new(0.0, 0.0, 50.0, 50.0))),
//! );
//! let front = tree.insert(
//!     SpriteOptions::named("front")
//!         .at(25.0, 25.0)
//!         .with_extra_hit_test(hit_rect(Rect::new(0.0, 0.0, 50.0, 50.0))),
//! );
//! tree.append_children(root, [back, front]);
//! let stage = tree.attach_stage(root).unwrap();
//!
//! // Overlap goes to the later sibling.
//! assert_eq!(tree.hit_test_stage(stage, Point::new(30.0, 30.0)).target, Some(front));
//! assert_eq!(tree.hit_test_stage(stage, Point::new(10.0, 10.0)).target, Some(back));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod attr;
mod drag;
mod error;
mod events;
mod hit;
mod options;
mod paint;
mod query;
mod render;
mod tree;
mod types;

pub use attr::{AttrKey, AttrValue};
pub use error::SceneError;
pub use events::{
    Event, EventKind, EventTarget, Handler, ListenerId, PointerEvent, UnknownEventKind,
};
pub use options::SpriteOptions;
pub use paint::PaintContext;
pub use query::NamePattern;
pub use tree::Tree;
pub use types::{
    HitTestHook, HitTestResult, PaintHook, SpriteFlags, SpriteId, StageId, TypeTag, hit_rect,
};

pub use proscenium_drag::{DragState, PRIMARY_POINTER, PointerId};
pub use proscenium_transform::{
    Components, CssTransformResolver, ParseError, TransformResolver, parse_transform,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::recording::Recorder;
    use kurbo::Point;

    /// root -> A -> B: removing A clears the stage on the whole removed subtree.
    #[test]
    fn detaching_a_branch_unstages_grandchildren() {
        let mut tree = Tree::new();
        let root = tree.insert(SpriteOptions::named("root"));
        let a = tree.insert(SpriteOptions::named("A"));
        let b = tree.insert(SpriteOptions::named("B"));
        tree.append_child(a, b).unwrap();
        tree.append_child(root, a).unwrap();
        let stage = tree.attach_stage(root).unwrap();
        assert_eq!(tree.stage_of(b), Some(stage));
        assert_eq!(tree.stage_of(b), tree.stage_of(root));

        tree.remove_child(root, a).unwrap();
        assert_eq!(tree.stage_of(a), None);
        assert_eq!(tree.stage_of(b), None);
    }

    #[test]
    fn nested_alpha_and_offset_reach_the_paint_hook() {
        let mut rec = Recorder::default();
        let mut tree = Tree::new();
        let root = tree.insert(SpriteOptions::named("root"));
        let parent = tree.insert(SpriteOptions::named("parent").at(5.0, 5.0).with_alpha(0.5));
        let node = tree.insert(
            SpriteOptions::named("node")
                .at(10.0, 10.0)
                .with_alpha(0.5)
                .with_paint(rec.hook("node")),
        );
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, node).unwrap();
        tree.attach_stage(root).unwrap();

        tree.prepare_render(root, &mut rec, Point::ZERO, 1.0);
        assert_eq!(rec.state_at("node"), Some((0.25, (15.0, 15.0))));
    }
}
