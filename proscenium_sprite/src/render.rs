// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Back-to-front render traversal.

use kurbo::Point;
use proscenium_transform::TransformResolver;

use crate::paint::{PaintContext, PaintScope};
use crate::tree::Tree;
use crate::types::{SpriteFlags, SpriteId, StageId};

impl<R: TransformResolver + 'static> Tree<R> {
    /// Paint the subtree at `id` into `ctx`.
    ///
    /// `origin` and `inherited_alpha` are the accumulated offset and opacity of
    /// `id`'s parent. For each sprite the world offset and opacity accumulate;
    /// a sprite that has no stage, is hidden, or ends up with an opacity of zero
    /// is skipped together with its subtree. Otherwise its paint state is saved,
    /// the global alpha and translation are applied, `paint` and then
    /// `extra_render` run, the state is restored, and the children follow in
    /// ascending index order.
    ///
    /// The traversal borrows the tree immutably, so hooks cannot edit it.
    pub fn prepare_render(
        &self,
        id: SpriteId,
        ctx: &mut dyn PaintContext,
        origin: Point,
        inherited_alpha: f64,
    ) {
        let Some(sprite) = self.sprite(id) else {
            return;
        };
        if sprite.stage.is_none() || !sprite.flags.contains(SpriteFlags::VISIBLE) {
            return;
        }
        let world = origin + sprite.offset();
        let alpha = inherited_alpha * sprite.alpha;
        if alpha.is_nan() || alpha <= 0.0 {
            return;
        }
        {
            let mut scope = PaintScope::new(ctx);
            scope.set_global_alpha(alpha);
            scope.translate(world.x, world.y);
            if let Some(paint) = &sprite.paint {
                paint(&mut *scope);
            }
            if let Some(extra) = &sprite.extra_render {
                extra(&mut *scope);
            }
        }
        for &child in &sprite.children {
            self.prepare_render(child, ctx, world, alpha);
        }
    }

    /// Paint a whole stage from its root and clear its repaint flag.
    ///
    /// Returns `false` if the stage is not live.
    pub fn render_stage(&mut self, stage: StageId, ctx: &mut dyn PaintContext) -> bool {
        let Some(root) = self.stage_root(stage) else {
            return false;
        };
        self.take_repaint(stage);
        self.prepare_render(root, ctx, Point::ZERO, 1.0);
        true
    }
}
