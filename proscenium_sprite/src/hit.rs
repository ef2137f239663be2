// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frontmost-first hit testing and hit area bounds.

use kurbo::{Point, Rect};
use proscenium_transform::TransformResolver;

use crate::tree::Tree;
use crate::types::{HitTestResult, SpriteFlags, SpriteId, StageId};

impl<R: TransformResolver + 'static> Tree<R> {
    /// Find the frontmost sprite under `point` in the subtree at `id`.
    ///
    /// `origin` is the accumulated offset of `id`'s parent. Children are tested
    /// from the highest index down and the first hit wins; only when no child is
    /// hit is the sprite's own hit hook consulted, and whatever target it reports
    /// is returned. A sprite without a stage,
    /// hidden, or with pointer events disabled is skipped along with its whole
    /// subtree.
    ///
    /// The flat transform matrix is not applied; hit geometry is purely offset based.
    pub fn hit_test(&self, id: SpriteId, point: Point, origin: Point) -> HitTestResult {
        let Some(sprite) = self.sprite(id) else {
            return HitTestResult::MISS;
        };
        if sprite.stage.is_none()
            || !sprite
                .flags
                .contains(SpriteFlags::VISIBLE | SpriteFlags::POINTER_EVENTS)
        {
            return HitTestResult::MISS;
        }
        let world = origin + sprite.offset();
        for &child in sprite.children.iter().rev() {
            let hit = self.hit_test(child, point, world);
            if hit.is_hit() {
                return hit;
            }
        }
        match &sprite.extra_hit_test {
            Some(hook) => hook(id, point, world),
            None => HitTestResult::MISS,
        }
    }

    /// Hit test a stage from its root at the stage origin.
    pub fn hit_test_stage(&self, stage: StageId, point: Point) -> HitTestResult {
        match self.stage_root(stage) {
            Some(root) => self.hit_test(root, point, Point::ZERO),
            None => HitTestResult::MISS,
        }
    }

    /// Smallest axis-aligned rectangle enclosing the world origin of `id` and of
    /// every descendant.
    ///
    /// `origin` is the accumulated offset of `id`'s parent; the rectangle is in the
    /// same space. Returns `None` for stale ids. Flags and stage are ignored.
    ///
    /// ```
    /// use kurbo::{Point, Rect};
    /// use proscenium_sprite::{SpriteOptions, Tree};
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.insert(SpriteOptions::default().at(5.0, 5.0));
    /// let left = tree.insert(SpriteOptions::default().at(-10.0, 20.0));
    /// let right = tree.insert(SpriteOptions::default().at(30.0, -2.0));
    /// tree.append_children(root, [left, right]);
    ///
    /// assert_eq!(
    ///     tree.hit_test_area(root, Point::ZERO),
    ///     Some(Rect::new(-5.0, 3.0, 35.0, 25.0))
    /// );
    /// ```
    pub fn hit_test_area(&self, id: SpriteId, origin: Point) -> Option<Rect> {
        let sprite = self.sprite(id)?;
        let world = origin + sprite.offset();
        let mut area = Rect::from_points(world, world);
        for &child in &sprite.children {
            if let Some(child_area) = self.hit_test_area(child, world) {
                area = area.union(child_area);
            }
        }
        Some(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SpriteOptions;
    use crate::types::hit_rect;
    use alloc::rc::Rc;

    fn square(tree: &mut Tree, name: &str, x: f64, y: f64, side: f64) -> SpriteId {
        tree.insert(
            SpriteOptions::named(name)
                .at(x, y)
                .with_extra_hit_test(hit_rect(Rect::new(0.0, 0.0, side, side))),
        )
    }

    fn staged() -> (Tree, SpriteId, StageId) {
        let mut tree = Tree::new();
        let root = tree.insert(SpriteOptions::named("root"));
        let stage = tree.attach_stage(root).unwrap();
        (tree, root, stage)
    }

    #[test]
    fn higher_index_wins() {
        let (mut tree, root, stage) = staged();
        let a = square(&mut tree, "a", 0.0, 0.0, 10.0);
        let b = square(&mut tree, "b", 5.0, 5.0, 10.0);
        tree.append_children(root, [a, b]);

        assert_eq!(tree.hit_test_stage(stage, Point::new(7.0, 7.0)).target, Some(b));
        assert_eq!(tree.hit_test_stage(stage, Point::new(2.0, 2.0)).target, Some(a));

        tree.set_child_index(root, a, 1).unwrap();
        assert_eq!(tree.hit_test_stage(stage, Point::new(7.0, 7.0)).target, Some(a));
    }

    #[test]
    fn disabled_pointer_events_gate_the_subtree() {
        let (mut tree, root, stage) = staged();
        let group = tree.insert(SpriteOptions::named("group"));
        let leaf = square(&mut tree, "leaf", 0.0, 0.0, 10.0);
        tree.append_child(root, group).unwrap();
        tree.append_child(group, leaf).unwrap();
        let p = Point::new(5.0, 5.0);
        assert_eq!(tree.hit_test_stage(stage, p).target, Some(leaf));

        tree.set_pointer_events(group, false);
        assert_eq!(tree.hit_test_stage(stage, p), HitTestResult::MISS);

        tree.set_pointer_events(group, true);
        tree.set_visible(group, false);
        assert_eq!(tree.hit_test_stage(stage, p), HitTestResult::MISS);
    }

    #[test]
    fn children_shadow_own_geometry() {
        let (mut tree, root, stage) = staged();
        let parent = square(&mut tree, "parent", 0.0, 0.0, 100.0);
        let child = square(&mut tree, "child", 10.0, 10.0, 10.0);
        tree.append_child(root, parent).unwrap();
        tree.append_child(parent, child).unwrap();

        assert_eq!(tree.hit_test_stage(stage, Point::new(15.0, 15.0)).target, Some(child));
        assert_eq!(tree.hit_test_stage(stage, Point::new(50.0, 50.0)).target, Some(parent));
        assert!(!tree.hit_test_stage(stage, Point::new(150.0, 50.0)).is_hit());
    }

    #[test]
    fn hook_may_report_another_target() {
        let (mut tree, root, stage) = staged();
        let button = tree.insert(SpriteOptions::named("button").at(10.0, 0.0));
        let icon = tree.insert(SpriteOptions::named("icon"));
        tree.append_child(root, button).unwrap();
        // The icon has no geometry of its own; the button forwards presses on
        // its left half to it.
        let left = Rect::new(0.0, 0.0, 20.0, 20.0);
        let right = Rect::new(20.0, 0.0, 40.0, 20.0);
        tree.set_extra_hit_test(
            button,
            Some(Rc::new(move |id: SpriteId, point: Point, origin: Point| {
                let local = point - origin.to_vec2();
                if left.contains(local) {
                    HitTestResult::hit(icon)
                } else if right.contains(local) {
                    HitTestResult::hit(id)
                } else {
                    HitTestResult::MISS
                }
            })),
        );

        assert_eq!(tree.hit_test_stage(stage, Point::new(15.0, 5.0)).target, Some(icon));
        assert_eq!(tree.hit_test_stage(stage, Point::new(35.0, 5.0)).target, Some(button));
        assert!(!tree.hit_test_stage(stage, Point::new(5.0, 5.0)).is_hit());
    }

    #[test]
    fn offsets_accumulate() {
        let (mut tree, root, stage) = staged();
        let outer = tree.insert(SpriteOptions::named("outer").at(100.0, 0.0));
        let inner = square(&mut tree, "inner", 0.0, 50.0, 10.0);
        tree.append_child(root, outer).unwrap();
        tree.append_child(outer, inner).unwrap();

        assert!(!tree.hit_test_stage(stage, Point::new(5.0, 55.0)).is_hit());
        assert_eq!(tree.hit_test_stage(stage, Point::new(105.0, 55.0)).target, Some(inner));
    }

    #[test]
    fn unstaged_sprites_are_not_hit() {
        let mut tree = Tree::new();
        let loose = square(&mut tree, "loose", 0.0, 0.0, 10.0);
        assert!(!tree.hit_test(loose, Point::new(5.0, 5.0), Point::ZERO).is_hit());
    }

    #[test]
    fn area_of_a_leaf_is_its_origin() {
        let mut tree = Tree::new();
        let leaf = tree.insert(SpriteOptions::default().at(3.0, 4.0));
        assert_eq!(
            tree.hit_test_area(leaf, Point::new(1.0, 1.0)),
            Some(Rect::new(4.0, 5.0, 4.0, 5.0))
        );
    }

    #[test]
    fn area_encloses_deep_descendants_in_any_order() {
        let mut tree = Tree::new();
        let root = tree.insert(SpriteOptions::default());
        let far = tree.insert(SpriteOptions::default().at(50.0, 50.0));
        let near = tree.insert(SpriteOptions::default().at(-5.0, 2.0));
        let deep = tree.insert(SpriteOptions::default().at(-100.0, 0.0));
        tree.append_children(root, [far, near]);
        tree.append_child(far, deep).unwrap();

        let expected = Rect::new(-50.0, 0.0, 50.0, 50.0);
        assert_eq!(tree.hit_test_area(root, Point::ZERO), Some(expected));

        // Reordering siblings must not change the result.
        tree.set_child_index(root, far, 1).unwrap();
        assert_eq!(tree.hit_test_area(root, Point::ZERO), Some(expected));

        tree.destroy(root).unwrap();
        assert_eq!(tree.hit_test_area(root, Point::ZERO), None);
    }
}
