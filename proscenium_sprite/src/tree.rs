// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: storage, stages, structural edits, and properties.

use alloc::{string::String, vec, vec::Vec};
use hashbrown::HashMap;
use kurbo::{Affine, Point, Vec2};
use proscenium_transform::{CssTransformResolver, TransformResolver, affine_from_components};

use crate::drag::DragBinding;
use crate::error::{SceneError, reject};
use crate::events::{Event, EventTarget, Listeners};
use crate::options::SpriteOptions;
use crate::types::{HitTestHook, PaintHook, SpriteFlags, SpriteId, StageId, TypeTag};

/// A retained-mode tree of sprites.
///
/// The tree owns every sprite; sprites refer to each other by [`SpriteId`].
/// A sprite is created detached and joins a hierarchy through
/// [`append_child`](Tree::append_child) or [`append_child_at`](Tree::append_child_at).
/// Any number of detached hierarchies may coexist. A parentless sprite becomes the
/// root of a stage with [`attach_stage`](Tree::attach_stage); only sprites reachable
/// from a stage root render and take part in hit testing.
///
/// The type parameter `R` is the resolver used for transform text. It defaults
/// to [`CssTransformResolver`], so most callers can simply use [`Tree`].
///
/// ## Example
///
/// ```rust
/// use proscenium_sprite::{SpriteOptions, Tree};
///
/// let mut tree = Tree::new();
/// let root = tree.insert(SpriteOptions::named("root"));
/// let a = tree.insert(SpriteOptions::named("a").at(10.0, 0.0));
/// let b = tree.insert(SpriteOptions::named("b"));
/// tree.append_child(root, a).unwrap();
/// tree.append_child(a, b).unwrap();
///
/// let stage = tree.attach_stage(root).unwrap();
/// assert_eq!(tree.stage_of(b), Some(stage));
///
/// // Detaching propagates through the whole removed subtree.
/// tree.remove_child(root, a).unwrap();
/// assert_eq!(tree.stage_of(a), None);
/// assert_eq!(tree.stage_of(b), None);
/// assert_eq!(tree.parent_of(b), Some(a));
/// ```
pub struct Tree<R: TransformResolver = CssTransformResolver> {
    /// slots
    nodes: Vec<Option<Sprite>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    stages: Vec<Option<StageSlot>>,
    stage_generations: Vec<u32>,
    stage_free_list: Vec<usize>,
    pub(crate) listeners: Listeners<R>,
    pub(crate) drags: HashMap<SpriteId, DragBinding>,
    resolver: R,
}

impl<R: TransformResolver + core::fmt::Debug> core::fmt::Debug for Tree<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let stages = self.stages.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Tree")
            .field("sprites_total", &total)
            .field("sprites_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("stages", &stages)
            .field("listeners", &self.listeners)
            .field("drags", &self.drags.len())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl<R> Default for Tree<R>
where
    R: TransformResolver + Default + 'static,
{
    fn default() -> Self {
        Self::with_resolver(R::default())
    }
}

#[derive(Clone)]
pub(crate) struct Sprite {
    generation: u32,
    pub(crate) name: String,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) alpha: f64,
    pub(crate) flags: SpriteFlags,
    pub(crate) transform: Affine,
    pub(crate) type_tag: TypeTag,
    pub(crate) paint: Option<PaintHook>,
    pub(crate) extra_render: Option<PaintHook>,
    pub(crate) extra_hit_test: Option<HitTestHook>,
    pub(crate) parent: Option<SpriteId>,
    pub(crate) stage: Option<StageId>,
    pub(crate) children: Vec<SpriteId>,
}

impl Sprite {
    fn new(generation: u32, options: SpriteOptions) -> Self {
        let mut flags = SpriteFlags::empty();
        flags.set(SpriteFlags::VISIBLE, options.visible);
        flags.set(SpriteFlags::POINTER_EVENTS, options.pointer_events);
        Self {
            generation,
            name: options.name,
            x: options.x,
            y: options.y,
            alpha: clamp_alpha(options.alpha),
            flags,
            transform: Affine::IDENTITY,
            type_tag: options.type_tag,
            paint: options.paint,
            extra_render: options.extra_render,
            extra_hit_test: options.extra_hit_test,
            parent: None,
            stage: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug)]
struct StageSlot {
    generation: u32,
    root: SpriteId,
    repaint: bool,
}

/// Clamp an opacity into `[0, 1]`. NaN becomes fully transparent.
pub(crate) fn clamp_alpha(alpha: f64) -> f64 {
    if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}

/// Take a slot from the free list or grow the slab; returns `(index, generation)`.
fn alloc_slot<T>(
    slots: &mut Vec<Option<T>>,
    generations: &mut Vec<u32>,
    free_list: &mut Vec<usize>,
    make: impl FnOnce(u32) -> T,
) -> (u32, u32) {
    let (idx, generation) = if let Some(idx) = free_list.pop() {
        let generation = generations[idx].saturating_add(1);
        generations[idx] = generation;
        (idx, generation)
    } else {
        slots.push(None);
        generations.push(1);
        (slots.len() - 1, 1)
    };
    slots[idx] = Some(make(generation));
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Ids use 32-bit indices by design."
    )]
    (idx as u32, generation)
}

impl Tree {
    /// Create a new empty tree using the CSS transform resolver.
    pub fn new() -> Self {
        Self::with_resolver(CssTransformResolver)
    }
}

impl<R: TransformResolver + 'static> Tree<R> {
    /// Create a new empty tree with a specific transform resolver.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            stages: Vec::new(),
            stage_generations: Vec::new(),
            stage_free_list: Vec::new(),
            listeners: Listeners::new(),
            drags: HashMap::new(),
            resolver,
        }
    }

    /// The transform resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Create a detached sprite from `options`.
    ///
    /// A transform that does not resolve leaves the identity in place.
    pub fn insert(&mut self, mut options: SpriteOptions) -> SpriteId {
        let transform = options.transform.take();
        let (idx, generation) = alloc_slot(
            &mut self.nodes,
            &mut self.generations,
            &mut self.free_list,
            |generation| Sprite::new(generation, options),
        );
        let id = SpriteId::new(idx, generation);
        if let Some(text) = transform {
            // An unresolved transform at construction keeps the identity.
            let _ = self.set_transform(id, &text);
        }
        id
    }

    /// Destroy a sprite and its whole subtree, freeing their slots.
    ///
    /// The sprite is detached from its parent first; a stage rooted at it is
    /// detached as well. Listeners and drag bindings of destroyed sprites are
    /// dropped. Their ids become stale immediately.
    pub fn destroy(&mut self, id: SpriteId) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return reject(SceneError::StaleSprite(id));
        }
        if let Some(stage) = self.root_stage(id) {
            self.detach_stage(stage)?;
        }
        if let Some(parent) = self.node(id).parent {
            self.remove_child(parent, id)?;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(sprite) = self.nodes[current.idx()].take() else {
                continue;
            };
            stack.extend(sprite.children);
            self.free_list.push(current.idx());
            self.listeners.remove_target(EventTarget::Sprite(current));
            self.drags.remove(&current);
        }
        Ok(())
    }

    /// Returns true if `id` refers to a live sprite.
    ///
    /// A `SpriteId` is live if its slot is occupied and the generation matches.
    pub fn is_alive(&self, id: SpriteId) -> bool {
        self.sprite(id).is_some()
    }

    /// Number of live sprites.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the tree holds no live sprites.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Option::is_none)
    }

    // --- stages ---

    /// Make the parentless sprite `root` the root of a new stage.
    ///
    /// The stage is set on every sprite of the subtree, each of which receives an
    /// [`Event::Attached`]. The new stage starts dirty.
    pub fn attach_stage(&mut self, root: SpriteId) -> Result<StageId, SceneError> {
        let Some(sprite) = self.sprite(root) else {
            return reject(SceneError::StaleSprite(root));
        };
        if sprite.parent.is_some() {
            return reject(SceneError::NotARoot(root));
        }
        if sprite.stage.is_some() {
            return reject(SceneError::AlreadyStaged(root));
        }
        let (idx, generation) = alloc_slot(
            &mut self.stages,
            &mut self.stage_generations,
            &mut self.stage_free_list,
            |generation| StageSlot {
                generation,
                root,
                repaint: true,
            },
        );
        let stage = StageId::new(idx, generation);
        log::trace!("attached {stage:?} at {root:?}");
        self.set_subtree_stage(root, Some(stage));
        Ok(stage)
    }

    /// Dissolve a stage, clearing the stage on every sprite of its subtree.
    ///
    /// Returns the former root. Listeners registered on the stage are dropped.
    pub fn detach_stage(&mut self, stage: StageId) -> Result<SpriteId, SceneError> {
        let Some(slot) = self.stage_slot(stage) else {
            return reject(SceneError::StaleStage(stage));
        };
        let root = slot.root;
        self.set_subtree_stage(root, None);
        self.stages[stage.idx()] = None;
        self.stage_free_list.push(stage.idx());
        self.cancel_drags_on(stage);
        self.listeners.remove_target(EventTarget::Stage(stage));
        log::trace!("detached {stage:?} from {root:?}");
        Ok(root)
    }

    /// Returns true if `stage` refers to a live stage.
    pub fn is_stage_alive(&self, stage: StageId) -> bool {
        self.stage_slot(stage).is_some()
    }

    /// Root sprite of a live stage.
    pub fn stage_root(&self, stage: StageId) -> Option<SpriteId> {
        self.stage_slot(stage).map(|s| s.root)
    }

    /// Whether a live stage has been marked as needing a repaint.
    pub fn needs_repaint(&self, stage: StageId) -> bool {
        self.stage_slot(stage).is_some_and(|s| s.repaint)
    }

    /// Mark a stage as needing a repaint.
    pub fn mark_dirty(&mut self, stage: StageId) {
        if let Some(slot) = self.stage_slot_mut(stage) {
            slot.repaint = true;
        }
    }

    /// Return and clear the repaint flag of a stage.
    pub fn take_repaint(&mut self, stage: StageId) -> bool {
        self.stage_slot_mut(stage)
            .map(|s| core::mem::replace(&mut s.repaint, false))
            .unwrap_or(false)
    }

    /// The stage rooted at `id`, if `id` is a stage root.
    pub fn root_stage(&self, id: SpriteId) -> Option<StageId> {
        let stage = self.sprite(id)?.stage?;
        (self.stage_root(stage) == Some(id)).then_some(stage)
    }

    // --- structure ---

    /// Append `child` as the last (frontmost) child of `parent`.
    ///
    /// See [`append_child_at`](Self::append_child_at).
    pub fn append_child(&mut self, parent: SpriteId, child: SpriteId) -> Result<usize, SceneError> {
        self.append_child_at(parent, child, usize::MAX)
    }

    /// Append several children in order. Rejected ones are skipped.
    ///
    /// Returns how many were appended.
    pub fn append_children(
        &mut self,
        parent: SpriteId,
        children: impl IntoIterator<Item = SpriteId>,
    ) -> usize {
        children
            .into_iter()
            .filter(|&child| self.append_child(parent, child).is_ok())
            .count()
    }

    /// Insert `child` into `parent`'s child list at `index`.
    ///
    /// - A child that already has a parent is removed from it first, so it is never
    ///   in two child lists. This includes moving within the same parent.
    /// - `index` is clamped to `[0, count]`, where `count` is measured after that
    ///   removal.
    /// - The child's subtree takes the parent's stage; sprites newly joining a stage
    ///   receive [`Event::Attached`].
    /// - The old and the new stage are marked dirty.
    ///
    /// Stage roots cannot become children, and a sprite cannot be appended under
    /// itself or one of its descendants. Returns the index the child landed at.
    pub fn append_child_at(
        &mut self,
        parent: SpriteId,
        child: SpriteId,
        index: usize,
    ) -> Result<usize, SceneError> {
        if !self.is_alive(parent) {
            return reject(SceneError::StaleSprite(parent));
        }
        if !self.is_alive(child) {
            return reject(SceneError::StaleSprite(child));
        }
        if self.root_stage(child).is_some() {
            return reject(SceneError::StageRootAsChild(child));
        }
        if child == parent || self.included_by(parent, child) {
            return reject(SceneError::Cycle { parent, child });
        }

        let old_stage = self.node(child).stage;
        if let Some(old_parent) = self.node(child).parent {
            self.unlink_parent(child, old_parent);
        }
        let siblings = &mut self.node_mut(parent).children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child).parent = Some(parent);

        let new_stage = self.node(parent).stage;
        if new_stage != old_stage {
            self.set_subtree_stage(child, new_stage);
        }
        self.mark_stage_dirty(old_stage);
        self.mark_stage_dirty(new_stage);
        Ok(index)
    }

    /// Detach `child` from `parent`.
    ///
    /// The child keeps its own subtree; the stage is cleared on all of it.
    pub fn remove_child(&mut self, parent: SpriteId, child: SpriteId) -> Result<(), SceneError> {
        if !self.is_alive(parent) {
            return reject(SceneError::StaleSprite(parent));
        }
        if self.parent_of(child) != Some(parent) {
            return reject(SceneError::NotAChild { parent, child });
        }
        let old_stage = self.node(child).stage;
        self.unlink_parent(child, parent);
        self.set_subtree_stage(child, None);
        self.mark_stage_dirty(old_stage);
        Ok(())
    }

    /// Detach the child at `index` and return it.
    pub fn remove_child_at(&mut self, parent: SpriteId, index: usize) -> Result<SpriteId, SceneError> {
        let Some(sprite) = self.sprite(parent) else {
            return reject(SceneError::StaleSprite(parent));
        };
        let Some(&child) = sprite.children.get(index) else {
            let len = sprite.children.len();
            return reject(SceneError::IndexOutOfRange { index, len });
        };
        self.remove_child(parent, child)?;
        Ok(child)
    }

    /// Detach every child of `parent` and return them in their former order.
    pub fn remove_children(&mut self, parent: SpriteId) -> Result<Vec<SpriteId>, SceneError> {
        let Some(sprite) = self.sprite_mut(parent) else {
            return reject(SceneError::StaleSprite(parent));
        };
        let children = core::mem::take(&mut sprite.children);
        let stage = sprite.stage;
        for &child in &children {
            self.node_mut(child).parent = None;
            self.set_subtree_stage(child, None);
        }
        if !children.is_empty() {
            self.mark_stage_dirty(stage);
        }
        Ok(children)
    }

    /// Take `id` out of the hierarchy.
    ///
    /// Detaches it from its parent (or dissolves the stage it roots), clears its
    /// stage, and detaches all of its own children. Everything stays alive; use
    /// [`destroy`](Self::destroy) to free the slots.
    pub fn remove(&mut self, id: SpriteId) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return reject(SceneError::StaleSprite(id));
        }
        if let Some(stage) = self.root_stage(id) {
            self.detach_stage(stage)?;
        } else if let Some(parent) = self.node(id).parent {
            self.remove_child(parent, id)?;
        }
        self.remove_children(id)?;
        Ok(())
    }

    /// Move `child` to `index` within `parent`'s child list.
    ///
    /// `index` is clamped to `[0, count - 1]`. Returns the final index; moving to
    /// the current index changes nothing.
    pub fn set_child_index(
        &mut self,
        parent: SpriteId,
        child: SpriteId,
        index: usize,
    ) -> Result<usize, SceneError> {
        let Some(current) = self.child_index(parent, child) else {
            return reject(SceneError::NotAChild { parent, child });
        };
        let sprite = self.node_mut(parent);
        let target = index.min(sprite.children.len() - 1);
        if target == current {
            return Ok(current);
        }
        sprite.children.remove(current);
        sprite.children.insert(target, child);
        let stage = sprite.stage;
        self.mark_stage_dirty(stage);
        Ok(target)
    }

    /// Index of `child` in `parent`'s child list, or `None` if it is not a direct child.
    pub fn child_index(&self, parent: SpriteId, child: SpriteId) -> Option<usize> {
        self.sprite(parent)?
            .children
            .iter()
            .position(|&c| c == child)
    }

    /// The child at `index`, if any.
    pub fn child_at(&self, parent: SpriteId, index: usize) -> Option<SpriteId> {
        self.sprite(parent)?.children.get(index).copied()
    }

    /// Get the children of a sprite in paint order, or an empty slice if the id is stale.
    pub fn children_of(&self, id: SpriteId) -> &[SpriteId] {
        self.sprite(id).map_or(&[], |s| &s.children)
    }

    /// Returns the parent of a sprite, or `None` for detached sprites and stale ids.
    pub fn parent_of(&self, id: SpriteId) -> Option<SpriteId> {
        self.sprite(id)?.parent
    }

    /// Returns the stage a sprite is attached to.
    pub fn stage_of(&self, id: SpriteId) -> Option<StageId> {
        self.sprite(id)?.stage
    }

    // --- properties ---

    /// Name of a live sprite.
    pub fn name(&self, id: SpriteId) -> Option<&str> {
        self.sprite(id).map(|s| s.name.as_str())
    }

    /// Rename a sprite.
    pub fn set_name(&mut self, id: SpriteId, name: impl Into<String>) {
        if let Some(s) = self.sprite_mut(id) {
            s.name = name.into();
        }
    }

    /// Local offset of a live sprite.
    pub fn position(&self, id: SpriteId) -> Option<Point> {
        self.sprite(id).map(|s| Point::new(s.x, s.y))
    }

    /// Move a sprite relative to its parent.
    pub fn set_position(&mut self, id: SpriteId, position: Point) {
        if let Some(s) = self.sprite_mut(id)
            && (s.x != position.x || s.y != position.y)
        {
            s.x = position.x;
            s.y = position.y;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Opacity of a live sprite, always within `[0, 1]`.
    pub fn alpha(&self, id: SpriteId) -> Option<f64> {
        self.sprite(id).map(|s| s.alpha)
    }

    /// Set the opacity, clamped into `[0, 1]`.
    pub fn set_alpha(&mut self, id: SpriteId, alpha: f64) {
        let alpha = clamp_alpha(alpha);
        if let Some(s) = self.sprite_mut(id)
            && s.alpha != alpha
        {
            s.alpha = alpha;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Flags of a live sprite.
    pub fn flags(&self, id: SpriteId) -> Option<SpriteFlags> {
        self.sprite(id).map(|s| s.flags)
    }

    /// Replace a sprite's flags.
    pub fn set_flags(&mut self, id: SpriteId, flags: SpriteFlags) {
        if let Some(s) = self.sprite_mut(id)
            && s.flags != flags
        {
            s.flags = flags;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Whether a sprite renders. `false` for stale ids.
    pub fn is_visible(&self, id: SpriteId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(SpriteFlags::VISIBLE))
    }

    /// Show or hide a sprite and its subtree.
    pub fn set_visible(&mut self, id: SpriteId, visible: bool) {
        if let Some(mut flags) = self.flags(id) {
            flags.set(SpriteFlags::VISIBLE, visible);
            self.set_flags(id, flags);
        }
    }

    /// Whether a sprite takes part in hit testing. `false` for stale ids.
    pub fn pointer_events(&self, id: SpriteId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(SpriteFlags::POINTER_EVENTS))
    }

    /// Include or exclude a sprite and its subtree from hit testing.
    pub fn set_pointer_events(&mut self, id: SpriteId, enabled: bool) {
        if let Some(mut flags) = self.flags(id) {
            flags.set(SpriteFlags::POINTER_EVENTS, enabled);
            self.set_flags(id, flags);
        }
    }

    /// Stored affine matrix of a live sprite.
    pub fn transform(&self, id: SpriteId) -> Option<Affine> {
        self.sprite(id).map(|s| s.transform)
    }

    /// Resolve `text` and store the resulting matrix.
    ///
    /// If the resolver finds no valid transform the stored matrix is left as it
    /// was and [`SceneError::TransformIgnored`] is returned. Missing trailing
    /// components are taken from the identity.
    pub fn set_transform(&mut self, id: SpriteId, text: &str) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return reject(SceneError::StaleSprite(id));
        }
        let Some(components) = self.resolver.resolve(text) else {
            return reject(SceneError::TransformIgnored);
        };
        self.set_transform_matrix(id, affine_from_components(&components));
        Ok(())
    }

    /// Store a full matrix.
    pub fn set_transform_matrix(&mut self, id: SpriteId, transform: Affine) {
        if let Some(s) = self.sprite_mut(id)
            && s.transform != transform
        {
            s.transform = transform;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Runtime type tag of a live sprite.
    pub fn type_tag(&self, id: SpriteId) -> Option<TypeTag> {
        self.sprite(id).map(|s| s.type_tag)
    }

    /// Replace the own paint hook.
    pub fn set_paint(&mut self, id: SpriteId, hook: Option<PaintHook>) {
        if let Some(s) = self.sprite_mut(id) {
            s.paint = hook;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Replace the extra render hook.
    pub fn set_extra_render(&mut self, id: SpriteId, hook: Option<PaintHook>) {
        if let Some(s) = self.sprite_mut(id) {
            s.extra_render = hook;
            let stage = s.stage;
            self.mark_stage_dirty(stage);
        }
    }

    /// Replace the custom hit geometry.
    pub fn set_extra_hit_test(&mut self, id: SpriteId, hook: Option<HitTestHook>) {
        if let Some(s) = self.sprite_mut(id) {
            s.extra_hit_test = hook;
        }
    }
}

impl<R: TransformResolver + 'static> Tree<R> {
    // --- internals ---

    pub(crate) fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.nodes
            .get(id.idx())?
            .as_ref()
            .filter(|n| n.generation == id.1)
    }

    pub(crate) fn sprite_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.nodes
            .get_mut(id.idx())?
            .as_mut()
            .filter(|n| n.generation == id.1)
    }

    /// Access a sprite known to be live; panics if `id` is stale.
    pub(crate) fn node(&self, id: SpriteId) -> &Sprite {
        self.nodes[id.idx()].as_ref().expect("dangling SpriteId")
    }

    /// Mutable access to a sprite known to be live; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: SpriteId) -> &mut Sprite {
        self.nodes[id.idx()].as_mut().expect("dangling SpriteId")
    }

    fn stage_slot(&self, stage: StageId) -> Option<&StageSlot> {
        self.stages
            .get(stage.idx())?
            .as_ref()
            .filter(|s| s.generation == stage.1)
    }

    fn stage_slot_mut(&mut self, stage: StageId) -> Option<&mut StageSlot> {
        self.stages
            .get_mut(stage.idx())?
            .as_mut()
            .filter(|s| s.generation == stage.1)
    }

    pub(crate) fn mark_stage_dirty(&mut self, stage: Option<StageId>) {
        if let Some(stage) = stage {
            self.mark_dirty(stage);
        }
    }

    fn unlink_parent(&mut self, id: SpriteId, parent: SpriteId) {
        let p = self.node_mut(parent);
        p.children.retain(|&c| c != id);
        self.node_mut(id).parent = None;
    }

    /// Set `stage` on every sprite of the subtree at `id`, then notify sprites that
    /// joined a stage.
    fn set_subtree_stage(&mut self, id: SpriteId, stage: Option<StageId>) {
        let mut joined = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let sprite = self.node_mut(current);
            if sprite.stage != stage {
                sprite.stage = stage;
                if stage.is_some() {
                    joined.push(current);
                }
            }
            // Reverse keeps the notification order depth-first, back to front.
            stack.extend(sprite.children.iter().rev().copied());
        }
        log::trace!("set {stage:?} on subtree of {id:?}");
        if let Some(stage) = stage {
            let event = Event::Attached(stage);
            for sprite in joined {
                self.dispatch_event(EventTarget::Sprite(sprite), &event);
            }
        }
    }
}
