// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generic, allow-listed attribute access.
//!
//! [`AttrKey`] is the closed set of attributes that can be read and written by
//! name, and [`AttrValue`] the closed set of payloads. Writes go through the same
//! setters as the typed API, so clamping, dirty marking, and structural guards
//! apply unchanged.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use kurbo::{Affine, Point};
use proscenium_transform::TransformResolver;

use crate::error::{SceneError, reject};
use crate::tree::Tree;
use crate::types::{HitTestHook, PaintHook, SpriteFlags, SpriteId, StageId};

/// An attribute that can be accessed by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttrKey {
    /// `x`: local x offset.
    X,
    /// `y`: local y offset.
    Y,
    /// `name`.
    Name,
    /// `alpha`: opacity, clamped on write.
    Alpha,
    /// `visible`.
    Visible,
    /// `pointerEvents`.
    PointerEvents,
    /// `parent`: writing appends to or removes from a parent.
    Parent,
    /// `stage`: read-only.
    Stage,
    /// `extraRender`.
    ExtraRender,
    /// `extraHitTest`.
    ExtraHitTest,
    /// `transform`: text is resolved, a matrix is stored as is.
    Transform,
}

const ALL: [AttrKey; 11] = [
    AttrKey::X,
    AttrKey::Y,
    AttrKey::Name,
    AttrKey::Alpha,
    AttrKey::Visible,
    AttrKey::PointerEvents,
    AttrKey::Parent,
    AttrKey::Stage,
    AttrKey::ExtraRender,
    AttrKey::ExtraHitTest,
    AttrKey::Transform,
];

impl AttrKey {
    /// The attribute's name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Name => "name",
            Self::Alpha => "alpha",
            Self::Visible => "visible",
            Self::PointerEvents => "pointerEvents",
            Self::Parent => "parent",
            Self::Stage => "stage",
            Self::ExtraRender => "extraRender",
            Self::ExtraHitTest => "extraHitTest",
            Self::Transform => "transform",
        }
    }

    /// Every key, in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        ALL.into_iter()
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttrKey {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL.into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| SceneError::UnknownAttr(s.into()))
    }
}

/// An attribute payload.
#[derive(Clone)]
pub enum AttrValue {
    /// `x`, `y`, `alpha`.
    Number(f64),
    /// `visible`, `pointerEvents`.
    Bool(bool),
    /// `name`, or transform text.
    Text(String),
    /// `parent`.
    Sprite(Option<SpriteId>),
    /// `stage`.
    Stage(Option<StageId>),
    /// `transform` as a matrix.
    Transform(Affine),
    /// `extraRender`.
    Paint(Option<PaintHook>),
    /// `extraHitTest`.
    HitTest(Option<HitTestHook>),
}

impl AttrValue {
    /// The number, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The flag, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => f.debug_tuple("Number").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Sprite(v) => f.debug_tuple("Sprite").field(v).finish(),
            Self::Stage(v) => f.debug_tuple("Stage").field(v).finish(),
            Self::Transform(v) => f.debug_tuple("Transform").field(v).finish(),
            Self::Paint(v) => f.debug_tuple("Paint").field(&v.is_some()).finish(),
            Self::HitTest(v) => f.debug_tuple("HitTest").field(&v.is_some()).finish(),
        }
    }
}

/// Hooks compare by identity.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Sprite(a), Self::Sprite(b)) => a == b,
            (Self::Stage(a), Self::Stage(b)) => a == b,
            (Self::Transform(a), Self::Transform(b)) => a == b,
            (Self::Paint(a), Self::Paint(b)) => match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (Self::HitTest(a), Self::HitTest(b)) => match (a, b) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<SpriteId> for AttrValue {
    fn from(v: SpriteId) -> Self {
        Self::Sprite(Some(v))
    }
}

impl From<Affine> for AttrValue {
    fn from(v: Affine) -> Self {
        Self::Transform(v)
    }
}

impl<R: TransformResolver + 'static> Tree<R> {
    /// Read an attribute. `None` for stale ids.
    pub fn attr(&self, id: SpriteId, key: AttrKey) -> Option<AttrValue> {
        let s = self.sprite(id)?;
        Some(match key {
            AttrKey::X => AttrValue::Number(s.x),
            AttrKey::Y => AttrValue::Number(s.y),
            AttrKey::Name => AttrValue::Text(s.name.clone()),
            AttrKey::Alpha => AttrValue::Number(s.alpha),
            AttrKey::Visible => AttrValue::Bool(s.flags.contains(SpriteFlags::VISIBLE)),
            AttrKey::PointerEvents => {
                AttrValue::Bool(s.flags.contains(SpriteFlags::POINTER_EVENTS))
            }
            AttrKey::Parent => AttrValue::Sprite(s.parent),
            AttrKey::Stage => AttrValue::Stage(s.stage),
            AttrKey::ExtraRender => AttrValue::Paint(s.extra_render.clone()),
            AttrKey::ExtraHitTest => AttrValue::HitTest(s.extra_hit_test.clone()),
            AttrKey::Transform => AttrValue::Transform(s.transform),
        })
    }

    /// Write an attribute.
    ///
    /// A value of the wrong variant is rejected with
    /// [`SceneError::AttrTypeMismatch`] and `stage` with
    /// [`SceneError::ReadOnlyAttr`]. Writing `parent` appends to the new parent
    /// (or, with `None`, removes from the current one) so the tree stays
    /// consistent.
    pub fn set_attr(
        &mut self,
        id: SpriteId,
        key: AttrKey,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        let Some(sprite) = self.sprite(id) else {
            return reject(SceneError::StaleSprite(id));
        };
        let (x, y, parent) = (sprite.x, sprite.y, sprite.parent);
        match (key, value.into()) {
            (AttrKey::X, AttrValue::Number(v)) => self.set_position(id, Point::new(v, y)),
            (AttrKey::Y, AttrValue::Number(v)) => self.set_position(id, Point::new(x, v)),
            (AttrKey::Name, AttrValue::Text(v)) => self.set_name(id, v),
            (AttrKey::Alpha, AttrValue::Number(v)) => self.set_alpha(id, v),
            (AttrKey::Visible, AttrValue::Bool(v)) => self.set_visible(id, v),
            (AttrKey::PointerEvents, AttrValue::Bool(v)) => self.set_pointer_events(id, v),
            (AttrKey::Parent, AttrValue::Sprite(Some(new_parent))) => {
                self.append_child(new_parent, id)?;
            }
            (AttrKey::Parent, AttrValue::Sprite(None)) => {
                if let Some(parent) = parent {
                    self.remove_child(parent, id)?;
                }
            }
            (AttrKey::Stage, _) => return reject(SceneError::ReadOnlyAttr(key)),
            (AttrKey::ExtraRender, AttrValue::Paint(hook)) => self.set_extra_render(id, hook),
            (AttrKey::ExtraHitTest, AttrValue::HitTest(hook)) => {
                self.set_extra_hit_test(id, hook);
            }
            (AttrKey::Transform, AttrValue::Text(text)) => self.set_transform(id, &text)?,
            (AttrKey::Transform, AttrValue::Transform(m)) => self.set_transform_matrix(id, m),
            (key, _) => return reject(SceneError::AttrTypeMismatch(key)),
        }
        Ok(())
    }

    /// Write several attributes in order. Rejected writes are skipped.
    ///
    /// Returns how many were applied.
    pub fn set_attrs(
        &mut self,
        id: SpriteId,
        attrs: impl IntoIterator<Item = (AttrKey, AttrValue)>,
    ) -> usize {
        attrs
            .into_iter()
            .filter(|(key, value)| self.set_attr(id, *key, value.clone()).is_ok())
            .count()
    }

    /// Read an attribute by name. Unknown names read as `None`.
    pub fn attr_by_name(&self, id: SpriteId, name: &str) -> Option<AttrValue> {
        self.attr(id, name.parse().ok()?)
    }

    /// Write an attribute by name. Unknown names are rejected with
    /// [`SceneError::UnknownAttr`].
    pub fn set_attr_by_name(
        &mut self,
        id: SpriteId,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), SceneError> {
        match name.parse::<AttrKey>() {
            Ok(key) => self.set_attr(id, key, value),
            Err(err) => reject(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SpriteOptions;
    use crate::types::hit_rect;
    use alloc::vec;
    use kurbo::Rect;

    #[test]
    fn names_round_trip() {
        for key in AttrKey::all() {
            assert_eq!(key.name().parse::<AttrKey>(), Ok(key));
        }
        assert_eq!(AttrKey::PointerEvents.name(), "pointerEvents");
        assert_eq!(
            "children".parse::<AttrKey>(),
            Err(SceneError::UnknownAttr("children".into()))
        );
    }

    #[test]
    fn read_and_write_plain_fields() {
        let mut tree = Tree::new();
        let id = tree.insert(SpriteOptions::named("n").at(1.0, 2.0));

        assert_eq!(tree.attr(id, AttrKey::X), Some(AttrValue::Number(1.0)));
        assert_eq!(tree.attr_by_name(id, "name"), Some(AttrValue::Text("n".into())));
        assert_eq!(tree.attr_by_name(id, "bogus"), None);

        tree.set_attr(id, AttrKey::Y, 9.0).unwrap();
        tree.set_attr(id, AttrKey::Alpha, 4.0).unwrap();
        tree.set_attr_by_name(id, "visible", false).unwrap();
        tree.set_attr_by_name(id, "name", "renamed").unwrap();
        assert_eq!(tree.position(id), Some(Point::new(1.0, 9.0)));
        assert_eq!(tree.alpha(id), Some(1.0));
        assert!(!tree.is_visible(id));
        assert_eq!(tree.name(id), Some("renamed"));
    }

    #[test]
    fn rejected_writes_change_nothing() {
        let mut tree = Tree::new();
        let id = tree.insert(SpriteOptions::named("n"));
        assert_eq!(
            tree.set_attr(id, AttrKey::X, "ten"),
            Err(SceneError::AttrTypeMismatch(AttrKey::X))
        );
        assert_eq!(
            tree.set_attr(id, AttrKey::Stage, AttrValue::Stage(None)),
            Err(SceneError::ReadOnlyAttr(AttrKey::Stage))
        );
        assert_eq!(
            tree.set_attr_by_name(id, "children", 1.0),
            Err(SceneError::UnknownAttr("children".into()))
        );
        assert_eq!(tree.position(id), Some(Point::ZERO));
    }

    #[test]
    fn parent_writes_keep_the_tree_consistent() {
        let mut tree = Tree::new();
        let p1 = tree.insert(SpriteOptions::named("p1"));
        let p2 = tree.insert(SpriteOptions::named("p2"));
        let c = tree.insert(SpriteOptions::named("c"));

        tree.set_attr(c, AttrKey::Parent, p1).unwrap();
        tree.set_attr(c, AttrKey::Parent, p2).unwrap();
        assert!(tree.children_of(p1).is_empty());
        assert_eq!(tree.children_of(p2), &[c]);
        assert_eq!(tree.attr(c, AttrKey::Parent), Some(AttrValue::Sprite(Some(p2))));

        tree.set_attr(c, AttrKey::Parent, AttrValue::Sprite(None)).unwrap();
        assert_eq!(tree.parent_of(c), None);
        assert!(tree.children_of(p2).is_empty());

        assert_eq!(
            tree.set_attr(p1, AttrKey::Parent, p1),
            Err(SceneError::Cycle { parent: p1, child: p1 })
        );
    }

    #[test]
    fn transform_and_hooks() {
        let mut tree = Tree::new();
        let id = tree.insert(SpriteOptions::default());
        tree.set_attr(id, AttrKey::Transform, "translate(3px, 4px)").unwrap();
        assert_eq!(
            tree.attr(id, AttrKey::Transform),
            Some(AttrValue::Transform(Affine::translate((3.0, 4.0))))
        );
        assert_eq!(
            tree.set_attr(id, AttrKey::Transform, "none"),
            Err(SceneError::TransformIgnored)
        );
        tree.set_attr(id, AttrKey::Transform, Affine::scale(2.0)).unwrap();
        assert_eq!(tree.transform(id), Some(Affine::scale(2.0)));

        let hook = hit_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        tree.set_attr(id, AttrKey::ExtraHitTest, AttrValue::HitTest(Some(hook.clone())))
            .unwrap();
        assert_eq!(
            tree.attr(id, AttrKey::ExtraHitTest),
            Some(AttrValue::HitTest(Some(hook)))
        );
    }

    #[test]
    fn batch_set_skips_rejections() {
        let mut tree = Tree::new();
        let id = tree.insert(SpriteOptions::default());
        let applied = tree.set_attrs(
            id,
            vec![
                (AttrKey::X, AttrValue::Number(5.0)),
                (AttrKey::Visible, AttrValue::Number(1.0)),
                (AttrKey::PointerEvents, AttrValue::Bool(false)),
            ],
        );
        assert_eq!(applied, 2);
        assert_eq!(tree.position(id), Some(Point::new(5.0, 0.0)));
        assert!(tree.is_visible(id));
        assert!(!tree.pointer_events(id));
    }
}
