// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction options for sprites.

use alloc::string::String;

use crate::types::{HitTestHook, PaintHook, TypeTag};

/// Everything a sprite can be configured with at construction time.
///
/// All fields are optional in spirit: [`SpriteOptions::default`] gives a visible,
/// pickable, fully opaque, unnamed sprite at the origin with an identity
/// transform and no hooks.
///
/// With the `serde` feature, the plain-data fields (de)serialize with camelCase
/// names and missing fields take their defaults. Hooks and the type tag are
/// skipped.
///
/// ```
/// use proscenium_sprite::{SpriteOptions, Tree};
///
/// let mut tree = Tree::new();
/// let id = tree.insert(
///     SpriteOptions::named("badge")
///         .at(12.0, 8.0)
///         .with_alpha(3.0)
///         .with_transform("scale(2)"),
/// );
/// assert_eq!(tree.name(id), Some("badge"));
/// assert_eq!(tree.alpha(id), Some(1.0));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct SpriteOptions {
    /// Free-form label.
    pub name: String,
    /// Local x offset relative to the parent.
    pub x: f64,
    /// Local y offset relative to the parent.
    pub y: f64,
    /// Opacity; clamped into `[0, 1]` when applied.
    pub alpha: f64,
    /// Whether the sprite (and its subtree) renders.
    pub visible: bool,
    /// Whether the sprite (and its subtree) takes part in hit testing.
    pub pointer_events: bool,
    /// Transform text handed to the tree's resolver; ignored if it does not resolve.
    pub transform: Option<String>,
    /// Runtime type tag.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub type_tag: TypeTag,
    /// Own paint hook.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub paint: Option<PaintHook>,
    /// Paint hook run after [`paint`](Self::paint) in the same scope.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub extra_render: Option<PaintHook>,
    /// Custom hit geometry.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub extra_hit_test: Option<HitTestHook>,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0.0,
            y: 0.0,
            alpha: 1.0,
            visible: true,
            pointer_events: true,
            transform: None,
            type_tag: TypeTag::SPRITE,
            paint: None,
            extra_render: None,
            extra_hit_test: None,
        }
    }
}

impl core::fmt::Debug for SpriteOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpriteOptions")
            .field("name", &self.name)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("alpha", &self.alpha)
            .field("visible", &self.visible)
            .field("pointer_events", &self.pointer_events)
            .field("transform", &self.transform)
            .field("type_tag", &self.type_tag)
            .field("paint", &self.paint.is_some())
            .field("extra_render", &self.extra_render.is_some())
            .field("extra_hit_test", &self.extra_hit_test.is_some())
            .finish()
    }
}

impl SpriteOptions {
    /// Default options with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the local offset.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the opacity.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Start hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Start excluded from hit testing.
    pub fn without_pointer_events(mut self) -> Self {
        self.pointer_events = false;
        self
    }

    /// Set the transform text.
    pub fn with_transform(mut self, text: impl Into<String>) -> Self {
        self.transform = Some(text.into());
        self
    }

    /// Set the runtime type tag.
    pub fn with_type_tag(mut self, tag: TypeTag) -> Self {
        self.type_tag = tag;
        self
    }

    /// Set the own paint hook.
    pub fn with_paint(mut self, hook: PaintHook) -> Self {
        self.paint = Some(hook);
        self
    }

    /// Set the extra render hook.
    pub fn with_extra_render(mut self, hook: PaintHook) -> Self {
        self.extra_render = Some(hook);
        self
    }

    /// Set the custom hit geometry.
    pub fn with_extra_hit_test(mut self, hook: HitTestHook) -> Self {
        self.extra_hit_test = Some(hook);
        self
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let opts: SpriteOptions =
            serde_json::from_str(r#"{ "name": "knob", "x": 4, "pointerEvents": false }"#).unwrap();
        assert_eq!(opts.name, "knob");
        assert_eq!(opts.x, 4.0);
        assert_eq!(opts.y, 0.0);
        assert_eq!(opts.alpha, 1.0);
        assert!(opts.visible);
        assert!(!opts.pointer_events);
        assert_eq!(opts.type_tag, TypeTag::SPRITE);
        assert!(opts.paint.is_none());
    }
}
