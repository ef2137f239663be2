// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Name and type queries over direct children, and ancestry tests.

use alloc::string::String;
use alloc::vec::Vec;

use proscenium_transform::TransformResolver;

use crate::tree::Tree;
use crate::types::{SpriteId, TypeTag};

/// A sprite name pattern.
///
/// Parsed from text with an optional two-character operator prefix:
/// `^=` matches a prefix, `$=` a suffix, `~=` a substring, and anything else
/// matches the whole name exactly.
///
/// ```
/// use proscenium_sprite::NamePattern;
///
/// assert_eq!(NamePattern::parse("^=btn"), NamePattern::Prefix("btn".into()));
/// assert!(NamePattern::parse("~=ok").matches("btn-ok-1"));
/// assert!(!NamePattern::parse("ok").matches("btn-ok-1"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NamePattern {
    /// The whole name.
    Exact(String),
    /// Names starting with the text.
    Prefix(String),
    /// Names ending with the text.
    Suffix(String),
    /// Names containing the text.
    Contains(String),
}

impl NamePattern {
    /// Parse a pattern string.
    pub fn parse(pattern: &str) -> Self {
        if let Some(rest) = pattern.strip_prefix("^=") {
            Self::Prefix(rest.into())
        } else if let Some(rest) = pattern.strip_prefix("$=") {
            Self::Suffix(rest.into())
        } else if let Some(rest) = pattern.strip_prefix("~=") {
            Self::Contains(rest.into())
        } else {
            Self::Exact(pattern.into())
        }
    }

    /// Whether `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(text) => name == text,
            Self::Prefix(text) => name.starts_with(text.as_str()),
            Self::Suffix(text) => name.ends_with(text.as_str()),
            Self::Contains(text) => name.contains(text.as_str()),
        }
    }
}

impl From<&str> for NamePattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

impl<R: TransformResolver + 'static> Tree<R> {
    /// Direct children of `parent` whose name matches, frontmost first.
    pub fn children_by_name(&self, parent: SpriteId, pattern: impl Into<NamePattern>) -> Vec<SpriteId> {
        let pattern = pattern.into();
        self.children_of(parent)
            .iter()
            .rev()
            .copied()
            .filter(|&child| pattern.matches(&self.node(child).name))
            .collect()
    }

    /// Direct children of `parent` with the given type tag, backmost first.
    ///
    /// Note the order is the reverse of [`children_by_name`](Self::children_by_name).
    pub fn children_by_type(&self, parent: SpriteId, tag: TypeTag) -> Vec<SpriteId> {
        self.children_of(parent)
            .iter()
            .copied()
            .filter(|&child| self.node(child).type_tag == tag)
            .collect()
    }

    /// Whether `node` is a strict descendant of `ancestor`.
    pub fn includes(&self, ancestor: SpriteId, node: SpriteId) -> bool {
        if node == ancestor || !self.is_alive(node) {
            return false;
        }
        let mut stack: Vec<SpriteId> = self.children_of(ancestor).to_vec();
        while let Some(current) = stack.pop() {
            if current == node {
                return true;
            }
            stack.extend_from_slice(self.children_of(current));
        }
        false
    }

    /// Whether `ancestor` is a strict ancestor of `node`, following parent links.
    pub fn included_by(&self, node: SpriteId, ancestor: SpriteId) -> bool {
        if !self.is_alive(ancestor) {
            return false;
        }
        let mut current = self.parent_of(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SpriteOptions;
    use alloc::vec;

    #[test]
    fn name_modes() {
        let mut tree = Tree::new();
        let parent = tree.insert(SpriteOptions::named("p"));
        let a1 = tree.insert(SpriteOptions::named("a1"));
        let a2 = tree.insert(SpriteOptions::named("a2"));
        let xa = tree.insert(SpriteOptions::named("xa"));
        tree.append_children(parent, [a1, a2, xa]);

        assert_eq!(tree.children_by_name(parent, "^=a"), vec![a2, a1]);
        assert_eq!(tree.children_by_name(parent, "$=a"), vec![xa]);
        assert_eq!(tree.children_by_name(parent, "~=a"), vec![xa, a2, a1]);
        assert_eq!(tree.children_by_name(parent, "a1"), vec![a1]);
        assert!(tree.children_by_name(parent, "a").is_empty());
    }

    #[test]
    fn name_search_is_shallow() {
        let mut tree = Tree::new();
        let parent = tree.insert(SpriteOptions::named("p"));
        let mid = tree.insert(SpriteOptions::named("mid"));
        let deep = tree.insert(SpriteOptions::named("target"));
        tree.append_child(parent, mid).unwrap();
        tree.append_child(mid, deep).unwrap();
        assert!(tree.children_by_name(parent, "target").is_empty());
        assert_eq!(tree.children_by_name(mid, NamePattern::Exact("target".into())), vec![deep]);
    }

    #[test]
    fn type_filter_is_backmost_first() {
        const TEXT: TypeTag = TypeTag("Text");
        let mut tree = Tree::new();
        let parent = tree.insert(SpriteOptions::default());
        let t1 = tree.insert(SpriteOptions::default().with_type_tag(TEXT));
        let plain = tree.insert(SpriteOptions::default());
        let t2 = tree.insert(SpriteOptions::default().with_type_tag(TEXT));
        tree.append_children(parent, [t1, plain, t2]);

        assert_eq!(tree.children_by_type(parent, TEXT), vec![t1, t2]);
        assert_eq!(tree.children_by_type(parent, TypeTag::SPRITE), vec![plain]);
    }

    #[test]
    fn ancestry_is_strict() {
        let mut tree = Tree::new();
        let root = tree.insert(SpriteOptions::default());
        let a = tree.insert(SpriteOptions::default());
        let b = tree.insert(SpriteOptions::default());
        let other = tree.insert(SpriteOptions::default());
        tree.append_child(root, a).unwrap();
        tree.append_child(a, b).unwrap();

        assert!(tree.includes(root, b));
        assert!(tree.included_by(b, root));
        assert!(!tree.includes(b, root));
        assert!(!tree.included_by(root, b));
        assert!(!tree.includes(a, a));
        assert!(!tree.included_by(a, a));
        assert!(!tree.includes(root, other));

        tree.destroy(b).unwrap();
        assert!(!tree.includes(root, b));
        assert!(!tree.included_by(b, root));
    }
}
