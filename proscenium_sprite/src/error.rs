// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rejected edits.
//!
//! Nothing in this crate is fatal. A rejected edit leaves the tree exactly as it
//! was and reports one of these; callers are free to ignore it.

use alloc::string::String;

use crate::attr::AttrKey;
use crate::types::{SpriteId, StageId};

/// Why an edit was not applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The sprite id is stale or was never issued by this tree.
    #[error("sprite {0:?} is not live")]
    StaleSprite(SpriteId),
    /// The stage id is stale or was never issued by this tree.
    #[error("stage {0:?} is not live")]
    StaleStage(StageId),
    /// `child` is not a direct child of `parent`.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The container that was searched.
        parent: SpriteId,
        /// The sprite that was not found in it.
        child: SpriteId,
    },
    /// A child index past the end of the child list.
    #[error("index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of children.
        len: usize,
    },
    /// Stage roots cannot be children of anything.
    #[error("stage root {0:?} cannot become a child")]
    StageRootAsChild(SpriteId),
    /// The edit would make a sprite its own ancestor.
    #[error("appending {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Requested parent.
        parent: SpriteId,
        /// Sprite being appended.
        child: SpriteId,
    },
    /// Only parentless sprites can become stage roots.
    #[error("sprite {0:?} has a parent and cannot be a stage root")]
    NotARoot(SpriteId),
    /// The sprite already belongs to a stage.
    #[error("sprite {0:?} is already attached to a stage")]
    AlreadyStaged(SpriteId),
    /// The resolver found no valid transform; the previous matrix is kept.
    #[error("transform text did not resolve; matrix unchanged")]
    TransformIgnored,
    /// The attribute name is not on the allow-list.
    #[error("unknown attribute `{0}`")]
    UnknownAttr(String),
    /// The value's variant does not fit the attribute.
    #[error("value does not fit attribute `{}`", .0.name())]
    AttrTypeMismatch(AttrKey),
    /// The attribute can be read but not written.
    #[error("attribute `{}` is read-only", .0.name())]
    ReadOnlyAttr(AttrKey),
}

/// Log a rejected edit and return it as an error.
pub(crate) fn reject<T>(err: SceneError) -> Result<T, SceneError> {
    log::debug!("edit rejected: {err}");
    Err(err)
}
