// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paint surface contract used by the render traversal.

use core::ops::{Deref, DerefMut};

/// A canvas-like paint context with a state stack.
///
/// The render traversal uses it exactly once per painted sprite: `save`, set the
/// global alpha, translate to the sprite's world offset, run the sprite's paint
/// hooks, then `restore`.
pub trait PaintContext {
    /// Push the current state (alpha, translation, and anything else the surface tracks).
    fn save(&mut self);
    /// Pop the state pushed by the matching [`save`](Self::save).
    fn restore(&mut self);
    /// Set the global alpha used by subsequent drawing.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Translate the current coordinate system.
    fn translate(&mut self, dx: f64, dy: f64);
}

/// Saved paint state that is restored when dropped.
pub(crate) struct PaintScope<'a> {
    ctx: &'a mut dyn PaintContext,
}

impl<'a> PaintScope<'a> {
    pub(crate) fn new(ctx: &'a mut dyn PaintContext) -> Self {
        ctx.save();
        Self { ctx }
    }
}

impl<'a> Deref for PaintScope<'a> {
    type Target = dyn PaintContext + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for PaintScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for PaintScope<'_> {
    fn drop(&mut self) {
        self.ctx.restore();
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use alloc::rc::Rc;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::PaintContext;
    use crate::types::PaintHook;

    /// A paint operation observed by [`Recorder`].
    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Op {
        Save,
        Restore,
        Alpha(f64),
        Translate(f64, f64),
        Paint(String),
    }

    /// Records every call so tests can assert on paint order and state.
    ///
    /// Paint hooks made with [`Recorder::hook`] log into the same list.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) ops: Rc<RefCell<Vec<Op>>>,
    }

    impl Recorder {
        /// A paint hook that records `name` when invoked.
        pub(crate) fn hook(&self, name: &str) -> PaintHook {
            let ops = self.ops.clone();
            let name = name.to_string();
            Rc::new(move |_ctx: &mut dyn PaintContext| {
                ops.borrow_mut().push(Op::Paint(name.clone()));
            })
        }

        /// Names passed to [`Op::Paint`], in order.
        pub(crate) fn painted(&self) -> Vec<String> {
            self.ops
                .borrow()
                .iter()
                .filter_map(|op| match op {
                    Op::Paint(name) => Some(name.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Alpha and accumulated translation in effect when `name` was painted.
        pub(crate) fn state_at(&self, name: &str) -> Option<(f64, (f64, f64))> {
            let mut stack = Vec::new();
            let mut state = (1.0, (0.0, 0.0));
            for op in self.ops.borrow().iter() {
                match op {
                    Op::Save => stack.push(state),
                    Op::Restore => state = stack.pop().unwrap_or((1.0, (0.0, 0.0))),
                    Op::Alpha(a) => state.0 = *a,
                    Op::Translate(dx, dy) => state.1 = (state.1.0 + dx, state.1.1 + dy),
                    Op::Paint(n) if n == name => return Some(state),
                    Op::Paint(_) => {}
                }
            }
            None
        }

        /// Whether every `save` was matched by a `restore`.
        pub(crate) fn balanced(&self) -> bool {
            let mut depth = 0_i32;
            for op in self.ops.borrow().iter() {
                match op {
                    Op::Save => depth += 1,
                    Op::Restore => depth -= 1,
                    _ => {}
                }
                if depth < 0 {
                    return false;
                }
            }
            depth == 0
        }
    }

    impl PaintContext for Recorder {
        fn save(&mut self) {
            self.ops.borrow_mut().push(Op::Save);
        }

        fn restore(&mut self) {
            self.ops.borrow_mut().push(Op::Restore);
        }

        fn set_global_alpha(&mut self, alpha: f64) {
            self.ops.borrow_mut().push(Op::Alpha(alpha));
        }

        fn translate(&mut self, dx: f64, dy: f64) {
            self.ops.borrow_mut().push(Op::Translate(dx, dy));
        }
    }
}
