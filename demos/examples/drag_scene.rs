// Copyright 2025 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small stage with a draggable knob, painted into a text log.
//!
//! This example shows how to:
//! - build a sprite hierarchy and attach it to a stage,
//! - drive rendering from the stage's repaint flag,
//! - feed pointer input through `dispatch_pointer` to a draggable sprite.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p proscenium_demos --example drag_scene`

use std::rc::Rc;

use kurbo::{Point, Rect};
use proscenium_sprite::{
    Event, PaintContext, PointerEvent, SpriteOptions, StageId, Tree, hit_rect,
};

/// Paint context that prints every call, indented by save depth.
#[derive(Debug, Default)]
struct ConsoleContext {
    depth: usize,
}

impl ConsoleContext {
    fn line(&self, text: &str) {
        println!("{:indent$}{text}", "", indent = self.depth * 2);
    }
}

impl PaintContext for ConsoleContext {
    fn save(&mut self) {
        self.line("save");
        self.depth += 1;
    }

    fn restore(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("restore");
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.line(&format!("alpha {alpha}"));
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.line(&format!("translate {dx} {dy}"));
    }
}

fn frame(tree: &mut Tree, stage: StageId, ctx: &mut ConsoleContext, label: &str) {
    if tree.needs_repaint(stage) {
        println!("-- frame: {label}");
        tree.render_stage(stage, ctx);
    } else {
        println!("-- frame: {label} (clean, skipped)");
    }
}

fn main() {
    env_logger::init();

    let mut tree = Tree::new();
    let root = tree.insert(SpriteOptions::named("stage-root"));
    let panel = tree.insert(
        SpriteOptions::named("panel")
            .at(20.0, 20.0)
            .with_alpha(0.8)
            .with_paint(Rc::new(|_: &mut dyn PaintContext| println!("    <panel>"))),
    );
    let knob = tree.insert(
        SpriteOptions::named("knob")
            .at(10.0, 10.0)
            .with_alpha(0.5)
            .with_transform("rotate(45deg)")
            .with_paint(Rc::new(|_: &mut dyn PaintContext| println!("      <knob>")))
            .with_extra_hit_test(hit_rect(Rect::new(0.0, 0.0, 16.0, 16.0))),
    );
    tree.append_child(root, panel).expect("fresh sprites");
    tree.append_child(panel, knob).expect("fresh sprites");
    let stage = tree.attach_stage(root).expect("root is parentless");
    log::info!("{stage:?} attached with {} sprites", tree.len());

    // Keep the knob inside the panel.
    tree.enable_drag(knob, Some(Rect::new(0.0, 0.0, 84.0, 44.0)))
        .expect("knob is live");

    let mut ctx = ConsoleContext::default();
    frame(&mut tree, stage, &mut ctx, "initial");
    frame(&mut tree, stage, &mut ctx, "idle");

    let at = |x, y| PointerEvent::at(Point::new(x, y));
    let hit = tree.dispatch_pointer(stage, &Event::TouchStart(at(35.0, 35.0)));
    println!("pointer down hit {:?}", hit.target.and_then(|id| tree.name(id)));

    for (x, y) in [(60.0, 40.0), (140.0, 50.0), (300.0, -40.0)] {
        tree.dispatch_pointer(stage, &Event::TouchMove(at(x, y)));
        let label = format!("move to ({x}, {y}) -> knob at {:?}", tree.position(knob));
        frame(&mut tree, stage, &mut ctx, &label);
    }
    tree.dispatch_pointer(stage, &Event::TouchEnd(at(300.0, -40.0)));
    log::info!("knob released at {:?}", tree.position(knob));

    println!(
        "released; dragging = {}, knob matrix = {:?}",
        tree.is_dragging(knob),
        tree.transform(knob)
    );
}
