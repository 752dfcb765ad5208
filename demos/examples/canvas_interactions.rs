// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dragging, panning, autopanning, and zooming on an `understory_input` canvas.
//!
//! The host side is simulated: a scripted sequence of pointer and key events
//! with timestamps, and a tick after each one. Results are logged at `info`;
//! set `RUST_LOG=debug` (or `trace`) to also watch routing decisions.
//!
//! Run:
//! - `cargo run -p understory_demos --example canvas_interactions`

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_input::{
    BasicEventHandler, Canvas, DragHandler, DragNode, EventFilter, EventKind, InputEventHandler,
    Modifiers, MouseButton, ZoomHandler,
};
use understory_scene::LocalNode;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut canvas = Canvas::new(Rect::new(0.0, 0.0, 640.0, 480.0));
    let layer = canvas.layer();
    let card = canvas.scene_mut().insert(
        Some(layer),
        LocalNode::with_bounds(Rect::new(40.0, 40.0, 160.0, 120.0)),
    );
    let badge = canvas.scene_mut().insert(
        Some(card),
        LocalNode::with_bounds(Rect::new(130.0, 45.0, 155.0, 60.0)),
    );

    // Dragging the card must not pan the camera underneath it.
    let mut drag = DragHandler::new(DragNode::new());
    drag.policy_mut().set_raise_to_top_on_press(true);
    drag.filter_mut().set_marks_accepted_events_as_handled(true);
    canvas.add_input_handler(card, drag);

    // Report double clicks on the badge; they still bubble to the card's drag handler.
    let mut double_clicks = EventFilter::new();
    double_clicks.reject_all_event_kinds();
    double_clicks.set_accepts_kind(EventKind::MouseClicked, true);
    double_clicks.set_click_count(Some(2));
    canvas.add_input_handler(
        badge,
        BasicEventHandler::new(double_clicks, |cx, event, _kind| {
            tracing::info!(
                local = ?event.position(cx.scene()),
                canvas = ?event.canvas_position(),
                "double click on badge"
            );
        }),
    );

    // A keyboard sink on the camera.
    let mut keys = EventFilter::new();
    keys.reject_all_event_kinds();
    keys.set_accepts_key_events(true);
    keys.set_accepts_focus_events(true);
    let camera = canvas.camera();
    let typist = canvas.add_input_handler(
        camera,
        BasicEventHandler::new(keys, |_cx, event, kind| {
            tracing::info!(?kind, key = ?event.key().and_then(|k| k.key_char), "key event");
        }),
    );

    let none = Modifiers::empty();
    let mut now = 0;
    let mut step = |canvas: &mut Canvas, ms: u64| {
        now += ms;
        canvas.tick(now);
        now
    };

    // Drag the card 60px right.
    let t = step(&mut canvas, 0);
    canvas.pointer_pressed(Point::new(60.0, 60.0), MouseButton::Primary, none, t);
    for x in [80.0, 100.0, 120.0] {
        let t = step(&mut canvas, 16);
        canvas.pointer_moved(Point::new(x, 60.0), none, t);
    }
    let t = step(&mut canvas, 16);
    canvas.pointer_released(Point::new(120.0, 60.0), MouseButton::Primary, none, t);
    tracing::info!(
        translation = ?canvas.scene().local_transform(card).map(|tf| tf.translation()),
        "card moved"
    );

    // Double click the badge, which moved with the card.
    for _ in 0..2 {
        let t = step(&mut canvas, 40);
        canvas.pointer_pressed(Point::new(200.0, 50.0), MouseButton::Primary, none, t);
        let t = step(&mut canvas, 40);
        canvas.pointer_released(Point::new(200.0, 50.0), MouseButton::Primary, none, t);
    }

    // Pan on empty space, then leave the pointer past the right edge to autopan.
    let t = step(&mut canvas, 600);
    canvas.pointer_pressed(Point::new(400.0, 300.0), MouseButton::Primary, none, t);
    let t = step(&mut canvas, 16);
    canvas.pointer_moved(Point::new(420.0, 310.0), none, t);
    let t = step(&mut canvas, 16);
    canvas.pointer_moved(Point::new(660.0, 310.0), none, t);
    for _ in 0..10 {
        step(&mut canvas, 20);
    }
    let t = step(&mut canvas, 0);
    canvas.pointer_released(Point::new(660.0, 310.0), MouseButton::Primary, none, t);
    tracing::info!(
        translation = ?canvas.scene().view_transform(camera).map(|tf| tf.translation()),
        "view after panning"
    );

    // Zoom in about (320, 240) by holding the secondary button 100px to the right.
    let t = step(&mut canvas, 100);
    canvas.pointer_pressed(Point::new(320.0, 240.0), MouseButton::Secondary, none, t);
    tracing::info!(quality = ?canvas.render_quality(), "zooming");
    let t = step(&mut canvas, 16);
    canvas.pointer_moved(Point::new(420.0, 240.0), none, t);
    for _ in 0..15 {
        step(&mut canvas, 20);
    }
    let t = step(&mut canvas, 0);
    canvas.pointer_released(Point::new(420.0, 240.0), MouseButton::Secondary, none, t);
    if let Some(zoom) = canvas.zoom_handler() {
        let zooming = canvas
            .handler::<ZoomHandler>(zoom)
            .is_some_and(|h| h.is_dragging());
        tracing::info!(zooming, "zoom released");
    }
    tracing::info!(
        scale = ?canvas.scene().view_scale(camera),
        quality = ?canvas.render_quality(),
        "view after zooming"
    );

    // Type into the keyboard sink.
    let t = step(&mut canvas, 10);
    canvas.set_keyboard_focus(Some(typist), t);
    for c in "hi".chars() {
        let t = step(&mut canvas, 10);
        canvas.key_typed(c, none, t);
    }

    let damage = canvas.take_damage();
    tracing::info!(area = ?damage.union_rect(), "damage");
}
