mod common;

use common::{Harness, HEIGHT, WIDTH};
use luapad_core::{
    Color, CoroutineStatus, DiagnosticKind, DrawCmd, Fill, MarshalPolicy, PointerState,
    RuntimeConfig, MAX_CIRCLE_SEGMENTS,
};

/// Run a script that must complete without reporting anything
fn run_clean(source: &str) -> Harness {
    let mut h = Harness::new();
    h.run(source);
    assert!(h.log.is_empty(), "unexpected diagnostics: {:?}", h.log.entries());
    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    h
}

#[test]
fn test_channel_table_packs_color() {
    let h = run_clean("box(0, 0, 1, 1, {0.2, 0.4, 0.6})");

    let expected = (51u32 << 16) | (102 << 8) | 153;
    match h.commands().as_slice() {
        [DrawCmd::Rect { color, fill, .. }] => {
            assert_eq!(color.rgb, expected);
            assert_eq!(color.alpha, 1.0);
            assert_eq!(*fill, Fill::Solid);
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn test_named_channels_and_alpha() {
    let h = run_clean("circle(10, 10, 5, 6, {r = 1, g = 0, b = 0, a = 0.5}, 1)");

    match h.commands().as_slice() {
        [DrawCmd::Circle {
            segments,
            color,
            fill,
            ..
        }] => {
            assert_eq!(*segments, 6);
            assert_eq!(*color, Color { rgb: 0xff0000, alpha: 0.5 });
            assert_eq!(*fill, Fill::Outline);
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn test_circle_vertex_count_is_capped() {
    let h = run_clean("circle(50, 50, 20, 1e9, 0xffffff) circle(50, 50, 20, math.huge, 0xffffff)");

    let commands = h.commands();
    assert_eq!(commands.len(), 2);
    for cmd in &commands {
        assert!(
            matches!(cmd, DrawCmd::Circle { segments, .. } if *segments == MAX_CIRCLE_SEGMENTS),
            "{cmd:?}"
        );
    }
}

#[test]
fn test_missing_trailing_arguments_use_defaults() {
    let h = run_clean("drawLine(0, 0, 10, 10, 0xffffff) box(0, 0, 2, 2, 0x00ff00)");

    let commands = h.commands();
    assert!(matches!(commands[0], DrawCmd::Line { thickness, .. } if thickness == 1.0));
    assert!(matches!(commands[1], DrawCmd::Rect { fill: Fill::Solid, .. }));
}

#[test]
fn test_argument_order_is_preserved() {
    let h = run_clean("drawRect(1, 2, 3, 4, 0x010203)");

    assert_eq!(
        h.commands(),
        vec![DrawCmd::Rect {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            color: Color::from_packed(0x010203),
            fill: Fill::Solid,
        }]
    );
}

#[test]
fn test_permissive_mismatch_falls_back_to_default() {
    let h = run_clean("drawRect('left', 2, 3, 4, true)");

    assert_eq!(
        h.commands(),
        vec![DrawCmd::Rect {
            x: 0.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
            color: Color::BLACK,
            fill: Fill::Solid,
        }]
    );
}

#[test]
fn test_numeric_strings_coerce() {
    let h = run_clean("drawRect('5', '0x10', 1, 1, '0xff0000')");

    match h.commands().as_slice() {
        [DrawCmd::Rect { x, y, color, .. }] => {
            assert_eq!((*x, *y), (5.0, 16.0));
            assert_eq!(color.rgb, 0xff0000);
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn test_strict_policy_raises_into_guest() {
    let mut h = Harness::with_config(RuntimeConfig {
        marshalling: MarshalPolicy::Strict,
        ..RuntimeConfig::default()
    });
    h.run("drawRect('left', 2, 3, 4, 0)");

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Failed));
    assert_eq!(h.draw_count(), 0);
    let diagnostics = h.log.take();
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Invocation);
    assert!(
        diagnostics[0]
            .message
            .contains("bad argument #1 to 'drawRect' (x)"),
        "{}",
        diagnostics[0].message
    );
}

#[test]
fn test_strict_errors_can_be_caught_by_pcall() {
    let mut h = Harness::with_config(RuntimeConfig {
        marshalling: MarshalPolicy::Strict,
        ..RuntimeConfig::default()
    });
    h.run("local ok = pcall(drawRect, {}) if not ok then drawRect(1, 1, 1, 1, 0) end");

    assert_eq!(h.manager.status(), Some(CoroutineStatus::Completed));
    assert_eq!(h.draw_count(), 1);
}

#[test]
fn test_clear_and_background() {
    let h = run_clean("drawRect(0, 0, 1, 1, 0) setBackgroundColor(0x336699) clear()");

    assert_eq!(h.draw_count(), 0);
    assert_eq!(h.canvas.borrow().background(), Color::from_packed(0x336699));
}

#[test]
fn test_print_at_upserts_single_node() {
    let h = run_clean("printAt(1, 2, 'first') printAt(3, 4, 42)");

    let canvas = h.canvas.borrow();
    let text = canvas.debug_text().unwrap();
    assert_eq!((text.x, text.y), (3.0, 4.0));
    assert_eq!(text.text, "42");
}

#[test]
fn test_surface_queries_and_resize() {
    let mut h = run_clean("drawRect(0, 0, gWidth(), gHeight(), 0)");
    assert!(matches!(
        h.commands()[0],
        DrawCmd::Rect { width, height, .. } if width == WIDTH && height == HEIGHT
    ));

    h.manager.resize(100.0, 50.0);
    let now = h.at(10);
    h.manager
        .run_source("drawRect(0, 0, gWidth(), gHeight(), 0)", "resized.lua", now)
        .unwrap();
    assert!(matches!(
        h.commands()[0],
        DrawCmd::Rect { width, height, .. } if width == 100.0 && height == 50.0
    ));
}

#[test]
fn test_touch_reports_pointer_state() {
    let mut h = Harness::new();
    h.run("while true do local t = touch() if t.pressed then drawRect(t.x, t.y, 1, 1, 0) end update() end");
    assert_eq!(h.draw_count(), 0);

    h.manager.set_pointer(PointerState::new(12.0, 34.0, true));
    h.tick(16);

    assert!(matches!(
        h.commands()[0],
        DrawCmd::Rect { x, y, .. } if x == 12.0 && y == 34.0
    ));
}

#[test]
fn test_random_is_floored_below_max() {
    run_clean(
        r#"
        for _ = 1, 200 do
          local r = random(10)
          assert(r >= 0 and r < 10 and r == math.floor(r))
          assert(rnd() == 0)
        end
        "#,
    );
}

#[test]
fn test_seeded_random_is_repeatable() {
    let script = "for i = 1, 5 do drawRect(random(1000), 0, 1, 1, 0) end";
    let a = run_clean(script).commands();
    let b = run_clean(script).commands();
    assert_eq!(a, b);
}

#[test]
fn test_get_fps_is_zero_before_first_window() {
    run_clean("assert(getFPS() == 0)");
}

#[test]
fn test_sprites_move_and_tint() {
    let h = run_clean(
        r#"
        local ship = loadImage("ship.png")
        assert(ship == 1)
        local s = createSprite()
        assert(s == 1)
        setSpriteImage(s, ship)
        setSpritePosition(s, 10, 20)
        setSpriteSpeed(s, {2, -1})
        setSpriteColor(s, 1, 0, 0)
        updateSprites()
        drawSprites()
        "#,
    );

    let sprites = h.manager.sprites();
    assert_eq!(sprites.len(), 1);
    let sprite = &sprites[0];
    assert_eq!((sprite.x, sprite.y), (12.0, 19.0));
    assert_eq!(sprite.tint, Color::from_packed(0xff0000));
    assert_eq!(sprite.texture.as_ref().map(|t| t.width), Some(8.0));
    assert_eq!(h.draw_count(), 0);
}

#[test]
fn test_sprite_velocity_accepts_named_fields() {
    let h = run_clean(
        "local s = createSprite() setSpriteSpeed(s, {vx = 3, vy = 4}) updateSprites()",
    );
    let sprite = &h.manager.sprites()[0];
    assert_eq!((sprite.vx, sprite.vy), (3.0, 4.0));
}

#[test]
fn test_unknown_handles_are_ignored() {
    run_clean(
        r#"
        assert(loadImage("missing.png") == nil)
        setSpritePosition(99, 1, 1)
        setSpriteImage(1, 7)
        setSpriteColor(0, 1, 1, 1)
        "#,
    );
}

#[test]
fn test_sprites_do_not_outlive_their_session() {
    let mut h = run_clean("createSprite() createSprite()");
    assert_eq!(h.manager.sprites().len(), 2);

    let now = h.at(16);
    h.manager.run_source("local s = createSprite() assert(s == 1)", "fresh.lua", now).unwrap();
    assert_eq!(h.manager.sprites().len(), 1);
    assert!(h.log.is_empty());
}

#[test]
fn test_native_bindings_take_precedence_over_script_globals() {
    run_clean(
        r#"
        drawRect = nil
        assert(type(drawRect) == "function")
        counter = 5
        assert(counter == 5)
        assert(type(string.format) == "function")
        "#,
    );
}

#[test]
fn test_every_native_is_installed() {
    let h = run_clean("");

    let session = h.manager.current().unwrap();
    for name in ["drawCircle", "circle", "printAt", "touch", "random", "rnd", "update", "sleep", "stop"] {
        assert!(session.bindings().contains(&name), "{name} missing");
    }
    assert_eq!(h.manager.binding_count(), session.bindings().len());
}
