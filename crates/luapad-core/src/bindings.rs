//! The native API every session exposes to its script

use tracing::warn;

use crate::context::HostContext;
use crate::registrar::{Arg, Args, NativeBinding, Param, Ret};
use crate::sprites::{SpriteHandle, TextureHandle};
use crate::surface::{Color, DrawCmd, Fill, MAX_CIRCLE_SEGMENTS};

/// Every host binding, in installation order.
///
/// `update` and `sleep` are not listed: they suspend the coroutine and are
/// installed by [`Registrar::install_yield_primitives`](crate::registrar::Registrar::install_yield_primitives).
pub fn catalogue() -> Vec<NativeBinding> {
    use Param as P;

    vec![
        // Immediate drawing
        NativeBinding::new(
            "drawCircle",
            vec![P::number("x"), P::number("y"), P::number("radius"), P::color("color")],
            0,
            draw_circle,
        ),
        NativeBinding::new(
            "drawRect",
            vec![
                P::number("x"),
                P::number("y"),
                P::number("width"),
                P::number("height"),
                P::color("color"),
            ],
            0,
            draw_rect,
        ),
        NativeBinding::new(
            "drawLine",
            vec![
                P::number("x1"),
                P::number("y1"),
                P::number("x2"),
                P::number("y2"),
                P::color("color"),
                P::number("thickness").or(Arg::Number(1.0)),
            ],
            0,
            draw_line,
        ),
        NativeBinding::new(
            "box",
            vec![
                P::number("x"),
                P::number("y"),
                P::number("width"),
                P::number("height"),
                P::color("color"),
                P::number("outline").or(Arg::Number(0.0)),
            ],
            0,
            draw_box,
        ),
        NativeBinding::new(
            "circle",
            vec![
                P::number("x"),
                P::number("y"),
                P::number("radius"),
                P::number("vertices"),
                P::color("color"),
                P::number("outline").or(Arg::Number(0.0)),
            ],
            0,
            draw_polygon_circle,
        ),
        NativeBinding::new("clear", vec![], 0, clear),
        NativeBinding::new(
            "setBackgroundColor",
            vec![P::color("color")],
            0,
            set_background_color,
        ),
        NativeBinding::new(
            "printAt",
            vec![P::number("x"), P::number("y"), P::text("text")],
            0,
            print_at,
        ),
        // Textures and sprites
        NativeBinding::new("loadImage", vec![P::text("path")], 1, load_image),
        NativeBinding::new("createSprite", vec![], 1, create_sprite),
        NativeBinding::new(
            "setSpriteImage",
            vec![P::handle("sprite"), P::handle("texture")],
            0,
            set_sprite_image,
        ),
        NativeBinding::new(
            "setSpritePosition",
            vec![P::handle("sprite"), P::number("x"), P::number("y")],
            0,
            set_sprite_position,
        ),
        NativeBinding::new(
            "setSpriteColor",
            vec![
                P::handle("sprite"),
                P::number("r"),
                P::number("g"),
                P::number("b"),
                P::number("a").or(Arg::Number(1.0)),
            ],
            0,
            set_sprite_color,
        ),
        NativeBinding::new(
            "setSpriteSpeed",
            vec![P::handle("sprite"), P::vec2("speed")],
            0,
            set_sprite_speed,
        ),
        NativeBinding::new("updateSprites", vec![], 0, update_sprites),
        NativeBinding::new("drawSprites", vec![], 0, draw_sprites),
        // Queries
        NativeBinding::new("touch", vec![], 1, touch),
        NativeBinding::new(
            "random",
            vec![P::number("max").or(Arg::Number(1.0))],
            1,
            random,
        ),
        NativeBinding::new(
            "rnd",
            vec![P::number("max").or(Arg::Number(1.0))],
            1,
            random,
        ),
        NativeBinding::new("gWidth", vec![], 1, surface_width),
        NativeBinding::new("gHeight", vec![], 1, surface_height),
        NativeBinding::new("getFPS", vec![], 1, fps),
        // Control
        NativeBinding::new("stop", vec![], 0, stop),
    ]
}

fn draw_circle(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.draw(DrawCmd::Circle {
        x: args.number(0),
        y: args.number(1),
        radius: args.number(2),
        segments: 0,
        color: args.color(3),
        fill: Fill::Solid,
    });
    vec![]
}

fn draw_rect(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.draw(DrawCmd::Rect {
        x: args.number(0),
        y: args.number(1),
        width: args.number(2),
        height: args.number(3),
        color: args.color(4),
        fill: Fill::Solid,
    });
    vec![]
}

fn draw_line(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.draw(DrawCmd::Line {
        x1: args.number(0),
        y1: args.number(1),
        x2: args.number(2),
        y2: args.number(3),
        color: args.color(4),
        thickness: args.number(5),
    });
    vec![]
}

fn draw_box(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.draw(DrawCmd::Rect {
        x: args.number(0),
        y: args.number(1),
        width: args.number(2),
        height: args.number(3),
        color: args.color(4),
        fill: Fill::from_outline_flag(args.number(5)),
    });
    vec![]
}

/// Vertex count for `circle`, clamped so a guest cannot size host render work
fn circle_segments(vertices: f64) -> u32 {
    vertices.clamp(0.0, f64::from(MAX_CIRCLE_SEGMENTS)) as u32
}

fn draw_polygon_circle(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.draw(DrawCmd::Circle {
        x: args.number(0),
        y: args.number(1),
        radius: args.number(2),
        segments: circle_segments(args.number(3)),
        color: args.color(4),
        fill: Fill::from_outline_flag(args.number(5)),
    });
    vec![]
}

fn clear(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    ctx.clear();
    vec![]
}

fn set_background_color(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.set_background(args.color(0));
    vec![]
}

fn print_at(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.print_at(args.number(0), args.number(1), args.text(2).to_string());
    vec![]
}

fn load_image(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    let path = args.text(0);
    match ctx.load_texture(path) {
        Some(handle) => vec![Ret::Handle(handle.0)],
        None => {
            warn!(target: "scripting", "loadImage: no preloaded texture for '{}'", path);
            vec![Ret::Nil]
        }
    }
}

fn create_sprite(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![Ret::Handle(ctx.create_sprite().0)]
}

fn set_sprite_image(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    ctx.set_sprite_texture(SpriteHandle(args.handle(0)), TextureHandle(args.handle(1)));
    vec![]
}

fn set_sprite_position(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    if let Some(sprite) = ctx.sprite_mut(SpriteHandle(args.handle(0))) {
        sprite.x = args.number(1);
        sprite.y = args.number(2);
    }
    vec![]
}

fn set_sprite_color(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    if let Some(sprite) = ctx.sprite_mut(SpriteHandle(args.handle(0))) {
        sprite.tint = Color::from_channels(
            args.number(1),
            args.number(2),
            args.number(3),
            Some(args.number(4)),
        );
    }
    vec![]
}

fn set_sprite_speed(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    if let Some(sprite) = ctx.sprite_mut(SpriteHandle(args.handle(0))) {
        let (vx, vy) = args.vec2(1);
        sprite.vx = vx;
        sprite.vy = vy;
    }
    vec![]
}

fn update_sprites(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    ctx.update_sprites();
    vec![]
}

// Sprites are presented by the host from the sprite arena.
fn draw_sprites(_: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![]
}

fn touch(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![Ret::Pointer(ctx.pointer())]
}

fn random(ctx: &mut HostContext, args: &Args) -> Vec<Ret> {
    vec![Ret::Number(ctx.random(args.number(0)))]
}

fn surface_width(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![Ret::Number(ctx.surface_size().0)]
}

fn surface_height(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![Ret::Number(ctx.surface_size().1)]
}

fn fps(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    vec![Ret::Number(ctx.clock().fps())]
}

fn stop(ctx: &mut HostContext, _: &Args) -> Vec<Ret> {
    ctx.request_stop();
    vec![]
}
