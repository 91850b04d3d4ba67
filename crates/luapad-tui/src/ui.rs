use std::f64::consts::PI;
use std::io;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use luapad_core::{Color as SurfaceColor, DebugText, DrawCmd, Fill, Sprite, MAX_CIRCLE_SEGMENTS};
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Rectangle};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::app::{App, MessageLevel, ScriptSource};
use crate::textures::GlyphTextures;

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(io::stdout());
        let options = ratatui::TerminalOptions {
            viewport: ratatui::Viewport::Fullscreen,
        };
        let terminal = Terminal::with_options(backend, options)?;

        Ok(Self { terminal })
    }

    pub fn draw(&mut self, app: &mut App) -> io::Result<()> {
        self.terminal.draw(|frame| render(frame, app))?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen).ok();
        disable_raw_mode().ok();
    }
}

pub fn try_init_tui() -> io::Result<Tui> {
    Tui::new()
}

fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_surface(frame, chunks[0], app);
    render_messages(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);
}

fn render_surface(frame: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(format!(" {} ", app.source.chunk_name()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    app.set_canvas_area(inner);

    let surface = app.canvas.borrow();
    let (width, height) = luapad_core::RenderSurface::size(&*surface);
    let commands: Vec<&DrawCmd> = surface.commands().collect();
    let sprites = app.sprites();
    let painter = Painter {
        height,
        dot: height / (f64::from(inner.height.max(1)) * 4.0),
    };

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .background_color(to_color(surface.background()))
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for cmd in &commands {
                painter.command(ctx, cmd);
            }
            // Sprites are presented above primitives
            ctx.layer();
            for sprite in &sprites {
                painter.sprite(ctx, sprite, &app.textures);
            }
            if let Some(text) = surface.debug_text() {
                painter.text(ctx, text);
            }
        });

    frame.render_widget(canvas, area);
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let items: Vec<ListItem> = app
        .messages
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|message| {
            let color = match message.level {
                MessageLevel::Info => Color::Green,
                MessageLevel::Error => Color::Red,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}]", message.timestamp.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(message.text.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("Messages ({})", app.messages.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(list, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let status = app
        .manager
        .status()
        .map(|status| status.to_string())
        .unwrap_or_else(|| "no session".to_string());
    let source = match &app.source {
        ScriptSource::File(path) => path.display().to_string(),
        ScriptSource::Demo(name) => format!("demo:{name}"),
    };

    let line = Line::from(vec![
        Span::styled(" luapad ", Style::default().bold().reversed()),
        Span::raw(format!(
            " {source} | {status} | frame {} | {:.0} fps | {} sprites | {} natives ",
            app.manager.frame_time().map_or(0, |frame| frame.frame_index),
            app.manager.fps(),
            app.manager.sprites().len(),
            app.manager.binding_count()
        )),
        Span::styled(
            "r run  s stop  n next demo  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn to_color(color: SurfaceColor) -> Color {
    Color::Rgb(color.red(), color.green(), color.blue())
}

/// Draws surface primitives onto a ratatui canvas.
///
/// Surface coordinates grow downwards; the canvas y axis grows upwards.
struct Painter {
    height: f64,
    /// Surface units per braille dot row
    dot: f64,
}

impl Painter {
    fn flip(&self, y: f64) -> f64 {
        self.height - y
    }

    fn command(&self, ctx: &mut Context, cmd: &DrawCmd) {
        match *cmd {
            DrawCmd::Rect {
                x,
                y,
                width,
                height,
                color,
                fill,
            } => {
                if color.alpha <= 0.0 {
                    return;
                }
                let color = to_color(color);
                match fill {
                    Fill::Outline => ctx.draw(&Rectangle {
                        x,
                        y: self.flip(y + height),
                        width,
                        height,
                        color,
                    }),
                    Fill::Solid => self.scan_fill(ctx, y, y + height, color, |_| Some((x, x + width))),
                }
            }
            DrawCmd::Circle {
                x,
                y,
                radius,
                segments,
                color,
                fill,
            } => {
                if color.alpha <= 0.0 {
                    return;
                }
                let color = to_color(color);
                if segments >= 3 {
                    self.polygon(ctx, x, y, radius, segments, color, fill);
                } else if fill == Fill::Outline {
                    ctx.draw(&Circle {
                        x,
                        y: self.flip(y),
                        radius,
                        color,
                    });
                } else {
                    self.scan_fill(ctx, y - radius, y + radius, color, |row| {
                        let dy = row - y;
                        let half = (radius * radius - dy * dy).max(0.0).sqrt();
                        Some((x - half, x + half))
                    });
                }
            }
            DrawCmd::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                thickness,
            } => {
                if color.alpha <= 0.0 {
                    return;
                }
                self.thick_line(ctx, (x1, y1), (x2, y2), thickness, to_color(color));
            }
        }
    }

    fn sprite(&self, ctx: &mut Context, sprite: &Sprite, textures: &GlyphTextures) {
        if sprite.tint.alpha <= 0.0 {
            return;
        }
        let glyph = textures.glyph(sprite.texture.as_ref().map(|t| t.id));
        ctx.print(
            sprite.x,
            self.flip(sprite.y),
            Span::styled(glyph.to_string(), Style::default().fg(to_color(sprite.tint))),
        );
    }

    fn text(&self, ctx: &mut Context, text: &DebugText) {
        ctx.print(
            text.x,
            self.flip(text.y),
            Span::styled(text.text.clone(), Style::default().fg(Color::White)),
        );
    }

    fn line(&self, ctx: &mut Context, from: (f64, f64), to: (f64, f64), color: Color) {
        ctx.draw(&CanvasLine {
            x1: from.0,
            y1: self.flip(from.1),
            x2: to.0,
            y2: self.flip(to.1),
            color,
        });
    }

    fn thick_line(
        &self,
        ctx: &mut Context,
        from: (f64, f64),
        to: (f64, f64),
        thickness: f64,
        color: Color,
    ) {
        let strokes = self.stroke_count(thickness);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let length = (dx * dx + dy * dy).sqrt();
        if strokes == 1 || length == 0.0 {
            self.line(ctx, from, to, color);
            return;
        }

        // Offset parallel strokes along the unit normal
        let (nx, ny) = (-dy / length, dx / length);
        for i in 0..strokes {
            let offset = (f64::from(i) - f64::from(strokes - 1) / 2.0) * self.dot;
            self.line(
                ctx,
                (from.0 + nx * offset, from.1 + ny * offset),
                (to.0 + nx * offset, to.1 + ny * offset),
                color,
            );
        }
    }

    /// Parallel strokes needed for `thickness`, never more than span the surface
    fn stroke_count(&self, thickness: f64) -> u32 {
        let most = (self.height / self.dot).ceil().max(1.0);
        (thickness / self.dot).round().max(1.0).min(most) as u32
    }

    #[allow(clippy::too_many_arguments)]
    fn polygon(
        &self,
        ctx: &mut Context,
        x: f64,
        y: f64,
        radius: f64,
        segments: u32,
        color: Color,
        fill: Fill,
    ) {
        let segments = segments.min(MAX_CIRCLE_SEGMENTS);
        let vertices: Vec<(f64, f64)> = (0..segments)
            .map(|i| {
                let angle = f64::from(i) / f64::from(segments) * 2.0 * PI - PI / 2.0;
                (x + angle.cos() * radius, y + angle.sin() * radius)
            })
            .collect();
        let edges = || {
            vertices
                .iter()
                .zip(vertices.iter().cycle().skip(1))
                .map(|(a, b)| (*a, *b))
        };

        if fill == Fill::Outline {
            for (a, b) in edges() {
                self.line(ctx, a, b, color);
            }
            return;
        }

        // The polygon is convex, so each scan row crosses it in one span
        self.scan_fill(ctx, y - radius, y + radius, color, |row| {
            let crossings = edges().filter_map(|((ax, ay), (bx, by))| {
                let (low, high) = if ay <= by { (ay, by) } else { (by, ay) };
                if row < low || row > high || ay == by {
                    return None;
                }
                Some(ax + (row - ay) / (by - ay) * (bx - ax))
            });
            crossings.fold(None, |span: Option<(f64, f64)>, cx| match span {
                None => Some((cx, cx)),
                Some((left, right)) => Some((left.min(cx), right.max(cx))),
            })
        });
    }

    /// Fill rows from `top` to `bottom` one dot apart with the span returned per row
    fn scan_fill(
        &self,
        ctx: &mut Context,
        top: f64,
        bottom: f64,
        color: Color,
        span: impl Fn(f64) -> Option<(f64, f64)>,
    ) {
        // Rows outside the surface are never visible
        let (top, bottom) = (top.max(0.0), bottom.min(self.height));
        if !(self.dot > 0.0) || bottom < top {
            return;
        }
        let mut row = top;
        while row <= bottom {
            if let Some((left, right)) = span(row) {
                self.line(ctx, (left, row), (right, row), color);
            }
            row += self.dot;
        }
    }
}
