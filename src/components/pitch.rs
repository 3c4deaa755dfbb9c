//! Pitch diagram widget: draws a [`RenderOutput`] on a braille canvas.
//!
//! Opacity is emulated by blending each color over the pitch background,
//! since terminal cells have no alpha channel.

use passmap_core::colors::{PITCH_GREEN, Rgb};
use passmap_core::pitch::{PITCH_ALPHA, Point, Shape, arc_points};
use passmap_core::scene::{EventGlyphs, Glyph, bezier_points};
use passmap_core::session::RenderOutput;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::Color;
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Circle, Context, Line, Points, Rectangle};
use tui::widgets::{Block, Widget};

/// Terminal background assumed under the translucent pitch fill.
pub const BACKDROP: Rgb = Rgb(0, 0, 0);
/// Field units of margin around the outline.
const MARGIN: f64 = 3.0;
/// A terminal cell is roughly twice as tall as it is wide.
const CELL_ASPECT: f64 = 2.0;
const ARC_STEPS: usize = 24;
const CURVE_STEPS: usize = 16;
/// Marker sizes are in points; this converts them to field units.
const MARKER_RADIUS_PER_POINT: f64 = 0.06;
/// Arrowhead mutation scale to head length in field units.
const HEAD_LENGTH_PER_POINT: f64 = 0.1;
const HEAD_SPREAD_DEG: f64 = 28.0;

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

pub struct PitchView<'a> {
    pub output: &'a RenderOutput,
    pub block: Option<Block<'a>>,
}

impl<'a> PitchView<'a> {
    pub fn new(output: &'a RenderOutput) -> Self {
        Self { output, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn background(&self) -> Rgb {
        self.output
            .pitch
            .iter()
            .find_map(|shape| match shape {
                Shape::Rect { stroke, .. } if stroke.filled => {
                    Some(stroke.color.blend(BACKDROP, stroke.alpha))
                }
                _ => None,
            })
            .unwrap_or_else(|| PITCH_GREEN.blend(BACKDROP, PITCH_ALPHA))
    }
}

impl Widget for PitchView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width < 4 || inner.height < 2 {
            return;
        }

        let geometry = &self.output.geometry;
        let (x_span, y_span) =
            (geometry.field_width + 2.0 * MARGIN, geometry.field_height + 2.0 * MARGIN);
        let canvas_area = fit_aspect(inner, x_span / y_span);
        let (hx, hy) = (x_span / 2.0, y_span / 2.0);
        let background = self.background();

        Canvas::default()
            .marker(Marker::Braille)
            .background_color(to_color(background))
            .x_bounds([-hx, hx])
            .y_bounds([-hy, hy])
            .paint(|ctx| {
                for shape in &self.output.pitch {
                    draw_shape(ctx, shape, background);
                }
                ctx.layer();
                for event in &self.output.events {
                    for glyph in &event.glyphs {
                        draw_glyph(ctx, glyph, event, background);
                    }
                }
            })
            .render(canvas_area, buf);
    }
}

/// Largest centred sub-rectangle whose on-screen width/height ratio is `ratio`.
pub fn fit_aspect(area: Rect, ratio: f64) -> Rect {
    let width = f64::from(area.width);
    let height = f64::from(area.height) * CELL_ASPECT;
    let (w, h) = if width / height > ratio {
        (height * ratio, height)
    } else {
        (width, width / ratio)
    };
    let w = (w.round() as u16).clamp(1, area.width);
    let h = ((h / CELL_ASPECT).round() as u16).clamp(1, area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn draw_shape(ctx: &mut Context, shape: &Shape, background: Rgb) {
    match *shape {
        // The fill is the canvas background.
        Shape::Rect { stroke, .. } if stroke.filled => {}
        Shape::Rect { origin, width, height, stroke } => ctx.draw(&Rectangle {
            x: origin.x,
            y: origin.y,
            width,
            height,
            color: to_color(stroke.color.blend(background, stroke.alpha)),
        }),
        Shape::Line { from, to, stroke } => {
            draw_line(ctx, from, to, to_color(stroke.color.blend(background, stroke.alpha)))
        }
        Shape::Circle { center, radius, stroke } => {
            let color = to_color(stroke.color.blend(background, stroke.alpha));
            if stroke.filled {
                ctx.draw(&Points { coords: &[(center.x, center.y)], color });
            }
            ctx.draw(&Circle { x: center.x, y: center.y, radius, color });
        }
        Shape::Arc { center, radius, start_deg, end_deg, stroke } => {
            let color = to_color(stroke.color.blend(background, stroke.alpha));
            draw_polyline(ctx, &arc_points(center, radius, start_deg, end_deg, ARC_STEPS), color);
        }
    }
}

fn draw_glyph(ctx: &mut Context, glyph: &Glyph, event: &EventGlyphs, background: Rgb) {
    let color = to_color(event.color.blend(background, event.alpha));
    match *glyph {
        Glyph::Marker { center, size } => {
            ctx.draw(&Points { coords: &[(center.x, center.y)], color });
            ctx.draw(&Circle {
                x: center.x,
                y: center.y,
                radius: size * MARKER_RADIUS_PER_POINT,
                color,
            });
        }
        Glyph::Segment { from, to } => draw_line(ctx, from, to, color),
        Glyph::Curve { from, control, to, head } => {
            let points = bezier_points(from, control, to, CURVE_STEPS);
            draw_polyline(ctx, &points, color);
            // Head follows the tangent at the end of the curve.
            for (a, b) in head_lines(control, to, head * HEAD_LENGTH_PER_POINT) {
                draw_line(ctx, a, b, color);
            }
        }
        Glyph::Arrowhead { tail, tip, alpha } => {
            let color = to_color(event.color.blend(background, alpha));
            for (a, b) in head_lines(tail, tip, 2.0 * tail.distance(tip)) {
                draw_line(ctx, a, b, color);
            }
        }
    }
}

fn draw_line(ctx: &mut Context, from: Point, to: Point, color: Color) {
    ctx.draw(&Line::new(from.x, from.y, to.x, to.y, color));
}

fn draw_polyline(ctx: &mut Context, points: &[Point], color: Color) {
    for pair in points.windows(2) {
        draw_line(ctx, pair[0], pair[1], color);
    }
}

/// The two barbs of an arrowhead at `tip`, pointing away from `from`.
pub fn head_lines(from: Point, tip: Point, length: f64) -> Vec<(Point, Point)> {
    let (dx, dy) = (from.x - tip.x, from.y - tip.y);
    let norm = dx.hypot(dy);
    if norm == 0.0 || !norm.is_finite() || length <= 0.0 {
        return Vec::new();
    }
    let back = dy.atan2(dx);
    [-HEAD_SPREAD_DEG, HEAD_SPREAD_DEG]
        .into_iter()
        .map(|spread| {
            let angle = back + spread.to_radians();
            (tip, Point::new(tip.x + length * angle.cos(), tip.y + length * angle.sin()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use passmap_core::loader::{Encoding, load_bytes};
    use passmap_core::session::{VizState, render};

    fn output(csv: &str) -> RenderOutput {
        let mut state = VizState::default();
        state.load_table(load_bytes(csv.as_bytes(), &[Encoding::Utf8]).unwrap());
        render(&state)
    }

    fn cells_with_fg(buf: &Buffer, color: Color) -> usize {
        let area = buf.area;
        (area.top()..area.bottom())
            .flat_map(|y| (area.left()..area.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| buf[(x, y)].fg == color)
            .count()
    }

    #[test]
    fn fit_aspect_is_centred_and_bounded() {
        // 111 x 74 field units -> 1.5 on screen; a wide area is pillarboxed.
        let area = Rect::new(0, 0, 200, 40);
        let fitted = fit_aspect(area, 1.5);
        assert_eq!(fitted.height, 40);
        assert_eq!(fitted.width, 120);
        assert_eq!(fitted.x, 40);

        let tall = fit_aspect(Rect::new(5, 5, 30, 40), 1.5);
        assert_eq!(tall.width, 30);
        assert_eq!(tall.height, 10);
        assert_eq!(tall.y, 5 + 15);
    }

    #[test]
    fn head_lines_are_symmetric() {
        let lines = head_lines(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0);
        assert_eq!(lines.len(), 2);
        let (a, b) = (lines[0].1, lines[1].1);
        assert!((a.x - b.x).abs() < 1e-9);
        assert!((a.y + b.y).abs() < 1e-9);
        assert!(a.x < 10.0);
        assert!(head_lines(Point::new(1.0, 1.0), Point::new(1.0, 1.0), 2.0).is_empty());
    }

    #[test]
    fn renders_pitch_background_and_events() {
        let out = output("X,Y,X2,Y2,Outcome\n20,15,30,15,Nicht erfolgreich\n");
        let view = PitchView::new(&out);
        let background = view.background();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let event_color = to_color(out.events[0].color.blend(background, out.events[0].alpha));
        assert!(cells_with_fg(&buf, event_color) > 0);
        let line_color = to_color(Rgb(255, 255, 255).blend(background, 1.0));
        assert!(cells_with_fg(&buf, line_color) > 0);

        let fitted = fit_aspect(area, (105.0 + 2.0 * MARGIN) / (68.0 + 2.0 * MARGIN));
        let centre = buf[(fitted.x + fitted.width / 2, fitted.y + 1)].bg;
        assert_eq!(centre, to_color(background));
    }

    #[test]
    fn straight_pass_arrowhead_is_opaque() {
        let out = output("X,Y,X2,Y2\n-40,0,40,0\n");
        let view = PitchView::new(&out);
        let background = view.background();
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        let event = &out.events[0];
        let faded = to_color(event.color.blend(background, event.alpha));
        let opaque = to_color(event.color.blend(background, 1.0));
        assert_ne!(faded, opaque);
        assert!(cells_with_fg(&buf, faded) > 0);
        assert!(cells_with_fg(&buf, opaque) > 0);
    }

    #[test]
    fn tiny_area_draws_nothing() {
        let out = output("X,Y\n0,0\n");
        let area = Rect::new(0, 0, 3, 1);
        let mut buf = Buffer::empty(area);
        PitchView::new(&out).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
