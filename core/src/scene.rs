use crate::colors::{ColorLabels, ColorMapping, Rgb, resolve_color};
use crate::pitch::Point;
use crate::{COL_X, COL_X2, COL_Y, COL_Y2, EventTable};
use serde::{Deserialize, Serialize};

/// Opacity of event markers and lines.
pub const EVENT_ALPHA: f64 = 0.4;
/// Curvature of high passes (control point offset as a fraction of length).
pub const HIGH_PASS_CURVATURE: f64 = 0.3;
/// Position of the midpoint arrowhead along a straight pass.
pub const ARROW_POSITION: f64 = 0.5;
/// The midpoint arrowhead is drawn fully opaque over its faded line.
pub const ARROWHEAD_ALPHA: f64 = 1.0;

/// Which columns carry the height, outcome and pressure attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventColumns {
    pub height: String,
    pub outcome: String,
    pub pressure: String,
}

impl Default for EventColumns {
    fn default() -> Self {
        Self {
            height: "Passhöhe".to_string(),
            outcome: "Outcome".to_string(),
            pressure: "Gegnerdruck".to_string(),
        }
    }
}

/// Marker and arrow sizes. All scale together so the start marker stays
/// smallest and the arrowhead mutation scale largest. Terminal cells have no
/// stroke width, so line widths are not carried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphSizes {
    pub start_marker: f64,
    pub end_marker: f64,
    pub arrow_mutation: f64,
    /// Half-length of the midpoint arrowhead on straight passes.
    pub arrow_length: f64,
}

impl GlyphSizes {
    pub fn responsive(field_width: f64) -> Self {
        Self {
            start_marker: field_width * 0.067,
            end_marker: field_width * 0.105,
            arrow_mutation: field_width * 0.162,
            arrow_length: field_width * 0.005,
        }
    }

    pub fn fixed() -> Self {
        Self {
            start_marker: 7.0,
            end_marker: 11.0,
            arrow_mutation: 17.0,
            arrow_length: 0.5,
        }
    }

    pub fn for_mode(responsive: bool, field_width: f64) -> Self {
        if responsive { Self::responsive(field_width) } else { Self::fixed() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Glyph {
    Marker { center: Point, size: f64 },
    Segment { from: Point, to: Point },
    /// Quadratic Bézier with a filled arrowhead at `to`.
    Curve { from: Point, control: Point, to: Point, head: f64 },
    /// Open arrowhead pointing from `tail` to `tip`. Carries its own opacity
    /// instead of the event's.
    Arrowhead { tail: Point, tip: Point, alpha: f64 },
}

/// Everything drawn for one surviving event row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventGlyphs {
    pub row: usize,
    pub color: Rgb,
    pub alpha: f64,
    pub glyphs: Vec<Glyph>,
}

impl EventGlyphs {
    pub fn markers(&self) -> usize {
        self.glyphs.iter().filter(|g| matches!(g, Glyph::Marker { .. })).count()
    }

    pub fn has_connector(&self) -> bool {
        self.glyphs
            .iter()
            .any(|g| matches!(g, Glyph::Segment { .. } | Glyph::Curve { .. }))
    }
}

/// Inputs shared by every event in one render pass.
pub struct SceneContext<'a> {
    pub columns: &'a EventColumns,
    pub labels: &'a ColorLabels,
    pub mapping: &'a ColorMapping,
    pub sizes: GlyphSizes,
}

fn contains_keyword(text: Option<&str>, keyword: &str) -> bool {
    match text {
        Some(text) if !keyword.is_empty() => text.to_lowercase().contains(&keyword.to_lowercase()),
        _ => false,
    }
}

pub fn is_failure(table: &EventTable, row: usize, ctx: &SceneContext) -> bool {
    contains_keyword(table.text(row, &ctx.columns.outcome), &ctx.labels.failure_keyword)
}

pub fn is_high_pass(table: &EventTable, row: usize, ctx: &SceneContext) -> bool {
    contains_keyword(table.text(row, &ctx.columns.height), &ctx.labels.high_keyword)
}

pub fn event_color(table: &EventTable, row: usize, ctx: &SceneContext) -> Rgb {
    let mapped = ctx
        .mapping
        .column
        .as_deref()
        .and_then(|col| table.column_index(col))
        .and_then(|idx| ctx.mapping.get(table.value(row, idx)));
    resolve_color(is_failure(table, row, ctx), is_high_pass(table, row, ctx), mapped)
}

/// Control point of a curved pass, bending to the right of travel for a
/// positive `rad`.
pub fn curve_control(from: Point, to: Point, rad: f64) -> Point {
    let mid = from.lerp(to, 0.5);
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    Point::new(mid.x + rad * dy, mid.y - rad * dx)
}

pub fn bezier_points(from: Point, control: Point, to: Point, steps: usize) -> Vec<Point> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let a = from.lerp(control, t);
            let b = control.lerp(to, t);
            a.lerp(b, t)
        })
        .collect()
}

/// Short arrowhead centred on `at`, aligned with the pass direction.
pub fn midpoint_arrow(from: Point, to: Point, half_length: f64) -> Option<(Point, Point)> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let length = dx.hypot(dy);
    if length == 0.0 || !length.is_finite() {
        return None;
    }
    let (ux, uy) = (dx / length, dy / length);
    let at = from.lerp(to, ARROW_POSITION);
    Some((
        Point::new(at.x - ux * half_length, at.y - uy * half_length),
        Point::new(at.x + ux * half_length, at.y + uy * half_length),
    ))
}

fn event_glyphs(table: &EventTable, row: usize, ctx: &SceneContext) -> Option<EventGlyphs> {
    let start = Point::new(table.number(row, COL_X)?, table.number(row, COL_Y)?);
    let color = event_color(table, row, ctx);
    let sizes = ctx.sizes;
    let mut glyphs = vec![Glyph::Marker { center: start, size: sizes.start_marker }];

    let end = table
        .number(row, COL_X2)
        .zip(table.number(row, COL_Y2))
        .map(|(x, y)| Point::new(x, y));

    match end {
        Some(end) => {
            if is_high_pass(table, row, ctx) {
                glyphs.push(Glyph::Curve {
                    from: start,
                    control: curve_control(start, end, HIGH_PASS_CURVATURE),
                    to: end,
                    head: sizes.arrow_mutation,
                });
            } else {
                glyphs.push(Glyph::Segment { from: start, to: end });
                if let Some((tail, tip)) = midpoint_arrow(start, end, sizes.arrow_length) {
                    glyphs.push(Glyph::Arrowhead { tail, tip, alpha: ARROWHEAD_ALPHA });
                }
            }
            glyphs.push(Glyph::Marker { center: end, size: sizes.end_marker });
        }
        None => {
            // A shot or other static event: one larger marker only.
            glyphs[0] = Glyph::Marker { center: start, size: sizes.end_marker };
        }
    }

    Some(EventGlyphs { row, color, alpha: EVENT_ALPHA, glyphs })
}

/// Glyphs for the given rows, in the given order. Rows without a usable start
/// coordinate are skipped.
pub fn build_event_glyphs(
    table: &EventTable,
    rows: &[usize],
    ctx: &SceneContext,
) -> Vec<EventGlyphs> {
    rows.iter()
        .filter_map(|&row| event_glyphs(table, row, ctx))
        .collect()
}
