//! Pitch markings in a frame centred on the kick-off spot.
//!
//! X runs along the length of the pitch (`-width/2 ..= width/2`), Y across it
//! (`-height/2 ..= height/2`). All markings are emitted as backend-neutral
//! [`Shape`]s so the terminal canvas and the tests see the same geometry.

use crate::colors::{PITCH_GREEN, Rgb, WHITE};

pub const DEFAULT_FIELD_WIDTH: f64 = 105.0;
pub const DEFAULT_FIELD_HEIGHT: f64 = 68.0;

pub const PITCH_ALPHA: f64 = 0.3;
pub const HALFWAY_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub alpha: f64,
    pub filled: bool,
}

impl Stroke {
    const fn line(color: Rgb, alpha: f64) -> Self {
        Self { color, alpha, filled: false }
    }

    const fn fill(color: Rgb, alpha: f64) -> Self {
        Self { color, alpha, filled: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle anchored at its lower-left corner.
    Rect { origin: Point, width: f64, height: f64, stroke: Stroke },
    Line { from: Point, to: Point, stroke: Stroke },
    Circle { center: Point, radius: f64, stroke: Stroke },
    /// Circular arc from `start_deg` to `end_deg`, counter-clockwise from +X.
    Arc { center: Point, radius: f64, start_deg: f64, end_deg: f64, stroke: Stroke },
}

/// Dimensions of every marking, all in field units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchGeometry {
    pub field_width: f64,
    pub field_height: f64,
    pub center_circle_radius: f64,
    pub penalty_area_width: f64,
    pub penalty_area_height: f64,
    /// Distance from the goal line to the penalty spot.
    pub penalty_spot_distance: f64,
    pub penalty_arc_radius: f64,
    pub goal_area_width: f64,
    pub goal_area_height: f64,
    pub spot_radius: f64,
}

impl Default for PitchGeometry {
    fn default() -> Self {
        Self::relative(DEFAULT_FIELD_WIDTH, DEFAULT_FIELD_HEIGHT)
    }
}

impl PitchGeometry {
    /// Regulation markings in metres, independent of the field size.
    pub fn absolute(field_width: f64, field_height: f64) -> Self {
        Self {
            field_width,
            field_height,
            center_circle_radius: 9.15,
            penalty_area_width: 16.5,
            penalty_area_height: 40.32,
            penalty_spot_distance: 11.0,
            penalty_arc_radius: 9.15,
            goal_area_width: 5.5,
            goal_area_height: 18.32,
            spot_radius: 0.3,
        }
    }

    /// Markings as fractions of the field, so the diagram stays consistent at
    /// any field size.
    pub fn relative(field_width: f64, field_height: f64) -> Self {
        Self {
            field_width,
            field_height,
            center_circle_radius: field_width * 0.095,
            penalty_area_width: field_width * 0.157,
            penalty_area_height: field_height * 0.593,
            penalty_spot_distance: field_width * 0.105,
            penalty_arc_radius: field_width * 0.087,
            goal_area_width: field_width * 0.057,
            goal_area_height: field_height * 0.294,
            spot_radius: field_width * 0.003,
        }
    }

    pub fn for_mode(responsive: bool, field_width: f64, field_height: f64) -> Self {
        if responsive {
            Self::relative(field_width, field_height)
        } else {
            Self::absolute(field_width, field_height)
        }
    }

    pub fn half_width(&self) -> f64 {
        self.field_width / 2.0
    }

    pub fn half_height(&self) -> f64 {
        self.field_height / 2.0
    }

    pub fn left_penalty_spot(&self) -> Point {
        Point::new(-self.half_width() + self.penalty_spot_distance, 0.0)
    }

    pub fn right_penalty_spot(&self) -> Point {
        Point::new(self.half_width() - self.penalty_spot_distance, 0.0)
    }

    /// Half-angle (degrees) of the visible penalty arc: where the circle
    /// around the spot crosses the penalty area's inner edge.
    ///
    /// `None` when the circle stays inside the area.
    pub fn penalty_arc_half_angle(&self) -> Option<f64> {
        let x_intersect = -self.half_width() + self.penalty_area_width;
        let dx = x_intersect - self.left_penalty_spot().x;
        let ratio = dx / self.penalty_arc_radius;
        if !(-1.0..1.0).contains(&ratio) {
            return None;
        }
        Some(ratio.acos().to_degrees())
    }

    /// Visible arc spans `(start, end)` in degrees: left spot first.
    pub fn penalty_arc_spans(&self) -> Option<[(f64, f64); 2]> {
        let angle = self.penalty_arc_half_angle()?;
        Some([(-angle, angle), (180.0 - angle, 180.0 + angle)])
    }
}

/// Every pitch marking, back to front.
pub fn pitch_shapes(geometry: &PitchGeometry) -> Vec<Shape> {
    let g = geometry;
    let (hw, hh) = (g.half_width(), g.half_height());
    let marking = Stroke::line(WHITE, 1.0);
    let spot = Stroke::fill(WHITE, 1.0);
    let mut shapes = Vec::with_capacity(14);

    shapes.push(Shape::Rect {
        origin: Point::new(-hw, -hh),
        width: g.field_width,
        height: g.field_height,
        stroke: Stroke::fill(PITCH_GREEN, PITCH_ALPHA),
    });
    shapes.push(Shape::Rect {
        origin: Point::new(-hw, -hh),
        width: g.field_width,
        height: g.field_height,
        stroke: marking,
    });

    shapes.push(Shape::Line {
        from: Point::new(0.0, -hh),
        to: Point::new(0.0, hh),
        stroke: Stroke::line(WHITE, HALFWAY_ALPHA),
    });

    shapes.push(Shape::Circle {
        center: Point::new(0.0, 0.0),
        radius: g.center_circle_radius,
        stroke: marking,
    });

    let area_y = -g.penalty_area_height / 2.0;
    for x in [-hw, hw - g.penalty_area_width] {
        shapes.push(Shape::Rect {
            origin: Point::new(x, area_y),
            width: g.penalty_area_width,
            height: g.penalty_area_height,
            stroke: marking,
        });
    }

    if let Some([left, right]) = g.penalty_arc_spans() {
        for (center, (start_deg, end_deg)) in
            [(g.left_penalty_spot(), left), (g.right_penalty_spot(), right)]
        {
            shapes.push(Shape::Arc {
                center,
                radius: g.penalty_arc_radius,
                start_deg,
                end_deg,
                stroke: marking,
            });
        }
    }

    let goal_y = -g.goal_area_height / 2.0;
    for x in [-hw, hw - g.goal_area_width] {
        shapes.push(Shape::Rect {
            origin: Point::new(x, goal_y),
            width: g.goal_area_width,
            height: g.goal_area_height,
            stroke: marking,
        });
    }

    for center in [g.left_penalty_spot(), g.right_penalty_spot(), Point::new(0.0, 0.0)] {
        shapes.push(Shape::Circle { center, radius: g.spot_radius, stroke: spot });
    }

    shapes
}

/// Sample points along an arc, inclusive of both ends.
pub fn arc_points(center: Point, radius: f64, start_deg: f64, end_deg: f64, steps: usize) -> Vec<Point> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let deg = start_deg + (end_deg - start_deg) * i as f64 / steps as f64;
            let rad = deg.to_radians();
            Point::new(center.x + radius * rad.cos(), center.y + radius * rad.sin())
        })
        .collect()
}
