//! Annotation shape schema
//!
//! The serialized form of these types is the annotation snapshot stored on
//! a page. The reducer treats the snapshot as an opaque string; only the
//! annotation session interprets it. Coordinates are surface-local with the
//! origin at the top-left, y increasing downward.

/// Unique identifier for a shape, stable across snapshot round trips
pub type ShapeId = uuid::Uuid;

/// Surface-local coordinate
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    /// Default markup stroke (#ef4444)
    pub const MARKUP_RED: Color = Color { r: 239, g: 68, b: 68, a: 255 };
}

/// Default stroke width for new shapes, in surface units
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;

/// Default font size for new text shapes
pub const DEFAULT_FONT_SIZE: f32 = 20.0;

/// Default width of a new text box
pub const DEFAULT_TEXT_WIDTH: f32 = 200.0;

/// Length of the triangular arrow head, in surface units
pub const ARROW_HEAD_LENGTH: f32 = 15.0;

/// Visual styling for a shape
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeStyle {
    /// Stroke color for lines and outlines
    pub stroke_color: Color,

    /// Stroke width in surface units
    pub stroke_width: f32,

    /// Fill color for closed shapes (`None` for no fill)
    pub fill_color: Option<Color>,

    /// Line dash pattern (empty for solid line)
    #[serde(default)]
    pub dash_pattern: Vec<f32>,

    /// Opacity, 0.0 transparent to 1.0 opaque
    pub opacity: f32,

    /// Font size for text shapes
    pub font_size: f32,
}

impl ShapeStyle {
    /// Default markup style: red stroke, no fill
    pub fn new() -> Self {
        Self {
            stroke_color: Color::MARKUP_RED,
            stroke_width: DEFAULT_STROKE_WIDTH,
            fill_color: None,
            dash_pattern: Vec::new(),
            opacity: 1.0,
            font_size: DEFAULT_FONT_SIZE,
        }
    }

    /// Default style for text shapes: black fill, no stroke
    pub fn text() -> Self {
        Self {
            stroke_color: Color::BLACK,
            stroke_width: 0.0,
            fill_color: Some(Color::BLACK),
            dash_pattern: Vec::new(),
            opacity: 1.0,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape geometry
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeGeometry {
    /// Rectangle defined by two corners
    Rectangle { top_left: Point, bottom_right: Point },

    /// Circle defined by center and radius
    Circle { center: Point, radius: f32 },

    /// Line segment
    Line { start: Point, end: Point },

    /// Line segment with a triangular head at the end point
    Arrow { start: Point, end: Point },

    /// Text box anchored at a position
    Text { position: Point, width: f32 },
}

impl ShapeGeometry {
    /// Bounding box as `(min_x, min_y, max_x, max_y)`
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        match self {
            ShapeGeometry::Rectangle {
                top_left,
                bottom_right,
            } => (top_left.x, top_left.y, bottom_right.x, bottom_right.y),
            ShapeGeometry::Circle { center, radius } => (
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            ShapeGeometry::Line { start, end } | ShapeGeometry::Arrow { start, end } => (
                start.x.min(end.x),
                start.y.min(end.y),
                start.x.max(end.x),
                start.y.max(end.y),
            ),
            ShapeGeometry::Text { position, width } => (
                position.x,
                position.y,
                position.x + width,
                // Box height is resolved by the renderer; a line's worth is
                // enough for hit testing.
                position.y + DEFAULT_FONT_SIZE * 1.5,
            ),
        }
    }

    /// Top-left anchor used for moving the shape
    pub fn position(&self) -> Point {
        let (min_x, min_y, _, _) = self.bounding_box();
        Point::new(min_x, min_y)
    }

    /// Return this geometry translated so its anchor lands on `to`
    pub fn moved_to(&self, to: Point) -> Self {
        let from = self.position();
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let shift = |p: &Point| Point::new(p.x + dx, p.y + dy);
        match self {
            ShapeGeometry::Rectangle {
                top_left,
                bottom_right,
            } => ShapeGeometry::Rectangle {
                top_left: shift(top_left),
                bottom_right: shift(bottom_right),
            },
            ShapeGeometry::Circle { center, radius } => ShapeGeometry::Circle {
                center: shift(center),
                radius: *radius,
            },
            ShapeGeometry::Line { start, end } => ShapeGeometry::Line {
                start: shift(start),
                end: shift(end),
            },
            ShapeGeometry::Arrow { start, end } => ShapeGeometry::Arrow {
                start: shift(start),
                end: shift(end),
            },
            ShapeGeometry::Text { position, width } => ShapeGeometry::Text {
                position: shift(position),
                width: *width,
            },
        }
    }

    /// Check if a point is near this geometry, within tolerance
    pub fn contains_point(&self, point: &Point, tolerance: f32) -> bool {
        match self {
            ShapeGeometry::Line { start, end } | ShapeGeometry::Arrow { start, end } => {
                point_near_segment(point, start, end, tolerance)
            }
            ShapeGeometry::Circle { center, radius } => {
                point.distance_to(center) <= radius + tolerance
            }
            ShapeGeometry::Rectangle { .. } | ShapeGeometry::Text { .. } => {
                let (min_x, min_y, max_x, max_y) = self.bounding_box();
                point.x >= min_x - tolerance
                    && point.x <= max_x + tolerance
                    && point.y >= min_y - tolerance
                    && point.y <= max_y + tolerance
            }
        }
    }
}

fn point_near_segment(point: &Point, start: &Point, end: &Point, tolerance: f32) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq < 1e-6 {
        return point.distance_to(start) <= tolerance;
    }
    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}

/// Triangular arrow head for a segment, pointing at `end`
///
/// Vertices are the tip followed by the two base corners, computed from the
/// segment's angle.
pub fn arrow_head(start: Point, end: Point, head_length: f32) -> [Point; 3] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let spread = std::f32::consts::FRAC_PI_6;
    let wing = |offset: f32| {
        Point::new(
            end.x - head_length * (angle + offset).cos(),
            end.y - head_length * (angle + offset).sin(),
        )
    };
    [end, wing(spread), wing(-spread)]
}

/// One user-drawn shape
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    /// Stable unique identifier
    pub id: ShapeId,

    pub geometry: ShapeGeometry,

    pub style: ShapeStyle,

    /// Text content, only meaningful for text geometry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Shape {
    /// Create a shape with a fresh id
    pub fn new(geometry: ShapeGeometry, style: ShapeStyle) -> Self {
        Self {
            id: ShapeId::new_v4(),
            geometry,
            style,
            text: None,
        }
    }

    /// Whether this shape is a text box
    pub fn is_text(&self) -> bool {
        matches!(self.geometry, ShapeGeometry::Text { .. })
    }
}

/// The full shape set for one page
///
/// Serialized as the page's annotation snapshot.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ShapeSet {
    pub shapes: Vec<Shape>,
}

impl ShapeSet {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Serialize to the snapshot wire format
    pub fn to_json(&self) -> String {
        // Serialization of plain data cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a stored snapshot
    ///
    /// Corrupt data degrades to an empty shape set instead of propagating;
    /// it must never take the drawing surface down.
    pub fn parse(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(%err, "malformed annotation snapshot, starting empty");
                Self::default()
            }
        }
    }
}
