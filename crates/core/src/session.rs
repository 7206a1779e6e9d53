//! Annotation tool state machine
//!
//! One `AnnotationSession` exists per page while it is in edit mode. The
//! session owns the authoritative shape set, the active tool, the
//! in-progress draw gesture and the debounced persistence deadline; the
//! drawing surface is a rendering target only. Pointer events drive the
//! `Idle`/`Drawing` gesture states; every settled edit is serialized back
//! to the document reducer through the host.

use std::time::{Duration, Instant};

use crate::page::PageId;
use crate::shape::{
    Color, Point, Shape, ShapeGeometry, ShapeId, ShapeSet, ShapeStyle, DEFAULT_TEXT_WIDTH,
};

/// Movement below this produces no live preview (treated as "no drag yet")
pub const DRAG_PREVIEW_THRESHOLD: f32 = 2.0;

/// Gestures shorter than this commit nothing: a tap is not a draw
pub const MIN_COMMIT_DISTANCE: f32 = 4.0;

/// Quiet period before a structural change is serialized back to the
/// document, restarted on every new event
pub const DEBOUNCE_SAVE: Duration = Duration::from_millis(300);

/// Default grid spacing for snap mode, in surface units
pub const DEFAULT_GRID_SIZE: f32 = 10.0;

/// Active drawing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Text,
    Arrow,
    Rectangle,
    Circle,
    Line,
}

/// Draw gesture state
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drawing { origin: Point },
}

/// Properties of the selected shape, mirrored for the property panel
///
/// `font_size` is present only when the selected shape is text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertySnapshot {
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub fill_color: Option<Color>,
    pub opacity: f32,
    pub font_size: Option<f32>,
}

/// Ephemeral annotation editing state for one page
#[derive(Debug)]
pub struct AnnotationSession {
    page_id: PageId,
    tool: Tool,
    shapes: ShapeSet,
    selected: Option<ShapeId>,
    gesture: Gesture,
    preview: Option<Shape>,
    grid_snap: bool,
    grid_size: f32,
    flush_at: Option<Instant>,
}

impl AnnotationSession {
    /// Start a session from a page's stored snapshot
    ///
    /// Malformed stored data degrades to an empty shape set.
    pub fn new(page_id: PageId, stored: Option<&str>) -> Self {
        Self {
            page_id,
            tool: Tool::Select,
            shapes: stored.map(ShapeSet::parse).unwrap_or_default(),
            selected: None,
            gesture: Gesture::Idle,
            preview: None,
            grid_snap: false,
            grid_size: DEFAULT_GRID_SIZE,
            flush_at: None,
        }
    }

    /// The page being edited
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Current tool
    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// The authoritative shape set
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes.shapes
    }

    /// The live preview shape, if a drag is in progress
    pub fn preview(&self) -> Option<&Shape> {
        self.preview.as_ref()
    }

    /// Id of the selected shape
    pub fn selected_id(&self) -> Option<ShapeId> {
        self.selected
    }

    /// Whether a draw gesture is in progress
    pub fn is_drawing(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing { .. })
    }

    /// Whether the surface should allow per-object interaction and
    /// marquee selection
    ///
    /// Disabled while a drawing tool is armed.
    pub fn object_interaction_enabled(&self) -> bool {
        self.tool == Tool::Select
    }

    /// Switch the active tool
    ///
    /// Arming a drawing tool discards the active selection.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        if tool != Tool::Select {
            self.selected = None;
        }
    }

    /// Configure grid snap mode
    pub fn set_grid(&mut self, snap: bool, size: f32) {
        self.grid_snap = snap;
        if size > 0.0 {
            self.grid_size = size;
        }
    }

    /// Pointer pressed on the surface
    ///
    /// Starts a draw gesture when a drawing tool is armed; with the select
    /// tool the surface handles selection itself.
    pub fn pointer_down(&mut self, at: Point) {
        if self.tool != Tool::Select {
            self.gesture = Gesture::Drawing { origin: at };
        }
    }

    /// Pointer moved while pressed
    ///
    /// Rebuilds the preview shape from the gesture's bounding delta, or
    /// clears it while the drag is still below the preview threshold.
    pub fn pointer_move(&mut self, at: Point) {
        let Gesture::Drawing { origin } = self.gesture else {
            return;
        };
        self.preview = if origin.distance_to(&at) < DRAG_PREVIEW_THRESHOLD {
            None
        } else {
            make_shape(self.tool, origin, at).map(|mut shape| {
                if self.tool == Tool::Text {
                    // Text previews as a dashed placeholder box.
                    shape.geometry = placeholder_box(&shape.geometry);
                    shape.style.dash_pattern = vec![5.0, 5.0];
                    shape.style.fill_color = None;
                    shape.style.stroke_width = 1.0;
                }
                shape
            })
        };
    }

    /// Pointer released: settle the gesture
    ///
    /// Commits a shape when the total displacement clears the commit
    /// threshold; the committed shape becomes the active selection.
    pub fn pointer_up(&mut self, at: Point, now: Instant) -> Option<ShapeId> {
        let Gesture::Drawing { origin } = self.gesture else {
            return None;
        };
        self.gesture = Gesture::Idle;
        self.preview = None;

        if origin.distance_to(&at) < MIN_COMMIT_DISTANCE {
            return None;
        }
        let shape = make_shape(self.tool, origin, at)?;
        let id = shape.id;
        self.shapes.shapes.push(shape);
        self.selected = Some(id);
        self.mark_dirty(now);
        Some(id)
    }

    /// Abandon an in-progress draw without committing (Escape path)
    pub fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.preview = None;
    }

    /// Change the active selection
    ///
    /// Unknown ids clear the selection.
    pub fn select(&mut self, id: Option<ShapeId>) {
        self.selected = id.filter(|id| self.shapes.shapes.iter().any(|s| s.id == *id));
    }

    /// Topmost shape at a point, for surface hit testing
    pub fn shape_at(&self, point: Point, tolerance: f32) -> Option<ShapeId> {
        self.shapes
            .shapes
            .iter()
            .rev()
            .find(|s| s.geometry.contains_point(&point, tolerance))
            .map(|s| s.id)
    }

    /// Property snapshot of the selected shape, `None` when nothing is
    /// selected
    pub fn selection_properties(&self) -> Option<PropertySnapshot> {
        let shape = self.selected_shape()?;
        Some(PropertySnapshot {
            stroke_color: shape.style.stroke_color,
            stroke_width: shape.style.stroke_width,
            fill_color: shape.style.fill_color,
            opacity: shape.style.opacity,
            font_size: shape.is_text().then_some(shape.style.font_size),
        })
    }

    /// Write edited properties back onto the live selected shape
    pub fn apply_properties(&mut self, properties: PropertySnapshot, now: Instant) {
        let Some(shape) = self.selected_shape_mut() else {
            return;
        };
        shape.style.stroke_color = properties.stroke_color;
        shape.style.stroke_width = properties.stroke_width;
        shape.style.fill_color = properties.fill_color;
        shape.style.opacity = properties.opacity;
        if shape.is_text() {
            if let Some(font_size) = properties.font_size {
                shape.style.font_size = font_size;
            }
        }
        self.mark_dirty(now);
    }

    /// Replace the selected text shape's content
    pub fn set_selected_text(&mut self, text: impl Into<String>, now: Instant) {
        let Some(shape) = self.selected_shape_mut() else {
            return;
        };
        if !shape.is_text() {
            return;
        }
        shape.text = Some(text.into());
        self.mark_dirty(now);
    }

    /// Move the selected shape so its anchor lands on `to`
    ///
    /// With grid snap enabled the target is rounded to the nearest grid
    /// multiple first.
    pub fn move_selected(&mut self, to: Point, now: Instant) {
        let snapped = if self.grid_snap {
            let g = self.grid_size;
            Point::new((to.x / g).round() * g, (to.y / g).round() * g)
        } else {
            to
        };
        let Some(shape) = self.selected_shape_mut() else {
            return;
        };
        shape.geometry = shape.geometry.moved_to(snapped);
        self.mark_dirty(now);
    }

    /// Remove the selected shape
    pub fn delete_selected(&mut self, now: Instant) -> bool {
        let Some(id) = self.selected.take() else {
            return false;
        };
        self.shapes.shapes.retain(|s| s.id != id);
        self.mark_dirty(now);
        true
    }

    /// Whether a serialization is pending
    pub fn has_pending_save(&self) -> bool {
        self.flush_at.is_some()
    }

    /// Yield the serialized shape set once input has paused long enough
    ///
    /// Returns `None` while the debounce window is still open.
    pub fn take_snapshot_if_due(&mut self, now: Instant) -> Option<String> {
        if self.flush_at? > now {
            return None;
        }
        self.flush_at = None;
        Some(self.shapes.to_json())
    }

    /// Yield the serialized shape set immediately if anything is pending
    ///
    /// Used on edit-mode exit so no settled edit is lost to the debounce.
    pub fn flush(&mut self) -> Option<String> {
        self.flush_at.take().map(|_| self.shapes.to_json())
    }

    fn mark_dirty(&mut self, now: Instant) {
        self.flush_at = Some(now + DEBOUNCE_SAVE);
    }

    fn selected_shape(&self) -> Option<&Shape> {
        let id = self.selected?;
        self.shapes.shapes.iter().find(|s| s.id == id)
    }

    fn selected_shape_mut(&mut self) -> Option<&mut Shape> {
        let id = self.selected?;
        self.shapes.shapes.iter_mut().find(|s| s.id == id)
    }
}

/// Build the shape for a settled (or previewed) gesture
///
/// Rectangle and circle are bounded by the delta box, the circle inscribed
/// in it; line and arrow run point-to-point; text anchors at the box's
/// top-left. Returns `None` for the select tool.
fn make_shape(tool: Tool, origin: Point, current: Point) -> Option<Shape> {
    let min = Point::new(origin.x.min(current.x), origin.y.min(current.y));
    let max = Point::new(origin.x.max(current.x), origin.y.max(current.y));
    let geometry = match tool {
        Tool::Select => return None,
        Tool::Rectangle => ShapeGeometry::Rectangle {
            top_left: min,
            bottom_right: max,
        },
        Tool::Circle => ShapeGeometry::Circle {
            center: Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
            // A degenerate (straight-line) drag would inscribe a zero
            // radius; floor it so a committed circle is always visible.
            radius: ((max.x - min.x).min(max.y - min.y) / 2.0).max(MIN_COMMIT_DISTANCE / 2.0),
        },
        Tool::Line => ShapeGeometry::Line {
            start: origin,
            end: current,
        },
        Tool::Arrow => ShapeGeometry::Arrow {
            start: origin,
            end: current,
        },
        Tool::Text => ShapeGeometry::Text {
            position: min,
            width: (max.x - min.x).max(DEFAULT_TEXT_WIDTH),
        },
    };
    let style = if tool == Tool::Text {
        ShapeStyle::text()
    } else {
        ShapeStyle::new()
    };
    let mut shape = Shape::new(geometry, style);
    if tool == Tool::Text {
        shape.text = Some(String::new());
    }
    Some(shape)
}

/// Placeholder rectangle covering a geometry's bounds
fn placeholder_box(geometry: &ShapeGeometry) -> ShapeGeometry {
    let (min_x, min_y, max_x, max_y) = geometry.bounding_box();
    ShapeGeometry::Rectangle {
        top_left: Point::new(min_x, min_y),
        bottom_right: Point::new(max_x, max_y),
    }
}
