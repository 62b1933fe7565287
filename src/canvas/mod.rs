//! # Canvas Scene Model
//!
//! A free-form scene of positioned objects. The vector order of
//! [`Scene::objects`] is the stacking order, back to front.
//!
//! The whole scene serializes to one JSON document (a snapshot). Loading a
//! snapshot reproduces the same objects, geometry and stacking:
//!
//! ```json
//! {
//!   "width": 800, "height": 1000, "background": "#ffffff",
//!   "objects": [
//!     {"id": "…", "left": 100, "top": 100, "opacity": 1.0,
//!      "type": "shape", "shape": "circle", "width": 100, "height": 100,
//!      "fill": "#d1d5db", "stroke": "#374151", "stroke_width": 2}
//!   ]
//! }
//! ```

pub mod assets;
pub mod command;
pub mod editor;
mod font;
pub mod history;
pub mod render;

pub use assets::AssetResolver;
pub use command::Command;
pub use editor::CanvasEditor;
pub use history::History;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::error::MemoriaError;

pub type ObjectId = Uuid;

/// Largest scene edge accepted from a snapshot, in pixels.
pub const MAX_CANVAS_EDGE: u32 = 8192;

/// Font sizes outside this range are clamped on add and rejected on load.
pub const FONT_SIZE_MIN: f32 = 1.0;
pub const FONT_SIZE_MAX: f32 = 512.0;

/// Positions and sizes must lie within `-COORD_LIMIT..=COORD_LIMIT`.
pub const COORD_LIMIT: f32 = 100_000.0;

/// Largest image scale factor.
pub const MAX_SCALE: f32 = 100.0;

/// True when `v` is a usable coordinate or extent.
pub(crate) fn in_range(v: f32) -> bool {
    v.is_finite() && v.abs() <= COORD_LIMIT
}

// ============================================================================
// COLOR
// ============================================================================

/// RGBA colour, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const INK: Color = Color::rgb(0x37, 0x41, 0x51);
    pub const SILVER: Color = Color::rgb(0xd1, 0xd5, 0xdb);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 0xff {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse(&s).ok_or_else(|| format!("invalid colour '{}'", s))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

// ============================================================================
// OBJECTS
// ============================================================================

/// Text role picked from the palette; sets the default weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Heading,
    Subheading,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextObject {
    pub text: String,
    pub text_kind: TextKind,
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    pub fill: Color,
    /// Wrap width in canvas pixels.
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub url: String,
    /// Unscaled box the image is fitted into.
    pub width: f32,
    pub height: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rect,
    Circle,
    Triangle,
    Line,
}

impl ShapeKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rect" | "rectangle" => Some(ShapeKind::Rect),
            "circle" => Some(ShapeKind::Circle),
            "triangle" => Some(ShapeKind::Triangle),
            "line" => Some(ShapeKind::Line),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeObject {
    pub shape: ShapeKind,
    /// Bounding box; for lines the end point is `(left + width, top + height)`.
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    pub stroke: Color,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Symbol,
    Emoji,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconObject {
    pub content: String,
    pub icon_kind: IconKind,
    pub font_size: f32,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Text(TextObject),
    Image(ImageObject),
    Shape(ShapeObject),
    Icon(IconObject),
}

/// A positioned scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub left: f32,
    pub top: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

fn one() -> f32 {
    1.0
}

impl SceneObject {
    pub fn new(left: f32, top: f32, kind: ObjectKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            left,
            top,
            opacity: 1.0,
            kind,
        }
    }

    /// Reject geometry the editor and the renderer cannot work with.
    pub fn check(&self) -> Result<(), String> {
        let fail = |field: &str| Err(format!("object {}: {} is out of range", self.id, field));
        if !(in_range(self.left) && in_range(self.top)) {
            return fail("position");
        }
        if !(self.opacity.is_finite() && (0.0..=1.0).contains(&self.opacity)) {
            return fail("opacity");
        }
        let font_ok = |size: f32| (FONT_SIZE_MIN..=FONT_SIZE_MAX).contains(&size);
        match &self.kind {
            ObjectKind::Text(text) => {
                if !font_ok(text.font_size) {
                    return fail("font_size");
                }
                if !(in_range(text.width) && text.width > 0.0) {
                    return fail("width");
                }
            }
            ObjectKind::Image(img) => {
                if !(in_range(img.width) && in_range(img.height))
                    || img.width < 0.0
                    || img.height < 0.0
                {
                    return fail("size");
                }
                let scale_ok = |s: f32| s.is_finite() && s > 0.0 && s <= MAX_SCALE;
                if !(scale_ok(img.scale_x) && scale_ok(img.scale_y)) {
                    return fail("scale");
                }
            }
            ObjectKind::Shape(shape) => {
                if !(in_range(shape.width) && in_range(shape.height)) {
                    return fail("size");
                }
                if !(in_range(shape.stroke_width) && shape.stroke_width >= 0.0) {
                    return fail("stroke_width");
                }
            }
            ObjectKind::Icon(icon) => {
                if !font_ok(icon.font_size) {
                    return fail("font_size");
                }
            }
        }
        Ok(())
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Text(_) => "text",
            ObjectKind::Image(_) => "image",
            ObjectKind::Shape(_) => "shape",
            ObjectKind::Icon(_) => "icon",
        }
    }
}

// ============================================================================
// SCENE
// ============================================================================

fn default_width() -> u32 {
    CANVAS_WIDTH
}

fn default_height() -> u32 {
    CANVAS_HEIGHT
}

fn default_background() -> Color {
    Color::WHITE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl Scene {
    /// Empty scene at the given resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Color::WHITE,
            objects: Vec::new(),
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of objects of a given kind name ("text", "shape", ...).
    pub fn count_kind(&self, kind: &str) -> usize {
        self.objects.iter().filter(|o| o.kind_name() == kind).count()
    }

    /// Serialize to a snapshot document.
    pub fn to_snapshot(&self) -> Result<String, MemoriaError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot document.
    ///
    /// Snapshots with duplicate ids, an edge outside `1..=MAX_CANVAS_EDGE`
    /// or out-of-range object geometry are rejected.
    pub fn from_snapshot(json: &str) -> Result<Self, MemoriaError> {
        let scene: Scene = serde_json::from_str(json)
            .map_err(|e| MemoriaError::Parse(format!("invalid scene snapshot: {}", e)))?;
        scene
            .check()
            .map_err(|e| MemoriaError::Parse(format!("invalid scene snapshot: {}", e)))?;
        Ok(scene)
    }

    /// Structural checks shared by snapshot loading, page validation and
    /// rendering.
    pub fn check(&self) -> Result<(), String> {
        let edge_ok = |e: u32| (1..=MAX_CANVAS_EDGE).contains(&e);
        if !(edge_ok(self.width) && edge_ok(self.height)) {
            return Err(format!(
                "canvas size {}x{} is outside 1..={}",
                self.width, self.height, MAX_CANVAS_EDGE
            ));
        }
        let mut ids: Vec<ObjectId> = self.objects.iter().map(|o| o.id).collect();
        ids.sort();
        ids.dedup();
        if ids.len() != self.objects.len() {
            return Err("duplicate object id".to_string());
        }
        self.objects.iter().try_for_each(SceneObject::check)
    }

    /// Image URLs referenced by the scene, in stacking order.
    pub fn image_urls(&self) -> Vec<&str> {
        self.objects
            .iter()
            .filter_map(|o| match &o.kind {
                ObjectKind::Image(img) => Some(img.url.as_str()),
                _ => None,
            })
            .collect()
    }
}
