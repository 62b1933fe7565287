//! # Scene Rasterization
//!
//! Turns a [`Scene`] into an RGBA bitmap at the scene's own resolution and
//! encodes it as PNG.
//!
//! Objects are first prepared into layers (text laid out, images
//! resized), then rows are painted in parallel. Each row visits the layers
//! back to front, so stacking order is preserved per pixel.
//!
//! Images missing from the [`ImageMap`] (fetch or decode failed) are drawn
//! as a grey placeholder box with a cross.

use std::collections::HashMap;
use std::io::Cursor;

use image::{DynamicImage, RgbaImage, imageops::FilterType};
use rayon::prelude::*;

use super::font::{self, Mask};
use super::{Color, FontWeight, ObjectKind, Scene, ShapeKind};
use crate::error::MemoriaError;

/// Decoded images keyed by source URL.
pub type ImageMap = HashMap<String, DynamicImage>;

/// Largest edge an image object is resized to.
const MAX_IMAGE_EDGE: f32 = 4096.0;

/// Memory all prepared text masks and resized images may use together.
pub const MAX_LAYER_BYTES: usize = 256 * 1024 * 1024;

const PLACEHOLDER_FILL: Color = Color::rgb(0xe5, 0xe7, 0xeb);
const PLACEHOLDER_INK: Color = Color::rgb(0x9c, 0xa3, 0xaf);

// ============================================================================
// LAYERS
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

enum Layer {
    Mask {
        x: i64,
        y: i64,
        mask: Mask,
        color: Color,
        opacity: f32,
    },
    Bitmap {
        x: i64,
        y: i64,
        image: RgbaImage,
        opacity: f32,
    },
    Shape {
        shape: ShapeKind,
        rect: Rect,
        fill: Option<Color>,
        stroke: Color,
        stroke_width: f32,
        opacity: f32,
    },
    Placeholder {
        rect: Rect,
        opacity: f32,
    },
}

/// Running total of layer memory, failing once it passes the limit.
struct Budget {
    used: usize,
}

impl Budget {
    fn take(&mut self, bytes: usize) -> Result<(), MemoriaError> {
        self.used = self.used.saturating_add(bytes);
        if self.used > MAX_LAYER_BYTES {
            return Err(MemoriaError::Render(format!(
                "scene layers need more than {} bytes",
                MAX_LAYER_BYTES
            )));
        }
        Ok(())
    }
}

fn prepare(scene: &Scene, images: &ImageMap) -> Result<Vec<Layer>, MemoriaError> {
    let mut layers = Vec::with_capacity(scene.objects.len());
    let mut budget = Budget { used: 0 };
    for object in &scene.objects {
        let opacity = if object.opacity.is_finite() {
            object.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        if opacity == 0.0 {
            continue;
        }
        let (x, y) = (object.left, object.top);
        match &object.kind {
            ObjectKind::Text(text) => {
                let bold = text.font_weight == FontWeight::Bold;
                let mask = font::layout_text(&text.text, text.font_size, bold, Some(text.width))?;
                budget.take(mask.data.len())?;
                if !mask.is_empty() {
                    layers.push(Layer::Mask {
                        x: x.round() as i64,
                        y: y.round() as i64,
                        mask,
                        color: text.fill,
                        opacity,
                    });
                }
            }
            ObjectKind::Icon(icon) => {
                let mask = font::layout_text(&icon.content, icon.font_size, false, None)?;
                budget.take(mask.data.len())?;
                if !mask.is_empty() {
                    layers.push(Layer::Mask {
                        x: x.round() as i64,
                        y: y.round() as i64,
                        mask,
                        color: icon.fill,
                        opacity,
                    });
                }
            }
            ObjectKind::Image(img) => {
                let w = (img.width * img.scale_x).clamp(1.0, MAX_IMAGE_EDGE);
                let h = (img.height * img.scale_y).clamp(1.0, MAX_IMAGE_EDGE);
                let rect = Rect { x, y, w, h };
                match images.get(&img.url) {
                    Some(source) => {
                        let (rw, rh) = (w.round() as u32, h.round() as u32);
                        budget.take(rw as usize * rh as usize * 4)?;
                        layers.push(Layer::Bitmap {
                            x: x.round() as i64,
                            y: y.round() as i64,
                            image: source
                                .resize_exact(rw, rh, FilterType::Triangle)
                                .to_rgba8(),
                            opacity,
                        });
                    }
                    None => layers.push(Layer::Placeholder { rect, opacity }),
                }
            }
            ObjectKind::Shape(shape) => layers.push(Layer::Shape {
                shape: shape.shape,
                rect: Rect {
                    x,
                    y,
                    w: shape.width,
                    h: shape.height,
                },
                fill: shape.fill,
                stroke: shape.stroke,
                stroke_width: shape.stroke_width.max(0.0),
                opacity,
            }),
        }
    }
    Ok(layers)
}

impl Layer {
    fn paint_row(&self, py: usize, row: &mut [u8]) {
        let width = row.len() / 4;
        match self {
            Layer::Mask {
                x,
                y,
                mask,
                color,
                opacity,
            } => {
                let my = py as i64 - y;
                if my < 0 || my >= mask.height as i64 {
                    return;
                }
                let (start, end) = span(*x, mask.width, width);
                for px in start..end {
                    if mask.get((px as i64 - x) as usize, my as usize) {
                        blend(row, px, *color, *opacity);
                    }
                }
            }
            Layer::Bitmap {
                x,
                y,
                image,
                opacity,
            } => {
                let iy = py as i64 - y;
                if iy < 0 || iy >= i64::from(image.height()) {
                    return;
                }
                let (start, end) = span(*x, image.width() as usize, width);
                for px in start..end {
                    let p = image.get_pixel((px as i64 - x) as u32, iy as u32).0;
                    blend(row, px, Color { r: p[0], g: p[1], b: p[2], a: p[3] }, *opacity);
                }
            }
            Layer::Shape {
                shape,
                rect,
                fill,
                stroke,
                stroke_width,
                opacity,
            } => {
                let margin = stroke_width / 2.0 + 1.0;
                let Some((start, end)) = row_bounds(rect, margin, py, width) else {
                    return;
                };
                let cy = py as f32 + 0.5;
                for px in start..end {
                    let cx = px as f32 + 0.5;
                    if let Some(c) = shape_color(*shape, rect, *fill, *stroke, *stroke_width, cx, cy) {
                        blend(row, px, c, *opacity);
                    }
                }
            }
            Layer::Placeholder { rect, opacity } => {
                let Some((start, end)) = row_bounds(rect, 0.0, py, width) else {
                    return;
                };
                let cy = py as f32 + 0.5;
                let a = (rect.x, rect.y);
                let b = (rect.x + rect.w, rect.y + rect.h);
                let c = (rect.x + rect.w, rect.y);
                let d = (rect.x, rect.y + rect.h);
                for px in start..end {
                    let cx = px as f32 + 0.5;
                    if !inside_rect(rect, cx, cy) {
                        continue;
                    }
                    let p = (cx, cy);
                    let on_border = cx - rect.x < 2.0
                        || rect.x + rect.w - cx < 2.0
                        || cy - rect.y < 2.0
                        || rect.y + rect.h - cy < 2.0;
                    let on_cross = segment_distance(p, a, b) <= 1.0 || segment_distance(p, c, d) <= 1.0;
                    let color = if on_border || on_cross {
                        PLACEHOLDER_INK
                    } else {
                        PLACEHOLDER_FILL
                    };
                    blend(row, px, color, *opacity);
                }
            }
        }
    }
}

/// Clipped column range `[start, end)` for something `len` wide at `x`.
fn span(x: i64, len: usize, width: usize) -> (usize, usize) {
    let start = x.max(0) as usize;
    let end = (x + len as i64).clamp(0, width as i64) as usize;
    (start.min(end), end)
}

/// Column range of `rect` (grown by `margin`) on row `py`, if it touches it.
fn row_bounds(rect: &Rect, margin: f32, py: usize, width: usize) -> Option<(usize, usize)> {
    let (top, bottom) = (rect.y.min(rect.y + rect.h), rect.y.max(rect.y + rect.h));
    let (left, right) = (rect.x.min(rect.x + rect.w), rect.x.max(rect.x + rect.w));
    let cy = py as f32 + 0.5;
    if cy < top - margin || cy > bottom + margin {
        return None;
    }
    let start = (left - margin).floor().max(0.0) as usize;
    let end = ((right + margin).ceil().max(0.0) as usize).min(width);
    (start < end).then_some((start, end))
}

fn inside_rect(rect: &Rect, x: f32, y: f32) -> bool {
    x >= rect.x && x <= rect.x + rect.w && y >= rect.y && y <= rect.y + rect.h
}

fn segment_distance(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    };
    let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

/// Colour of a shape at a pixel centre. Stroke is painted over fill.
fn shape_color(
    shape: ShapeKind,
    rect: &Rect,
    fill: Option<Color>,
    stroke: Color,
    stroke_width: f32,
    x: f32,
    y: f32,
) -> Option<Color> {
    let half = stroke_width / 2.0;
    let (on_stroke, inside) = match shape {
        ShapeKind::Rect => {
            let outer = x >= rect.x - half
                && x <= rect.x + rect.w + half
                && y >= rect.y - half
                && y <= rect.y + rect.h + half;
            let inner = x > rect.x + half
                && x < rect.x + rect.w - half
                && y > rect.y + half
                && y < rect.y + rect.h - half;
            (half > 0.0 && outer && !inner, inside_rect(rect, x, y))
        }
        ShapeKind::Circle => {
            let (rx, ry) = (rect.w / 2.0, rect.h / 2.0);
            if rx <= 0.0 || ry <= 0.0 {
                return None;
            }
            let (nx, ny) = ((x - rect.x - rx) / rx, (y - rect.y - ry) / ry);
            let d = (nx * nx + ny * ny).sqrt();
            let edge_distance = (d - 1.0).abs() * rx.min(ry);
            (half > 0.0 && edge_distance <= half, d <= 1.0)
        }
        ShapeKind::Triangle => {
            let a = (rect.x + rect.w / 2.0, rect.y);
            let b = (rect.x + rect.w, rect.y + rect.h);
            let c = (rect.x, rect.y + rect.h);
            let p = (x, y);
            let edge = segment_distance(p, a, b)
                .min(segment_distance(p, b, c))
                .min(segment_distance(p, c, a));
            (half > 0.0 && edge <= half, inside_triangle(p, a, b, c))
        }
        ShapeKind::Line => {
            let a = (rect.x, rect.y);
            let b = (rect.x + rect.w, rect.y + rect.h);
            (segment_distance((x, y), a, b) <= half.max(0.5), false)
        }
    };
    if on_stroke {
        Some(stroke)
    } else if inside {
        fill
    } else {
        None
    }
}

fn inside_triangle(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> bool {
    let cross = |o: (f32, f32), u: (f32, f32), v: (f32, f32)| -> f32 {
        (u.0 - o.0) * (v.1 - o.1) - (u.1 - o.1) * (v.0 - o.0)
    };
    let d1 = cross(p, a, b);
    let d2 = cross(p, b, c);
    let d3 = cross(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Source-over blend of `color` at column `px`.
fn blend(row: &mut [u8], px: usize, color: Color, opacity: f32) {
    let alpha = (color.a as f32 / 255.0) * opacity;
    if alpha <= 0.0 {
        return;
    }
    let i = px * 4;
    let Some(dst) = row.get_mut(i..i + 4) else {
        return;
    };
    let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
    dst[0] = mix(color.r, dst[0]);
    dst[1] = mix(color.g, dst[1]);
    dst[2] = mix(color.b, dst[2]);
    let da = dst[3] as f32 / 255.0;
    dst[3] = ((alpha + da * (1.0 - alpha)) * 255.0).round() as u8;
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Rasterize a scene. Images absent from `images` become placeholders.
///
/// Scenes failing [`Scene::check`] and scenes whose layers would pass
/// [`MAX_LAYER_BYTES`] are refused before any pixel buffer is allocated.
pub fn render_scene(scene: &Scene, images: &ImageMap) -> Result<RgbaImage, MemoriaError> {
    scene
        .check()
        .map_err(|e| MemoriaError::Render(format!("cannot render scene: {}", e)))?;
    let (width, height) = (scene.width as usize, scene.height as usize);

    let layers = prepare(scene, images)?;
    let bg = scene.background;
    let mut pixels = vec![0u8; width * height * 4];

    pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&[bg.r, bg.g, bg.b, bg.a]);
            }
            for layer in &layers {
                layer.paint_row(py, row);
            }
        });

    RgbaImage::from_raw(scene.width, scene.height, pixels)
        .ok_or_else(|| MemoriaError::Render("pixel buffer size mismatch".to_string()))
}

/// Encode an RGBA bitmap as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, MemoriaError> {
    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| MemoriaError::Render(format!("PNG encoding failed: {}", e)))?;
    Ok(png_bytes)
}

/// Rasterize a scene and encode it as PNG.
pub fn render_png(scene: &Scene, images: &ImageMap) -> Result<Vec<u8>, MemoriaError> {
    encode_png(&render_scene(scene, images)?)
}
