//! Bitmap text layout for scene rasterization.
//!
//! Glyphs come from the Spleen bitmap family and are scaled nearest-neighbor
//! to the requested pixel size. The cell is half as wide as it is tall.

use std::collections::HashMap;

use spleen_font::{FONT_6X12, FONT_12X24, PSF2Font};

use crate::error::MemoriaError;

/// Largest mask a single text object may lay out to.
pub const MAX_MASK_PIXELS: usize = 16 * 1024 * 1024;

/// Coverage mask: 1 = ink, 0 = empty.
#[derive(Debug, Clone, Default)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.data[y * self.width + x] != 0
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Character cell size in pixels for a font size.
pub fn cell_size(font_size: f32) -> (usize, usize) {
    let h = font_size.round().max(1.0) as usize;
    let w = (h / 2).max(1);
    (w, h)
}

/// Spleen source bitmap for a cell height: (font data, width, height).
fn source_font(cell_h: usize) -> (&'static [u8], usize, usize) {
    if cell_h <= 16 {
        (FONT_6X12, 6, 12)
    } else {
        (FONT_12X24, 12, 24)
    }
}

/// Unscaled glyph bitmap for `ch`, or `None` if the font lacks it.
fn source_glyph(font: &mut PSF2Font, ch: char, src_w: usize, src_h: usize) -> Option<Vec<u8>> {
    let utf8 = ch.to_string();
    let rows = font.glyph_for_utf8(utf8.as_bytes())?;
    let mut bitmap = vec![0u8; src_w * src_h];
    for (y, row) in rows.enumerate() {
        for (x, on) in row.enumerate() {
            if x < src_w && y < src_h && on {
                bitmap[y * src_w + x] = 1;
            }
        }
    }
    Some(bitmap)
}

/// Lay out `text` into a mask, wrapping words at `wrap_width` pixels.
///
/// Explicit newlines start a new line. Words longer than a line are broken.
/// Characters missing from the font are drawn as hollow boxes. Layouts
/// larger than [`MAX_MASK_PIXELS`] are a render error.
pub fn layout_text(
    text: &str,
    font_size: f32,
    bold: bool,
    wrap_width: Option<f32>,
) -> Result<Mask, MemoriaError> {
    let (cw, ch) = cell_size(font_size);
    let max_cols = wrap_width
        .filter(|w| w.is_finite() && *w > 0.0)
        .map(|w| ((w / cw as f32).floor() as usize).max(1));

    let lines = wrap_lines(text, max_cols);
    let cols = lines.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return Ok(Mask::default());
    }

    let (width, height) = (cols.saturating_mul(cw), lines.len().saturating_mul(ch));
    if width.saturating_mul(height) > MAX_MASK_PIXELS {
        return Err(MemoriaError::Render(format!(
            "text layout of {}x{} pixels exceeds the {} pixel limit",
            width, height, MAX_MASK_PIXELS
        )));
    }
    let mut mask = Mask::new(width, height);
    let (data, src_w, src_h) = source_font(ch);
    let mut font = PSF2Font::new(data).ok();
    let mut glyphs: HashMap<char, Option<Vec<u8>>> = HashMap::new();
    let mut cell = vec![0u8; cw * ch];

    for (row, line) in lines.iter().enumerate() {
        for (col, &c) in line.iter().enumerate() {
            if c == ' ' {
                continue;
            }
            cell.fill(0);
            let glyph = glyphs.entry(c).or_insert_with(|| {
                font.as_mut()
                    .and_then(|f| source_glyph(f, c, src_w, src_h))
            });
            match glyph {
                Some(src) => scale_bitmap(src, src_w, src_h, &mut cell, cw, ch),
                None => draw_box(&mut cell, cw, ch),
            }
            if bold {
                embolden(&mut cell, cw, ch);
            }
            blit(&mut mask, &cell, cw, ch, col * cw, row * ch);
        }
    }
    Ok(mask)
}

fn wrap_lines(text: &str, max_cols: Option<usize>) -> Vec<Vec<char>> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let Some(max) = max_cols else {
            lines.push(paragraph.chars().collect());
            continue;
        };
        let mut line: Vec<char> = Vec::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word: Vec<char> = word.chars().collect();
            let needed = if line.is_empty() {
                word.len()
            } else {
                line.len() + 1 + word.len()
            };
            if needed <= max {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.extend(word);
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let mut chunks = word.chunks(max).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.to_vec());
                } else {
                    line = chunk.to_vec();
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// Scale a bitmap from src dimensions to dst dimensions using nearest neighbor.
fn scale_bitmap(src: &[u8], src_w: usize, src_h: usize, dst: &mut [u8], dst_w: usize, dst_h: usize) {
    for dy in 0..dst_h {
        let sy = dy * src_h / dst_h;
        for dx in 0..dst_w {
            let sx = dx * src_w / dst_w;
            if let Some(&v) = src.get(sy * src_w + sx) {
                dst[dy * dst_w + dx] = v;
            }
        }
    }
}

/// Hollow box for characters the font does not cover.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    let inset_x = width / 8;
    let inset_y = height / 8;
    let (x0, x1) = (inset_x, width.saturating_sub(inset_x + 1));
    let (y0, y1) = (inset_y, height.saturating_sub(inset_y + 1));
    for x in x0..=x1 {
        glyph[y0 * width + x] = 1;
        glyph[y1 * width + x] = 1;
    }
    for y in y0..=y1 {
        glyph[y * width + x0] = 1;
        glyph[y * width + x1] = 1;
    }
}

/// Double-strike: OR each row with itself shifted one pixel right.
fn embolden(glyph: &mut [u8], width: usize, height: usize) {
    for y in 0..height {
        let row = &mut glyph[y * width..(y + 1) * width];
        for x in (1..width).rev() {
            if row[x - 1] != 0 {
                row[x] = 1;
            }
        }
    }
}

fn blit(mask: &mut Mask, cell: &[u8], cw: usize, ch: usize, ox: usize, oy: usize) {
    for y in 0..ch {
        let dst = (oy + y) * mask.width + ox;
        mask.data[dst..dst + cw].copy_from_slice(&cell[y * cw..(y + 1) * cw]);
    }
}
