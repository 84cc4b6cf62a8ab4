//! Fonts for label titles
//!
//! Titles are drawn either with the embedded 8×8 bitmap font or with an
//! outline font loaded from disk or from the system font database.

use crate::config::FontOptions;
use crate::error::{Error, Result};
use ab_glyph::{Font, FontArc, OutlinedGlyph, PxScale, ScaleFont, point};
use font8x8::{BASIC_FONTS, GREEK_FONTS, LATIN_FONTS, UnicodeFonts};
use fontdb::{Database, Family, Query, Source};
use image::{Rgb, RgbImage};
use std::fs;

const BITMAP_CELL: u32 = 8;

/// Ink bounding box of a rendered string, relative to its draw origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextBounds {
    /// Leftmost inked column
    pub left: i32,
    /// Topmost inked row
    pub top: i32,
    /// One past the rightmost inked column
    pub right: i32,
    /// One past the bottom inked row
    pub bottom: i32,
}

impl TextBounds {
    /// Width of the inked area
    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    /// Height of the inked area
    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }

    fn union(self, other: TextBounds) -> TextBounds {
        TextBounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Font used to draw label titles
#[derive(Clone)]
pub enum LabelFont {
    /// Embedded 8×8 bitmap font, each font pixel drawn as a `dot`×`dot` square
    Builtin {
        /// Side of one font pixel in image pixels
        dot: u32,
    },
    /// TrueType / OpenType outline font
    Outline {
        /// Parsed font face
        font: FontArc,
        /// Pixel scale
        scale: PxScale,
    },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::Builtin { dot } => f.debug_struct("Builtin").field("dot", dot).finish(),
            LabelFont::Outline { scale, .. } => {
                f.debug_struct("Outline").field("scale", scale).finish()
            }
        }
    }
}

impl LabelFont {
    /// The embedded bitmap font at roughly `size` pixels
    pub fn builtin(size: f32) -> Self {
        let dot = (size / BITMAP_CELL as f32).round().max(1.0) as u32;
        LabelFont::Builtin { dot }
    }

    /// An outline font at `size` pixels
    pub fn outline(font: FontArc, size: f32) -> Self {
        LabelFont::Outline {
            font,
            scale: PxScale::from(size),
        }
    }

    /// Resolve the configured font: explicit file, then system family, then builtin.
    pub fn load(options: &FontOptions, size: f32) -> Result<Self> {
        if let Some(path) = &options.path {
            let data = fs::read(path)
                .map_err(|e| Error::Font(format!("Failed to read {}: {e}", path.display())))?;
            let font = FontArc::try_from_vec(data)
                .map_err(|e| Error::Font(format!("Failed to parse {}: {e}", path.display())))?;
            tracing::debug!(path = %path.display(), size, "Loaded title font from file");
            return Ok(Self::outline(font, size));
        }

        if let Some(family) = &options.family {
            let font = load_system_family(family)?;
            tracing::debug!(family = %family, size, "Loaded system title font");
            return Ok(Self::outline(font, size));
        }

        Ok(Self::builtin(size))
    }

    /// Ink bounds of `text` drawn at origin (0, 0).
    pub fn measure(&self, text: &str) -> TextBounds {
        let mut bounds: Option<TextBounds> = None;
        let mut extend = |cell: TextBounds| {
            bounds = Some(match bounds {
                Some(current) => current.union(cell),
                None => cell,
            });
        };
        match self {
            LabelFont::Builtin { dot } => {
                for_each_bitmap_dot(*dot, text, |x, y| {
                    let cell = TextBounds {
                        left: x,
                        top: y,
                        right: x + *dot as i32,
                        bottom: y + *dot as i32,
                    };
                    extend(cell);
                });
            }
            LabelFont::Outline { font, scale } => {
                for_each_outline(font, *scale, text, |outlined| {
                    let px = outlined.px_bounds();
                    let cell = TextBounds {
                        left: px.min.x.floor() as i32,
                        top: px.min.y.floor() as i32,
                        right: px.max.x.ceil() as i32,
                        bottom: px.max.y.ceil() as i32,
                    };
                    extend(cell);
                });
            }
        }
        bounds.unwrap_or_default()
    }

    /// Draw `text` with its origin at (`x`, `y`), clipping at the image edges.
    pub fn draw(&self, image: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
        match self {
            LabelFont::Builtin { dot } => {
                let dot = *dot as i32;
                for_each_bitmap_dot(dot as u32, text, |dx, dy| {
                    for py in 0..dot {
                        for px in 0..dot {
                            blend(image, x + dx + px, y + dy + py, color, 1.0);
                        }
                    }
                });
            }
            LabelFont::Outline { font, scale } => {
                for_each_outline(font, *scale, text, |outlined| {
                    let px = outlined.px_bounds();
                    let origin_x = x + px.min.x.floor() as i32;
                    let origin_y = y + px.min.y.floor() as i32;
                    outlined.draw(|gx, gy, coverage| {
                        blend(image, origin_x + gx as i32, origin_y + gy as i32, color, coverage);
                    });
                });
            }
        }
    }
}

fn bitmap_glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
}

// Rows are top to bottom; bit 0 of each row is the leftmost pixel.
fn for_each_bitmap_dot(dot: u32, text: &str, mut f: impl FnMut(i32, i32)) {
    let dot = dot as i32;
    let advance = BITMAP_CELL as i32 * dot;
    let mut caret = 0;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        if let Some(rows) = bitmap_glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for bit in 0..BITMAP_CELL {
                    if bits & (1 << bit) != 0 {
                        f(caret + bit as i32 * dot, row as i32 * dot);
                    }
                }
            }
        }
        caret += advance;
    }
}

// Origin is the top-left corner of the line box: the baseline sits one ascent below it.
fn for_each_outline(font: &FontArc, scale: PxScale, text: &str, mut f: impl FnMut(OutlinedGlyph)) {
    let scaled = font.as_scaled(scale);
    let baseline = scaled.ascent();
    let mut caret = 0.0;
    let mut previous = None;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, point(caret, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            f(outlined);
        }
        caret += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
}

fn blend(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        return;
    }
    let alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u16;
    if alpha == 0 {
        return;
    }
    let inv = 255 - alpha;
    let dst = image.get_pixel_mut(x as u32, y as u32);
    for channel in 0..3 {
        dst.0[channel] =
            ((dst.0[channel] as u16 * inv + color.0[channel] as u16 * alpha) / 255) as u8;
    }
}

fn load_system_family(family: &str) -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let id = db
        .query(&Query {
            families: &[Family::Name(family)],
            ..Default::default()
        })
        .ok_or_else(|| Error::Font(format!("No system font found for family '{family}'")))?;

    let face = db
        .face(id)
        .ok_or_else(|| Error::Font(format!("Missing font face for family '{family}'")))?;

    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => fs::read(path)
            .map_err(|e| Error::Font(format!("Failed to read {}: {e}", path.display())))?,
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };

    let font = if face.index == 0 {
        FontArc::try_from_vec(data)
    } else {
        ab_glyph::FontVec::try_from_vec_and_index(data, face.index).map(FontArc::new)
    };
    font.map_err(|e| Error::Font(format!("Failed to parse font for family '{family}': {e}")))
}
