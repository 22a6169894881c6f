//! Built-in 8x8 bitmap font used when no TrueType font is available

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const GLYPH_SIZE: u32 = 8;

/// Largest dot drawn; no canvas is wider than a glyph at this size
const MAX_DOT: u32 = 4096;

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Pixels per glyph dot at a given font size
fn dot_size(size: f32) -> u32 {
    ((size / GLYPH_SIZE as f32).round() as u32).clamp(1, MAX_DOT)
}

/// Width of `text` at `size`; every glyph has the same advance
pub fn measure(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * (GLYPH_SIZE * dot_size(size)) as f32
}

/// Draw `text` with its top-left corner at (x, y)
pub fn draw(canvas: &mut RgbaImage, color: Rgba<u8>, x: i32, y: i32, size: f32, text: &str) {
    let dot = dot_size(size);
    let advance = (GLYPH_SIZE * dot) as i32;

    for (i, c) in text.chars().enumerate() {
        let origin_x = i32::try_from(i)
            .unwrap_or(i32::MAX)
            .saturating_mul(advance)
            .saturating_add(x);
        if origin_x >= canvas.width() as i32 {
            break;
        }
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    origin_x.saturating_add((col * dot) as i32),
                    y.saturating_add((row as u32 * dot) as i32),
                )
                .of_size(dot, dot);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}
