//! Bitmap text for annotation labels
//!
//! Labels are short (a word or a distance), so an embedded 8x8 font scaled
//! up is enough and avoids loading font files at export time.

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use tiny_skia::{Paint, Pixmap, Rect, Transform};

const GLYPH: usize = 8;

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Rendered width of `text` at `scale`
pub fn text_width(text: &str, scale: f32) -> f32 {
    text.chars().count() as f32 * GLYPH as f32 * scale
}

/// Rendered height of one line at `scale`
pub fn text_height(scale: f32) -> f32 {
    GLYPH as f32 * scale
}

/// Draw `text` with its top-left corner at `(x, y)`
pub fn draw_text(pixmap: &mut Pixmap, text: &str, x: f32, y: f32, scale: f32, paint: &Paint) {
    let cell = GLYPH as f32 * scale;
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as f32 * cell;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH {
                // Bit 0 is the leftmost pixel
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col as f32 * scale;
                let py = y + row as f32 * scale;
                if let Some(rect) = Rect::from_xywh(px, py, scale, scale) {
                    pixmap.fill_rect(rect, paint, Transform::identity(), None);
                }
            }
        }
    }
}
