// wayfinder_core/src/scene/label.rs

use nalgebra::Vector2;

/// Average advance of a bold sans-serif glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Horizontal padding added around the text, as a fraction of its width.
const HORIZONTAL_PADDING: f64 = 0.4;

/// Sizing of a text label: the raster canvas and the world-space sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub world_size: Vector2<f64>,
}

impl LabelLayout {
    /// Lays out `text` on a canvas twice the font size tall, then scales the sprite
    /// to `world_height` while keeping the canvas aspect ratio.
    pub fn for_text(text: &str, font_size: f64, world_height: f64) -> Self {
        let text_width = text.chars().count() as f64 * font_size * GLYPH_ADVANCE;
        let canvas_width = (text_width * (1.0 + HORIZONTAL_PADDING)).ceil().max(1.0);
        let canvas_height = (font_size * 2.0).ceil().max(1.0);
        let aspect = canvas_width / canvas_height;

        Self {
            canvas_width: canvas_width as u32,
            canvas_height: canvas_height as u32,
            world_size: Vector2::new(world_height * aspect, world_height),
        }
    }
}
