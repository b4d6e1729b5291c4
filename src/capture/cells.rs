use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use ratatui::style::Color;

use super::{CaptureError, CardSurface, RasterOptions, Rasterizer, RasterizerFactory};

/// Pixel footprint of one terminal cell at scale 1. Chosen at a 1:2 aspect
/// ratio so exported cards keep roughly the proportions of the preview.
const CELL_W: u32 = 10;
const CELL_H: u32 = 20;

/// Bundled rasterizer. Maps each cell of the surface to a pixel block:
/// backgrounds become solid fills, glyphs become ink marks, and image
/// overlays are resampled over their placeholder regions.
pub struct CellRasterizer;

pub struct CellRasterizerFactory;

impl RasterizerFactory for CellRasterizerFactory {
    fn load(&self) -> Result<Arc<dyn Rasterizer>, CaptureError> {
        tracing::debug!("cell rasterizer ready");
        Ok(Arc::new(CellRasterizer))
    }
}

impl Rasterizer for CellRasterizer {
    fn rasterize(&self, surface: &CardSurface, options: RasterOptions) -> Result<Vec<u8>, CaptureError> {
        let scale = options.scale.max(1);
        let cell_w = CELL_W * scale;
        let cell_h = CELL_H * scale;
        let area = surface.buffer.area;
        let width = u32::from(area.width).max(1) * cell_w;
        let height = u32::from(area.height).max(1) * cell_h;

        let base = options.background.channels();
        let mut canvas = RgbaImage::from_pixel(width, height, opaque(base));

        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                let cell = surface.buffer.get(x, y);
                let origin_x = u32::from(x - area.x) * cell_w;
                let origin_y = u32::from(y - area.y) * cell_h;

                let bg = channels(cell.bg, base);
                if bg != base {
                    fill(&mut canvas, origin_x, origin_y, cell_w, cell_h, bg);
                }

                let symbol = cell.symbol();
                if symbol.trim().is_empty() {
                    continue;
                }
                let fg = channels(cell.fg, invert(base));
                draw_glyph(&mut canvas, symbol, origin_x, origin_y, cell_w, cell_h, fg);
            }
        }

        for overlay in &surface.overlays {
            let target_w = u32::from(overlay.area.width) * cell_w;
            let target_h = u32::from(overlay.area.height) * cell_h;
            if target_w == 0 || target_h == 0 {
                continue;
            }
            let resized = imageops::resize(&overlay.pixels, target_w, target_h, FilterType::Triangle);
            let dest_x = i64::from(overlay.area.x.saturating_sub(area.x)) * i64::from(cell_w);
            let dest_y = i64::from(overlay.area.y.saturating_sub(area.y)) * i64::from(cell_h);
            imageops::overlay(&mut canvas, &resized, dest_x, dest_y);
        }

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|err| CaptureError::Rasterize(err.to_string()))?;
        Ok(bytes)
    }
}

/// Ink marks per glyph class. Box-drawing characters become thin rules so
/// card borders and separators read as lines rather than solid bars; every
/// other glyph becomes an inset block.
fn draw_glyph(canvas: &mut RgbaImage, symbol: &str, x: u32, y: u32, w: u32, h: u32, ink: [u8; 3]) {
    let rule = (h / 10).max(1);
    let mid_y = y + h / 2;
    let mid_x = x + w / 2;
    match symbol {
        "─" => fill(canvas, x, mid_y, w, rule, ink),
        "│" => fill(canvas, mid_x, y, rule, h, ink),
        "┌" => {
            fill(canvas, mid_x, mid_y, w - w / 2, rule, ink);
            fill(canvas, mid_x, mid_y, rule, h - h / 2, ink);
        }
        "┐" => {
            fill(canvas, x, mid_y, w / 2, rule, ink);
            fill(canvas, mid_x, mid_y, rule, h - h / 2, ink);
        }
        "└" => {
            fill(canvas, mid_x, mid_y, w - w / 2, rule, ink);
            fill(canvas, mid_x, y, rule, h / 2 + rule, ink);
        }
        "┘" => {
            fill(canvas, x, mid_y, w / 2, rule, ink);
            fill(canvas, mid_x, y, rule, h / 2 + rule, ink);
        }
        _ => {
            let inset_x = w / 5;
            let inset_y = h / 5;
            fill(
                canvas,
                x + inset_x,
                y + inset_y,
                w - 2 * inset_x,
                h - 2 * inset_y,
                ink,
            );
        }
    }
}

fn fill(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
    let max_x = (x + w).min(canvas.width());
    let max_y = (y + h).min(canvas.height());
    for py in y..max_y {
        for px in x..max_x {
            canvas.put_pixel(px, py, opaque(rgb));
        }
    }
}

fn channels(color: Color, fallback: [u8; 3]) -> [u8; 3] {
    match color {
        Color::Rgb(r, g, b) => [r, g, b],
        _ => fallback,
    }
}

fn invert(rgb: [u8; 3]) -> [u8; 3] {
    [255 - rgb[0], 255 - rgb[1], 255 - rgb[2]]
}

fn opaque(rgb: [u8; 3]) -> Rgba<u8> {
    Rgba([rgb[0], rgb[1], rgb[2], 255])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageOverlay;
    use crate::config::themes::Rgb;
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;

    fn rasterize(surface: &CardSurface, background: Rgb, scale: u32) -> RgbaImage {
        let png = CellRasterizer
            .rasterize(
                surface,
                RasterOptions {
                    background,
                    scale,
                },
            )
            .expect("rasterize");
        image::load_from_memory(&png).expect("decode png").to_rgba8()
    }

    #[test]
    fn output_dimensions_follow_surface_and_scale() {
        let surface = CardSurface {
            buffer: Buffer::empty(Rect::new(0, 0, 4, 2)),
            overlays: Vec::new(),
        };
        let decoded = rasterize(&surface, Rgb(0, 0, 0), 2);
        assert_eq!(decoded.width(), 4 * CELL_W * 2);
        assert_eq!(decoded.height(), 2 * CELL_H * 2);
    }

    #[test]
    fn background_fills_empty_cells() {
        let surface = CardSurface {
            buffer: Buffer::empty(Rect::new(0, 0, 2, 1)),
            overlays: Vec::new(),
        };
        let decoded = rasterize(&surface, Rgb(0x1b, 0x1f, 0x23), 1);
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([0x1b, 0x1f, 0x23, 255]));
    }

    #[test]
    fn overlay_pixels_replace_their_region() {
        let red = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]));
        let surface = CardSurface {
            buffer: Buffer::empty(Rect::new(0, 0, 4, 2)),
            overlays: vec![ImageOverlay {
                area: Rect::new(1, 0, 2, 1),
                pixels: red,
            }],
        };
        let decoded = rasterize(&surface, Rgb(0, 0, 0), 1);
        // Middle of the overlay region; the uniform source survives resampling.
        let inside = decoded.get_pixel(2 * CELL_W, CELL_H / 2);
        assert_eq!(inside, &Rgba([200, 10, 10, 255]));
        // Outside the overlay the background shows through.
        let outside = decoded.get_pixel(CELL_W / 2, CELL_H + CELL_H / 2);
        assert_eq!(outside, &Rgba([0, 0, 0, 255]));
    }
}
