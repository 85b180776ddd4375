use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use tracing::debug;

use crate::error::{ForgeError, Result};
use crate::style::normalize_hex;

use super::svg::scene_to_svg;
use super::{RasterOptions, Rasterizer, Scene};

/// Largest output edge accepted, in device pixels.
const MAX_DIM: u32 = 16_384;

/// Renders scenes through an SVG document and `resvg`.
pub struct SvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgRasterizer {
    /// Loads the system font database once; reuse the rasterizer across captures.
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system fonts");
        Self {
            fontdb: Arc::new(db),
        }
    }
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, scene: &Scene, options: &RasterOptions) -> Result<Vec<u8>> {
        if !options.pixel_ratio.is_finite() || options.pixel_ratio <= 0.0 {
            return Err(ForgeError::render(format!(
                "pixel ratio must be positive, got {}",
                options.pixel_ratio
            )));
        }
        let (width, height) = options.output_size(scene);
        if width > MAX_DIM || height > MAX_DIM {
            return Err(ForgeError::render(format!(
                "raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
            )));
        }

        let svg = scene_to_svg(scene);
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| ForgeError::render(format!("failed to build the scene: {e}")))?;

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| ForgeError::render("failed to allocate the raster surface"))?;
        pixmap.fill(background_color(&options.background));

        let sx = width as f32 / tree.size().width();
        let sy = height as f32 / tree.size().height();
        resvg::render(&tree, Transform::from_scale(sx, sy), &mut pixmap.as_mut());

        encode_png(&pixmap)
    }
}

fn background_color(hex: &str) -> Color {
    let hex = normalize_hex(hex, "#FFFFFF");
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
    Color::from_rgba8(channel(1), channel(3), channel(5), 255)
}

/// Demultiplies the pixmap and encodes it as PNG.
fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let buffer = RgbaImage::from_raw(pixmap.width(), pixmap.height(), rgba)
        .ok_or_else(|| ForgeError::render("raster buffer size mismatch"))?;

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(buffer).write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}
