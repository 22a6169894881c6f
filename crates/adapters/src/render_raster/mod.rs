//! Raster render backend.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Canvas | `image::RgbaImage` |
//! | TrueType text | `imageproc::drawing::draw_text_mut` with an `ab_glyph::FontArc` |
//! | Fallback text | `font8x8` glyphs drawn as filled rects |
//! | Logo | `image::open` + `DynamicImage::resize` (once, at load) + `imageops::overlay` |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |

mod bitmap;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use phrasecast_domain::{Color, ImageLayout, LogoSlot, PlacedLine, RenderBackend, RenderError};
use std::path::{Path, PathBuf};

/// Optional branding assets
#[derive(Debug, Clone, Default)]
pub struct RasterAssets {
    pub font_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
    /// Widest the logo is drawn; 0 keeps its natural width
    pub logo_max_width: u32,
}

/// Draws layouts into JPEG bytes
pub struct RasterBackend {
    font: Option<FontArc>,
    /// Logo already scaled to `logo_max_width`
    logo: Option<RgbaImage>,
}

impl RasterBackend {
    /// Load the configured assets. Missing or unreadable assets are logged
    /// here, once, and the backend degrades to the bitmap font / no logo.
    pub fn new(assets: &RasterAssets) -> Self {
        let font = assets.font_path.as_deref().and_then(|path| match load_font(path) {
            Ok(font) => {
                tracing::debug!(path = %path.display(), "Loaded font");
                Some(font)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Font unavailable, using built-in bitmap font"
                );
                None
            }
        });
        if assets.font_path.is_none() {
            tracing::info!("No font configured, using built-in bitmap font");
        }

        let logo = assets.logo_path.as_deref().and_then(|path| match image::open(path) {
            Ok(logo) => {
                let logo = scale_logo(&logo, assets.logo_max_width);
                tracing::debug!(
                    path = %path.display(),
                    width = logo.width(),
                    height = logo.height(),
                    "Loaded logo"
                );
                Some(logo)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Logo unavailable, rendering without it");
                None
            }
        });

        Self { font, logo }
    }

    /// Backend with no assets at all
    pub fn bitmap_only() -> Self {
        Self {
            font: None,
            logo: None,
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    fn draw_line(&self, canvas: &mut RgbaImage, line: &PlacedLine) {
        let color = rgba(line.color);
        let x = line.x.round() as i32;
        let y = line.y.round() as i32;

        match &self.font {
            Some(font) => draw_text_mut(canvas, color, x, y, PxScale::from(line.size), font, &line.text),
            None => bitmap::draw(canvas, color, x, y, line.size, &line.text),
        }
    }

    fn draw_logo(&self, canvas: &mut RgbaImage, slot: LogoSlot) {
        let Some(logo) = &self.logo else {
            return;
        };

        // Only a layout narrower than the configured slot pays for a resize.
        if slot.max_width > 0 && logo.width() > slot.max_width {
            let scaled = scale_logo(&DynamicImage::ImageRgba8(logo.clone()), slot.max_width);
            overlay_centered(canvas, &scaled, slot.top);
        } else {
            overlay_centered(canvas, logo, slot.top);
        }
    }
}

impl RenderBackend for RasterBackend {
    fn measure_text_width(&self, text: &str, size: f32) -> f32 {
        match &self.font {
            Some(font) => measure_font(font, text, size),
            None => bitmap::measure(text, size),
        }
    }

    fn render(&self, layout: &ImageLayout) -> Result<Vec<u8>, RenderError> {
        if layout.canvas_size == 0 {
            return Err(RenderError::Backend("canvas size must be positive".to_string()));
        }

        let mut canvas =
            RgbaImage::from_pixel(layout.canvas_size, layout.canvas_size, rgba(layout.background));

        self.draw_logo(&mut canvas, layout.logo);
        for line in &layout.lines {
            self.draw_line(&mut canvas, line);
        }

        encode_jpeg(canvas, layout.jpeg_quality)
    }
}

fn scale_logo(logo: &DynamicImage, max_width: u32) -> RgbaImage {
    if max_width > 0 && logo.width() > max_width {
        logo.resize(max_width, logo.height(), FilterType::Lanczos3).to_rgba8()
    } else {
        logo.to_rgba8()
    }
}

fn overlay_centered(canvas: &mut RgbaImage, logo: &RgbaImage, top: u32) {
    let x = (i64::from(canvas.width()) - i64::from(logo.width())) / 2;
    imageops::overlay(canvas, logo, x, i64::from(top));
}

fn load_font(path: &Path) -> Result<FontArc, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(bytes).map_err(|e| e.to_string())
}

fn measure_font(font: &FontArc, text: &str, size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(size));
    let mut width = 0.0;
    let mut previous: Option<GlyphId> = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }

    width
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

fn encode_jpeg(canvas: RgbaImage, quality: u8) -> Result<Vec<u8>, RenderError> {
    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrasecast_domain::TextRole;
    use tempfile::TempDir;

    fn layout(lines: Vec<PlacedLine>) -> ImageLayout {
        ImageLayout {
            canvas_size: 200,
            background: Color::rgb(0x1F, 0x2A, 0x44),
            logo: LogoSlot {
                top: 10,
                max_width: 50,
            },
            lines,
            jpeg_quality: 95,
        }
    }

    fn headline(text: &str) -> PlacedLine {
        PlacedLine {
            role: TextRole::Headline,
            text: text.to_string(),
            x: 20.0,
            y: 80.0,
            size: 16.0,
            color: Color::WHITE,
            width: 0.0,
        }
    }

    fn close(a: u8, b: u8) -> bool {
        a.abs_diff(b) <= 6
    }

    #[test]
    fn test_renders_square_jpeg() {
        let backend = RasterBackend::bitmap_only();
        let bytes = backend.render(&layout(vec![headline("HOLA")])).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (200, 200));

        let corner = decoded.get_pixel(0, 0);
        assert!(close(corner[0], 0x1F) && close(corner[1], 0x2A) && close(corner[2], 0x44));
    }

    #[test]
    fn test_text_changes_pixels() {
        let backend = RasterBackend::bitmap_only();
        let blank = backend.render(&layout(vec![])).unwrap();
        let written = backend.render(&layout(vec![headline("HOLA")])).unwrap();

        assert_ne!(blank, written);
    }

    #[test]
    fn test_render_is_deterministic() {
        let backend = RasterBackend::bitmap_only();
        let layout = layout(vec![headline("MISMA FRASE")]);

        assert_eq!(backend.render(&layout).unwrap(), backend.render(&layout).unwrap());
    }

    #[test]
    fn test_zero_canvas_is_an_error() {
        let backend = RasterBackend::bitmap_only();
        let mut layout = layout(vec![]);
        layout.canvas_size = 0;

        assert!(matches!(backend.render(&layout), Err(RenderError::Backend(_))));
    }

    #[test]
    fn test_missing_assets_degrade() {
        let dir = TempDir::new().unwrap();
        let backend = RasterBackend::new(&RasterAssets {
            font_path: Some(dir.path().join("missing.ttf")),
            logo_path: Some(dir.path().join("missing.png")),
            ..Default::default()
        });

        assert!(!backend.has_font());
        assert!(!backend.has_logo());
        assert_eq!(backend.measure_text_width("ABC", 16.0), bitmap::measure("ABC", 16.0));
        assert!(backend.render(&layout(vec![headline("SIN LOGO")])).is_ok());
    }

    #[test]
    fn test_garbage_font_file_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        let backend = RasterBackend::new(&RasterAssets {
            font_path: Some(path),
            ..Default::default()
        });

        assert!(!backend.has_font());
    }

    #[test]
    fn test_logo_is_scaled_and_centered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        RgbaImage::from_pixel(100, 20, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let backend = RasterBackend::new(&RasterAssets {
            font_path: None,
            logo_path: Some(path),
            logo_max_width: 50,
        });
        assert!(backend.has_logo());
        assert_eq!(backend.logo.as_ref().map(|l| l.dimensions()), Some((50, 10)));

        let bytes = backend.render(&layout(vec![])).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();

        // 100x20 scaled into a 50px slot is 50x10, centered at x 75..125, y 10..20
        let inside = decoded.get_pixel(100, 15);
        assert!(inside[0] > 200 && inside[1] < 60);
        let outside = decoded.get_pixel(60, 15);
        assert!(close(outside[0], 0x1F));
    }

    #[test]
    fn test_narrower_slot_still_fits_logo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        RgbaImage::from_pixel(100, 20, Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        // Loaded at natural width, drawn into the 50px slot of the layout
        let backend = RasterBackend::new(&RasterAssets {
            logo_path: Some(path),
            ..Default::default()
        });
        assert_eq!(backend.logo.as_ref().map(|l| l.dimensions()), Some((100, 20)));

        let bytes = backend.render(&layout(vec![])).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();

        let inside = decoded.get_pixel(100, 15);
        assert!(inside[0] > 200 && inside[1] < 60);
        let outside = decoded.get_pixel(60, 15);
        assert!(close(outside[0], 0x1F));
    }
}
