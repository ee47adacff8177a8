use std::fmt;
use std::path::{Path, PathBuf};

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

/// Error returned by [`FontSystem::load_font`] and [`FontSystem::load_file`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(usize);

/// Common locations probed when no font is given on the command line.
pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Single-channel coverage bitmap, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextBitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height) as usize],
        }
    }

    /// Max-blends a `w` x `h` glyph coverage into the bitmap at `(x, y)`, clipped.
    pub fn blit(&mut self, x: i32, y: i32, w: usize, h: usize, coverage: &[u8]) {
        for row in 0..h {
            let dy = y + row as i32;
            if dy < 0 || dy >= self.height as i32 {
                continue;
            }
            for col in 0..w {
                let dx = x + col as i32;
                if dx < 0 || dx >= self.width as i32 {
                    continue;
                }
                let Some(&src) = coverage.get(row * w + col) else { continue };
                let dst = &mut self.pixels[dy as usize * self.width as usize + dx as usize];
                *dst = (*dst).max(src);
            }
        }
    }
}

/// Owns a collection of loaded fonts.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<FontId, FontLoadError> {
        let bytes = std::fs::read(path)
            .map_err(|e| FontLoadError(format!("{}: {e}", path.display())))?;
        self.load_font(&bytes)
    }

    /// First entry of [`SYSTEM_FONT_PATHS`] that exists.
    pub fn find_system_font() -> Option<PathBuf> {
        SYSTEM_FONT_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }

    /// Lays out `text` at `px` pixels and rasterizes it into a tight bitmap
    /// with `padding` pixels on every side.
    ///
    /// Returns `None` if `id` is unknown.
    pub fn rasterize(&self, id: FontId, text: &str, px: f32, padding: u32) -> Option<TextBitmap> {
        let font = self.fonts.get(id.0)?;

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, px, 0));

        let glyphs = layout.glyphs();
        let width = glyphs
            .iter()
            .map(|g| (g.x + g.width as f32).ceil() as u32)
            .max()
            .unwrap_or(0);
        let height = glyphs
            .iter()
            .map(|g| (g.y + g.height as f32).ceil() as u32)
            .max()
            .unwrap_or(0)
            .max(px.ceil() as u32);

        let mut bitmap = TextBitmap::new(width + 2 * padding, height + 2 * padding);
        for g in glyphs {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            let (metrics, coverage) = font.rasterize_config(g.key);
            bitmap.blit(
                g.x.round() as i32 + padding as i32,
                g.y.round() as i32 + padding as i32,
                metrics.width,
                metrics.height,
                &coverage,
            );
        }

        log::debug!(
            "rasterized {} glyphs into {}x{}",
            glyphs.len(),
            bitmap.width,
            bitmap.height
        );
        Some(bitmap)
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        assert!(fonts.load_font(b"definitely not a font").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let mut fonts = FontSystem::new();
        let err = fonts
            .load_file(Path::new("/nonexistent/font.ttf"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn unknown_id_rasterizes_nothing() {
        let fonts = FontSystem::new();
        assert!(fonts.rasterize(FontId(3), "hi", 16.0, 0).is_none());
    }

    #[test]
    fn blit_clips_and_max_blends() {
        let mut bmp = TextBitmap::new(4, 3);
        bmp.blit(-1, -1, 3, 3, &[9; 9]);
        bmp.blit(1, 1, 1, 1, &[200]);
        bmp.blit(3, 2, 2, 2, &[5; 4]);

        assert_eq!(
            bmp.pixels,
            vec![
                9, 9, 0, 0, //
                9, 200, 0, 0, //
                0, 0, 0, 5,
            ]
        );
    }
}
