//! Raster image model the canvas consumes.
//!
//! Images come in three pixel formats, kept as a tagged variant so every consumer handles all
//! of them exhaustively. DPI is carried per image; the canvas honors it when rendering, so a
//! 192 DPI image occupies half its pixel size on a 96 DPI canvas.

use crate::geometry::{Color, Vector2};

/// A palette entry reference paired with an alpha value; two bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PalettedPixel {
    /// Index into the image's palette.
    pub index: u8,

    /// Alpha the palette color is drawn with.
    pub alpha: u8,
}

/// Pixel storage for each supported format.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Four bytes per pixel, straight alpha.
    Rgba(Vec<Color>),

    /// Palette index and alpha, two bytes per pixel.
    PalettedAlpha {
        pixels: Vec<PalettedPixel>,
        palette: Vec<Color>,
    },

    /// Alpha only, one byte per pixel; colored by tint at draw time.
    AlphaMask(Vec<u8>),
}

/// A pixel buffer with a size and a DPI.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: ImageData,
    width: u32,
    height: u32,
    dpi: Vector2,
}

/// The default DPI images are assumed to use, matching the 1/96 inch unit of the canvas.
pub const BASE_DPI: f32 = 96.0;

impl Image {
    /// Construct an RGBA image. The buffer length must match the size.
    pub fn rgba(pixels: Vec<Color>, width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer does not match image size"
        );
        Self {
            data: ImageData::Rgba(pixels),
            width,
            height,
            dpi: Vector2::new(BASE_DPI, BASE_DPI),
        }
    }

    /// Construct a paletted image with per-pixel alpha.
    pub fn paletted_alpha(
        pixels: Vec<PalettedPixel>,
        palette: Vec<Color>,
        width: u32,
        height: u32,
    ) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer does not match image size"
        );
        Self {
            data: ImageData::PalettedAlpha { pixels, palette },
            width,
            height,
            dpi: Vector2::new(BASE_DPI, BASE_DPI),
        }
    }

    /// Construct an alpha-only mask.
    pub fn alpha_mask(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        assert_eq!(
            pixels.len(),
            (width * height) as usize,
            "pixel buffer does not match image size"
        );
        Self {
            data: ImageData::AlphaMask(pixels),
            width,
            height,
            dpi: Vector2::new(BASE_DPI, BASE_DPI),
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Size of the image in its own pixels.
    #[inline]
    pub const fn size(&self) -> Vector2 {
        Vector2::new(self.width as f32, self.height as f32)
    }

    #[inline]
    pub const fn dpi(&self) -> Vector2 {
        self.dpi
    }

    pub fn set_dpi(&mut self, dpi: Vector2) {
        debug_assert!(dpi.x > 0.0 && dpi.y > 0.0, "DPI must be positive");
        self.dpi = dpi;
    }

    /// Size of the image in canvas units, honoring its DPI.
    pub fn canvas_size(&self) -> Vector2 {
        Vector2::new(
            self.width as f32 * BASE_DPI / self.dpi.x,
            self.height as f32 * BASE_DPI / self.dpi.y,
        )
    }

    #[inline]
    pub const fn data(&self) -> &ImageData {
        &self.data
    }

    /// Look up a palette color.
    ///
    /// Out-of-range palette indices are not an error; they resolve to white so a mangled image
    /// stays visible instead of failing the frame.
    pub fn palette_color(&self, index: u8, alpha: u8) -> Color {
        let palette = match &self.data {
            ImageData::PalettedAlpha { palette, .. } => palette.as_slice(),
            _ => &[],
        };
        palette
            .get(index as usize)
            .copied()
            .unwrap_or(Color::WHITE)
            .with_alpha(alpha)
    }

    /// Read a single pixel, resolving palettes and masks to a final color. Out-of-bounds
    /// coordinates read as opaque white.
    pub fn get(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::WHITE;
        }
        let index = (y * self.width + x) as usize;
        match &self.data {
            ImageData::Rgba(pixels) => pixels[index],
            ImageData::PalettedAlpha { pixels, .. } => {
                let pixel = pixels[index];
                self.palette_color(pixel.index, pixel.alpha)
            }
            ImageData::AlphaMask(pixels) => Color::WHITE.with_alpha(pixels[index]),
        }
    }

    /// Overwrite every pixel with the given color.
    ///
    /// Only valid for RGBA images; paletted and mask formats have no single-color
    /// representation and asserting here catches the mismatch early.
    pub fn clear(&mut self, color: Color) {
        match &mut self.data {
            ImageData::Rgba(pixels) => pixels.fill(color),
            _ => panic!("clear(color) requires an RGBA image"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_are_white() {
        let image = Image::rgba(vec![Color::BLACK; 4], 2, 2);
        assert_eq!(image.get(0, 0), Color::BLACK);
        assert_eq!(image.get(2, 0), Color::WHITE);
        assert_eq!(image.get(0, 5), Color::WHITE);
    }

    #[test]
    fn palette_lookup_falls_back_to_white() {
        let palette = vec![Color::rgb(1, 2, 3)];
        let pixels = vec![
            PalettedPixel { index: 0, alpha: 200 },
            PalettedPixel { index: 9, alpha: 50 },
        ];
        let image = Image::paletted_alpha(pixels, palette, 2, 1);
        assert_eq!(image.get(0, 0), Color::new(1, 2, 3, 200));
        assert_eq!(image.get(1, 0), Color::new(255, 255, 255, 50));
    }

    #[test]
    fn alpha_mask_reads_as_white_with_coverage() {
        let image = Image::alpha_mask(vec![0, 128, 255], 3, 1);
        assert_eq!(image.get(1, 0), Color::WHITE.with_alpha(128));
    }

    #[test]
    fn dpi_scales_canvas_size() {
        let mut image = Image::rgba(vec![Color::WHITE; 16], 4, 4);
        image.set_dpi(Vector2::new(192.0, 96.0));
        assert_eq!(image.canvas_size(), Vector2::new(2.0, 4.0));
    }

    #[test]
    #[should_panic(expected = "RGBA")]
    fn clear_rejects_masks() {
        let mut image = Image::alpha_mask(vec![0; 4], 2, 2);
        image.clear(Color::BLACK);
    }
}
