//! Mutable pixel buffer abstraction shared by the scanner, rasterizer and
//! callout composer.
//!
//! Every stage that edits an image goes through [`PixelBuffer`], which
//! always supports in-place writes. Signed, bounds-checked accessors let
//! geometry code address pixels that may fall outside the image without
//! reading or writing out of bounds.

use image::{Rgba, RgbaImage};

use crate::types::{Dimensions, Pixel};

/// An RGBA pixel grid that can be read and written in place.
pub trait PixelBuffer {
    /// Width and height in pixels.
    fn dimensions(&self) -> Dimensions;

    /// Read the pixel at `(x, y)`, which must be in bounds.
    fn pixel(&self, x: u32, y: u32) -> Rgba<u8>;

    /// Write the pixel at `(x, y)`, which must be in bounds.
    fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>);

    /// Read the pixel at a signed coordinate, or `None` if it lies outside
    /// the buffer.
    fn read_at(&self, at: Pixel) -> Option<Rgba<u8>> {
        let (x, y) = in_bounds(self.dimensions(), at)?;
        Some(self.pixel(x, y))
    }

    /// Write the pixel at a signed coordinate. Writes outside the buffer
    /// are dropped; returns whether the write landed.
    fn write_at(&mut self, at: Pixel, color: Rgba<u8>) -> bool {
        match in_bounds(self.dimensions(), at) {
            Some((x, y)) => {
                self.set_pixel(x, y, color);
                true
            }
            None => false,
        }
    }
}

impl PixelBuffer for RgbaImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::of(self)
    }

    fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.get_pixel(x, y)
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        self.put_pixel(x, y, color);
    }
}

/// Convert a signed coordinate to unsigned indices if it lies inside.
fn in_bounds(dimensions: Dimensions, at: Pixel) -> Option<(u32, u32)> {
    if !dimensions.contains(at) {
        return None;
    }
    let x = u32::try_from(at.x).ok()?;
    let y = u32::try_from(at.y).ok()?;
    Some((x, y))
}
