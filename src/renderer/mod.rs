//! Rendering abstraction layer.
//!
//! *The engine never touches a pixel buffer directly.*
//! Its draw step issues rectangle fills, scaled texture blits and one
//! floor-buffer blit to a type that implements [`Renderer`].
//!
//! * You can plug multiple back-ends (`renderer::software`, a GPU one, …)
//!   without changing the engine.
//! * All blits are nearest-neighbour; the raycaster already works in whole
//!   screen columns.

use crate::world::{geometry::Rect, texture::Texture};

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Rgba = u32;

/// Pack 8-bit channels into an [`Rgba`].
#[inline]
pub const fn pack(r: u8, g: u8, b: u8, a: u8) -> Rgba {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split an [`Rgba`] into `(r, g, b, a)`.
#[inline]
pub const fn unpack(px: Rgba) -> (u8, u8, u8, u8) {
    ((px >> 16) as u8, (px >> 8) as u8, px as u8, (px >> 24) as u8)
}

/// Colour multiplier applied to a blit; `WHITE` leaves texels unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Tint {
    pub const WHITE: Tint = Tint::rgb(255, 255, 255);
    pub const BLACK: Tint = Tint::rgb(0, 0, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Subtract `amount` from every colour channel, saturating at 0.
    #[inline]
    pub fn darken(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_sub(amount),
            g: self.g.saturating_sub(amount),
            b: self.b.saturating_sub(amount),
            a: self.a,
        }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Tint::WHITE
    }
}

/// Multiply a texel's colour channels by `tint`; alpha is kept.
#[inline]
pub fn modulate(px: Rgba, tint: Tint) -> Rgba {
    let (r, g, b, a) = unpack(px);
    let mul = |c: u8, t: u8| ((c as u32 * t as u32) / 255) as u8;
    pack(mul(r, tint.r), mul(g, tint.g), mul(b, tint.b), a)
}

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
/// Software callers typically forward it to their window-manager;
/// GPU back-ends can ignore the slice because they never allocate it.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Flat colour fill; `dst` is clipped to the frame.
    fn fill_rect(&mut self, dst: Rect, color: Rgba);

    /// Scale the `src` region of `tex` into `dst`, multiplying by `tint`.
    /// Texels with zero alpha are skipped.
    fn draw_texture(&mut self, tex: &Texture, src: Rect, dst: Rect, tint: Tint);

    /// Overlay a full-frame **column-major** buffer (`pixels[x * height + y]`).
    /// Pixels with zero alpha are skipped.
    fn blit_columns(&mut self, pixels: &[Rgba], width: usize, height: usize);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&[Rgba], w, h)` is run exactly once per frame.
    /// * Software caller passes `|fb, w, h| window.update_with_buffer(fb, w, h)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

pub mod software;
pub use software::Software;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        let px = pack(0x12, 0x34, 0x56, 0x78);
        assert_eq!(px, 0x78_123456);
        assert_eq!(unpack(px), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn modulate_white_is_identity() {
        assert_eq!(modulate(0xFF_80C0FF, Tint::WHITE), 0xFF_80C0FF);
        assert_eq!(modulate(0x80_80C0FF, Tint::BLACK), 0x80_000000);
    }

    #[test]
    fn darken_saturates() {
        let t = Tint::rgb(10, 100, 255).darken(12);
        assert_eq!((t.r, t.g, t.b, t.a), (0, 88, 243, 255));
    }
}
