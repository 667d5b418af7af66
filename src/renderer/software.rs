//! ---------------------------------------------------------------------------
//! Software (CPU) column renderer
//!
//! * Fills an internal `Vec<u32>` frame-buffer in **0xAARRGGBB** format.
//! * Relies on the engine issuing calls *back-to-front*, so no depth test is
//!   needed here; later calls simply overwrite earlier ones.
//! ---------------------------------------------------------------------------

use crate::{
    renderer::{Renderer, Rgba, Tint, modulate},
    world::{geometry::Rect, texture::Texture},
};

/// Clear colour used by `begin_frame`.
const CLEAR: Rgba = 0xFF_202020;

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,
}

impl Software {
    /// Finished pixels of the current frame (row-major).
    pub fn pixels(&self) -> &[Rgba] {
        &self.scratch
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.scratch[y * self.width + x]
    }

    /// Clip `r` against the frame; `None` if nothing is left.
    fn clip(&self, r: Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = r.min.x.max(0) as usize;
        let y0 = r.min.y.max(0) as usize;
        let x1 = r.max.x.clamp(0, self.width as i32) as usize;
        let y1 = r.max.y.clamp(0, self.height as i32) as usize;
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }

        /* dark-grey clear */
        self.scratch.fill(CLEAR);
    }

    fn fill_rect(&mut self, dst: Rect, color: Rgba) {
        let Some((x0, y0, x1, y1)) = self.clip(dst) else {
            return;
        };
        for y in y0..y1 {
            let row = y * self.width;
            self.scratch[row + x0..row + x1].fill(color);
        }
    }

    fn draw_texture(&mut self, tex: &Texture, src: Rect, dst: Rect, tint: Tint) {
        if src.is_empty() || dst.is_empty() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip(dst) else {
            return;
        };

        /* nearest sampling, fixed-point in i64 so huge near-wall spans
        cannot overflow */
        let (sw, sh) = (src.width() as i64, src.height() as i64);
        let (dw, dh) = (dst.width() as i64, dst.height() as i64);

        for y in y0..y1 {
            let v = src.min.y as i64 + (y as i64 - dst.min.y as i64) * sh / dh;
            let row = y * self.width;
            for x in x0..x1 {
                let u = src.min.x as i64 + (x as i64 - dst.min.x as i64) * sw / dw;
                let texel = tex.texel(u as i32, v as i32);
                if texel >> 24 == 0 {
                    continue; // transparent
                }
                self.scratch[row + x] = modulate(texel, tint);
            }
        }
    }

    fn blit_columns(&mut self, pixels: &[Rgba], width: usize, height: usize) {
        if height == 0 {
            return;
        }
        let w = width.min(self.width);
        let h = height.min(self.height);
        for (x, column) in pixels.chunks_exact(height).take(w).enumerate() {
            for (y, &px) in column.iter().take(h).enumerate() {
                if px >> 24 != 0 {
                    self.scratch[y * self.width + x] = px;
                }
            }
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
