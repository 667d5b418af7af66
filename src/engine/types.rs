use glam::DVec2;

use crate::{
    renderer::Tint,
    world::{camera::CameraPose, geometry::Rect, texture::TextureId},
};

/// Constants that depend on the *frame-buffer*, not on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    pub half_w: i32, // pre-derived for speed
    pub half_h: i32, // pre-derived for speed
}

impl Screen {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            half_w: w as i32 / 2,
            half_h: h as i32 / 2,
        }
    }

    /// Pixel whose ray defines the convergence point.
    #[inline]
    pub fn center(&self) -> (i32, i32) {
        (self.half_w - 1, self.half_h - 1)
    }
}

/// Camera state reused by every cast task of one frame.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub pose: CameraPose,
    pub dir: DVec2,
    pub plane: DVec2,
    pub fov_depth: f64,
    /// Vertical eye offset in pixels at unit depth: `(pos_z − 0.5) · h`.
    pub cam_z: f64,
    /// Horizon shift in pixels derived from the pitch angle.
    pub pitch: i32,
    /// `f64::INFINITY` when unbounded.
    pub render_distance: f64,
    pub tex_size: i32,
}

impl Viewer {
    /// Ray direction through screen column `x`.
    #[inline]
    pub fn ray(&self, x: usize, w: usize) -> DVec2 {
        let camera_x = 2.0 * x as f64 / w as f64 - 1.0;
        self.dir + self.plane * camera_x
    }
}

/// Shading parameters shared by walls, floor and sprites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub falloff: f64,
    pub global_illumination: f64,
    pub min: Tint,
    pub max: Tint,
}

/// Read-only inputs shared by every column task of one frame.
pub struct CastContext<'a, G: ?Sized, T: ?Sized> {
    pub view: &'a Viewer,
    pub screen: Screen,
    pub grid: &'a G,
    pub textures: &'a T,
    pub light: &'a Lighting,
    pub tex_slices: &'a [Rect],
}

/// Render state of one screen column of one layer (wall or sprite).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColumnSlice {
    /// `None` = nothing drawn in this column.
    pub texture: Option<TextureId>,
    /// Texture region, one texel wide.
    pub src: Rect,
    /// Screen region, one pixel wide.
    pub dst: Rect,
    pub tint: Tint,
    /// Perpendicular distance of a real wall hit.
    pub hit: Option<f64>,
}
