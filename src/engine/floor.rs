use glam::DVec2;
use rayon::prelude::*;

use crate::{
    engine::{
        shading::shade,
        types::{CastContext, Viewer},
        walls::RayHit,
    },
    renderer::{Rgba, modulate},
    world::{
        grid::GridMap,
        texture::{Side, TextureSource},
    },
};

/// Rows handed to one floor task at minimum.
const FLOOR_MIN_ROWS: usize = 32;

/// Distance from the camera to the floor seen on screen row `y`.
#[inline]
pub fn row_distance(view: &Viewer, h: usize, y: usize) -> f64 {
    let h = h as f64;
    (h + 2.0 * view.cam_z) / (2.0 * (y as f64 - view.pitch as f64) - h)
}

/// Floor point at the foot of the wall face a ray hit.
pub fn wall_foot(hit: &RayHit) -> DVec2 {
    let map = hit.map.as_dvec2();
    match hit.side {
        Side::X if hit.ray.x > 0.0 => DVec2::new(map.x, map.y + hit.wall_x),
        Side::X => DVec2::new(map.x + 1.0, map.y + hit.wall_x),
        Side::Y if hit.ray.y > 0.0 => DVec2::new(map.x + hit.wall_x, map.y),
        Side::Y => DVec2::new(map.x + hit.wall_x, map.y + 1.0),
    }
}

/// World floor point and its distance for row `y` of a column, `None` when
/// the row looks above the horizon, past the render distance or off-grid.
pub fn floor_point(
    view: &Viewer,
    h: usize,
    hit: &RayHit,
    y: usize,
    grid_size: (usize, usize),
) -> Option<(f64, DVec2)> {
    let dist = row_distance(view, h, y);
    if !(dist > 0.0) || dist > view.render_distance {
        return None;
    }

    // similar triangles between the camera and the wall foot
    let weight = dist / hit.perp;
    let p = wall_foot(hit) * weight + view.pose.pos * (1.0 - weight);
    let inside = p.is_finite()
        && p.x >= 0.0
        && p.y >= 0.0
        && (p.x as usize) < grid_size.0
        && (p.y as usize) < grid_size.1;
    inside.then_some((dist, p))
}

/// Shaded floor texel for row `y`, `None` leaves the pixel transparent.
fn floor_texel<G, T>(ctx: &CastContext<G, T>, hit: &RayHit, y: usize) -> Option<Rgba>
where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    let (dist, p) = floor_point(ctx.view, ctx.screen.h, hit, y, ctx.grid.size())?;
    let tex = ctx.textures.floor_texture(p.x as usize, p.y as usize)?;

    let size = ctx.view.tex_size;
    let tx = (p.x * size as f64) as i32 % size;
    let ty = (p.y * size as f64) as i32 % size;
    Some(modulate(tex.texel(tx, ty), shade(dist, 0.0, ctx.light)))
}

/// Fill one column of the floor buffer from `draw_end` (the row below the
/// base-layer wall) to the bottom of the screen. Rows run in parallel.
pub fn fill_column<G, T>(ctx: &CastContext<G, T>, column: &mut [Rgba], hit: &RayHit, draw_end: i32)
where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    column.fill(0);

    let h = column.len();
    // a wall ending above the screen top leaves no floor in this column
    let start = if draw_end < 0 {
        h
    } else {
        (draw_end as usize).min(h)
    };

    column[start..]
        .par_iter_mut()
        .with_min_len(FLOOR_MIN_ROWS)
        .enumerate()
        .for_each(|(i, px)| {
            if let Some(c) = floor_texel(ctx, hit, start + i) {
                *px = c;
            }
        });
}
