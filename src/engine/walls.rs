use glam::{DVec2, IVec2};
use rayon::prelude::*;

use crate::{
    engine::{
        floor,
        shading::{SIDE_X_DARKEN, shade},
        types::{CastContext, ColumnSlice, Viewer},
    },
    renderer::Rgba,
    world::{
        geometry::Rect,
        grid::GridMap,
        texture::{CellHit, Side, TextureSource},
    },
};

/// Side distance used for an axis the ray never crosses.
pub const UNREACHABLE: f64 = 1e30;

/// Result of one DDA walk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub ray: DVec2,
    /// Last cell visited; the wall cell on a hit.
    pub map: IVec2,
    pub side: Side,
    /// Perpendicular distance to the camera plane.
    pub perp: f64,
    /// Fractional hit position along the face, `0.0 .. 1.0`.
    pub wall_x: f64,
    /// Grid value of the hit cell, `None` = no geometry.
    pub value: Option<i32>,
}

impl RayHit {
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.value.is_some()
    }
}

#[inline]
fn axis_delta(d: f64) -> f64 {
    if d == 0.0 { UNREACHABLE } else { (1.0 / d).abs() }
}

/// Walk the grid from `origin` along `ray` until a non-empty cell within
/// `render_distance` is found, the distance is exceeded or the ray leaves
/// the grid.
pub fn cast_ray<G: GridMap + ?Sized>(
    grid: &G,
    layer: usize,
    origin: DVec2,
    ray: DVec2,
    render_distance: f64,
) -> RayHit {
    let (gw, gh) = grid.size();
    let mut map = origin.floor().as_ivec2();
    let delta = DVec2::new(axis_delta(ray.x), axis_delta(ray.y));

    let (step_x, mut side_x) = if ray.x < 0.0 {
        (-1, (origin.x - map.x as f64) * delta.x)
    } else {
        (1, (map.x as f64 + 1.0 - origin.x) * delta.x)
    };
    let (step_y, mut side_y) = if ray.y < 0.0 {
        (-1, (origin.y - map.y as f64) * delta.y)
    } else {
        (1, (map.y as f64 + 1.0 - origin.y) * delta.y)
    };

    loop {
        let side = if side_x < side_y {
            side_x += delta.x;
            map.x += step_x;
            Side::X
        } else {
            side_y += delta.y;
            map.y += step_y;
            Side::Y
        };
        let perp = match side {
            Side::X => side_x - delta.x,
            Side::Y => side_y - delta.y,
        };

        let inside = map.x >= 0 && map.y >= 0 && (map.x as usize) < gw && (map.y as usize) < gh;
        let value = if !inside || perp > render_distance {
            None
        } else {
            match grid.cell(layer, map.x as usize, map.y as usize) {
                v if v > 0 => Some(v),
                _ => continue,
            }
        };

        let along = match side {
            Side::X => origin.y + perp * ray.y,
            Side::Y => origin.x + perp * ray.x,
        };
        return RayHit {
            ray,
            map,
            side,
            perp,
            wall_x: along - along.floor(),
            value,
        };
    }
}

/// Screen rows `[start, end)` of a wall slice on `layer`.
///
/// Integer math saturates so a camera pressed against a wall (`perp → 0`)
/// yields a huge but well-defined span.
pub fn wall_span(view: &Viewer, h: usize, perp: f64, layer: usize) -> (i32, i32) {
    let h = h as i32;
    let line_height = (h as f64 / perp) as i32;
    let start = (-line_height / 2 + h / 2)
        .saturating_add(view.pitch)
        .saturating_add((view.cam_z / perp) as i32)
        .saturating_sub(line_height.saturating_mul(layer as i32));
    (start, start.saturating_add(line_height))
}

/// Texture column for a hit, mirrored so faces seen from the positive side
/// keep their orientation.
pub fn texture_column(hit: &RayHit, tex_size: i32) -> i32 {
    let tex_x = ((hit.wall_x * tex_size as f64) as i32).clamp(0, tex_size - 1);
    let mirrored = match hit.side {
        Side::X => hit.ray.x > 0.0,
        Side::Y => hit.ray.y < 0.0,
    };
    if mirrored { tex_size - tex_x - 1 } else { tex_x }
}

/// Cast column `x` of `layer` and build its slice. The destination span is
/// filled even without geometry since the floor pass starts below it.
pub fn cast_column<G, T>(ctx: &CastContext<G, T>, x: usize, layer: usize) -> (RayHit, ColumnSlice)
where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    let view = ctx.view;
    let ray = view.ray(x, ctx.screen.w);
    let hit = cast_ray(ctx.grid, layer, view.pose.pos, ray, view.render_distance);
    let (start, end) = wall_span(view, ctx.screen.h, hit.perp, layer);

    let mut slice = ColumnSlice {
        dst: Rect::new(x as i32, start, x as i32 + 1, end),
        hit: hit.is_hit().then_some(hit.perp),
        ..ColumnSlice::default()
    };

    let Some(value) = hit.value else {
        return (hit, slice);
    };
    slice.texture = ctx.textures.wall_texture(CellHit {
        x: hit.map.x as usize,
        y: hit.map.y as usize,
        layer,
        side: hit.side,
        value,
    });
    if slice.texture.is_some() {
        let tex_x = texture_column(&hit, view.tex_size);
        slice.src = ctx.tex_slices[tex_x as usize];
        slice.tint = shade(hit.perp, 0.0, ctx.light);
        if hit.side == Side::X {
            slice.tint = slice.tint.darken(SIDE_X_DARKEN);
        }
    }
    (hit, slice)
}

/// Upper layers: walls only.
pub fn cast_layer<G, T>(ctx: &CastContext<G, T>, layer: usize, slices: &mut [ColumnSlice])
where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    slices.par_iter_mut().enumerate().for_each(|(x, slice)| {
        *slice = cast_column(ctx, x, layer).1;
    });
}

/// Layer 0: walls, the z-buffer and the floor columns below each wall.
///
/// `floor` is the column-major floor buffer (`w * h` pixels).
pub fn cast_base_layer<G, T>(
    ctx: &CastContext<G, T>,
    slices: &mut [ColumnSlice],
    zbuffer: &mut [f64],
    floor: &mut [Rgba],
) where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    let h = ctx.screen.h;
    slices
        .par_iter_mut()
        .zip(zbuffer.par_iter_mut())
        .zip(floor.par_chunks_mut(h))
        .enumerate()
        .for_each(|(x, ((slice, z), column))| {
            let (hit, s) = cast_column(ctx, x, 0);
            *slice = s;
            *z = if hit.is_hit() {
                hit.perp
            } else {
                ctx.view.render_distance
            };
            floor::fill_column(ctx, column, &hit, s.dst.max.y);
        });
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::Tint,
        world::{camera::CameraPose, grid::Grid},
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    /// 5×5, border walls, one pillar (value 2) at (3, 2).
    fn room() -> Grid {
        Grid::from_rows(&[
            &[1, 1, 1, 1, 1],
            &[1, 0, 0, 0, 1],
            &[1, 0, 0, 2, 1],
            &[1, 0, 0, 0, 1],
            &[1, 1, 1, 1, 1],
        ])
        .unwrap()
    }

    fn viewer(pitch: i32, cam_z: f64) -> Viewer {
        Viewer {
            pose: CameraPose::default(),
            dir: DVec2::X,
            plane: DVec2::NEG_Y,
            fov_depth: 1.0,
            cam_z,
            pitch,
            render_distance: f64::INFINITY,
            tex_size: 64,
        }
    }

    /* ───────────── DDA ───────────── */

    #[test]
    fn hits_pillar_face_at_axis_distance() {
        let g = room();
        let hit = cast_ray(&g, 0, DVec2::new(1.5, 2.5), DVec2::X, f64::INFINITY);
        assert_eq!(hit.value, Some(2));
        assert_eq!(hit.map, IVec2::new(3, 2));
        assert_eq!(hit.side, Side::X);
        // face at x = 3, camera at x = 1.5
        assert!(close(hit.perp, 1.5));
        assert!(close(hit.wall_x, 0.5));
    }

    #[test]
    fn perpendicular_distance_has_no_fisheye() {
        let g = room();
        // oblique ray with unit forward component: perp = x distance
        let hit = cast_ray(&g, 0, DVec2::new(1.5, 2.5), DVec2::new(1.0, 0.2), f64::INFINITY);
        assert_eq!(hit.map, IVec2::new(3, 2));
        assert!(close(hit.perp, 1.5));
        assert!(close(hit.wall_x, 0.8));
    }

    #[test]
    fn axis_aligned_rays_are_finite() {
        let g = room();
        for ray in [DVec2::X, DVec2::NEG_X, DVec2::Y, DVec2::NEG_Y] {
            let hit = cast_ray(&g, 0, DVec2::new(2.5, 1.5), ray, f64::INFINITY);
            assert!(hit.is_hit());
            assert!(hit.perp.is_finite());
            assert!(hit.wall_x.is_finite());
        }
    }

    #[test]
    fn empty_grid_has_no_geometry() {
        let g = Grid::new(vec![vec![vec![0; 4]; 4]]).unwrap();
        let hit = cast_ray(&g, 0, DVec2::new(1.5, 1.5), DVec2::new(1.0, 0.3), f64::INFINITY);
        assert!(!hit.is_hit());
        assert_eq!(hit.map.x, 4);
        assert!(close(hit.perp, 2.5));
    }

    #[test]
    fn render_distance_cutoff() {
        let g = room();
        let origin = DVec2::new(1.5, 2.5);
        let eps = 1e-6;
        assert!(!cast_ray(&g, 0, origin, DVec2::X, 1.5 - eps).is_hit());
        assert!(cast_ray(&g, 0, origin, DVec2::X, 1.5 + eps).is_hit());
    }

    #[test]
    fn origin_outside_grid_exits_immediately() {
        let g = room();
        let hit = cast_ray(&g, 0, DVec2::new(-3.0, 2.5), DVec2::X, f64::INFINITY);
        assert!(!hit.is_hit());
    }

    #[test]
    fn upper_layers_read_their_own_cells() {
        let g = Grid::from_layer_rows(&[
            &[&[0, 0, 0, 1]],
            &[&[0, 5, 0, 0]],
        ])
        .unwrap();
        let origin = DVec2::new(0.5, 0.5);
        assert_eq!(cast_ray(&g, 0, origin, DVec2::X, f64::INFINITY).value, Some(1));
        assert_eq!(cast_ray(&g, 1, origin, DVec2::X, f64::INFINITY).value, Some(5));
        // layer 7 reuses layer 1
        assert_eq!(cast_ray(&g, 7, origin, DVec2::X, f64::INFINITY).value, Some(5));
    }

    /* ───────────── projection ───────────── */

    #[test]
    fn span_height_and_stacking() {
        let v = viewer(0, 0.0);
        assert_eq!(wall_span(&v, 8, 1.5, 0), (2, 7));
        // layer 1 sits one wall height higher
        assert_eq!(wall_span(&v, 8, 1.5, 1), (-3, 2));
        // pitch moves everything down
        assert_eq!(wall_span(&viewer(3, 0.0), 8, 1.5, 0), (5, 10));
    }

    #[test]
    fn zero_distance_saturates() {
        let v = viewer(0, 0.0);
        let (start, end) = wall_span(&v, 600, 0.0, 0);
        assert!(start <= 0 && end >= 600);
        // stacked copies of an infinitely tall wall end above the screen
        let (_, end) = wall_span(&v, 600, 0.0, 3);
        assert!(end <= 0);
    }

    #[test]
    fn texture_column_mirrors_between_opposite_faces() {
        let tex = 64;
        for wall_x in [0.0, 0.1, 0.37, 0.5, 0.99] {
            let from_neg = RayHit {
                ray: DVec2::NEG_X,
                map: IVec2::ZERO,
                side: Side::X,
                perp: 1.0,
                wall_x,
                value: Some(1),
            };
            let from_pos = RayHit {
                ray: DVec2::X,
                ..from_neg
            };
            let a = texture_column(&from_neg, tex);
            let b = texture_column(&from_pos, tex);
            assert_eq!(b, tex - 1 - a, "wall_x = {wall_x}");
        }
    }

    #[test]
    fn y_faces_mirror_on_negative_rays() {
        let hit = RayHit {
            ray: DVec2::NEG_Y,
            map: IVec2::ZERO,
            side: Side::Y,
            perp: 1.0,
            wall_x: 0.25,
            value: Some(1),
        };
        assert_eq!(texture_column(&hit, 4), 2);
        assert_eq!(texture_column(&RayHit { ray: DVec2::Y, ..hit }, 4), 1);
    }

    #[test]
    fn x_side_faces_are_darker() {
        use crate::{
            engine::{buffers::texture_slices, types::Lighting, types::Screen},
            world::texture::{Materials, Texture, TextureBank},
        };
        let mut bank = TextureBank::default_with_checker();
        let id = bank.insert("W", Texture::solid("W", 4, 4, 0xFF_FFFFFF)).unwrap();
        let mut mats = Materials::new(bank);
        mats.set_walls(vec![id, id]).unwrap();

        let g = room();
        let mut v = viewer(0, 0.0);
        v.pose.pos = DVec2::new(1.5, 2.5);
        v.tex_size = 4;
        let light = Lighting {
            falloff: 0.0,
            global_illumination: 0.0,
            min: Tint::BLACK,
            max: Tint::WHITE,
        };
        let slices = texture_slices(4);
        let ctx = CastContext {
            view: &v,
            screen: Screen::new(8, 8),
            grid: &g,
            textures: &mats,
            light: &light,
            tex_slices: &slices,
        };
        // column 4 of 8 is the exact centre ray (camera_x = 0)
        let (hit, slice) = cast_column(&ctx, 4, 0);
        assert_eq!(hit.side, Side::X);
        assert_eq!(slice.texture, Some(id));
        assert_eq!(slice.tint, Tint::WHITE.darken(SIDE_X_DARKEN));
        assert_eq!(slice.src, Rect::new(1, 0, 2, 4));
        assert_eq!(slice.dst, Rect::new(4, 2, 5, 7));
        assert_eq!(slice.hit, Some(1.5));
    }
}
