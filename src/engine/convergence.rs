use glam::DVec3;

use crate::{
    engine::{
        buffers::LayerBuffer,
        floor::floor_point,
        sprites::SpriteCast,
        types::{CastContext, Viewer},
        walls::cast_ray,
    },
    world::{geometry::Line3d, grid::GridMap, texture::TextureSource},
};

/// Nearest thing under the exact screen centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Convergence {
    /// 3-D distance from the eye.
    pub distance: f64,
    pub point: DVec3,
    /// Index into the sprite list passed to `update`, if a sprite won.
    pub sprite: Option<usize>,
}

impl Convergence {
    /// Point `depth` (camera-space units) ahead along heading and pitch.
    fn at(view: &Viewer, depth: f64, sprite: Option<usize>) -> Self {
        let pose = &view.pose;
        let line = Line3d::from_base_angle(pose.eye(), pose.heading, pose.pitch, depth * view.fov_depth);
        Self {
            distance: line.length(),
            point: line.p2,
            sprite,
        }
    }
}

/// Resolve the convergence point once all casting is done.
///
/// Wall candidates come from the centre column of every layer, the floor
/// candidate from re-casting the centre ray on layer 0, sprite candidates
/// from `sprites` (`(list index, cast)` pairs).
pub fn converge<G, T>(
    ctx: &CastContext<G, T>,
    layers: &[LayerBuffer],
    sprites: impl IntoIterator<Item = (usize, SpriteCast)>,
) -> Option<Convergence>
where
    G: GridMap + ?Sized,
    T: TextureSource + ?Sized,
{
    let (cx, cy) = ctx.screen.center();
    if cx < 0 || cy < 0 {
        return None;
    }
    let view = ctx.view;
    let mut best: Option<Convergence> = None;
    let mut offer = |depth: f64, sprite: Option<usize>| {
        let c = Convergence::at(view, depth, sprite);
        if best.is_none_or(|b| c.distance < b.distance) {
            best = Some(c);
        }
    };

    /* walls */
    for layer in layers {
        let slice = &layer.slices[cx as usize];
        if let Some(perp) = slice.hit {
            if slice.dst.min.y <= cy && cy <= slice.dst.max.y {
                offer(perp, None);
            }
        }
    }

    /* floor below the base layer */
    if let Some(base) = layers.first() {
        let draw_end = base.slices[cx as usize].dst.max.y;
        if draw_end >= 0 && cy >= draw_end {
            let ray = view.ray(cx as usize, ctx.screen.w);
            let hit = cast_ray(ctx.grid, 0, view.pose.pos, ray, view.render_distance);
            if let Some((dist, _)) = floor_point(view, ctx.screen.h, &hit, cy as usize, ctx.grid.size())
            {
                offer(dist, None);
            }
        }
    }

    /* sprites */
    for (index, cast) in sprites {
        if let Some(depth) = cast.center_depth {
            offer(depth, Some(index));
        }
    }

    best
}
