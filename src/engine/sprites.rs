use crate::{
    engine::{
        buffers::SpriteSlot,
        shading::shade,
        types::{ColumnSlice, Lighting, Screen, Viewer},
    },
    world::{geometry::Rect, sprite::Sprite},
};

/// Outcome of casting one sprite.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpriteCast {
    /// Rectangle to report through [`Sprite::set_screen_rect`].
    pub rect: Option<Rect>,
    /// Camera-space depth if this sprite covers the centre pixel.
    pub center_depth: Option<f64>,
}

/// Projected billboard before occlusion.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Projection {
    depth: f64,
    screen_x: i32,
    width: i32,
    height: i32,
    /// Vertical shift of the billboard centre in pixels.
    v_move: i32,
    /// Clamped screen bounds, `x1`/`y1` exclusive.
    x0: i32,
    x1: i32,
    y0: i32,
    y1: i32,
}

/// Camera-space transform and screen extents, `None` if the sprite is
/// behind the camera, degenerate or entirely off-screen.
fn project<S: Sprite + ?Sized>(sprite: &S, view: &Viewer, screen: &Screen) -> Option<Projection> {
    let tex = sprite.texture_rect();
    if tex.is_empty() {
        return None;
    }
    let (w, h) = (screen.w as i32, screen.h as i32);
    let rel = sprite.position() - view.pose.pos;

    // inverse of the [plane, dir] camera matrix
    let (dir, plane) = (view.dir, view.plane);
    let inv_det = 1.0 / (plane.x * dir.y - dir.x * plane.y);
    let tx = inv_det * (dir.y * rel.x - dir.x * rel.y);
    let depth = inv_det * (-plane.y * rel.x + plane.x * rel.y);
    if !(depth > 0.0) {
        return None;
    }

    let screen_x = (w as f64 / 2.0 * (1.0 + tx / depth)) as i32;
    let scale = sprite.scale();
    let aspect = tex.width() as f64 / tex.height() as f64;
    let u_div = 1.0 / (scale * aspect);
    let v_div = 1.0 / scale;

    let v_offset = sprite
        .vertical_anchor()
        .vertical_offset(scale, screen.h);
    let v_move = -sprite.position_z() * h as f64 + v_offset;
    let v_move = ((v_move / depth) as i32)
        .saturating_add(view.pitch)
        .saturating_add((view.cam_z / depth) as i32);

    let size = (h as f64 / depth).abs();
    let height = (size / v_div) as i32;
    let width = (size / u_div) as i32;

    let x0 = screen_x.saturating_sub(width / 2);
    let x1 = screen_x.saturating_add(width / 2);
    if width == 0 || height == 0 || x0 < -width || x1 >= w.saturating_add(width) {
        return None;
    }

    let y0 = (-height / 2 + h / 2).saturating_add(v_move);
    let y1 = (height / 2 + h / 2).saturating_add(v_move);
    if y1 <= 0 || y0 >= h {
        return None; // entirely above or below the view
    }
    let (y0, y1) = (y0.max(0), y1.min(h - 1));
    if y0 >= y1 {
        return None;
    }

    Some(Projection {
        depth,
        screen_x,
        width,
        height,
        v_move,
        x0: x0.max(0),
        x1: x1.min(w),
        y0,
        y1,
    })
}

/// Texture row hit by screen row `y` of the projected sprite (fixed point,
/// 8 fractional bits).
#[inline]
fn texture_row(p: &Projection, y: i32, h: i32, tex_h: i32) -> i32 {
    let d = (y as i64 - p.v_move as i64) * 256 - h as i64 * 128 + p.height as i64 * 128;
    ((d * tex_h as i64 / p.height as i64) / 256) as i32
}

/// Cast one sprite against the z-buffer into `slot`.
///
/// `distance` is the sprite's distance from the camera used for the render
/// distance cutoff; occlusion uses the camera-space depth.
pub fn cast_sprite<S: Sprite + ?Sized>(
    sprite: &S,
    distance: f64,
    view: &Viewer,
    screen: &Screen,
    zbuffer: &[f64],
    light: &Lighting,
    always_rect: bool,
    slot: &mut SpriteSlot,
) -> SpriteCast {
    let beyond = distance > view.render_distance;
    if beyond && !always_rect {
        return SpriteCast::default();
    }
    let Some(p) = project(sprite, view, screen) else {
        return SpriteCast::default();
    };

    let rect = Rect::new(p.x0, p.y0, p.x1, p.y1);
    if beyond {
        return SpriteCast {
            rect: Some(rect),
            center_depth: None,
        };
    }

    let tex = sprite.texture_rect();
    let (tex_w, tex_h) = (tex.width(), tex.height());
    let h = screen.h as i32;
    let tex_y0 = texture_row(&p, p.y0, h, tex_h);
    let tex_y1 = texture_row(&p, p.y1 - 1, h, tex_h);

    let (cx, cy) = screen.center();
    let focusable = sprite.is_focusable();
    let tint = shade(p.depth, sprite.illumination(), light);
    let left = p.screen_x as i64 - p.width as i64 / 2;

    let mut drawn = false;
    let mut center_depth = None;
    for stripe in p.x0..p.x1 {
        if p.depth >= zbuffer[stripe as usize] {
            continue; // behind the wall
        }
        let tex_x = ((256 * (stripe as i64 - left) * tex_w as i64 / p.width as i64) / 256) as i32;
        if !(0..tex_w).contains(&tex_x) {
            continue;
        }

        let slices = slot.activate(screen.w);
        drawn = true;
        slices[stripe as usize] = ColumnSlice {
            texture: Some(sprite.texture()),
            src: Rect::new(
                tex.min.x + tex_x,
                tex.min.y + tex_y0,
                tex.min.x + tex_x + 1,
                tex.min.y + tex_y1 + 1,
            ),
            dst: Rect::new(stripe, p.y0, stripe + 1, p.y1),
            tint,
            hit: Some(p.depth),
        };

        if focusable && stripe == cx && (p.y0..=p.y1).contains(&cy) {
            center_depth = Some(p.depth);
        }
    }

    if drawn || always_rect {
        SpriteCast {
            rect: Some(rect),
            center_depth,
        }
    } else {
        slot.clear();
        SpriteCast::default()
    }
}
