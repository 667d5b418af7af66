use glam::{DVec2, DVec3};
use log::{debug, trace};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use crate::{
    engine::{
        buffers::{FloorBuffer, LayerBuffer, SpriteSlots, texture_slices},
        config::{ConfigError, EngineConfig, EngineError, validate_fov, validate_view},
        convergence::{Convergence, converge},
        order::comb_sort,
        sprites::{SpriteCast, cast_sprite},
        types::{CastContext, ColumnSlice, Lighting, Screen, Viewer},
        walls,
    },
    renderer::{Renderer, Rgba, Tint},
    world::{
        camera::CameraPose,
        geometry::{Rect, degrees, dist_squared, opposite_leg, radians},
        grid::GridMap,
        sprite::Sprite,
        texture::{TextureId, TextureSource},
    },
};

const DEFAULT_SKY: Rgba = 0xFF_4060A0;
const DEFAULT_FLOOR: Rgba = 0xFF_303030;

/// Frame orchestrator: owns the camera, the per-frame buffers and the
/// sprite worker pool.
///
/// Per frame: pose setters → [`Engine::update`] → [`Engine::draw`].
pub struct Engine<M: GridMap, T: TextureSource> {
    grid: M,
    textures: T,
    config: EngineConfig,

    pose: CameraPose,
    dir: DVec2,
    plane: DVec2,
    screen: Screen,
    render_layers: usize,

    /* per-frame buffers */
    layers: Vec<LayerBuffer>,
    zbuffer: Vec<f64>,
    floor: FloorBuffer,
    tex_slices: Vec<Rect>,
    sprite_slots: SpriteSlots,
    sprite_order: Vec<usize>,
    sprite_dist: Vec<f64>,
    sprite_pool: ThreadPool,
    convergence: Option<Convergence>,

    /* background */
    sky_texture: Option<TextureId>,
    floor_texture: Option<TextureId>,
    sky_color: Rgba,
    floor_color: Rgba,
}

impl<M: GridMap, T: TextureSource> Engine<M, T> {
    pub fn new(grid: M, textures: T, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        // the bound caps parallelism; more threads than cores buys nothing
        let sprite_threads = config.sprite_concurrency.min(rayon::current_num_threads());
        debug!("sprite pool: {sprite_threads} threads");
        let sprite_pool = ThreadPoolBuilder::new()
            .num_threads(sprite_threads)
            .thread_name(|i| format!("sprite-{i}"))
            .build()?;

        let render_layers = grid.num_layers().max(1);
        let mut engine = Self {
            grid,
            textures,
            pose: CameraPose::default(),
            dir: DVec2::X,
            plane: DVec2::NEG_Y,
            screen: Screen::new(config.width, config.height),
            render_layers,
            layers: Vec::new(),
            zbuffer: Vec::new(),
            floor: FloorBuffer::default(),
            tex_slices: texture_slices(config.tile_size),
            sprite_slots: SpriteSlots::with_capacity(0),
            sprite_order: Vec::new(),
            sprite_dist: Vec::new(),
            sprite_pool,
            convergence: None,
            sky_texture: None,
            floor_texture: None,
            sky_color: DEFAULT_SKY,
            floor_color: DEFAULT_FLOOR,
            config,
        };
        engine.refresh_vectors();
        engine.allocate();
        Ok(engine)
    }

    /*──────────────────────── configuration ─────────────────────────*/

    /// Resize the viewport; every per-column buffer is reallocated.
    pub fn set_view_size(&mut self, w: usize, h: usize) -> Result<(), ConfigError> {
        validate_view(w, h)?;
        debug!("view size {}×{} → {w}×{h}", self.screen.w, self.screen.h);
        self.config.width = w;
        self.config.height = h;
        self.screen = Screen::new(w, h);
        self.allocate();
        Ok(())
    }

    /// Horizontal FOV in degrees plus the depth scale of the direction
    /// vector.
    pub fn set_field_of_view(&mut self, degrees: f64, depth: f64) -> Result<(), ConfigError> {
        validate_fov(degrees, depth)?;
        debug!("fov {degrees}° depth {depth}");
        self.config.fov_degrees = degrees;
        self.config.fov_depth = depth;
        self.refresh_vectors();
        Ok(())
    }

    /// `None` or a negative distance means unbounded.
    pub fn set_render_distance(&mut self, distance: Option<f64>) {
        self.config.render_distance = distance.filter(|d| *d >= 0.0);
    }

    pub fn set_light_falloff(&mut self, falloff: f64) {
        self.config.light_falloff = falloff;
    }

    pub fn set_global_illumination(&mut self, illumination: f64) {
        self.config.global_illumination = illumination;
    }

    pub fn set_light_rgb(&mut self, min: Tint, max: Tint) {
        self.config.min_light = min;
        self.config.max_light = max;
    }

    /// Number of wall layers cast; layers past the grid's own count reuse
    /// its topmost layer.
    pub fn set_render_layers(&mut self, layers: usize) {
        let layers = layers.max(1);
        if layers != self.render_layers {
            debug!("render layers {} → {layers}", self.render_layers);
            self.render_layers = layers;
            self.layers = vec![LayerBuffer::new(self.screen.w); layers];
        }
    }

    pub fn set_always_set_sprite_screen_rect(&mut self, on: bool) {
        self.config.always_set_sprite_rect = on;
    }

    pub fn set_sky_texture(&mut self, id: Option<TextureId>) {
        self.sky_texture = id;
    }

    pub fn set_floor_texture(&mut self, id: Option<TextureId>) {
        self.floor_texture = id;
    }

    /// Flat colours painted behind the sky and floor textures.
    pub fn set_background_colors(&mut self, sky: Rgba, floor: Rgba) {
        self.sky_color = sky;
        self.floor_color = floor;
    }

    /*──────────────────────── camera pose ───────────────────────────*/

    pub fn set_pose(&mut self, pose: CameraPose) {
        self.pose = pose;
        self.refresh_vectors();
    }

    pub fn set_position(&mut self, pos: DVec2) {
        self.pose.pos = pos;
    }

    /// Eye height as a fraction of one cell.
    pub fn set_position_z(&mut self, z: f64) {
        self.pose.pos_z = z;
    }

    pub fn set_heading_angle(&mut self, heading: f64) {
        self.pose.heading = heading;
        self.refresh_vectors();
    }

    pub fn set_pitch_angle(&mut self, pitch: f64) {
        self.pose.pitch = pitch;
    }

    fn refresh_vectors(&mut self) {
        let fov = radians(self.config.fov_degrees);
        self.dir = self.pose.direction(self.config.fov_depth);
        self.plane = self.pose.plane(fov, self.config.fov_depth);
    }

    fn allocate(&mut self) {
        let (w, h) = (self.screen.w, self.screen.h);
        self.layers = vec![LayerBuffer::new(w); self.render_layers];
        self.zbuffer = vec![self.render_distance_or_inf(); w];
        self.floor = FloorBuffer::new(w, h);
        self.tex_slices = texture_slices(self.config.tile_size);
        self.sprite_slots.reset();
        self.convergence = None;
    }

    /*──────────────────────── accessors ─────────────────────────────*/

    pub fn grid(&self) -> &M {
        &self.grid
    }

    /// Edit the level between frames.
    pub fn grid_mut(&mut self) -> &mut M {
        &mut self.grid
    }

    pub fn textures(&self) -> &T {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut T {
        &mut self.textures
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn position(&self) -> DVec2 {
        self.pose.pos
    }

    pub fn position_z(&self) -> f64 {
        self.pose.pos_z
    }

    pub fn heading_angle(&self) -> f64 {
        self.pose.heading
    }

    pub fn pitch_angle(&self) -> f64 {
        self.pose.pitch
    }

    pub fn direction(&self) -> DVec2 {
        self.dir
    }

    pub fn plane(&self) -> DVec2 {
        self.plane
    }

    pub fn view_size(&self) -> (usize, usize) {
        (self.screen.w, self.screen.h)
    }

    pub fn render_layers(&self) -> usize {
        self.render_layers
    }

    pub fn fov_radians(&self) -> f64 {
        radians(self.config.fov_degrees)
    }

    pub fn fov_degrees(&self) -> f64 {
        self.config.fov_degrees
    }

    pub fn fov_vertical_radians(&self) -> f64 {
        let (w, h) = (self.screen.w as f64, self.screen.h as f64);
        2.0 * opposite_leg(self.fov_radians() / 2.0, h / w).atan()
    }

    pub fn fov_vertical_degrees(&self) -> f64 {
        degrees(self.fov_vertical_radians())
    }

    pub fn fov_depth(&self) -> f64 {
        self.config.fov_depth
    }

    pub fn render_distance(&self) -> Option<f64> {
        self.config.render_distance
    }

    fn render_distance_or_inf(&self) -> f64 {
        self.config.render_distance.unwrap_or(f64::INFINITY)
    }

    /// Eye height in pixels at unit depth: `(pos_z − 0.5) · h`.
    pub fn cam_z(&self) -> f64 {
        (self.pose.pos_z - 0.5) * self.screen.h as f64
    }

    /// Horizon shift in pixels; looking down is limited to half a screen,
    /// looking up to `h · fov_depth`.
    pub fn pitch_offset(&self) -> i32 {
        let h = self.screen.h as f64;
        let px = self.pose.pitch.tan() * h * self.config.fov_depth;
        (px as i32).clamp(-(self.screen.h as i32) / 2, (h * self.config.fov_depth) as i32)
    }

    pub fn lighting(&self) -> Lighting {
        Lighting {
            falloff: self.config.light_falloff,
            global_illumination: self.config.global_illumination,
            min: self.config.min_light,
            max: self.config.max_light,
        }
    }

    fn viewer(&self) -> Viewer {
        Viewer {
            pose: self.pose,
            dir: self.dir,
            plane: self.plane,
            fov_depth: self.config.fov_depth,
            cam_z: self.cam_z(),
            pitch: self.pitch_offset(),
            render_distance: self.render_distance_or_inf(),
            tex_size: self.config.tile_size as i32,
        }
    }

    pub fn convergence(&self) -> Option<Convergence> {
        self.convergence
    }

    pub fn convergence_distance(&self) -> Option<f64> {
        self.convergence.map(|c| c.distance)
    }

    pub fn convergence_point(&self) -> Option<DVec3> {
        self.convergence.map(|c| c.point)
    }

    /// Index into the slice last passed to [`Engine::update`].
    pub fn convergence_sprite(&self) -> Option<usize> {
        self.convergence.and_then(|c| c.sprite)
    }

    /// Per-column wall distance of layer 0.
    pub fn zbuffer(&self) -> &[f64] {
        &self.zbuffer
    }

    pub fn layer(&self, layer: usize) -> Option<&[ColumnSlice]> {
        self.layers.get(layer).map(|l| &l.slices[..])
    }

    pub fn floor_buffer(&self) -> &FloorBuffer {
        &self.floor
    }

    /// Sprite list indices, farthest first, from the last update.
    pub fn sprite_order(&self) -> &[usize] {
        &self.sprite_order
    }

    /*──────────────────────── per frame ─────────────────────────────*/

    /// Cast one frame: walls and floor, then sprites, then the
    /// convergence point. Every sprite receives its screen rectangle.
    pub fn update<S: Sprite>(&mut self, sprites: &mut [S]) {
        let view = self.viewer();
        let light = self.lighting();

        self.cast_walls(&view, &light);
        let casts = self.cast_sprites(&view, &light, sprites);

        for (cast, &index) in casts.iter().zip(&self.sprite_order) {
            sprites[index].set_screen_rect(cast.rect);
        }

        let ctx = self.context(&view, &light);
        self.convergence = converge(
            &ctx,
            &self.layers,
            casts.iter().zip(&self.sprite_order).map(|(c, &i)| (i, *c)),
        );

        trace!(
            "frame: {} layers, {}/{} sprites drawn, convergence {:?}",
            self.layers.len(),
            casts.iter().filter(|c| c.rect.is_some()).count(),
            sprites.len(),
            self.convergence_distance()
        );
    }

    fn context<'a>(&'a self, view: &'a Viewer, light: &'a Lighting) -> CastContext<'a, M, T> {
        CastContext {
            view,
            screen: self.screen,
            grid: &self.grid,
            textures: &self.textures,
            light,
            tex_slices: &self.tex_slices,
        }
    }

    /// Fan-out #1: every layer and column; layer 0 also fills the z-buffer
    /// and the floor.
    fn cast_walls(&mut self, view: &Viewer, light: &Lighting) {
        let ctx = CastContext {
            view,
            screen: self.screen,
            grid: &self.grid,
            textures: &self.textures,
            light,
            tex_slices: &self.tex_slices,
        };
        let Some((base, upper)) = self.layers.split_first_mut() else {
            return;
        };
        let zbuffer = &mut self.zbuffer;
        let floor = self.floor.pixels_mut();

        rayon::join(
            || walls::cast_base_layer(&ctx, &mut base.slices, zbuffer, floor),
            || {
                upper.par_iter_mut().enumerate().for_each(|(i, layer)| {
                    walls::cast_layer(&ctx, i + 1, &mut layer.slices);
                })
            },
        );
    }

    /// Fill `sprite_order`/`sprite_dist` farthest first.
    fn sort_sprites<S: Sprite>(&mut self, pos: DVec2, sprites: &[S]) {
        self.sprite_order.clear();
        self.sprite_order.extend(0..sprites.len());
        self.sprite_dist.clear();
        self.sprite_dist
            .extend(sprites.iter().map(|s| dist_squared(s.position(), pos)));
        comb_sort(&mut self.sprite_order, &mut self.sprite_dist);
    }

    /// Fan-out #2: sprites in distance order on the bounded pool. Returns
    /// one cast per draw-order position.
    fn cast_sprites<S: Sprite>(
        &mut self,
        view: &Viewer,
        light: &Lighting,
        sprites: &[S],
    ) -> Vec<SpriteCast> {
        self.sort_sprites(view.pose.pos, sprites);
        self.cast_sorted_sprites(view, light, sprites)
    }

    /// Cast `sprites` in the order already held by `sprite_order`.
    fn cast_sorted_sprites<S: Sprite>(
        &mut self,
        view: &Viewer,
        light: &Lighting,
        sprites: &[S],
    ) -> Vec<SpriteCast> {
        let n = self.sprite_order.len();
        self.sprite_slots.prepare(n);

        let slots = self.sprite_slots.slots_mut(n);
        let order = &self.sprite_order;
        let dist = &self.sprite_dist;
        let zbuffer = &self.zbuffer;
        let screen = self.screen;
        let always = self.config.always_set_sprite_rect;

        self.sprite_pool.install(|| {
            slots
                .par_iter_mut()
                .zip(order.par_iter().zip(dist.par_iter()))
                .map(|(slot, (&i, &d2))| {
                    cast_sprite(
                        &sprites[i],
                        d2.sqrt(),
                        view,
                        &screen,
                        zbuffer,
                        light,
                        always,
                        slot,
                    )
                })
                .collect()
        })
    }

    /*──────────────────────── draw ──────────────────────────────────*/

    /// Composite the last update: backgrounds, wall layers from the top
    /// down, the floor buffer, then sprites far to near.
    pub fn draw<R: Renderer>(&self, r: &mut R) {
        let (w, h) = (self.screen.w as i32, self.screen.h as i32);
        let horizon = h / 2 + self.pitch_offset();

        self.background(r, Rect::new(0, horizon, w, h), self.floor_texture, self.floor_color);
        self.background(r, Rect::new(0, 0, w, horizon), self.sky_texture, self.sky_color);

        for x in 0..self.screen.w {
            for layer in self.layers.iter().rev() {
                self.draw_slice(r, &layer.slices[x]);
            }
        }

        r.blit_columns(self.floor.pixels(), self.screen.w, self.screen.h);

        for x in 0..self.screen.w {
            for slices in self.sprite_slots.active() {
                self.draw_slice(r, &slices[x]);
            }
        }
    }

    /// `begin_frame` → [`Engine::draw`] → `end_frame(submit)`.
    pub fn render_frame<R, F>(&self, r: &mut R, submit: F)
    where
        R: Renderer,
        F: FnOnce(&[Rgba], usize, usize),
    {
        r.begin_frame(self.screen.w, self.screen.h);
        self.draw(r);
        r.end_frame(submit);
    }

    fn background<R: Renderer>(&self, r: &mut R, dst: Rect, tex: Option<TextureId>, color: Rgba) {
        r.fill_rect(dst, color);
        if let Some(tex) = tex.and_then(|id| self.textures.texture(id)) {
            let src = Rect::new(0, 0, tex.w as i32, tex.h as i32);
            r.draw_texture(tex, src, dst, self.config.max_light);
        }
    }

    #[inline]
    fn draw_slice<R: Renderer>(&self, r: &mut R, slice: &ColumnSlice) {
        if let Some(tex) = slice.texture.and_then(|id| self.textures.texture(id)) {
            r.draw_texture(tex, slice.src, slice.dst, slice.tint);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::{Software, modulate},
        world::{
            grid::Grid,
            sprite::Billboard,
            texture::{Materials, Texture, TextureBank},
        },
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const WALL: Rgba = 0xFF_C08040;
    const SPRITE: Rgba = 0xFF_20E020;

    /// 5×5 border room: the 3×3 interior is empty.
    fn bordered(n: usize) -> Grid {
        let cells: Vec<Vec<i32>> = (0..n)
            .map(|x| {
                (0..n)
                    .map(|y| (x == 0 || y == 0 || x == n - 1 || y == n - 1) as i32)
                    .collect()
            })
            .collect();
        Grid::new(vec![cells]).unwrap()
    }

    fn materials() -> (Materials, TextureId) {
        let mut bank = TextureBank::default_with_checker();
        let wall = bank.insert("WALL", Texture::solid("WALL", 8, 8, WALL)).unwrap();
        let sprite = bank
            .insert("SPRITE", Texture::solid("SPRITE", 8, 8, SPRITE))
            .unwrap();
        let mut m = Materials::new(bank);
        m.set_walls(vec![wall]).unwrap();
        (m, sprite)
    }

    fn config(w: usize, h: usize) -> EngineConfig {
        EngineConfig {
            width: w,
            height: h,
            tile_size: 8,
            sprite_concurrency: 2,
            // flat lighting keeps expected colours exact
            light_falloff: 0.0,
            global_illumination: 0.0,
            ..EngineConfig::default()
        }
    }

    fn engine(n: usize, w: usize, h: usize) -> (Engine<Grid, Materials>, TextureId) {
        let (m, sprite) = materials();
        let mut e = Engine::new(bordered(n), m, config(w, h)).unwrap();
        e.set_pose(CameraPose::new(DVec2::new(n as f64 / 2.0, n as f64 / 2.0), 0.5, 0.0, 0.0));
        (e, sprite)
    }

    fn billboard(x: f64, y: f64, tex: TextureId) -> Billboard {
        Billboard::new(DVec2::new(x, y), tex, Rect::new(0, 0, 8, 8))
    }

    /* ───────────── casting ───────────── */

    #[test]
    fn centre_column_hits_east_wall_at_one_and_a_half() {
        let (mut e, _) = engine(5, 8, 8);
        e.update::<Billboard>(&mut []);

        // column 4 is the dead-centre ray, column 3 the convergence column
        for x in [3, 4] {
            assert!((e.zbuffer()[x] - 1.5).abs() < 1e-9, "column {x}");
            let slice = e.layer(0).unwrap()[x];
            // int(8 / 1.5) = 5 rows, centred on row 4
            assert_eq!(slice.dst, Rect::new(x as i32, 2, x as i32 + 1, 7));
            assert!(slice.texture.is_some());
        }
    }

    #[test]
    fn render_distance_suppresses_walls() {
        let (mut e, _) = engine(5, 8, 8);
        e.set_render_distance(Some(1.0));
        e.update::<Billboard>(&mut []);
        assert!(e.zbuffer().iter().all(|&z| z == 1.0));
        assert!(e.layer(0).unwrap().iter().all(|s| s.texture.is_none()));
        assert_eq!(e.convergence(), None);

        e.set_render_distance(Some(-1.0));
        assert_eq!(e.render_distance(), None);
    }

    #[test]
    fn stacked_layers_reuse_the_top_layer() {
        let (mut e, _) = engine(5, 8, 8);
        e.set_render_layers(3);
        e.update::<Billboard>(&mut []);
        let base = e.layer(0).unwrap()[4];
        let top = e.layer(2).unwrap()[4];
        assert!(top.texture.is_some());
        assert_eq!(top.dst.min.y, base.dst.min.y - 2 * 5);
        assert_eq!(top.hit, base.hit);
    }

    #[test]
    fn resize_reallocates_everything() {
        let (mut e, _) = engine(5, 8, 8);
        e.set_view_size(16, 10).unwrap();
        e.set_view_size(16, 10).unwrap();
        e.update::<Billboard>(&mut []);
        assert_eq!(e.zbuffer().len(), 16);
        assert_eq!(e.layer(0).unwrap().len(), 16);
        assert_eq!(e.floor_buffer().size(), (16, 10));
        assert_eq!(e.set_view_size(0, 10), Err(ConfigError::ZeroViewport(0, 10)));
        assert_eq!(e.view_size(), (16, 10));
    }

    #[test]
    fn fov_accessors() {
        let (mut e, _) = engine(5, 8, 8);
        e.set_field_of_view(90.0, 2.0).unwrap();
        assert!((e.fov_degrees() - 90.0).abs() < 1e-12);
        // square viewport: vertical equals horizontal
        assert!((e.fov_vertical_degrees() - 90.0).abs() < 1e-9);
        assert!((e.direction().length() - 2.0).abs() < 1e-9);
        assert!((e.plane().length() - 2.0).abs() < 1e-9);
        assert!(e.set_field_of_view(0.0, 1.0).is_err());
    }

    #[test]
    fn pitch_offset_is_clamped() {
        let (mut e, _) = engine(5, 8, 8);
        e.set_pitch_angle(1.5);
        assert_eq!(e.pitch_offset(), 8);
        e.set_pitch_angle(-1.5);
        assert_eq!(e.pitch_offset(), -4);
        e.set_pitch_angle(0.0);
        assert_eq!(e.pitch_offset(), 0);
    }

    /* ───────────── sprites & convergence ───────────── */

    #[test]
    fn wall_is_the_convergence_target_without_sprites() {
        let (mut e, _) = engine(5, 8, 8);
        e.update::<Billboard>(&mut []);
        let c = e.convergence().unwrap();
        assert_eq!(c.sprite, None);
        assert!((c.distance - 1.5).abs() < 1e-9);
        assert!((c.point - DVec3::new(4.0, 2.5, 0.5)).length() < 1e-9);
    }

    #[test]
    fn focusable_sprite_in_front_of_wall_takes_convergence() {
        let (mut e, tex) = engine(5, 8, 8);
        let mut sprites = vec![billboard(1.5, 1.5, tex), billboard(3.5, 2.5, tex)];
        e.update(&mut sprites);

        assert_eq!(e.convergence_sprite(), Some(1));
        assert!((e.convergence_distance().unwrap() - 1.0).abs() < 1e-9);
        assert!((e.convergence_point().unwrap() - DVec3::new(3.5, 2.5, 0.5)).length() < 1e-9);
        assert_eq!(sprites[1].screen_rect(), Some(Rect::new(0, 0, 8, 7)));
        // the other one is behind the camera
        assert_eq!(sprites[0].screen_rect(), None);
    }

    #[test]
    fn sprite_behind_wall_is_hidden() {
        let (mut e, tex) = engine(7, 8, 8);
        // camera at 3.5; wall moved to x = 4 in front of the sprite
        for y in 0..7 {
            e.grid_mut().set(0, 4, y, 1);
        }
        let mut sprites = vec![billboard(5.5, 3.5, tex)];
        e.update(&mut sprites);
        assert_eq!(sprites[0].screen_rect(), None);
        assert_eq!(e.convergence_sprite(), None);

        e.set_always_set_sprite_screen_rect(true);
        e.update(&mut sprites);
        assert!(sprites[0].screen_rect().is_some());
    }

    #[test]
    fn sprites_are_ordered_far_to_near() {
        let (mut e, tex) = engine(9, 8, 8);
        let mut sprites = vec![
            billboard(5.5, 4.5, tex),
            billboard(7.5, 4.5, tex),
            billboard(6.5, 4.5, tex),
        ];
        e.update(&mut sprites);
        assert_eq!(e.sprite_order(), &[1, 2, 0]);
    }

    /* ───────────── draw ───────────── */

    #[test]
    fn draw_composites_background_walls_and_sprites() {
        let (mut e, tex) = engine(5, 8, 8);
        e.set_background_colors(0xFF_0000AA, 0xFF_00AA00);

        e.update::<Billboard>(&mut []);
        let mut sw = Software::default();
        e.render_frame(&mut sw, |_, _, _| {});
        assert_eq!(sw.pixel(4, 0), 0xFF_0000AA);
        assert_eq!(sw.pixel(4, 7), 0xFF_00AA00);
        // centre wall hit on an X face: flat light minus the side darkening
        let tint = Tint::WHITE.darken(crate::engine::shading::SIDE_X_DARKEN);
        assert_eq!(sw.pixel(4, 4), modulate(WALL, tint));

        let mut sprites = vec![billboard(3.5, 2.5, tex)];
        e.update(&mut sprites);
        e.render_frame(&mut sw, |_, _, _| {});
        assert_eq!(sw.pixel(4, 4), SPRITE);
    }

    #[test]
    fn textured_floor_reaches_the_frame() {
        let (mut e, _) = engine(5, 8, 8);
        let floor = e
            .textures_mut()
            .bank_mut()
            .insert("FLOOR", Texture::solid("FLOOR", 8, 8, 0xFF_102030))
            .unwrap();
        e.textures_mut().set_floor(Some(floor)).unwrap();
        e.update::<Billboard>(&mut []);

        // row 7 of the centre column lies below the wall slice
        assert_eq!(e.floor_buffer().pixel(4, 7), 0xFF_102030);
        let mut sw = Software::default();
        e.render_frame(&mut sw, |_, _, _| {});
        assert_eq!(sw.pixel(4, 7), 0xFF_102030);
    }

    #[test]
    fn sprite_order_is_input_independent() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        for _ in 0..8 {
            let (mut e, tex) = engine(24, 32, 24);
            e.set_pose(CameraPose::new(DVec2::new(1.5, 12.0), 0.5, 0.0, 0.0));

            let mut sprites: Vec<Billboard> = (0..12)
                .map(|_| billboard(rng.gen_range(3.0..22.0), rng.gen_range(6.0..18.0), tex))
                .collect();
            // every sprite gets its own shade so overlaps are visible
            for (k, s) in sprites.iter_mut().enumerate() {
                s.illumination = -(k as f64) * 15.0;
            }

            e.update(&mut sprites);
            let mut a = Software::default();
            e.render_frame(&mut a, |_, _, _| {});

            // distances must come out strictly descending
            let d: Vec<f64> = e
                .sprite_order()
                .iter()
                .map(|&i| sprites[i].pos.distance_squared(e.position()))
                .collect();
            let mut sorted = d.clone();
            sorted.sort_by(|x, y| y.total_cmp(x));
            assert_eq!(d, sorted);

            let mut shuffled: Vec<Billboard> = sprites.iter().rev().cloned().collect();
            e.update(&mut shuffled);
            let mut b = Software::default();
            e.render_frame(&mut b, |_, _, _| {});

            assert_eq!(a.pixels(), b.pixels());
        }
    }

    #[test]
    fn floor_is_the_convergence_target_when_looking_down() {
        let (mut e, _) = engine(41, 64, 64);
        e.set_pose(CameraPose::new(DVec2::new(2.5, 20.5), 0.5, 0.0, -0.5));
        e.update::<Billboard>(&mut []);

        let c = e.convergence().unwrap();
        assert_eq!(c.sprite, None);
        // centre row 31 with the horizon pinned at row 0: 64 / (2·63 − 64)
        let depth = 64.0 / 62.0;
        assert!((c.point.x - (2.5 + depth)).abs() < 1e-9);
        assert!((c.point.y - 20.5).abs() < 1e-9);
        assert!(c.point.z.abs() < 0.1, "z = {}", c.point.z);
    }

    #[test]
    fn sprite_pool_never_exceeds_the_bound() {
        let (m, _) = materials();
        let one = EngineConfig {
            sprite_concurrency: 1,
            ..config(8, 8)
        };
        let e = Engine::new(bordered(5), m, one).unwrap();
        assert_eq!(e.sprite_pool.current_num_threads(), 1);

        let (m, _) = materials();
        let wide = EngineConfig {
            sprite_concurrency: 100,
            ..config(8, 8)
        };
        let e = Engine::new(bordered(5), m, wide).unwrap();
        assert!(e.sprite_pool.current_num_threads() <= rayon::current_num_threads());
    }

    #[test]
    fn comb_sort_draws_like_a_full_sort() {
        let mut rng = StdRng::seed_from_u64(0xBEEF);
        for _ in 0..8 {
            let (mut e, tex) = engine(24, 32, 24);
            e.set_pose(CameraPose::new(DVec2::new(1.5, 12.0), 0.5, 0.0, 0.0));

            let mut sprites: Vec<Billboard> = (0..16)
                .map(|_| billboard(rng.gen_range(3.0..22.0), rng.gen_range(6.0..18.0), tex))
                .collect();
            for (k, s) in sprites.iter_mut().enumerate() {
                s.illumination = -(k as f64) * 12.0;
            }

            e.update(&mut sprites);
            let mut combed = Software::default();
            e.render_frame(&mut combed, |_, _, _| {});

            // refill the slots in stable full-sort order and draw again
            let pos = e.position();
            let mut order: Vec<usize> = (0..sprites.len()).collect();
            order.sort_by(|&i, &j| {
                dist_squared(sprites[j].pos, pos).total_cmp(&dist_squared(sprites[i].pos, pos))
            });
            e.sprite_dist = order.iter().map(|&i| dist_squared(sprites[i].pos, pos)).collect();
            e.sprite_order = order;
            let (view, light) = (e.viewer(), e.lighting());
            e.cast_sorted_sprites(&view, &light, &sprites);

            let mut sorted = Software::default();
            e.render_frame(&mut sorted, |_, _, _| {});
            assert_eq!(combed.pixels(), sorted.pixels());
        }
    }
}
