//! Interactive viewer for the software raycaster.
//!
//! ```bash
//! cargo run --release -- --width 960 --height 600 --layers 2
//! ```
//!
//! W/S move, A/D strafe, ←/→ turn, PgUp/PgDn look up/down, Q/E raise/lower
//! the eye, F toggles the floor, Space prints what the crosshair is on.

use clap::Parser;
use glam::DVec2;
use log::{LevelFilter, info};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::time::{Duration, Instant};

use yacaster_rs::{
    engine::{Engine, EngineConfig},
    renderer::{Rgba, Software, Tint, pack},
    world::{
        Billboard, CameraPose, Circle, Grid, GridMap, Line, Materials, Rect, SideRemap,
        SpriteAnchor, Texture, TextureBank, geometry::line_circle_intersection,
    },
};

const TILE: usize = 64;
const MOVE_SPEED: f64 = 3.0; // cells per second
const TURN_SPEED: f64 = 2.0; // radians per second
const PITCH_SPEED: f64 = 1.0;
const RISE_SPEED: f64 = 0.8;
const PLAYER_RADIUS: f64 = 0.2;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 70.0)]
    fov: f64,

    #[arg(long, default_value_t = 1.0)]
    fov_depth: f64,

    /// Cut walls, floor and sprites beyond this many cells
    #[arg(long)]
    render_distance: Option<f64>,

    /// Wall layers to cast (default: every layer of the level)
    #[arg(long)]
    layers: Option<usize>,

    #[arg(long, default_value_t = 100)]
    sprite_concurrency: usize,

    /// verbose level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    verbose: LevelFilter,
}

impl Opts {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            width: self.width,
            height: self.height,
            tile_size: TILE,
            fov_degrees: self.fov,
            fov_depth: self.fov_depth,
            render_distance: self.render_distance,
            sprite_concurrency: self.sprite_concurrency,
            ..EngineConfig::default()
        }
    }
}

/*──────────────────────── procedural level ───────────────────────*/

const LEVEL: [&str; 16] = [
    "1111111111111111",
    "1000000000000001",
    "1022200000033301",
    "1020000000000301",
    "1020004440000301",
    "1000004040000001",
    "1000000000000001",
    "1000000000000001",
    "1005500000066001",
    "1005000000006001",
    "1000000000000001",
    "1000022222200001",
    "1000000000000001",
    "1033000000000441",
    "1000000000000001",
    "1111111111111111",
];

/// Second storey: only the outer wall and the two towers keep going up.
const UPPER: [&str; 16] = [
    "1111111111111111",
    "1000000000000001",
    "1000000000033301",
    "1000000000000301",
    "1000000000000301",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1000000000000001",
    "1111111111111111",
];

fn parse_layer(rows: &[&str]) -> Vec<Vec<i32>> {
    rows.iter()
        .map(|r| r.bytes().map(|b| (b - b'0') as i32).collect())
        .collect()
}

fn build_grid() -> anyhow::Result<Grid> {
    let ground = parse_layer(&LEVEL);
    let upper = parse_layer(&UPPER);
    let ground: Vec<&[i32]> = ground.iter().map(Vec::as_slice).collect();
    let upper: Vec<&[i32]> = upper.iter().map(Vec::as_slice).collect();
    Ok(Grid::from_layer_rows(&[ground.as_slice(), upper.as_slice()])?)
}

fn bricks(name: &str, mortar: Rgba, brick: (u8, u8, u8)) -> anyhow::Result<Texture> {
    let mut pix = vec![mortar; TILE * TILE];
    for y in 0..TILE {
        for x in 0..TILE {
            let row = y / 16;
            let shift = if row % 2 == 0 { 0 } else { 16 };
            let joint = y % 16 == 0 || (x + shift) % 32 == 0;
            if !joint {
                // cheap grain so distant walls do not look flat
                let n = ((x * 7 + y * 13) % 9) as u8 * 3;
                pix[y * TILE + x] = pack(brick.0 - n, brick.1 - n, brick.2 - n, 255);
            }
        }
    }
    Ok(Texture::new(name, TILE, TILE, pix)?)
}

fn tiles(name: &str, a: Rgba, b: Rgba) -> anyhow::Result<Texture> {
    let pix = (0..TILE * TILE)
        .map(|i| {
            let (x, y) = (i % TILE, i / TILE);
            if (x / 8 + y / 8) % 2 == 0 { a } else { b }
        })
        .collect();
    Ok(Texture::new(name, TILE, TILE, pix)?)
}

fn sky() -> anyhow::Result<Texture> {
    let (w, h) = (256, 64);
    let pix = (0..w * h)
        .map(|i| {
            let y = (i / w) as u32;
            let v = (y * 120 / h as u32) as u8;
            pack(40 + v / 2, 70 + v / 2, 120 + v, 255)
        })
        .collect();
    Ok(Texture::new("SKY", w, h, pix)?)
}

/// Round sprite with a transparent surround.
fn orb(name: &str, color: (u8, u8, u8)) -> anyhow::Result<Texture> {
    let n = 32;
    let c = (n as f64 - 1.0) / 2.0;
    let pix = (0..n * n)
        .map(|i| {
            let (x, y) = ((i % n) as f64, (i / n) as f64);
            let d = ((x - c).powi(2) + (y - c).powi(2)).sqrt() / c;
            if d > 1.0 {
                0
            } else {
                let k = 1.0 - 0.6 * d;
                let s = |v: u8| (v as f64 * k) as u8;
                pack(s(color.0), s(color.1), s(color.2), 255)
            }
        })
        .collect();
    Ok(Texture::new(name, n, n, pix)?)
}

fn build_materials(mut bank: TextureBank) -> anyhow::Result<Materials> {
    let red = bank.insert("RED", bricks("RED", 0xFF_505050, (150, 60, 40))?)?;
    let red_dark = bank.insert("RED_DARK", bricks("RED_DARK", 0xFF_404040, (110, 40, 30))?)?;
    let grey = bank.insert("GREY", bricks("GREY", 0xFF_303030, (120, 120, 130))?)?;
    let blue = bank.insert("BLUE", tiles("BLUE", 0xFF_3050A0, 0xFF_203070)?)?;
    let green = bank.insert("GREEN", tiles("GREEN", 0xFF_40A050, 0xFF_207030)?)?;
    let gold = bank.insert("GOLD", tiles("GOLD", 0xFF_C0A040, 0xFF_806020)?)?;
    let floor = bank.insert("FLOOR", tiles("FLOOR", 0xFF_707070, 0xFF_585858)?)?;

    let mut m = Materials::new(bank);
    m.set_walls(vec![grey, red, blue, green, gold, grey, red_dark])?;
    // value 2 shows darker bricks on its X faces
    m.set_side_remap(SideRemap::new().with(1, 6));
    m.set_floor(Some(floor))?;
    Ok(m)
}

fn build_sprites(materials: &mut Materials) -> anyhow::Result<Vec<Billboard>> {
    let bank = materials.bank_mut();
    let lamp = bank.insert("LAMP", orb("LAMP", (250, 220, 120))?)?;
    let slime = bank.insert("SLIME", orb("SLIME", (80, 200, 90))?)?;
    let rect = Rect::new(0, 0, 32, 32);

    let mut sprites = vec![
        Billboard::new(DVec2::new(7.5, 7.5), slime, rect).with_scale(0.5, SpriteAnchor::Bottom),
        Billboard::new(DVec2::new(10.5, 10.5), slime, rect).with_scale(0.4, SpriteAnchor::Bottom),
        Billboard::new(DVec2::new(3.5, 12.5), slime, rect).with_scale(0.6, SpriteAnchor::Bottom),
    ];
    for (x, y) in [(2.5, 6.5), (13.5, 6.5), (8.5, 2.5), (8.5, 13.5)] {
        sprites.push(
            Billboard::new(DVec2::new(x, y), lamp, rect)
                .with_scale(0.25, SpriteAnchor::Top)
                .with_z(1.0)
                .with_illumination(200.0)
                .focusable(false),
        );
    }
    Ok(sprites)
}

fn solid<M: GridMap>(grid: &M, x: i64, y: i64) -> bool {
    let (w, h) = grid.size();
    x < 0 || y < 0 || x as usize >= w || y as usize >= h || grid.cell(0, x as usize, y as usize) > 0
}

/// Does the player's circle at `p` touch any wall cell?
fn blocked<M: GridMap>(grid: &M, p: DVec2) -> bool {
    let body = Circle {
        center: p,
        radius: PLAYER_RADIUS,
    };
    let (cx, cy) = (p.x.floor() as i64, p.y.floor() as i64);
    for y in cy - 1..=cy + 1 {
        for x in cx - 1..=cx + 1 {
            if !solid(grid, x, y) {
                continue;
            }
            if (x, y) == (cx, cy) {
                return true;
            }
            let (x0, y0) = (x as f64, y as f64);
            let corners = [
                DVec2::new(x0, y0),
                DVec2::new(x0 + 1.0, y0),
                DVec2::new(x0 + 1.0, y0 + 1.0),
                DVec2::new(x0, y0 + 1.0),
            ];
            let touches = (0..4).any(|i| {
                let edge = Line::new(corners[i], corners[(i + 1) % 4]);
                !line_circle_intersection(edge, body, true).is_empty()
            });
            if touches {
                return true;
            }
        }
    }
    false
}

/// Move unless that would push the player into a wall; axes are tried
/// separately so the player slides along walls.
fn try_move<M: GridMap>(grid: &M, pose: &mut CameraPose, delta: DVec2) {
    let x = pose.pos + DVec2::new(delta.x, 0.0);
    if !blocked(grid, x) {
        pose.pos = x;
    }
    let y = pose.pos + DVec2::new(0.0, delta.y);
    if !blocked(grid, y) {
        pose.pos = y;
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    TermLogger::init(
        opts.verbose,
        ConfigBuilder::default().set_time_level(LevelFilter::Trace).build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let grid = build_grid()?;
    let mut bank = TextureBank::default_with_checker();
    let sky_tex = bank.insert("SKY", sky()?)?;
    let mut materials = build_materials(bank)?;
    let mut sprites = build_sprites(&mut materials)?;

    let mut engine = Engine::new(grid, materials, opts.engine_config())?;
    if let Some(layers) = opts.layers {
        engine.set_render_layers(layers);
    }
    engine.set_sky_texture(Some(sky_tex));
    engine.set_light_rgb(Tint::rgb(20, 20, 30), Tint::WHITE);
    let mut pose = CameraPose::new(DVec2::new(1.5, 1.5), 0.5, std::f64::consts::FRAC_PI_4, 0.0);
    info!(
        "level {}×{} with {} layers, {} sprites",
        engine.grid().size().0,
        engine.grid().size().1,
        engine.render_layers(),
        sprites.len()
    );

    let (w, h) = engine.view_size();
    let mut renderer = Software::default();
    let mut win = Window::new("yacaster software render", w, h, WindowOptions::default())?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO; // cumulated render time
    let mut acc_frames = 0usize; // frames in the current window
    let mut last_print = Instant::now(); // when we printed last
    let mut last_tick = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now(); // ┌─ frame timer start
        let dt = last_tick.elapsed().as_secs_f64().min(0.1);
        last_tick = t0;

        /* movement --------------------------------------------------------- */
        let mut forward = 0.0;
        let mut strafe = 0.0;
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            forward += 1.0;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            forward -= 1.0;
        }
        if win.is_key_down(Key::A) {
            strafe -= 1.0;
        }
        if win.is_key_down(Key::D) {
            strafe += 1.0;
        }
        let step = (pose.forward() * forward + pose.right() * strafe) * MOVE_SPEED * dt;
        try_move(engine.grid(), &mut pose, step);

        if win.is_key_down(Key::Left) {
            pose.turn(TURN_SPEED * dt);
        }
        if win.is_key_down(Key::Right) {
            pose.turn(-TURN_SPEED * dt);
        }
        if win.is_key_down(Key::PageUp) {
            pose.pitch = (pose.pitch + PITCH_SPEED * dt).min(1.2);
        }
        if win.is_key_down(Key::PageDown) {
            pose.pitch = (pose.pitch - PITCH_SPEED * dt).max(-1.2);
        }
        if win.is_key_down(Key::Q) {
            pose.pos_z = (pose.pos_z + RISE_SPEED * dt).min(1.9);
        }
        if win.is_key_down(Key::E) {
            pose.pos_z = (pose.pos_z - RISE_SPEED * dt).max(0.1);
        }

        /* toggles ---------------------------------------------------------- */
        if win.is_key_pressed(Key::F, KeyRepeat::No) {
            let on = !engine.textures().render_floor();
            engine.textures_mut().set_render_floor(on);
            info!("floor {}", if on { "on" } else { "off" });
        }

        /* cast & draw ------------------------------------------------------ */
        engine.set_pose(pose);
        engine.update(&mut sprites);

        if win.is_key_pressed(Key::Space, KeyRepeat::No) {
            match engine.convergence() {
                Some(c) => info!(
                    "crosshair: {:.2} away at ({:.2}, {:.2}, {:.2}) sprite {:?}",
                    c.distance, c.point.x, c.point.y, c.point.z, c.sprite
                ),
                None => info!("crosshair: nothing"),
            }
        }

        let mut present = Ok(());
        engine.render_frame(&mut renderer, |fb, w, h| {
            // ─────────── accumulate & report every ~3 s ────────────────────
            acc_time += t0.elapsed();
            acc_frames += 1;
            present = win.update_with_buffer(fb, w, h);
        });
        present?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            let fps = 1000.0 / avg_ms;
            info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, fps);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
