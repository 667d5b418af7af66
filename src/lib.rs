//! Software grid raycaster.
//!
//! A multi-layer tile grid, a camera pose and a list of billboard sprites go
//! in; per-column wall slices, a perspective floor buffer and depth-sorted
//! sprite slices come out, ready to be composited by a [`renderer::Renderer`].
//!
//! ```text
//!  world::Grid ──╮
//!  world::Materials ─┼─► engine::Engine::update(sprites) ─► Engine::draw(renderer)
//!  world::Sprite ──╯
//! ```

pub mod engine;
pub mod renderer;
pub mod world;
