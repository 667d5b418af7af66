//! Casting passes and the frame orchestrator.
//!
//! * `walls`   – DDA per column and layer, z-buffer
//! * `floor`   – perspective floor below the base layer
//! * `sprites` – billboard projection and occlusion
//! * `engine`  – [`Engine`], which runs them in that order every frame

pub mod buffers;
pub mod config;
pub mod convergence;
mod engine;
pub mod floor;
pub mod order;
pub mod shading;
pub mod sprites;
pub mod types;
pub mod walls;

pub use buffers::{FloorBuffer, LayerBuffer, SpriteSlot, SpriteSlots};
pub use config::{ConfigError, EngineConfig, EngineError};
pub use convergence::Convergence;
pub use engine::Engine;
pub use sprites::SpriteCast;
pub use types::{ColumnSlice, Lighting, Screen, Viewer};
