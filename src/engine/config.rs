use crate::renderer::Tint;

/// Rejected configuration values.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("viewport {0}×{1} has a zero dimension")]
    ZeroViewport(usize, usize),

    #[error("texture tile size must be positive")]
    ZeroTileSize,

    #[error("field of view {0}° outside (0°, 180°)")]
    BadFov(f64),

    #[error("field of view depth {0} must be positive")]
    BadFovDepth(f64),

    #[error("sprite concurrency bound must be at least 1")]
    ZeroConcurrency,

    #[error("grid has no cells")]
    EmptyGrid,

    #[error("grid layer {layer} is not {width}×{height} like layer 0")]
    RaggedGrid {
        layer: usize,
        width: usize,
        height: usize,
    },
}

/// Errors from building an [`crate::engine::Engine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not start sprite workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Every tunable of the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Wall/floor texture tile size in texels.
    pub tile_size: usize,
    pub fov_degrees: f64,
    /// Length of the direction vector; stretches the view without changing
    /// the horizontal angle.
    pub fov_depth: f64,
    /// `None` = unbounded.
    pub render_distance: Option<f64>,
    pub light_falloff: f64,
    pub global_illumination: f64,
    pub min_light: Tint,
    pub max_light: Tint,
    /// Upper bound on concurrently cast sprites.
    pub sprite_concurrency: usize,
    /// Report sprite rectangles even when nothing of the sprite was drawn.
    pub always_set_sprite_rect: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            tile_size: 64,
            fov_degrees: 70.0,
            fov_depth: 1.0,
            render_distance: None,
            light_falloff: -100.0,
            global_illumination: 300.0,
            min_light: Tint::BLACK,
            max_light: Tint::WHITE,
            sprite_concurrency: 100,
            always_set_sprite_rect: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_view(self.width, self.height)?;
        validate_fov(self.fov_degrees, self.fov_depth)?;
        if self.tile_size == 0 {
            return Err(ConfigError::ZeroTileSize);
        }
        if self.sprite_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

pub(crate) fn validate_view(w: usize, h: usize) -> Result<(), ConfigError> {
    if w == 0 || h == 0 {
        return Err(ConfigError::ZeroViewport(w, h));
    }
    Ok(())
}

pub(crate) fn validate_fov(degrees: f64, depth: f64) -> Result<(), ConfigError> {
    if !(degrees > 0.0 && degrees < 180.0) {
        return Err(ConfigError::BadFov(degrees));
    }
    if !(depth > 0.0 && depth.is_finite()) {
        return Err(ConfigError::BadFovDepth(depth));
    }
    Ok(())
}
