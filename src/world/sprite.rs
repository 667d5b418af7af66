use glam::DVec2;

use super::{geometry::Rect, texture::TextureId};

/// Which part of the billboard sits at the sprite's world Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpriteAnchor {
    /// Bottom edge at `position_z` (things standing on the floor).
    #[default]
    Bottom,
    /// Vertical midpoint at `position_z`.
    Center,
    /// Top edge at `position_z` (things hanging from the ceiling).
    Top,
}

impl SpriteAnchor {
    /// Screen-space offset (pixels at unit depth) that moves the billboard
    /// so the anchored edge lines up with `position_z`.
    pub fn vertical_offset(self, scale: f64, height: usize) -> f64 {
        let half = height as f64 * 0.5;
        match self {
            SpriteAnchor::Bottom => half - scale * half,
            SpriteAnchor::Center => half,
            SpriteAnchor::Top => half + scale * half,
        }
    }
}

/// Billboard collaborator read by the sprite caster.
///
/// Accessors are called from worker threads, so implementors must be `Sync`.
/// [`Sprite::set_screen_rect`] runs on the caller's thread once per frame,
/// after casting has finished.
pub trait Sprite: Sync {
    /// Grid position.
    fn position(&self) -> DVec2;

    /// Height of the anchor point in cell heights.
    fn position_z(&self) -> f64 {
        0.0
    }

    fn scale(&self) -> f64 {
        1.0
    }

    fn vertical_anchor(&self) -> SpriteAnchor {
        SpriteAnchor::Bottom
    }

    fn texture(&self) -> TextureId;

    /// Frame of the texture to draw (animation sheets select a cell here).
    fn texture_rect(&self) -> Rect;

    /// Extra light added to the shade; large values make a sprite self-lit.
    fn illumination(&self) -> f64 {
        0.0
    }

    /// Whether the sprite may become the convergence target.
    fn is_focusable(&self) -> bool {
        true
    }

    /// Screen bounding box for this frame, `None` when nothing was drawn.
    fn set_screen_rect(&mut self, rect: Option<Rect>);
}

/// Plain data [`Sprite`].
#[derive(Clone, Debug, PartialEq)]
pub struct Billboard {
    pub pos: DVec2,
    pub pos_z: f64,
    pub scale: f64,
    pub anchor: SpriteAnchor,
    pub texture: TextureId,
    pub tex_rect: Rect,
    pub illumination: f64,
    pub focusable: bool,
    screen_rect: Option<Rect>,
}

impl Billboard {
    pub fn new(pos: DVec2, texture: TextureId, tex_rect: Rect) -> Self {
        Self {
            pos,
            pos_z: 0.0,
            scale: 1.0,
            anchor: SpriteAnchor::Bottom,
            texture,
            tex_rect,
            illumination: 0.0,
            focusable: true,
            screen_rect: None,
        }
    }

    pub fn with_scale(mut self, scale: f64, anchor: SpriteAnchor) -> Self {
        self.scale = scale;
        self.anchor = anchor;
        self
    }

    pub fn with_z(mut self, pos_z: f64) -> Self {
        self.pos_z = pos_z;
        self
    }

    pub fn with_illumination(mut self, illumination: f64) -> Self {
        self.illumination = illumination;
        self
    }

    pub fn focusable(mut self, on: bool) -> Self {
        self.focusable = on;
        self
    }

    /// Rectangle reported by the last frame.
    pub fn screen_rect(&self) -> Option<Rect> {
        self.screen_rect
    }
}

impl Sprite for Billboard {
    fn position(&self) -> DVec2 {
        self.pos
    }
    fn position_z(&self) -> f64 {
        self.pos_z
    }
    fn scale(&self) -> f64 {
        self.scale
    }
    fn vertical_anchor(&self) -> SpriteAnchor {
        self.anchor
    }
    fn texture(&self) -> TextureId {
        self.texture
    }
    fn texture_rect(&self) -> Rect {
        self.tex_rect
    }
    fn illumination(&self) -> f64 {
        self.illumination
    }
    fn is_focusable(&self) -> bool {
        self.focusable
    }
    fn set_screen_rect(&mut self, rect: Option<Rect>) {
        self.screen_rect = rect;
    }
}
