pub mod camera;
pub mod geometry;
pub mod grid;
pub mod sprite;
pub mod texture;

pub use geometry::{Circle, Line, Line3d, Rect};

pub use camera::CameraPose;

pub use grid::{Grid, GridMap};

pub use sprite::{Billboard, Sprite, SpriteAnchor};

pub use texture::{
    CellHit, Materials, NO_TEXTURE, Side, SideRemap, Texture, TextureBank, TextureError,
    TextureId, TextureSource,
};
