// Format-agnostic repository of RGBA textures plus the material table that
// turns grid cells into texture handles. The engine interacts through
// `TextureId` and the `TextureSource` trait only.

use std::collections::HashMap;

use crate::renderer::Rgba;

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// `TextureId` whose pixels are the checkerboard fallback.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const NO_TEXTURE: TextureId = 0;

/// CPU-side storage: 32-bit **ARGB** (0xAARRGGBB) in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<Rgba>,
}

/// Convenience checkerboard 8×8 (magenta/black).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT: Rgba = 0xFF_FF00FF;
        const DARK: Rgba = 0xFF_000000;
        let mut pix = vec![0; 8 * 8];
        for y in 0..8 {
            for x in 0..8 {
                pix[y * 8 + x] = if (x ^ y) & 1 == 0 { LIGHT } else { DARK };
            }
        }
        Texture {
            name: "CHECKER".to_string(),
            w: 8,
            h: 8,
            pixels: pix,
        }
    }
}

impl Texture {
    /// Wrap decoded pixels; `pixels.len()` must equal `w * h`.
    pub fn new<S: Into<String>>(
        name: S,
        w: usize,
        h: usize,
        pixels: Vec<Rgba>,
    ) -> Result<Self, TextureError> {
        let name = name.into();
        if w == 0 || h == 0 || pixels.len() != w * h {
            return Err(TextureError::BadSize {
                name,
                w,
                h,
                len: pixels.len(),
            });
        }
        Ok(Self { name, w, h, pixels })
    }

    /// Single-colour texture.
    pub fn solid<S: Into<String>>(name: S, w: usize, h: usize, color: Rgba) -> Self {
        Self {
            name: name.into(),
            w,
            h,
            pixels: vec![color; w * h],
        }
    }

    /// Texel at `(x, y)`, wrapping both coordinates so callers may pass
    /// tiled or slightly out-of-range sample positions.
    #[inline]
    pub fn texel(&self, x: i32, y: i32) -> Rgba {
        let u = x.rem_euclid(self.w as i32) as usize;
        let v = y.rem_euclid(self.h as i32) as usize;
        self.pixels[v * self.w + u]
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    /// Pixel vector does not match the declared dimensions.
    #[error("texture `{name}` is {w}×{h} but carries {len} pixels")]
    BadSize {
        name: String,
        w: usize,
        h: usize,
        len: usize,
    },
}

/// A format-agnostic cache of textures.
///
/// * Does **not** know about PNG or any other container; that’s the
///   loader’s job.
/// * Stores exactly one copy of every name.
/// * ID **0** is always the “missing” checkerboard.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create an empty bank with a mandatory *missing* texture used as
    /// fallback. The texture is inserted under the fixed name `"MISSING"`
    /// and obtains the handle **0**.
    pub fn new(missing_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), NO_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex],
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including the “missing” one).
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.len() == 1
    } // only checker

    /// Obtain the id for a *loaded* texture by name.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    /// Fallback-safe query: unknown names resolve to the checkerboard id.
    pub fn id_or_missing(&self, name: &str) -> TextureId {
        self.id(name).unwrap_or(NO_TEXTURE)
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    /// Mutable borrow (e.g. for animated textures).
    pub fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture, TextureError> {
        self.data
            .get_mut(id as usize)
            .ok_or(TextureError::BadId(id))
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }
}

/*======================================================================*/
/*                          Material lookup                             */
/*======================================================================*/

/// Which grid axis the ray crossed when it hit a wall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Stepped along X: the face is perpendicular to the X axis.
    X,
    /// Stepped along Y.
    Y,
}

/// One wall hit as seen by the material lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellHit {
    pub x: usize,
    pub y: usize,
    pub layer: usize,
    pub side: Side,
    /// Raw grid value (`> 0`).
    pub value: i32,
}

/// Texture/material lookup consumed by the engine.
///
/// Read concurrently by every column task, hence `Sync`.
pub trait TextureSource: Sync {
    /// Texture for a wall face, `None` = draw nothing for this column.
    fn wall_texture(&self, hit: CellHit) -> Option<TextureId>;

    /// Floor texture under grid cell `(x, y)`, `None` = leave transparent.
    fn floor_texture(&self, x: usize, y: usize) -> Option<&Texture>;

    /// Resolve a handle for drawing.
    fn texture(&self, id: TextureId) -> Option<&Texture>;
}

/// Slot rewrites applied to faces hit on the X side.
///
/// Asymmetric wall art (a house front that differs from its side) is
/// expressed as data here instead of branches in the lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SideRemap(HashMap<usize, usize>);

impl SideRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert: X-side hits on `from` use `to` instead.
    pub fn with(mut self, from: usize, to: usize) -> Self {
        self.0.insert(from, to);
        self
    }

    pub fn insert(&mut self, from: usize, to: usize) {
        self.0.insert(from, to);
    }

    #[inline]
    pub fn apply(&self, slot: usize) -> usize {
        self.0.get(&slot).copied().unwrap_or(slot)
    }
}

impl FromIterator<(usize, usize)> for SideRemap {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Default [`TextureSource`]: cell value `v` selects wall slot `v - 1`.
pub struct Materials {
    bank: TextureBank,
    walls: Vec<TextureId>,
    x_side: SideRemap,
    floor: Option<TextureId>,
    render_floor: bool,
}

impl Materials {
    pub fn new(bank: TextureBank) -> Self {
        Self {
            bank,
            walls: Vec::new(),
            x_side: SideRemap::default(),
            floor: None,
            render_floor: true,
        }
    }

    pub fn bank(&self) -> &TextureBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut TextureBank {
        &mut self.bank
    }

    /// Bind wall slot `slot` (cell value `slot + 1`) to a texture.
    pub fn set_wall(&mut self, slot: usize, id: TextureId) -> Result<(), TextureError> {
        self.bank.texture(id)?;
        if self.walls.len() <= slot {
            self.walls.resize(slot + 1, NO_TEXTURE);
        }
        self.walls[slot] = id;
        Ok(())
    }

    /// Replace the slot list wholesale; index = cell value − 1.
    pub fn set_walls(&mut self, ids: Vec<TextureId>) -> Result<(), TextureError> {
        for &id in &ids {
            self.bank.texture(id)?;
        }
        self.walls = ids;
        Ok(())
    }

    pub fn set_side_remap(&mut self, remap: SideRemap) {
        self.x_side = remap;
    }

    pub fn set_floor(&mut self, id: Option<TextureId>) -> Result<(), TextureError> {
        if let Some(id) = id {
            self.bank.texture(id)?;
        }
        self.floor = id;
        Ok(())
    }

    pub fn set_render_floor(&mut self, on: bool) {
        self.render_floor = on;
    }

    pub fn render_floor(&self) -> bool {
        self.render_floor
    }

    /// Resolve a cell value and side to a slot, `None` for empty cells.
    fn slot(&self, value: i32, side: Side) -> Option<usize> {
        let slot = usize::try_from(value.checked_sub(1)?).ok()?;
        Some(match side {
            Side::X => self.x_side.apply(slot),
            Side::Y => slot,
        })
    }
}

impl TextureSource for Materials {
    fn wall_texture(&self, hit: CellHit) -> Option<TextureId> {
        let slot = self.slot(hit.value, hit.side)?;
        self.walls.get(slot).copied()
    }

    fn floor_texture(&self, _x: usize, _y: usize) -> Option<&Texture> {
        if !self.render_floor {
            return None;
        }
        self.bank.texture(self.floor?).ok()
    }

    fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.bank.texture(id).ok()
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
