//! Per-frame render state owned by the engine.
//!
//! Every buffer is flat and indexed by screen column so the casting passes
//! can hand disjoint `&mut` slices to worker tasks.

use log::debug;

use crate::{engine::types::ColumnSlice, renderer::Rgba, world::geometry::Rect};

/// Initial sprite-slot capacity.
const MIN_SPRITE_SLOTS: usize = 16;

/// One wall layer: a [`ColumnSlice`] per screen column.
#[derive(Clone, Debug, Default)]
pub struct LayerBuffer {
    pub slices: Vec<ColumnSlice>,
}

impl LayerBuffer {
    pub fn new(width: usize) -> Self {
        Self {
            slices: vec![ColumnSlice::default(); width],
        }
    }
}

/// Full-viewport floor pixels, stored **column-major** (`x * h + y`) so a
/// column task owns one contiguous chunk.
#[derive(Clone, Debug, Default)]
pub struct FloorBuffer {
    pixels: Vec<Rgba>,
    w: usize,
    h: usize,
}

impl FloorBuffer {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            pixels: vec![0; w * h],
            w,
            h,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Mutable access for the column pass; chunk with `h`.
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    pub fn column(&self, x: usize) -> &[Rgba] {
        &self.pixels[x * self.h..(x + 1) * self.h]
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.pixels[x * self.h + y]
    }
}

/// Per-sprite column state, allocated on the first accepted column.
#[derive(Clone, Debug, Default)]
pub struct SpriteSlot {
    slices: Vec<ColumnSlice>,
    active: bool,
}

impl SpriteSlot {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Columns of an active slot, `None` if the sprite drew nothing.
    pub fn slices(&self) -> Option<&[ColumnSlice]> {
        self.active.then_some(&self.slices[..])
    }

    /// Make the slot usable for a `width`-column frame, reusing the old
    /// allocation when there is one.
    pub fn activate(&mut self, width: usize) -> &mut [ColumnSlice] {
        if !self.active {
            self.slices.clear();
            self.slices.resize(width, ColumnSlice::default());
            self.active = true;
        }
        &mut self.slices
    }

    /// Forget this frame's columns; the allocation is kept.
    pub fn clear(&mut self) {
        self.active = false;
    }
}

/// Growable array of [`SpriteSlot`]s indexed by draw order.
#[derive(Clone, Debug, Default)]
pub struct SpriteSlots {
    slots: Vec<SpriteSlot>,
}

impl SpriteSlots {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![SpriteSlot::default(); capacity.max(MIN_SPRITE_SLOTS)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ready `count` slots for a frame: grow by doubling when they do not
    /// fit, otherwise clear the existing ones in place.
    pub fn prepare(&mut self, count: usize) {
        let mut capacity = self.slots.len().max(MIN_SPRITE_SLOTS);
        if count > self.slots.len() {
            while capacity < count {
                capacity *= 2;
            }
            debug!("sprite slots: {} → {}", self.slots.len(), capacity);
            self.slots.resize(capacity, SpriteSlot::default());
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(SpriteSlot::clear);
    }

    /// Drop every per-column allocation (viewport resized).
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            *slot = SpriteSlot::default();
        }
    }

    pub fn slots_mut(&mut self, count: usize) -> &mut [SpriteSlot] {
        &mut self.slots[..count]
    }

    /// Active slots in draw order.
    pub fn active(&self) -> impl Iterator<Item = &[ColumnSlice]> {
        self.slots.iter().filter_map(SpriteSlot::slices)
    }
}

/// Texture-column lookup: `slices[x]` is the one-texel-wide source rect of
/// column `x` in a `tile × tile` wall texture.
pub fn texture_slices(tile: usize) -> Vec<Rect> {
    let tile = tile as i32;
    (0..tile).map(|x| Rect::new(x, 0, x + 1, tile)).collect()
}
