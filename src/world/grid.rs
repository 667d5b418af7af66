use crate::engine::ConfigError;

/// Layered tile data the engine reads while casting.
///
/// Cell values: `0` = empty, `> 0` = wall / material id.
/// Implementations must be `Sync`; the grid is read concurrently by every
/// column task and must not change while a frame is cast.
pub trait GridMap: Sync {
    /// Number of layers the data source declares.
    fn num_layers(&self) -> usize;

    /// `(width, height)` in cells; identical for every layer.
    fn size(&self) -> (usize, usize);

    /// Cell value at `(x, y)` on `layer`.
    ///
    /// Layers at or above [`GridMap::num_layers`] must answer with the
    /// topmost layer's data. `(x, y)` is always inside [`GridMap::size`].
    fn cell(&self, layer: usize, x: usize, y: usize) -> i32;
}

/// Owned grid: `layers[layer][x][y]`.
#[derive(Clone, Debug)]
pub struct Grid {
    layers: Vec<Vec<Vec<i32>>>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Validate and wrap layer data. Every layer must be non-empty and have
    /// the same rectangular shape as layer 0.
    pub fn new(layers: Vec<Vec<Vec<i32>>>) -> Result<Self, ConfigError> {
        let first = layers.first().ok_or(ConfigError::EmptyGrid)?;
        let width = first.len();
        let height = first.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        for (layer, cols) in layers.iter().enumerate() {
            if cols.len() != width || cols.iter().any(|c| c.len() != height) {
                return Err(ConfigError::RaggedGrid {
                    layer,
                    width,
                    height,
                });
            }
        }

        Ok(Self {
            layers,
            width,
            height,
        })
    }

    /// Single-layer grid from rows written top-down as they appear in
    /// source (`rows[y][x]`), which is how levels are usually typed out.
    pub fn from_rows(rows: &[&[i32]]) -> Result<Self, ConfigError> {
        Self::from_layer_rows(&[rows])
    }

    /// Multi-layer variant of [`Grid::from_rows`].
    pub fn from_layer_rows(layers: &[&[&[i32]]]) -> Result<Self, ConfigError> {
        let data = layers
            .iter()
            .map(|rows| {
                let w = rows.first().map_or(0, |r| r.len());
                (0..w)
                    .map(|x| rows.iter().map(|row| row.get(x).copied().unwrap_or(0)).collect())
                    .collect()
            })
            .collect();
        Self::new(data)
    }

    /// Mutable cell access for editors and tests; callers must not mutate
    /// while a frame is being cast.
    pub fn set(&mut self, layer: usize, x: usize, y: usize, value: i32) {
        if let Some(cell) = self
            .layers
            .get_mut(layer)
            .and_then(|l| l.get_mut(x))
            .and_then(|c| c.get_mut(y))
        {
            *cell = value;
        }
    }
}

impl GridMap for Grid {
    #[inline]
    fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    fn cell(&self, layer: usize, x: usize, y: usize) -> i32 {
        let top = self.layers.len() - 1;
        self.layers[layer.min(top)][x][y]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
