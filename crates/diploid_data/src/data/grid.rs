use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use serde::{Deserialize, Serialize};

/// One row of binary cell states, `0` or `1` per cell.
pub type CellRow = Vec<u8>;

/// Space-time history of a single run.
///
/// Stored row-major: row `t` occupies `data[t * cells..(t + 1) * cells]`.
/// Rows are only ever appended, so a grid read back from a finished run is
/// immutable in practice.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Archive,
    RkyvSerialize,
    RkyvDeserialize,
)]
#[archive(check_bytes)]
pub struct SpaceTimeGrid {
    cells: usize,
    data: Vec<u8>,
}

impl SpaceTimeGrid {
    /// Creates an empty grid with room for `steps` rows of `cells` cells.
    #[must_use]
    pub fn with_capacity(cells: usize, steps: usize) -> Self {
        Self {
            cells,
            data: Vec::with_capacity(cells.saturating_mul(steps)),
        }
    }

    /// Rebuilds a grid from raw row-major storage.
    ///
    /// Returns `None` when `cells` is zero or `data` is not a whole number of rows.
    #[must_use]
    pub fn from_raw(cells: usize, data: Vec<u8>) -> Option<Self> {
        if cells == 0 || data.len() % cells != 0 {
            return None;
        }
        Some(Self { cells, data })
    }

    /// Appends one row. Panics if the row width does not match.
    pub fn push_row(&mut self, row: &[u8]) {
        assert_eq!(
            row.len(),
            self.cells,
            "row width {} does not match grid width {}",
            row.len(),
            self.cells
        );
        self.data.extend_from_slice(row);
    }

    /// Number of cells per row.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Number of rows recorded so far.
    #[inline]
    #[must_use]
    pub fn steps(&self) -> usize {
        if self.cells == 0 {
            0
        } else {
            self.data.len() / self.cells
        }
    }

    /// `(rows, cells)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.steps(), self.cells)
    }

    #[must_use]
    pub fn row(&self, t: usize) -> Option<&[u8]> {
        let start = t.checked_mul(self.cells)?;
        self.data.get(start..start + self.cells)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.cells.max(1))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// True when every stored value is a valid binary state and the storage
    /// holds a whole number of rows.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.cells > 0 && self.data.len() % self.cells == 0 && self.data.iter().all(|&c| c <= 1)
    }
}

/// Fraction of active cells in a row. An empty row has density `0.0`.
#[must_use]
pub fn density(row: &[u8]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let active: usize = row.iter().map(|&c| c as usize).sum();
    active as f64 / row.len() as f64
}
