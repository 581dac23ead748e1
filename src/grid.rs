//! Provides the datum shift grid, [`CorrectionGrid`].
//!
//! The grid is a regular 1 km lattice anchored at the false origin.
//! The node `(col, row)` sits at easting `1000 * col` and northing `1000 * row`,
//! and holds an east and a north shift, each one encoded as an unsigned
//! 16-bit offset \[mm\] from a per-axis base.
//!
//! The shifts are defined on the _pseudo grid_, the projection of WGS84
//! latitude and longitude by the National Grid formulae,
//! and adding the shift gives the OSGB36 grid position.
use crate::internal::mul_add;
use crate::point::{GridPoint, Shift};

pub use decode::{decode, decode_flat, decode_packed, DecodeGridError, DecodeGridErrorKind};

pub mod decode;

/// The spacing of the lattice \[m\].
const SPACING: f64 = 1000.;

/// The raw values of a node, as [`f64`].
#[derive(Debug, Clone, Copy)]
struct Node {
    east: f64,
    north: f64,
}

struct Interpol {
    sw: Node,
    se: Node,
    nw: Node,
    ne: Node,
}

impl Interpol {
    #[inline(always)]
    fn from(grid: &CorrectionGrid, col: usize, row: usize) -> Option<Self> {
        let sw = grid.raw(col, row)?;
        let se = grid.raw(col + 1, row)?;
        let nw = grid.raw(col, row + 1)?;
        let ne = grid.raw(col + 1, row + 1)?;

        Some(Self { sw, se, nw, ne })
    }

    /// Returns the bilinear interpolation of the raw values, (east, north).
    #[inline(always)]
    fn interpol(&self, t: f64, u: f64) -> (f64, f64) {
        let (dt, du) = (1. - t, 1. - u);
        let (f0, f1, f2, f3) = (dt * du, t * du, dt * u, t * u);

        macro_rules! sum {
            ($axis:ident) => {{
                let temp = self.sw.$axis * f0;
                let temp = mul_add!(self.se.$axis, f1, temp);
                let temp = mul_add!(self.nw.$axis, f2, temp);
                mul_add!(self.ne.$axis, f3, temp)
            }};
        }

        (sum!(east), sum!(north))
    }
}

/// The datum shift grid.
///
/// The grid is immutable once it is made,
/// so that it can be shared between threads freely.
///
/// # Example
///
/// ```
/// # use osgb::{GridPoint, Shift};
/// # use osgb::grid::CorrectionGrid;
/// // 3×3 nodes cover [0, 2000) × [0, 2000)
/// let grid = CorrectionGrid::from_parts(
///     3,
///     3,
///     vec![0, 1000, 2000, 0, 1000, 2000, 0, 1000, 2000],
///     vec![0; 9],
///     86000,
///     -82000,
///     None,
/// )?;
///
/// assert_eq!(
///     grid.shift_at(&GridPoint::new(500.0, 500.0)),
///     Some(Shift::new(86.5, -82.0))
/// );
/// assert_eq!(grid.shift_at(&GridPoint::new(2000.0, 500.0)), None);
/// # Ok::<(), osgb::grid::DecodeGridError>(())
/// ```
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CorrectionGrid {
    columns: usize,
    rows: usize,
    east: Vec<u16>,
    north: Vec<u16>,
    east_base: i32,
    north_base: i32,
    sentinel: Option<u16>,
}

impl CorrectionGrid {
    /// The number of columns of the National Grid correction resources.
    pub const COLUMNS: usize = 701;

    /// Max iteration of [`CorrectionGrid::correct_to_target`].
    pub const MAX_ITERATION: usize = 20;

    /// Convergence criterion of [`CorrectionGrid::correct_to_target`] \[m\].
    pub const TOLERANCE: f64 = 0.0001;

    /// Makes a [`CorrectionGrid`] which covers nothing.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::GridPoint;
    /// # use osgb::grid::CorrectionGrid;
    /// let grid = CorrectionGrid::empty();
    /// assert!(grid.is_empty());
    /// assert_eq!(grid.shift_at(&GridPoint::new(331439.160, 431992.943)), None);
    /// ```
    #[inline]
    pub const fn empty() -> Self {
        Self {
            columns: 0,
            rows: 0,
            east: Vec::new(),
            north: Vec::new(),
            east_base: 0,
            north_base: 0,
            sentinel: None,
        }
    }

    /// Makes a [`CorrectionGrid`] from row-major raw values.
    ///
    /// The shift of a node is (`base` + raw) / 1000 \[m\],
    /// and a node which has the raw value `sentinel` (on either axis) has no data.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `columns * rows` overflows,
    /// or the length of `east` or `north` is not `columns * rows`.
    pub fn from_parts(
        columns: usize,
        rows: usize,
        east: Vec<u16>,
        north: Vec<u16>,
        east_base: i32,
        north_base: i32,
        sentinel: Option<u16>,
    ) -> Result<Self, DecodeGridError> {
        let expected = columns
            .checked_mul(rows)
            .ok_or(DecodeGridError::new_dimension(columns, rows))?;
        for found in [east.len(), north.len()] {
            if found != expected {
                return Err(DecodeGridError::new_length(expected, found));
            }
        }

        Ok(Self {
            columns,
            rows,
            east,
            north,
            east_base,
            north_base,
            sentinel,
        })
    }

    /// Returns the number of columns.
    #[inline]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the number of rows.
    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the base of the east shift \[mm\].
    #[inline]
    pub const fn east_base(&self) -> i32 {
        self.east_base
    }

    /// Returns the base of the north shift \[mm\].
    #[inline]
    pub const fn north_base(&self) -> i32 {
        self.north_base
    }

    /// Returns the raw value which marks a node without data.
    #[inline]
    pub const fn sentinel(&self) -> Option<u16> {
        self.sentinel
    }

    /// Returns `true` if the grid has no cell.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.columns < 2 || self.rows < 2
    }

    /// Returns `true` if `point` lies in the rectangle the cells span.
    ///
    /// The rectangle is half-open,
    /// \[0, 1000 (columns − 1)) × \[0, 1000 (rows − 1)).
    /// Nodes without data may still make a contained point uncovered.
    #[inline]
    pub fn contains(&self, point: &GridPoint) -> bool {
        if self.is_empty() {
            return false;
        }

        let width = (self.columns - 1) as f64 * SPACING;
        let height = (self.rows - 1) as f64 * SPACING;

        0. <= point.easting
            && 0. <= point.northing
            && point.easting < width
            && point.northing < height
    }

    /// Returns the shift of the node `(col, row)` if it has data.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::Shift;
    /// # use osgb::grid::CorrectionGrid;
    /// let grid = CorrectionGrid::from_parts(2, 1, vec![0, 500], vec![250, 0], 86000, -82000, Some(0))?;
    ///
    /// assert_eq!(grid.node(0, 0), None);
    /// assert_eq!(grid.node(1, 0), None);
    /// assert_eq!(grid.node(2, 0), None);
    ///
    /// let grid = CorrectionGrid::from_parts(2, 1, vec![1, 500], vec![250, 1], 86000, -82000, Some(0))?;
    /// assert_eq!(grid.node(1, 0), Some(Shift::new(86.5, -81.999)));
    /// # Ok::<(), osgb::grid::DecodeGridError>(())
    /// ```
    #[inline]
    pub fn node(&self, col: usize, row: usize) -> Option<Shift> {
        self.raw(col, row).map(|node| {
            Shift::new(
                (self.east_base as f64 + node.east) / SPACING,
                (self.north_base as f64 + node.north) / SPACING,
            )
        })
    }

    #[inline]
    fn raw(&self, col: usize, row: usize) -> Option<Node> {
        if col >= self.columns || row >= self.rows {
            return None;
        }

        let index = row * self.columns + col;
        let (east, north) = (self.east[index], self.north[index]);

        match self.sentinel {
            Some(s) if s == east || s == north => None,
            _ => Some(Node {
                east: east as f64,
                north: north as f64,
            }),
        }
    }

    /// Returns the shift at `point` on the pseudo grid.
    ///
    /// Returns [`None`] when `point` is out of coverage,
    /// that is, out of the rectangle the grid spans
    /// or any corner of the cell containing `point` has no data.
    /// It never extrapolates.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::{GridPoint, Shift};
    /// # use osgb::grid::CorrectionGrid;
    /// let grid = CorrectionGrid::from_parts(
    ///     2,
    ///     2,
    ///     vec![0, 1000, 0, 1000],
    ///     vec![0, 0, 2000, 2000],
    ///     86000,
    ///     -82000,
    ///     None,
    /// )?;
    ///
    /// let shift = grid.shift_at(&GridPoint::new(250.0, 750.0)).unwrap();
    /// assert_eq!(shift, Shift::new(86.25, -80.5));
    ///
    /// assert_eq!(grid.shift_at(&GridPoint::new(-0.001, 750.0)), None);
    /// assert_eq!(grid.shift_at(&GridPoint::new(250.0, 1000.0)), None);
    /// # Ok::<(), osgb::grid::DecodeGridError>(())
    /// ```
    pub fn shift_at(&self, point: &GridPoint) -> Option<Shift> {
        if !self.contains(point) {
            return None;
        }

        let x = point.easting / SPACING;
        let y = point.northing / SPACING;

        let col = x.floor();
        let row = y.floor();

        let interpol = Interpol::from(self, col as usize, row as usize)?;

        let (east, north) = interpol.interpol(x - col, y - row);

        Some(Shift::new(
            (self.east_base as f64 + east) / SPACING,
            (self.north_base as f64 + north) / SPACING,
        ))
    }

    /// Returns the pseudo grid position which the shift carries onto `point`.
    ///
    /// The shifts are defined at pseudo grid positions,
    /// hence this solves 𝑞 + shift(𝑞) = `point` for 𝑞 by fixed-point iteration.
    /// It stops when the successive shifts agree within [`CorrectionGrid::TOLERANCE`]
    /// on both axes, or [`CorrectionGrid::MAX_ITERATION`] iterations exhausted.
    ///
    /// Returns [`None`] when the iteration leaves the coverage.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::GridPoint;
    /// # use osgb::grid::CorrectionGrid;
    /// // constant shift (+100, -50)
    /// let grid = CorrectionGrid::from_parts(3, 3, vec![14000; 9], vec![32000; 9], 86000, -82000, None)?;
    ///
    /// let target = grid.correct_to_target(&GridPoint::new(1100.0, 1450.0));
    /// assert_eq!(target, Some(GridPoint::new(1000.0, 1500.0)));
    ///
    /// // the shift is looked up on the point itself at first
    /// assert_eq!(grid.correct_to_target(&GridPoint::new(2050.0, 1000.0)), None);
    /// # Ok::<(), osgb::grid::DecodeGridError>(())
    /// ```
    pub fn correct_to_target(&self, point: &GridPoint) -> Option<GridPoint> {
        self.correct_within(point, Self::MAX_ITERATION)
    }

    fn correct_within(&self, point: &GridPoint, max_iteration: usize) -> Option<GridPoint> {
        let mut shift = self.shift_at(point)?;
        let mut candidate = point - shift;

        for _ in 0..max_iteration {
            let last = shift;

            // shifted off the edge
            shift = self.shift_at(&candidate)?;
            candidate = point - shift;

            if (shift.east - last.east).abs() < Self::TOLERANCE
                && (shift.north - last.north).abs() < Self::TOLERANCE
            {
                return Some(candidate);
            }
        }

        tracing::warn!(
            easting = point.easting,
            northing = point.northing,
            "shift inversion not converged after {max_iteration} iterations"
        );
        Some(candidate)
    }
}
