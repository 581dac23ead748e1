//! Provides [`ConverterBuilder`].
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use crate::convert::Converter;
use crate::grid::{decode, CorrectionGrid, DecodeGridError};

/// The environment variable which names the correction grid resource.
pub const GRID_PATH_VAR: &str = "OSGB_GRID_PATH";

/// The builder of [`Converter`].
///
/// # Example
///
/// ```
/// # use osgb::{ConverterBuilder, GridPoint, Shift};
/// # use osgb::grid::CorrectionGrid;
/// let grid = CorrectionGrid::from_parts(2, 2, vec![10; 4], vec![20; 4], 86000, -82000, None)?;
///
/// let converter = ConverterBuilder::new().grid(grid).build();
///
/// assert_eq!(
///     converter.grid.shift_at(&GridPoint::new(500.0, 500.0)),
///     Some(Shift::new(86.01, -81.98))
/// );
/// # Ok::<(), osgb::grid::DecodeGridError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConverterBuilder {
    grid: CorrectionGrid,
}

impl ConverterBuilder {
    /// Makes a [`ConverterBuilder`] with the empty grid.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::ConverterBuilder;
    /// let converter = ConverterBuilder::new().build();
    /// assert!(converter.grid.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            grid: CorrectionGrid::empty(),
        }
    }

    /// Makes a [`ConverterBuilder`] configured by the environment.
    ///
    /// It loads the grid from the path the `OSGB_GRID_PATH` variable names,
    /// and uses the empty grid when the variable is not set.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when it fails to load the grid.
    pub fn from_env() -> Result<Self, LoadGridError> {
        Self::from_var(std::env::var_os(GRID_PATH_VAR))
    }

    fn from_var(value: Option<OsString>) -> Result<Self, LoadGridError> {
        match value {
            Some(path) if !path.is_empty() => Self::new().grid_path(path),
            _ => Ok(Self::new()),
        }
    }

    /// Updates by a [`CorrectionGrid`].
    #[inline]
    pub fn grid(mut self, grid: CorrectionGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Updates by the grid read from the file `path`, in either format.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when it fails to read or decode the file.
    pub fn grid_path(mut self, path: impl AsRef<Path>) -> Result<Self, LoadGridError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|err| LoadGridError::new_io(path, err))?;
        self.grid = decode(&bytes).map_err(|err| LoadGridError::new_decode(path, err))?;

        tracing::debug!(path = %path.display(), "loaded correction grid");
        Ok(self)
    }

    /// Builds [`Converter`].
    #[inline]
    pub fn build(self) -> Converter {
        Converter::new(self.grid)
    }
}

//
// Error
//

/// An error which can be returned on loading a correction grid resource.
#[derive(Debug)]
pub struct LoadGridError {
    kind: LoadGridErrorKind,
    path: PathBuf,
}

/// An error kind of [`LoadGridError`].
#[derive(Debug)]
pub enum LoadGridErrorKind {
    Io(io::Error),
    Decode(DecodeGridError),
}

impl LoadGridError {
    #[cold]
    fn new_io(path: &Path, err: io::Error) -> Self {
        Self {
            kind: LoadGridErrorKind::Io(err),
            path: path.to_path_buf(),
        }
    }

    #[cold]
    fn new_decode(path: &Path, err: DecodeGridError) -> Self {
        Self {
            kind: LoadGridErrorKind::Decode(err),
            path: path.to_path_buf(),
        }
    }

    /// Returns the detailed cause.
    pub const fn kind(&self) -> &LoadGridErrorKind {
        &self.kind
    }

    /// Returns the path of the resource.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Error for LoadGridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            LoadGridErrorKind::Io(e) => Some(e),
            LoadGridErrorKind::Decode(e) => Some(e),
        }
    }
}

impl Display for LoadGridError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let path = self.path.display();
        match &self.kind {
            LoadGridErrorKind::Io(e) => write!(f, "failed to read grid '{path}': {e}"),
            LoadGridErrorKind::Decode(e) => write!(f, "failed to load grid '{path}': {e}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("osgb-{}-{name}", std::process::id()))
    }

    fn sample() -> CorrectionGrid {
        CorrectionGrid::from_parts(3, 2, vec![1; 6], vec![2; 6], 86000, -82000, Some(0)).unwrap()
    }

    #[test]
    fn test_new() {
        let converter = ConverterBuilder::new().build();
        assert_eq!(converter, Converter::default());
    }

    #[test]
    fn test_grid() {
        let converter = ConverterBuilder::new().grid(sample()).build();
        assert_eq!(converter.grid, sample());
    }

    #[test]
    fn test_grid_path() {
        let path = temp_path("flat.bin");
        std::fs::write(&path, sample().encode_flat()).unwrap();

        let converter = ConverterBuilder::new().grid_path(&path).unwrap().build();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(converter.grid, sample());
    }

    #[test]
    fn test_grid_path_packed() {
        let path = temp_path("packed.txt");
        std::fs::write(&path, "0000D20:@\n0000D20:@\n").unwrap();

        let converter = ConverterBuilder::from_var(Some(path.clone().into()))
            .unwrap()
            .build();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(converter.grid.columns(), CorrectionGrid::COLUMNS);
        assert_eq!(converter.grid.rows(), 2);
    }

    #[test]
    fn test_missing() {
        let path = temp_path("missing.bin");
        let err = ConverterBuilder::new().grid_path(&path).unwrap_err();

        assert!(matches!(err.kind(), LoadGridErrorKind::Io(_)));
        assert_eq!(err.path(), path);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_malformed() {
        let path = temp_path("malformed.bin");
        std::fs::write(&path, b"OSTN\x01").unwrap();

        let err = ConverterBuilder::new().grid_path(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err.kind(), LoadGridErrorKind::Decode(_)));
        assert_eq!(
            err.to_string(),
            format!(
                "failed to load grid '{}': decode error: truncated, expected 24 bytes, found 5",
                path.display()
            )
        );
    }

    #[test]
    fn test_unset() {
        let converter = ConverterBuilder::from_var(None).unwrap().build();
        assert!(converter.grid.is_empty());

        let converter = ConverterBuilder::from_var(Some(OsString::new()))
            .unwrap()
            .build();
        assert!(converter.grid.is_empty());
    }
}
