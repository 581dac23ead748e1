//! Provides [`Converter`] and the conversion functions on the global converter.
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

use crate::builder::ConverterBuilder;
use crate::datum::{Datum, UnknownDatumError};
use crate::grid::CorrectionGrid;
use crate::helmert::shift_between_datums;
use crate::internal::round_to;
use crate::point::{GeoPoint, GridPoint};
use crate::projection::{project, unproject};

static GLOBAL: OnceLock<Converter> = OnceLock::new();

/// The converter between latitude/longitude and the National Grid.
///
/// WGS84 positions go through the correction grid,
/// and through the Helmert transformation where the grid does not cover.
/// With the empty grid, every WGS84 conversion takes the Helmert route.
///
/// There is a builder, see [`ConverterBuilder`].
///
/// # Example
///
/// ```
/// # use osgb::{Converter, Datum, GeoPoint, GridPoint};
/// let converter = Converter::default();
///
/// let result = converter.ll_to_grid(&GeoPoint::new(52.0, -2.0), Datum::Osgb36, None);
/// assert_eq!(result, GridPoint::new(400000.0, 233553.731));
///
/// // out of the grid, rounded to metres by default
/// let result = converter.ll_to_grid(&GeoPoint::new(56.75, -7.0), Datum::Wgs84, None);
/// assert_eq!(result, GridPoint::new(94471.0, 773206.0));
/// ```
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Converter {
    /// The correction grid of the WGS84 conversions.
    pub grid: CorrectionGrid,
}

impl Converter {
    /// Decimal places of the result by default.
    pub const DEFAULT_PRECISION: u32 = 3;

    /// Decimal places of the result via the Helmert transformation by default.
    pub const HELMERT_PRECISION: u32 = 0;

    /// Makes a [`Converter`].
    #[inline]
    pub const fn new(grid: CorrectionGrid) -> Self {
        Self { grid }
    }

    /// Returns the process-wide converter.
    ///
    /// This is built on the first call by [`ConverterBuilder::from_env`],
    /// it runs with the empty grid when the configured grid fails to load.
    ///
    /// No correction grid is embedded in this crate.
    /// Unless `OSGB_GRID_PATH` names one, the global converter has the empty grid
    /// and every WGS84 conversion takes the Helmert route, accurate to a few metres.
    /// For example, WGS84 (52, −2) gives (400097, 233506)
    /// where the OSTN02 grid gives (400096.263, 233505.401).
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| match ConverterBuilder::from_env() {
            Ok(builder) => builder.build(),
            Err(err) => {
                tracing::warn!(%err, "failed to load the correction grid, uses Helmert only");
                Self::default()
            }
        })
    }

    /// Returns the grid position of `point` on `datum`.
    ///
    /// The arguments are swapped when |longitude| > |latitude|,
    /// it assumes a position in and around Great Britain,
    /// where the latitude is 49 to 61 and the longitude −9 to 2.
    ///
    /// The result is rounded to `precision` decimal places,
    /// [`Converter::DEFAULT_PRECISION`] by default,
    /// or [`Converter::HELMERT_PRECISION`] via the Helmert transformation.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::{Converter, Datum, GeoPoint, GridPoint};
    /// let converter = Converter::default();
    ///
    /// let result = converter.ll_to_grid(&GeoPoint::new(52.0, -2.0), Datum::Osgb36, Some(4));
    /// assert_eq!(result, GridPoint::new(400000.0, 233553.7313));
    ///
    /// // swapped
    /// let result = converter.ll_to_grid(&GeoPoint::new(-2.1, 51.5), Datum::Osgb36, None);
    /// assert_eq!(result, GridPoint::new(393059.393, 177954.253));
    /// ```
    pub fn ll_to_grid(&self, point: &GeoPoint, datum: Datum, precision: Option<u32>) -> GridPoint {
        let point = if point.longitude.abs() > point.latitude.abs() {
            point.swapped()
        } else {
            *point
        };

        let projected = project(&point, datum);

        let (result, default) = match datum {
            Datum::Osgb36 => (projected, Self::DEFAULT_PRECISION),
            Datum::Wgs84 => match self.grid.shift_at(&projected) {
                Some(shift) => (projected + shift, Self::DEFAULT_PRECISION),
                None => {
                    tracing::debug!(
                        latitude = point.latitude,
                        longitude = point.longitude,
                        "out of the grid, falls back to Helmert"
                    );
                    let osgb36 = shift_between_datums(&point, Datum::Osgb36);
                    (project(&osgb36, Datum::Osgb36), Self::HELMERT_PRECISION)
                }
            },
        };

        let digits = precision.unwrap_or(default);
        GridPoint::new(
            round_to(result.easting, digits),
            round_to(result.northing, digits),
        )
    }

    /// Returns the latitude and longitude of `point` on `datum`, unrounded.
    ///
    /// # Example
    ///
    /// ```
    /// # use osgb::{Converter, Datum, GridPoint};
    /// let converter = Converter::default();
    ///
    /// // Glen Achcall
    /// let result = converter.grid_to_ll(&GridPoint::new(217380.0, 896060.0), Datum::Osgb36);
    /// assert!((result.latitude - 57.91671633292687).abs() < 1e-12);
    /// assert!((result.longitude - -5.083330213971718).abs() < 1e-12);
    /// ```
    pub fn grid_to_ll(&self, point: &GridPoint, datum: Datum) -> GeoPoint {
        let osgb36 = unproject(point, Datum::Osgb36);

        match datum {
            Datum::Osgb36 => osgb36,
            Datum::Wgs84 => match self.grid.correct_to_target(point) {
                Some(pseudo) => unproject(&pseudo, Datum::Wgs84),
                None => {
                    tracing::debug!(
                        easting = point.easting,
                        northing = point.northing,
                        "out of the grid, falls back to Helmert"
                    );
                    shift_between_datums(&osgb36, Datum::Wgs84)
                }
            },
        }
    }
}

/// Returns the grid position (easting, northing) of the latitude and longitude on `datum`.
///
/// This uses [`Converter::global`], see [`Converter::ll_to_grid`] for details.
///
/// # Errors
///
/// Returns [`Err`] unless `datum` is `"WGS84"` or `"OSGB36"`.
///
/// # Example
///
/// ```
/// # use std::error::Error;
/// # use osgb::ll_to_grid;
/// assert_eq!(ll_to_grid(49.0, -2.0, "OSGB36", None)?, (400000.0, -100000.0));
/// assert_eq!(ll_to_grid(52.0, -2.0, "OSGB36", None)?, (400000.0, 233553.731));
///
/// assert!(ll_to_grid(49.0, -2.0, "EDM50", None).is_err());
/// # Ok::<(), Box<dyn Error>>(())
/// ```
pub fn ll_to_grid(
    latitude: f64,
    longitude: f64,
    datum: &str,
    precision: Option<u32>,
) -> Result<(f64, f64), ConvertError> {
    let datum: Datum = datum.parse()?;
    let point = GeoPoint::new(latitude, longitude);

    Ok(Converter::global()
        .ll_to_grid(&point, datum, precision)
        .into())
}

/// Returns the latitude and longitude of the grid position on `datum`.
///
/// This uses [`Converter::global`], see [`Converter::grid_to_ll`] for details.
///
/// # Errors
///
/// Returns [`Err`] unless `datum` is `"WGS84"` or `"OSGB36"`.
///
/// # Example
///
/// ```
/// # use std::error::Error;
/// # use osgb::grid_to_ll;
/// // Cranbourne Chase
/// let (latitude, longitude) = grid_to_ll(400000.0, 122350.044, "OSGB36")?;
/// assert!((latitude - 51.0).abs() < 5e-9);
/// assert_eq!(longitude, -2.0);
/// # Ok::<(), Box<dyn Error>>(())
/// ```
pub fn grid_to_ll(easting: f64, northing: f64, datum: &str) -> Result<(f64, f64), ConvertError> {
    let datum: Datum = datum.parse()?;
    let point = GridPoint::new(easting, northing);

    Ok(Converter::global().grid_to_ll(&point, datum).into())
}

//
// Error
//

/// An error which can be returned by [`ll_to_grid`] and [`grid_to_ll`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ConvertError {
    kind: ConvertErrorKind,
}

/// An error kind of [`ConvertError`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ConvertErrorKind {
    /// The datum name is not supported
    UnknownDatum(UnknownDatumError),
}

impl ConvertError {
    /// Returns the detailed cause.
    pub const fn kind(&self) -> &ConvertErrorKind {
        &self.kind
    }
}

impl From<UnknownDatumError> for ConvertError {
    #[cold]
    fn from(value: UnknownDatumError) -> Self {
        Self {
            kind: ConvertErrorKind::UnknownDatum(value),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ConvertErrorKind::UnknownDatum(e) => Some(e),
        }
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match &self.kind {
            ConvertErrorKind::UnknownDatum(e) => write!(f, "conversion error: {e}"),
        }
    }
}
