//! Provides [`GeoPoint`], [`GridPoint`] and [`Shift`].
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a position by latitude and longitude.
///
/// A `GeoPoint` does not know its datum,
/// the conversions take it as a separated argument.
///
/// # Example
///
/// ```
/// # use osgb::GeoPoint;
/// let point = GeoPoint::new(52.0, -2.0);
/// assert_eq!(point.latitude, 52.0);
/// assert_eq!(point.longitude, -2.0);
/// assert_eq!(point, (52.0, -2.0).into());
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    /// The latitude \[deg\], positive north
    pub latitude: f64,
    /// The longitude \[deg\], positive east
    pub longitude: f64,
}

impl GeoPoint {
    /// Makes a [`GeoPoint`].
    ///
    /// This does not check the value range.
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns a [`GeoPoint`] which latitude and longitude swapped.
    #[inline]
    pub const fn swapped(&self) -> Self {
        Self::new(self.longitude, self.latitude)
    }
}

impl From<(f64, f64)> for GeoPoint {
    #[inline]
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<GeoPoint> for (f64, f64) {
    #[inline]
    fn from(value: GeoPoint) -> Self {
        (value.latitude, value.longitude)
    }
}

/// Represents a position on the National Grid.
///
/// Both coordinates are measured in metres from the false origin,
/// a point to the south-west of the Scilly Isles.
///
/// # Example
///
/// ```
/// # use osgb::{GridPoint, Shift};
/// let point = GridPoint::new(400000.0, 233500.5);
///
/// // Add/sub Shift
/// let result = point + Shift::new(96.0, -48.25);
/// assert_eq!(result, GridPoint::new(400096.0, 233452.25));
/// assert_eq!(result - Shift::new(96.0, -48.25), point);
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPoint {
    /// The easting \[m\]
    pub easting: f64,
    /// The northing \[m\]
    pub northing: f64,
}

impl GridPoint {
    /// Makes a [`GridPoint`].
    #[inline]
    pub const fn new(easting: f64, northing: f64) -> Self {
        Self { easting, northing }
    }
}

impl From<(f64, f64)> for GridPoint {
    #[inline]
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<GridPoint> for (f64, f64) {
    #[inline]
    fn from(value: GridPoint) -> Self {
        (value.easting, value.northing)
    }
}

/// The datum shift at a position of the grid.
///
/// # Example
///
/// ```
/// # use osgb::Shift;
/// let shift = Shift::new(3.0, 4.0);
/// assert_eq!(shift.east, 3.0);
/// assert_eq!(shift.north, 4.0);
/// assert_eq!(shift.horizontal(), 5.0);
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shift {
    /// The east shift \[m\]
    pub east: f64,
    /// The north shift \[m\]
    pub north: f64,
}

impl Shift {
    /// Makes a [`Shift`].
    #[inline]
    pub const fn new(east: f64, north: f64) -> Self {
        Self { east, north }
    }

    /// Returns √𝑒𝑎𝑠𝑡² + 𝑛𝑜𝑟𝑡ℎ².
    #[inline]
    pub fn horizontal(&self) -> f64 {
        f64::hypot(self.east, self.north)
    }
}

macro_rules! impl_shift_ops {
    ($lhs:ty) => {
        impl Add<Shift> for $lhs {
            type Output = GridPoint;

            #[inline]
            fn add(self, rhs: Shift) -> Self::Output {
                GridPoint::new(self.easting + rhs.east, self.northing + rhs.north)
            }
        }

        impl Add<&Shift> for $lhs {
            type Output = GridPoint;

            #[inline]
            fn add(self, rhs: &Shift) -> Self::Output {
                GridPoint::new(self.easting + rhs.east, self.northing + rhs.north)
            }
        }

        impl Sub<Shift> for $lhs {
            type Output = GridPoint;

            #[inline]
            fn sub(self, rhs: Shift) -> Self::Output {
                GridPoint::new(self.easting - rhs.east, self.northing - rhs.north)
            }
        }

        impl Sub<&Shift> for $lhs {
            type Output = GridPoint;

            #[inline]
            fn sub(self, rhs: &Shift) -> Self::Output {
                GridPoint::new(self.easting - rhs.east, self.northing - rhs.north)
            }
        }
    };
}

impl_shift_ops!(GridPoint);
impl_shift_ops!(&GridPoint);

impl AddAssign<Shift> for GridPoint {
    #[inline]
    fn add_assign(&mut self, rhs: Shift) {
        self.easting += rhs.east;
        self.northing += rhs.north;
    }
}

impl SubAssign<Shift> for GridPoint {
    #[inline]
    fn sub_assign(&mut self, rhs: Shift) {
        self.easting -= rhs.east;
        self.northing -= rhs.north;
    }
}
