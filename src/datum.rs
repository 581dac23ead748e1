//! Provides the ellipsoid models of the two supported datums.
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The reference ellipsoid of a datum.
///
/// # Example
///
/// ```
/// # use osgb::datum::{Datum, Ellipsoid};
/// let airy = Datum::Osgb36.ellipsoid();
/// assert_eq!(airy.semi_major_axis, 6377563.396);
/// assert_eq!(*airy, Ellipsoid::AIRY_1830);
/// ```
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Ellipsoid {
    /// The semi-major axis 𝑎 \[m\]
    pub semi_major_axis: f64,
    /// The semi-minor axis 𝑏 \[m\]
    pub semi_minor_axis: f64,
    /// The third flattening 𝑛 = (𝑎 − 𝑏) / (𝑎 + 𝑏)
    pub n: f64,
    /// The eccentricity squared 𝑒² = 1 − 𝑏² / 𝑎²
    pub e2: f64,
}

impl Ellipsoid {
    /// The ellipsoid of [`Datum::Wgs84`].
    pub const WGS84: Self = Self {
        semi_major_axis: 6378137.000,
        semi_minor_axis: 6356752.31424518,
        n: 0.0016792203863836474,
        e2: 0.006694379990141316996137233540,
    };

    /// The ellipsoid of [`Datum::Osgb36`].
    pub const AIRY_1830: Self = Self {
        semi_major_axis: 6377563.396,
        semi_minor_axis: 6356256.909,
        n: 0.0016732203289875152,
        e2: 0.006670540074149231821114893873561,
    };
}

/// The datum a latitude and longitude refer to.
///
/// # Example
///
/// ```
/// # use osgb::Datum;
/// let datum: Datum = "OSGB36".parse()?;
/// assert_eq!(datum, Datum::Osgb36);
/// assert_eq!(datum.to_string(), "OSGB36");
///
/// assert!("ED50".parse::<Datum>().is_err());
/// # Ok::<(), osgb::datum::UnknownDatumError>(())
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Datum {
    /// The satellite datum used by GPS
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "WGS84"))]
    Wgs84,
    /// The datum of the traditional Ordnance Survey maps
    #[cfg_attr(feature = "serde", serde(rename = "OSGB36"))]
    Osgb36,
}

impl Datum {
    /// Returns the reference ellipsoid.
    #[inline]
    pub const fn ellipsoid(&self) -> &'static Ellipsoid {
        match self {
            Self::Wgs84 => &Ellipsoid::WGS84,
            Self::Osgb36 => &Ellipsoid::AIRY_1830,
        }
    }

    /// Returns the canonical name, `"WGS84"` or `"OSGB36"`.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS84",
            Self::Osgb36 => "OSGB36",
        }
    }
}

impl Display for Datum {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Datum {
    type Err = UnknownDatumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WGS84" => Ok(Self::Wgs84),
            "OSGB36" => Ok(Self::Osgb36),
            _ => Err(UnknownDatumError::new(s)),
        }
    }
}

/// Returns the ellipsoid registered for `name`.
///
/// # Errors
///
/// Returns [`Err`] unless `name` is `"WGS84"` or `"OSGB36"`.
///
/// # Example
///
/// ```
/// # use osgb::datum::{lookup, Ellipsoid};
/// assert_eq!(lookup("WGS84")?, Ellipsoid::WGS84);
/// assert!(lookup("EDM50").is_err());
/// # Ok::<(), osgb::datum::UnknownDatumError>(())
/// ```
#[inline]
pub fn lookup(name: &str) -> Result<Ellipsoid, UnknownDatumError> {
    name.parse::<Datum>().map(|datum| *datum.ellipsoid())
}

//
// Error
//

/// An error which can be returned when a datum name is not supported.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UnknownDatumError {
    name: String,
}

impl UnknownDatumError {
    #[cold]
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Returns the rejected name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Error for UnknownDatumError {}

impl Display for UnknownDatumError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "unknown datum: '{}'", self.name)
    }
}
