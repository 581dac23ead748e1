//! Provides the approximate datum shift by the small Helmert transformation.
//!
//! This is the fallback outside the coverage of the correction grid,
//! with accuracy of a few metres over most of Great Britain.
use crate::datum::Datum;
use crate::internal::DEG;
use crate::point::GeoPoint;

/// Convergence criterion of [`from_cartesian`] \[rad\].
const TOLERANCE: f64 = 1e-12;
/// Safety cap of [`from_cartesian`].
const MAX_ITERATION: usize = 100;

/// Represents an earth-centred, earth-fixed position \[m\].
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Cartesian {
    /// The x coordinate, towards the prime meridian on the equator \[m\]
    pub x: f64,
    /// The y coordinate, towards 90° east on the equator \[m\]
    pub y: f64,
    /// The z coordinate, towards the north pole \[m\]
    pub z: f64,
}

impl Cartesian {
    /// Makes a [`Cartesian`].
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Returns the cartesian position of `point` at ellipsoidal `height` \[m\].
///
/// # Example
///
/// ```
/// # use osgb::{Datum, GeoPoint};
/// # use osgb::helmert::{from_cartesian, to_cartesian};
/// let cartesian = to_cartesian(&GeoPoint::new(53.0, -3.0), 10.0, Datum::Osgb36);
/// let (point, height) = from_cartesian(&cartesian, Datum::Osgb36);
///
/// assert!((point.latitude - 53.0).abs() < 1e-12);
/// assert!((point.longitude - -3.0).abs() < 1e-12);
/// assert!((height - 10.0).abs() < 1e-6);
/// ```
pub fn to_cartesian(point: &GeoPoint, height: f64, datum: Datum) -> Cartesian {
    let ellipsoid = datum.ellipsoid();
    let (a, e2) = (ellipsoid.semi_major_axis, ellipsoid.e2);

    let phi = point.latitude / DEG;
    let (sp, cp) = phi.sin_cos();

    let lambda = point.longitude / DEG;
    let (sl, cl) = lambda.sin_cos();

    let nu = a / (1. - e2 * sp * sp).sqrt();

    Cartesian::new(
        (nu + height) * cp * cl,
        (nu + height) * cp * sl,
        ((1. - e2) * nu + height) * sp,
    )
}

/// Returns the latitude, longitude and ellipsoidal height of `cartesian`.
///
/// The latitude is searched iteratively until it changes less than 1e-12 rad.
pub fn from_cartesian(cartesian: &Cartesian, datum: Datum) -> (GeoPoint, f64) {
    let ellipsoid = datum.ellipsoid();
    let (a, e2) = (ellipsoid.semi_major_axis, ellipsoid.e2);
    let Cartesian { x, y, z } = *cartesian;

    let p = x.hypot(y);
    let lambda = y.atan2(x);

    let nu_at = |phi: f64| {
        let sp = phi.sin();
        a / (1. - e2 * sp * sp).sqrt()
    };

    let mut phi = z.atan2(p * (1. - e2));
    let mut nu = nu_at(phi);
    let mut converged = false;
    for _ in 0..MAX_ITERATION {
        let next = (z + e2 * nu * phi.sin()).atan2(p);
        if (next - phi).abs() < TOLERANCE {
            // nu stays at the previous latitude
            phi = next;
            converged = true;
            break;
        }

        phi = next;
        nu = nu_at(phi);
    }

    if !converged {
        tracing::warn!(x, y, z, "latitude not converged after {MAX_ITERATION} iterations");
    }

    (GeoPoint::new(phi * DEG, lambda * DEG), p / phi.cos() - nu)
}

/// The direction of [`small_helmert`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Direction {
    /// From OSGB36 to WGS84
    ToWgs84,
    /// From WGS84 to OSGB36
    ToOsgb36,
}

impl Direction {
    /// Returns the direction which ends in `datum`.
    #[inline]
    pub const fn towards(datum: Datum) -> Self {
        match datum {
            Datum::Wgs84 => Self::ToWgs84,
            Datum::Osgb36 => Self::ToOsgb36,
        }
    }

    /// Returns the datum the direction starts from.
    #[inline]
    pub const fn source(&self) -> Datum {
        match self {
            Self::ToWgs84 => Datum::Osgb36,
            Self::ToOsgb36 => Datum::Wgs84,
        }
    }

    /// Returns the datum the direction ends in.
    #[inline]
    pub const fn target(&self) -> Datum {
        match self {
            Self::ToWgs84 => Datum::Wgs84,
            Self::ToOsgb36 => Datum::Osgb36,
        }
    }

    /// Returns the multiplier of the parameters, −1 or +1.
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::ToWgs84 => -1.,
            Self::ToOsgb36 => 1.,
        }
    }
}

/// Applies the seven-parameter Helmert transformation between OSGB36 and WGS84.
///
/// The parameters are the ones the Ordnance Survey publishes,
/// the translation \[m\], the scale change and the rotation \[arcsec\],
/// multiplied by [`Direction::sign`].
pub fn small_helmert(direction: Direction, cartesian: &Cartesian) -> Cartesian {
    let d = direction.sign();
    let Cartesian { x, y, z } = *cartesian;

    let tx = d * -446.448;
    let ty = d * 125.157;
    let tz = d * -542.060;
    let s = d * 0.0000204894 + 1.;
    let rx = (d * -0.1502 / 3600.) / DEG;
    let ry = (d * -0.2470 / 3600.) / DEG;
    let rz = (d * -0.8421 / 3600.) / DEG;

    Cartesian::new(
        tx + s * x - rz * y + ry * z,
        ty + rz * x + s * y - rx * z,
        tz - ry * x + rx * y + s * z,
    )
}

/// Shifts `point` from the other datum into `into`, at zero height.
///
/// # Example
///
/// ```
/// # use osgb::{Datum, GeoPoint};
/// # use osgb::helmert::shift_between_datums;
/// let wgs84 = shift_between_datums(&GeoPoint::new(52.5, -1.5), Datum::Wgs84);
/// assert!((wgs84.latitude - 52.50037380549816).abs() < 1e-9);
/// assert!((wgs84.longitude - -1.5014880254384784).abs() < 1e-9);
/// ```
pub fn shift_between_datums(point: &GeoPoint, into: Datum) -> GeoPoint {
    let direction = Direction::towards(into);

    let cartesian = to_cartesian(point, 0., direction.source());
    let cartesian = small_helmert(direction, &cartesian);
    let (result, _) = from_cartesian(&cartesian, direction.target());

    result
}
