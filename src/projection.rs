//! Provides the Transverse Mercator projection of the National Grid.
//!
//! The formulae follow the Ordnance Survey's series expansions term by term,
//! the summation order affects the last digits at sub-millimetre level.
//! The coefficient names (`II`, `III`, `IIIA`, ...) are those of the OS notes.
use crate::datum::Datum;
use crate::internal::DEG;
use crate::point::{GeoPoint, GridPoint};

/// The latitude of the true origin \[rad\], 49°N.
pub const ORIGIN_PHI: f64 = 49. / DEG;
/// The longitude of the true origin \[rad\], 2°W.
pub const ORIGIN_LAMBDA: f64 = -2. / DEG;
/// The easting of the true origin \[m\].
pub const ORIGIN_EASTING: f64 = 400000.0;
/// The northing of the true origin \[m\].
pub const ORIGIN_NORTHING: f64 = -100000.0;
/// The scale factor on the central meridian.
pub const CONVERGENCE_FACTOR: f64 = 0.9996012717;

/// Tolerance of the footpoint latitude search, a hundredth of a millimetre.
const HUNDREDTH_MM: f64 = 0.00001;
/// Safety cap of the footpoint latitude search.
const MAX_ITERATION: usize = 100;

/// Returns the meridional arc 𝑀 from the origin latitude to `phi` \[rad\].
#[inline]
pub(crate) fn meridional_arc(phi: f64, b: f64, n: f64) -> f64 {
    let p_plus = phi + ORIGIN_PHI;
    let p_minus = phi - ORIGIN_PHI;

    b * CONVERGENCE_FACTOR
        * ((1. + n * (1. + 5. / 4. * n * (1. + n))) * p_minus
            - 3. * n * (1. + n * (1. + 7. / 8. * n)) * p_minus.sin() * p_plus.cos()
            + (15. / 8. * n * (n * (1. + n))) * (2. * p_minus).sin() * (2. * p_plus).cos()
            - 35. / 24. * n.powf(3.) * (3. * p_minus).sin() * (3. * p_plus).cos())
}

/// Projects `point` on the ellipsoid of `datum` onto the grid.
///
/// The result is not rounded, and is computed for any input,
/// even though it is meaningless far from the British Isles.
///
/// # Example
///
/// ```
/// # use osgb::{Datum, GeoPoint, GridPoint};
/// # use osgb::projection::project;
/// let result = project(&GeoPoint::new(52.0, -2.0), Datum::Osgb36);
/// assert_eq!(result, GridPoint::new(400000.0, 233553.73133031745));
///
/// // The true origin
/// let result = project(&GeoPoint::new(49.0, -2.0), Datum::Osgb36);
/// assert_eq!(result, GridPoint::new(400000.0, -100000.0));
/// ```
#[allow(non_snake_case)]
pub fn project(point: &GeoPoint, datum: Datum) -> GridPoint {
    let ellipsoid = datum.ellipsoid();
    let (a, b, n, e2) = (
        ellipsoid.semi_major_axis,
        ellipsoid.semi_minor_axis,
        ellipsoid.n,
        ellipsoid.e2,
    );

    let phi = point.latitude / DEG;
    let cp = phi.cos();
    let sp = phi.sin();
    // cos phi never vanishes in GB
    let tp = sp / cp;

    let I = meridional_arc(phi, b, n);

    let nu = a * CONVERGENCE_FACTOR / (1. - e2 * sp * sp).sqrt();
    let eta2 = (1. - e2 * sp * sp) / (1. - e2) - 1.;

    let II = nu / 2. * sp * cp;
    let III = nu / 24. * sp * cp.powf(3.) * (5. - tp * tp + 9. * eta2);
    let IIIA = nu / 720. * sp * cp.powf(5.) * (61. - (58. + tp * tp) * tp * tp);

    let IV = nu * cp;
    let V = nu / 6. * cp.powf(3.) * (eta2 + 1. - tp * tp);
    let VI = nu / 120.
        * cp.powf(5.)
        * (5. + (-18. + tp * tp) * tp * tp + 14. * eta2 - 58. * tp * tp * eta2);

    let dl = point.longitude / DEG - ORIGIN_LAMBDA;
    let northing = ORIGIN_NORTHING + I + (II + (III + IIIA * dl * dl) * dl * dl) * dl * dl;
    let easting = ORIGIN_EASTING + (IV + (V + VI * dl * dl) * dl * dl) * dl;

    GridPoint::new(easting, northing)
}

/// Un-projects `point` from the grid onto the ellipsoid of `datum`.
///
/// The footpoint latitude is searched iteratively until the meridional arc
/// matches the northing within a hundredth of a millimetre.
///
/// # Example
///
/// ```
/// # use osgb::{Datum, GridPoint};
/// # use osgb::projection::unproject;
/// let result = unproject(&GridPoint::new(651409.903, 313177.270), Datum::Osgb36);
/// assert!((result.latitude - 52.6575703).abs() < 5e-9);
/// assert!((result.longitude - 1.71792158).abs() < 5e-9);
/// ```
#[allow(non_snake_case)]
pub fn unproject(point: &GridPoint, datum: Datum) -> GeoPoint {
    let ellipsoid = datum.ellipsoid();
    let (a, b, n, e2) = (
        ellipsoid.semi_major_axis,
        ellipsoid.semi_minor_axis,
        ellipsoid.n,
        ellipsoid.e2,
    );

    let af = a * CONVERGENCE_FACTOR;

    let dn = point.northing - ORIGIN_NORTHING;
    let de = point.easting - ORIGIN_EASTING;

    let mut phi = ORIGIN_PHI + dn / af;
    let mut converged = false;
    for _ in 0..MAX_ITERATION {
        let M = meridional_arc(phi, b, n);
        if (dn - M).abs() < HUNDREDTH_MM {
            converged = true;
            break;
        }
        phi += (dn - M) / af;
    }

    if !converged {
        tracing::warn!(
            easting = point.easting,
            northing = point.northing,
            "footpoint latitude not converged after {MAX_ITERATION} iterations"
        );
    }

    let cp = phi.cos();
    let sp = phi.sin();
    let tp = sp / cp;

    let splat = 1. - e2 * sp * sp;
    let sqrtsplat = splat.sqrt();
    let nu = af / sqrtsplat;
    let rho = af * (1. - e2) / (splat * sqrtsplat);
    let eta2 = nu / rho - 1.;

    let VII = tp / (2. * rho * nu);
    let VIII = tp / (24. * rho * nu.powf(3.)) * (5. + 3. * tp * tp + eta2 - 9. * tp * tp * eta2);
    let IX = tp / (720. * rho * nu.powf(5.)) * (61. + (90. + 45. * tp * tp) * tp * tp);

    let secp = 1. / cp;

    let X = secp / nu;
    let XI = secp / (6. * nu.powf(3.)) * (nu / rho + 2. * tp * tp);
    let XII = secp / (120. * nu.powf(5.)) * (5. + (28. + 24. * tp * tp) * tp * tp);
    let XIIA = secp / (5040. * nu.powf(7.))
        * (61. + (662. + (1320. + 720. * tp * tp) * tp * tp) * tp * tp);

    let phi = phi + (-VII + (VIII - IX * de * de) * de * de) * de * de;
    let lambda = ORIGIN_LAMBDA + (X + (-XI + (XII - XIIA * de * de) * de * de) * de * de) * de;

    GeoPoint::new(phi * DEG, lambda * DEG)
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use quickcheck::{quickcheck, TestResult};
    use rstest::rstest;

    use super::*;

    mod test_project {
        use super::*;

        #[test]
        fn test_central_meridian() {
            let actual = project(&GeoPoint::new(52.0, -2.0), Datum::Osgb36);
            assert_eq!(actual.easting, 400000.0);
            assert_eq!(actual.northing, 233553.73133031745);
        }

        #[test]
        fn test_true_origin() {
            for datum in [Datum::Osgb36, Datum::Wgs84] {
                let actual = project(&GeoPoint::new(49.0, -2.0), datum);
                assert_eq!(actual, GridPoint::new(400000.0, -100000.0));
            }
        }

        #[rstest]
        // the sw corner of OS Explorer sheet 161
        #[case((51.3333333333, -0.416666666667), (510290.252, 160605.816))]
        // north of Glendessary
        #[case((57.0, -320. / 60.), (197573.181, 794792.843))]
        // OS worked example
        #[case(
            (52. + 39. / 60. + 27.2531 / 3600., 1. + 43. / 60. + 4.5177 / 3600.),
            (651409.903, 313177.270)
        )]
        fn test_known(#[case] ll: (f64, f64), #[case] expected: (f64, f64)) {
            let actual = project(&ll.into(), Datum::Osgb36);
            assert_abs_diff_eq!(actual.easting, expected.0, epsilon = 0.0005);
            assert_abs_diff_eq!(actual.northing, expected.1, epsilon = 0.0005);
        }
    }

    mod test_unproject {
        use super::*;

        #[rstest]
        // OS worked example
        #[case((651409.903, 313177.270), (52.6575703, 1.71792158), 5e-9)]
        // Cranbourne Chase
        #[case((400000.0, 122350.044), (51.0, -2.0), 5e-9)]
        // Hoy
        #[case((323223.0, 1004000.0), (58.91680150461385, -3.3333320035568224), 1e-12)]
        // Glen Achcall
        #[case((217380.0, 896060.0), (57.91671633292687, -5.083330213971718), 1e-12)]
        fn test_known(#[case] en: (f64, f64), #[case] expected: (f64, f64), #[case] delta: f64) {
            let actual = unproject(&en.into(), Datum::Osgb36);
            assert_abs_diff_eq!(actual.latitude, expected.0, epsilon = delta);
            assert_abs_diff_eq!(actual.longitude, expected.1, epsilon = delta);
        }

        #[test]
        fn test_central_meridian() {
            let actual = unproject(&GridPoint::new(400000.0, 233553.73133031745), Datum::Osgb36);
            assert_abs_diff_eq!(actual.latitude, 52.0, epsilon = 1e-12);
            assert_eq!(actual.longitude, -2.0);
        }

        #[rstest]
        #[case(f64::NAN, 1.0)]
        #[case(400000.0, f64::NAN)]
        #[case(400000.0, f64::INFINITY)]
        fn test_not_finite(#[case] easting: f64, #[case] northing: f64) {
            // a non-finite northing runs the footpoint search up to the cap
            let actual = unproject(&GridPoint::new(easting, northing), Datum::Osgb36);
            assert!(actual.latitude.is_nan());
            assert!(actual.longitude.is_nan());
        }
    }

    fn roundtrip(latitude: f64, longitude: f64, datum: Datum) -> TestResult {
        let origin = GeoPoint::new(latitude, longitude);
        let actual = unproject(&project(&origin, datum), datum);

        TestResult::from_bool(
            (actual.latitude - origin.latitude).abs() < 1e-8
                && (actual.longitude - origin.longitude).abs() < 1e-8,
        )
    }

    quickcheck! {
        fn prop_roundtrip_osgb36(a: u16, b: u16) -> TestResult {
            // 50..58 N, 6 W..1 E
            let latitude = 50. + 8. * (a as f64) / (u16::MAX as f64);
            let longitude = -6. + 7. * (b as f64) / (u16::MAX as f64);
            roundtrip(latitude, longitude, Datum::Osgb36)
        }

        fn prop_roundtrip_wgs84(a: u16, b: u16) -> TestResult {
            let latitude = 50. + 8. * (a as f64) / (u16::MAX as f64);
            let longitude = -6. + 7. * (b as f64) / (u16::MAX as f64);
            roundtrip(latitude, longitude, Datum::Wgs84)
        }
    }
}
