/// Degrees per radian, as the OSGB reference formulae spell it.
pub(crate) const DEG: f64 = 57.29577951308232087679815481410517;

macro_rules! mul_add {
    ($a:expr, $b:expr, $c:expr) => {
        if cfg!(feature = "fma") {
            f64::mul_add($a, $b, $c)
        } else {
            $a * $b + $c
        }
    };
}

pub(crate) use mul_add;

/// Rounds `value` to `digits` decimal places, half away from zero.
///
/// Returns `value` as is when the scaling overflows.
#[inline]
pub(crate) fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    let scaled = value * scale;

    if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    }
}
