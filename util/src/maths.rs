//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Linearly interpolate between `a` and `b` by the fraction `t`.
///
/// `t` is not limited, values outside `[0, 1]` extrapolate.
pub fn lerp<T>(a: T, b: T, t: T) -> T
where
    T: Float
{
    a + (b - a) * t
}

/// Clamp a value into the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: PartialOrd
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Position of `value` within `[min, max]` as a fraction limited to `[0, 1]`.
///
/// Returns `None` if the range is empty (`min == max`). A NaN value maps to
/// `0`, since it would otherwise pass through the clamp unchanged.
pub fn norm_in_range<T>(value: T, min: T, max: T) -> Option<T>
where
    T: Float
{
    if max == min {
        return None;
    }
    if value.is_nan() {
        return Some(T::zero());
    }

    Some(clamp((value - min) / (max - min), T::zero(), T::one()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 180f64), (500f64, 2500f64), 90f64), 1500f64);
        assert_eq!(lin_map((0f64, 10f64), (10f64, 0f64), 2.5f64), 7.5f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(200, 0, 180), 180);
        assert_eq!(clamp(-4, 15, 165), 15);
        assert_eq!(clamp(42, 6, 73), 42);
        assert_eq!(clamp(1.5f64, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_norm_in_range() {
        assert_eq!(norm_in_range(645f64, 0f64, 1290f64), Some(0.5));
        assert_eq!(norm_in_range(-10f64, 0f64, 1290f64), Some(0.0));
        assert_eq!(norm_in_range(5000f64, 0f64, 1290f64), Some(1.0));
        assert_eq!(norm_in_range(3f64, 2f64, 2f64), None);

        assert_eq!(norm_in_range(f64::NAN, 0f64, 1290f64), Some(0.0));
        assert_eq!(norm_in_range(f64::INFINITY, 0f64, 1290f64), Some(1.0));
        assert_eq!(norm_in_range(f64::NEG_INFINITY, 0f64, 1290f64), Some(0.0));
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(60f64, 110f64, 0.5), 85f64);
        assert_eq!(lerp(10f64, 50f64, 0.0), 10f64);
        assert_eq!(lerp(10f64, 50f64, 1.0), 50f64);
    }
}
