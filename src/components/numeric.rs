//! Float guards shared by config validation and curve math.

/// `value` clamped to `[min, max]`, or `fallback` when it isn't finite.
pub fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
	if value.is_finite() {
		value.clamp(min, max)
	} else {
		fallback
	}
}

pub fn finite_or(value: f64, fallback: f64) -> f64 {
	if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamps_finite_and_replaces_the_rest() {
		assert_eq!(clamp_or(5.0, 0.0, 1.0, 0.5), 1.0);
		assert_eq!(clamp_or(-5.0, 0.0, 1.0, 0.5), 0.0);
		assert_eq!(clamp_or(0.25, 0.0, 1.0, 0.5), 0.25);
		assert_eq!(clamp_or(f64::NAN, 0.0, 1.0, 0.5), 0.5);
		assert_eq!(clamp_or(f64::INFINITY, 0.0, 1.0, 0.5), 0.5);
		assert_eq!(finite_or(f64::NEG_INFINITY, 2.0), 2.0);
		assert_eq!(finite_or(-3.0, 2.0), -3.0);
	}
}
