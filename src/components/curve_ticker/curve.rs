//! Track curves: map a position along the ticker to a vertical offset and a
//! tangent rotation.
//!
//! Curves are defined over the normalized fraction `t ∈ [0, 1)` of the
//! container width. Slopes are closed-form per curve type; rotation is the
//! tangent angle in degrees, clamped to ±90° and zeroed when non-finite.

use std::f64::consts::TAU;

use serde::Deserialize;

use crate::components::numeric::finite_or;

/// Bisection steps used to invert a Bézier's x(u).
const BEZIER_ITERATIONS: usize = 32;

fn default_amplitude() -> f64 {
	40.0
}

fn default_frequency() -> f64 {
	1.0
}

fn default_height() -> f64 {
	80.0
}

fn default_c1() -> [f64; 2] {
	[0.25, -1.0]
}

fn default_c2() -> [f64; 2] {
	[0.75, 1.0]
}

/// Shape of the track. Deserialized from `{"type": "...", ...}`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CurveKind {
	/// Straight track.
	Flat,
	/// `amplitude · sin(2π · frequency · t)`.
	Sine {
		/// Peak offset, px.
		#[serde(default = "default_amplitude")]
		amplitude: f64,
		/// Full waves across the container.
		#[serde(default = "default_frequency")]
		frequency: f64,
	},
	/// Arch through both edges peaking at `height` in the middle.
	Quadratic {
		/// Peak offset, px.
		#[serde(default = "default_height")]
		height: f64,
	},
	/// S-curve from `-height` at the left edge to `+height` at the right.
	Cubic {
		/// Offset at either edge, px.
		#[serde(default = "default_height")]
		height: f64,
	},
	/// Cubic Bézier from `(0, 0)` to `(1, 0)` with control points in
	/// normalized units; y is scaled by `height`.
	Bezier {
		/// Vertical scale, px.
		#[serde(default = "default_height")]
		height: f64,
		/// First control point `[x, y]`.
		#[serde(default = "default_c1")]
		c1: [f64; 2],
		/// Second control point `[x, y]`.
		#[serde(default = "default_c2")]
		c2: [f64; 2],
	},
}

impl Default for CurveKind {
	fn default() -> Self {
		CurveKind::Sine {
			amplitude: default_amplitude(),
			frequency: default_frequency(),
		}
	}
}

/// Curve sample at one track position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurvePoint {
	/// Vertical offset in px (positive is down).
	pub y: f64,
	/// Tangent angle in degrees, within ±90°.
	pub rotation: f64,
}

/// Tangent rotation in degrees for slope `dy/dx`.
pub fn rotation_from_slope(slope: f64) -> f64 {
	if !slope.is_finite() {
		return 0.0;
	}
	slope.atan().to_degrees().clamp(-90.0, 90.0)
}

/// Cubic Bézier coordinate with endpoints `p0`, `p3`.
fn bezier(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
	let v = 1.0 - u;
	v * v * v * p0 + 3.0 * v * v * u * p1 + 3.0 * v * u * u * p2 + u * u * u * p3
}

fn bezier_derivative(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
	let v = 1.0 - u;
	3.0 * v * v * (p1 - p0) + 6.0 * v * u * (p2 - p1) + 3.0 * u * u * (p3 - p2)
}

/// Find `u` with `x(u) = t`. Control x values are clamped to [0, 1], which
/// keeps x(u) monotone.
fn bezier_param_for_x(c1x: f64, c2x: f64, t: f64) -> f64 {
	let (mut lo, mut hi) = (0.0, 1.0);
	for _ in 0..BEZIER_ITERATIONS {
		let mid = 0.5 * (lo + hi);
		if bezier(0.0, c1x, c2x, 1.0, mid) < t {
			lo = mid;
		} else {
			hi = mid;
		}
	}
	0.5 * (lo + hi)
}

impl CurveKind {
	/// Replace non-finite parameters with defaults and keep Bézier control
	/// x values inside the unit interval.
	pub(crate) fn validated(&self) -> Self {
		match *self {
			CurveKind::Flat => CurveKind::Flat,
			CurveKind::Sine {
				amplitude,
				frequency,
			} => CurveKind::Sine {
				amplitude: finite_or(amplitude, default_amplitude()),
				frequency: finite_or(frequency, default_frequency()).max(0.0),
			},
			CurveKind::Quadratic { height } => CurveKind::Quadratic {
				height: finite_or(height, default_height()),
			},
			CurveKind::Cubic { height } => CurveKind::Cubic {
				height: finite_or(height, default_height()),
			},
			CurveKind::Bezier { height, c1, c2 } => CurveKind::Bezier {
				height: finite_or(height, default_height()),
				c1: [finite_or(c1[0], 0.25).clamp(0.0, 1.0), finite_or(c1[1], -1.0)],
				c2: [finite_or(c2[0], 0.75).clamp(0.0, 1.0), finite_or(c2[1], 1.0)],
			},
		}
	}

	/// Vertical offset at fraction `t`.
	pub(crate) fn y_at(&self, t: f64) -> f64 {
		match *self {
			CurveKind::Flat => 0.0,
			CurveKind::Sine {
				amplitude,
				frequency,
			} => amplitude * (TAU * frequency * t).sin(),
			CurveKind::Quadratic { height } => {
				let s = 2.0 * t - 1.0;
				height * (1.0 - s * s)
			}
			CurveKind::Cubic { height } => {
				let s = 2.0 * t - 1.0;
				height * s * s * s
			}
			CurveKind::Bezier { height, c1, c2 } => {
				let u = bezier_param_for_x(c1[0], c2[0], t);
				height * bezier(0.0, c1[1], c2[1], 0.0, u)
			}
		}
	}

	/// `dy/dt` at fraction `t`.
	pub(crate) fn slope_at(&self, t: f64) -> f64 {
		match *self {
			CurveKind::Flat => 0.0,
			CurveKind::Sine {
				amplitude,
				frequency,
			} => amplitude * TAU * frequency * (TAU * frequency * t).cos(),
			CurveKind::Quadratic { height } => -4.0 * height * (2.0 * t - 1.0),
			CurveKind::Cubic { height } => {
				let s = 2.0 * t - 1.0;
				6.0 * height * s * s
			}
			CurveKind::Bezier { height, c1, c2 } => {
				let u = bezier_param_for_x(c1[0], c2[0], t);
				let dx = bezier_derivative(0.0, c1[0], c2[0], 1.0, u);
				let dy = bezier_derivative(0.0, c1[1], c2[1], 0.0, u);
				height * dy / dx
			}
		}
	}

	/// Sample the curve at track position `x` (px, any value) for a
	/// container `width` px wide.
	pub(crate) fn evaluate(&self, x: f64, width: f64) -> CurvePoint {
		let width = if width.is_finite() { width.max(1.0) } else { 1.0 };
		let t = finite_or(x, 0.0).rem_euclid(width) / width;
		CurvePoint {
			y: finite_or(self.y_at(t), 0.0),
			rotation: rotation_from_slope(self.slope_at(t) / width),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn all_curves() -> Vec<CurveKind> {
		vec![
			CurveKind::Flat,
			CurveKind::default(),
			CurveKind::Sine {
				amplitude: 5_000.0,
				frequency: 7.0,
			},
			CurveKind::Quadratic { height: -120.0 },
			CurveKind::Cubic { height: 1e9 },
			CurveKind::Bezier {
				height: 80.0,
				c1: [0.0, -3.0],
				c2: [1.0, 3.0],
			},
			CurveKind::Bezier {
				height: 80.0,
				c1: default_c1(),
				c2: default_c2(),
			},
		]
	}

	#[test]
	fn rotation_is_always_within_bounds() {
		for curve in all_curves() {
			for i in -200..400 {
				let x = i as f64 * 7.3;
				let point = curve.evaluate(x, 600.0);
				assert!(
					(-90.0..=90.0).contains(&point.rotation),
					"{curve:?} at {x}: {}",
					point.rotation
				);
				assert!(point.y.is_finite());
			}
		}
	}

	#[test]
	fn non_finite_slope_gives_zero_rotation() {
		assert_eq!(rotation_from_slope(f64::INFINITY), 0.0);
		assert_eq!(rotation_from_slope(f64::NAN), 0.0);
		assert!((rotation_from_slope(1.0) - 45.0).abs() < 1e-9);
	}

	#[test]
	fn positions_wrap_modulo_width() {
		let curve = CurveKind::Quadratic { height: 50.0 };
		let a = curve.evaluate(150.0, 400.0);
		let b = curve.evaluate(150.0 - 400.0, 400.0);
		let c = curve.evaluate(150.0 + 1200.0, 400.0);
		assert!((a.y - b.y).abs() < 1e-9 && (a.y - c.y).abs() < 1e-9);
	}

	#[test]
	fn quadratic_peaks_in_the_middle_and_is_level_there() {
		let curve = CurveKind::Quadratic { height: 50.0 };
		let mid = curve.evaluate(200.0, 400.0);
		assert!((mid.y - 50.0).abs() < 1e-9);
		assert!(mid.rotation.abs() < 1e-9);
		assert!(curve.evaluate(0.0, 400.0).y.abs() < 1e-9);
	}

	#[test]
	fn sine_slope_matches_finite_difference() {
		let curve = CurveKind::Sine {
			amplitude: 30.0,
			frequency: 2.0,
		};
		let (w, x, h) = (500.0, 123.0, 1e-4);
		let numeric = (curve.evaluate(x + h, w).y - curve.evaluate(x - h, w).y) / (2.0 * h);
		let expected = numeric.atan().to_degrees();
		assert!((curve.evaluate(x, w).rotation - expected).abs() < 1e-3);
	}

	#[test]
	fn bezier_passes_through_endpoints() {
		let curve = CurveKind::Bezier {
			height: 60.0,
			c1: [0.3, -1.0],
			c2: [0.7, -1.0],
		};
		assert!(curve.y_at(0.0).abs() < 1e-6);
		assert!(curve.y_at(0.999_999).abs() < 1e-3);
		assert!(curve.y_at(0.5) < -30.0);
	}

	#[test]
	fn deserializes_tagged_variants() {
		let curve: CurveKind = serde_json::from_str(r#"{ "type": "cubic" }"#).unwrap();
		assert_eq!(curve, CurveKind::Cubic { height: 80.0 });
		let curve: CurveKind =
			serde_json::from_str(r#"{ "type": "bezier", "height": 10, "c1": [2.0, 1.0] }"#).unwrap();
		match curve.validated() {
			CurveKind::Bezier { c1, .. } => assert_eq!(c1, [1.0, 1.0]),
			other => panic!("unexpected {other:?}"),
		}
	}
}
