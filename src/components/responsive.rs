//! Breakpoint-dependent scaling for widget motion parameters.
//!
//! Narrow layouts (phones, small embeds) get slower motion and shorter edge
//! fades so that items stay readable. All breakpoint logic lives here so the
//! widgets only ever see pre-computed factors.
//!
//! # Scaling Behaviors
//!
//! - [`ScaleBehavior::Constant`]: Same value at every width.
//! - [`ScaleBehavior::Mobile`]: Multiplied by `factor` below the mobile breakpoint.
//! - [`ScaleBehavior::Linear`]: Ramps from `min_factor` at zero width up to 1.0 at
//!   the breakpoint.

/// Defines how a value scales with container width.
#[derive(Clone, Debug, PartialEq)]
#[allow(
	dead_code,
	reason = "Constant/Linear variants complete the API for callers tuning ResponsiveConfig"
)]
pub enum ScaleBehavior {
	/// Unaffected by width.
	Constant,
	/// Multiplied by `factor` when the container is narrower than the breakpoint.
	Mobile { factor: f64 },
	/// Linear ramp from `min_factor` (zero width) to 1.0 (breakpoint and wider).
	Linear { min_factor: f64 },
}

impl ScaleBehavior {
	/// Compute the multiplier for a container of `width` px.
	pub fn factor(&self, width: f64, breakpoint: f64) -> f64 {
		match self {
			ScaleBehavior::Constant => 1.0,
			ScaleBehavior::Mobile { factor } => {
				if width < breakpoint {
					*factor
				} else {
					1.0
				}
			}
			ScaleBehavior::Linear { min_factor } => {
				if breakpoint <= 0.0 {
					return 1.0;
				}
				let t = (width / breakpoint).clamp(0.0, 1.0);
				min_factor + (1.0 - min_factor) * t
			}
		}
	}
}

/// Breakpoint configuration for a widget.
#[derive(Clone, Debug)]
pub struct ResponsiveConfig {
	/// Containers narrower than this (CSS px) count as mobile.
	pub mobile_breakpoint: f64,
	/// How playback speed scales.
	pub speed: ScaleBehavior,
	/// How edge-fade distance scales.
	pub fade: ScaleBehavior,
}

impl Default for ResponsiveConfig {
	fn default() -> Self {
		Self {
			mobile_breakpoint: 768.0,
			speed: ScaleBehavior::Mobile { factor: 0.6 },
			fade: ScaleBehavior::Mobile { factor: 0.5 },
		}
	}
}

impl ResponsiveConfig {
	/// Default breakpoints with a custom mobile speed factor.
	pub fn with_mobile_speed(factor: f64) -> Self {
		Self {
			speed: ScaleBehavior::Mobile {
				factor: factor.clamp(0.0, 1.0),
			},
			..Self::default()
		}
	}
}

/// Pre-computed factors for a specific container width.
///
/// Recompute whenever the container is resized.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponsiveValues {
	pub speed_factor: f64,
	pub fade_factor: f64,
}

impl ResponsiveValues {
	pub fn new(config: &ResponsiveConfig, width: f64) -> Self {
		Self {
			speed_factor: config.speed.factor(width, config.mobile_breakpoint),
			fade_factor: config.fade.factor(width, config.mobile_breakpoint),
		}
	}
}

impl Default for ResponsiveValues {
	fn default() -> Self {
		Self {
			speed_factor: 1.0,
			fade_factor: 1.0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mobile_layout_slows_down() {
		let config = ResponsiveConfig::with_mobile_speed(0.5);
		let narrow = ResponsiveValues::new(&config, 400.0);
		assert_eq!(narrow.speed_factor, 0.5);
		assert_eq!(narrow.fade_factor, 0.5);

		let wide = ResponsiveValues::new(&config, 1200.0);
		assert_eq!(wide.speed_factor, 1.0);
		assert_eq!(wide.fade_factor, 1.0);
	}

	#[test]
	fn linear_ramp_reaches_one_at_breakpoint() {
		let behavior = ScaleBehavior::Linear { min_factor: 0.2 };
		assert!((behavior.factor(0.0, 800.0) - 0.2).abs() < 1e-9);
		assert!((behavior.factor(400.0, 800.0) - 0.6).abs() < 1e-9);
		assert_eq!(behavior.factor(2000.0, 800.0), 1.0);
		assert_eq!(ScaleBehavior::Constant.factor(10.0, 800.0), 1.0);
	}
}
