//! Host-facing configuration for the particle field.

use serde::Deserialize;
use thiserror::Error;

use crate::components::numeric::clamp_or;
use crate::components::theme::Color;

/// Fallback color for the load-failure message.
const DEFAULT_ERROR_COLOR: Color = Color::rgb(153, 153, 153);

/// Property bag supplied by the host for one particle field instance.
///
/// Deserialized from camelCase JSON. Out-of-range values are clamped by
/// [`ParticleFieldConfig::validated`], never rejected.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleFieldConfig {
	/// Image URL or data URI.
	pub image: String,
	/// Edge length of one particle in CSS px.
	pub particle_size: f64,
	/// Pointer influence radius in CSS px.
	pub dispersion_radius: f64,
	/// Spring strength pulling particles home (per 60 Hz frame).
	pub return_speed: f64,
	/// Velocity retained per 60 Hz frame, in (0, 1).
	pub friction: f64,
	/// Radial push away from the pointer.
	pub repulsion_strength: f64,
	/// Tangential push around the pointer. Sign picks the direction.
	pub swirl: f64,
	/// Accessible description of the image.
	pub alt: String,
	/// Message shown when the image fails to load.
	pub error_text: String,
	/// CSS color of the failure message.
	pub error_color: String,
}

impl Default for ParticleFieldConfig {
	fn default() -> Self {
		Self {
			image: String::new(),
			particle_size: 2.0,
			dispersion_radius: 60.0,
			return_speed: 0.08,
			friction: 0.88,
			repulsion_strength: 4.0,
			swirl: 0.0,
			alt: String::new(),
			error_text: "Failed to load image".into(),
			error_color: DEFAULT_ERROR_COLOR.to_css(),
		}
	}
}

impl ParticleFieldConfig {
	/// Clamp every numeric field into its supported range.
	pub fn validated(&self) -> Self {
		let d = Self::default();
		Self {
			image: self.image.trim().to_string(),
			particle_size: clamp_or(self.particle_size, 1.0, 12.0, d.particle_size),
			dispersion_radius: clamp_or(self.dispersion_radius, 10.0, 300.0, d.dispersion_radius),
			return_speed: clamp_or(self.return_speed, 0.005, 1.0, d.return_speed),
			friction: clamp_or(self.friction, 0.01, 0.99, d.friction),
			repulsion_strength: clamp_or(self.repulsion_strength, 0.0, 50.0, d.repulsion_strength),
			swirl: clamp_or(self.swirl, -5.0, 5.0, d.swirl),
			alt: self.alt.clone(),
			error_text: self.error_text.clone(),
			error_color: Color::parse_or(&self.error_color, DEFAULT_ERROR_COLOR).to_css(),
		}
	}

	/// Whether a change from `other` requires resampling the image.
	pub fn needs_rebuild(&self, other: &Self) -> bool {
		self.image != other.image
			|| self.particle_size != other.particle_size
			|| self.dispersion_radius != other.dispersion_radius
	}
}

/// Reasons a particle field cannot be built. Shown inline, never propagated
/// to the host.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
	/// The `image` property is empty.
	#[error("no image source configured")]
	MissingSource,
	/// The browser could not load the image at this URL.
	#[error("image failed to load: {0}")]
	ImageLoad(String),
	/// The image loaded with a zero width or height.
	#[error("image has zero natural dimensions")]
	EmptyImage,
	/// No 2D context or offscreen canvas could be created.
	#[error("canvas unavailable: {0}")]
	Canvas(String),
	/// Reading pixels back failed, typically a tainted cross-origin canvas.
	#[error("pixel readback failed: {0}")]
	Readback(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_camel_case_with_defaults() {
		let config: ParticleFieldConfig =
			serde_json::from_str(r#"{ "image": "logo.png", "dispersionRadius": 90, "swirl": 1.5 }"#)
				.unwrap();
		assert_eq!(config.image, "logo.png");
		assert_eq!(config.dispersion_radius, 90.0);
		assert_eq!(config.swirl, 1.5);
		assert_eq!(config.friction, 0.88);
	}

	#[test]
	fn validation_clamps_ranges() {
		let config = ParticleFieldConfig {
			friction: 1.5,
			particle_size: 0.0,
			return_speed: f64::NAN,
			error_color: "nonsense".into(),
			..Default::default()
		}
		.validated();
		assert_eq!(config.friction, 0.99);
		assert_eq!(config.particle_size, 1.0);
		assert_eq!(config.return_speed, 0.08);
		assert_eq!(config.error_color, "#999999");
	}

	#[test]
	fn physics_only_changes_skip_rebuild() {
		let base = ParticleFieldConfig::default();
		let tuned = ParticleFieldConfig {
			friction: 0.5,
			..base.clone()
		};
		assert!(!tuned.needs_rebuild(&base));
		let denser = ParticleFieldConfig {
			particle_size: 4.0,
			..base.clone()
		};
		assert!(denser.needs_rebuild(&base));
	}
}
