//! Host-facing configuration for the curve ticker.

use serde::Deserialize;

use super::curve::CurveKind;
use crate::components::numeric::clamp_or;
use crate::components::theme::Color;

/// Fallback item color.
const DEFAULT_ITEM_COLOR: Color = Color::rgb(17, 17, 17);

/// Scroll direction of the autonomous motion.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// Items travel right to left.
	#[default]
	Left,
	/// Items travel left to right.
	Right,
}

impl Direction {
	/// Sign applied to offset advancement. Leftward motion grows the offset.
	pub fn sign(self) -> f64 {
		match self {
			Direction::Left => 1.0,
			Direction::Right => -1.0,
		}
	}
}

/// One logical item on the track. Either plain text or SVG markup; markup
/// is sanitized before it is inserted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TickerItem {
	/// Plain text label, used when `svg` is absent.
	pub text: String,
	/// Inline SVG markup.
	pub svg: Option<String>,
}

impl From<&str> for TickerItem {
	fn from(text: &str) -> Self {
		Self {
			text: text.to_string(),
			svg: None,
		}
	}
}

/// Property bag supplied by the host for one ticker instance.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TickerConfig {
	/// Logical items, repeated as often as the width requires.
	pub items: Vec<TickerItem>,
	/// Distance between consecutive item centers, px.
	pub gap: f64,
	/// Autonomous speed, px/s.
	pub speed: f64,
	/// Direction of the autonomous motion.
	pub direction: Direction,
	/// Track shape.
	pub curve: CurveKind,
	/// Rotate items to follow the curve tangent.
	pub rotate_items: bool,
	/// Uniform item scale.
	pub item_scale: f64,
	/// Ease to a stop while the pointer is over the ticker.
	pub pause_on_hover: bool,
	/// Let the pointer drag and fling the track.
	pub draggable: bool,
	/// A drag flips `direction` to follow the gesture.
	pub drag_changes_direction: bool,
	/// Settle on a multiple of `gap` after a drag or wheel.
	pub snap_to_item: bool,
	/// Momentum velocity retained per 60 Hz frame, in (0, 1).
	pub momentum_damping: f64,
	/// Scrub the track with the mouse wheel.
	pub wheel_control: bool,
	/// Width of the edge fade, px. Zero disables it.
	pub fade_distance: f64,
	/// Play the reveal sweep when the ticker first enters the viewport.
	pub appear: bool,
	/// Reveal sweep length, seconds.
	pub appear_duration: f64,
	/// Speed multiplier on narrow layouts.
	pub mobile_speed_factor: f64,
	/// CSS color of the items.
	pub item_color: String,
	/// Accessible name of the ticker.
	pub label: String,
}

impl Default for TickerConfig {
	fn default() -> Self {
		Self {
			items: Vec::new(),
			gap: 160.0,
			speed: 60.0,
			direction: Direction::Left,
			curve: CurveKind::default(),
			rotate_items: true,
			item_scale: 1.0,
			pause_on_hover: false,
			draggable: true,
			drag_changes_direction: false,
			snap_to_item: false,
			momentum_damping: 0.95,
			wheel_control: false,
			fade_distance: 80.0,
			appear: false,
			appear_duration: 1.2,
			mobile_speed_factor: 0.6,
			item_color: DEFAULT_ITEM_COLOR.to_css(),
			label: "Ticker".into(),
		}
	}
}

impl TickerConfig {
	/// Clamp every numeric field into its supported range and resolve colors.
	pub fn validated(&self) -> Self {
		let d = Self::default();
		Self {
			items: self.items.clone(),
			gap: clamp_or(self.gap, 1.0, 10_000.0, d.gap),
			speed: clamp_or(self.speed, 0.0, 2_000.0, d.speed),
			direction: self.direction,
			curve: self.curve.validated(),
			rotate_items: self.rotate_items,
			item_scale: clamp_or(self.item_scale, 0.1, 10.0, d.item_scale),
			pause_on_hover: self.pause_on_hover,
			draggable: self.draggable,
			drag_changes_direction: self.drag_changes_direction,
			snap_to_item: self.snap_to_item,
			momentum_damping: clamp_or(self.momentum_damping, 0.01, 0.99, d.momentum_damping),
			wheel_control: self.wheel_control,
			fade_distance: clamp_or(self.fade_distance, 0.0, 2_000.0, d.fade_distance),
			appear: self.appear,
			appear_duration: clamp_or(self.appear_duration, 0.05, 30.0, d.appear_duration),
			mobile_speed_factor: clamp_or(self.mobile_speed_factor, 0.0, 1.0, d.mobile_speed_factor),
			item_color: Color::parse_or(&self.item_color, DEFAULT_ITEM_COLOR).to_css(),
			label: self.label.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_host_property_bag() {
		let config: TickerConfig = serde_json::from_str(
			r#"{
				"items": [{ "text": "Rust" }, { "svg": "<svg></svg>" }],
				"gap": 200,
				"direction": "right",
				"curve": { "type": "quadratic", "height": 40 },
				"snapToItem": true
			}"#,
		)
		.unwrap();
		assert_eq!(config.items.len(), 2);
		assert_eq!(config.items[0].text, "Rust");
		assert!(config.items[1].svg.is_some());
		assert_eq!(config.direction, Direction::Right);
		assert_eq!(config.curve, CurveKind::Quadratic { height: 40.0 });
		assert!(config.snap_to_item);
		assert_eq!(config.speed, 60.0);
	}

	#[test]
	fn validation_floors_gap_and_clamps_damping() {
		let config = TickerConfig {
			gap: 0.0,
			momentum_damping: 1.0,
			speed: f64::INFINITY,
			item_color: "???".into(),
			..Default::default()
		}
		.validated();
		assert_eq!(config.gap, 1.0);
		assert_eq!(config.momentum_damping, 0.99);
		assert_eq!(config.speed, 60.0);
		assert_eq!(config.item_color, "#111111");
	}
}
