//! Color handling shared by the widgets.
//!
//! Host property bags hand colors over as CSS strings. They are parsed once
//! at configuration time and unparseable values fall back to a documented
//! default instead of failing.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}

	/// Parses a CSS color string.
	///
	/// Supports hex (`#RGB`, `#RRGGBB`, `#RRGGBBAA`), `rgb()`/`rgba()`
	/// functional notation and a handful of keywords. Returns `None` for
	/// anything else.
	pub fn parse(color_str: &str) -> Option<Self> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			return Self::parse_hex(hex);
		}
		if s.starts_with("rgb") {
			let inner = s
				.trim_start_matches("rgba")
				.trim_start_matches("rgb")
				.trim()
				.strip_prefix('(')?
				.strip_suffix(')')?;
			let nums: Vec<&str> = inner.split(',').map(str::trim).collect();
			if nums.len() < 3 || nums.len() > 4 {
				return None;
			}
			let channel = |v: &str| v.parse::<f64>().ok().map(|c| c.clamp(0.0, 255.0) as u8);
			let a = match nums.get(3) {
				Some(v) => v.parse::<f64>().ok()?.clamp(0.0, 1.0),
				None => 1.0,
			};
			return Some(Self::rgba(
				channel(nums[0])?,
				channel(nums[1])?,
				channel(nums[2])?,
				a,
			));
		}
		match s.to_ascii_lowercase().as_str() {
			"black" => Some(Self::rgb(0, 0, 0)),
			"white" => Some(Self::rgb(255, 255, 255)),
			"transparent" => Some(Self::rgba(0, 0, 0, 0.0)),
			_ => None,
		}
	}

	/// Parses `color_str`, falling back to `fallback` when it is not a color.
	pub fn parse_or(color_str: &str, fallback: Color) -> Self {
		Self::parse(color_str).unwrap_or(fallback)
	}

	fn parse_hex(hex: &str) -> Option<Self> {
		if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
			return None;
		}
		let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
		let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
		match hex.len() {
			3 => Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
			6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
			8 => Some(Self::rgba(
				byte(0)?,
				byte(2)?,
				byte(4)?,
				byte(6)? as f64 / 255.0,
			)),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Color;

	#[test]
	fn parses_hex_forms() {
		assert_eq!(Color::parse("#ff8000"), Some(Color::rgb(255, 128, 0)));
		assert_eq!(Color::parse("#fff"), Some(Color::rgb(255, 255, 255)));
		let c = Color::parse("#00000080").unwrap();
		assert_eq!((c.r, c.g, c.b), (0, 0, 0));
		assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
	}

	#[test]
	fn parses_functional_notation() {
		assert_eq!(
			Color::parse("rgb(10, 20, 30)"),
			Some(Color::rgb(10, 20, 30))
		);
		assert_eq!(
			Color::parse("rgba(10,20,30,0.5)"),
			Some(Color::rgba(10, 20, 30, 0.5))
		);
	}

	#[test]
	fn unparseable_falls_back() {
		let fallback = Color::rgb(1, 2, 3);
		assert_eq!(Color::parse_or("not a color", fallback), fallback);
		assert_eq!(Color::parse_or("#12", fallback), fallback);
		assert_eq!(Color::parse_or("rgb(1,2)", fallback), fallback);
		assert_eq!(Color::parse_or("#zzzzzz", fallback), fallback);
	}

	#[test]
	fn css_output_drops_opaque_alpha() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(
			Color::rgba(1, 2, 3, 0.25).to_css(),
			"rgba(1, 2, 3, 0.25)"
		);
	}
}
