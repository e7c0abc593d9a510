//! fx-widgets: visual effect widgets for the browser.
//!
//! This crate provides WASM-based Leptos components: an image that disperses
//! into particles around the pointer, and a marquee ticker that scrolls items
//! along a curved track with drag, momentum and snapping.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::curve_ticker::{CurveKind, CurveTicker, Direction, TickerConfig, TickerItem};
pub use components::particle_field::{FieldError, ParticleFieldCanvas, ParticleFieldConfig};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("fx-widgets: logging initialized");
}

/// Property bags for the demo page, one per widget.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
	/// Properties of the particle image.
	pub particles: ParticleFieldConfig,
	/// Properties of the ticker.
	pub ticker: TickerConfig,
}

/// Parse the demo configuration document.
pub fn parse_config(json_text: &str) -> Result<AppConfig, serde_json::Error> {
	serde_json::from_str(json_text)
}

/// Load widget configuration from a script element with id="fx-config".
/// Expected format: JSON with { particles: {...}, ticker: {...} }
fn load_config() -> Option<AppConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("fx-config")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match parse_config(&json_text) {
		Ok(config) => {
			info!(
				"fx-widgets: loaded config (image {:?}, {} ticker items)",
				config.particles.image,
				config.ticker.items.len()
			);
			Some(config)
		}
		Err(e) => {
			warn!("fx-widgets: failed to parse config: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads widget configuration from the DOM and renders both widgets.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_default();
	let particles = config.particles;
	let ticker = config.ticker;
	let particles_signal = Signal::derive(move || particles.clone());
	let ticker_signal = Signal::derive(move || ticker.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="fx-widgets" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<main class="fx-demo">
			<section class="fx-demo-particles">
				<ParticleFieldCanvas config=particles_signal />
			</section>
			<section class="fx-demo-ticker">
				<CurveTicker config=ticker_signal />
			</section>
		</main>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_both_widget_configs() {
		let config = parse_config(
			r#"{
				"particles": { "image": "/logo.png", "particleSize": 3 },
				"ticker": { "items": [{ "text": "A" }, { "text": "B" }], "curve": { "type": "flat" } }
			}"#,
		)
		.unwrap();
		assert_eq!(config.particles.image, "/logo.png");
		assert_eq!(config.particles.particle_size, 3.0);
		assert_eq!(config.ticker.items.len(), 2);
		assert_eq!(config.ticker.curve, CurveKind::Flat);
	}

	#[test]
	fn missing_sections_fall_back_to_defaults() {
		let config = parse_config("{}").unwrap();
		assert_eq!(config, AppConfig::default());
		assert!(parse_config("{ not json").is_err());
	}
}
