//! vaporize-text: canvas particle text vaporization for portfolio hero sections.
//!
//! This crate provides a WASM component that rasterizes a string, samples it
//! into particles and sweeps a vaporize wave across it when it scrolls into
//! view.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::vaporize_text::{
	Alignment, AnimationTiming, Direction, FontSpec, Tag, VaporizeConfig, VaporizeEngine,
	VaporizeText,
};

/// Id of the `<script type="application/json">` element holding the config.
pub const CONFIG_ELEMENT_ID: &str = "vaporize-config";

/// Why the page-provided configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("no #vaporize-config element in the document")]
	Missing,
	#[error("invalid vaporize config: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("vaporize-text: logging initialized");
}

/// Hero section configuration used when the page provides none.
pub fn hero_config() -> VaporizeConfig {
	VaporizeConfig {
		texts: vec!["Moaaz Mustafa".into()],
		font: FontSpec {
			family: "Inter, sans-serif".into(),
			size: 120.0,
			weight: 600,
		},
		color: "#800000".into(),
		spread: 5.0,
		density: 7.0,
		animation: AnimationTiming {
			vaporize_duration: 2.0,
			fade_in_duration: 1.0,
			wait_duration: 0.5,
		},
		direction: Direction::LeftToRight,
		alignment: Alignment::Center,
		tag: Tag::H1,
	}
}

/// Parse a JSON configuration and replace unusable values with defaults.
pub fn parse_config(json: &str) -> Result<VaporizeConfig, ConfigError> {
	Ok(serde_json::from_str::<VaporizeConfig>(json)?.sanitized())
}

fn config_script_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load the configuration from the page's config script element.
pub fn load_config() -> Result<VaporizeConfig, ConfigError> {
	let json = config_script_text().ok_or(ConfigError::Missing)?;
	let config = parse_config(&json)?;
	info!("vaporize-text: loaded config for {} text(s)", config.texts.len());
	Ok(config)
}

/// Main application component.
/// Loads the hero configuration from the DOM and renders the effect.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = load_config().unwrap_or_else(|e| {
		match e {
			ConfigError::Missing => info!("vaporize-text: {}, using built-in hero", e),
			ConfigError::Parse(_) => warn!("vaporize-text: {}, using built-in hero", e),
		}
		hero_config()
	});
	let config_signal = Signal::derive(move || config.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Moaaz Mustafa" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<section class="hero">
			<div class="hero-title">
				<VaporizeText config=config_signal />
			</div>
		</section>
	}
}
