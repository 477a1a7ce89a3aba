//! Configuration surface for the vaporize text component.
//!
//! Every field has a default so a partial JSON object (or none at all) yields a
//! usable configuration. Out-of-range values are not rejected; call
//! [`VaporizeConfig::sanitized`] to substitute safe defaults.

use log::warn;
use serde::{Deserialize, Deserializer};

/// Sweep direction of the vaporize wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
	#[default]
	LeftToRight,
	RightToLeft,
}

/// Horizontal text alignment inside the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
	Left,
	#[default]
	Center,
	Right,
	/// Anything unrecognized lands here and is treated as `Center`.
	#[serde(other)]
	Unknown,
}

impl Alignment {
	/// Alignment with unrecognized values mapped to the default.
	pub fn resolved(self) -> Self {
		match self {
			Alignment::Unknown => Alignment::Center,
			other => other,
		}
	}

	/// Value for the canvas `textAlign` property.
	pub fn as_css(self) -> &'static str {
		match self.resolved() {
			Alignment::Left => "left",
			Alignment::Right => "right",
			_ => "center",
		}
	}
}

/// Tag used for the hidden, crawler-visible copy of the texts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
	H1,
	H2,
	H3,
	#[default]
	P,
	#[serde(other)]
	Unknown,
}

/// Font used to rasterize the text.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSpec {
	#[serde(alias = "fontFamily")]
	pub family: String,
	/// Size in CSS pixels. Accepts `120` or `"120px"`.
	#[serde(alias = "fontSize", deserialize_with = "deserialize_px")]
	pub size: f64,
	#[serde(alias = "fontWeight")]
	pub weight: u16,
}

impl Default for FontSpec {
	fn default() -> Self {
		Self {
			family: "sans-serif".into(),
			size: 120.0,
			weight: 400,
		}
	}
}

impl FontSpec {
	/// CSS font shorthand with the size scaled to backing-store pixels.
	pub fn css(&self, dpr: f64) -> String {
		format!("{} {}px {}", self.weight, self.size * dpr, self.family)
	}
}

/// Phase durations in seconds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationTiming {
	pub vaporize_duration: f64,
	pub fade_in_duration: f64,
	pub wait_duration: f64,
}

impl Default for AnimationTiming {
	fn default() -> Self {
		Self {
			vaporize_duration: 2.0,
			fade_in_duration: 1.0,
			wait_duration: 0.5,
		}
	}
}

impl AnimationTiming {
	pub fn vaporize_ms(&self) -> f64 {
		self.vaporize_duration * 1000.0
	}
}

/// Construction parameters of the component.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VaporizeConfig {
	/// Strings shown in order. The last one stays vaporized.
	pub texts: Vec<String>,
	pub font: FontSpec,
	/// Hex, `rgb()`/`rgba()` or a theme token such as `primary`.
	pub color: String,
	/// Multiplier on the font-size derived spread constant.
	pub spread: f64,
	/// 0 (sparse) to 10 (dense).
	pub density: f64,
	pub animation: AnimationTiming,
	pub direction: Direction,
	pub alignment: Alignment,
	pub tag: Tag,
}

impl Default for VaporizeConfig {
	fn default() -> Self {
		Self {
			texts: vec!["Next.js".into(), "React".into()],
			font: FontSpec::default(),
			color: "primary".into(),
			spread: 5.0,
			density: 7.0,
			animation: AnimationTiming::default(),
			direction: Direction::default(),
			alignment: Alignment::default(),
			tag: Tag::default(),
		}
	}
}

impl VaporizeConfig {
	/// Replace values that would break the animation with their defaults.
	pub fn sanitized(mut self) -> Self {
		let defaults = Self::default();

		if !positive(self.font.size) {
			warn!("vaporize: invalid font size {}, using default", self.font.size);
			self.font.size = defaults.font.size;
		}
		if self.font.family.trim().is_empty() {
			self.font.family = defaults.font.family;
		}
		if !self.spread.is_finite() || self.spread < 0.0 {
			warn!("vaporize: invalid spread {}, using default", self.spread);
			self.spread = defaults.spread;
		}
		if !self.density.is_finite() {
			warn!("vaporize: invalid density, using default");
			self.density = defaults.density;
		}
		self.density = self.density.clamp(0.0, 10.0);

		let timing = &mut self.animation;
		for (value, fallback, name) in [
			(
				&mut timing.vaporize_duration,
				defaults.animation.vaporize_duration,
				"vaporizeDuration",
			),
			(
				&mut timing.fade_in_duration,
				defaults.animation.fade_in_duration,
				"fadeInDuration",
			),
			(
				&mut timing.wait_duration,
				defaults.animation.wait_duration,
				"waitDuration",
			),
		] {
			if !value.is_finite() || *value < 0.0 {
				warn!("vaporize: invalid {} {}, using default", name, value);
				*value = fallback;
			}
		}
		// A zero-length sweep would divide by zero when advancing progress.
		if timing.vaporize_duration == 0.0 {
			timing.vaporize_duration = defaults.animation.vaporize_duration;
		}

		self.alignment = self.alignment.resolved();
		if self.tag == Tag::Unknown {
			self.tag = Tag::P;
		}
		self
	}

	/// The texts joined for the hidden SEO element.
	pub fn joined_texts(&self) -> String {
		self.texts.join(" ")
	}
}

fn positive(v: f64) -> bool {
	v.is_finite() && v > 0.0
}

fn deserialize_px<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Px {
		Number(f64),
		Text(String),
	}

	match Px::deserialize(deserializer)? {
		Px::Number(n) => Ok(n),
		Px::Text(s) => s
			.trim()
			.trim_end_matches("px")
			.trim()
			.parse::<f64>()
			.map_err(serde::de::Error::custom),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn parses_original_hero_config() {
		let json = r##"{
			"texts": ["Moaaz Mustafa"],
			"font": { "fontFamily": "Inter, sans-serif", "fontSize": "120px", "fontWeight": 600 },
			"color": "#800000",
			"spread": 5,
			"density": 7,
			"animation": { "vaporizeDuration": 2, "fadeInDuration": 1, "waitDuration": 0.5 },
			"direction": "left-to-right",
			"alignment": "center",
			"tag": "h1"
		}"##;
		let config: VaporizeConfig = serde_json::from_str(json).unwrap();

		assert_eq!(config.texts, vec!["Moaaz Mustafa".to_string()]);
		assert_eq!(
			config.font,
			FontSpec {
				family: "Inter, sans-serif".into(),
				size: 120.0,
				weight: 600,
			}
		);
		assert_eq!(config.tag, Tag::H1);
		assert_eq!(config.direction, Direction::LeftToRight);
	}

	#[test]
	fn missing_fields_use_defaults() {
		let config: VaporizeConfig = serde_json::from_str(r#"{ "texts": ["hi"] }"#).unwrap();
		assert_eq!(config.font, FontSpec::default());
		assert_eq!(config.animation, AnimationTiming::default());
		assert_eq!(config.color, "primary");
	}

	#[test]
	fn unknown_tag_and_alignment_fall_back() {
		let config: VaporizeConfig =
			serde_json::from_str(r#"{ "tag": "marquee", "alignment": "justify" }"#).unwrap();
		let config = config.sanitized();
		assert_eq!(config.tag, Tag::P);
		assert_eq!(config.alignment, Alignment::Center);

		let config: VaporizeConfig = serde_json::from_str(r#"{ "tag": "h2" }"#).unwrap();
		assert_eq!(config.sanitized().tag, Tag::H2);
	}

	#[test]
	fn sanitize_replaces_broken_values() {
		let mut config = VaporizeConfig::default();
		config.font.size = -3.0;
		config.density = 42.0;
		config.spread = f64::NAN;
		config.animation.vaporize_duration = 0.0;
		config.animation.wait_duration = -1.0;

		let config = config.sanitized();
		assert_eq!(config.font.size, 120.0);
		assert_eq!(config.density, 10.0);
		assert_eq!(config.spread, 5.0);
		assert_eq!(config.animation.vaporize_duration, 2.0);
		assert_eq!(config.animation.wait_duration, 0.5);
	}

	#[test]
	fn font_css_scales_with_dpr() {
		let font = FontSpec {
			family: "Inter".into(),
			size: 50.0,
			weight: 600,
		};
		assert_eq!(font.css(2.0), "600 100px Inter");
	}
}
