//! Color parsing and theme-token resolution.
//!
//! The text color may be given as a hex string, an `rgb()`/`rgba()` function or
//! a symbolic theme token (`primary`, `accent`, ...). Tokens are looked up
//! through the [`HostEnvironment`] at rasterization time. Anything that cannot
//! be resolved falls back to [`FALLBACK_COLOR`].

use log::warn;
use thiserror::Error;

use super::host::HostEnvironment;

/// Opaque maroon used whenever a color cannot be resolved.
pub const FALLBACK_COLOR: Color = Color::rgb(128, 0, 0);

/// Reasons a color string could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
	#[error("empty color string")]
	Empty,
	#[error("invalid hex color `{0}`")]
	InvalidHex(String),
	#[error("invalid color function `{0}`")]
	InvalidFunction(String),
	#[error("theme token `{0}` is not defined")]
	UnknownToken(String),
}

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

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Always `rgba(r, g, b, a)`, so the trailing alpha can be swapped per particle.
	pub fn to_css(self) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}

	/// Parse a literal color. Theme tokens are not handled here.
	pub fn parse(input: &str) -> Result<Self, ColorError> {
		let input = input.trim();
		if input.is_empty() {
			return Err(ColorError::Empty);
		}
		if let Some(hex) = input.strip_prefix('#') {
			return parse_hex(hex).ok_or_else(|| ColorError::InvalidHex(input.to_string()));
		}
		let lower = input.to_ascii_lowercase();
		if let Some(args) = function_args(&lower, "rgba").or_else(|| function_args(&lower, "rgb")) {
			return parse_rgb_args(args)
				.ok_or_else(|| ColorError::InvalidFunction(input.to_string()));
		}
		Err(ColorError::UnknownToken(input.to_string()))
	}
}

/// Resolve a configured color to a concrete opaque base color.
///
/// The base alpha is forced to 1; per-particle opacity is applied when drawing.
pub fn resolve_color(spec: &str, host: &dyn HostEnvironment) -> Color {
	let spec = spec.trim();
	let resolved = if is_theme_token(spec) {
		host.theme_color(spec)
			.ok_or_else(|| ColorError::UnknownToken(spec.to_string()))
			.and_then(|value| {
				// A token that resolves to another token would loop.
				if is_theme_token(&value) {
					Err(ColorError::UnknownToken(value))
				} else {
					Color::parse(&value)
				}
			})
	} else {
		Color::parse(spec)
	};

	match resolved {
		Ok(color) => color.with_alpha(1.0),
		Err(e) => {
			warn!("vaporize: {}, falling back to {}", e, FALLBACK_COLOR.to_css());
			FALLBACK_COLOR
		}
	}
}

/// CSS custom property a theme token maps to.
pub fn token_variable(token: &str) -> String {
	match token.trim() {
		"" | "primary" | "currentColor" => "--color-primary".to_string(),
		other => format!("--color-{}", other),
	}
}

fn is_theme_token(spec: &str) -> bool {
	spec.is_empty()
		|| (!spec.starts_with('#')
			&& !spec.contains('(')
			&& spec.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

fn parse_hex(hex: &str) -> Option<Color> {
	if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return None;
	}
	let channel = |s: &str| u8::from_str_radix(s, 16).ok();
	match hex.len() {
		3 | 4 => {
			let mut chars = hex.chars().map(|c| {
				let d = c.to_digit(16).unwrap_or(0) as u8;
				d * 16 + d
			});
			Some(Color::rgb(chars.next()?, chars.next()?, chars.next()?))
		}
		6 | 8 => Some(Color::rgb(
			channel(&hex[0..2])?,
			channel(&hex[2..4])?,
			channel(&hex[4..6])?,
		)),
		_ => None,
	}
}

fn function_args<'a>(input: &'a str, name: &str) -> Option<&'a str> {
	input
		.strip_prefix(name)?
		.trim_start()
		.strip_prefix('(')?
		.strip_suffix(')')
}

fn parse_rgb_args(args: &str) -> Option<Color> {
	let parts: Vec<&str> = args
		.split([',', ' ', '/'])
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.collect();
	if parts.len() != 3 && parts.len() != 4 {
		return None;
	}
	let channel = |s: &str| -> Option<u8> {
		let v: f64 = s.parse().ok()?;
		Some(v.clamp(0.0, 255.0).round() as u8)
	};
	let alpha = match parts.get(3) {
		Some(s) => s.parse::<f64>().ok()?.clamp(0.0, 1.0),
		None => 1.0,
	};
	Some(Color::rgba(
		channel(parts[0])?,
		channel(parts[1])?,
		channel(parts[2])?,
		alpha,
	))
}
