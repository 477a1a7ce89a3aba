//! Font-size dependent physical constants and parameter remapping.
//!
//! The particle motion is tuned so that text of any size vaporizes with a
//! similar look. Two values are derived from the configuration here:
//!
//! - the **spread constant**, interpolated from the font size over a small set
//!   of calibration points and multiplied by the user `spread`;
//! - the **survival probability**, the chance a swept particle runs full
//!   physics instead of fast-fading, remapped from the user `density`.

/// `(font size in px, spread)` calibration points, sorted by size.
pub const SPREAD_CALIBRATION: [(f64, f64); 3] = [(20.0, 0.2), (50.0, 0.5), (100.0, 1.5)];

/// Density input range.
pub const DENSITY_RANGE: (f64, f64) = (0.0, 10.0);

/// Survival probability range the density maps onto.
pub const SURVIVAL_RANGE: (f64, f64) = (0.3, 1.0);

/// Piecewise-linear spread for a font size, clamped to the outer points.
pub fn spread_for_font_size(size: f64) -> f64 {
	let first = SPREAD_CALIBRATION[0];
	let last = SPREAD_CALIBRATION[SPREAD_CALIBRATION.len() - 1];

	if size <= first.0 {
		return first.1;
	}
	if size >= last.0 {
		return last.1;
	}

	SPREAD_CALIBRATION
		.windows(2)
		.find(|w| size <= w[1].0)
		.map(|w| {
			let ((s1, v1), (s2, v2)) = (w[0], w[1]);
			v1 + (size - s1) * (v2 - v1) / (s2 - s1)
		})
		.unwrap_or(last.1)
}

/// Linearly map `input` from one range to another, optionally clamping.
pub fn transform_value(input: f64, from: (f64, f64), to: (f64, f64), clamp: bool) -> f64 {
	let progress = (input - from.0) / (from.1 - from.0);
	let result = to.0 + progress * (to.1 - to.0);
	if !clamp {
		return result;
	}
	let (lo, hi) = if to.1 > to.0 { (to.0, to.1) } else { (to.1, to.0) };
	result.clamp(lo, hi)
}

/// Probability that a swept particle is *not* fast-fading.
pub fn survival_probability(density: f64) -> f64 {
	transform_value(density, DENSITY_RANGE, SURVIVAL_RANGE, true)
}

/// Physical constants the motion model needs, resolved once per configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
	/// Spread constant after the user multiplier.
	pub spread: f64,
	/// Configured vaporize duration in milliseconds.
	pub vaporize_ms: f64,
	/// Probability of running full physics once swept.
	pub survival: f64,
}

impl MotionParams {
	pub fn new(font_size: f64, spread_multiplier: f64, density: f64, vaporize_ms: f64) -> Self {
		Self {
			spread: spread_for_font_size(font_size) * spread_multiplier,
			vaporize_ms,
			survival: survival_probability(density),
		}
	}

	/// Opacity lost per second by full-physics particles.
	pub fn fade_rate(&self) -> f64 {
		const BASE_FADE_RATE: f64 = 0.25;
		BASE_FADE_RATE * (2000.0 / self.vaporize_ms)
	}

	/// Upper bound on particle speed.
	pub fn max_velocity(&self) -> f64 {
		self.spread * 2.0
	}
}
