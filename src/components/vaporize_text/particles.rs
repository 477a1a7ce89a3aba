//! Particles sampled from the text raster and their vaporize motion.
//!
//! Each particle stays untouched until the sweep passes its original x
//! coordinate. On that first trigger it gets a random direction and speed and
//! is permanently assigned one of two behaviors:
//!
//! - **fast fade**: no motion, opacity drops linearly by `dt` per frame;
//! - **full physics**: distance-dependent damping, random jitter, a weak pull
//!   back to its origin, a velocity clamp and a duration-scaled fade.
//!
//! Horizontal motion is integrated twice as fast as vertical motion, which
//! gives the characteristic sideways smear.

use std::f64::consts::TAU;

use rand::Rng;

use super::scale::MotionParams;
use super::theme::Color;
use super::types::Direction;

/// Opacity at or below which a triggered particle counts as gone.
pub const VISIBILITY_FLOOR: f64 = 0.01;

/// Lower damping bound; particles never lose more than 5% velocity per frame.
const MIN_DAMPING: f64 = 0.95;
/// Strength of the pull back toward the original position.
const HOME_PULL: f64 = 0.002;
/// Position integration weights.
const X_STEP: f64 = 20.0;
const Y_STEP: f64 = 10.0;

/// Whether the sweep has reached a particle yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticlePhase {
	/// Not yet swept; position, velocity and opacity are untouched.
	Idle,
	/// Swept. `fast_fade` is fixed for the particle's lifetime.
	Triggered { fast_fade: bool },
}

/// One sampled pixel of the rendered text.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub original_x: f64,
	pub original_y: f64,
	/// Sampled color; its alpha is ignored in favor of `opacity`.
	pub color: Color,
	pub opacity: f64,
	pub original_alpha: f64,
	pub velocity_x: f64,
	pub velocity_y: f64,
	/// Seed direction and speed, set on first trigger.
	pub angle: f64,
	pub speed: f64,
	pub phase: ParticlePhase,
}

impl Particle {
	pub fn new(x: f64, y: f64, color: Color, alpha: f64) -> Self {
		Self {
			x,
			y,
			original_x: x,
			original_y: y,
			color,
			opacity: alpha,
			original_alpha: alpha,
			velocity_x: 0.0,
			velocity_y: 0.0,
			angle: 0.0,
			speed: 0.0,
			phase: ParticlePhase::Idle,
		}
	}

	pub fn is_triggered(&self) -> bool {
		matches!(self.phase, ParticlePhase::Triggered { .. })
	}

	pub fn fast_fade(&self) -> Option<bool> {
		match self.phase {
			ParticlePhase::Idle => None,
			ParticlePhase::Triggered { fast_fade } => Some(fast_fade),
		}
	}

	/// Whether the sweep at `sweep_x` has reached this particle.
	pub fn is_swept(&self, sweep_x: f64, direction: Direction) -> bool {
		match direction {
			Direction::LeftToRight => self.original_x <= sweep_x,
			Direction::RightToLeft => self.original_x >= sweep_x,
		}
	}

	/// Seed motion on first trigger and fix the fade behavior.
	fn trigger<R: Rng>(&mut self, params: &MotionParams, rng: &mut R) {
		self.angle = rng.random::<f64>() * TAU;
		self.speed = (rng.random::<f64>() + 0.5) * params.spread;
		self.velocity_x = self.angle.cos() * self.speed;
		self.velocity_y = self.angle.sin() * self.speed;
		let fast_fade = !rng.random_bool(params.survival.clamp(0.0, 1.0));
		self.phase = ParticlePhase::Triggered { fast_fade };
	}

	fn advance_physics<R: Rng>(&mut self, dt: f64, params: &MotionParams, rng: &mut R) {
		let spread = params.spread;
		let dx = self.original_x - self.x;
		let dy = self.original_y - self.y;
		let distance = (dx * dx + dy * dy).sqrt();

		// f64::max ignores the NaN a zero spread produces here.
		let damping = MIN_DAMPING.max(1.0 - distance / (100.0 * spread));

		let jitter = spread * 3.0;
		let spread_x = (rng.random::<f64>() - 0.5) * jitter;
		let spread_y = (rng.random::<f64>() - 0.5) * jitter;

		self.velocity_x = (self.velocity_x + spread_x + dx * HOME_PULL) * damping;
		self.velocity_y = (self.velocity_y + spread_y + dy * HOME_PULL) * damping;

		let max_velocity = params.max_velocity();
		let velocity = (self.velocity_x * self.velocity_x + self.velocity_y * self.velocity_y).sqrt();
		if velocity > max_velocity {
			let scale = max_velocity / velocity;
			self.velocity_x *= scale;
			self.velocity_y *= scale;
		}

		self.x += self.velocity_x * dt * X_STEP;
		self.y += self.velocity_y * dt * Y_STEP;

		self.opacity = (self.opacity - dt * params.fade_rate()).max(0.0);
	}
}

/// Advance every particle by one frame.
///
/// Returns `true` once every particle has been swept and faded below
/// [`VISIBILITY_FLOOR`]. An empty slice is trivially vaporized.
pub fn update_particles<R: Rng>(
	particles: &mut [Particle],
	sweep_x: f64,
	dt: f64,
	direction: Direction,
	params: &MotionParams,
	rng: &mut R,
) -> bool {
	let mut all_vaporized = true;

	for particle in particles.iter_mut() {
		if !particle.is_swept(sweep_x, direction) {
			all_vaporized = false;
			continue;
		}

		if particle.phase == ParticlePhase::Idle {
			particle.trigger(params, rng);
		}

		match particle.phase {
			ParticlePhase::Triggered { fast_fade: true } => {
				particle.opacity = (particle.opacity - dt).max(0.0);
			}
			_ => particle.advance_physics(dt, params, rng),
		}

		if particle.opacity > VISIBILITY_FLOOR {
			all_vaporized = false;
		}
	}

	all_vaporized
}

/// Set every particle's opacity to `t` of its sampled alpha (fade-in).
pub fn apply_fade_in(particles: &mut [Particle], t: f64) {
	let t = t.clamp(0.0, 1.0);
	for particle in particles.iter_mut() {
		particle.opacity = particle.original_alpha * t;
	}
}
