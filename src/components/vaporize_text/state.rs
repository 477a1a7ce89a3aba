//! Animation driver for the vaporize effect.
//!
//! [`VaporizeEngine`] owns everything that lives across frames: the surface,
//! the particle set, the text boundaries, sweep progress and the current
//! phase. The component only forwards viewport events and frame timestamps.
//!
//! Phases per text: `FadingIn` (skipped for the first text) → `Vaporizing`
//! → `Waiting` (only when another text follows). After the last text has
//! vaporized the engine is `Complete` for good and never touches the surface
//! or particles again.

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::host::{HostEnvironment, clamp_dpr};
use super::particles::{Particle, apply_fade_in, update_particles};
use super::render::{CanvasSurface, draw_particles};
use super::sampler::{self, RasterRequest, TextBoundaries};
use super::scale::MotionParams;
use super::theme::{Color, resolve_color};
use super::types::{Direction, VaporizeConfig};

/// Where the engine is in its text sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationPhase {
	FadingIn,
	Vaporizing,
	Waiting,
	/// Terminal: the last text has fully vaporized.
	Complete,
}

/// Result of a single [`VaporizeEngine::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
	/// No drawing context or nothing rasterized yet; try again next frame.
	Skipped,
	Running,
	Complete,
}

/// Particle text vaporization state machine.
pub struct VaporizeEngine<S: CanvasSurface> {
	surface: S,
	config: VaporizeConfig,
	color: Color,
	params: MotionParams,
	dpr: f64,
	rng: SmallRng,
	particles: Vec<Particle>,
	/// `None` until a rasterization pass has succeeded.
	boundaries: Option<TextBoundaries>,
	text_index: usize,
	phase: AnimationPhase,
	/// Sweep progress in percent, 0..=100.
	progress: f64,
	/// Seconds spent in `Waiting` or `FadingIn`.
	phase_elapsed: f64,
	started: bool,
	visible: bool,
	sized: bool,
	last_font: Option<String>,
}

impl<S: CanvasSurface> VaporizeEngine<S> {
	pub fn new(surface: S, config: VaporizeConfig, host: &dyn HostEnvironment, seed: u64) -> Self {
		let config = config.sanitized();
		let dpr = clamp_dpr(host.device_pixel_ratio());
		let color = resolve_color(&config.color, host);
		let params = motion_params(&config);

		Self {
			surface,
			config,
			color,
			params,
			dpr,
			rng: SmallRng::seed_from_u64(seed),
			particles: Vec::new(),
			boundaries: None,
			text_index: 0,
			phase: AnimationPhase::Vaporizing,
			progress: 0.0,
			phase_elapsed: 0.0,
			started: false,
			visible: false,
			sized: false,
			last_font: None,
		}
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn boundaries(&self) -> Option<TextBoundaries> {
		self.boundaries
	}

	pub fn phase(&self) -> AnimationPhase {
		self.phase
	}

	pub fn progress(&self) -> f64 {
		self.progress
	}

	pub fn text_index(&self) -> usize {
		self.text_index
	}

	pub fn current_text(&self) -> &str {
		self.config
			.texts
			.get(self.text_index)
			.map(String::as_str)
			.unwrap_or("")
	}

	pub fn config(&self) -> &VaporizeConfig {
		&self.config
	}

	pub fn device_pixel_ratio(&self) -> f64 {
		self.dpr
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn surface_mut(&mut self) -> &mut S {
		&mut self.surface
	}

	pub fn is_complete(&self) -> bool {
		self.phase == AnimationPhase::Complete
	}

	/// Whether the host should keep scheduling frames.
	pub fn wants_frames(&self) -> bool {
		self.visible && !self.is_complete()
	}

	/// Current sweep x in backing-store pixels, while vaporizing.
	pub fn sweep_position(&self) -> Option<f64> {
		if self.phase != AnimationPhase::Vaporizing {
			return None;
		}
		let left_to_right = self.config.direction == Direction::LeftToRight;
		self.boundaries
			.map(|b| b.sweep_position(self.progress, left_to_right))
	}

	/// Viewport visibility changed. Returns whether frames should run.
	///
	/// The first time the engine becomes visible the sweep starts from 0.
	/// Later visibility changes pause and resume without losing progress.
	pub fn set_visible(&mut self, visible: bool) -> bool {
		self.visible = visible;
		if visible && !self.is_complete() && !self.started {
			self.started = true;
			self.progress = 0.0;
			self.phase = AnimationPhase::Vaporizing;
		}
		self.wants_frames()
	}

	/// Container resized to `width` x `height` CSS pixels.
	///
	/// Re-rasterizes when the backing size changes, unless the engine is
	/// complete. Returns whether frames should run.
	pub fn resize(&mut self, width: f64, height: f64) -> bool {
		if self.is_complete() {
			return false;
		}
		let dpr = self.dpr;
		let scaled = |v: f64| (v * dpr).floor().max(0.0) as u32;
		let size = (scaled(width), scaled(height));
		if self.sized && size == self.surface.size() {
			return self.wants_frames();
		}
		self.surface.set_size(size.0, size.1);
		self.sized = true;
		self.rasterize();
		self.wants_frames()
	}

	/// Record the active font family. Returns `true` when it differs from the
	/// last one seen, meaning a delayed [`rebuild`](Self::rebuild) is due.
	pub fn note_font_family(&mut self, family: &str) -> bool {
		if self.is_complete() || self.last_font.as_deref() == Some(family) {
			return false;
		}
		self.last_font = Some(family.to_string());
		true
	}

	/// Drop all particles and rasterize again. Returns whether frames should run.
	pub fn rebuild(&mut self) -> bool {
		if self.is_complete() {
			return false;
		}
		self.particles.clear();
		self.surface.clear();
		self.rasterize();
		self.wants_frames()
	}

	/// Apply a new configuration. Returns `true` if the font family changed.
	pub fn reconfigure(&mut self, config: VaporizeConfig, host: &dyn HostEnvironment) -> bool {
		let config = config.sanitized();
		self.color = resolve_color(&config.color, host);
		self.params = motion_params(&config);
		let family = config.font.family.clone();
		self.config = config;
		self.text_index = self
			.text_index
			.min(self.config.texts.len().saturating_sub(1));

		if self.is_complete() {
			return false;
		}
		if self.sized {
			self.rasterize();
		}
		self.note_font_family(&family)
	}

	/// Replace the particle set with a fresh sample of the current text.
	///
	/// Returns the particle count, or `None` when no drawing context is
	/// available yet.
	pub fn rasterize(&mut self) -> Option<usize> {
		self.particles.clear();
		if !self.surface.is_ready() {
			self.boundaries = None;
			return None;
		}

		let text = self
			.config
			.texts
			.get(self.text_index)
			.cloned()
			.unwrap_or_default();
		let request = RasterRequest {
			text: &text,
			font: &self.config.font,
			alignment: self.config.alignment,
			color: self.color,
			dpr: self.dpr,
		};
		let sampled = sampler::rasterize(&mut self.surface, &request);

		self.particles = sampled.particles;
		self.boundaries = Some(sampled.boundaries);
		if self.phase == AnimationPhase::FadingIn {
			let t = self.fade_in_fraction();
			apply_fade_in(&mut self.particles, t);
		}
		Some(self.particles.len())
	}

	/// Advance the animation by `dt` seconds and redraw.
	///
	/// A frame is applied as a whole: progress, every particle, then a full
	/// clear-and-paint of the surface.
	pub fn step(&mut self, dt: f64) -> FrameOutcome {
		if self.is_complete() {
			return FrameOutcome::Complete;
		}
		if !self.surface.is_ready() {
			return FrameOutcome::Skipped;
		}
		if self.boundaries.is_none() && (!self.sized || self.rasterize().is_none()) {
			return FrameOutcome::Skipped;
		}
		let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };

		match self.phase {
			AnimationPhase::Vaporizing => self.step_vaporizing(dt),
			AnimationPhase::Waiting => self.step_waiting(dt),
			AnimationPhase::FadingIn => self.step_fading_in(dt),
			AnimationPhase::Complete => FrameOutcome::Complete,
		}
	}

	/// Clear the surface and paint all visible particles.
	pub fn render(&mut self) {
		if self.surface.is_ready() {
			draw_particles(&mut self.surface, &self.particles, self.dpr);
		}
	}

	fn step_vaporizing(&mut self, dt: f64) -> FrameOutcome {
		if self.particles.is_empty() {
			self.progress = 100.0;
			return self.finish_text();
		}

		let duration = self.config.animation.vaporize_duration;
		self.progress = (self.progress + dt * 100.0 / duration).min(100.0);

		let direction = self.config.direction;
		// At 100% every remaining particle is swept, whatever the rounding
		// between percentage and pixel position.
		let sweep_x = if self.progress >= 100.0 {
			match direction {
				Direction::LeftToRight => f64::INFINITY,
				Direction::RightToLeft => f64::NEG_INFINITY,
			}
		} else {
			self.sweep_position().unwrap_or(f64::NEG_INFINITY)
		};

		let all_vaporized = update_particles(
			&mut self.particles,
			sweep_x,
			dt,
			direction,
			&self.params,
			&mut self.rng,
		);
		self.render();

		if self.progress >= 100.0 && all_vaporized {
			return self.finish_text();
		}
		FrameOutcome::Running
	}

	fn step_waiting(&mut self, dt: f64) -> FrameOutcome {
		self.phase_elapsed += dt;
		if self.phase_elapsed < self.config.animation.wait_duration {
			return FrameOutcome::Running;
		}

		self.text_index += 1;
		self.phase = AnimationPhase::FadingIn;
		self.phase_elapsed = 0.0;
		info!(
			"vaporize: showing text {} of {}",
			self.text_index + 1,
			self.config.texts.len()
		);
		self.rasterize();
		self.render();
		FrameOutcome::Running
	}

	fn step_fading_in(&mut self, dt: f64) -> FrameOutcome {
		self.phase_elapsed += dt;
		let t = self.fade_in_fraction();
		apply_fade_in(&mut self.particles, t);
		self.render();

		if t >= 1.0 {
			self.phase = AnimationPhase::Vaporizing;
			self.phase_elapsed = 0.0;
			self.progress = 0.0;
		}
		FrameOutcome::Running
	}

	fn fade_in_fraction(&self) -> f64 {
		let duration = self.config.animation.fade_in_duration;
		if duration <= 0.0 {
			1.0
		} else {
			(self.phase_elapsed / duration).min(1.0)
		}
	}

	fn finish_text(&mut self) -> FrameOutcome {
		self.surface.clear();

		if self.text_index + 1 < self.config.texts.len() {
			debug!("vaporize: text {} vaporized", self.text_index + 1);
			self.phase = AnimationPhase::Waiting;
			self.phase_elapsed = 0.0;
			return FrameOutcome::Running;
		}

		info!("vaporize: animation complete");
		self.phase = AnimationPhase::Complete;
		FrameOutcome::Complete
	}
}

fn motion_params(config: &VaporizeConfig) -> MotionParams {
	MotionParams::new(
		config.font.size,
		config.spread,
		config.density,
		config.animation.vaporize_ms(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::vaporize_text::host::HeadlessHost;
	use crate::components::vaporize_text::testing::BlockCanvas;
	use crate::components::vaporize_text::types::{AnimationTiming, FontSpec};
	use pretty_assertions::assert_eq;

	const FRAME: f64 = 0.016;

	fn config(texts: &[&str], vaporize: f64) -> VaporizeConfig {
		VaporizeConfig {
			texts: texts.iter().map(|t| t.to_string()).collect(),
			font: FontSpec {
				family: "Inter".into(),
				size: 100.0,
				weight: 600,
			},
			color: "#800000".into(),
			animation: AnimationTiming {
				vaporize_duration: vaporize,
				fade_in_duration: 0.2,
				wait_duration: 0.1,
			},
			..VaporizeConfig::default()
		}
	}

	fn engine(texts: &[&str], vaporize: f64) -> VaporizeEngine<BlockCanvas> {
		let mut engine = VaporizeEngine::new(
			BlockCanvas::new(0, 0),
			config(texts, vaporize),
			&HeadlessHost,
			7,
		);
		engine.resize(400.0, 200.0);
		engine.set_visible(true);
		engine
	}

	fn run_until_complete(engine: &mut VaporizeEngine<BlockCanvas>, max_frames: usize) -> bool {
		(0..max_frames).any(|_| engine.step(FRAME) == FrameOutcome::Complete)
	}

	#[test]
	fn vaporizes_ab_and_stays_complete() {
		let mut engine = engine(&["AB"], 1.0);
		assert!(!engine.particles().is_empty());

		for _ in 0..63 {
			engine.step(FRAME);
		}
		assert_eq!(engine.progress(), 100.0);
		assert!(engine.particles().iter().all(Particle::is_triggered));

		assert!(run_until_complete(&mut engine, 1000));
		assert!(engine.is_complete());
		assert!(!engine.wants_frames());
		assert!(engine.surface().is_blank());

		let frozen = engine.particles().to_vec();
		for _ in 0..10 {
			assert_eq!(engine.step(FRAME), FrameOutcome::Complete);
		}
		assert_eq!(engine.particles(), frozen.as_slice());
		assert!(engine.surface().is_blank());
	}

	#[test]
	fn swept_particles_are_always_triggered() {
		for direction in [Direction::LeftToRight, Direction::RightToLeft] {
			let mut cfg = config(&["AB"], 1.0);
			cfg.direction = direction;
			let mut engine = VaporizeEngine::new(BlockCanvas::new(0, 0), cfg, &HeadlessHost, 11);
			engine.resize(400.0, 200.0);
			engine.set_visible(true);

			let mut last_progress = 0.0;
			while engine.progress() < 100.0 {
				engine.step(FRAME);
				assert!(engine.progress() >= last_progress);
				last_progress = engine.progress();
				let Some(sweep) = engine.sweep_position() else {
					break;
				};
				for p in engine.particles() {
					if p.is_swept(sweep, direction) {
						assert!(p.is_triggered(), "particle at {} behind sweep {}", p.original_x, sweep);
					} else {
						assert!(!p.is_triggered());
					}
				}
			}
		}
	}

	#[test]
	fn empty_text_completes_immediately() {
		let mut engine = engine(&[""], 1.0);
		assert!(engine.particles().is_empty());
		assert_eq!(engine.step(FRAME), FrameOutcome::Complete);
		assert!(engine.is_complete());
	}

	#[test]
	fn no_texts_completes_immediately() {
		let mut engine = engine(&[], 1.0);
		assert_eq!(engine.step(FRAME), FrameOutcome::Complete);
	}

	#[test]
	fn zero_area_container_completes_immediately() {
		let mut engine = VaporizeEngine::new(
			BlockCanvas::new(0, 0),
			config(&["AB"], 1.0),
			&HeadlessHost,
			3,
		);
		engine.resize(0.0, 0.0);
		engine.set_visible(true);
		assert_eq!(engine.step(FRAME), FrameOutcome::Complete);
	}

	#[test]
	fn skips_until_sized_and_ready() {
		let mut engine = VaporizeEngine::new(
			BlockCanvas::new(0, 0),
			config(&["AB"], 1.0),
			&HeadlessHost,
			3,
		);
		engine.set_visible(true);
		assert_eq!(engine.step(FRAME), FrameOutcome::Skipped);

		engine.surface_mut().set_ready(false);
		engine.resize(400.0, 200.0);
		assert_eq!(engine.boundaries(), None);
		assert_eq!(engine.step(FRAME), FrameOutcome::Skipped);
		assert_eq!(engine.progress(), 0.0);

		engine.surface_mut().set_ready(true);
		assert_eq!(engine.step(FRAME), FrameOutcome::Running);
		assert!(!engine.particles().is_empty());
		assert!(engine.progress() > 0.0);
	}

	#[test]
	fn resize_replaces_particles_without_accumulating() {
		let mut engine = engine(&["AB"], 1.0);
		let initial = engine.particles().len();

		for _ in 0..20 {
			engine.step(FRAME);
		}
		assert!(engine.particles().iter().any(Particle::is_triggered));

		assert!(engine.resize(400.0, 200.0));
		assert_eq!(engine.particles().len(), initial);
		assert!(engine.particles().iter().any(Particle::is_triggered));

		engine.resize(800.0, 400.0);
		assert!(engine.particles().iter().all(|p| !p.is_triggered()));
		engine.resize(400.0, 200.0);
		assert_eq!(engine.particles().len(), initial);
	}

	#[test]
	fn repeated_same_size_resizes_still_complete() {
		let mut engine = engine(&["AB"], 1.0);
		let mut frames = 0;
		while !engine.is_complete() && frames < 1000 {
			engine.resize(400.0, 200.0);
			engine.step(FRAME);
			frames += 1;
		}
		assert!(engine.is_complete());
	}

	#[test]
	fn subpixel_resize_keeps_particles() {
		let mut engine = engine(&["AB"], 1.0);
		for _ in 0..20 {
			engine.step(FRAME);
		}
		let before = engine.particles().to_vec();
		engine.resize(400.4, 200.9);
		assert_eq!(engine.particles(), before.as_slice());
	}

	#[test]
	fn resize_after_completion_is_ignored() {
		let mut engine = engine(&["AB"], 0.5);
		assert!(run_until_complete(&mut engine, 1000));
		let frozen = engine.particles().to_vec();

		assert!(!engine.resize(300.0, 100.0));
		assert!(!engine.rebuild());
		assert_eq!(engine.particles(), frozen.as_slice());
		assert_eq!(engine.surface().size(), (400, 200));
	}

	#[test]
	fn hidden_engine_resumes_where_it_left_off() {
		let mut engine = engine(&["AB"], 1.0);
		for _ in 0..10 {
			engine.step(FRAME);
		}
		let progress = engine.progress();

		assert!(!engine.set_visible(false));
		assert!(engine.set_visible(true));
		assert_eq!(engine.progress(), progress);
	}

	#[test]
	fn cycles_through_texts_then_stops() {
		let mut engine = engine(&["A", "BC"], 0.5);
		let first_count = engine.particles().len();

		let mut saw_waiting = false;
		let mut saw_fade_in = false;
		for _ in 0..2000 {
			match engine.step(FRAME) {
				FrameOutcome::Complete => break,
				_ => {
					saw_waiting |= engine.phase() == AnimationPhase::Waiting;
					if engine.phase() == AnimationPhase::FadingIn {
						saw_fade_in = true;
						assert_eq!(engine.text_index(), 1);
						for p in engine.particles() {
							assert!(p.opacity <= p.original_alpha);
						}
					}
				}
			}
		}

		assert!(saw_waiting && saw_fade_in);
		assert!(engine.is_complete());
		assert_eq!(engine.current_text(), "BC");
		assert!(engine.particles().len() > first_count);
	}

	#[test]
	fn resampling_during_fade_in_keeps_fade_progress() {
		let mut engine = engine(&["A", "BC"], 0.5);
		assert!((0..2000).any(|_| {
			engine.step(FRAME);
			engine.phase() == AnimationPhase::FadingIn
		}));
		for _ in 0..6 {
			engine.step(FRAME);
		}
		assert_eq!(engine.phase(), AnimationPhase::FadingIn);

		engine.resize(500.0, 200.0);
		let p = &engine.particles()[0];
		assert!(p.opacity > 0.0 && p.opacity < p.original_alpha);
	}

	#[test]
	fn font_family_changes_trigger_rebuild() {
		let mut engine = engine(&["AB"], 1.0);
		assert!(engine.note_font_family("Inter"));
		assert!(!engine.note_font_family("Inter"));
		assert!(engine.note_font_family("Roboto"));

		for _ in 0..20 {
			engine.step(FRAME);
		}
		let count = engine.particles().len();
		assert!(engine.rebuild());
		assert_eq!(engine.particles().len(), count);
		assert!(engine.particles().iter().all(|p| !p.is_triggered()));
	}

	#[test]
	fn reconfigure_resamples_and_reports_font_change() {
		let mut engine = engine(&["AB"], 1.0);
		engine.note_font_family("Inter");
		let before = engine.particles().len();

		let mut cfg = config(&["ABCD"], 1.0);
		cfg.font.family = "Roboto".into();
		assert!(engine.reconfigure(cfg, &HeadlessHost));
		assert!(engine.particles().len() > before);
	}

	#[test]
	fn frames_paint_particles() {
		let mut engine = engine(&["AB"], 1.0);
		engine.step(FRAME);
		assert!(!engine.surface().rects().is_empty());
		assert!(
			engine
				.surface()
				.rects()
				.iter()
				.all(|r| r.color.starts_with("rgba(128, 0, 0, "))
		);
	}
}
