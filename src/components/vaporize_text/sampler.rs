//! Text rasterization and pixel sampling.
//!
//! The text is painted once onto the surface, read back, and every opaque
//! pixel on a DPR-dependent stride grid becomes a [`Particle`]. The surface is
//! cleared afterwards, so the static raster is never visible.

use log::debug;

use super::particles::Particle;
use super::render::{CanvasSurface, TextStyle};
use super::theme::Color;
use super::types::{Alignment, FontSpec};

/// DPR the sampling stride is calibrated against.
const BASE_DPR: f64 = 1.0;

/// Horizontal extent of the rendered text in backing-store pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextBoundaries {
	pub left: f64,
	pub right: f64,
	pub width: f64,
}

impl TextBoundaries {
	/// Boundaries of text of `width` drawn at `anchor_x` with `alignment`.
	pub fn from_anchor(anchor_x: f64, width: f64, alignment: Alignment) -> Self {
		let left = match alignment.resolved() {
			Alignment::Left => anchor_x,
			Alignment::Right => anchor_x - width,
			_ => anchor_x - width / 2.0,
		};
		Self {
			left,
			right: left + width,
			width,
		}
	}

	/// Absolute sweep x for a progress percentage.
	pub fn sweep_position(&self, progress: f64, left_to_right: bool) -> f64 {
		let travelled = self.width * progress.clamp(0.0, 100.0) / 100.0;
		if left_to_right {
			self.left + travelled
		} else {
			self.right - travelled
		}
	}
}

/// RGBA pixels read back from a surface, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelBuffer {
	pub width: u32,
	pub height: u32,
	pub data: Vec<u8>,
}

impl PixelBuffer {
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			width,
			height,
			data: vec![0; width as usize * height as usize * 4],
		}
	}

	fn index(&self, x: u32, y: u32) -> usize {
		(y as usize * self.width as usize + x as usize) * 4
	}

	/// RGBA at `(x, y)`, or `None` outside the buffer.
	pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
		if x >= self.width || y >= self.height {
			return None;
		}
		let i = self.index(x, y);
		self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
	}

	pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
		if x >= self.width || y >= self.height {
			return;
		}
		let i = self.index(x, y);
		if let Some(slot) = self.data.get_mut(i..i + 4) {
			slot.copy_from_slice(&rgba);
		}
	}
}

/// What to rasterize.
#[derive(Clone, Debug)]
pub struct RasterRequest<'a> {
	pub text: &'a str,
	pub font: &'a FontSpec,
	pub alignment: Alignment,
	pub color: Color,
	pub dpr: f64,
}

/// Output of one rasterization pass.
#[derive(Clone, Debug, Default)]
pub struct SampledText {
	pub particles: Vec<Particle>,
	pub boundaries: TextBoundaries,
}

/// Pixel stride for a DPR; never below 1.
pub fn sampling_stride(dpr: f64) -> u32 {
	let stride = (dpr / BASE_DPR).round();
	if stride.is_finite() && stride >= 1.0 {
		stride as u32
	} else {
		1
	}
}

/// Paint `request.text` on `surface`, sample it, and clear the surface.
pub fn rasterize<S: CanvasSurface>(surface: &mut S, request: &RasterRequest<'_>) -> SampledText {
	let (width, height) = surface.size();
	if width == 0 || height == 0 || !surface.is_ready() {
		return SampledText::default();
	}

	surface.clear();

	let anchor_x = match request.alignment.resolved() {
		Alignment::Left => 0.0,
		Alignment::Right => width as f64,
		_ => width as f64 / 2.0,
	};
	let anchor_y = height as f64 / 2.0;

	let style = TextStyle {
		font: request.font.css(request.dpr),
		size_px: request.font.size * request.dpr,
		alignment: request.alignment.resolved(),
	};

	let text_width = surface.measure_text(request.text, &style).max(0.0);
	let boundaries = TextBoundaries::from_anchor(anchor_x, text_width, request.alignment);

	if text_width == 0.0 {
		return SampledText {
			particles: Vec::new(),
			boundaries,
		};
	}

	surface.fill_text(request.text, anchor_x, anchor_y, &style, &request.color.to_css());
	let particles = surface
		.read_pixels()
		.map(|pixels| sample_pixels(&pixels, sampling_stride(request.dpr), request.dpr))
		.unwrap_or_default();
	surface.clear();

	debug!(
		"vaporize: sampled {} particles for {:?} (left {:.1}, width {:.1})",
		particles.len(),
		request.text,
		boundaries.left,
		boundaries.width
	);

	SampledText {
		particles,
		boundaries,
	}
}

/// One particle per pixel with non-zero alpha on the `stride` grid.
pub fn sample_pixels(pixels: &PixelBuffer, stride: u32, dpr: f64) -> Vec<Particle> {
	let stride = stride.max(1);
	let alpha_scale = stride as f64 / dpr.max(f64::EPSILON);
	let mut particles = Vec::new();

	for y in (0..pixels.height).step_by(stride as usize) {
		for x in (0..pixels.width).step_by(stride as usize) {
			let Some([r, g, b, a]) = pixels.pixel(x, y) else {
				continue;
			};
			if a == 0 {
				continue;
			}
			let alpha = (a as f64 / 255.0 * alpha_scale).min(1.0);
			particles.push(Particle::new(x as f64, y as f64, Color::rgb(r, g, b), alpha));
		}
	}

	particles
}
