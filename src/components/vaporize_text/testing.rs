//! Headless drawing surface for tests.
//!
//! Glyphs are painted as solid blocks: every non-whitespace character
//! occupies the middle 80% of a fixed advance and 70% of the font size
//! vertically, centered on the baseline.

use super::render::{CanvasSurface, TextStyle};
use super::sampler::PixelBuffer;
use super::theme::{Color, FALLBACK_COLOR};
use super::types::Alignment;

/// A particle-sized rectangle painted by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintedRect {
	pub x: f64,
	pub y: f64,
	pub size: f64,
	pub color: String,
}

pub struct BlockCanvas {
	pixels: PixelBuffer,
	rects: Vec<PaintedRect>,
	ready: bool,
}

impl BlockCanvas {
	pub fn new(width: u32, height: u32) -> Self {
		Self {
			pixels: PixelBuffer::new(width, height),
			rects: Vec::new(),
			ready: true,
		}
	}

	/// Horizontal advance of one glyph at `size_px`.
	pub fn advance(size_px: f64) -> f64 {
		size_px * 0.6
	}

	pub fn set_ready(&mut self, ready: bool) {
		self.ready = ready;
	}

	pub fn rects(&self) -> &[PaintedRect] {
		&self.rects
	}

	pub fn is_blank(&self) -> bool {
		self.rects.is_empty() && self.pixels.data.iter().all(|&b| b == 0)
	}
}

impl CanvasSurface for BlockCanvas {
	fn size(&self) -> (u32, u32) {
		(self.pixels.width, self.pixels.height)
	}

	fn set_size(&mut self, width: u32, height: u32) {
		self.pixels = PixelBuffer::new(width, height);
		self.rects.clear();
	}

	fn is_ready(&mut self) -> bool {
		self.ready
	}

	fn clear(&mut self) {
		self.pixels.data.fill(0);
		self.rects.clear();
	}

	fn measure_text(&mut self, text: &str, style: &TextStyle) -> f64 {
		text.chars().count() as f64 * Self::advance(style.size_px)
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle, color: &str) {
		let advance = Self::advance(style.size_px);
		let total = self.measure_text(text, style);
		let left = match style.alignment {
			Alignment::Left => x,
			Alignment::Right => x - total,
			_ => x - total / 2.0,
		};
		let Color { r, g, b, .. } = Color::parse(color).unwrap_or(FALLBACK_COLOR);
		let half_height = style.size_px * 0.35;

		for (i, ch) in text.chars().enumerate() {
			if ch.is_whitespace() {
				continue;
			}
			let x0 = left + i as f64 * advance;
			let (x_start, x_end) = (x0 + advance * 0.1, x0 + advance * 0.9);
			let (y_start, y_end) = (y - half_height, y + half_height);

			for py in y_start.max(0.0).ceil() as u32..y_end.max(0.0).ceil() as u32 {
				for px in x_start.max(0.0).ceil() as u32..x_end.max(0.0).ceil() as u32 {
					self.pixels.put_pixel(px, py, [r, g, b, 255]);
				}
			}
		}
	}

	fn read_pixels(&mut self) -> Option<PixelBuffer> {
		self.ready.then(|| self.pixels.clone())
	}

	fn fill_rect(&mut self, x: f64, y: f64, width: f64, _height: f64, color: &str) {
		self.rects.push(PaintedRect {
			x,
			y,
			size: width,
			color: color.to_string(),
		});
	}
}
