//! Drawing surface abstraction and canvas rendering.
//!
//! The engine only talks to a [`CanvasSurface`]. In the browser that is a
//! [`BrowserCanvas`] wrapping an `HtmlCanvasElement`; the same canvas is used
//! to rasterize the text (then cleared) and to paint the particles each frame.

use wasm_bindgen::JsCast;
use js_sys::Reflect;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::particles::Particle;
use super::sampler::PixelBuffer;
use super::types::Alignment;

/// Font settings used for measuring and painting text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
	/// CSS font shorthand, already DPR-scaled.
	pub font: String,
	/// Font size in backing-store pixels.
	pub size_px: f64,
	pub alignment: Alignment,
}

/// A 2D drawing target in backing-store pixel coordinates.
pub trait CanvasSurface {
	/// Backing-store size in pixels.
	fn size(&self) -> (u32, u32);
	fn set_size(&mut self, width: u32, height: u32);
	/// Whether a drawing context is available right now.
	fn is_ready(&mut self) -> bool;
	fn clear(&mut self);
	/// Rendered width of `text`; 0 when it cannot be measured.
	fn measure_text(&mut self, text: &str, style: &TextStyle) -> f64;
	/// Paint `text` anchored at `(x, y)` with a vertically centered baseline.
	fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle, color: &str);
	fn read_pixels(&mut self) -> Option<PixelBuffer>;
	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str);
}

/// Clear the surface and paint every particle that is still visible.
///
/// Each particle covers a `pixel_size` square so the cloud looks the same
/// at any device pixel ratio.
pub fn draw_particles<S: CanvasSurface + ?Sized>(surface: &mut S, particles: &[Particle], pixel_size: f64) {
	surface.clear();
	for p in particles.iter().filter(|p| p.opacity > 0.0) {
		let color = p.color.with_alpha(p.opacity).to_css();
		surface.fill_rect(p.x, p.y, pixel_size, pixel_size, &color);
	}
}

/// [`CanvasSurface`] over a DOM canvas element.
pub struct BrowserCanvas {
	canvas: HtmlCanvasElement,
	ctx: Option<CanvasRenderingContext2d>,
}

impl BrowserCanvas {
	pub fn new(canvas: HtmlCanvasElement) -> Self {
		let ctx = context_2d(&canvas);
		Self { canvas, ctx }
	}

	/// Context, acquiring it lazily if it was unavailable before.
	fn context(&mut self) -> Option<&CanvasRenderingContext2d> {
		if self.ctx.is_none() {
			self.ctx = context_2d(&self.canvas);
		}
		self.ctx.as_ref()
	}

	/// Set the displayed (CSS) size of the canvas element.
	pub fn set_css_size(&self, width: f64, height: f64) {
		let style = self.canvas.style();
		let _ = style.set_property("width", &format!("{}px", width));
		let _ = style.set_property("height", &format!("{}px", height));
	}

	/// False once the canvas has been removed from the document.
	pub fn is_connected(&self) -> bool {
		self.canvas.is_connected()
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Context properties without typed setters in web-sys.
const TEXT_QUALITY_HINTS: [(&str, &str); 3] = [
	("imageSmoothingQuality", "high"),
	("fontKerning", "normal"),
	("textRendering", "geometricPrecision"),
];

fn apply_text_style(ctx: &CanvasRenderingContext2d, style: &TextStyle) {
	ctx.set_font(&style.font);
	ctx.set_text_align(style.alignment.as_css());
	ctx.set_text_baseline("middle");
	ctx.set_image_smoothing_enabled(true);
	for (key, value) in TEXT_QUALITY_HINTS {
		let _ = Reflect::set(ctx, &JsValue::from_str(key), &JsValue::from_str(value));
	}
}

impl CanvasSurface for BrowserCanvas {
	fn size(&self) -> (u32, u32) {
		(self.canvas.width(), self.canvas.height())
	}

	fn set_size(&mut self, width: u32, height: u32) {
		self.canvas.set_width(width);
		self.canvas.set_height(height);
	}

	fn is_ready(&mut self) -> bool {
		self.context().is_some()
	}

	fn clear(&mut self) {
		let (w, h) = self.size();
		if let Some(ctx) = self.context() {
			ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
		}
	}

	fn measure_text(&mut self, text: &str, style: &TextStyle) -> f64 {
		let Some(ctx) = self.context() else {
			return 0.0;
		};
		apply_text_style(ctx, style);
		ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
	}

	fn fill_text(&mut self, text: &str, x: f64, y: f64, style: &TextStyle, color: &str) {
		let Some(ctx) = self.context() else {
			return;
		};
		apply_text_style(ctx, style);
		ctx.set_fill_style_str(color);
		let _ = ctx.fill_text(text, x, y);
	}

	fn read_pixels(&mut self) -> Option<PixelBuffer> {
		let (width, height) = self.size();
		let ctx = self.context()?;
		let image = ctx
			.get_image_data(0.0, 0.0, width as f64, height as f64)
			.ok()?;
		Some(PixelBuffer {
			width: image.width(),
			height: image.height(),
			data: image.data().0,
		})
	}

	fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: &str) {
		if let Some(ctx) = self.context() {
			ctx.set_fill_style_str(color);
			ctx.fill_rect(x, y, width, height);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::vaporize_text::testing::BlockCanvas;
	use crate::components::vaporize_text::theme::Color;

	#[test]
	fn only_visible_particles_are_painted() {
		let mut canvas = BlockCanvas::new(10, 10);
		let mut gone = Particle::new(1.0, 1.0, Color::rgb(1, 2, 3), 1.0);
		gone.opacity = 0.0;
		let visible = Particle::new(4.0, 5.0, Color::rgb(1, 2, 3), 0.5);

		draw_particles(&mut canvas, &[gone, visible], 2.0);

		assert_eq!(canvas.rects().len(), 1);
		let rect = &canvas.rects()[0];
		assert_eq!((rect.x, rect.y, rect.size), (4.0, 5.0, 2.0));
		assert_eq!(rect.color, "rgba(1, 2, 3, 0.5)");
	}

	#[test]
	fn text_quality_hints_cover_smoothing_kerning_and_rendering() {
		let keys: Vec<&str> = TEXT_QUALITY_HINTS.iter().map(|(k, _)| *k).collect();
		assert_eq!(keys, ["imageSmoothingQuality", "fontKerning", "textRendering"]);
		assert!(TEXT_QUALITY_HINTS.contains(&("textRendering", "geometricPrecision")));
	}

	#[test]
	fn drawing_clears_previous_frame() {
		let mut canvas = BlockCanvas::new(10, 10);
		let p = Particle::new(0.0, 0.0, Color::rgb(0, 0, 0), 1.0);
		draw_particles(&mut canvas, &[p.clone(), p.clone()], 1.0);
		draw_particles(&mut canvas, &[p], 1.0);
		assert_eq!(canvas.rects().len(), 1);
	}
}
