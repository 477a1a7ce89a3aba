//! Host environment capabilities the engine needs from the page.

use web_sys::Window;

use super::theme::token_variable;

/// Upper bound on the device pixel ratio; higher ratios make sampling too costly.
pub const MAX_DPR: f64 = 2.0;

/// What the engine may ask of its surroundings.
///
/// The defaults describe a headless environment: 1:1 pixels and no theme.
pub trait HostEnvironment {
	/// Device pixel ratio, already capped at [`MAX_DPR`].
	fn device_pixel_ratio(&self) -> f64 {
		1.0
	}

	/// Raw CSS value for a theme token, if the page defines one.
	fn theme_color(&self, _token: &str) -> Option<String> {
		None
	}
}

/// No-op host for tests and non-browser targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessHost;

impl HostEnvironment for HeadlessHost {}

/// Host backed by the browser window.
pub struct BrowserHost {
	window: Window,
}

impl BrowserHost {
	pub fn new(window: Window) -> Self {
		Self { window }
	}

	/// The current window, if running in a browser.
	pub fn current() -> Option<Self> {
		web_sys::window().map(Self::new)
	}
}

impl HostEnvironment for BrowserHost {
	fn device_pixel_ratio(&self) -> f64 {
		clamp_dpr(self.window.device_pixel_ratio())
	}

	fn theme_color(&self, token: &str) -> Option<String> {
		let root = self.window.document()?.document_element()?;
		let style = self.window.get_computed_style(&root).ok()??;
		let value = style.get_property_value(&token_variable(token)).ok()?;
		let value = value.trim();
		(!value.is_empty()).then(|| value.to_string())
	}
}

/// Treat missing or nonsensical ratios as 1 and cap the rest.
pub fn clamp_dpr(dpr: f64) -> f64 {
	if dpr.is_finite() && dpr > 0.0 {
		dpr.min(MAX_DPR)
	} else {
		1.0
	}
}
