//! Leptos component wrapping the vaporize text canvas.
//!
//! The component owns a wrapper `div` and a canvas. Viewport visibility comes
//! from an `IntersectionObserver`, container size from a `ResizeObserver`, and
//! an animation loop runs via `requestAnimationFrame` while the engine wants
//! frames. All of them forward into the shared [`VaporizeEngine`].

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	Element, HtmlCanvasElement, IntersectionObserver, IntersectionObserverEntry, ResizeObserver,
	ResizeObserverEntry,
};

use super::host::BrowserHost;
use super::render::BrowserCanvas;
use super::state::VaporizeEngine;
use super::types::{Tag, VaporizeConfig};

/// Delay before resampling after a font family change, so web fonts can load.
const FONT_SETTLE_MS: i32 = 1000;

const WRAPPER_STYLE: &str = "width: 100%; height: 100%; pointer-events: none;";
const CANVAS_STYLE: &str = "display: block; width: 100%; height: 100%; pointer-events: none;";
const SEO_STYLE: &str =
	"position: absolute; width: 0; height: 0; overflow: hidden; user-select: none; pointer-events: none;";

type Shared<T> = Rc<RefCell<T>>;

/// Browser callbacks that must stay alive while they are registered.
#[derive(Default)]
struct Observers {
	intersection: Option<(IntersectionObserver, Closure<dyn FnMut(js_sys::Array)>)>,
	resize: Option<(ResizeObserver, Closure<dyn FnMut(js_sys::Array)>)>,
	font_timer: Option<(i32, Closure<dyn FnMut()>)>,
}

/// Handles shared by the frame loop, the observers and the font timer.
#[derive(Clone, Default)]
struct Runtime {
	engine: Shared<Option<VaporizeEngine<BrowserCanvas>>>,
	animate: Shared<Option<Closure<dyn FnMut(f64)>>>,
	frame_id: Shared<Option<i32>>,
	last_time: Shared<Option<f64>>,
	observers: Shared<Observers>,
}

impl Runtime {
	/// Schedule the next frame unless one is already pending.
	fn request_frame(&self) {
		if self.frame_id.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let id = match self.animate.borrow().as_ref() {
			Some(cb) => window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.ok(),
			None => None,
		};
		*self.frame_id.borrow_mut() = id;
	}

	/// Cancel a pending frame. The next frame after a restart has `dt = 0`.
	fn cancel_frame(&self) {
		if let Some(id) = self.frame_id.borrow_mut().take() {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(id);
			}
		}
		*self.last_time.borrow_mut() = None;
	}

	/// Stop everything once the canvas has left the document.
	///
	/// The engine and every callback are released so the closures stop
	/// keeping each other alive. The caller may be one of those closures, so
	/// they are dropped from a zero-delay timeout after it returns.
	fn teardown(&self) {
		debug!("vaporize: canvas detached, stopping");
		self.cancel_frame();
		let observers = std::mem::take(&mut *self.observers.borrow_mut());
		if let Some((observer, _)) = observers.intersection.as_ref() {
			observer.disconnect();
		}
		if let Some((observer, _)) = observers.resize.as_ref() {
			observer.disconnect();
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some((id, _)) = observers.font_timer.as_ref() {
			window.clear_timeout_with_handle(*id);
		}

		let released = (
			self.engine.borrow_mut().take(),
			self.animate.borrow_mut().take(),
			observers,
		);
		let release = Closure::once_into_js(move || drop(released));
		if let Err(e) = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(release.unchecked_ref(), 0)
		{
			warn!("vaporize: could not release callbacks: {:?}", e);
		}
	}

	fn install_frame_loop(&self) {
		let rt = self.clone();
		*self.animate.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			*rt.frame_id.borrow_mut() = None;
			let dt = rt
				.last_time
				.borrow_mut()
				.replace(timestamp)
				.map(|last| (timestamp - last) / 1000.0)
				.unwrap_or(0.0);

			let keep_going = {
				let mut slot = rt.engine.borrow_mut();
				let Some(engine) = slot.as_mut() else {
					return;
				};
				if !engine.surface().is_connected() {
					drop(slot);
					rt.teardown();
					return;
				}
				engine.step(dt);
				engine.wants_frames()
			};

			if keep_going {
				rt.request_frame();
			} else {
				*rt.last_time.borrow_mut() = None;
			}
		}));
	}

	fn on_visibility(&self, visible: bool) {
		let wants = match self.engine.borrow_mut().as_mut() {
			Some(engine) => engine.set_visible(visible),
			None => false,
		};
		if wants {
			self.request_frame();
		} else {
			self.cancel_frame();
		}
	}

	fn on_resize(&self, width: f64, height: f64) {
		let (wants, detached) = match self.engine.borrow_mut().as_mut() {
			Some(engine) if !engine.surface().is_connected() => (false, true),
			Some(engine) if !engine.is_complete() => {
				engine.surface().set_css_size(width, height);
				(engine.resize(width, height), false)
			}
			_ => (false, false),
		};
		if detached {
			self.teardown();
		} else if wants {
			self.request_frame();
		}
	}

	fn observe(&self, target: &Element) {
		let rt = self.clone();
		let on_intersect = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
			let visible = entries
				.iter()
				.filter_map(|e| e.dyn_into::<IntersectionObserverEntry>().ok())
				.any(|e| e.is_intersecting());
			rt.on_visibility(visible);
		});
		match IntersectionObserver::new(on_intersect.as_ref().unchecked_ref()) {
			Ok(observer) => {
				observer.observe(target);
				self.observers.borrow_mut().intersection = Some((observer, on_intersect));
			}
			Err(e) => {
				// Without visibility information, just run.
				warn!("vaporize: IntersectionObserver unavailable: {:?}", e);
				self.on_visibility(true);
			}
		}

		let rt = self.clone();
		let on_resize = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
			let Some(entry) = entries
				.iter()
				.filter_map(|e| e.dyn_into::<ResizeObserverEntry>().ok())
				.last()
			else {
				return;
			};
			let rect = entry.content_rect();
			rt.on_resize(rect.width(), rect.height());
		});
		match ResizeObserver::new(on_resize.as_ref().unchecked_ref()) {
			Ok(observer) => {
				observer.observe(target);
				self.observers.borrow_mut().resize = Some((observer, on_resize));
			}
			Err(e) => warn!("vaporize: ResizeObserver unavailable: {:?}", e),
		}
	}

	/// Rebuild particles after [`FONT_SETTLE_MS`], replacing any pending rebuild.
	fn schedule_rebuild(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		let mut observers = self.observers.borrow_mut();
		if let Some((id, _)) = observers.font_timer.take() {
			window.clear_timeout_with_handle(id);
		}

		let rt = self.clone();
		let callback = Closure::<dyn FnMut()>::new(move || {
			let wants = rt
				.engine
				.borrow_mut()
				.as_mut()
				.is_some_and(|engine| engine.rebuild());
			if wants {
				rt.request_frame();
			}
		});
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(
			callback.as_ref().unchecked_ref(),
			FONT_SETTLE_MS,
		) {
			Ok(id) => observers.font_timer = Some((id, callback)),
			Err(e) => warn!("vaporize: could not schedule font reload: {:?}", e),
		}
	}
}

/// `Math.random()` carries 53 bits of randomness.
const SEED_RANGE: f64 = 9_007_199_254_740_992.0;

fn seed_from_unit(r: f64) -> u64 {
	(r.clamp(0.0, 1.0) * SEED_RANGE) as u64
}

fn random_seed() -> u64 {
	seed_from_unit(js_sys::Math::random())
}

/// Renders text that vaporizes into particles when scrolled into view.
///
/// The canvas fills its parent; give the parent a size. Configuration changes
/// resample the text unless the animation has already finished, and a font
/// family change triggers one more resample after a short delay so that web
/// fonts have time to load.
#[component]
pub fn VaporizeText(#[prop(into)] config: Signal<VaporizeConfig>) -> impl IntoView {
	let wrapper_ref = NodeRef::<leptos::html::Div>::new();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let runtime = Runtime::default();

	Effect::new(move |_| {
		let config = config.get();
		let (Some(canvas), Some(wrapper)) = (canvas_ref.get(), wrapper_ref.get()) else {
			return;
		};
		let Some(host) = BrowserHost::current() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let wrapper: Element = wrapper.into();

		let mut slot = runtime.engine.borrow_mut();
		if let Some(engine) = slot.as_mut() {
			let font_changed = engine.reconfigure(config, &host);
			drop(slot);
			if font_changed {
				runtime.schedule_rebuild();
			}
			return;
		}

		let family = config.font.family.clone();
		let mut engine = VaporizeEngine::new(BrowserCanvas::new(canvas), config, &host, random_seed());
		let font_changed = engine.note_font_family(&family);
		let (width, height) = (wrapper.client_width() as f64, wrapper.client_height() as f64);
		engine.surface().set_css_size(width, height);
		engine.resize(width, height);
		*slot = Some(engine);
		drop(slot);

		runtime.install_frame_loop();
		runtime.observe(&wrapper);
		if font_changed {
			runtime.schedule_rebuild();
		}
	});

	view! {
		<div node_ref=wrapper_ref class="vaporize-text" style=WRAPPER_STYLE>
			<canvas node_ref=canvas_ref style=CANVAS_STYLE />
			<SeoText config=config />
		</div>
	}
}

/// Crawler-visible copy of the texts, hidden from view.
#[component]
fn SeoText(#[prop(into)] config: Signal<VaporizeConfig>) -> impl IntoView {
	move || {
		let config = config.get();
		let text = config.joined_texts();
		match config.tag {
			Tag::H1 => view! { <h1 style=SEO_STYLE>{text}</h1> }.into_any(),
			Tag::H2 => view! { <h2 style=SEO_STYLE>{text}</h2> }.into_any(),
			Tag::H3 => view! { <h3 style=SEO_STYLE>{text}</h3> }.into_any(),
			Tag::P | Tag::Unknown => view! { <p style=SEO_STYLE>{text}</p> }.into_any(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seeds_span_the_53_bit_range() {
		assert_eq!(seed_from_unit(0.0), 0);
		assert_eq!(seed_from_unit(0.5), 1 << 52);
		assert_eq!(seed_from_unit(1.0), 1 << 53);
		assert!(seed_from_unit(0.999_999_999_999) < 1 << 53);
	}

	#[test]
	fn canvas_is_block_level_so_it_adds_no_line_gap() {
		assert!(CANVAS_STYLE.contains("display: block"));
		assert!(!WRAPPER_STYLE.contains("display: inline"));
	}
}
