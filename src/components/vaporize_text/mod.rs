//! Particle text vaporization effect.
//!
//! Renders a string on an HTML canvas, samples it into per-pixel particles,
//! and sweeps a vaporize wave across it:
//! - Off-screen rasterization and DPR-aware pixel sampling
//! - Per-particle physics with damping, jitter and fade
//! - Optional cycling through several texts with fade-in and wait phases
//! - Pausing while scrolled out of view, resampling on resize and font load
//!
//! The physics and sampling live in [`VaporizeEngine`], which is independent
//! of the browser and can be driven by any [`CanvasSurface`].
//!
//! # Example
//!
//! ```ignore
//! use vaporize_text::{VaporizeConfig, VaporizeText};
//!
//! let config = VaporizeConfig {
//!     texts: vec!["Hello".into()],
//!     ..VaporizeConfig::default()
//! };
//!
//! view! { <VaporizeText config=config /> }
//! ```

mod component;
pub mod host;
mod particles;
mod render;
mod sampler;
pub mod scale;
mod state;
#[cfg(test)]
mod testing;
pub mod theme;
mod types;

pub use component::VaporizeText;
pub use host::{BrowserHost, HeadlessHost, HostEnvironment};
pub use particles::{Particle, ParticlePhase, update_particles};
pub use render::{BrowserCanvas, CanvasSurface, TextStyle};
pub use sampler::{PixelBuffer, RasterRequest, SampledText, TextBoundaries};
pub use state::{AnimationPhase, FrameOutcome, VaporizeEngine};
pub use theme::Color;
pub use types::{Alignment, AnimationTiming, Direction, FontSpec, Tag, VaporizeConfig};
