//! UI components.

pub mod vaporize_text;
