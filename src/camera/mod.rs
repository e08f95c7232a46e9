//! Camera used to turn cursor positions into pick rays and to render pick
//! proxies.
//!
//! Supports the orthographic and perspective projections an editor viewport
//! toggles between.

/// Core camera struct and GPU uniform types.
pub mod core;
