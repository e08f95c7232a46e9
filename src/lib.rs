// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Test code may unwrap
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! GPU picking and snapping for interactive 3D scene editors.
//!
//! Snapping targets (points, axes, planes, faces, edges, curves) are drawn
//! as flat-colored proxies into an offscreen id buffer. The pixel under the
//! cursor names the snap, and the snap projects the cursor onto itself.
//!
//! # Key entry points
//!
//! - [`interaction::InteractionAdapter`] - resolves the cursor against the
//!   active interaction, the geometry cache and the visible model
//! - [`cache::GeometryCache`] - pick proxies for the editor's registered
//!   snaps
//! - [`nearby::NearbyPicker`] - point snaps within a pixel radius, one frame
//!   behind the cursor
//! - [`codec::SnapIdCodec`] - the 32-bit id encoding shared by every pass
//! - [`options::Options`] - proxy sizes, radius, camera and debug toggles
//!
//! # Backends
//!
//! [`viewport::PickViewport`] abstracts the render target.
//! [`renderer::picking::GpuViewport`] renders with wgpu;
//! [`renderer::software::SoftwareViewport`] rasterizes on the CPU with the
//! same draw order.

pub mod cache;
pub mod camera;
pub mod codec;
pub mod error;
pub mod gpu;
pub mod interaction;
pub mod nearby;
pub mod options;
pub mod proxy;
pub mod registry;
pub mod renderer;
pub mod snap;
pub mod viewport;
