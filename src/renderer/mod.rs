//! Pick renderers.
//!
//! [`picking`] draws proxies on the GPU with wgpu. [`software`] rasterizes
//! the same proxies on the CPU with identical ordering rules, for tests and
//! headless tools without an adapter.

pub mod picking;
pub mod software;
