//! wgpu-backed device.
//!
//! wgpu has no command-list extension, so this device only runs the direct
//! and software-emulated replay paths. Immediate-mode calls update a shadow
//! state; each draw is resolved to a pipeline, bind groups and buffer slices
//! and queued, and [`WgpuDevice::submit`] encodes the queued passes.

mod context;
mod device;
mod init;
mod pipeline;

pub use context::HeadlessGpu;
pub use device::{COLOR_FORMAT, DEPTH_FORMAT, ResolvedDraw, WgpuDevice};
pub use init::GpuInit;

/// WGSL source for the scene programs.
///
/// Entry points: `vs_main`, `fs_shaded` (simple variant) and `fs_faceted`
/// (geometry-stage variant, flat-shaded from screen-space derivatives).
pub const SCENE_SHADER: &str = include_str!("shaders/scene.wgsl");
