//! Replay of a scene through interchangeable draw strategies.
//!
//! [`TokenRenderer`] owns the token sequence and the captured state objects
//! and rebuilds them lazily when the live [`ChangeVersion`] moves. Each
//! [`DrawMode`] is a separate strategy consuming the same data:
//! - `Direct`: per-object immediate binds and draws, no tokens
//! - `HardwareList`: driver-compiled command list, one call per frame
//! - `BufferReplay`: uploaded token buffer replayed by segment arrays
//! - `SoftwareEmulation`: host walks the tokens and applies state diffs
//!
//! [`ChangeVersion`]: crate::version::ChangeVersion

mod backend;
mod buffer;
mod config;
mod direct;
mod emulated;
mod list;
mod mode;
mod renderer;
mod stats;

pub use config::ReplayConfig;
pub use mode::{DrawMode, SelectError};
pub use renderer::{FrameContext, TokenRenderer};
pub use stats::ReplayStats;
