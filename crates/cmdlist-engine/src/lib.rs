//! Command-list engine crate.
//!
//! Encodes a scene of indexed draws into a token stream once and replays it
//! every frame through one of several draw strategies, rebuilding lazily
//! when programs or the render target change.

pub mod address;
pub mod device;
pub mod handle;
pub mod program;
pub mod replay;
pub mod scene;
pub mod state;
pub mod token;
pub mod version;

pub mod logging;
