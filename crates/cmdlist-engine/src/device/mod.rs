//! Device abstraction.
//!
//! [`Device`] is the immediate-mode binding and draw API every backend can
//! fall back to. Devices that also expose driver command lists return a
//! [`CommandListExt`] from [`Device::command_list`].
//!
//! Implementations:
//! - [`RecordingDevice`]: host-only device that logs every command
//! - [`gpu::WgpuDevice`]: wgpu-backed device without command-list support

mod recording;
pub mod gpu;

pub use recording::{DeviceCommand, DeviceCounters, RecordingDevice};

use crate::address::{AddressRange, AddressTable, DeviceAddress, ResourceId};
use crate::handle::{CommandListId, FramebufferId, ProgramHandle, StateObjectId, TokenBufferId};
use crate::scene::Segment;
use crate::state::{Capability, GraphicsState, VertexAttribute};
use crate::token::{IndexType, PrimitiveMode, ShaderStage, Token, TokenFormat};

/// Immediate-mode device API.
pub trait Device {
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn set_capability(&mut self, capability: Capability, enabled: bool);
    fn set_vertex_attribute(&mut self, location: u32, attribute: Option<VertexAttribute>);
    fn set_vertex_stride(&mut self, stride: u32);
    fn use_program(&mut self, program: Option<ProgramHandle>);

    fn bind_uniform(&mut self, stage: ShaderStage, slot: u16, range: AddressRange);
    fn bind_vertex_buffer(&mut self, binding: u32, address: DeviceAddress);
    fn bind_index_buffer(&mut self, index_type: IndexType, address: DeviceAddress);
    fn draw_indexed(&mut self, mode: PrimitiveMode, count: u32);

    /// Reads back the current fixed-function and program state.
    fn read_state(&self) -> GraphicsState;

    /// Command-list extension, if the driver has one.
    fn command_list(&mut self) -> Option<&mut dyn CommandListExt> {
        None
    }
}

/// Driver command-list extension.
///
/// State objects, token buffers and lists created here belong to the driver.
pub trait CommandListExt {
    /// Header words and stage indices the driver expects in token streams.
    fn token_format(&self) -> TokenFormat;

    fn create_state(&mut self) -> StateObjectId;

    /// Compiles the device's current state into `state`.
    fn capture_state(&mut self, state: StateObjectId, mode: PrimitiveMode);

    /// Uploads token bytes to device memory.
    fn create_token_buffer(&mut self, tokens: &[u8]) -> TokenBufferId;
    fn delete_token_buffer(&mut self, buffer: TokenBufferId);

    /// Executes `segments` straight from an uploaded token buffer.
    fn draw_commands_states(&mut self, buffer: TokenBufferId, segments: &[Segment]);

    fn create_command_list(&mut self) -> CommandListId;
    fn delete_command_list(&mut self, list: CommandListId);

    /// (Re)compiles `list` from host token bytes.
    fn compile_command_list(&mut self, list: CommandListId, tokens: &[u8], segments: &[Segment]);
    fn call_command_list(&mut self, list: CommandListId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    Uniform,
}

/// Buffer creation for scene setup.
///
/// Created buffers are registered with the device's address table but are
/// not resident until pinned.
pub trait BufferAllocator {
    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> ResourceId;
    fn addresses(&self) -> &AddressTable;
    fn addresses_mut(&mut self) -> &mut AddressTable;
}

/// Issues the immediate-mode equivalent of one token.
pub fn execute_token(device: &mut dyn Device, token: &Token) {
    match *token {
        Token::BindUniform { slot, stage, range } => device.bind_uniform(stage, slot, range),
        Token::BindVertexBuffer { binding, address } => device.bind_vertex_buffer(binding, address),
        Token::BindIndexBuffer { index_type, address } => {
            device.bind_index_buffer(index_type, address)
        }
        Token::DrawIndexed { count, mode } => device.draw_indexed(mode, count),
    }
}
