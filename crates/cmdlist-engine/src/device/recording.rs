use std::collections::HashMap;

use crate::address::{AddressRange, AddressTable, DeviceAddress, ResourceId, ResourceKind};
use crate::handle::{CommandListId, FramebufferId, ProgramHandle, StateObjectId, TokenBufferId};
use crate::scene::Segment;
use crate::state::{Capability, GraphicsState, VertexAttribute};
use crate::token::{IndexType, PrimitiveMode, ShaderStage, Token, TokenFormat, TokenReader};

use super::{BufferAllocator, BufferUsage, CommandListExt, Device, execute_token};

/// Header words reported by the recording driver.
const HARDWARE_HEADERS: [u32; 4] = [0x4e56_0010, 0x4e56_0011, 0x4e56_0012, 0x4e56_0013];
const HARDWARE_STAGES: [u16; 3] = [0x20, 0x21, 0x22];

/// Everything a [`RecordingDevice`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    BindFramebuffer(Option<FramebufferId>),
    SetCapability(Capability, bool),
    SetVertexAttribute(u32, Option<VertexAttribute>),
    SetVertexStride(u32),
    UseProgram(Option<ProgramHandle>),
    BindUniform {
        stage: ShaderStage,
        slot: u16,
        range: AddressRange,
    },
    BindVertexBuffer {
        binding: u32,
        address: DeviceAddress,
    },
    BindIndexBuffer {
        index_type: IndexType,
        address: DeviceAddress,
    },
    /// Carries the state the draw executed with.
    DrawIndexed {
        mode: PrimitiveMode,
        count: u32,
        state: GraphicsState,
    },
    CaptureState(StateObjectId),
    /// The driver switched to a captured state object.
    ApplyState(StateObjectId),
    UploadTokens(TokenBufferId),
    DrawCommandsStates(TokenBufferId),
    CompileList(CommandListId),
    CallList(CommandListId),
    DeleteList(CommandListId),
}

impl DeviceCommand {
    /// Binds and draws; what ends up on screen.
    pub fn is_draw_work(&self) -> bool {
        matches!(
            self,
            DeviceCommand::BindUniform { .. }
                | DeviceCommand::BindVertexBuffer { .. }
                | DeviceCommand::BindIndexBuffer { .. }
                | DeviceCommand::DrawIndexed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceCounters {
    pub draws: u64,
    pub state_captures: u64,
    pub token_uploads: u64,
    pub list_compiles: u64,
    pub list_calls: u64,
    pub buffer_replays: u64,
}

#[derive(Debug, Clone)]
struct CapturedState {
    state: GraphicsState,
    mode: PrimitiveMode,
}

/// Segment resolved against the state objects at compile time.
#[derive(Debug, Clone)]
struct CompiledSegment {
    framebuffer: FramebufferId,
    state_id: StateObjectId,
    state: GraphicsState,
    mode: PrimitiveMode,
    tokens: Vec<Token>,
}

#[derive(Debug, Default)]
struct Extension {
    format: TokenFormat,
    states: Vec<Option<CapturedState>>,
    token_buffers: HashMap<TokenBufferId, Vec<u8>>,
    next_token_buffer: u32,
    /// `None` until the list is first compiled.
    lists: HashMap<CommandListId, Option<Vec<CompiledSegment>>>,
    next_list: u32,
}

impl Extension {
    fn captured(&self, id: StateObjectId) -> &CapturedState {
        id.0.checked_sub(1)
            .and_then(|i| self.states.get(i as usize))
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("segment references {id}, which was never captured"))
    }

    /// Decodes and resolves segments the way the driver would at compile time.
    fn compile(&self, tokens: &[u8], segments: &[Segment]) -> Vec<CompiledSegment> {
        segments
            .iter()
            .map(|segment| {
                let captured = self.captured(segment.state);
                let decoded = TokenReader::with_base(&self.format, &tokens[segment.range()], segment.offset)
                    .map(|item| match item {
                        Ok((_, token)) => token,
                        Err(err) => panic!("driver rejected token stream: {err}"),
                    })
                    .collect();
                CompiledSegment {
                    framebuffer: segment.framebuffer,
                    state_id: segment.state,
                    state: captured.state.clone(),
                    mode: captured.mode,
                    tokens: decoded,
                }
            })
            .collect()
    }
}

/// Host-only device that records every command.
///
/// Bound addresses are checked for residency against the device's own
/// [`AddressTable`]; touching a non-resident range panics. With
/// [`RecordingDevice::with_command_list`] it also emulates a driver
/// command-list extension with opaque token headers.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    addresses: AddressTable,
    state: GraphicsState,
    framebuffer: Option<FramebufferId>,
    index_bound: bool,
    log: Vec<DeviceCommand>,
    counters: DeviceCounters,
    next_program: u32,
    next_framebuffer: u32,
    extension: Option<Extension>,
}

impl RecordingDevice {
    /// Device without command-list support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device exposing the command-list extension.
    pub fn with_command_list() -> Self {
        Self {
            extension: Some(Extension {
                format: TokenFormat::hardware(HARDWARE_HEADERS, HARDWARE_STAGES),
                ..Default::default()
            }),
            ..Self::default()
        }
    }

    /// Hands out a fresh program handle, standing in for a compile.
    pub fn create_program(&mut self) -> ProgramHandle {
        self.next_program += 1;
        ProgramHandle(self.next_program)
    }

    pub fn create_framebuffer(&mut self) -> FramebufferId {
        self.next_framebuffer += 1;
        FramebufferId(self.next_framebuffer)
    }

    #[inline]
    pub fn log(&self) -> &[DeviceCommand] {
        &self.log
    }

    pub fn take_log(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.log)
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Binds and draws from the log, in order.
    pub fn draw_work(&self) -> Vec<DeviceCommand> {
        self.log.iter().filter(|c| c.is_draw_work()).cloned().collect()
    }

    #[inline]
    pub fn counters(&self) -> DeviceCounters {
        self.counters
    }

    #[inline]
    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    /// Command lists created and not yet deleted.
    pub fn live_command_lists(&self) -> usize {
        self.extension.as_ref().map_or(0, |ext| ext.lists.len())
    }

    /// Driver-side snapshot of a captured state object.
    pub fn captured_state(&self, id: StateObjectId) -> Option<&GraphicsState> {
        let ext = self.extension.as_ref()?;
        let slot = ext.states.get(id.0.checked_sub(1)? as usize)?;
        slot.as_ref().map(|c| &c.state)
    }

    fn check_resident(&self, what: &str, address: DeviceAddress, size: u64) {
        assert!(
            self.addresses.is_resident_range(address, size),
            "{what} at {address} (+{size} bytes) references a non-resident resource"
        );
    }

    fn run_segments(&mut self, segments: &[CompiledSegment]) {
        for segment in segments {
            if self.framebuffer != Some(segment.framebuffer) {
                self.bind_framebuffer(Some(segment.framebuffer));
            }
            self.state = segment.state.clone();
            self.log.push(DeviceCommand::ApplyState(segment.state_id));

            for token in &segment.tokens {
                if let Token::DrawIndexed { mode, .. } = token {
                    debug_assert_eq!(
                        *mode, segment.mode,
                        "draw mode does not match the mode {} was captured with",
                        segment.state_id
                    );
                }
                execute_token(self, token);
            }
        }
    }

    fn extension(&self) -> &Extension {
        self.extension
            .as_ref()
            .expect("command-list entry points are only reachable through command_list()")
    }

    fn extension_mut(&mut self) -> &mut Extension {
        self.extension
            .as_mut()
            .expect("command-list entry points are only reachable through command_list()")
    }
}

impl Device for RecordingDevice {
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.framebuffer = framebuffer;
        self.log.push(DeviceCommand::BindFramebuffer(framebuffer));
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        match capability {
            Capability::DepthTest => self.state.depth_test = enabled,
            Capability::CullFace => self.state.cull_face = enabled,
        }
        self.log.push(DeviceCommand::SetCapability(capability, enabled));
    }

    fn set_vertex_attribute(&mut self, location: u32, attribute: Option<VertexAttribute>) {
        self.state.attributes[location as usize] = attribute;
        self.log.push(DeviceCommand::SetVertexAttribute(location, attribute));
    }

    fn set_vertex_stride(&mut self, stride: u32) {
        self.state.vertex_stride = stride;
        self.log.push(DeviceCommand::SetVertexStride(stride));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.state.program = program;
        self.log.push(DeviceCommand::UseProgram(program));
    }

    fn bind_uniform(&mut self, stage: ShaderStage, slot: u16, range: AddressRange) {
        self.check_resident("uniform block", range.address, range.size);
        self.log.push(DeviceCommand::BindUniform { stage, slot, range });
    }

    fn bind_vertex_buffer(&mut self, binding: u32, address: DeviceAddress) {
        self.check_resident("vertex buffer", address, 1);
        self.log.push(DeviceCommand::BindVertexBuffer { binding, address });
    }

    fn bind_index_buffer(&mut self, index_type: IndexType, address: DeviceAddress) {
        self.check_resident("index buffer", address, 1);
        self.index_bound = true;
        self.log.push(DeviceCommand::BindIndexBuffer { index_type, address });
    }

    fn draw_indexed(&mut self, mode: PrimitiveMode, count: u32) {
        assert!(self.index_bound, "indexed draw without an index buffer");
        self.counters.draws += 1;
        self.log.push(DeviceCommand::DrawIndexed {
            mode,
            count,
            state: self.state.clone(),
        });
    }

    fn read_state(&self) -> GraphicsState {
        self.state.clone()
    }

    fn command_list(&mut self) -> Option<&mut dyn CommandListExt> {
        if self.extension.is_some() {
            Some(self as &mut dyn CommandListExt)
        } else {
            None
        }
    }
}

impl CommandListExt for RecordingDevice {
    fn token_format(&self) -> TokenFormat {
        self.extension().format
    }

    fn create_state(&mut self) -> StateObjectId {
        let ext = self.extension_mut();
        ext.states.push(None);
        StateObjectId(ext.states.len() as u32)
    }

    fn capture_state(&mut self, state: StateObjectId, mode: PrimitiveMode) {
        let snapshot = CapturedState {
            state: self.state.clone(),
            mode,
        };
        let slot = state
            .0
            .checked_sub(1)
            .and_then(|i| self.extension_mut().states.get_mut(i as usize))
            .unwrap_or_else(|| panic!("{state} was not created by this driver"));
        *slot = Some(snapshot);

        self.counters.state_captures += 1;
        self.log.push(DeviceCommand::CaptureState(state));
    }

    fn create_token_buffer(&mut self, tokens: &[u8]) -> TokenBufferId {
        let ext = self.extension_mut();
        ext.next_token_buffer += 1;
        let id = TokenBufferId(ext.next_token_buffer);
        ext.token_buffers.insert(id, tokens.to_vec());

        self.counters.token_uploads += 1;
        self.log.push(DeviceCommand::UploadTokens(id));
        id
    }

    fn delete_token_buffer(&mut self, buffer: TokenBufferId) {
        self.extension_mut().token_buffers.remove(&buffer);
    }

    fn draw_commands_states(&mut self, buffer: TokenBufferId, segments: &[Segment]) {
        let ext = self.extension();
        let tokens = ext
            .token_buffers
            .get(&buffer)
            .unwrap_or_else(|| panic!("token buffer {buffer:?} does not exist"));
        let compiled = ext.compile(tokens, segments);

        self.counters.buffer_replays += 1;
        self.log.push(DeviceCommand::DrawCommandsStates(buffer));
        self.run_segments(&compiled);
    }

    fn create_command_list(&mut self) -> CommandListId {
        let ext = self.extension_mut();
        let id = CommandListId(ext.next_list);
        ext.next_list += 1;
        ext.lists.insert(id, None);
        id
    }

    fn delete_command_list(&mut self, list: CommandListId) {
        if self.extension_mut().lists.remove(&list).is_none() {
            panic!("command list {list:?} deleted twice or never created");
        }
        self.log.push(DeviceCommand::DeleteList(list));
    }

    fn compile_command_list(&mut self, list: CommandListId, tokens: &[u8], segments: &[Segment]) {
        let compiled = self.extension().compile(tokens, segments);
        let slot = self
            .extension_mut()
            .lists
            .get_mut(&list)
            .unwrap_or_else(|| panic!("command list {list:?} does not exist"));
        *slot = Some(compiled);

        self.counters.list_compiles += 1;
        self.log.push(DeviceCommand::CompileList(list));
    }

    fn call_command_list(&mut self, list: CommandListId) {
        let compiled = self
            .extension_mut()
            .lists
            .get_mut(&list)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("command list {list:?} called before it was compiled"));

        self.counters.list_calls += 1;
        self.log.push(DeviceCommand::CallList(list));
        self.run_segments(&compiled);

        if let Some(slot) = self.extension_mut().lists.get_mut(&list) {
            *slot = Some(compiled);
        }
    }
}

impl BufferAllocator for RecordingDevice {
    fn create_buffer(&mut self, label: &str, _usage: BufferUsage, contents: &[u8]) -> ResourceId {
        let id = self
            .addresses
            .register(ResourceKind::Buffer, contents.len() as u64);
        log::trace!("recording buffer {label:?} ({} bytes) as {id}", contents.len());
        id
    }

    fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    fn addresses_mut(&mut self) -> &mut AddressTable {
        &mut self.addresses
    }
}
