use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::address::{AddressRange, AddressTable, DeviceAddress, ResourceId, ResourceKind};
use crate::device::{BufferAllocator, BufferUsage, Device};
use crate::handle::{FramebufferId, ProgramHandle};
use crate::state::{Capability, GraphicsState, VertexAttribute};
use crate::token::{IndexType, PrimitiveMode, ShaderStage};

use super::HeadlessGpu;
use super::pipeline::{PipelineCache, PipelineKey, Program, index_format};

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Uniform slots map to bind groups of the same index.
const UNIFORM_SLOTS: usize = 2;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.13,
    b: 0.2,
    a: 1.0,
};

struct Framebuffer {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    /// Cleared by the first pass of the current frame.
    cleared: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct UniformBinding {
    resource: ResourceId,
    offset: u64,
    size: u64,
}

/// One queued draw with every binding resolved.
///
/// Equal draw lists imply identical GPU work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDraw {
    pub framebuffer: FramebufferId,
    pub pipeline: usize,
    /// `(bind group, dynamic offset)` per uniform slot.
    pub uniforms: [(usize, u32); UNIFORM_SLOTS],
    pub vertex: (ResourceId, u64),
    pub index: (ResourceId, u64, IndexType),
    pub count: u32,
}

/// [`Device`] implementation on wgpu.
///
/// Addresses are mapped back to buffers through the device's address table.
/// Uniform binds become dynamic-offset bind groups; the offset of every
/// bound range must therefore be a multiple of the adapter's uniform offset
/// alignment. Geometry-stage binds are accepted and folded into the slot's
/// binding, since wgpu has no geometry stage.
pub struct WgpuDevice {
    gpu: HeadlessGpu,
    addresses: AddressTable,
    buffers: HashMap<ResourceId, wgpu::Buffer>,
    programs: HashMap<ProgramHandle, Program>,
    next_program: u32,
    framebuffers: HashMap<FramebufferId, Framebuffer>,
    next_framebuffer: u32,

    uniform_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: PipelineCache,
    bind_groups: Vec<wgpu::BindGroup>,
    bind_group_keys: HashMap<(usize, ResourceId, u64), usize>,

    // shadow state
    state: GraphicsState,
    framebuffer: Option<FramebufferId>,
    uniforms: [Option<UniformBinding>; UNIFORM_SLOTS],
    vertex: Option<(ResourceId, u64)>,
    index: Option<(ResourceId, u64, IndexType)>,

    queued: Vec<ResolvedDraw>,
    submitted: Vec<ResolvedDraw>,
    warned_geometry: bool,
    warned_incomplete: bool,
}

impl WgpuDevice {
    pub fn new(gpu: HeadlessGpu) -> Self {
        let uniform_layouts: Vec<wgpu::BindGroupLayout> = (0..UNIFORM_SLOTS)
            .map(|slot| {
                gpu.device()
                    .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some(&format!("cmdlist uniform slot {slot} bgl")),
                        entries: &[wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: true,
                                min_binding_size: None,
                            },
                            count: None,
                        }],
                    })
            })
            .collect();

        let layout_refs: Vec<&wgpu::BindGroupLayout> = uniform_layouts.iter().collect();
        let pipeline_layout = gpu
            .device()
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cmdlist scene pipeline layout"),
                bind_group_layouts: &layout_refs,
                immediate_size: 0,
            });

        Self {
            gpu,
            addresses: AddressTable::new(),
            buffers: HashMap::new(),
            programs: HashMap::new(),
            next_program: 0,
            framebuffers: HashMap::new(),
            next_framebuffer: 0,
            uniform_layouts,
            pipeline_layout,
            pipelines: PipelineCache::default(),
            bind_groups: Vec::new(),
            bind_group_keys: HashMap::new(),
            state: GraphicsState::default(),
            framebuffer: None,
            uniforms: [None; UNIFORM_SLOTS],
            vertex: None,
            index: None,
            queued: Vec::new(),
            submitted: Vec::new(),
            warned_geometry: false,
            warned_incomplete: false,
        }
    }

    #[inline]
    pub fn gpu(&self) -> &HeadlessGpu {
        &self.gpu
    }

    /// Compiles a WGSL program.
    pub fn create_program(
        &mut self,
        label: &str,
        source: &str,
        vertex_entry: &str,
        fragment_entry: &str,
    ) -> ProgramHandle {
        let module = self
            .gpu
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });

        self.next_program += 1;
        let handle = ProgramHandle(self.next_program);
        self.programs.insert(
            handle,
            Program {
                module,
                vertex_entry: vertex_entry.to_owned(),
                fragment_entry: fragment_entry.to_owned(),
            },
        );
        log::debug!("created program {label:?} as {handle:?}");
        handle
    }

    /// Drops a program and every pipeline built from it.
    pub fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.pipelines.evict_program(program);
    }

    /// Creates color and depth attachments of the given size.
    pub fn create_framebuffer(&mut self, width: u32, height: u32) -> FramebufferId {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let attachment = |label: &str, format: wgpu::TextureFormat| {
            self.gpu
                .device()
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };
        let color_view = attachment("cmdlist color", COLOR_FORMAT);
        let depth_view = attachment("cmdlist depth", DEPTH_FORMAT);

        self.next_framebuffer += 1;
        let id = FramebufferId(self.next_framebuffer);
        self.framebuffers.insert(
            id,
            Framebuffer {
                color_view,
                depth_view,
                cleared: false,
            },
        );
        log::debug!("created {id} ({width}x{height})");
        id
    }

    pub fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.framebuffer == Some(framebuffer) {
            self.framebuffer = None;
        }
        self.framebuffers.remove(&framebuffer);
    }

    /// Updates buffer contents through the queue.
    pub fn write_buffer(&self, resource: ResourceId, offset: u64, data: &[u8]) {
        let Some(buffer) = self.buffers.get(&resource) else {
            log::warn!("write to unknown {resource} ignored");
            return;
        };
        self.gpu.queue().write_buffer(buffer, offset, data);
    }

    /// Starts a frame: the next pass into each framebuffer clears it.
    pub fn begin_frame(&mut self) {
        for fb in self.framebuffers.values_mut() {
            fb.cleared = false;
        }
        self.submitted.clear();
    }

    /// Encodes and submits every queued draw.
    pub fn submit(&mut self) {
        let draws = std::mem::take(&mut self.queued);
        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cmdlist frame encoder"),
            });

        let mut start = 0;
        while start < draws.len() {
            let framebuffer = draws[start].framebuffer;
            let end = draws[start..]
                .iter()
                .position(|d| d.framebuffer != framebuffer)
                .map_or(draws.len(), |n| start + n);

            let Some(fb) = self.framebuffers.get_mut(&framebuffer) else {
                log::warn!("draws into destroyed {framebuffer} dropped");
                start = end;
                continue;
            };
            let (color_load, depth_load) = if fb.cleared {
                (wgpu::LoadOp::Load, wgpu::LoadOp::Load)
            } else {
                (wgpu::LoadOp::Clear(CLEAR_COLOR), wgpu::LoadOp::Clear(1.0))
            };
            fb.cleared = true;

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cmdlist scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &fb.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &fb.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // Redundant pipeline and bind group changes are skipped.
            let mut last_pipeline = None;
            let mut last_uniforms = [None; UNIFORM_SLOTS];
            for draw in &draws[start..end] {
                if last_pipeline != Some(draw.pipeline) {
                    rpass.set_pipeline(self.pipelines.get(draw.pipeline));
                    last_pipeline = Some(draw.pipeline);
                }
                for (slot, &(group, offset)) in draw.uniforms.iter().enumerate() {
                    if last_uniforms[slot] != Some((group, offset)) {
                        rpass.set_bind_group(slot as u32, &self.bind_groups[group], &[offset]);
                        last_uniforms[slot] = Some((group, offset));
                    }
                }
                let (vbo, voff) = draw.vertex;
                let (ibo, ioff, index_type) = draw.index;
                rpass.set_vertex_buffer(0, self.buffers[&vbo].slice(voff..));
                rpass.set_index_buffer(self.buffers[&ibo].slice(ioff..), index_format(index_type));
                rpass.draw_indexed(0..draw.count, 0, 0..1);
            }

            drop(rpass);
            start = end;
        }

        self.gpu.queue().submit(std::iter::once(encoder.finish()));
        self.submitted.extend(draws);
    }

    /// Draws submitted since [`WgpuDevice::begin_frame`].
    pub fn frame_draws(&self) -> &[ResolvedDraw] {
        &self.submitted
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn resolve_buffer(&self, what: &str, address: DeviceAddress) -> (ResourceId, u64) {
        self.addresses.lookup(address).unwrap_or_else(|| {
            panic!("{what} at {address} references a non-resident resource")
        })
    }

    fn bind_group(&mut self, slot: usize, binding: UniformBinding) -> usize {
        let key = (slot, binding.resource, binding.size);
        if let Some(&index) = self.bind_group_keys.get(&key) {
            return index;
        }

        let buffer = &self.buffers[&binding.resource];
        let group = self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("cmdlist uniform bind group"),
                layout: &self.uniform_layouts[slot],
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer,
                        offset: 0,
                        size: NonZeroU64::new(binding.size),
                    }),
                }],
            });

        let index = self.bind_groups.len();
        self.bind_groups.push(group);
        self.bind_group_keys.insert(key, index);
        index
    }

    fn warn_incomplete(&mut self, what: &str) {
        if !self.warned_incomplete {
            log::warn!("draw skipped: {what}");
            self.warned_incomplete = true;
        }
    }
}

impl Device for WgpuDevice {
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.framebuffer = framebuffer;
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        match capability {
            Capability::DepthTest => self.state.depth_test = enabled,
            Capability::CullFace => self.state.cull_face = enabled,
        }
    }

    fn set_vertex_attribute(&mut self, location: u32, attribute: Option<VertexAttribute>) {
        self.state.attributes[location as usize] = attribute;
    }

    fn set_vertex_stride(&mut self, stride: u32) {
        self.state.vertex_stride = stride;
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.state.program = program;
    }

    fn bind_uniform(&mut self, stage: ShaderStage, slot: u16, range: AddressRange) {
        let slot = slot as usize;
        assert!(slot < UNIFORM_SLOTS, "uniform slot {slot} is out of range");

        if stage == ShaderStage::Geometry && !self.warned_geometry {
            log::debug!("geometry-stage uniform binds share the slot binding on wgpu");
            self.warned_geometry = true;
        }

        let (resource, offset) = self.resolve_buffer("uniform block", range.address);
        let binding = UniformBinding {
            resource,
            offset,
            size: range.size,
        };
        debug_assert!(
            self.uniforms[slot].is_none_or(|b| b == binding || stage == ShaderStage::Vertex),
            "stages of slot {slot} bound to different ranges"
        );
        self.uniforms[slot] = Some(binding);
    }

    fn bind_vertex_buffer(&mut self, binding: u32, address: DeviceAddress) {
        assert_eq!(binding, 0, "only vertex binding 0 is supported");
        self.vertex = Some(self.resolve_buffer("vertex buffer", address));
    }

    fn bind_index_buffer(&mut self, index_type: IndexType, address: DeviceAddress) {
        let (resource, offset) = self.resolve_buffer("index buffer", address);
        self.index = Some((resource, offset, index_type));
    }

    fn draw_indexed(&mut self, mode: PrimitiveMode, count: u32) {
        let Some(framebuffer) = self.framebuffer else {
            return self.warn_incomplete("no framebuffer bound");
        };
        let Some(program) = self.state.program else {
            return self.warn_incomplete("no program bound");
        };
        let (Some(vertex), Some(index)) = (self.vertex, self.index) else {
            return self.warn_incomplete("vertex or index buffer missing");
        };
        let [Some(scene), Some(object)] = self.uniforms else {
            return self.warn_incomplete("uniform slot unbound");
        };

        let key = PipelineKey {
            program,
            depth_test: self.state.depth_test,
            cull_face: self.state.cull_face,
            attributes: self.state.attributes,
            vertex_stride: self.state.vertex_stride,
            mode,
            strip_index: (mode == PrimitiveMode::TriangleStrip).then_some(index.2),
        };
        let Some(program) = self.programs.get(&program) else {
            return self.warn_incomplete("program was destroyed");
        };
        let pipeline =
            self.pipelines
                .get_or_create(self.gpu.device(), &self.pipeline_layout, program, key);

        let uniforms = [
            (self.bind_group(0, scene), scene.offset as u32),
            (self.bind_group(1, object), object.offset as u32),
        ];

        self.queued.push(ResolvedDraw {
            framebuffer,
            pipeline,
            uniforms,
            vertex,
            index,
            count,
        });
    }

    fn read_state(&self) -> GraphicsState {
        self.state.clone()
    }
}

impl BufferAllocator for WgpuDevice {
    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> ResourceId {
        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });

        let id = self
            .addresses
            .register(ResourceKind::Buffer, contents.len() as u64);
        self.buffers.insert(id, buffer);
        id
    }

    fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    fn addresses_mut(&mut self) -> &mut AddressTable {
        &mut self.addresses
    }
}
