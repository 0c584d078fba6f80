use std::collections::HashMap;

use crate::handle::ProgramHandle;
use crate::state::{MAX_VERTEX_ATTRIBUTES, VertexAttribute, VertexFormat};
use crate::token::{IndexType, PrimitiveMode};

use super::device::{COLOR_FORMAT, DEPTH_FORMAT};

/// Compiled shader program: one module plus the entry points to use.
pub(super) struct Program {
    pub module: wgpu::ShaderModule,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

/// Everything a render pipeline is specialized on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct PipelineKey {
    pub program: ProgramHandle,
    pub depth_test: bool,
    pub cull_face: bool,
    pub attributes: [Option<VertexAttribute>; MAX_VERTEX_ATTRIBUTES],
    pub vertex_stride: u32,
    pub mode: PrimitiveMode,
    /// Only set for strip topologies, which bake the index format in.
    pub strip_index: Option<IndexType>,
}

/// Lazily created render pipelines, addressed by index once created.
#[derive(Default)]
pub(super) struct PipelineCache {
    by_key: HashMap<PipelineKey, usize>,
    pipelines: Vec<wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        program: &Program,
        key: PipelineKey,
    ) -> usize {
        if let Some(&index) = self.by_key.get(&key) {
            return index;
        }

        let attributes: Vec<wgpu::VertexAttribute> = key
            .attributes
            .iter()
            .enumerate()
            .filter_map(|(location, attr)| {
                attr.map(|a| wgpu::VertexAttribute {
                    format: vertex_format(a.format),
                    offset: u64::from(a.offset),
                    shader_location: location as u32,
                })
            })
            .collect();

        let buffers = [wgpu::VertexBufferLayout {
            array_stride: u64::from(key.vertex_stride),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("cmdlist scene pipeline"),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(program.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some(program.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: topology(key.mode),
                strip_index_format: key.strip_index.map(index_format),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull_face.then_some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "created pipeline #{} for {:?} (depth {}, cull {}, {:?})",
            self.pipelines.len(),
            key.program,
            key.depth_test,
            key.cull_face,
            key.mode
        );

        let index = self.pipelines.len();
        self.pipelines.push(pipeline);
        self.by_key.insert(key, index);
        index
    }

    #[inline]
    pub fn get(&self, index: usize) -> &wgpu::RenderPipeline {
        &self.pipelines[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Drops pipelines built from `program`, e.g. after it was replaced.
    pub fn evict_program(&mut self, program: ProgramHandle) {
        // Indices stay stable; evicted slots are simply no longer reachable.
        self.by_key.retain(|key, _| key.program != program);
    }
}

pub(super) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Snorm16x4 => wgpu::VertexFormat::Snorm16x4,
    }
}

pub(super) fn index_format(index_type: IndexType) -> wgpu::IndexFormat {
    match index_type {
        IndexType::U16 => wgpu::IndexFormat::Uint16,
        IndexType::U32 => wgpu::IndexFormat::Uint32,
    }
}

pub(super) fn topology(mode: PrimitiveMode) -> wgpu::PrimitiveTopology {
    match mode {
        PrimitiveMode::Points => wgpu::PrimitiveTopology::PointList,
        PrimitiveMode::Lines => wgpu::PrimitiveTopology::LineList,
        PrimitiveMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveMode::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_formats_match_sizes() {
        for f in [VertexFormat::Float32x2, VertexFormat::Float32x3, VertexFormat::Snorm16x4] {
            assert_eq!(vertex_format(f).size(), u64::from(f.size_bytes()));
        }
    }

    #[test]
    fn strips_are_the_only_strip_topology() {
        assert!(topology(PrimitiveMode::TriangleStrip).is_strip());
        assert!(!topology(PrimitiveMode::Triangles).is_strip());
    }
}
