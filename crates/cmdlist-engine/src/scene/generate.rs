//! Deterministic scene generation.
//!
//! Objects sit on a jittered grid in the xy plane. Each one gets a box or a
//! sphere at random; objects left of the origin use the geometry-stage
//! variant. The same seed always produces the same scene.

use bytemuck::{Pod, Zeroable};

use crate::address::{AddressResolver, AddressTable, ResourceId};
use crate::device::{BufferAllocator, BufferUsage};

use super::{ObjectRecord, PipelineVariant, Scene, SceneBindings, uniform_aligned};

/// Interleaved vertex matching the default vertex layout.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub _pad: f32,
    pub normal: [i16; 4],
    pub uv: [f32; 2],
}

/// Global scene block (slot 0). Matrices are column-major.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub time: [f32; 4],
}

/// Per-object block (slot 1).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 4],
}

const _: () = assert!(core::mem::size_of::<Vertex>() == 32);
const _: () = assert!(core::mem::size_of::<SceneUniform>() == 96);
const _: () = assert!(core::mem::size_of::<ObjectUniform>() == 80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    Box,
    Sphere,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneParams {
    pub objects: usize,
    pub seed: u32,
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            objects: 1024,
            seed: 0x5eed_1234,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
    pub geometry: Geometry,
    pub variant: PipelineVariant,
}

/// Buffers backing a generated scene. All are pinned by [`build_scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBuffers {
    pub box_vertices: ResourceId,
    pub box_indices: ResourceId,
    pub sphere_vertices: ResourceId,
    pub sphere_indices: ResourceId,
    pub scene_uniform: ResourceId,
    pub object_uniforms: ResourceId,
}

impl SceneBuffers {
    pub fn all(&self) -> [ResourceId; 6] {
        [
            self.box_vertices,
            self.box_indices,
            self.sphere_vertices,
            self.sphere_indices,
            self.scene_uniform,
            self.object_uniforms,
        ]
    }

    /// Unpins and forgets every buffer. Addresses in the scene die with them.
    pub fn release(&self, table: &mut AddressTable) {
        for id in self.all() {
            table.unpin(id);
            table.release(id);
        }
    }
}

/// xorshift32; good enough for layout jitter.
struct Rng(u32);

impl Rng {
    fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Places `params.objects` objects in scene order.
pub fn layout(params: &SceneParams) -> Vec<Placement> {
    let mut rng = Rng::new(params.seed);
    let side = (params.objects as f32).sqrt().ceil().max(1.0) as usize;
    let cell = 2.0 / side as f32;

    (0..params.objects)
        .map(|i| {
            let (gx, gy) = (i % side, i / side);
            let jitter = |r: &mut Rng| (r.next_f32() - 0.5) * cell * 0.3;
            let x = -1.0 + (gx as f32 + 0.5) * cell + jitter(&mut rng);
            let y = -1.0 + (gy as f32 + 0.5) * cell + jitter(&mut rng);
            let z = rng.next_f32() - 0.5;

            let geometry = if rng.next_u32() & 1 == 0 {
                Geometry::Box
            } else {
                Geometry::Sphere
            };
            let variant = if x < 0.0 {
                PipelineVariant::GeometryStage
            } else {
                PipelineVariant::Simple
            };
            let color = [
                0.3 + 0.7 * rng.next_f32(),
                0.3 + 0.7 * rng.next_f32(),
                0.3 + 0.7 * rng.next_f32(),
                1.0,
            ];

            Placement {
                position: [x, y, z],
                scale: cell * 0.6,
                color,
                geometry,
                variant,
            }
        })
        .collect()
}

/// Creates, fills and pins every buffer, then resolves the object records.
pub fn build_scene(alloc: &mut dyn BufferAllocator, params: &SceneParams) -> (Scene, SceneBuffers) {
    let placements = layout(params);
    let cube = box_mesh();
    let sphere = sphere_mesh(16, 12);

    let object_size = core::mem::size_of::<ObjectUniform>() as u64;
    let object_stride = uniform_aligned(object_size);

    let mut object_bytes = vec![0u8; object_stride as usize * placements.len().max(1)];
    for (i, p) in placements.iter().enumerate() {
        let block = ObjectUniform {
            world: translate_scale(p.position, p.scale),
            color: p.color,
        };
        let at = i * object_stride as usize;
        object_bytes[at..at + object_size as usize].copy_from_slice(bytemuck::bytes_of(&block));
    }

    let scene_block = SceneUniform {
        view_proj: view_projection(),
        light_dir: [0.4, 0.6, 1.0, 0.0],
        time: [0.0; 4],
    };

    let buffers = SceneBuffers {
        box_vertices: alloc.create_buffer("box vbo", BufferUsage::Vertex, bytemuck::cast_slice(&cube.vertices)),
        box_indices: alloc.create_buffer("box ibo", BufferUsage::Index, bytemuck::cast_slice(&cube.indices)),
        sphere_vertices: alloc.create_buffer("sphere vbo", BufferUsage::Vertex, bytemuck::cast_slice(&sphere.vertices)),
        sphere_indices: alloc.create_buffer("sphere ibo", BufferUsage::Index, bytemuck::cast_slice(&sphere.indices)),
        scene_uniform: alloc.create_buffer("scene ubo", BufferUsage::Uniform, bytemuck::bytes_of(&scene_block)),
        object_uniforms: alloc.create_buffer("objects ubo", BufferUsage::Uniform, &object_bytes),
    };

    let table = alloc.addresses_mut();
    for id in buffers.all() {
        table.pin(id);
    }

    let box_draw = (table.resolve(buffers.box_vertices), table.resolve(buffers.box_indices), cube.indices.len() as u32);
    let sphere_draw = (
        table.resolve(buffers.sphere_vertices),
        table.resolve(buffers.sphere_indices),
        sphere.indices.len() as u32,
    );

    let objects = placements
        .iter()
        .map(|p| {
            let (vertex, index, index_count) = match p.geometry {
                Geometry::Box => box_draw,
                Geometry::Sphere => sphere_draw,
            };
            ObjectRecord {
                vertex,
                index,
                index_count,
                variant: p.variant,
            }
        })
        .collect();

    let scene = Scene {
        objects,
        bindings: SceneBindings {
            scene_uniform: table.range(buffers.scene_uniform),
            object_uniforms: table.resolve(buffers.object_uniforms),
            object_stride,
            object_size,
        },
    };

    log::debug!("generated scene with {} objects", scene.len());
    (scene, buffers)
}

/// Unit cube centered on the origin, 24 vertices.
pub fn box_mesh() -> Mesh {
    // (normal, u, v) with u x v == normal, so corners wind counter-clockwise
    // seen from outside.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut mesh = Mesh::default();
    for (n, u, v) in FACES {
        let base = mesh.vertices.len() as u32;
        for (su, sv) in CORNERS {
            let position = [0, 1, 2].map(|k| 0.5 * (n[k] + su * u[k] + sv * v[k]));
            mesh.vertices.push(Vertex {
                position,
                _pad: 0.0,
                normal: snorm(n),
                uv: [(su + 1.0) * 0.5, (sv + 1.0) * 0.5],
            });
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// UV sphere of radius 0.5.
pub fn sphere_mesh(slices: u32, stacks: u32) -> Mesh {
    let mut mesh = Mesh::default();
    for i in 0..=stacks {
        let theta = std::f32::consts::PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let phi = std::f32::consts::TAU * j as f32 / slices as f32;
            let n = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            mesh.vertices.push(Vertex {
                position: n.map(|c| c * 0.5),
                _pad: 0.0,
                normal: snorm(n),
                uv: [j as f32 / slices as f32, i as f32 / stacks as f32],
            });
        }
    }

    let row = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + row;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

fn snorm(n: [f32; 3]) -> [i16; 4] {
    let q = |c: f32| (c.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
    [q(n[0]), q(n[1]), q(n[2]), 0]
}

fn translate_scale(p: [f32; 3], s: f32) -> [[f32; 4]; 4] {
    [
        [s, 0.0, 0.0, 0.0],
        [0.0, s, 0.0, 0.0],
        [0.0, 0.0, s, 0.0],
        [p[0], p[1], p[2], 1.0],
    ]
}

/// Orthographic view of the `[-1, 1]` grid looking down -z.
fn view_projection() -> [[f32; 4]; 4] {
    [
        [0.95, 0.0, 0.0, 0.0],
        [0.0, 0.95, 0.0, 0.0],
        [0.0, 0.0, -0.25, 0.0],
        [0.0, 0.0, 0.5, 1.0],
    ]
}
