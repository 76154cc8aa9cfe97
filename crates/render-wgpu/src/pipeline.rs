//! Mapping GL-style context state onto wgpu pipelines.
//!
//! wgpu bakes vertex layout, topology, depth and blend state into an
//! immutable pipeline, so each distinct combination a draw call sees becomes
//! one [`PipelineKey`] and one cached pipeline.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::HashMap;
use vista_render::{AttribPointer, Blend, BlendFactor, BufferId, DepthFunc, ProgramId};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertices per expanded point sprite.
pub(crate) const POINT_QUAD_VERTICES: u32 = 6;

/// Uniform block shared by every program, group 0 binding 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    matrix: [[f32; 4]; 4],
    time: f32,
    _pad: f32,
    viewport: [f32; 2],
}

/// Uniform values a program holds between draws, like a GL program object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UniformState {
    pub matrix: Mat4,
    pub time: f32,
    pub texture_unit: i32,
}

impl Default for UniformState {
    fn default() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            time: 0.0,
            texture_unit: 0,
        }
    }
}

impl UniformState {
    pub fn pack(&self, viewport: (u32, u32)) -> Uniforms {
        Uniforms {
            matrix: self.matrix.to_cols_array_2d(),
            time: self.time,
            _pad: 0.0,
            viewport: [viewport.0.max(1) as f32, viewport.1.max(1) as f32],
        }
    }
}

/// One vertex attribute as the pipeline sees it. Each attribute gets its own
/// vertex buffer slot, so the byte offset lives in the buffer binding rather
/// than the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AttributeLayout {
    pub location: u32,
    pub components: u32,
    pub stride: u64,
}

impl AttributeLayout {
    pub fn from_pointer(pointer: &AttribPointer) -> Self {
        Self {
            location: pointer.location.0,
            components: pointer.component_count,
            stride: stride_bytes(pointer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub program: ProgramId,
    pub attributes: Vec<AttributeLayout>,
    /// Points are drawn as instanced quads: attributes step per instance.
    pub instanced: bool,
    pub depth_func: DepthFunc,
    pub depth_write: bool,
    pub blend: Option<Blend>,
    pub cull: bool,
}

/// Index data a triangle fan was rewritten into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FanKey {
    Arrays { first: u32, count: u32 },
    Elements { buffer: BufferId, count: u32 },
}

/// Drop every pipeline built for `program`, returning how many went.
pub(crate) fn evict_program_pipelines<V>(
    pipelines: &mut HashMap<PipelineKey, V>,
    program: ProgramId,
) -> usize {
    let before = pipelines.len();
    pipelines.retain(|key, _| key.program != program);
    before - pipelines.len()
}

/// Drop fans rewritten from the index data of `buffer`.
pub(crate) fn evict_buffer_fans<V>(fans: &mut HashMap<FanKey, V>, buffer: BufferId) {
    fans.retain(|key, _| !matches!(key, FanKey::Elements { buffer: b, .. } if *b == buffer));
}

/// A stride of zero means tightly packed.
pub(crate) fn stride_bytes(pointer: &AttribPointer) -> u64 {
    if pointer.stride == 0 {
        pointer.component_count as u64 * 4
    } else {
        pointer.stride as u64
    }
}

pub(crate) fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

pub(crate) fn compare_function(func: DepthFunc) -> wgpu::CompareFunction {
    match func {
        DepthFunc::Less => wgpu::CompareFunction::Less,
        DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFunc::Always => wgpu::CompareFunction::Always,
    }
}

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

pub(crate) fn blend_state(blend: Option<Blend>) -> wgpu::BlendState {
    match blend {
        None => wgpu::BlendState::REPLACE,
        Some(b) => {
            let component = wgpu::BlendComponent {
                src_factor: blend_factor(b.src),
                dst_factor: blend_factor(b.dst),
                operation: wgpu::BlendOperation::Add,
            };
            wgpu::BlendState {
                color: component,
                alpha: component,
            }
        }
    }
}

/// Triangle list covering the fan `first..first + count`.
pub(crate) fn fan_from_range(first: u32, count: u32) -> Vec<u32> {
    (1..count.saturating_sub(1))
        .flat_map(|i| [first, first + i, first + i + 1])
        .collect()
}

/// Triangle list covering a fan given by index data.
pub(crate) fn fan_from_indices(indices: &[u16]) -> Vec<u32> {
    let Some((&hub, rim)) = indices.split_first() else {
        return Vec::new();
    };
    rim.windows(2)
        .flat_map(|w| [hub as u32, w[0] as u32, w[1] as u32])
        .collect()
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    key: &PipelineKey,
    target_format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, String> {
    let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
        .attributes
        .iter()
        .map(|a| {
            let format = vertex_format(a.components)
                .ok_or_else(|| format!("unsupported component count {}", a.components))?;
            Ok([wgpu::VertexAttribute {
                format,
                offset: 0,
                shader_location: a.location,
            }])
        })
        .collect::<Result<_, String>>()?;

    let step_mode = if key.instanced {
        wgpu::VertexStepMode::Instance
    } else {
        wgpu::VertexStepMode::Vertex
    };
    let buffers: Vec<wgpu::VertexBufferLayout> = key
        .attributes
        .iter()
        .zip(&attributes)
        .map(|(a, attr)| wgpu::VertexBufferLayout {
            array_stride: a.stride,
            step_mode,
            attributes: attr,
        })
        .collect();

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: Some(blend_state(key.blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull.then_some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.depth_write,
            depth_compare: compare_function(key.depth_func),
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(pipeline),
    }
}
