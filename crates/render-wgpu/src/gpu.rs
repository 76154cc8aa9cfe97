use crate::pipeline::{
    AttributeLayout, DEPTH_FORMAT, FanKey, POINT_QUAD_VERTICES, PipelineKey, UniformState,
    create_pipeline, evict_buffer_fans, evict_program_pipelines, fan_from_indices, fan_from_range,
};
use glam::Mat4;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;
use vista_render::reflect::{U_MATRIX, U_TEXTURE_UNIT, U_TIME};
use vista_render::{
    ApiError, AttribPointer, AttributeLocation, Blend, BufferId, DepthFunc, GraphicsApi,
    Primitive, ProgramId, ProgramReflection, ProgramSource, TextureId, TextureImage,
    UniformLocation, cube_face_size,
};
use wgpu::util::DeviceExt;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct ProgramEntry {
    label: String,
    module: wgpu::ShaderModule,
    reflection: ProgramReflection,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    texture_dimension: Option<wgpu::TextureViewDimension>,
    uniforms: UniformState,
}

enum BufferEntry {
    Vertex { buffer: wgpu::Buffer, len: usize },
    Index { buffer: wgpu::Buffer, indices: Vec<u16> },
}

struct TextureEntry {
    view: wgpu::TextureView,
    dimension: wgpu::TextureViewDimension,
}

#[derive(Debug, Clone, Copy)]
struct RenderState {
    depth_func: DepthFunc,
    depth_write: bool,
    blend: Option<Blend>,
    cull: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_func: DepthFunc::Less,
            depth_write: true,
            blend: None,
            cull: false,
        }
    }
}

enum IndexSource {
    Buffer(BufferId),
    Fan(FanKey),
}

struct QueuedDraw {
    pipeline: PipelineKey,
    bind_group: wgpu::BindGroup,
    vertex_buffers: Vec<(BufferId, u64)>,
    vertices: Range<u32>,
    instances: Range<u32>,
    indexed: Option<(IndexSource, u32)>,
}

impl QueuedDraw {
    fn reads(&self, buffer: BufferId) -> bool {
        self.vertex_buffers.iter().any(|(b, _)| *b == buffer)
            || matches!(
                self.indexed,
                Some((IndexSource::Buffer(b), _))
                    | Some((IndexSource::Fan(FanKey::Elements { buffer: b, .. }), _))
                    if b == buffer
            )
    }
}

/// [`GraphicsApi`] backed by a wgpu device.
///
/// Resource calls (programs, buffers, textures) take effect immediately.
/// Draw calls snapshot the context state they need and are queued;
/// [`WgpuApi::submit_frame`] encodes them into one render pass over the
/// target. Buffer updates made during a frame land before that pass runs.
///
/// Points are drawn as instanced six-vertex quads and triangle fans are
/// rewritten into triangle lists, since wgpu has neither.
///
/// Deleted resources leave an empty slot; ids are never reused. Deleting a
/// program evicts its pipelines, deleting an index buffer evicts the fans
/// built from it.
pub struct WgpuApi {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,
    sampler: wgpu::Sampler,
    programs: Vec<Option<ProgramEntry>>,
    buffers: Vec<Option<BufferEntry>>,
    textures: Vec<Option<TextureEntry>>,
    current_program: Option<ProgramId>,
    pointers: BTreeMap<u32, AttribPointer>,
    enabled: BTreeSet<u32>,
    texture_units: BTreeMap<u32, TextureId>,
    state: RenderState,
    viewport: (u32, u32),
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fans: HashMap<FanKey, (wgpu::Buffer, u32)>,
    uniform_pool: Vec<wgpu::Buffer>,
    uniforms_used: usize,
    clear_color: Option<[f32; 4]>,
    queued: Vec<QueuedDraw>,
    last_frame_draws: usize,
}

impl WgpuApi {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        target_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let depth_view = create_depth_texture(&device, width, height);
        Self {
            device,
            queue,
            target_format,
            sampler,
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            current_program: None,
            pointers: BTreeMap::new(),
            enabled: BTreeSet::new(),
            texture_units: BTreeMap::new(),
            state: RenderState::default(),
            viewport: (width, height),
            depth_view,
            depth_size: (width.max(1), height.max(1)),
            pipelines: HashMap::new(),
            fans: HashMap::new(),
            uniform_pool: Vec::new(),
            uniforms_used: 0,
            clear_color: None,
            queued: Vec::new(),
            last_frame_draws: 0,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Draw calls in the last submitted frame.
    pub fn last_frame_draws(&self) -> usize {
        self.last_frame_draws
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Live programs, buffers and textures.
    pub fn resource_counts(&self) -> (usize, usize, usize) {
        (
            self.programs.iter().flatten().count(),
            self.buffers.iter().flatten().count(),
            self.textures.iter().flatten().count(),
        )
    }

    fn program(&self, id: ProgramId) -> Option<&ProgramEntry> {
        self.programs.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn buffer(&self, id: BufferId) -> Option<&BufferEntry> {
        self.buffers.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn texture(&self, id: TextureId) -> Option<&TextureEntry> {
        self.textures.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Encode every queued draw into one render pass over `target` and
    /// submit it. The target must match the last viewport size.
    pub fn submit_frame(&mut self, target: &wgpu::TextureView) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let (color_load, depth_load) = match self.clear_color {
            Some([r, g, b, a]) => (
                wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                wgpu::LoadOp::Clear(1.0),
            ),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &self.queued {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &draw.bind_group, &[]);
                for (slot, (id, offset)) in draw.vertex_buffers.iter().enumerate() {
                    if let Some(BufferEntry::Vertex { buffer, .. }) = self.buffer(*id) {
                        pass.set_vertex_buffer(slot as u32, buffer.slice(*offset..));
                    }
                }
                match &draw.indexed {
                    None => pass.draw(draw.vertices.clone(), draw.instances.clone()),
                    Some((IndexSource::Buffer(id), count)) => {
                        if let Some(BufferEntry::Index { buffer, .. }) = self.buffer(*id) {
                            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
                            pass.draw_indexed(0..*count, 0, draw.instances.clone());
                        }
                    }
                    Some((IndexSource::Fan(key), _)) => {
                        if let Some((buffer, count)) = self.fans.get(key) {
                            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
                            pass.draw_indexed(0..*count, 0, draw.instances.clone());
                        }
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.last_frame_draws = self.queued.len();
        self.queued.clear();
        self.uniforms_used = 0;
        self.clear_color = None;
    }

    fn program_mut(&mut self) -> Option<&mut ProgramEntry> {
        let id = self.current_program?;
        self.programs.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn set_uniform(&mut self, location: UniformLocation, f: impl FnOnce(&mut UniformState)) {
        match self.program_mut() {
            Some(program) => f(&mut program.uniforms),
            None => tracing::warn!(location = location.0, "uniform set with no program in use"),
        }
    }

    fn next_uniform_buffer(&mut self) -> usize {
        let index = self.uniforms_used;
        self.uniforms_used += 1;
        if index == self.uniform_pool.len() {
            self.uniform_pool.push(self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("draw_uniforms"),
                size: std::mem::size_of::<crate::pipeline::Uniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        index
    }

    fn fan_buffer(&mut self, key: FanKey) -> Option<u32> {
        if let Some((_, count)) = self.fans.get(&key) {
            return Some(*count);
        }
        let indices = match key {
            FanKey::Arrays { first, count } => fan_from_range(first, count),
            FanKey::Elements { buffer, count } => match self.buffer(buffer) {
                Some(BufferEntry::Index { indices, .. }) => {
                    fan_from_indices(&indices[..(count as usize).min(indices.len())])
                }
                _ => return None,
            },
        };
        if indices.is_empty() {
            return None;
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fan_indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let count = indices.len() as u32;
        self.fans.insert(key, (buffer, count));
        Some(count)
    }

    /// Snapshot everything the current program needs and queue the draw.
    fn queue_draw(
        &mut self,
        primitive: Primitive,
        vertices: Range<u32>,
        indexed: Option<(IndexSource, u32)>,
    ) {
        let Some(program_id) = self.current_program else {
            tracing::warn!("draw with no program in use");
            return;
        };
        let Some(program) = self
            .programs
            .get(program_id.0 as usize)
            .and_then(Option::as_ref)
        else {
            return;
        };

        let mut layouts = Vec::new();
        let mut vertex_buffers = Vec::new();
        for (name, location) in program.reflection.attributes() {
            let pointer = self
                .pointers
                .get(&location.0)
                .filter(|_| self.enabled.contains(&location.0));
            let Some(pointer) = pointer else {
                tracing::warn!(program = %program.label, attribute = name, "attribute not enabled");
                return;
            };
            if !matches!(self.buffer(pointer.buffer), Some(BufferEntry::Vertex { .. })) {
                tracing::warn!(buffer = pointer.buffer.0, "attribute points at a non-vertex buffer");
                return;
            }
            layouts.push(AttributeLayout::from_pointer(pointer));
            vertex_buffers.push((pointer.buffer, pointer.offset as u64 * 4));
        }

        let instanced = primitive == Primitive::Points;
        let key = PipelineKey {
            program: program_id,
            attributes: layouts,
            instanced,
            depth_func: self.state.depth_func,
            depth_write: self.state.depth_write,
            blend: self.state.blend,
            cull: self.state.cull && !instanced,
        };
        if !self.pipelines.contains_key(&key) {
            match create_pipeline(
                &self.device,
                &program.label,
                &program.module,
                &program.pipeline_layout,
                &key,
                self.target_format,
            ) {
                Ok(pipeline) => {
                    tracing::debug!(program = %program.label, "pipeline created");
                    self.pipelines.insert(key.clone(), pipeline);
                }
                Err(message) => {
                    tracing::error!(program = %program.label, %message, "pipeline creation failed");
                    return;
                }
            }
        }

        let texture = match program.texture_dimension {
            None => None,
            Some(dimension) => {
                let unit = program.uniforms.texture_unit.max(0) as u32;
                let bound = self
                    .texture_units
                    .get(&unit)
                    .filter(|id| self.texture(**id).is_some_and(|t| t.dimension == dimension));
                match bound {
                    Some(id) => Some(*id),
                    _ => {
                        tracing::warn!(program = %program.label, unit, "no matching texture bound");
                        return;
                    }
                }
            }
        };
        let packed = program.uniforms.pack(self.viewport);

        let (vertices, instances) = if instanced {
            (0..POINT_QUAD_VERTICES, vertices)
        } else {
            (vertices, 0..1)
        };

        let slot = self.next_uniform_buffer();
        let uniform_buffer = &self.uniform_pool[slot];
        self.queue
            .write_buffer(uniform_buffer, 0, bytemuck::bytes_of(&packed));

        let Some(program) = self.program(program_id) else {
            return;
        };
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];
        if let Some(entry) = texture.and_then(|id| self.texture(id)) {
            entries.push(wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&entry.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &program.bind_group_layout,
            entries: &entries,
        });

        self.queued.push(QueuedDraw {
            pipeline: key,
            bind_group,
            vertex_buffers,
            vertices,
            instances,
            indexed,
        });
    }

    fn create_texture(
        &mut self,
        label: &str,
        size: wgpu::Extent3d,
        dimension: wgpu::TextureViewDimension,
        data: &[u8],
    ) -> TextureId {
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(dimension),
            ..Default::default()
        });
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Some(TextureEntry { view, dimension }));
        id
    }
}

impl GraphicsApi for WgpuApi {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, ApiError> {
        let reflection = ProgramReflection::reflect(source)?;
        let linked = source.linked();

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(linked.as_str().into()),
            });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ApiError::Compile {
                label: source.label.clone(),
                message: err.to_string(),
            });
        }

        let texture_dimension = reflection.samples_texture().then(|| {
            if linked.contains("texture_cube") {
                wgpu::TextureViewDimension::Cube
            } else {
                wgpu::TextureViewDimension::D2
            }
        });

        let mut layout_entries = vec![wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        if let Some(view_dimension) = texture_dimension {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            });
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&source.label),
                    entries: &layout_entries,
                });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&source.label),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(Some(ProgramEntry {
            label: source.label.clone(),
            module,
            reflection,
            bind_group_layout,
            pipeline_layout,
            texture_dimension,
            uniforms: UniformState::default(),
        }));
        tracing::debug!(program = %source.label, id = id.0, "shader module compiled");
        Ok(id)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.program(program)
            .and_then(|p| p.reflection.uniform(name))
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        self.program(program)
            .and_then(|p| p.reflection.attribute(name))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
    }

    fn delete_program(&mut self, program: ProgramId) {
        let Some(entry) = self.programs.get_mut(program.0 as usize).and_then(Option::take) else {
            return;
        };
        let evicted = evict_program_pipelines(&mut self.pipelines, program);
        self.queued.retain(|d| d.pipeline.program != program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        tracing::debug!(program = %entry.label, evicted, "program deleted");
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        if slot_name(location) == Some(U_MATRIX) {
            self.set_uniform(location, |u| u.matrix = *value);
        }
    }

    fn uniform_f32(&mut self, location: UniformLocation, value: f32) {
        if slot_name(location) == Some(U_TIME) {
            self.set_uniform(location, |u| u.time = value);
        }
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        if slot_name(location) == Some(U_TEXTURE_UNIT) {
            self.set_uniform(location, |u| u.texture_unit = value);
        }
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex_buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Some(BufferEntry::Vertex {
            buffer,
            len: data.len(),
        }));
        id
    }

    fn update_vertex_buffer(&mut self, buffer: BufferId, offset: usize, data: &[f32]) {
        match self.buffer(buffer) {
            Some(BufferEntry::Vertex { buffer: b, len }) if offset + data.len() <= *len => {
                self.queue
                    .write_buffer(b, offset as u64 * 4, bytemuck::cast_slice(data));
            }
            _ => tracing::warn!(buffer = buffer.0, offset, "vertex buffer update out of range"),
        }
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferId {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("index_buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Some(BufferEntry::Index {
            buffer,
            indices: indices.to_vec(),
        }));
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self
            .buffers
            .get_mut(buffer.0 as usize)
            .and_then(Option::take)
            .is_none()
        {
            return;
        }
        self.pointers.retain(|_, p| p.buffer != buffer);
        evict_buffer_fans(&mut self.fans, buffer);
        self.queued.retain(|d| !d.reads(buffer));
        tracing::debug!(buffer = buffer.0, "buffer deleted");
    }

    fn vertex_attrib_pointer(&mut self, pointer: AttribPointer) {
        self.pointers.insert(pointer.location.0, pointer);
    }

    fn enable_vertex_attrib_array(&mut self, location: AttributeLocation) {
        self.enabled.insert(location.0);
    }

    fn create_texture_2d(&mut self, image: &TextureImage) -> Result<TextureId, ApiError> {
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        Ok(self.create_texture(
            "texture_2d",
            size,
            wgpu::TextureViewDimension::D2,
            image.pixels(),
        ))
    }

    fn create_cube_map(&mut self, faces: &[TextureImage; 6]) -> Result<TextureId, ApiError> {
        let edge = cube_face_size(faces)?;
        let size = wgpu::Extent3d {
            width: edge,
            height: edge,
            depth_or_array_layers: 6,
        };
        let data: Vec<u8> = faces.iter().flat_map(|f| f.pixels()).copied().collect();
        Ok(self.create_texture(
            "cube_map",
            size,
            wgpu::TextureViewDimension::Cube,
            &data,
        ))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.texture_units.insert(unit, texture);
    }

    /// Draws already queued keep the texture alive through their bind group.
    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(slot) = self.textures.get_mut(texture.0 as usize) {
            if slot.take().is_some() {
                self.texture_units.retain(|_, t| *t != texture);
                tracing::debug!(texture = texture.0, "texture deleted");
            }
        }
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.state.depth_func = func;
    }

    fn set_depth_mask(&mut self, write: bool) {
        self.state.depth_write = write;
    }

    fn set_blend(&mut self, blend: Option<Blend>) {
        self.state.blend = blend;
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.state.cull = enabled;
    }

    /// The pass always covers the whole target; the size feeds the depth
    /// buffer and `u_Viewport`.
    fn viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        let size = (width.max(1), height.max(1));
        if size != self.depth_size {
            self.depth_view = create_depth_texture(&self.device, width, height);
            self.depth_size = size;
        }
    }

    /// Drops anything queued so far; the next submitted pass starts cleared.
    fn clear(&mut self, color: [f32; 4]) {
        self.queued.clear();
        self.clear_color = Some(color);
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        match primitive {
            Primitive::Points | Primitive::Triangles => {
                self.queue_draw(primitive, first..first + count, None)
            }
            Primitive::TriangleFan => {
                let key = FanKey::Arrays { first, count };
                if let Some(n) = self.fan_buffer(key) {
                    self.queue_draw(primitive, 0..0, Some((IndexSource::Fan(key), n)));
                }
            }
        }
    }

    fn draw_elements(&mut self, primitive: Primitive, indices: BufferId, count: u32) {
        match primitive {
            Primitive::Triangles => {
                self.queue_draw(primitive, 0..0, Some((IndexSource::Buffer(indices), count)))
            }
            Primitive::TriangleFan => {
                let key = FanKey::Elements {
                    buffer: indices,
                    count,
                };
                if let Some(n) = self.fan_buffer(key) {
                    self.queue_draw(primitive, 0..0, Some((IndexSource::Fan(key), n)));
                }
            }
            Primitive::Points => {
                tracing::warn!("indexed point drawing is not supported");
            }
        }
    }
}

/// Name of the uniform at `location` in the shared block.
fn slot_name(location: UniformLocation) -> Option<&'static str> {
    vista_render::reflect::UNIFORM_SLOTS
        .get(location.0 as usize)
        .copied()
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
