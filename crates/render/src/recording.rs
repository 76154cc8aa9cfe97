use crate::api::{
    ApiError, AttribPointer, AttributeLocation, Blend, BufferId, DepthFunc, GraphicsApi,
    Primitive, ProgramId, ProgramSource, TextureId, TextureImage, UniformLocation,
    cube_face_size,
};
use crate::reflect::ProgramReflection;
use glam::Mat4;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One recorded graphics call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateProgram { id: ProgramId, label: String },
    UseProgram(ProgramId),
    DeleteProgram(ProgramId),
    UniformMatrix4 { location: UniformLocation, value: Mat4 },
    UniformF32 { location: UniformLocation, value: f32 },
    UniformI32 { location: UniformLocation, value: i32 },
    CreateVertexBuffer { id: BufferId, len: usize },
    UpdateVertexBuffer { id: BufferId, offset: usize, len: usize },
    CreateIndexBuffer { id: BufferId, len: usize },
    DeleteBuffer(BufferId),
    VertexAttribPointer(AttribPointer),
    EnableVertexAttribArray(AttributeLocation),
    CreateTexture2d { id: TextureId, width: u32, height: u32 },
    CreateCubeMap { id: TextureId, size: u32 },
    BindTexture { unit: u32, texture: TextureId },
    DeleteTexture(TextureId),
    DepthFunc(DepthFunc),
    DepthMask(bool),
    Blend(Option<Blend>),
    CullFace(bool),
    Viewport { width: u32, height: u32 },
    Clear([f32; 4]),
    DrawArrays { primitive: Primitive, first: u32, count: u32 },
    DrawElements { primitive: Primitive, indices: BufferId, count: u32 },
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::DrawArrays { .. } | Command::DrawElements { .. })
    }
}

#[derive(Debug)]
struct RecordedProgram {
    label: String,
    reflection: ProgramReflection,
}

/// Headless backend that records every call.
///
/// Keeps just enough state (programs, buffer contents, attribute pointers,
/// current program) to answer location queries, let tests inspect what was
/// uploaded and reject draws that would read past a buffer. Ids are never
/// reused after a delete.
#[derive(Debug, Default)]
pub struct RecordingApi {
    commands: Vec<Command>,
    programs: Vec<Option<RecordedProgram>>,
    vertex_buffers: Vec<Option<Vec<f32>>>,
    index_buffers: Vec<Option<Vec<u16>>>,
    textures: Vec<bool>,
    pointers: BTreeMap<u32, AttribPointer>,
    current_program: Option<ProgramId>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain recorded commands, keeping resources alive.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    fn program(&self, id: ProgramId) -> Option<&RecordedProgram> {
        self.programs.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn program_label(&self, id: ProgramId) -> Option<&str> {
        self.program(id).map(|p| p.label.as_str())
    }

    /// Live programs.
    pub fn program_count(&self) -> usize {
        self.programs.iter().flatten().count()
    }

    /// Live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|live| **live).count()
    }

    /// Live vertex and index buffers.
    pub fn buffer_count(&self) -> usize {
        self.vertex_buffers.iter().flatten().count() + self.index_buffers.iter().flatten().count()
    }

    pub fn vertex_buffer(&self, id: BufferId) -> Option<&[f32]> {
        self.vertex_buffers
            .get(id.0 as usize)
            .and_then(|b| b.as_deref())
    }

    pub fn index_buffer(&self, id: BufferId) -> Option<&[u16]> {
        self.index_buffers
            .get(id.0 as usize)
            .and_then(|b| b.as_deref())
    }

    /// Recorded draw calls in submission order.
    pub fn draws(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Human-readable listing of the recorded calls.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Recorded frame ({} commands, {} draws, {} programs) ===",
            self.commands.len(),
            self.draws().count(),
            self.program_count()
        );
        for cmd in &self.commands {
            match cmd {
                Command::UseProgram(id) => {
                    let label = self.program_label(*id).unwrap_or("?");
                    let _ = writeln!(out, "  use {label}");
                }
                Command::DrawArrays {
                    primitive,
                    first,
                    count,
                } => {
                    let _ = writeln!(out, "  draw {primitive:?} first={first} count={count}");
                }
                Command::DrawElements {
                    primitive,
                    indices,
                    count,
                } => {
                    let _ = writeln!(
                        out,
                        "  draw {primitive:?} indices={} count={count}",
                        indices.0
                    );
                }
                Command::UniformMatrix4 { value, .. } => {
                    let t = value.w_axis;
                    let _ = writeln!(
                        out,
                        "  matrix w=({:.2}, {:.2}, {:.2}, {:.2})",
                        t.x, t.y, t.z, t.w
                    );
                }
                other => {
                    let _ = writeln!(out, "  {other:?}");
                }
            }
        }
        out
    }

    fn next_buffer_id(&self) -> BufferId {
        BufferId((self.vertex_buffers.len().max(self.index_buffers.len())) as u32)
    }

    /// Vertices every attribute of the current program can supply, or why
    /// the draw cannot run.
    fn readable_vertices(&self) -> Result<u32, String> {
        let id = self.current_program.ok_or("no program in use")?;
        let program = self
            .program(id)
            .ok_or_else(|| format!("program {} was deleted", id.0))?;
        let mut readable = u32::MAX;
        for (name, location) in program.reflection.attributes() {
            let pointer = self
                .pointers
                .get(&location.0)
                .ok_or_else(|| format!("attribute {name} has no pointer"))?;
            let data = self
                .vertex_buffer(pointer.buffer)
                .ok_or_else(|| format!("attribute {name} points at a missing buffer"))?;
            readable = readable.min(vertices_in(pointer, data.len()));
        }
        Ok(readable)
    }
}

/// How many whole vertices `pointer` can read from a buffer of `len` floats.
fn vertices_in(pointer: &AttribPointer, len: usize) -> u32 {
    let len = len as u64 * 4;
    let start = pointer.offset as u64 * 4;
    let element = pointer.component_count as u64 * 4;
    let stride = if pointer.stride == 0 {
        element
    } else {
        pointer.stride as u64
    };
    if start + element > len || stride == 0 {
        return 0;
    }
    ((len - start - element) / stride + 1).min(u32::MAX as u64) as u32
}

impl GraphicsApi for RecordingApi {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, ApiError> {
        let reflection = ProgramReflection::reflect(source)?;
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(Some(RecordedProgram {
            label: source.label.clone(),
            reflection,
        }));
        self.commands.push(Command::CreateProgram {
            id,
            label: source.label.clone(),
        });
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
        self.commands.push(Command::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        let Some(slot) = self.programs.get_mut(program.0 as usize) else {
            return;
        };
        if slot.take().is_none() {
            return;
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.commands.push(Command::DeleteProgram(program));
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        self.commands.push(Command::UniformMatrix4 {
            location,
            value: *value,
        });
    }

    fn uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.commands.push(Command::UniformF32 { location, value });
    }

    fn uniform_i32(&mut self, location: UniformLocation, value: i32) {
        self.commands.push(Command::UniformI32 { location, value });
    }

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId {
        let id = self.next_buffer_id();
        self.vertex_buffers.resize(id.0 as usize + 1, None);
        self.vertex_buffers[id.0 as usize] = Some(data.to_vec());
        self.commands.push(Command::CreateVertexBuffer {
            id,
            len: data.len(),
        });
        id
    }

    fn update_vertex_buffer(&mut self, buffer: BufferId, offset: usize, data: &[f32]) {
        match self
            .vertex_buffers
            .get_mut(buffer.0 as usize)
            .and_then(|b| b.as_mut())
        {
            Some(stored) if offset + data.len() <= stored.len() => {
                stored[offset..offset + data.len()].copy_from_slice(data);
            }
            _ => {
                tracing::warn!(buffer = buffer.0, offset, "vertex buffer update out of range");
                return;
            }
        }
        self.commands.push(Command::UpdateVertexBuffer {
            id: buffer,
            offset,
            len: data.len(),
        });
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferId {
        let id = self.next_buffer_id();
        self.index_buffers.resize(id.0 as usize + 1, None);
        self.index_buffers[id.0 as usize] = Some(indices.to_vec());
        self.commands.push(Command::CreateIndexBuffer {
            id,
            len: indices.len(),
        });
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        let i = buffer.0 as usize;
        let vertex = self.vertex_buffers.get_mut(i).and_then(Option::take);
        let index = self.index_buffers.get_mut(i).and_then(Option::take);
        if vertex.is_none() && index.is_none() {
            return;
        }
        self.pointers.retain(|_, p| p.buffer != buffer);
        self.commands.push(Command::DeleteBuffer(buffer));
    }

    fn vertex_attrib_pointer(&mut self, pointer: AttribPointer) {
        self.pointers.insert(pointer.location.0, pointer);
        self.commands.push(Command::VertexAttribPointer(pointer));
    }

    fn enable_vertex_attrib_array(&mut self, location: AttributeLocation) {
        self.commands.push(Command::EnableVertexAttribArray(location));
    }

    fn create_texture_2d(&mut self, image: &TextureImage) -> Result<TextureId, ApiError> {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(true);
        self.commands.push(Command::CreateTexture2d {
            id,
            width: image.width(),
            height: image.height(),
        });
        Ok(id)
    }

    fn create_cube_map(&mut self, faces: &[TextureImage; 6]) -> Result<TextureId, ApiError> {
        let size = cube_face_size(faces)?;
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(true);
        self.commands.push(Command::CreateCubeMap { id, size });
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(live) = self.textures.get_mut(texture.0 as usize).filter(|l| **l) {
            *live = false;
            self.commands.push(Command::DeleteTexture(texture));
        }
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.commands.push(Command::DepthFunc(func));
    }

    fn set_depth_mask(&mut self, write: bool) {
        self.commands.push(Command::DepthMask(write));
    }

    fn set_blend(&mut self, blend: Option<Blend>) {
        self.commands.push(Command::Blend(blend));
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.commands.push(Command::CullFace(enabled));
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::Viewport { width, height });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(Command::Clear(color));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        match self.readable_vertices() {
            Ok(readable) if first as u64 + count as u64 <= readable as u64 => {}
            Ok(readable) => {
                tracing::warn!(first, count, readable, "draw reads past its vertex data");
                return;
            }
            Err(reason) => {
                tracing::warn!(%reason, "draw rejected");
                return;
            }
        }
        self.commands.push(Command::DrawArrays {
            primitive,
            first,
            count,
        });
    }

    fn draw_elements(&mut self, primitive: Primitive, indices: BufferId, count: u32) {
        let readable = match self.readable_vertices() {
            Ok(readable) => readable,
            Err(reason) => {
                tracing::warn!(%reason, "draw rejected");
                return;
            }
        };
        let Some(stored) = self.index_buffer(indices) else {
            tracing::warn!(buffer = indices.0, "draw from a missing index buffer");
            return;
        };
        let Some(used) = stored.get(..count as usize) else {
            tracing::warn!(count, len = stored.len(), "draw reads past its index data");
            return;
        };
        if used.iter().any(|&i| i as u32 >= readable) {
            tracing::warn!(readable, "index points past the vertex data");
            return;
        }
        self.commands.push(Command::DrawElements {
            primitive,
            indices,
            count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ProgramSource {
        ProgramSource::new(
            "test",
            "struct U { u_Matrix: mat4x4<f32> }; struct V { @location(0) a_Position: vec4<f32> }; fn vs_main() {}",
            "fn fs_main() {}",
        )
    }

    #[test]
    fn programs_get_sequential_ids() {
        let mut api = RecordingApi::new();
        let a = api.create_program(&source()).unwrap();
        let b = api.create_program(&source()).unwrap();
        assert_eq!(a, ProgramId(0));
        assert_eq!(b, ProgramId(1));
        assert_eq!(api.program_count(), 2);
    }

    #[test]
    fn locations_come_from_reflection() {
        let mut api = RecordingApi::new();
        let id = api.create_program(&source()).unwrap();
        assert_eq!(api.uniform_location(id, "u_Matrix"), Some(UniformLocation(0)));
        assert_eq!(api.attribute_location(id, "a_Position"), Some(AttributeLocation(0)));
        assert_eq!(api.uniform_location(id, "u_Time"), None);
        assert_eq!(api.uniform_location(ProgramId(9), "u_Matrix"), None);
    }

    #[test]
    fn vertex_and_index_buffers_share_id_space() {
        let mut api = RecordingApi::new();
        let v = api.create_vertex_buffer(&[1.0, 2.0]);
        let i = api.create_index_buffer(&[0, 1, 2]);
        assert_ne!(v, i);
        assert_eq!(api.vertex_buffer(v), Some(&[1.0, 2.0][..]));
        assert_eq!(api.index_buffer(i), Some(&[0u16, 1, 2][..]));
        assert_eq!(api.vertex_buffer(i), None);
    }

    #[test]
    fn update_rewrites_range_only() {
        let mut api = RecordingApi::new();
        let v = api.create_vertex_buffer(&[0.0; 4]);
        api.update_vertex_buffer(v, 2, &[5.0, 6.0]);
        assert_eq!(api.vertex_buffer(v), Some(&[0.0, 0.0, 5.0, 6.0][..]));

        let before = api.commands().len();
        api.update_vertex_buffer(v, 3, &[1.0, 1.0]);
        assert_eq!(api.commands().len(), before);
    }

    #[test]
    fn cube_map_requires_square_faces() {
        let mut api = RecordingApi::new();
        let square = TextureImage::from_fn(4, 4, |_, _| [0, 0, 0, 255]);
        let wide = TextureImage::from_fn(8, 4, |_, _| [0, 0, 0, 255]);
        let faces = [
            square.clone(),
            square.clone(),
            square.clone(),
            wide,
            square.clone(),
            square,
        ];
        let err = api.create_cube_map(&faces).unwrap_err();
        assert!(matches!(err, ApiError::CubeMapFace { face: 3, .. }));
    }

    /// A program in use with `a_Position` reading `floats` packed vec4s.
    fn bound(api: &mut RecordingApi, floats: usize) -> (ProgramId, BufferId) {
        let id = api.create_program(&source()).unwrap();
        api.use_program(id);
        let buffer = api.create_vertex_buffer(&vec![0.0; floats]);
        api.vertex_attrib_pointer(AttribPointer {
            location: AttributeLocation(0),
            buffer,
            offset: 0,
            component_count: 4,
            stride: 0,
        });
        api.enable_vertex_attrib_array(AttributeLocation(0));
        (id, buffer)
    }

    #[test]
    fn summary_lists_draws() {
        let mut api = RecordingApi::new();
        bound(&mut api, 12);
        api.draw_arrays(Primitive::Points, 0, 3);
        let out = api.summary();
        assert!(out.contains("1 draws"));
        assert!(out.contains("use test"));
        assert!(out.contains("draw Points first=0 count=3"));
    }

    #[test]
    fn draws_past_the_vertex_data_are_rejected() {
        let mut api = RecordingApi::new();
        bound(&mut api, 12);
        api.draw_arrays(Primitive::Points, 1, 2);
        api.draw_arrays(Primitive::Points, 1, 3);
        assert_eq!(api.draws().count(), 1);
    }

    #[test]
    fn strided_pointer_counts_whole_vertices() {
        let pointer = AttribPointer {
            location: AttributeLocation(0),
            buffer: BufferId(0),
            offset: 2,
            component_count: 3,
            stride: 20,
        };
        // 2 vertices of 5 floats each: the second ends exactly at the last float.
        assert_eq!(vertices_in(&pointer, 10), 2);
        assert_eq!(vertices_in(&pointer, 9), 1);
        assert_eq!(vertices_in(&pointer, 4), 0);
    }

    #[test]
    fn indexed_draws_check_counts_and_indices() {
        let mut api = RecordingApi::new();
        bound(&mut api, 12);
        let good = api.create_index_buffer(&[0, 1, 2]);
        let bad = api.create_index_buffer(&[0, 1, 3]);
        api.draw_elements(Primitive::Triangles, good, 3);
        api.draw_elements(Primitive::Triangles, good, 4);
        api.draw_elements(Primitive::Triangles, bad, 3);
        assert_eq!(api.draws().count(), 1);
    }

    #[test]
    fn draw_without_a_program_is_rejected() {
        let mut api = RecordingApi::new();
        api.draw_arrays(Primitive::Points, 0, 0);
        assert!(api.commands().is_empty());
    }

    #[test]
    fn deleted_resources_stop_counting() {
        let mut api = RecordingApi::new();
        let (program, buffer) = bound(&mut api, 12);
        let texture = api
            .create_texture_2d(&TextureImage::from_fn(2, 2, |_, _| [0; 4]))
            .unwrap();
        assert_eq!(
            (api.program_count(), api.buffer_count(), api.texture_count()),
            (1, 1, 1)
        );

        api.delete_buffer(buffer);
        api.delete_texture(texture);
        api.delete_program(program);
        assert_eq!(
            (api.program_count(), api.buffer_count(), api.texture_count()),
            (0, 0, 0)
        );
        assert_eq!(api.current_program(), None);
        assert_eq!(api.program_label(program), None);
        assert_eq!(api.vertex_buffer(buffer), None);
    }

    #[test]
    fn deleting_twice_records_once() {
        let mut api = RecordingApi::new();
        let (program, buffer) = bound(&mut api, 4);
        api.take_commands();
        api.delete_buffer(buffer);
        api.delete_buffer(buffer);
        api.delete_program(program);
        api.delete_program(program);
        api.delete_texture(TextureId(7));
        assert_eq!(
            api.commands(),
            &[Command::DeleteBuffer(buffer), Command::DeleteProgram(program)]
        );
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut api = RecordingApi::new();
        let a = api.create_vertex_buffer(&[0.0]);
        api.delete_buffer(a);
        let b = api.create_vertex_buffer(&[0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn draw_after_its_buffer_is_deleted_is_rejected() {
        let mut api = RecordingApi::new();
        let (_, buffer) = bound(&mut api, 12);
        api.delete_buffer(buffer);
        api.draw_arrays(Primitive::Points, 0, 1);
        assert_eq!(api.draws().count(), 0);
    }
}
