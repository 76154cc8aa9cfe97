use glam::Mat4;

/// Handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle to a 2D texture or cube map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Location of a vertex attribute inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Triangles,
    TriangleFan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
    /// Every fragment passes; later draws paint over earlier ones.
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Source and destination blend factors for colour writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Blend {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Blend {
    /// `src * 1 + dst * 1`, used for glowing particles.
    pub const ADDITIVE: Blend = Blend {
        src: BlendFactor::One,
        dst: BlendFactor::One,
    };
}

/// Vertex and fragment source for one program.
///
/// Sources are WGSL. Linking concatenates the two stages into one module, so
/// the vertex stage owns the shared declarations (uniform block, varyings) and
/// the fragment stage only adds what it samples plus `fs_main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSource {
    pub fn new(
        label: impl Into<String>,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Both stages joined into a single module.
    pub fn linked(&self) -> String {
        format!("{}\n{}", self.vertex, self.fragment)
    }
}

/// Layout of one vertex attribute inside a float buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttribPointer {
    pub location: AttributeLocation,
    pub buffer: BufferId,
    /// Offset of the first component, in floats.
    pub offset: u32,
    pub component_count: u32,
    /// Distance between consecutive vertices, in bytes.
    pub stride: u32,
}

/// Decoded RGBA8 image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ApiError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(ApiError::InvalidImage {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// Edge length shared by all six faces, or the first face that is not
/// square or differs in size from face 0.
pub fn cube_face_size(faces: &[TextureImage; 6]) -> Result<u32, ApiError> {
    let size = faces[0].width();
    for (face, img) in faces.iter().enumerate() {
        if img.width() != size || img.height() != size {
            return Err(ApiError::CubeMapFace {
                face,
                width: img.width(),
                height: img.height(),
            });
        }
    }
    Ok(size)
}

/// Errors raised by a graphics backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("failed to compile program `{label}`: {message}")]
    Compile { label: String, message: String },
    #[error("failed to link program `{label}`: {message}")]
    Link { label: String, message: String },
    #[error("invalid image {width}x{height} with {len} bytes")]
    InvalidImage { width: u32, height: u32, len: usize },
    #[error("cube map faces must be square and equal in size, face {face} is {width}x{height}")]
    CubeMapFace { face: usize, width: u32, height: u32 },
}

/// GLES2-shaped graphics contract.
///
/// Calls mutate context state (current program, attribute bindings, texture
/// units, depth and blend state) that the next draw call reads, the same way
/// a GL context does.
pub trait GraphicsApi {
    /// Compile and link a program.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId, ApiError>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttributeLocation>;

    fn use_program(&mut self, program: ProgramId);

    /// Release a program and anything built from it. Unknown ids are ignored.
    fn delete_program(&mut self, program: ProgramId);

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4);

    fn uniform_f32(&mut self, location: UniformLocation, value: f32);

    fn uniform_i32(&mut self, location: UniformLocation, value: i32);

    fn create_vertex_buffer(&mut self, data: &[f32]) -> BufferId;

    /// Overwrite `data.len()` floats starting at float `offset`.
    fn update_vertex_buffer(&mut self, buffer: BufferId, offset: usize, data: &[f32]);

    fn create_index_buffer(&mut self, indices: &[u16]) -> BufferId;

    /// Release a vertex or index buffer. Attribute pointers into it are
    /// dropped with it.
    fn delete_buffer(&mut self, buffer: BufferId);

    fn vertex_attrib_pointer(&mut self, pointer: AttribPointer);

    fn enable_vertex_attrib_array(&mut self, location: AttributeLocation);

    fn create_texture_2d(&mut self, image: &TextureImage) -> Result<TextureId, ApiError>;

    /// Faces in +X, -X, +Y, -Y, +Z, -Z order.
    fn create_cube_map(&mut self, faces: &[TextureImage; 6]) -> Result<TextureId, ApiError>;

    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    fn delete_texture(&mut self, texture: TextureId);

    fn set_depth_func(&mut self, func: DepthFunc);

    fn set_depth_mask(&mut self, write: bool);

    fn set_blend(&mut self, blend: Option<Blend>);

    fn set_cull_face(&mut self, enabled: bool);

    fn viewport(&mut self, width: u32, height: u32);

    fn clear(&mut self, color: [f32; 4]);

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);

    fn draw_elements(&mut self, primitive: Primitive, indices: BufferId, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_image_rejects_short_buffer() {
        let err = TextureImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidImage { len: 15, .. }));
    }

    #[test]
    fn texture_image_from_fn_is_row_major() {
        let img = TextureImage::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(img.pixels().len(), 24);
        assert_eq!(img.pixel(2, 1), [2, 1, 0, 255]);
    }

    #[test]
    fn linked_source_keeps_both_stages() {
        let src = ProgramSource::new("p", "fn vs_main() {}", "fn fs_main() {}");
        let linked = src.linked();
        assert!(linked.contains("vs_main"));
        assert!(linked.contains("fs_main"));
    }
}
