use crate::error::{GeometryError, ProgramError};
use crate::program::HeightmapProgram;
use crate::vertex_array::{IndexBuffer, VertexArray};
use vista_common::BYTES_PER_FLOAT;
use vista_render::{GraphicsApi, Primitive, TextureImage};

const POSITION_COMPONENT_COUNT: u32 = 3;
const STRIDE: u32 = POSITION_COMPONENT_COUNT * BYTES_PER_FLOAT;

/// Indices are 16-bit, so every vertex index must fit in a `u16`.
const MAX_VERTICES: usize = u16::MAX as usize + 1;

/// Terrain mesh built from a greyscale image.
///
/// The mesh spans `[-0.5, 0.5]` on x and z with height `[0, 1]`; the model
/// matrix scales it into the world.
#[derive(Debug)]
pub struct Heightmap {
    vertex_array: VertexArray,
    index_buffer: IndexBuffer,
    width: u32,
    height: u32,
}

impl Heightmap {
    pub fn new(api: &mut dyn GraphicsApi, image: &TextureImage) -> Result<Self, GeometryError> {
        let (width, height) = (image.width(), image.height());
        if width < 2 || height < 2 {
            return Err(GeometryError::HeightmapTooSmall { width, height });
        }
        let vertices = width as usize * height as usize;
        if vertices > MAX_VERTICES {
            return Err(GeometryError::HeightmapTooLarge { vertices });
        }

        let vertex_array = VertexArray::new(api, vertex_data(image));
        let index_buffer = IndexBuffer::new(api, &index_data(width, height));
        tracing::debug!(width, height, indices = index_buffer.count(), "heightmap built");
        Ok(Self {
            vertex_array,
            index_buffer,
            width,
            height,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bind_data(
        &self,
        api: &mut dyn GraphicsApi,
        program: &HeightmapProgram,
    ) -> Result<(), ProgramError> {
        self.vertex_array.set_vertex_attrib_pointer(
            api,
            0,
            program.position_attribute_location()?,
            POSITION_COMPONENT_COUNT,
            STRIDE,
        );
        Ok(())
    }

    pub fn draw(&self, api: &mut dyn GraphicsApi) {
        api.draw_elements(
            Primitive::Triangles,
            self.index_buffer.buffer(),
            self.index_buffer.count(),
        );
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        self.vertex_array.delete(api);
        self.index_buffer.delete(api);
    }
}

/// One vertex per pixel, row-major. Height comes from the red channel.
fn vertex_data(image: &TextureImage) -> Vec<f32> {
    let (w, h) = (image.width(), image.height());
    let mut data = Vec::with_capacity((w * h * POSITION_COMPONENT_COUNT) as usize);
    for row in 0..h {
        for col in 0..w {
            let x = col as f32 / (w - 1) as f32 - 0.5;
            let y = image.pixel(col, row)[0] as f32 / 255.0;
            let z = row as f32 / (h - 1) as f32 - 0.5;
            data.extend_from_slice(&[x, y, z]);
        }
    }
    data
}

/// Two counter-clockwise triangles per grid cell.
fn index_data(width: u32, height: u32) -> Vec<u16> {
    let mut indices = Vec::with_capacity(((width - 1) * (height - 1) * 6) as usize);
    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let top_left = (row * width + col) as u16;
            let top_right = top_left + 1;
            let bottom_left = ((row + 1) * width + col) as u16;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    indices
}
