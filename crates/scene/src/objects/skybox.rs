use crate::error::ProgramError;
use crate::program::SkyboxProgram;
use crate::vertex_array::{IndexBuffer, VertexArray};
use vista_common::BYTES_PER_FLOAT;
use vista_render::{GraphicsApi, Primitive};

const POSITION_COMPONENT_COUNT: u32 = 3;
const STRIDE: u32 = POSITION_COMPONENT_COUNT * BYTES_PER_FLOAT;

#[rustfmt::skip]
const VERTICES: [f32; 24] = [
    -1.0,  1.0,  1.0, // 0: top-left near
     1.0,  1.0,  1.0, // 1: top-right near
    -1.0, -1.0,  1.0, // 2: bottom-left near
     1.0, -1.0,  1.0, // 3: bottom-right near
    -1.0,  1.0, -1.0, // 4: top-left far
     1.0,  1.0, -1.0, // 5: top-right far
    -1.0, -1.0, -1.0, // 6: bottom-left far
     1.0, -1.0, -1.0, // 7: bottom-right far
];

/// Faces wind inward: the cube is seen from inside.
#[rustfmt::skip]
const INDICES: [u16; 36] = [
    1, 3, 0,  0, 3, 2, // front
    4, 6, 5,  5, 6, 7, // back
    0, 2, 4,  4, 2, 6, // left
    5, 7, 1,  1, 7, 3, // right
    5, 1, 4,  4, 1, 0, // top
    6, 2, 7,  7, 2, 3, // bottom
];

/// Unit cube around the eye, textured with a cube map.
#[derive(Debug)]
pub struct Skybox {
    vertex_array: VertexArray,
    index_buffer: IndexBuffer,
}

impl Skybox {
    pub fn new(api: &mut dyn GraphicsApi) -> Self {
        Self {
            vertex_array: VertexArray::new(api, VERTICES.to_vec()),
            index_buffer: IndexBuffer::new(api, &INDICES),
        }
    }

    pub fn bind_data(
        &self,
        api: &mut dyn GraphicsApi,
        program: &SkyboxProgram,
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

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn corner(i: u16) -> Vec3 {
        let i = i as usize * 3;
        Vec3::new(VERTICES[i], VERTICES[i + 1], VERTICES[i + 2])
    }

    #[test]
    fn every_triangle_faces_the_centre() {
        for tri in INDICES.chunks(3) {
            let (a, b, c) = (corner(tri[0]), corner(tri[1]), corner(tri[2]));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) < 0.0, "triangle {tri:?} faces out");
        }
    }

    #[test]
    fn indices_cover_all_corners() {
        for v in 0..8u16 {
            assert!(INDICES.contains(&v));
        }
    }
}
