use crate::error::ProgramError;
use crate::program::TextureProgram;
use crate::vertex_array::VertexArray;
use vista_common::BYTES_PER_FLOAT;
use vista_render::{GraphicsApi, Primitive};

const POSITION_COMPONENT_COUNT: u32 = 2;
const TEXTURE_COORDINATES_COMPONENT_COUNT: u32 = 2;
const STRIDE: u32 = (POSITION_COMPONENT_COUNT + TEXTURE_COORDINATES_COMPONENT_COUNT) * BYTES_PER_FLOAT;

/// X, Y, S, T. A fan around the centre; T is trimmed so the texture's
/// edges are not stretched onto the table.
#[rustfmt::skip]
const VERTEX_DATA: [f32; 24] = [
     0.0,  0.0, 0.5, 0.5,
    -0.5, -0.8, 0.0, 0.9,
     0.5, -0.8, 1.0, 0.9,
     0.5,  0.8, 1.0, 0.1,
    -0.5,  0.8, 0.0, 0.1,
    -0.5, -0.8, 0.0, 0.9,
];

/// Textured air hockey table surface.
#[derive(Debug)]
pub struct Table {
    vertex_array: VertexArray,
}

impl Table {
    pub fn new(api: &mut dyn GraphicsApi) -> Self {
        Self {
            vertex_array: VertexArray::new(api, VERTEX_DATA.to_vec()),
        }
    }

    pub fn bind_data(
        &self,
        api: &mut dyn GraphicsApi,
        program: &TextureProgram,
    ) -> Result<(), ProgramError> {
        self.vertex_array.set_vertex_attrib_pointer(
            api,
            0,
            program.position_attribute_location()?,
            POSITION_COMPONENT_COUNT,
            STRIDE,
        );
        self.vertex_array.set_vertex_attrib_pointer(
            api,
            POSITION_COMPONENT_COUNT as usize,
            program.texture_coordinates_attribute_location()?,
            TEXTURE_COORDINATES_COMPONENT_COUNT,
            STRIDE,
        );
        Ok(())
    }

    pub fn draw(&self, api: &mut dyn GraphicsApi) {
        api.draw_arrays(Primitive::TriangleFan, 0, 6);
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        self.vertex_array.delete(api);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_closes_on_its_first_rim_vertex() {
        assert_eq!(VERTEX_DATA[4..8], VERTEX_DATA[20..24]);
    }
}
