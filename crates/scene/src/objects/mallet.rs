use crate::error::ProgramError;
use crate::program::ColorProgram;
use crate::vertex_array::VertexArray;
use vista_common::BYTES_PER_FLOAT;
use vista_render::{GraphicsApi, Primitive};

const POSITION_COMPONENT_COUNT: u32 = 2;
const COLOR_COMPONENT_COUNT: u32 = 3;
const STRIDE: u32 = (POSITION_COMPONENT_COUNT + COLOR_COMPONENT_COUNT) * BYTES_PER_FLOAT;

/// X, Y, R, G, B.
#[rustfmt::skip]
const VERTEX_DATA: [f32; 10] = [
    0.0, -0.4, 0.0, 0.0, 1.0,
    0.0,  0.4, 1.0, 0.0, 0.0,
];

/// The two mallets, one per player, drawn as points.
#[derive(Debug)]
pub struct Mallet {
    vertex_array: VertexArray,
}

impl Mallet {
    pub fn new(api: &mut dyn GraphicsApi) -> Self {
        Self {
            vertex_array: VertexArray::new(api, VERTEX_DATA.to_vec()),
        }
    }

    pub fn bind_data(
        &self,
        api: &mut dyn GraphicsApi,
        program: &ColorProgram,
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
            program.color_attribute_location()?,
            COLOR_COMPONENT_COUNT,
            STRIDE,
        );
        Ok(())
    }

    pub fn draw(&self, api: &mut dyn GraphicsApi) {
        api.draw_arrays(Primitive::Points, 0, 2);
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        self.vertex_array.delete(api);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ColorProgram;
    use vista_assets::BuiltinAssets;
    use vista_render::{Command, RecordingApi};

    #[test]
    fn colour_attribute_follows_position() {
        let mut api = RecordingApi::new();
        let mut program = ColorProgram::new(&BuiltinAssets::new()).unwrap();
        program.initialize(&mut api).unwrap();
        let mallets = Mallet::new(&mut api);
        api.take_commands();

        mallets.bind_data(&mut api, &program).unwrap();
        let offsets: Vec<_> = api
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::VertexAttribPointer(p) => Some((p.offset, p.component_count, p.stride)),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, [(0, 2, 20), (2, 3, 20)]);
    }
}
