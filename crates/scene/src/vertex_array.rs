use vista_render::{AttribPointer, AttributeLocation, BufferId, GraphicsApi};

/// Float vertex data and the buffer it was uploaded to.
///
/// The data is uploaded once at creation. Attribute pointers carry their own
/// offset, so describing one attribute never disturbs another.
#[derive(Debug)]
pub struct VertexArray {
    data: Vec<f32>,
    buffer: BufferId,
}

impl VertexArray {
    pub fn new(api: &mut dyn GraphicsApi, data: Vec<f32>) -> Self {
        let buffer = api.create_vertex_buffer(&data);
        Self { data, buffer }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Point `location` at the attribute starting `data_offset` floats into
    /// the buffer and enable it.
    pub fn set_vertex_attrib_pointer(
        &self,
        api: &mut dyn GraphicsApi,
        data_offset: usize,
        location: AttributeLocation,
        component_count: u32,
        stride: u32,
    ) {
        api.vertex_attrib_pointer(AttribPointer {
            location,
            buffer: self.buffer,
            offset: data_offset as u32,
            component_count,
            stride,
        });
        api.enable_vertex_attrib_array(location);
    }

    /// Rewrite `values.len()` floats starting at `offset`, locally and on the
    /// backend.
    pub fn update(&mut self, api: &mut dyn GraphicsApi, offset: usize, values: &[f32]) {
        self.data[offset..offset + values.len()].copy_from_slice(values);
        api.update_vertex_buffer(self.buffer, offset, values);
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        api.delete_buffer(self.buffer);
    }
}

/// 16-bit index data uploaded once.
#[derive(Debug)]
pub struct IndexBuffer {
    buffer: BufferId,
    count: u32,
}

impl IndexBuffer {
    pub fn new(api: &mut dyn GraphicsApi, indices: &[u16]) -> Self {
        Self {
            buffer: api.create_index_buffer(indices),
            count: indices.len() as u32,
        }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn delete(self, api: &mut dyn GraphicsApi) {
        api.delete_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_render::{Command, RecordingApi};

    #[test]
    fn attrib_pointer_describes_sub_range_and_enables() {
        let mut api = RecordingApi::new();
        let va = VertexArray::new(&mut api, vec![0.0; 20]);
        api.take_commands();

        va.set_vertex_attrib_pointer(&mut api, 2, AttributeLocation(1), 3, 20);

        assert_eq!(
            api.commands(),
            &[
                Command::VertexAttribPointer(AttribPointer {
                    location: AttributeLocation(1),
                    buffer: va.buffer(),
                    offset: 2,
                    component_count: 3,
                    stride: 20,
                }),
                Command::EnableVertexAttribArray(AttributeLocation(1)),
            ]
        );
    }

    #[test]
    fn consecutive_pointers_are_independent() {
        let mut api = RecordingApi::new();
        let va = VertexArray::new(&mut api, vec![0.0; 8]);
        va.set_vertex_attrib_pointer(&mut api, 2, AttributeLocation(1), 2, 16);
        va.set_vertex_attrib_pointer(&mut api, 0, AttributeLocation(0), 2, 16);
        let offsets: Vec<u32> = api
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::VertexAttribPointer(p) => Some(p.offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![2, 0]);
    }

    #[test]
    fn update_keeps_local_and_backend_copies_in_sync() {
        let mut api = RecordingApi::new();
        let mut va = VertexArray::new(&mut api, vec![0.0; 6]);
        va.update(&mut api, 3, &[1.0, 2.0, 3.0]);
        assert_eq!(va.data(), &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(api.vertex_buffer(va.buffer()), Some(va.data()));
    }

    #[test]
    fn index_buffer_counts_indices() {
        let mut api = RecordingApi::new();
        let ib = IndexBuffer::new(&mut api, &[0, 1, 2, 2, 1, 3]);
        assert_eq!(ib.count(), 6);
        assert_eq!(api.index_buffer(ib.buffer()).map(|i| i.len()), Some(6));
    }

    #[test]
    fn deleting_releases_the_backend_buffer() {
        let mut api = RecordingApi::new();
        let va = VertexArray::new(&mut api, vec![0.0; 6]);
        let ib = IndexBuffer::new(&mut api, &[0, 1, 2]);
        let (vb, ibid) = (va.buffer(), ib.buffer());
        assert_eq!(api.buffer_count(), 2);

        va.delete(&mut api);
        ib.delete(&mut api);
        assert_eq!(api.buffer_count(), 0);
        assert_eq!(api.vertex_buffer(vb), None);
        assert_eq!(api.index_buffer(ibid), None);
    }
}
