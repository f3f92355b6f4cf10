use crate::body::BodyKind;

/// One kind's worth of packed vertex data, produced by
/// [`World::bodies_by_kind`](crate::world::World::bodies_by_kind).
///
/// Each vertex is `position components…, r, g, b, a, radius`, interleaved the
/// way a point-sprite renderer binds its attributes. The renderer itself
/// (buffers, shaders, camera) lives outside this crate.
#[derive(Clone, Debug)]
pub struct RenderBatch {
    pub kind: BodyKind,
    /// f32 values per vertex: D + 5.
    pub stride: usize,
    pub data: Vec<f32>,
}

impl RenderBatch {
    /// Vertices in the batch.
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
