use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl PointVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// A plane of `(segments_x + 1) * (segments_y + 1)` points centred on the origin
/// in the z = 0 plane. Rows run top to bottom; uv (0, 1) is the top-left corner.
pub fn point_grid(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Vec<PointVertex> {
    let segments_x = segments_x.max(1);
    let segments_y = segments_y.max(1);
    let step_x = width / segments_x as f32;
    let step_y = height / segments_y as f32;

    let mut points = Vec::with_capacity(((segments_x + 1) * (segments_y + 1)) as usize);
    for iy in 0..=segments_y {
        let y = height * 0.5 - iy as f32 * step_y;
        let v = 1.0 - iy as f32 / segments_y as f32;
        for ix in 0..=segments_x {
            let x = ix as f32 * step_x - width * 0.5;
            let u = ix as f32 / segments_x as f32;
            points.push(PointVertex { position: [x, y, 0.0], uv: [u, v] });
        }
    }
    points
}
