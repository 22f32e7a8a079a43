use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;

use crate::selector::TexturePair;

/// Shader-visible material parameters. Textures are pool slot indices.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UniformState {
    pub time: f32,
    pub distortion: f32,
    pub progress: f32,
    pub texture_a: Option<usize>,
    pub texture_b: Option<usize>,
}

impl UniformState {
    /// Swaps both texture slots together.
    pub fn set_pair(&mut self, pair: TexturePair) {
        self.texture_a = Some(pair.a);
        self.texture_b = Some(pair.b);
    }

    pub fn pair(&self) -> Option<TexturePair> {
        Some(TexturePair {
            a: self.texture_a?,
            b: self.texture_b?,
        })
    }
}

#[repr(C)]
#[derive(Default, Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniforms {
    view_proj: [[f32; 4]; 4],
    time: f32,
    distortion: f32,
    progress: f32,
    _padding: f32,
}

impl MaterialUniforms {
    pub fn new(view_proj: Matrix4<f32>, state: &UniformState) -> Self {
        Self {
            view_proj: view_proj.into(),
            time: state.time,
            distortion: state.distortion,
            progress: state.progress,
            _padding: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = UniformState::default();
        assert_eq!(state.time, 0.0);
        assert_eq!(state.distortion, 0.0);
        assert_eq!(state.progress, 0.0);
        assert_eq!(state.pair(), None);
    }

    #[test]
    fn test_pair_set_together() {
        let mut state = UniformState::default();
        state.set_pair(TexturePair { a: 4, b: 5 });
        assert_eq!(state.texture_a, Some(4));
        assert_eq!(state.texture_b, Some(5));
        assert_eq!(state.pair(), Some(TexturePair { a: 4, b: 5 }));
    }

    #[test]
    fn test_gpu_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialUniforms>() % 16, 0);
    }
}
