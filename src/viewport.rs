use cgmath::{Deg, Matrix4, Point3, Vector3};

use crate::config::{CAMERA_DISTANCE, CAMERA_FAR, CAMERA_FOV_Y_DEG, CAMERA_NEAR, FALLBACK_ASPECT};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Container size in logical pixels plus the pixel-density scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

/// Physical size of the render and bloom buffers. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferSize {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale: f32) -> Self {
        Self {
            width,
            height,
            scale: if scale > 0.0 { scale } else { 1.0 },
        }
    }

    pub fn buffer_size(&self) -> BufferSize {
        BufferSize {
            width: ((self.width as f32 * self.scale).round() as u32).max(1),
            height: ((self.height as f32 * self.scale).round() as u32).max(1),
        }
    }

    fn aspect(&self) -> Option<f32> {
        if self.height == 0 {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub fov_y: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    pub position: Point3<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        let mut camera = Self {
            fov_y: Deg(CAMERA_FOV_Y_DEG),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            aspect,
            position: Point3::new(0.0, 0.0, CAMERA_DISTANCE),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_projection();
        camera
    }

    pub fn update_projection(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        let view = Matrix4::look_at_rh(self.position, Point3::new(0.0, 0.0, 0.0), Vector3::unit_y());
        self.projection * view
    }
}

/// Builds the camera for a freshly measured container.
pub fn camera_for(viewport: &Viewport) -> Camera {
    Camera::new(viewport.aspect().unwrap_or(FALLBACK_ASPECT))
}

/// Applies a container resize to the viewport and camera.
///
/// Returns the new buffer size when anything observable changed, `None` when
/// the dimensions are identical to the current ones. A zero height keeps the
/// last valid aspect ratio.
pub fn apply_resize(viewport: &mut Viewport, camera: &mut Camera, width: u32, height: u32) -> Option<BufferSize> {
    if viewport.width == width && viewport.height == height {
        return None;
    }
    viewport.width = width;
    viewport.height = height;
    if let Some(aspect) = viewport.aspect() {
        camera.aspect = aspect;
    }
    camera.update_projection();
    Some(viewport.buffer_size())
}

/// Applies a new pixel-density scale. Returns the new buffer size if it changed.
pub fn apply_scale(viewport: &mut Viewport, scale: f32) -> Option<BufferSize> {
    if scale <= 0.0 || scale == viewport.scale {
        return None;
    }
    let before = viewport.buffer_size();
    viewport.scale = scale;
    let after = viewport.buffer_size();
    (before != after).then_some(after)
}
