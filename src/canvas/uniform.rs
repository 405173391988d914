use crate::math::{Mat4, ortho};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    transform: [[f32; 4]; 4],
}

impl Uniforms {
    pub fn new() -> Self {
        Self {
            transform: Mat4::identity().into(),
        }
    }

    /// Window pixels, origin top-left, y down.
    pub fn update_projection(&mut self, window_size: (f32, f32)) {
        let (width, height) = (window_size.0.max(1.0), window_size.1.max(1.0));
        self.transform = ortho(0.0, width, height, 0.0, -1.0, 1.0).into();
    }
}
