/// Column-major 4x4 matrix, laid out the way WGSL `mat4x4<f32>` expects.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub data: [[f32; 4]; 4],
}

impl Mat4 {
    pub fn new(data: [[f32; 4]; 4]) -> Self {
        Self { data }
    }

    pub fn identity() -> Self {
        Self {
            data: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Transforms a point on the z = 0 plane.
    pub fn transform_point(&self, x: f32, y: f32) -> [f32; 2] {
        let d = &self.data;
        let w = d[0][3] * x + d[1][3] * y + d[3][3];
        let tx = d[0][0] * x + d[1][0] * y + d[3][0];
        let ty = d[0][1] * x + d[1][1] * y + d[3][1];
        if w != 0.0 { [tx / w, ty / w] } else { [tx, ty] }
    }
}

impl From<Mat4> for [[f32; 4]; 4] {
    fn from(mat: Mat4) -> Self {
        mat.data
    }
}
