use std::f32::consts::PI;

/// Floats per vertex: position(3), color(3), uv(2).
pub const VERTEX_STRIDE: usize = 8;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Unit UV sphere. The position doubles as the normal in the shader.
    pub fn sphere(width_segments: u16, height_segments: u16) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let mut vertices = Vec::with_capacity(
            (width_segments as usize + 1) * (height_segments as usize + 1) * VERTEX_STRIDE,
        );
        let mut indices = Vec::new();

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let theta = v * PI;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let phi = u * 2.0 * PI;
                let x = -phi.cos() * theta.sin();
                let y = theta.cos();
                let z = phi.sin() * theta.sin();
                vertices.extend_from_slice(&[x, y, z, 1.0, 1.0, 1.0, u, v]);
            }
        }

        let row = width_segments + 1;
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Mesh { vertices, indices }
    }

    /// Flat annulus in the XZ plane. `u` runs from the inner edge (0) to the outer edge (1)
    /// so a strip texture maps radially.
    pub fn ring(inner: f32, outer: f32, segments: u16) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity((segments as usize + 1) * 2 * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(segments as usize * 6);

        for i in 0..=segments {
            let angle = i as f32 / segments as f32 * 2.0 * PI;
            let (sin, cos) = angle.sin_cos();
            let v = i as f32 / segments as f32;
            vertices.extend_from_slice(&[inner * cos, 0.0, inner * sin, 1.0, 1.0, 1.0, 0.0, v]);
            vertices.extend_from_slice(&[outer * cos, 0.0, outer * sin, 1.0, 1.0, 1.0, 1.0, v]);
        }

        for i in 0..segments {
            let base = i * 2;
            indices.extend_from_slice(&[base, base + 1, base + 3, base, base + 3, base + 2]);
        }

        Mesh { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}

/// Position-only points of a closed circle in the XZ plane, drawn as a line loop.
pub fn circle_line(radius: f32, segments: u16) -> Vec<f32> {
    let segments = segments.max(3);
    let mut points = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        let angle = i as f32 * 2.0 * PI / segments as f32;
        points.extend_from_slice(&[radius * angle.cos(), 0.0, radius * angle.sin()]);
    }
    points
}
