use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::PI;

pub struct Camera {
    pub position: Vector3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vector3<f32>) -> Self {
        Camera {
            position,
            target: Point3::origin(),
            up: Vector3::y(),
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&Point3::from(self.position), &self.target, &self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect, self.fov_y, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn look_at(&mut self, point: Point3<f32>) {
        self.target = point;
    }

    /// Moves `t` of the remaining distance toward `goal`.
    pub fn lerp_towards(&mut self, goal: &Vector3<f32>, t: f32) {
        self.position += (goal - self.position) * t;
    }
}

/// Drag to orbit around the target, wheel to zoom, with damped rotation.
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enabled: bool,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    pending_zoom: f32,
    dragging: bool,
    last_pointer: (i32, i32),
}

const POLAR_EPSILON: f32 = 0.01;

impl Default for OrbitControls {
    fn default() -> Self {
        OrbitControls {
            target: Point3::origin(),
            enabled: true,
            damping: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 0.25,
            min_distance: 10.0,
            max_distance: 800.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pending_zoom: 0.0,
            dragging: false,
            last_pointer: (0, 0),
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        self.dragging = true;
        self.last_pointer = (x, y);
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        if !self.dragging {
            return;
        }
        let dx = x - self.last_pointer.0;
        let dy = y - self.last_pointer.1;
        self.last_pointer = (x, y);
        if self.enabled {
            self.delta_theta -= dx as f32 * self.rotate_speed;
            self.delta_phi -= dy as f32 * self.rotate_speed;
        }
    }

    pub fn wheel(&mut self, delta: f32) {
        if self.enabled {
            self.pending_zoom += delta * self.zoom_speed;
        }
    }

    /// Drops any motion still being damped out.
    pub fn stop(&mut self) {
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pending_zoom = 0.0;
    }

    /// Re-reads the camera position each step so writes from elsewhere are kept.
    pub fn update(&mut self, camera: &mut Camera) {
        if !self.enabled {
            self.stop();
            return;
        }

        let offset = camera.position - self.target.coords;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.delta_theta * self.damping;
        phi = (phi + self.delta_phi * self.damping).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius + self.pending_zoom).clamp(self.min_distance, self.max_distance);

        camera.position = self.target.coords
            + Vector3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        camera.look_at(self.target);

        self.delta_theta *= 1.0 - self.damping;
        self.delta_phi *= 1.0 - self.damping;
        self.pending_zoom = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lerp_closes_one_percent_per_step() {
        let mut camera = Camera::new(Vector3::new(0.0, 0.0, 100.0));
        camera.lerp_towards(&Vector3::zeros(), 0.01);
        assert_relative_eq!(camera.position.z, 99.0, epsilon = 1e-4);
    }

    #[test]
    fn drag_orbits_at_constant_distance() {
        let mut camera = Camera::new(Vector3::new(-100.0, 120.0, 250.0));
        let start = camera.position.norm();
        let mut controls = OrbitControls::new();
        controls.pointer_down(0, 0);
        controls.pointer_move(40, 10);
        controls.pointer_up();
        let before = camera.position;
        for _ in 0..60 {
            controls.update(&mut camera);
        }
        assert!((camera.position - before).norm() > 1.0);
        assert_relative_eq!(camera.position.norm(), start, epsilon = 1e-2);
    }

    #[test]
    fn damping_decays_motion() {
        let mut camera = Camera::new(Vector3::new(0.0, 50.0, 200.0));
        let mut controls = OrbitControls::new();
        controls.pointer_down(0, 0);
        controls.pointer_move(100, 0);
        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let settled = camera.position;
        controls.update(&mut camera);
        assert!((camera.position - settled).norm() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::new(Vector3::new(0.0, 0.0, 50.0));
        let mut controls = OrbitControls::new();
        controls.wheel(-10_000.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.norm(), controls.min_distance, epsilon = 1e-3);
    }

    #[test]
    fn disabled_controls_leave_camera_alone() {
        let mut camera = Camera::new(Vector3::new(10.0, 20.0, 30.0));
        let mut controls = OrbitControls::new();
        controls.enabled = false;
        controls.pointer_down(0, 0);
        controls.pointer_move(50, 50);
        controls.wheel(100.0);
        controls.update(&mut camera);
        assert_eq!(camera.position, Vector3::new(10.0, 20.0, 30.0));
    }
}
