use crate::engine::mesh::circle_line;
use crate::engine::scene::{Geometry, Material, Node, NodeId, Scene};
use crate::error::{AppError, AppResult};

const ORBIT_SEGMENTS: u16 = 128;
const ORBIT_COLOR: [f32; 3] = [0.75, 0.8, 1.0];

/// Static guide circle for an orbital path. Never parented to a pivot.
pub struct OrbitRing {
    pub node: NodeId,
    pub radius: f32,
}

impl OrbitRing {
    pub fn build(scene: &mut Scene, parent: NodeId, radius: f32, opacity: f32) -> AppResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(AppError::invalid_body("orbit", format!("radius must be positive, got {radius}")));
        }
        let geometry = scene.add_geometry(Geometry::LineLoop(circle_line(radius, ORBIT_SEGMENTS)));
        let material = Material::basic(ORBIT_COLOR).with_opacity(opacity);
        let node = scene.add(Some(parent), Node::drawable(format!("orbit {radius}"), geometry, material));
        Ok(OrbitRing { node, radius })
    }

    pub fn set_opacity(&self, scene: &mut Scene, opacity: f32) {
        scene.set_opacity(self.node, opacity);
        scene.set_visible(self.node, opacity > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_ring_is_translucent_line_loop() {
        let mut scene = Scene::new();
        let root = scene.add(None, Node::group("root"));
        let orbit = OrbitRing::build(&mut scene, root, 72.8, 0.35).unwrap();
        let drawable = scene.node(orbit.node).drawable.as_ref().unwrap();
        assert!(matches!(scene.geometry(drawable.geometry), Geometry::LineLoop(_)));
        assert!(drawable.material.transparent);
        assert_eq!(drawable.material.opacity, 0.35);
    }

    #[test]
    fn zero_opacity_hides_the_ring() {
        let mut scene = Scene::new();
        let root = scene.add(None, Node::group("root"));
        let orbit = OrbitRing::build(&mut scene, root, 10.0, 0.35).unwrap();
        orbit.set_opacity(&mut scene, 0.0);
        assert!(!scene.node(orbit.node).visible);
        orbit.set_opacity(&mut scene, 0.35);
        assert!(scene.node(orbit.node).visible);
    }

    #[test]
    fn rejects_non_positive_radius() {
        let mut scene = Scene::new();
        let root = scene.add(None, Node::group("root"));
        assert!(OrbitRing::build(&mut scene, root, 0.0, 0.35).is_err());
    }
}
