use crate::engine::mesh::Mesh;
use crate::engine::scene::{Geometry, GeometryId, LabelId, Material, Node, NodeId, Scene};
use crate::error::{AppError, AppResult};
use nalgebra::{Unit, UnitQuaternion, Vector3};

const RING_SEGMENTS: u16 = 96;

#[derive(Clone, Debug, PartialEq)]
pub struct RingSpec {
    pub inner: f32,
    pub outer: f32,
    pub texture: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoronaSpec {
    pub scale: f32,
    pub opacity: f32,
    pub color: [f32; 3],
}

/// A sphere hung off a pivot at the origin. Rotating the pivot revolves the body.
pub struct CelestialBody {
    pub name: String,
    pub pivot: NodeId,
    pub mesh: NodeId,
    pub ring: Option<NodeId>,
    pub corona: Option<NodeId>,
    pub label: LabelId,
    pub tilt_axis: Unit<Vector3<f32>>,
    /// Tilts the sphere's pole onto `tilt_axis`.
    pub base_orientation: UnitQuaternion<f32>,
    pub base_rotation_rate: f32,
    pub base_revolution_rate: f32,
    pub distance: f32,
    pub spin_angle: f32,
    pub orbit_angle: f32,
    pub ring_angle: f32,
}

pub struct BodyBuilder {
    name: String,
    radius: f32,
    distance: f32,
    lit: bool,
    texture: Option<String>,
    tilt_degrees: f32,
    rotation_rate: f32,
    revolution_rate: f32,
    ring: Option<RingSpec>,
    corona: Option<CoronaSpec>,
}

impl BodyBuilder {
    fn new(name: &str, radius: f32, distance: f32, lit: bool) -> Self {
        BodyBuilder {
            name: name.to_string(),
            radius,
            distance,
            lit,
            texture: None,
            tilt_degrees: 0.0,
            rotation_rate: 0.0,
            revolution_rate: 0.0,
            ring: None,
            corona: None,
        }
    }

    /// Lit by the sun.
    pub fn textured(name: &str, radius: f32, distance: f32) -> Self {
        Self::new(name, radius, distance, true)
    }

    /// Drawn at full brightness, used for the sun and the focus set.
    pub fn plain(name: &str, radius: f32, distance: f32) -> Self {
        Self::new(name, radius, distance, false)
    }

    pub fn texture(mut self, url: impl Into<String>) -> Self {
        self.texture = Some(url.into());
        self
    }

    pub fn tilt_degrees(mut self, degrees: f32) -> Self {
        self.tilt_degrees = degrees;
        self
    }

    pub fn rates(mut self, rotation: f32, revolution: f32) -> Self {
        self.rotation_rate = rotation;
        self.revolution_rate = revolution;
        self
    }

    pub fn ring(mut self, ring: RingSpec) -> Self {
        self.ring = Some(ring);
        self
    }

    pub fn corona(mut self, corona: CoronaSpec) -> Self {
        self.corona = Some(corona);
        self
    }

    fn validate(&self) -> AppResult<()> {
        let name = self.name.as_str();
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(AppError::invalid_body(name, format!("radius must be positive, got {}", self.radius)));
        }
        if !(self.distance.is_finite() && self.distance >= 0.0) {
            return Err(AppError::invalid_body(name, format!("distance must not be negative, got {}", self.distance)));
        }
        if self.rotation_rate < 0.0 || self.revolution_rate < 0.0 {
            return Err(AppError::invalid_body(name, "rates must not be negative"));
        }
        if let Some(ring) = &self.ring {
            if !(ring.inner > 0.0 && ring.inner < ring.outer) {
                return Err(AppError::invalid_body(name, "ring inner radius must be below outer"));
            }
        }
        if let Some(corona) = &self.corona {
            if corona.scale <= 1.0 {
                return Err(AppError::invalid_body(name, "corona must be larger than the body"));
            }
        }
        Ok(())
    }

    pub fn build(self, scene: &mut Scene, parent: NodeId, sphere: GeometryId) -> AppResult<CelestialBody> {
        self.validate()?;

        let tilt = self.tilt_degrees.to_radians();
        let base_orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -tilt);
        let tilt_axis = Unit::new_normalize(base_orientation * Vector3::y());
        let offset = Vector3::new(self.distance, 0.0, 0.0);

        let pivot = scene.add(Some(parent), Node::group(format!("{} pivot", self.name)));

        let material = match &self.texture {
            Some(url) => Material::textured(url.clone(), self.lit),
            None => Material {
                lit: self.lit,
                ..Material::basic([1.0, 1.0, 1.0])
            },
        };
        let mut mesh_node = Node::drawable(self.name.clone(), sphere, material)
            .at(offset)
            .scaled(self.radius);
        mesh_node.rotation = base_orientation;
        let mesh = scene.add(Some(pivot), mesh_node);

        let ring = self.ring.as_ref().map(|spec| {
            let geometry = scene.add_geometry(Geometry::Triangles(Mesh::ring(spec.inner, spec.outer, RING_SEGMENTS)));
            let material = Material {
                transparent: true,
                ..Material::textured(spec.texture.clone(), false)
            };
            scene.add(
                Some(pivot),
                Node::drawable(format!("{} ring", self.name), geometry, material).at(offset),
            )
        });

        let corona = self.corona.as_ref().map(|spec| {
            let material = Material::basic(spec.color).with_opacity(spec.opacity);
            scene.add(
                Some(pivot),
                Node::drawable(format!("{} corona", self.name), sphere, material)
                    .at(offset)
                    .scaled(self.radius * spec.scale),
            )
        });

        let label = scene.add_label(mesh, self.name.clone());

        Ok(CelestialBody {
            name: self.name,
            pivot,
            mesh,
            ring,
            corona,
            label,
            tilt_axis,
            base_orientation,
            base_rotation_rate: self.rotation_rate,
            base_revolution_rate: self.revolution_rate,
            distance: self.distance,
            spin_angle: 0.0,
            orbit_angle: 0.0,
            ring_angle: 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scene() -> (Scene, NodeId, GeometryId) {
        let mut scene = Scene::new();
        let root = scene.add(None, Node::group("root"));
        let sphere = scene.add_geometry(Geometry::Triangles(Mesh::sphere(8, 4)));
        (scene, root, sphere)
    }

    #[test]
    fn body_sits_at_orbital_distance() {
        let (mut scene, root, sphere) = scene();
        let body = BodyBuilder::textured("Earth", 6.0, 72.8)
            .texture("earth.jpg")
            .tilt_degrees(23.44)
            .rates(1.0, 1.0)
            .build(&mut scene, root, sphere)
            .unwrap();
        let p = scene.world_position(body.mesh);
        assert_relative_eq!(p.x, 72.8, epsilon = 1e-4);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-4);
        assert_eq!(scene.node(body.mesh).parent, Some(body.pivot));
        assert_eq!(scene.label(body.label).anchor, body.mesh);
        assert_eq!(scene.label(body.label).text, "Earth");
        assert_relative_eq!(body.tilt_axis.norm(), 1.0, epsilon = 1e-6);
        assert!(body.tilt_axis.x > 0.0);
    }

    #[test]
    fn ring_shares_the_pivot() {
        let (mut scene, root, sphere) = scene();
        let body = BodyBuilder::textured("Saturn", 10.0, 184.8)
            .texture("saturn.jpg")
            .ring(RingSpec {
                inner: 10.0,
                outer: 20.0,
                texture: "saturnring.png".to_string(),
            })
            .build(&mut scene, root, sphere)
            .unwrap();
        let ring = body.ring.unwrap();
        assert_eq!(scene.node(ring).parent, Some(body.pivot));
        assert_relative_eq!(scene.world_position(ring).x, 184.8, epsilon = 1e-3);
    }

    #[test]
    fn plain_body_is_unlit() {
        let (mut scene, root, sphere) = scene();
        let body = BodyBuilder::plain("Mars", 4.0, 95.2)
            .texture("mars.jpg")
            .build(&mut scene, root, sphere)
            .unwrap();
        let material = &scene.node(body.mesh).drawable.as_ref().unwrap().material;
        assert!(!material.lit);
        assert_eq!(material.texture.as_deref(), Some("mars.jpg"));
    }

    #[test]
    fn rejects_bad_parameters() {
        let (mut scene, root, sphere) = scene();
        assert!(BodyBuilder::textured("Nil", 0.0, 10.0).build(&mut scene, root, sphere).is_err());
        assert!(BodyBuilder::textured("Far", 1.0, -1.0).build(&mut scene, root, sphere).is_err());
        let ring = RingSpec {
            inner: 5.0,
            outer: 5.0,
            texture: "ring.png".to_string(),
        };
        let err = BodyBuilder::textured("Flat", 1.0, 10.0)
            .ring(ring)
            .build(&mut scene, root, sphere)
            .err()
            .unwrap();
        assert!(matches!(err, AppError::InvalidBody { ref name, .. } if name == "Flat"));
    }
}
