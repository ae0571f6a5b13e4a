use crate::engine::scene::{Geometry, GeometryId, Material, Node, NodeId, Scene};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

pub struct Starfield {
    pub dome: NodeId,
    pub stars: NodeId,
}

/// Seeded points on a shell just inside the sky dome.
pub fn star_points(count: usize, radius: f32, seed: u64) -> Vec<f32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(count * 3);
    for _ in 0..count {
        let u: f32 = rng.gen_range(-1.0..1.0);
        let phi: f32 = rng.gen_range(0.0..2.0 * PI);
        let r = radius * rng.gen_range(0.8..0.95);
        let s = (1.0 - u * u).sqrt();
        points.extend_from_slice(&[r * s * phi.cos(), r * u, r * s * phi.sin()]);
    }
    points
}

impl Starfield {
    pub fn build(
        scene: &mut Scene,
        parent: NodeId,
        sphere: GeometryId,
        texture_url: String,
        radius: f32,
        count: usize,
        seed: u64,
    ) -> Self {
        let dome = scene.add(
            Some(parent),
            Node::drawable("sky dome", sphere, Material::textured(texture_url, false)).scaled(radius),
        );
        let geometry = scene.add_geometry(Geometry::Points(star_points(count, radius, seed)));
        let stars = scene.add(
            Some(parent),
            Node::drawable("stars", geometry, Material::basic([0.9, 0.9, 1.0])),
        );
        Starfield { dome, stars }
    }
}
