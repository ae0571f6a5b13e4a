use crate::config::SolarConfig;
use crate::engine::scene::Scene;
use crate::solar::body::CelestialBody;
use crate::solar::state::SimulationState;
use nalgebra::{UnitQuaternion, Vector3};
use std::f32::consts::TAU;

/// Angles added to a body in one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    pub spin: f32,
    pub orbit: f32,
}

pub fn spin_increment(body: &CelestialBody, state: &SimulationState, config: &SolarConfig) -> f32 {
    config.axis_inclination_factor * body.base_rotation_rate * state.earth_rot * state.slow_rate_multiplier
}

pub fn orbit_increment(body: &CelestialBody, state: &SimulationState, config: &SolarConfig) -> f32 {
    config.axis_inclination_factor * body.base_revolution_rate * state.earth_rev * state.slow_rate_multiplier
}

/// Advances the body's angles by one tick. Stored angles wrap at a full turn.
pub fn advance(body: &mut CelestialBody, state: &SimulationState, config: &SolarConfig) -> Motion {
    let motion = Motion {
        spin: spin_increment(body, state, config),
        orbit: orbit_increment(body, state, config),
    };
    body.spin_angle = (body.spin_angle + motion.spin).rem_euclid(TAU);
    body.orbit_angle = (body.orbit_angle + motion.orbit).rem_euclid(TAU);
    body.ring_angle = (body.ring_angle + motion.spin * config.ring_shear).rem_euclid(TAU);
    motion
}

/// Writes the body's angles into its pivot, mesh and ring nodes.
pub fn apply(body: &CelestialBody, scene: &mut Scene) {
    scene.set_rotation(
        body.pivot,
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), body.orbit_angle),
    );
    scene.set_rotation(
        body.mesh,
        UnitQuaternion::from_axis_angle(&body.tilt_axis, body.spin_angle) * body.base_orientation,
    );
    if let Some(ring) = body.ring {
        scene.set_rotation(ring, UnitQuaternion::from_axis_angle(&Vector3::y_axis(), body.ring_angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mesh::Mesh;
    use crate::engine::scene::{Geometry, Node};
    use crate::solar::body::{BodyBuilder, RingSpec};
    use crate::solar::state::ControlEvent;
    use approx::assert_relative_eq;

    fn earth(scene: &mut Scene) -> CelestialBody {
        let root = scene.add(None, Node::group("root"));
        let sphere = scene.add_geometry(Geometry::Triangles(Mesh::sphere(8, 4)));
        BodyBuilder::textured("Earth", 6.0, 72.8)
            .tilt_degrees(23.44)
            .rates(1.0, 1.0)
            .ring(RingSpec {
                inner: 7.0,
                outer: 9.0,
                texture: "ring.png".to_string(),
            })
            .build(scene, root, sphere)
            .unwrap()
    }

    #[test]
    fn increments_follow_the_settings() {
        let mut scene = Scene::new();
        let body = earth(&mut scene);
        let config = SolarConfig::default();
        let state = SimulationState::new(&config);
        assert_relative_eq!(spin_increment(&body, &state, &config), 0.05);
        assert_relative_eq!(orbit_increment(&body, &state, &config), 0.005);

        let held = state.apply(&ControlEvent::PointerDown, &config);
        assert_relative_eq!(spin_increment(&body, &held, &config), 0.05 * config.held_slow_rate);
    }

    #[test]
    fn angles_only_move_forward() {
        let mut scene = Scene::new();
        let mut body = earth(&mut scene);
        let config = SolarConfig::default();
        let state = SimulationState::new(&config);
        let mut spin_total = 0.0_f64;
        let mut orbit_total = 0.0_f64;
        for tick in 1..=1000 {
            let motion = advance(&mut body, &state, &config);
            assert!(motion.spin >= 0.0 && motion.orbit >= 0.0);
            spin_total += motion.spin as f64;
            orbit_total += motion.orbit as f64;
            assert_relative_eq!(orbit_total, tick as f64 * 0.005, epsilon = 1e-4);
        }
        assert_relative_eq!(spin_total, 50.0, epsilon = 1e-3);
        assert_relative_eq!(body.spin_angle, (50.0_f32).rem_euclid(TAU), epsilon = 1e-2);
    }

    #[test]
    fn ring_turns_slower_than_planet() {
        let mut scene = Scene::new();
        let mut body = earth(&mut scene);
        let config = SolarConfig::default();
        let state = SimulationState::new(&config);
        advance(&mut body, &state, &config);
        assert_relative_eq!(body.ring_angle, body.spin_angle * config.ring_shear);
    }

    #[test]
    fn pivot_rotation_revolves_the_mesh() {
        let mut scene = Scene::new();
        let mut body = earth(&mut scene);
        body.orbit_angle = std::f32::consts::FRAC_PI_2;
        apply(&body, &mut scene);
        let p = scene.world_position(body.mesh);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(p.z, -72.8, epsilon = 1e-3);
        let ring = scene.world_position(body.ring.unwrap());
        assert_relative_eq!((ring - p).norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_speed_freezes_bodies() {
        let mut scene = Scene::new();
        let mut body = earth(&mut scene);
        let config = SolarConfig::default();
        let state = SimulationState::new(&config)
            .apply(&ControlEvent::SetRotationSpeed(0.0), &config)
            .apply(&ControlEvent::SetRevolutionSpeed(0.0), &config);
        let motion = advance(&mut body, &state, &config);
        assert_eq!(motion, Motion { spin: 0.0, orbit: 0.0 });
        assert_eq!(body.spin_angle, 0.0);
    }
}
