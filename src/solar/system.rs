use crate::config::SolarConfig;
use crate::engine::camera::{Camera, OrbitControls};
use crate::engine::mesh::Mesh;
use crate::engine::scene::{Geometry, Node, NodeId, Scene};
use crate::error::{AppError, AppResult};
use crate::solar::animation;
use crate::solar::body::{BodyBuilder, CelestialBody, CoronaSpec, RingSpec};
use crate::solar::orbit::OrbitRing;
use crate::solar::planet::Planet;
use crate::solar::starfield::Starfield;
use crate::solar::state::{Axis, ControlEvent, FocusSelection, SimulationState, CAMERA_AXIS_LIMIT};
use crate::solar::visibility::{render_visibility, VisibilitySet};
use nalgebra::Point3;

const CORONA_COLOR: [f32; 3] = [1.0, 0.62, 0.2];
const CAMERA_MOVE_EPSILON: f32 = 1e-2;

/// Both representations of one planet plus its guide orbit.
pub struct PlanetBodies {
    pub planet: Planet,
    pub primary: CelestialBody,
    pub alt: CelestialBody,
    pub orbit: OrbitRing,
}

pub struct SolarSystem {
    pub config: SolarConfig,
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    state: SimulationState,
    primary_root: NodeId,
    sun: CelestialBody,
    planets: Vec<PlanetBodies>,
    starfield: Starfield,
    ticks: u64,
}

impl SolarSystem {
    pub fn new(config: SolarConfig) -> AppResult<Self> {
        config.validate()?;

        let mut scene = Scene::new();
        let sphere = scene.add_geometry(Geometry::Triangles(Mesh::sphere(48, 32)));
        let root = scene.add(None, Node::group("scene"));

        let starfield = Starfield::build(
            &mut scene,
            root,
            sphere,
            config.texture_url(&config.skydome_texture),
            config.skydome_radius,
            config.star_count,
            config.star_seed,
        );

        let primary_root = scene.add(Some(root), Node::group("primary bodies"));
        let alt_root = scene.add(Some(root), Node::group("alt bodies"));
        let orbit_root = scene.add(Some(root), Node::group("orbits"));

        let sun_config = &config.sun;
        let sun = BodyBuilder::plain("Sun", sun_config.radius, 0.0)
            .texture(config.texture_url(&sun_config.texture))
            .tilt_degrees(sun_config.tilt_degrees)
            .rates(sun_config.rotation_rate, sun_config.corona_rate)
            .corona(CoronaSpec {
                scale: sun_config.corona_scale,
                opacity: sun_config.corona_opacity,
                color: CORONA_COLOR,
            })
            .build(&mut scene, primary_root, sphere)?;

        let mut planets = Vec::with_capacity(Planet::ALL.len());
        for planet in Planet::ALL {
            let cfg = config
                .planet(planet)
                .ok_or_else(|| AppError::Config(format!("planet '{}' is missing", planet.as_str())))?;
            let distance = config.planet_distance(planet);
            let name = planet.display_name();
            let ring = cfg.ring.as_ref().map(|r| RingSpec {
                inner: r.inner,
                outer: r.outer,
                texture: config.texture_url(&r.texture),
            });

            let mut primary = BodyBuilder::textured(name, cfg.radius, distance)
                .texture(config.texture_url(&cfg.texture))
                .tilt_degrees(cfg.tilt_degrees)
                .rates(cfg.rotation_rate, cfg.revolution_rate);
            // The alt body does not revolve, so the focus camera has a fixed target.
            let mut alt = BodyBuilder::plain(name, cfg.radius, distance)
                .texture(config.texture_url(cfg.alt_texture.as_deref().unwrap_or(&cfg.texture)))
                .tilt_degrees(cfg.tilt_degrees)
                .rates(cfg.rotation_rate, 0.0);
            if let Some(ring) = ring {
                primary = primary.ring(ring.clone());
                alt = alt.ring(ring);
            }

            planets.push(PlanetBodies {
                planet,
                primary: primary.build(&mut scene, primary_root, sphere)?,
                alt: alt.build(&mut scene, alt_root, sphere)?,
                orbit: OrbitRing::build(&mut scene, orbit_root, distance, config.orbit_opacity)?,
            });
        }

        let camera = Camera::new(config.default_camera());
        let state = SimulationState::new(&config);

        let mut system = SolarSystem {
            config,
            scene,
            camera,
            controls: OrbitControls::new(),
            state,
            primary_root,
            sun,
            planets,
            starfield,
            ticks: 0,
        };
        system.apply_visibility();
        log::debug!(
            "solar system built: {} nodes, {} labels",
            system.scene.len(),
            system.scene.labels().len()
        );
        Ok(system)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn sun(&self) -> &CelestialBody {
        &self.sun
    }

    pub fn planets(&self) -> &[PlanetBodies] {
        &self.planets
    }

    pub fn planet(&self, planet: Planet) -> &PlanetBodies {
        &self.planets[planet.index()]
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn visibility(&self) -> VisibilitySet {
        render_visibility(&self.state, &self.config)
    }

    pub fn dispatch(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SetCameraAxis(axis, value) => {
                let value = value.clamp(-CAMERA_AXIS_LIMIT, CAMERA_AXIS_LIMIT);
                match axis {
                    Axis::X => self.camera.position.x = value,
                    Axis::Y => self.camera.position.y = value,
                    Axis::Z => self.camera.position.z = value,
                }
            }
            ControlEvent::ResetCamera => {
                self.camera.position = self.config.default_camera();
                self.controls.stop();
            }
            _ => {}
        }

        let previous = self.state.focus;
        self.state = self.state.apply(&event, &self.config);
        if self.state.focus != previous {
            self.on_focus_changed();
        }
    }

    fn on_focus_changed(&mut self) {
        log::info!("focus: {}", self.state.focus.as_str());
        self.controls.stop();
        self.controls.enabled = self.state.focus == FocusSelection::Overview;
        if self.controls.enabled {
            self.controls.target = Point3::origin();
            self.camera.look_at(Point3::origin());
        }
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) {
        self.controls.pointer_down(x, y);
        self.dispatch(ControlEvent::PointerDown);
    }

    pub fn pointer_move(&mut self, x: i32, y: i32) {
        self.controls.pointer_move(x, y);
    }

    pub fn pointer_up(&mut self) {
        self.controls.pointer_up();
        self.dispatch(ControlEvent::PointerUp);
    }

    pub fn wheel(&mut self, delta: f32) {
        self.controls.wheel(delta);
    }

    /// One animation frame: transforms, visibility, then camera. Returns whether the camera
    /// moved, so widgets mirroring its position can refresh.
    pub fn tick(&mut self) -> bool {
        let before = self.camera.position;
        let state = self.state;
        let config = &self.config;
        let scene = &mut self.scene;

        animation::advance(&mut self.sun, &state, config);
        animation::apply(&self.sun, scene);
        for bodies in &mut self.planets {
            for body in [&mut bodies.primary, &mut bodies.alt] {
                animation::advance(body, &state, config);
                animation::apply(body, scene);
            }
        }

        self.apply_visibility();

        match self.state.focus.planet() {
            Some(planet) => {
                let goal = self.config.focus_target(planet);
                self.camera.lerp_towards(&goal, self.config.focus_lerp);
                let anchor = self.scene.world_position(self.planets[planet.index()].alt.mesh);
                self.camera.look_at(anchor);
            }
            None => self.controls.update(&mut self.camera),
        }

        self.ticks += 1;
        (self.camera.position - before).norm() > CAMERA_MOVE_EPSILON
    }

    fn apply_visibility(&mut self) {
        let visibility = render_visibility(&self.state, &self.config);
        visibility.apply(&mut self.scene, self.primary_root, &self.sun, &self.planets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::labels::is_displayed;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn system() -> SolarSystem {
        SolarSystem::new(SolarConfig::default()).unwrap()
    }

    fn assert_one_representation_each(system: &SolarSystem) {
        for bodies in system.planets() {
            let primary = system.scene.node(bodies.primary.pivot).visible;
            let alt = system.scene.node(bodies.alt.pivot).visible;
            assert!(primary ^ alt, "{} has primary={primary} alt={alt}", bodies.planet);
        }
    }

    #[test]
    fn builds_sun_planets_and_orbits() {
        let system = system();
        assert_eq!(system.planets().len(), 8);
        assert!(system.sun().corona.is_some());
        assert!(system.planet(Planet::Saturn).primary.ring.is_some());
        assert!(system.planet(Planet::Uranus).alt.ring.is_some());
        assert!(system.planet(Planet::Earth).primary.ring.is_none());
        // sun + 8 primary + 8 alt
        assert_eq!(system.scene.labels().len(), 17);
        let earth = system.scene.world_position(system.planet(Planet::Earth).primary.mesh);
        assert_relative_eq!(earth.x, 2.6 * 28.0, epsilon = 1e-3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SolarConfig::default();
        config.planets.pop();
        assert!(SolarSystem::new(config).is_err());
    }

    #[test]
    fn one_representation_per_planet_every_tick() {
        let mut system = system();
        let events = [
            ControlEvent::Focus(FocusSelection::Planet(Planet::Jupiter)),
            ControlEvent::PointerDown,
            ControlEvent::Focus(FocusSelection::Planet(Planet::Mercury)),
            ControlEvent::ShowLabels(true),
            ControlEvent::Focus(FocusSelection::Overview),
            ControlEvent::PointerUp,
            ControlEvent::Focus(FocusSelection::Planet(Planet::Neptune)),
        ];
        assert_one_representation_each(&system);
        for event in events {
            system.dispatch(event);
            for _ in 0..5 {
                system.tick();
                assert_one_representation_each(&system);
            }
        }
    }

    #[test]
    fn selecting_earth_swaps_bodies_and_flies_the_camera() {
        let mut system = system();
        system.dispatch(ControlEvent::Focus(FocusSelection::Planet(Planet::Earth)));
        system.tick();

        let earth = system.planet(Planet::Earth);
        assert!(system.scene.is_visible_in_tree(earth.alt.mesh));
        assert!(!system.scene.is_visible_in_tree(earth.primary.mesh));
        for bodies in system.planets().iter().filter(|b| b.planet != Planet::Earth) {
            assert!(!system.scene.is_visible_in_tree(bodies.primary.mesh), "{}", bodies.planet);
            assert!(!system.scene.is_visible_in_tree(bodies.alt.mesh), "{}", bodies.planet);
        }

        let goal = Vector3::new(1.2 * 2.6 * system.config.mercury_distance, 2.0, 7.0);
        let mut last = (system.camera.position - goal).norm();
        for _ in 0..1500 {
            system.tick();
            let distance = (system.camera.position - goal).norm();
            assert!(distance <= last);
            last = distance;
        }
        assert!(last < 0.1, "camera still {last} away");
        let anchor = system.scene.world_position(system.planet(Planet::Earth).alt.mesh);
        assert_relative_eq!(system.camera.target, anchor, epsilon = 1e-3);
        assert_relative_eq!(anchor.x, 2.6 * system.config.mercury_distance, epsilon = 1e-3);
    }

    #[test]
    fn reset_camera_restores_default_position() {
        let mut system = system();
        system.dispatch(ControlEvent::SetCameraAxis(Axis::X, 42.0));
        system.dispatch(ControlEvent::SetCameraAxis(Axis::Z, 9_999.0));
        assert_eq!(system.camera.position.z, CAMERA_AXIS_LIMIT);
        system.dispatch(ControlEvent::ResetCamera);
        assert_eq!(system.camera.position, Vector3::new(-100.0, 120.0, 250.0));
    }

    #[test]
    fn pointer_press_reveals_then_restores() {
        let mut system = system();
        system.tick();
        let before = system.visibility();
        system.pointer_down(10, 10);
        system.tick();
        for bodies in system.planets() {
            assert!(system.scene.node(bodies.orbit.node).visible);
            assert_eq!(system.scene.label(bodies.primary.label).opacity, 1.0);
        }
        system.pointer_up();
        system.tick();
        assert_eq!(system.visibility(), before);
        for bodies in system.planets() {
            assert!(!system.scene.node(bodies.orbit.node).visible);
        }
    }

    #[test]
    fn returning_to_overview_hands_camera_back_to_controls() {
        let mut system = system();
        system.dispatch(ControlEvent::Focus(FocusSelection::Planet(Planet::Mars)));
        assert!(!system.controls.enabled);
        system.tick();
        system.dispatch(ControlEvent::Focus(FocusSelection::Overview));
        assert!(system.controls.enabled);
        assert_eq!(system.camera.target, Point3::origin());
        system.tick();
        assert!(system.scene.node(system.primary_root).visible);
    }

    #[test]
    fn planets_revolve_while_alts_stay_put() {
        let mut system = system();
        let alt_before = system.scene.world_position(system.planet(Planet::Mercury).alt.mesh);
        let primary_before = system.scene.world_position(system.planet(Planet::Mercury).primary.mesh);
        for _ in 0..100 {
            system.tick();
        }
        let alt_after = system.scene.world_position(system.planet(Planet::Mercury).alt.mesh);
        let primary_after = system.scene.world_position(system.planet(Planet::Mercury).primary.mesh);
        assert_relative_eq!(alt_before, alt_after, epsilon = 1e-3);
        assert!((primary_after - primary_before).norm() > 1.0);
        assert_eq!(system.ticks(), 100);
    }

    #[test]
    fn camera_sliders_see_the_distance_clamp() {
        let mut system = system();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            system.dispatch(ControlEvent::SetCameraAxis(axis, CAMERA_AXIS_LIMIT));
        }
        assert!(system.camera.position.norm() > system.controls.max_distance);
        assert!(system.tick());
        assert_relative_eq!(system.camera.position.norm(), system.controls.max_distance, epsilon = 1e-2);
        assert!(!system.tick());
    }

    #[test]
    fn pointer_overlay_displays_one_label_per_body_in_focus() {
        let mut system = system();
        system.dispatch(ControlEvent::Focus(FocusSelection::Planet(Planet::Earth)));
        system.tick();
        let shown: Vec<_> = system.scene.labels().iter().filter(|l| is_displayed(l)).collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].anchor, system.planet(Planet::Earth).alt.mesh);

        system.pointer_down(5, 5);
        system.tick();
        assert!(system.scene.label(system.sun().label).opacity > 0.0);
        for bodies in system.planets() {
            let primary = is_displayed(system.scene.label(bodies.primary.label));
            let alt = is_displayed(system.scene.label(bodies.alt.label));
            assert!(primary ^ alt, "{} shows primary={primary} alt={alt}", bodies.planet);
        }
        let shown = system.scene.labels().iter().filter(|l| is_displayed(l)).count();
        assert_eq!(shown, 9);

        system.pointer_up();
        system.tick();
        assert_eq!(system.scene.labels().iter().filter(|l| is_displayed(l)).count(), 1);
    }

    #[test]
    fn overview_labels_are_not_doubled() {
        let mut system = system();
        system.dispatch(ControlEvent::ShowLabels(true));
        system.tick();
        assert_eq!(system.scene.labels().iter().filter(|l| is_displayed(l)).count(), 9);
        assert!(system.starfield().stars != system.starfield().dome);
        assert!(system.scene.is_visible_in_tree(system.starfield().stars));
    }
}
