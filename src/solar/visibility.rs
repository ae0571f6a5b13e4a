use crate::config::SolarConfig;
use crate::engine::scene::{NodeId, Scene};
use crate::solar::body::CelestialBody;
use crate::solar::planet::Planet;
use crate::solar::state::{FocusSelection, SimulationState};
use crate::solar::system::PlanetBodies;

/// Which of a planet's two bodies is switched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Representation {
    Primary,
    Alt,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisibilitySet {
    /// The lit set and the sun, toggled as one group.
    pub primary_group: bool,
    pub representations: [Representation; 8],
    pub sun_label_opacity: f32,
    pub label_opacity: [f32; 8],
    pub orbit_opacity: f32,
}

/// Recomputed from scratch every tick.
pub fn render_visibility(state: &SimulationState, config: &SolarConfig) -> VisibilitySet {
    let reveal = state.pointer_held;
    let orbit_opacity = if state.show_orbits || reveal {
        config.orbit_opacity
    } else {
        0.0
    };

    match state.focus {
        FocusSelection::Overview => {
            let label = if state.show_labels || reveal { 1.0 } else { 0.0 };
            VisibilitySet {
                primary_group: true,
                representations: [Representation::Primary; 8],
                sun_label_opacity: label,
                label_opacity: [label; 8],
                orbit_opacity,
            }
        }
        FocusSelection::Planet(focused) => {
            let mut representations = [Representation::Primary; 8];
            representations[focused.index()] = Representation::Alt;
            let mut label_opacity = [if reveal { 1.0 } else { 0.0 }; 8];
            label_opacity[focused.index()] = 1.0;
            VisibilitySet {
                primary_group: false,
                representations,
                sun_label_opacity: if reveal { 1.0 } else { 0.0 },
                label_opacity,
                orbit_opacity,
            }
        }
    }
}

impl VisibilitySet {
    pub fn representation(&self, planet: Planet) -> Representation {
        self.representations[planet.index()]
    }

    pub fn apply(&self, scene: &mut Scene, primary_root: NodeId, sun: &CelestialBody, planets: &[PlanetBodies]) {
        scene.set_visible(primary_root, self.primary_group);
        scene.set_label_opacity(sun.label, self.sun_label_opacity);

        for bodies in planets {
            let index = bodies.planet.index();
            let alt = self.representations[index] == Representation::Alt;
            scene.set_visible(bodies.primary.pivot, !alt);
            scene.set_visible(bodies.alt.pivot, alt);

            // Only the active representation carries the planet's label.
            let (active, inactive) = if alt {
                (bodies.alt.label, bodies.primary.label)
            } else {
                (bodies.primary.label, bodies.alt.label)
            };
            scene.set_label_opacity(active, self.label_opacity[index]);
            scene.set_label_opacity(inactive, 0.0);

            bodies.orbit.set_opacity(scene, self.orbit_opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::state::ControlEvent;

    #[test]
    fn overview_shows_primary_set() {
        let config = SolarConfig::default();
        let vis = render_visibility(&SimulationState::new(&config), &config);
        assert!(vis.primary_group);
        assert!(vis.representations.iter().all(|r| *r == Representation::Primary));
        assert_eq!(vis.orbit_opacity, 0.0);
        assert_eq!(vis.label_opacity, [0.0; 8]);
    }

    #[test]
    fn focus_swaps_only_the_focused_planet() {
        let config = SolarConfig::default();
        for planet in Planet::ALL {
            let state = SimulationState::new(&config)
                .apply(&ControlEvent::ShowLabels(true), &config)
                .apply(&ControlEvent::Focus(FocusSelection::Planet(planet)), &config);
            let vis = render_visibility(&state, &config);
            assert!(!vis.primary_group);
            for other in Planet::ALL {
                let expected = if other == planet { Representation::Alt } else { Representation::Primary };
                assert_eq!(vis.representation(other), expected);
                let label = if other == planet { 1.0 } else { 0.0 };
                assert_eq!(vis.label_opacity[other.index()], label);
            }
            assert_eq!(vis.sun_label_opacity, 0.0);
        }
    }

    #[test]
    fn toggles_drive_labels_and_orbits_independently() {
        let config = SolarConfig::default();
        let base = SimulationState::new(&config);
        let labels = render_visibility(&base.apply(&ControlEvent::ShowLabels(true), &config), &config);
        assert_eq!(labels.label_opacity, [1.0; 8]);
        assert_eq!(labels.orbit_opacity, 0.0);
        let orbits = render_visibility(&base.apply(&ControlEvent::ShowOrbits(true), &config), &config);
        assert_eq!(orbits.label_opacity, [0.0; 8]);
        assert_eq!(orbits.orbit_opacity, config.orbit_opacity);
    }

    #[test]
    fn pointer_reveals_everything_in_every_focus() {
        let config = SolarConfig::default();
        for focus in FocusSelection::OPTIONS {
            let state = SimulationState::new(&config)
                .apply(&ControlEvent::Focus(focus), &config)
                .apply(&ControlEvent::PointerDown, &config);
            let vis = render_visibility(&state, &config);
            assert_eq!(vis.label_opacity, [1.0; 8]);
            assert_eq!(vis.sun_label_opacity, 1.0);
            assert_eq!(vis.orbit_opacity, config.orbit_opacity);

            let released = render_visibility(&state.apply(&ControlEvent::PointerUp, &config), &config);
            let untouched = render_visibility(
                &SimulationState::new(&config).apply(&ControlEvent::Focus(focus), &config),
                &config,
            );
            assert_eq!(released, untouched);
        }
    }
}
