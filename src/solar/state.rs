use crate::config::SolarConfig;
use crate::solar::planet::Planet;
use std::str::FromStr;

pub const ROTATION_SPEED_MAX: f32 = 0.5;
pub const REVOLUTION_SPEED_MAX: f32 = 0.05;
pub const CAMERA_AXIS_LIMIT: f32 = 500.0;

/// Which body the view is centred on. Exactly one value is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FocusSelection {
    #[default]
    Overview,
    Planet(Planet),
}

impl FocusSelection {
    pub const OPTIONS: [FocusSelection; 9] = [
        FocusSelection::Overview,
        FocusSelection::Planet(Planet::Mercury),
        FocusSelection::Planet(Planet::Venus),
        FocusSelection::Planet(Planet::Earth),
        FocusSelection::Planet(Planet::Mars),
        FocusSelection::Planet(Planet::Jupiter),
        FocusSelection::Planet(Planet::Saturn),
        FocusSelection::Planet(Planet::Uranus),
        FocusSelection::Planet(Planet::Neptune),
    ];

    pub fn planet(self) -> Option<Planet> {
        match self {
            FocusSelection::Overview => None,
            FocusSelection::Planet(p) => Some(p),
        }
    }

    /// `default` followed by the eight planets.
    pub fn flags(self) -> [bool; 9] {
        let mut flags = [false; 9];
        match self {
            FocusSelection::Overview => flags[0] = true,
            FocusSelection::Planet(p) => flags[p.index() + 1] = true,
        }
        flags
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FocusSelection::Overview => "default",
            FocusSelection::Planet(p) => p.as_str(),
        }
    }
}

impl FromStr for FocusSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("default") {
            return Ok(FocusSelection::Overview);
        }
        s.parse::<Planet>().map(FocusSelection::Planet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    SetRotationSpeed(f32),
    SetRevolutionSpeed(f32),
    ResetSpeeds,
    SetCameraAxis(Axis, f32),
    ResetCamera,
    ShowLabels(bool),
    ShowOrbits(bool),
    Focus(FocusSelection),
    PointerDown,
    PointerUp,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationState {
    pub earth_rot: f32,
    pub earth_rev: f32,
    pub slow_rate_multiplier: f32,
    pub focus: FocusSelection,
    pub show_labels: bool,
    pub show_orbits: bool,
    /// Pointer held on the canvas: time slows and every label and orbit is shown.
    pub pointer_held: bool,
}

impl SimulationState {
    pub fn new(config: &SolarConfig) -> Self {
        SimulationState {
            earth_rot: config.default_earth_rot,
            earth_rev: config.default_earth_rev,
            slow_rate_multiplier: 1.0,
            focus: FocusSelection::Overview,
            show_labels: false,
            show_orbits: false,
            pointer_held: false,
        }
    }

    pub fn apply(self, event: &ControlEvent, config: &SolarConfig) -> Self {
        match *event {
            ControlEvent::SetRotationSpeed(v) => SimulationState {
                earth_rot: clamp_finite(v, 0.0, ROTATION_SPEED_MAX, self.earth_rot),
                ..self
            },
            ControlEvent::SetRevolutionSpeed(v) => SimulationState {
                earth_rev: clamp_finite(v, 0.0, REVOLUTION_SPEED_MAX, self.earth_rev),
                ..self
            },
            ControlEvent::ResetSpeeds => SimulationState {
                earth_rot: config.default_earth_rot,
                earth_rev: config.default_earth_rev,
                ..self
            },
            ControlEvent::ShowLabels(show_labels) => SimulationState { show_labels, ..self },
            ControlEvent::ShowOrbits(show_orbits) => SimulationState { show_orbits, ..self },
            ControlEvent::Focus(focus) => SimulationState {
                focus,
                pointer_held: false,
                slow_rate_multiplier: 1.0,
                ..self
            },
            ControlEvent::PointerDown => SimulationState {
                pointer_held: true,
                slow_rate_multiplier: config.held_slow_rate,
                ..self
            },
            ControlEvent::PointerUp => SimulationState {
                pointer_held: false,
                slow_rate_multiplier: 1.0,
                ..self
            },
            ControlEvent::SetCameraAxis(..) | ControlEvent::ResetCamera => self,
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Keyboard shortcuts for the panel controls.
pub fn key_event(key: &str, state: &SimulationState) -> Option<ControlEvent> {
    match key {
        "0" | "Escape" => Some(ControlEvent::Focus(FocusSelection::Overview)),
        "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" => {
            let index = key.parse::<usize>().ok()?;
            Planet::ALL
                .get(index - 1)
                .map(|p| ControlEvent::Focus(FocusSelection::Planet(*p)))
        }
        "l" | "L" => Some(ControlEvent::ShowLabels(!state.show_labels)),
        "o" | "O" => Some(ControlEvent::ShowOrbits(!state.show_orbits)),
        "r" | "R" => Some(ControlEvent::ResetSpeeds),
        "c" | "C" => Some(ControlEvent::ResetCamera),
        _ => None,
    }
}
