use crate::error::{AppError, AppResult};
use crate::solar::planet::Planet;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RingConfig {
    pub inner: f32,
    pub outer: f32,
    pub texture: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SunConfig {
    pub radius: f32,
    pub texture: String,
    pub tilt_degrees: f32,
    pub rotation_rate: f32,
    /// Spin of the corona shell, driven by the sun's pivot.
    pub corona_rate: f32,
    pub corona_scale: f32,
    pub corona_opacity: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlanetConfig {
    pub planet: Planet,
    pub radius: f32,
    /// Orbital distance as a multiple of `mercury_distance`.
    pub distance_factor: f32,
    pub texture: String,
    #[serde(default)]
    pub alt_texture: Option<String>,
    #[serde(default)]
    pub tilt_degrees: f32,
    pub rotation_rate: f32,
    pub revolution_rate: f32,
    #[serde(default)]
    pub ring: Option<RingConfig>,
    /// Camera height and depth offset when this planet is focused.
    #[serde(default = "default_focus_offset")]
    pub focus_offset: [f32; 2],
}

fn default_focus_offset() -> [f32; 2] {
    [2.0, 7.0]
}

/// Upper bound on the generated star cloud.
pub const MAX_STARS: usize = 100_000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SolarConfig {
    pub mercury_distance: f32,
    pub axis_inclination_factor: f32,
    pub default_earth_rot: f32,
    pub default_earth_rev: f32,
    pub default_camera_position: [f32; 3],
    /// Time multiplier while the pointer is held on the canvas.
    pub held_slow_rate: f32,
    pub orbit_opacity: f32,
    pub ring_shear: f32,
    pub focus_lerp: f32,
    pub focus_distance_scale: f32,
    pub texture_root: String,
    pub skydome_radius: f32,
    pub skydome_texture: String,
    pub star_count: usize,
    pub star_seed: u64,
    pub sun: SunConfig,
    pub planets: Vec<PlanetConfig>,
}

impl Default for SolarConfig {
    fn default() -> Self {
        SolarConfig {
            mercury_distance: 28.0,
            axis_inclination_factor: 1.0,
            default_earth_rot: 0.05,
            default_earth_rev: 0.005,
            default_camera_position: [-100.0, 120.0, 250.0],
            held_slow_rate: 0.1,
            orbit_opacity: 0.35,
            ring_shear: 0.25,
            focus_lerp: 0.01,
            focus_distance_scale: 1.2,
            texture_root: "/assets/textures/".to_string(),
            skydome_radius: 900.0,
            skydome_texture: "stars.jpg".to_string(),
            star_count: 1500,
            star_seed: 0x5eed_57a2,
            sun: SunConfig {
                radius: 16.0,
                texture: "sun.jpg".to_string(),
                tilt_degrees: 7.25,
                rotation_rate: 0.04,
                corona_rate: 2.0,
                corona_scale: 1.15,
                corona_opacity: 0.25,
            },
            planets: default_planets(),
        }
    }
}

fn planet(
    planet: Planet,
    radius: f32,
    distance_factor: f32,
    tilt_degrees: f32,
    rotation_rate: f32,
    revolution_rate: f32,
    focus_offset: [f32; 2],
) -> PlanetConfig {
    PlanetConfig {
        planet,
        radius,
        distance_factor,
        texture: format!("{}.jpg", planet.as_str()),
        alt_texture: None,
        tilt_degrees,
        rotation_rate,
        revolution_rate,
        ring: None,
        focus_offset,
    }
}

// Rates are relative to Earth. Retrograde spins are kept positive so angles only accumulate forward.
fn default_planets() -> Vec<PlanetConfig> {
    let mut planets = vec![
        planet(Planet::Mercury, 3.2, 1.0, 0.03, 0.017, 4.15, [1.0, 4.0]),
        planet(Planet::Venus, 5.8, 1.6, 2.64, 0.004, 1.62, [2.0, 7.0]),
        planet(Planet::Earth, 6.0, 2.6, 23.44, 1.0, 1.0, [2.0, 7.0]),
        planet(Planet::Mars, 4.0, 3.4, 25.19, 0.97, 0.53, [1.5, 5.0]),
        planet(Planet::Jupiter, 12.0, 5.0, 3.13, 2.41, 0.084, [4.0, 18.0]),
        planet(Planet::Saturn, 10.0, 6.6, 26.73, 2.25, 0.034, [4.0, 20.0]),
        planet(Planet::Uranus, 7.0, 8.2, 97.77, 1.39, 0.012, [3.0, 12.0]),
        planet(Planet::Neptune, 7.0, 9.6, 28.32, 1.49, 0.006, [3.0, 12.0]),
    ];
    planets[Planet::Saturn.index()].ring = Some(RingConfig {
        inner: 10.0,
        outer: 20.0,
        texture: "saturnring.png".to_string(),
    });
    planets[Planet::Uranus.index()].ring = Some(RingConfig {
        inner: 7.0,
        outer: 12.0,
        texture: "uranusring.png".to_string(),
    });
    planets
}

impl SolarConfig {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: SolarConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let positive = [
            ("mercury_distance", self.mercury_distance),
            ("axis_inclination_factor", self.axis_inclination_factor),
            ("held_slow_rate", self.held_slow_rate),
            ("focus_distance_scale", self.focus_distance_scale),
            ("skydome_radius", self.skydome_radius),
            ("sun.radius", self.sun.radius),
            ("sun.corona_scale", self.sun.corona_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AppError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let unit = [
            ("focus_lerp", self.focus_lerp),
            ("orbit_opacity", self.orbit_opacity),
            ("sun.corona_opacity", self.sun.corona_opacity),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        let non_negative = [
            ("default_earth_rot", self.default_earth_rot),
            ("default_earth_rev", self.default_earth_rev),
            ("ring_shear", self.ring_shear),
            ("sun.rotation_rate", self.sun.rotation_rate),
            ("sun.corona_rate", self.sun.corona_rate),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Config(format!("{name} must not be negative, got {value}")));
            }
        }
        if !self.default_camera_position.iter().all(|v| v.is_finite()) || !self.sun.tilt_degrees.is_finite() {
            return Err(AppError::Config("camera position and sun tilt must be finite".into()));
        }
        if self.star_count > MAX_STARS {
            return Err(AppError::Config(format!(
                "star_count must be at most {MAX_STARS}, got {}",
                self.star_count
            )));
        }

        let mut seen = [false; 8];
        for p in &self.planets {
            let name = p.planet.as_str();
            if seen[p.planet.index()] {
                return Err(AppError::Config(format!("planet '{name}' listed twice")));
            }
            seen[p.planet.index()] = true;

            if !(p.radius.is_finite() && p.radius > 0.0 && p.distance_factor.is_finite() && p.distance_factor > 0.0) {
                return Err(AppError::invalid_body(name, "radius and distance must be positive"));
            }
            if !(p.rotation_rate.is_finite() && p.rotation_rate >= 0.0 && p.revolution_rate.is_finite() && p.revolution_rate >= 0.0) {
                return Err(AppError::invalid_body(name, "rates must not be negative"));
            }
            if !p.tilt_degrees.is_finite() || !p.focus_offset.iter().all(|v| v.is_finite()) {
                return Err(AppError::invalid_body(name, "tilt and focus offset must be finite"));
            }
            if let Some(ring) = &p.ring {
                if !(ring.inner > 0.0 && ring.inner < ring.outer && ring.outer.is_finite()) {
                    return Err(AppError::invalid_body(name, "ring inner radius must be below outer"));
                }
            }
        }
        if let Some(missing) = Planet::ALL.iter().find(|p| !seen[p.index()]) {
            return Err(AppError::Config(format!("planet '{}' is missing", missing.as_str())));
        }
        Ok(())
    }

    pub fn planet(&self, planet: Planet) -> Option<&PlanetConfig> {
        self.planets.iter().find(|p| p.planet == planet)
    }

    pub fn planet_distance(&self, planet: Planet) -> f32 {
        self.planet(planet)
            .map(|p| p.distance_factor * self.mercury_distance)
            .unwrap_or(0.0)
    }

    /// Where the camera settles when `planet` is focused.
    pub fn focus_target(&self, planet: Planet) -> Vector3<f32> {
        let [y, z] = self
            .planet(planet)
            .map(|p| p.focus_offset)
            .unwrap_or_else(default_focus_offset);
        Vector3::new(self.focus_distance_scale * self.planet_distance(planet), y, z)
    }

    pub fn default_camera(&self) -> Vector3<f32> {
        Vector3::from(self.default_camera_position)
    }

    pub fn texture_url(&self, file: &str) -> String {
        format!("{}{}", self.texture_root, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = SolarConfig::default();
        config.validate().unwrap();
        assert_eq!(config.planets.len(), 8);
        assert!(config.planet(Planet::Saturn).unwrap().ring.is_some());
        assert!(config.planet(Planet::Uranus).unwrap().ring.is_some());
        assert!(config.planet(Planet::Earth).unwrap().ring.is_none());
    }

    #[test]
    fn earth_focus_target() {
        let config = SolarConfig::default();
        let target = config.focus_target(Planet::Earth);
        assert_relative_eq!(target.x, 1.2 * 2.6 * config.mercury_distance, epsilon = 1e-4);
        assert_eq!(target.y, 2.0);
        assert_eq!(target.z, 7.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SolarConfig::from_json(r#"{ "mercury_distance": 30.0, "orbit_opacity": 0.5 }"#).unwrap();
        assert_eq!(config.mercury_distance, 30.0);
        assert_eq!(config.orbit_opacity, 0.5);
        assert_eq!(config.default_earth_rot, 0.05);
        assert_eq!(config.planets.len(), 8);
    }

    #[test]
    fn rejects_duplicate_planet() {
        let mut config = SolarConfig::default();
        config.planets[1].planet = Planet::Mercury;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_inverted_ring() {
        let mut config = SolarConfig::default();
        if let Some(ring) = config.planets[Planet::Saturn.index()].ring.as_mut() {
            ring.inner = 25.0;
        }
        assert!(matches!(config.validate(), Err(AppError::InvalidBody { .. })));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(SolarConfig::from_json("{ not json"), Err(AppError::Json(_))));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = SolarConfig::default();
        config.star_count = usize::MAX / 2;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = SolarConfig::default();
        config.orbit_opacity = 1.5;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let mut config = SolarConfig::default();
        config.planets[Planet::Mars.index()].radius = f32::INFINITY;
        assert!(matches!(config.validate(), Err(AppError::InvalidBody { .. })));

        let mut config = SolarConfig::default();
        config.planets[Planet::Venus.index()].revolution_rate = f32::NAN;
        assert!(matches!(config.validate(), Err(AppError::InvalidBody { .. })));

        let mut config = SolarConfig::default();
        config.star_count = MAX_STARS;
        assert!(config.validate().is_ok());
    }
}
