//! Scene configuration. Every field has a default, so a YAML file only needs
//! the values it overrides.

use crate::camera::Projection;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vista_common::Color;

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn invalid(field: &str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid(format!("{field}: {reason}"))
}

/// Drag-driven orbit camera settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub projection: Projection,
    /// Translation applied after the rotation.
    pub eye_offset: Vec3,
    /// Pixels of drag per degree of rotation.
    pub drag_sensitivity: f32,
}

impl CameraConfig {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        self.projection
            .check()
            .map_err(|e| invalid(&format!("{field}.projection"), e))?;
        if !(self.drag_sensitivity > 0.0 && self.drag_sensitivity.is_finite()) {
            return Err(invalid(
                &format!("{field}.drag_sensitivity"),
                format!("must be positive, got {}", self.drag_sensitivity),
            ));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default(),
            eye_offset: Vec3::new(0.0, -1.5, -5.0),
            drag_sensitivity: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShooterConfig {
    pub position: Vec3,
    pub color: Color,
}

/// Particle fountain: one system fed by several shooters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FountainConfig {
    pub capacity: usize,
    /// Per shooter.
    pub particles_per_second: f32,
    pub direction: Vec3,
    /// Maximum deviation in degrees, split evenly either side of zero.
    pub angle_variance: f32,
    /// Maximum extra speed as a fraction of the base speed.
    pub speed_variance: f32,
    pub seed: u64,
    pub shooters: Vec<ShooterConfig>,
}

impl FountainConfig {
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(invalid(&format!("{field}.capacity"), "must be at least 1"));
        }
        if !(self.particles_per_second >= 0.0 && self.particles_per_second.is_finite()) {
            return Err(invalid(
                &format!("{field}.particles_per_second"),
                format!("must be zero or more, got {}", self.particles_per_second),
            ));
        }
        Ok(())
    }
}

impl Default for FountainConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            particles_per_second: 60.0,
            direction: Vec3::new(0.0, 0.5, 0.0),
            angle_variance: 5.0,
            speed_variance: 1.0,
            seed: 0x5eed,
            shooters: vec![
                ShooterConfig {
                    position: Vec3::new(-1.0, 0.0, 0.0),
                    color: Color::rgb(255, 50, 5),
                },
                ShooterConfig {
                    position: Vec3::ZERO,
                    color: Color::rgb(25, 255, 25),
                },
                ShooterConfig {
                    position: Vec3::new(1.0, 0.0, 0.0),
                    color: Color::rgb(5, 50, 255),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapConfig {
    pub camera: CameraConfig,
    /// Terrain is stretched wide but kept fairly flat.
    pub terrain_scale: Vec3,
    pub fountain: FountainConfig,
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            terrain_scale: Vec3::new(100.0, 10.0, 100.0),
            fountain: FountainConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    pub camera: CameraConfig,
    pub fountain: FountainConfig,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                projection: Projection {
                    far: 10.0,
                    ..Projection::default()
                },
                ..CameraConfig::default()
            },
            fountain: FountainConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirHockeyConfig {
    pub projection: Projection,
    /// How far the table sits in front of the eye.
    pub distance: f32,
    /// Tilt towards the viewer, in degrees.
    pub tilt_degrees: f32,
}

impl Default for AirHockeyConfig {
    fn default() -> Self {
        Self {
            projection: Projection {
                far: 10.0,
                ..Projection::default()
            },
            distance: 2.5,
            tilt_degrees: 60.0,
        }
    }
}

/// Settings for every demo scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub heightmap: HeightmapConfig,
    pub particles: ParticlesConfig,
    pub air_hockey: AirHockeyConfig,
}

impl SceneConfig {
    /// Parse and validate.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a projection or camera degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.heightmap.camera.validate("heightmap.camera")?;
        self.heightmap.fountain.validate("heightmap.fountain")?;
        self.particles.camera.validate("particles.camera")?;
        self.particles.fountain.validate("particles.fountain")?;
        self.air_hockey
            .projection
            .check()
            .map_err(|e| invalid("air_hockey.projection", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
