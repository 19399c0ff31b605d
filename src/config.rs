//! Emission parameters, presets and the settings file

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use cgmath::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, SandboxError};
use crate::particle::Forces;

/// Reference simulation tick
pub const DEFAULT_TICK_MS: u64 = 20;

/// Ticks per second at the reference tick; presets author lifetimes in
/// seconds and convert with this.
pub const TICKS_PER_SECOND: i32 = (1000 / DEFAULT_TICK_MS) as i32;

pub const DEFAULT_CANVAS: [f32; 2] = [800.0, 600.0];

/// Everything one emission burst needs. Read as a whole at each cycle
/// boundary; writers replace the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionConfig {
    pub min_pos: [f32; 2],
    pub max_pos: [f32; 2],
    /// Upper bound of the per-particle launch speed, pixels per tick
    pub speed: f32,
    /// Total spread in degrees, centred on straight up
    pub angle_range: f32,
    pub wind: f32,
    pub gravity: f32,
    pub particle_amount: u32,
    /// Lifetime in ticks
    pub life: i32,
    pub color_min: [u8; 3],
    pub color_max: [u8; 3],
    pub cycle_count: u32,
    pub interval_ms: u64,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Preset::Firework.config(Vector2::from(DEFAULT_CANVAS))
    }
}

impl EmissionConfig {
    pub fn forces(&self) -> Forces {
        Forces {
            wind: self.wind,
            gravity: self.gravity,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Pulls the spawn rectangle back inside a resized canvas.
    /// Returns `true` if anything moved.
    pub fn fit_to_canvas(&mut self, canvas: Vector2<f32>) -> bool {
        let limits = [(canvas.x - 1.0).max(0.0), (canvas.y - 1.0).max(0.0)];
        let before = (self.min_pos, self.max_pos);
        for (axis, limit) in limits.into_iter().enumerate() {
            self.min_pos[axis] = self.min_pos[axis].min(limit);
            self.max_pos[axis] = self.max_pos[axis].min(limit);
        }
        (self.min_pos, self.max_pos) != before
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (axis, field) in [(0, "x position"), (1, "y position")] {
            let (min, max) = (self.min_pos[axis], self.max_pos[axis]);
            if !(min.is_finite() && max.is_finite()) {
                return Err(ConfigError::NotFinite { field });
            }
            if min > max {
                return Err(ConfigError::InvertedRange { field, min, max });
            }
        }

        for (i, channel) in ["red", "green", "blue"].into_iter().enumerate() {
            let (min, max) = (self.color_min[i], self.color_max[i]);
            if min > max {
                return Err(ConfigError::InvertedColor { channel, min, max });
            }
        }

        for (value, field) in [(self.speed, "speed"), (self.angle_range, "angle_range")] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NotFinite { field });
            }
        }
        for (value, field) in [(self.wind, "wind"), (self.gravity, "gravity")] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        if self.particle_amount == 0 {
            return Err(ConfigError::NonPositive {
                field: "particle_amount",
            });
        }
        if self.life <= 0 {
            return Err(ConfigError::NonPositive { field: "life" });
        }
        if self.cycle_count == 0 {
            return Err(ConfigError::NonPositive {
                field: "cycle_count",
            });
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "interval_ms",
            });
        }

        Ok(())
    }
}

/// Canned effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    Firework,
    FireworkSingle,
    Fountain,
    Meteor,
    Snow,
}

impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::Firework,
        Preset::FireworkSingle,
        Preset::Fountain,
        Preset::Meteor,
        Preset::Snow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Firework => "firework",
            Preset::FireworkSingle => "firework-single",
            Preset::Fountain => "fountain",
            Preset::Meteor => "meteor",
            Preset::Snow => "snow",
        }
    }

    /// Builds the preset for a canvas of the given size
    pub fn config(self, canvas: Vector2<f32>) -> EmissionConfig {
        let (w, h) = (canvas.x, canvas.y);
        let centre = [(w / 2.0).floor(), (h / 2.0).floor()];

        match self {
            Preset::Firework => EmissionConfig {
                min_pos: [1.0, 1.0],
                max_pos: [w - 1.0, h - 1.0],
                speed: 1.0,
                angle_range: 360.0,
                wind: 0.0,
                gravity: 0.0,
                particle_amount: 500,
                life: 2 * TICKS_PER_SECOND,
                color_min: [0, 0, 0],
                color_max: [255, 255, 255],
                cycle_count: 50,
                interval_ms: 125,
            },
            Preset::FireworkSingle => EmissionConfig {
                min_pos: centre,
                max_pos: centre,
                speed: 1.0,
                angle_range: 360.0,
                wind: 0.0,
                gravity: 0.0,
                particle_amount: 1000,
                life: 4 * TICKS_PER_SECOND,
                color_min: [0, 0, 0],
                color_max: [255, 255, 255],
                cycle_count: 1,
                interval_ms: 50,
            },
            Preset::Fountain => {
                let source = [((w - 1.0) / 2.0).floor(), ((h - 1.0) / 2.0).floor()];
                EmissionConfig {
                    min_pos: source,
                    max_pos: source,
                    speed: 3.5,
                    angle_range: 22.0,
                    wind: 0.0,
                    gravity: 0.05,
                    particle_amount: 25,
                    life: 3 * TICKS_PER_SECOND,
                    color_min: [0, 0, 0],
                    color_max: [25, 75, 255],
                    cycle_count: 200,
                    interval_ms: 100,
                }
            }
            Preset::Meteor => EmissionConfig {
                min_pos: centre,
                max_pos: centre,
                speed: 0.29,
                angle_range: 360.0,
                wind: 0.02,
                gravity: -0.05,
                particle_amount: 60,
                life: 4 * TICKS_PER_SECOND,
                color_min: [200, 0, 0],
                color_max: [255, 0, 0],
                cycle_count: 100,
                interval_ms: 70,
            },
            Preset::Snow => EmissionConfig {
                min_pos: [1.0, 1.0],
                max_pos: [w - 1.0, 1.0],
                speed: 0.15,
                angle_range: 180.0,
                wind: 0.0,
                gravity: 0.02,
                particle_amount: 1,
                life: 6 * TICKS_PER_SECOND,
                color_min: [255, 255, 255],
                color_max: [255, 255, 255],
                cycle_count: 500,
                interval_ms: 25,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

/// Top-level settings, usually read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub tick_interval_ms: u64,
    pub canvas: [f32; 2],
    /// When set, replaces `emission` with the preset scaled to `canvas`
    pub preset: Option<Preset>,
    pub emission: EmissionConfig,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_MS,
            canvas: DEFAULT_CANVAS,
            preset: None,
            emission: EmissionConfig::default(),
        }
    }
}

impl SandboxSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SandboxError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parses and validates; a `preset` key is resolved here.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut settings: SandboxSettings = toml::from_str(text)?;
        if let Some(preset) = settings.preset {
            settings.apply_preset(preset);
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        self.preset = Some(preset);
        self.emission = preset.config(self.canvas_size());
    }

    pub fn canvas_size(&self) -> Vector2<f32> {
        Vector2::from(self.canvas)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::NonPositive {
                field: "tick_interval_ms",
            });
        }
        if !(self.canvas[0] > 0.0 && self.canvas[1] > 0.0) {
            return Err(ConfigError::NonPositive { field: "canvas" });
        }
        self.emission.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_firework() {
        let config = EmissionConfig::default();
        assert_eq!(config, Preset::Firework.config(Vector2::new(800.0, 600.0)));
        assert_eq!(config.max_pos, [799.0, 599.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn shrinking_canvas_clamps_spawn_rect() {
        let mut config = EmissionConfig::default();
        assert!(!config.fit_to_canvas(Vector2::new(1024.0, 768.0)));

        assert!(config.fit_to_canvas(Vector2::new(300.0, 200.0)));
        assert_eq!(config.max_pos, [299.0, 199.0]);
        assert!(config.min_pos[0] <= config.max_pos[0]);
        assert!(config.min_pos[1] <= config.max_pos[1]);
        assert!(config.validate().is_ok());

        let mut fountain = Preset::Fountain.config(Vector2::new(800.0, 600.0));
        assert!(fountain.fit_to_canvas(Vector2::new(100.0, 100.0)));
        assert_eq!(fountain.min_pos, [99.0, 99.0]);
        assert_eq!(fountain.max_pos, [99.0, 99.0]);
    }

    #[test]
    fn every_preset_is_valid() {
        for preset in Preset::ALL {
            let config = preset.config(Vector2::new(640.0, 480.0));
            assert!(config.validate().is_ok(), "{preset} failed validation");
        }
    }

    #[test]
    fn point_source_presets_collapse_position() {
        for preset in [Preset::FireworkSingle, Preset::Fountain, Preset::Meteor] {
            let config = preset.config(Vector2::new(640.0, 480.0));
            assert_eq!(config.min_pos, config.max_pos, "{preset}");
        }
    }

    #[test]
    fn preset_names_round_trip_through_from_str() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("Firework_Single".parse::<Preset>().unwrap(), Preset::FireworkSingle);
        assert_eq!(
            "volcano".parse::<Preset>(),
            Err(ConfigError::UnknownPreset("volcano".into()))
        );
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let mut config = EmissionConfig::default();
        config.min_pos = [100.0, 0.0];
        config.max_pos = [50.0, 10.0];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "x position", .. })
        ));

        let mut config = EmissionConfig::default();
        config.color_min = [0, 200, 0];
        config.color_max = [255, 100, 255];
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvertedColor {
                channel: "green",
                min: 200,
                max: 100
            })
        );
    }

    #[test]
    fn validate_rejects_zero_counts() {
        let mut config = EmissionConfig::default();
        config.particle_amount = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "particle_amount"
            })
        );

        let mut config = EmissionConfig::default();
        config.life = -1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "life" })
        );

        let mut config = EmissionConfig::default();
        config.speed = f32::NAN;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "speed" })
        );
    }

    #[test]
    fn settings_from_toml_with_overrides() {
        let text = r#"
tick_interval_ms = 10

[emission]
min_pos = [5.0, 5.0]
max_pos = [5.0, 5.0]
speed = 2.5
particle_amount = 7
color_min = [10, 20, 30]
color_max = [10, 20, 30]
"#;
        let settings = SandboxSettings::from_toml(text).unwrap();
        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
        assert_eq!(settings.emission.particle_amount, 7);
        assert_eq!(settings.emission.color_min, [10, 20, 30]);
        // unspecified keys fall back to the firework defaults
        assert_eq!(settings.emission.cycle_count, 50);
    }

    #[test]
    fn settings_preset_key_scales_to_canvas() {
        let text = r#"
canvas = [200.0, 100.0]
preset = "meteor"
"#;
        let settings = SandboxSettings::from_toml(text).unwrap();
        assert_eq!(settings.preset, Some(Preset::Meteor));
        assert_eq!(settings.emission.min_pos, [100.0, 50.0]);
        assert_eq!(settings.emission.color_min, [200, 0, 0]);
    }

    #[test]
    fn settings_reject_invalid_emission() {
        let text = r#"
[emission]
cycle_count = 0
"#;
        let err = SandboxSettings::from_toml(text).unwrap_err();
        assert!(matches!(
            err,
            SandboxError::Config(ConfigError::NonPositive {
                field: "cycle_count"
            })
        ));
    }

    #[test]
    fn settings_load_reports_missing_file() {
        let err = SandboxSettings::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, SandboxError::Io { .. }));
    }
}
