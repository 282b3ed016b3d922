//! Game configuration
//!
//! Everything tunable lives in one RON file. Missing fields take their
//! defaults, so a config only needs to mention what it changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{GeneratorConfig, RegenerationRules, VisibilitySettings};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "EMBERDEEP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Player stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: i32,
    pub attack_power: i32,
    /// Bump-attack reach in cells
    pub attack_range: f32,
    pub attack_speed: f32,
    /// Cells per second while sliding between cells
    pub move_speed: f32,
    pub speed: i32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            attack_power: 10,
            attack_range: 1.5,
            attack_speed: 1.0,
            move_speed: 8.0,
            speed: 10,
        }
    }
}

/// Stats shared by every spawned enemy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_health: i32,
    pub attack_power: i32,
    pub attack_range: f32,
    pub attack_speed: f32,
    pub move_speed: f32,
    pub speed: i32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_health: 20,
            attack_power: 4,
            attack_range: 1.5,
            attack_speed: 1.0,
            move_speed: 8.0,
            speed: 5,
        }
    }
}

/// Per-floor rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRules {
    pub regeneration: RegenerationRules,
    /// Enemies per floor number, before clamping
    pub enemies_per_floor: u32,
    pub min_enemies: u32,
    pub max_enemies: u32,
    /// Enemies never spawn within this many cells (chebyshev) of the entry
    pub spawn_clearance: i32,
    pub gold_per_kill: u32,
}

impl Default for LevelRules {
    fn default() -> Self {
        Self {
            regeneration: RegenerationRules::default(),
            enemies_per_floor: 2,
            min_enemies: 5,
            max_enemies: 20,
            spawn_clearance: 3,
            gold_per_kill: 5,
        }
    }
}

impl LevelRules {
    /// Enemies to spawn on `floor`
    pub fn enemy_count(&self, floor: u32) -> usize {
        let lo = self.min_enemies.min(self.max_enemies);
        floor
            .saturating_mul(self.enemies_per_floor)
            .clamp(lo, self.max_enemies) as usize
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub generator: GeneratorConfig,
    pub visibility: VisibilitySettings,
    pub player: PlayerConfig,
    pub enemies: EnemyConfig,
    pub rules: LevelRules,
    /// Fixed run seed; random when absent
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Find and load a config file, falling back to defaults.
    ///
    /// Never fails: unreadable or invalid files are logged and skipped.
    pub fn load() -> Self {
        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    log::info!("Config loaded from {:?}", path);
                    return config;
                }
                Err(e) => log::warn!("Ignoring config {:?}: {}", path, e),
            }
        }

        log::info!("No config file found, using defaults");
        Self::default()
    }

    /// Candidate config locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("assets/config.ron"));
        if let Some(dirs) = directories::ProjectDirs::from("", "", "emberdeep") {
            paths.push(dirs.config_dir().join("config.ron"));
        }
        paths
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Write the config as pretty RON, creating parent directories
    pub fn export(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        fs::write(path, self.to_ron()?).map_err(io_err)?;

        log::info!("Config written to {:?}", path);
        Ok(())
    }

    /// Reject values the game cannot sensibly run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generator;
        if g.width < 3 || g.height < 3 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 3x3, got {}x{}",
                g.width, g.height
            )));
        }
        if g.min_room_size < 1 || g.min_room_size > g.max_room_size {
            return Err(ConfigError::Invalid(format!(
                "room size range {}..={} is empty",
                g.min_room_size, g.max_room_size
            )));
        }
        if g.corridor_width < 1 {
            return Err(ConfigError::Invalid("corridor_width must be positive".into()));
        }

        let v = &self.visibility;
        if !(v.visibility_radius > 0.0) || !(v.torch_radius >= 0.0) {
            return Err(ConfigError::Invalid("visibility radii must be positive".into()));
        }
        if !(v.falloff_exponent > 0.0) {
            return Err(ConfigError::Invalid("falloff_exponent must be positive".into()));
        }
        for (name, value) in [
            ("revealed_darkness_multiplier", v.revealed_darkness_multiplier),
            ("min_visibility", v.min_visibility),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }

        if self.player.max_health <= 0 || self.enemies.max_health <= 0 {
            return Err(ConfigError::Invalid("max_health must be positive".into()));
        }
        if self.player.move_speed <= 0.0 || self.enemies.move_speed <= 0.0 {
            return Err(ConfigError::Invalid("move_speed must be positive".into()));
        }
        if self.rules.min_enemies > self.rules.max_enemies {
            return Err(ConfigError::Invalid(format!(
                "min_enemies {} exceeds max_enemies {}",
                self.rules.min_enemies, self.rules.max_enemies
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("emberdeep-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generator.width, 25);
        assert_eq!(config.visibility.torch_radius, 3.2);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped = GameConfig::from_ron(include_str!("../assets/config.ron")).unwrap();
        assert_eq!(shipped, GameConfig::default());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = GameConfig::from_ron("(generator: (width: 40), seed: Some(7))").unwrap();
        assert_eq!(config.generator.width, 40);
        assert_eq!(config.generator.height, 25);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = GameConfig::from_ron("(generator: (width: \"wide\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut config = GameConfig::default();
        config.generator.min_room_size = 12;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = GameConfig::default();
        config.visibility.visibility_radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.visibility.min_visibility = 1.5;
        assert!(config.validate().is_err());

        let mut config = GameConfig::default();
        config.rules.min_enemies = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_then_load() {
        let path = scratch_path("export.ron");
        let mut config = GameConfig::default();
        config.generator.room_attempts = 33;
        config.seed = Some(99);

        config.export(&path).unwrap();
        let loaded = GameConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = GameConfig::load_from(&scratch_path("missing.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_enemy_count_per_floor() {
        let rules = LevelRules::default();
        assert_eq!(rules.enemy_count(1), 5);
        assert_eq!(rules.enemy_count(3), 6);
        assert_eq!(rules.enemy_count(9), 18);
        assert_eq!(rules.enemy_count(50), 20);
    }
}
