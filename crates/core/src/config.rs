//! Game and application configuration.
//!
//! Settings are layered: built-in defaults, then `<config_dir>/mdr/config.toml`,
//! then `MDR__`-prefixed environment variables (`MDR__GAME__BIN_COUNT=4`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::ConfigError, scoring::TerminationMode};

/// Directory under the user's config dir holding `config.toml`.
pub const DEFAULT_CONFIG_DIR: &str = "mdr";
/// File name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MDR";

const DEFAULT_CONFIG: &str = r#"# Macro Data Refinement settings.

[game]
pool_size = 100
bin_count = 3
spawn_clear_delay_ms = 500
# seed = 42

[game.values]
min = 0
max = 10

[game.weights]
min = 14
max = 40

[game.termination]
mode = "threshold"
per_bin = 250
aggregate_ceiling = 1000

# [game.termination]
# mode = "simple_progress"
# denominator = 40
# target_percent = 100

[game.layout]
columns = 10
cell_width = 8.0
cell_height = 3.0
tile_width = 2.0
tile_height = 1.0
motion_scale = 0.1

[ui]
tick_ms = 50
language = "en"
"#;

/// Inclusive integer range tiles draw values or weights from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest value, inclusive.
    pub min: u32,
    /// Largest value, inclusive.
    pub max: u32,
}

impl ValueRange {
    /// Build a range from inclusive bounds.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range.
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Draw a value uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.min..=self.max)
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::EmptyRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Geometry of the default orbit layout, in container units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of home slots per row.
    pub columns: usize,
    /// Width of a home slot.
    pub cell_width: f32,
    /// Height of a home slot.
    pub cell_height: f32,
    /// Width of a tile's hit box.
    pub tile_width: f32,
    /// Height of a tile's hit box.
    pub tile_height: f32,
    /// Factor converting orbit radii into container units.
    pub motion_scale: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: 10,
            cell_width: 8.0,
            cell_height: 3.0,
            tile_width: 2.0,
            tile_height: 1.0,
            motion_scale: 0.1,
        }
    }
}

impl LayoutConfig {
    /// Size of the container needed to hold `pool_size` home slots.
    pub fn container_size(&self, pool_size: usize) -> (f32, f32) {
        let columns = self.columns.max(1);
        let rows = pool_size.div_ceil(columns).max(1);
        (
            columns as f32 * self.cell_width,
            rows as f32 * self.cell_height,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 {
            return Err(ConfigError::Zero("layout columns"));
        }
        for (name, value) in [
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
            ("tile_width", self.tile_width),
            ("tile_height", self.tile_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(self.motion_scale.is_finite() && self.motion_scale >= 0.0) {
            return Err(ConfigError::NonPositive {
                name: "motion_scale",
                value: self.motion_scale,
            });
        }
        Ok(())
    }
}

/// Everything that shapes a round of the selection game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of tiles in the pool.
    pub pool_size: usize,
    /// Range tile labels are drawn from.
    pub values: ValueRange,
    /// Range tile weights are drawn from.
    pub weights: ValueRange,
    /// Number of bins.
    pub bin_count: usize,
    /// How a round ends.
    pub termination: TerminationMode,
    /// Delay before "just spawned" flags are cleared.
    pub spawn_clear_delay_ms: u64,
    /// Fixed RNG seed; a fresh one is drawn when absent.
    pub seed: Option<u64>,
    /// Position model parameters.
    pub layout: LayoutConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pool_size: 100,
            values: ValueRange::new(0, 10),
            weights: ValueRange::new(14, 40),
            bin_count: 3,
            termination: TerminationMode::default(),
            spawn_clear_delay_ms: 500,
            seed: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl GameConfig {
    /// Delay before "just spawned" flags are cleared.
    pub fn spawn_clear_delay(&self) -> Duration {
        Duration::from_millis(self.spawn_clear_delay_ms)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        self.values.validate("value")?;
        self.weights.validate("weight")?;
        if self.bin_count == 0 {
            return Err(ConfigError::NoBins);
        }
        self.termination.validate()?;
        self.layout.validate()
    }
}

/// Language used by front ends for user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// French.
    Fr,
}

impl Language {
    /// The other supported language.
    pub fn toggled(self) -> Self {
        match self {
            Language::En => Language::Fr,
            Language::Fr => Language::En,
        }
    }

    /// Two-letter code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Interval between engine clock ticks.
    pub tick_ms: u64,
    /// Initial language.
    pub language: Language,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            language: Language::En,
        }
    }
}

impl UiConfig {
    /// Tick interval as a [`Duration`].
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Game rules.
    pub game: GameConfig,
    /// Front-end settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CONFIG_DIR)
            .join(CONFIG_FILE_NAME)
    }

    /// Load from the default path layered under environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (optional on disk) layered under environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(path.as_ref(), environment())
    }

    /// Validate game and UI settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        if self.ui.tick_ms == 0 {
            return Err(ConfigError::Zero("ui tick_ms"));
        }
        Ok(())
    }

    fn build(path: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(env)
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::default_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write the default configuration to `path` unless the file already exists.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let mut map = config::Map::new();
        for (key, value) in vars {
            map.insert(key.to_string(), value.to_string());
        }
        environment().source(Some(map))
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.pool_size, 100);
        assert_eq!(config.game.bin_count, 3);
        assert_eq!(config.game.spawn_clear_delay(), Duration::from_millis(500));
    }

    #[test]
    fn default_file_round_trips_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("mdr").join(CONFIG_FILE_NAME);
        ensure_default_config_at(&path)?;
        assert!(path.exists());

        let loaded = AppConfig::build(&path, env_with(&[]))?;
        assert_eq!(loaded, AppConfig::default());
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[game]\nbin_count = 4\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(fs::read_to_string(&path)?, "[game]\nbin_count = 4\n");
        Ok(())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let loaded = AppConfig::build(&dir.path().join("absent.toml"), env_with(&[]))?;
        assert_eq!(loaded, AppConfig::default());
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"
[game]
bin_count = 3
pool_size = 60

[game.termination]
mode = "simple_progress"
denominator = 40
target_percent = 100

[ui]
language = "fr"
"#,
        )?;

        let loaded = AppConfig::build(&path, env_with(&[("MDR__GAME__BIN_COUNT", "4")]))?;
        assert_eq!(loaded.game.bin_count, 4);
        assert_eq!(loaded.game.pool_size, 60);
        assert_eq!(
            loaded.game.termination,
            TerminationMode::SimpleProgress {
                denominator: 40,
                target_percent: 100
            }
        );
        assert_eq!(loaded.ui.language, Language::Fr);
        Ok(())
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut config = GameConfig {
            weights: ValueRange::new(40, 14),
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyRange {
                name: "weight",
                min: 40,
                max: 14
            })
        );

        config.weights = ValueRange::new(14, 40);
        config.bin_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::NoBins));

        config.bin_count = 3;
        config.pool_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyPool));
    }

    #[test]
    fn invalid_file_reports_path() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[game]\npool_size = 0\n")?;
        let err = AppConfig::build(&path, env_with(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("pool size must be at least 1"));
        Ok(())
    }
}
