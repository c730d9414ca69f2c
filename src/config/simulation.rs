use serde::Deserialize;
use std::path::Path;

use crate::config::lattice::LatticeConfig;
use crate::error::{Error, Result};
use crate::simulation::calculator::DEFAULT_INERTIA;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// 0 picks a random seed at startup.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    #[serde(default = "default_inertia")]
    pub inertia: f64,
    #[serde(default)]
    pub atmospheric_species: Vec<String>,
    #[serde(default = "default_reaction_library")]
    pub reaction_library: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Worker threads for site evaluation; 0 uses the rayon default.
    #[serde(default)]
    pub threads: usize,
    #[serde(default)]
    pub lattice: LatticeConfig,
}

fn default_ticks() -> u32 {
    100
}
fn default_inertia() -> f64 {
    DEFAULT_INERTIA
}
fn default_reaction_library() -> String {
    "./reactions.toml".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", source_path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.ticks == 0 {
            errors.push(format!(
                "ticks must be > 0, got {}. Example: ticks = 100",
                self.ticks
            ));
        }

        if !(self.inertia.is_finite() && self.inertia > 0.0) {
            errors.push(format!(
                "inertia must be > 0, got {}. Example: inertia = 2.0",
                self.inertia
            ));
        }

        if self.atmospheric_species.iter().any(|s| s.is_empty()) {
            errors.push(
                "atmospheric_species must not contain empty names. Example: atmospheric_species = [\"CO2\"]"
                    .to_string(),
            );
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        errors.extend(self.lattice.problems());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(errors.join("\n")))
        }
    }

    /// Resolve the reaction library path relative to the config file.
    pub fn reaction_library_path(&self, config_path: &Path) -> std::path::PathBuf {
        let library = Path::new(&self.reaction_library);
        if library.is_absolute() {
            return library.to_path_buf();
        }
        config_path
            .parent()
            .map(|dir| dir.join(library))
            .unwrap_or_else(|| library.to_path_buf())
    }
}
