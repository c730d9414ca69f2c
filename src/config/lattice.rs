use serde::{Deserialize, Serialize};

use crate::lattice::site::SiteId;
use crate::lattice::topology::NeighborhoodKind;

/// Initial share of the lattice occupied by one solid phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillSpec {
    pub phase: String,
    pub fraction: f64,
}

/// Lattice geometry and initial occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    #[serde(default = "default_side")]
    pub width: u32,
    #[serde(default = "default_side")]
    pub height: u32,
    #[serde(default = "default_neighborhood")]
    pub neighborhood: NeighborhoodKind,
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f64,
    /// Sites not claimed by any fill entry start as free space.
    #[serde(default)]
    pub fill: Vec<FillSpec>,
}

fn default_side() -> u32 {
    20
}
fn default_neighborhood() -> NeighborhoodKind {
    NeighborhoodKind::VonNeumann
}
fn default_radius() -> u32 {
    1
}
fn default_initial_volume() -> f64 {
    1.0
}

impl Default for LatticeConfig {
    fn default() -> Self {
        LatticeConfig {
            width: default_side(),
            height: default_side(),
            neighborhood: default_neighborhood(),
            radius: default_radius(),
            initial_volume: default_initial_volume(),
            fill: Vec::new(),
        }
    }
}

impl LatticeConfig {
    pub fn site_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Collect every range problem; an empty list means the lattice is valid.
    pub fn problems(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.width == 0 || self.height == 0 {
            errors.push(format!(
                "lattice.width and lattice.height must be >= 1, got {}x{}. Example: width = 20",
                self.width, self.height
            ));
        }
        if self.site_count() > SiteId::MAX as u64 {
            errors.push(format!(
                "lattice {}x{} has more than {} sites. Example: width = 20",
                self.width,
                self.height,
                SiteId::MAX
            ));
        }
        if self.radius == 0 {
            errors.push("lattice.radius must be >= 1, got 0. Example: radius = 1".to_string());
        }
        if !(self.initial_volume.is_finite() && self.initial_volume > 0.0) {
            errors.push(format!(
                "lattice.initial_volume must be > 0, got {}. Example: initial_volume = 1.0",
                self.initial_volume
            ));
        }
        for spec in &self.fill {
            if !(0.0..=1.0).contains(&spec.fraction) {
                errors.push(format!(
                    "lattice.fill fraction for '{}' must be 0.0-1.0, got {}",
                    spec.phase, spec.fraction
                ));
            }
        }
        let total: f64 = self.fill.iter().map(|f| f.fraction).sum();
        if total > 1.0 + 1e-9 {
            errors.push(format!(
                "lattice.fill fractions must sum to <= 1.0, got {}",
                total
            ));
        }

        errors
    }
}
