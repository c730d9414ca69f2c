use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::lattice::site::FREE_SPACE;

/// Molar volume assumed for gases and for phases with no recorded value.
pub const DEFAULT_MOLAR_VOLUME: f64 = 1.0;

/// Registry of the solid and gas phases a reaction library may reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSet {
    solids: BTreeMap<String, f64>,
    gases: BTreeSet<String>,
}

impl PhaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_solid(&mut self, name: impl Into<String>, molar_volume: f64) -> Result<()> {
        let name = name.into();
        self.check_new_name(&name)?;
        if !(molar_volume.is_finite() && molar_volume > 0.0) {
            return Err(Error::InvalidReaction(format!(
                "solid '{}' has invalid molar volume {}",
                name, molar_volume
            )));
        }
        self.solids.insert(name, molar_volume);
        Ok(())
    }

    pub fn add_gas(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.check_new_name(&name)?;
        self.gases.insert(name);
        Ok(())
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() || name == FREE_SPACE {
            return Err(Error::InvalidReaction(format!(
                "'{}' is not a valid phase name",
                name
            )));
        }
        if self.contains(name) {
            return Err(Error::InvalidReaction(format!(
                "phase '{}' is defined twice",
                name
            )));
        }
        Ok(())
    }

    pub fn is_gas(&self, name: &str) -> bool {
        self.gases.contains(name)
    }

    pub fn is_solid(&self, name: &str) -> bool {
        self.solids.contains_key(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.is_solid(name) || self.is_gas(name)
    }

    pub fn molar_volume(&self, name: &str) -> f64 {
        self.solids
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_MOLAR_VOLUME)
    }

    pub fn solids(&self) -> impl Iterator<Item = &str> {
        self.solids.keys().map(String::as_str)
    }

    pub fn gases(&self) -> impl Iterator<Item = &str> {
        self.gases.iter().map(String::as_str)
    }
}
