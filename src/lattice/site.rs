use serde::{Deserialize, Serialize};

pub type SiteId = u32;

/// Label under which free space appears in reaction lookups and summaries.
pub const FREE_SPACE: &str = "Free Space";

/// What occupies a lattice site.
///
/// Gas never occupies a site: a site whose contents turn into gas is vacated
/// to free space when the tick is merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Solid(String),
    FreeSpace,
}

impl Phase {
    pub fn label(&self) -> &str {
        match self {
            Phase::Solid(name) => name,
            Phase::FreeSpace => FREE_SPACE,
        }
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Phase::Solid(_))
    }

    pub fn is_free_space(&self) -> bool {
        matches!(self, Phase::FreeSpace)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Occupying phase and volume of one site.
///
/// Volume must be > 0 for solids. For free space it carries no meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteState {
    pub id: SiteId,
    pub phase: Phase,
    pub volume: f64,
}

impl SiteState {
    pub fn solid(id: SiteId, name: impl Into<String>, volume: f64) -> Self {
        SiteState {
            id,
            phase: Phase::Solid(name.into()),
            volume,
        }
    }

    pub fn free_space(id: SiteId) -> Self {
        SiteState {
            id,
            phase: Phase::FreeSpace,
            volume: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_phase_names() {
        assert_eq!(Phase::Solid("CaO".into()).label(), "CaO");
        assert_eq!(Phase::FreeSpace.label(), FREE_SPACE);
    }

    #[test]
    fn free_space_site_is_not_solid() {
        let site = SiteState::free_space(3);
        assert!(site.phase.is_free_space());
        assert!(!site.phase.is_solid());
        assert_eq!(site.volume, 0.0);
    }
}
