use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::lattice::site::{Phase, SiteId};
use crate::reactions::set::ReactionId;

/// New occupant of a site after a solid product forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitePatch {
    pub phase: Phase,
    pub volume: f64,
}

/// Lattice-wide effects of one firing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralPatch {
    pub reaction_chosen: ReactionId,
    /// Gas volume evolved by this update, to be summed into the ledger.
    pub gases_evolved: BTreeMap<String, f64>,
    /// Sites whose contents left the lattice as gas.
    pub vacated: BTreeSet<SiteId>,
}

/// Partial state update produced for one site in one tick.
///
/// A payload with no general patch and no site patches is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteUpdate {
    pub general: Option<GeneralPatch>,
    pub sites: BTreeMap<SiteId, SitePatch>,
}

impl SiteUpdate {
    pub fn no_op() -> Self {
        Self::default()
    }

    pub fn fired(reaction_id: ReactionId) -> Self {
        SiteUpdate {
            general: Some(GeneralPatch {
                reaction_chosen: reaction_id,
                gases_evolved: BTreeMap::new(),
                vacated: BTreeSet::new(),
            }),
            sites: BTreeMap::new(),
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.general.is_none() && self.sites.is_empty()
    }

    /// True when the update consumed material: a site was patched or
    /// vacated. A chosen reaction whose participants all failed the volume
    /// gate has no effect.
    pub fn has_effect(&self) -> bool {
        !self.sites.is_empty() || self.general.as_ref().is_some_and(|g| !g.vacated.is_empty())
    }

    pub fn reaction_chosen(&self) -> Option<ReactionId> {
        self.general.as_ref().map(|g| g.reaction_chosen)
    }

    /// Gas volume this update adds to the ledger for `phase`.
    pub fn gas_evolved(&self, phase: &str) -> f64 {
        self.general
            .as_ref()
            .and_then(|g| g.gases_evolved.get(phase).copied())
            .unwrap_or(0.0)
    }

    pub fn set_site(&mut self, site_id: SiteId, phase: Phase, volume: f64) {
        self.sites.insert(site_id, SitePatch { phase, volume });
    }

    /// Record gas leaving the lattice from `site_id`. Has no effect on a
    /// no-op payload, since gas only evolves from a fired reaction.
    pub fn record_gas(&mut self, site_id: SiteId, phase: &str, volume: f64) {
        if let Some(general) = self.general.as_mut() {
            *general.gases_evolved.entry(phase.to_string()).or_insert(0.0) += volume;
            general.vacated.insert(site_id);
        }
    }
}
