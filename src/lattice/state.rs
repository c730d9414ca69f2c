use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::lattice::site::{SiteId, SiteState};
use crate::reactions::set::ReactionId;
use crate::simulation::update::SiteUpdate;

/// Lattice-wide bookkeeping carried alongside the sites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralState {
    pub tick: u64,
    /// Cumulative volume of each gas that has left the lattice.
    pub gases_evolved: BTreeMap<String, f64>,
    /// How many times each reaction has fired and consumed material.
    pub reactions_fired: BTreeMap<ReactionId, u64>,
}

/// Counts from merging one tick's worth of site updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub sites_changed: u32,
    pub overlapping_patches: u32,
    pub reactions_fired: u32,
}

/// Authoritative lattice state. Site `i` is stored at index `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    sites: Vec<SiteState>,
    general: GeneralState,
}

impl SimulationState {
    pub fn new(sites: Vec<SiteState>) -> Result<Self> {
        if let Some((index, site)) = sites
            .iter()
            .enumerate()
            .find(|(i, s)| s.id as usize != *i)
        {
            return Err(Error::InvalidConfig(format!(
                "site at index {} has id {} (ids must match positions)",
                index, site.id
            )));
        }
        Ok(SimulationState {
            sites,
            general: GeneralState::default(),
        })
    }

    pub fn site_state(&self, id: SiteId) -> Result<&SiteState> {
        self.sites.get(id as usize).ok_or(Error::UnknownSite(id))
    }

    pub fn sites(&self) -> &[SiteState] {
        &self.sites
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn general_state(&self) -> &GeneralState {
        &self.general
    }

    pub fn advance_tick(&mut self) {
        self.general.tick += 1;
    }

    /// Apply a tick's updates in order.
    ///
    /// Site patches overwrite, so a later patch for an already-changed site
    /// wins. Gas deltas are summed into the ledger and sites that evolved
    /// gas become free space. A reaction counts as fired only when its update
    /// patched or vacated a site. Nothing is applied if any update names a
    /// site outside the lattice.
    pub fn merge_updates<'u, I>(&mut self, updates: I) -> Result<MergeSummary>
    where
        I: IntoIterator<Item = &'u SiteUpdate>,
        I::IntoIter: Clone,
    {
        let updates = updates.into_iter();
        for update in updates.clone() {
            let vacated = update.general.iter().flat_map(|g| g.vacated.iter());
            for &id in update.sites.keys().chain(vacated) {
                self.site_state(id)?;
            }
        }

        let mut summary = MergeSummary::default();
        let mut touched: HashSet<SiteId> = HashSet::new();
        let mut touch = |id: SiteId, summary: &mut MergeSummary| {
            if touched.insert(id) {
                summary.sites_changed += 1;
            } else {
                summary.overlapping_patches += 1;
                warn!(site_id = id, "Site patched more than once in one tick");
            }
        };

        for update in updates {
            if let Some(general) = &update.general {
                if update.has_effect() {
                    summary.reactions_fired += 1;
                    *self
                        .general
                        .reactions_fired
                        .entry(general.reaction_chosen)
                        .or_insert(0) += 1;
                }
                for (gas, volume) in &general.gases_evolved {
                    *self.general.gases_evolved.entry(gas.clone()).or_insert(0.0) += volume;
                }
                for &id in &general.vacated {
                    touch(id, &mut summary);
                    self.sites[id as usize] = SiteState::free_space(id);
                }
            }
            for (&id, patch) in &update.sites {
                touch(id, &mut summary);
                let site = &mut self.sites[id as usize];
                site.phase = patch.phase.clone();
                site.volume = patch.volume;
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::site::Phase;

    fn three_sites() -> SimulationState {
        SimulationState::new(vec![
            SiteState::solid(0, "CaO", 1.0),
            SiteState::solid(1, "CaCO3", 2.0),
            SiteState::free_space(2),
        ])
        .unwrap()
    }

    #[test]
    fn ids_must_match_positions() {
        let err = SimulationState::new(vec![SiteState::solid(1, "CaO", 1.0)]).unwrap_err();
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn unknown_site_lookup_fails() {
        let state = three_sites();
        assert!(matches!(state.site_state(9), Err(Error::UnknownSite(9))));
    }

    #[test]
    fn gas_deltas_sum_across_updates() {
        let mut state = three_sites();
        let mut a = SiteUpdate::fired(0);
        a.record_gas(1, "CO2", 0.5);
        let mut b = SiteUpdate::fired(0);
        b.record_gas(0, "CO2", 0.25);

        let summary = state.merge_updates(&[a.clone(), b]).unwrap();
        assert_eq!(state.general_state().gases_evolved["CO2"], 0.75);
        assert_eq!(summary.reactions_fired, 2);
        assert_eq!(state.general_state().reactions_fired[&0], 2);

        state.merge_updates(&[a]).unwrap();
        assert_eq!(state.general_state().gases_evolved["CO2"], 1.25);
    }

    #[test]
    fn gas_sources_become_free_space() {
        let mut state = three_sites();
        let mut update = SiteUpdate::fired(0);
        update.record_gas(1, "CO2", 1.0);
        state.merge_updates(&[update]).unwrap();
        assert!(state.site_state(1).unwrap().phase.is_free_space());
    }

    #[test]
    fn site_patches_replace_phase_and_volume() {
        let mut state = three_sites();
        let mut update = SiteUpdate::fired(1);
        update.set_site(0, Phase::Solid("CaCO3".into()), 2.2);
        let summary = state.merge_updates(&[update]).unwrap();
        let site = state.site_state(0).unwrap();
        assert_eq!(site.phase, Phase::Solid("CaCO3".into()));
        assert_eq!(site.volume, 2.2);
        assert_eq!(summary.sites_changed, 1);
    }

    #[test]
    fn later_patch_wins_and_is_counted_as_overlap() {
        let mut state = three_sites();
        let mut first = SiteUpdate::fired(0);
        first.set_site(0, Phase::Solid("A".into()), 1.0);
        let mut second = SiteUpdate::fired(0);
        second.set_site(0, Phase::Solid("B".into()), 3.0);
        let summary = state.merge_updates(&[first, second]).unwrap();
        assert_eq!(state.site_state(0).unwrap().phase, Phase::Solid("B".into()));
        assert_eq!(summary.overlapping_patches, 1);
        assert_eq!(summary.sites_changed, 1);
    }

    #[test]
    fn gated_reaction_is_not_counted_as_fired() {
        let mut state = three_sites();
        let summary = state
            .merge_updates(&[SiteUpdate::fired(3), SiteUpdate::fired(3)])
            .unwrap();
        assert_eq!(summary.reactions_fired, 0);
        assert!(state.general_state().reactions_fired.is_empty());
        assert_eq!(summary.sites_changed, 0);
    }

    #[test]
    fn no_op_updates_change_nothing() {
        let mut state = three_sites();
        let before = state.clone();
        let summary = state
            .merge_updates(&[SiteUpdate::no_op(), SiteUpdate::no_op()])
            .unwrap();
        assert_eq!(state, before);
        assert_eq!(summary, MergeSummary::default());
    }

    #[test]
    fn out_of_range_patch_rejected_without_partial_apply() {
        let mut state = three_sites();
        let mut good = SiteUpdate::fired(0);
        good.set_site(0, Phase::Solid("X".into()), 1.0);
        let mut bad = SiteUpdate::fired(0);
        bad.set_site(42, Phase::Solid("X".into()), 1.0);
        let before = state.clone();
        assert!(matches!(
            state.merge_updates(&[good, bad]),
            Err(Error::UnknownSite(42))
        ));
        assert_eq!(state, before);
    }
}
