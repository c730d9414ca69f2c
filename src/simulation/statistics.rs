use std::collections::BTreeMap;

use serde::Serialize;

use crate::lattice::state::{MergeSummary, SimulationState};

/// Per-tick aggregate metrics for reporting progress of a synthesis run.
#[derive(Debug, Clone, Serialize)]
pub struct TickStatistics {
    pub tick: u64,
    /// Site count per occupying phase, free space included.
    pub phase_distribution: BTreeMap<String, u32>,
    pub total_solid_volume: f64,
    pub reactions_fired: u32,
    pub sites_changed: u32,
    /// Cumulative gas ledger after this tick.
    pub gases_evolved: BTreeMap<String, f64>,
    pub diversity_index: f32,
    pub tick_duration_ms: f32,
}

impl TickStatistics {
    /// Fraction of all sites occupied by `phase`.
    pub fn phase_fraction(&self, phase: &str) -> f32 {
        let total: u32 = self.phase_distribution.values().sum();
        if total == 0 {
            return 0.0;
        }
        self.phase_distribution.get(phase).copied().unwrap_or(0) as f32 / total as f32
    }
}

/// Compute statistics for the state left after a merge.
pub fn compute_statistics(
    state: &SimulationState,
    merge: &MergeSummary,
    tick_duration_ms: f32,
) -> TickStatistics {
    let mut distribution: BTreeMap<String, u32> = BTreeMap::new();
    let mut solid_distribution: BTreeMap<String, u32> = BTreeMap::new();
    let mut total_solid_volume = 0.0_f64;

    for site in state.sites() {
        *distribution.entry(site.phase.label().to_string()).or_insert(0) += 1;
        if site.phase.is_solid() {
            *solid_distribution.entry(site.phase.label().to_string()).or_insert(0) += 1;
            total_solid_volume += site.volume;
        }
    }

    TickStatistics {
        tick: state.general_state().tick,
        diversity_index: shannon_diversity(&solid_distribution),
        phase_distribution: distribution,
        total_solid_volume,
        reactions_fired: merge.reactions_fired,
        sites_changed: merge.sites_changed,
        gases_evolved: state.general_state().gases_evolved.clone(),
        tick_duration_ms,
    }
}

/// Shannon diversity of solid phases normalized to [0, 1].
/// 0 = a single phase, 1 = all present phases equally represented.
fn shannon_diversity(distribution: &BTreeMap<String, u32>) -> f32 {
    let total: u32 = distribution.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let mut entropy = 0.0_f64;
    let mut non_zero_types = 0_u32;

    for &count in distribution.values() {
        if count > 0 {
            non_zero_types += 1;
            let p = count as f64 / total_f;
            entropy -= p * p.ln();
        }
    }

    if non_zero_types <= 1 {
        return 0.0;
    }

    (entropy / (non_zero_types as f64).ln()) as f32
}
