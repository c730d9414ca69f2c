pub mod calculator;
pub mod interaction;
pub mod selection;
pub mod statistics;
pub mod update;

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{error, info};

use crate::error::Result;
use crate::lattice::site::SiteId;
use crate::lattice::state::{MergeSummary, SimulationState};
use crate::lattice::topology::NeighborGraph;
use crate::reactions::set::ReactionSet;
use crate::simulation::calculator::ReactionCalculator;
use crate::simulation::statistics::TickStatistics;
use crate::simulation::update::SiteUpdate;

/// Result of executing a single tick.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub statistics: TickStatistics,
    pub merge: MergeSummary,
}

/// Execute one synchronous tick over every site.
///
/// All sites are evaluated in parallel against the pre-tick state, then the
/// updates are merged in site order and the tick counter advances. The first
/// contract violation raised by any site aborts the tick before anything is
/// merged.
pub fn execute_tick<G, S>(
    state: &mut SimulationState,
    calculator: &ReactionCalculator<G, S>,
    seed: u64,
) -> Result<TickResult>
where
    G: NeighborGraph,
    S: ReactionSet,
{
    let tick_start = Instant::now();
    let tick = state.general_state().tick;

    let updates = evaluate_sites(state, calculator, seed).inspect_err(|e| {
        error!(tick, error = %e, "Tick aborted");
    })?;

    let merge = state.merge_updates(&updates)?;
    state.advance_tick();

    let tick_duration = tick_start.elapsed().as_secs_f32() * 1000.0;
    let statistics = statistics::compute_statistics(state, &merge, tick_duration);

    info!(
        tick = statistics.tick,
        reactions_fired = merge.reactions_fired,
        sites_changed = merge.sites_changed,
        duration_ms = tick_duration,
        "Tick complete"
    );

    Ok(TickResult { statistics, merge })
}

/// Compute every site's update against the same snapshot.
///
/// Each site draws from its own RNG seeded by (seed, tick, site), so results
/// do not depend on how rayon schedules the work.
pub fn evaluate_sites<G, S>(
    state: &SimulationState,
    calculator: &ReactionCalculator<G, S>,
    seed: u64,
) -> Result<Vec<SiteUpdate>>
where
    G: NeighborGraph,
    S: ReactionSet,
{
    let tick = state.general_state().tick;
    (0..state.site_count())
        .into_par_iter()
        .map(|i| {
            let site_id = i as SiteId;
            let mut rng = ChaCha8Rng::seed_from_u64(compute_rng_seed(seed, tick, site_id));
            calculator.compute_update(site_id, state, &mut rng)
        })
        .collect()
}

/// Compute a deterministic RNG seed for one site evaluation.
fn compute_rng_seed(seed: u64, tick: u64, site_id: SiteId) -> u64 {
    seed.wrapping_mul(6364136223846793005)
        .wrapping_add(tick)
        .wrapping_mul(1442695040888963407)
        .wrapping_add(site_id as u64)
}
