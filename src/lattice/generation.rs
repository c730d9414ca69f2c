use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::lattice::LatticeConfig;
use crate::error::{Error, Result};
use crate::lattice::site::{SiteId, SiteState};
use crate::lattice::state::SimulationState;
use crate::lattice::topology::{square_grid, NeighborhoodGraph};
use crate::reactions::phases::PhaseSet;

/// Resolve a configured seed; 0 means pick one at random.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed == 0 {
        rand::thread_rng().r#gen::<u64>().max(1)
    } else {
        seed
    }
}

/// Build the neighbor graph and initial state for a lattice.
///
/// Each site independently draws its phase from the fill fractions; the
/// unclaimed remainder becomes free space. Fill phases must be solids known
/// to `phases`.
pub fn generate_lattice(
    config: &LatticeConfig,
    phases: &PhaseSet,
    seed: u64,
) -> Result<(NeighborhoodGraph, SimulationState)> {
    let problems = config.problems();
    if !problems.is_empty() {
        return Err(Error::InvalidConfig(problems.join("\n")));
    }
    if let Some(unknown) = config.fill.iter().find(|f| !phases.is_solid(&f.phase)) {
        return Err(Error::InvalidConfig(format!(
            "lattice.fill phase '{}' is not a solid in the reaction library",
            unknown.phase
        )));
    }

    let site_count = SiteId::try_from(config.site_count()).map_err(|_| {
        Error::InvalidConfig(format!("lattice has {} sites", config.site_count()))
    })?;
    let graph = square_grid(config.width, config.height, config.neighborhood, config.radius);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let sites = (0..site_count)
        .map(|id| {
            let roll: f64 = rng.r#gen();
            let mut cumulative = 0.0;
            for spec in &config.fill {
                cumulative += spec.fraction;
                if roll < cumulative {
                    return SiteState::solid(id, spec.phase.clone(), config.initial_volume);
                }
            }
            SiteState::free_space(id)
        })
        .collect();

    Ok((graph, SimulationState::new(sites)?))
}
