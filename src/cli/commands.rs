use std::path::Path;

use tracing::info;

use crate::config::simulation::SimulationConfig;
use crate::error::{Error, Result};
use crate::lattice::generation::{generate_lattice, resolve_seed};
use crate::lattice::site::SiteId;
use crate::lattice::state::SimulationState;
use crate::lattice::topology::{NeighborGraph, NeighborhoodGraph};
use crate::reactions::set::{ReactionSet, ScoredReactionSet};
use crate::simulation;
use crate::simulation::calculator::ReactionCalculator;
use crate::simulation::selection::probabilities;
use crate::simulation::statistics::TickStatistics;

type Calculator = ReactionCalculator<NeighborhoodGraph, ScoredReactionSet>;

/// Everything needed to run ticks: initial state, calculator and the seed.
pub struct Setup {
    pub seed: u64,
    pub state: SimulationState,
    pub calculator: Calculator,
}

/// Load the reaction library, generate the lattice and build the calculator.
pub fn load_setup(config: &SimulationConfig, config_path: &Path) -> Result<Setup> {
    let library_path = config.reaction_library_path(config_path);
    let rxn_set = ScoredReactionSet::from_file(&library_path).map_err(|e| match e {
        Error::Io(io) => Error::InvalidConfig(format!(
            "Cannot read reaction library {}: {}",
            library_path.display(),
            io
        )),
        other => other,
    })?;

    let seed = resolve_seed(config.seed);
    let (graph, state) = generate_lattice(&config.lattice, rxn_set.phases(), seed)?;
    let calculator = ReactionCalculator::new(
        graph,
        Some(rxn_set),
        config.inertia,
        &config.atmospheric_species,
    )?;

    info!(
        seed,
        sites = state.site_count(),
        reactions = calculator.reaction_set()?.len(),
        "Simulation set up"
    );

    Ok(Setup {
        seed,
        state,
        calculator,
    })
}

/// Run the configured number of ticks and report progress.
pub fn run_simulation(
    config: &SimulationConfig,
    config_path: &Path,
    ticks: Option<u32>,
    json: bool,
) -> Result<()> {
    let Setup {
        seed,
        mut state,
        calculator,
    } = load_setup(config, config_path)?;
    let ticks = ticks.unwrap_or(config.ticks);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| Error::InvalidConfig(format!("Cannot start worker pool: {}", e)))?;

    eprintln!(
        "Running {} ticks on {} sites (seed {})",
        ticks,
        state.site_count(),
        seed
    );

    let mut last: Option<TickStatistics> = None;
    for _ in 0..ticks {
        let result = pool.install(|| simulation::execute_tick(&mut state, &calculator, seed))?;
        if json {
            println!("{}", serde_json::to_string(&result.statistics)?);
        }
        last = Some(result.statistics);
    }

    if !json {
        if let Some(stats) = &last {
            print_phase_summary(stats);
        }
    }
    Ok(())
}

/// Validate the config and reaction library without running.
pub fn check(config: &SimulationConfig, config_path: &Path) -> Result<()> {
    let setup = load_setup(config, config_path)?;
    let rxn_set = setup.calculator.reaction_set()?;
    println!("Config OK: {}", config_path.display());
    println!(
        "Phases: {} solid, {} gas",
        rxn_set.phases().solids().count(),
        rxn_set.phases().gases().count()
    );
    println!("Reactions: {}", rxn_set.len());
    println!(
        "Lattice: {}x{} ({} sites), {:?} radius {}",
        config.lattice.width,
        config.lattice.height,
        setup.state.site_count(),
        config.lattice.neighborhood,
        config.lattice.radius
    );
    for species in non_gas_species(config, rxn_set) {
        eprintln!(
            "Warning: atmospheric species '{}' is not a gas in the library",
            species
        );
    }
    Ok(())
}

/// Atmospheric species the reaction library does not classify as gases.
fn non_gas_species<'c>(
    config: &'c SimulationConfig,
    rxn_set: &impl ReactionSet,
) -> Vec<&'c str> {
    config
        .atmospheric_species
        .iter()
        .map(String::as_str)
        .filter(|species| !rxn_set.is_gas(species))
        .collect()
}

/// Print the interaction pool a site would draw from on the first tick.
pub fn inspect(config: &SimulationConfig, config_path: &Path, site_id: SiteId) -> Result<()> {
    let setup = load_setup(config, config_path)?;
    let calculator = &setup.calculator;
    let rxn_set = calculator.reaction_set()?;
    let site = setup.state.site_state(site_id)?;

    println!("=== Site {} ===", site.id);
    println!("Phase: {}", site.phase);
    println!("Volume: {:.3}", site.volume);
    let neighbors: Vec<String> = calculator
        .graph()
        .neighbors_of(site_id)
        .iter()
        .map(|n| format!("{}@{:.2}", n.id, n.distance))
        .collect();
    println!("Neighbors: {}", neighbors.join(", "));

    let pool = calculator.possible_interactions(site_id, &setup.state)?;
    let scores: Vec<f64> = pool.iter().map(|i| i.score).collect();
    let probs = probabilities(&scores)?;

    println!();
    println!(
        "{:<16} {:>10} {:>8}  {}",
        "Interaction", "Score", "P", "Participants"
    );
    println!("{}", "-".repeat(60));
    for (interaction, p) in pool.iter().zip(probs) {
        let participants: Vec<String> = interaction
            .sites
            .iter()
            .map(|s| format!("{}:{}", s.id, s.phase))
            .collect();
        println!(
            "{:<16} {:>10.4} {:>8.4}  {}",
            format!("{:?}", interaction.kind),
            interaction.score,
            p,
            participants.join(" + ")
        );
        for rxn in &interaction.reactions {
            let id = rxn_set
                .reaction_id(rxn)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!(
                "    #{:<4} {} (competitiveness {})",
                id,
                rxn,
                rxn.competitiveness()
            );
        }
    }
    Ok(())
}

/// Print a table of phase occupancy and the gas ledger.
pub fn print_phase_summary(stats: &TickStatistics) {
    println!("=== Tick {} ===", stats.tick);
    println!("{:<20} {:>8} {:>8}", "Phase", "Sites", "Share");
    println!("{}", "-".repeat(38));
    for (phase, count) in &stats.phase_distribution {
        println!(
            "{:<20} {:>8} {:>7.1}%",
            phase,
            count,
            stats.phase_fraction(phase) * 100.0
        );
    }
    println!("Total solid volume: {:.3}", stats.total_solid_volume);
    println!("Diversity: {:.3}", stats.diversity_index);
    if !stats.gases_evolved.is_empty() {
        println!("Gases evolved:");
        for (gas, volume) in &stats.gases_evolved {
            println!("  {:<18} {:.3}", gas, volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LIBRARY: &str = r#"
        gases = ["CO2"]

        [[solids]]
        name = "CaO"
        molar_volume = 1.0
        [[solids]]
        name = "CaCO3"
        molar_volume = 1.0

        [[reactions]]
        reactants = { CaO = 1.0, CO2 = 1.0 }
        products = { CaCO3 = 1.0 }
    "#;

    const CONFIG: &str = r#"
        seed = 11
        ticks = 3
        atmospheric_species = ["CO2"]
        reaction_library = "reactions.toml"

        [lattice]
        width = 4
        height = 4

        [[lattice.fill]]
        phase = "CaO"
        fraction = 0.5
    "#;

    fn write_run_dir() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("reactions.toml"), LIBRARY).unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, CONFIG).unwrap();
        (dir, config_path)
    }

    #[test]
    fn setup_uses_configured_seed_and_lattice() {
        let (_dir, path) = write_run_dir();
        let config = SimulationConfig::from_file(&path).unwrap();
        let setup = load_setup(&config, &path).unwrap();
        assert_eq!(setup.seed, 11);
        assert_eq!(setup.state.site_count(), 16);
        assert_eq!(setup.calculator.atmospheric_species(), &["CO2".to_string()]);
    }

    #[test]
    fn missing_library_names_path() {
        let (dir, path) = write_run_dir();
        fs::remove_file(dir.path().join("reactions.toml")).unwrap();
        let config = SimulationConfig::from_file(&path).unwrap();
        let err = load_setup(&config, &path).err().unwrap();
        assert!(err.to_string().contains("reactions.toml"));
    }

    #[test]
    fn run_completes_configured_ticks() {
        let (_dir, path) = write_run_dir();
        let config = SimulationConfig::from_file(&path).unwrap();
        run_simulation(&config, &path, Some(2), true).unwrap();
    }

    #[test]
    fn check_flags_atmospheric_species_that_are_not_gases() {
        let (_dir, path) = write_run_dir();
        let mut config = SimulationConfig::from_file(&path).unwrap();
        config.atmospheric_species.push("CaO".to_string());
        let setup = load_setup(&config, &path).unwrap();
        let rxn_set = setup.calculator.reaction_set().unwrap();
        assert_eq!(non_gas_species(&config, rxn_set), vec!["CaO"]);
        check(&config, &path).unwrap();
    }

    #[test]
    fn inspect_rejects_unknown_site() {
        let (_dir, path) = write_run_dir();
        let config = SimulationConfig::from_file(&path).unwrap();
        let err = inspect(&config, &path, 999).unwrap_err();
        assert!(matches!(err, Error::UnknownSite(999)));
    }
}
