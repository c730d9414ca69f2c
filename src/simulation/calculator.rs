use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::lattice::site::{Phase, SiteId, SiteState};
use crate::lattice::state::SimulationState;
use crate::lattice::topology::NeighborGraph;
use crate::reactions::reaction::ScoredReaction;
use crate::reactions::set::ReactionSet;
use crate::simulation::interaction::SiteInteraction;
use crate::simulation::selection::choose_weighted;
use crate::simulation::update::SiteUpdate;

/// Relative weight of doing nothing when no value is configured.
pub const DEFAULT_INERTIA: f64 = 2.0;

/// Decides, for one site per tick, whether and how a reaction occurs.
///
/// `compute_update` only reads the state snapshot and writes its return
/// value, so many sites may be evaluated in parallel against one snapshot
/// as long as each gets its own RNG.
#[derive(Debug, Clone)]
pub struct ReactionCalculator<G, S> {
    pub(crate) graph: G,
    pub(crate) rxn_set: Option<S>,
    pub(crate) inertia: f64,
    pub(crate) atmospheric_species: Vec<String>,
}

impl<G: NeighborGraph, S: ReactionSet> ReactionCalculator<G, S> {
    /// Create a calculator. `inertia` must be finite and > 0 so the no-op
    /// candidate always carries weight.
    pub fn new(
        graph: G,
        rxn_set: Option<S>,
        inertia: f64,
        atmospheric_species: &[String],
    ) -> Result<Self> {
        if !(inertia.is_finite() && inertia > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "inertia must be > 0, got {}",
                inertia
            )));
        }
        Ok(ReactionCalculator {
            graph,
            rxn_set,
            inertia,
            atmospheric_species: atmospheric_species.to_vec(),
        })
    }

    pub fn set_reaction_set(&mut self, rxn_set: S) {
        self.rxn_set = Some(rxn_set);
    }

    pub fn reaction_set(&self) -> Result<&S> {
        self.rxn_set.as_ref().ok_or(Error::Unconfigured)
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn atmospheric_species(&self) -> &[String] {
        &self.atmospheric_species
    }

    /// Compute the update for `site_id` against the pre-tick `state`.
    pub fn compute_update<R: Rng + ?Sized>(
        &self,
        site_id: SiteId,
        state: &SimulationState,
        rng: &mut R,
    ) -> Result<SiteUpdate> {
        let rxn_set = self.reaction_set()?;
        let interactions = self.possible_interactions(site_id, state)?;
        let interaction = self.choose_interaction(&interactions, rng)?;

        if interaction.is_no_op() {
            return Ok(SiteUpdate::no_op());
        }

        // Competing reactions from the reaction hull share this interaction
        let weights: Vec<f64> = interaction
            .reactions
            .iter()
            .map(|r| r.competitiveness())
            .collect();
        let reaction: &ScoredReaction = choose_weighted(rng, &interaction.reactions, &weights)?;
        let reaction_id = rxn_set.reaction_id(reaction).ok_or_else(|| {
            Error::InvalidReaction(format!("'{}' is not registered in the reaction set", reaction))
        })?;

        debug!(
            site_id,
            reaction_id,
            kind = ?interaction.kind,
            reaction = %reaction,
            "Reaction selected"
        );

        let mut update = SiteUpdate::fired(reaction_id);
        for site in &interaction.sites {
            if !self.should_reaction_proceed(reaction, site, rng)? {
                continue;
            }

            let product = self.choose_product(reaction, rng)?;
            let product_volume = reaction.convert_volume(site.phase.label(), site.volume, product);

            if rxn_set.is_gas(product) {
                debug!(site_id = site.id, gas = product, volume = product_volume, "Gas evolved");
                update.record_gas(site.id, product, product_volume);
            } else {
                debug!(
                    site_id = site.id,
                    from = %site.phase,
                    to = product,
                    volume = product_volume,
                    "Site transformed"
                );
                update.set_site(site.id, Phase::Solid(product.to_string()), product_volume);
            }
        }

        Ok(update)
    }

    fn choose_interaction<'i, 'a, R: Rng + ?Sized>(
        &self,
        interactions: &'i [SiteInteraction<'a>],
        rng: &mut R,
    ) -> Result<&'i SiteInteraction<'a>> {
        let scores: Vec<f64> = interactions.iter().map(|i| i.score).collect();
        choose_weighted(rng, interactions, &scores)
    }

    /// Gate consumption of one participant: the chance of firing is the
    /// stoichiometric fraction over the site volume, so larger cells take
    /// proportionally more ticks to consume. Ratios >= 1 always fire.
    pub(crate) fn should_reaction_proceed<R: Rng + ?Sized>(
        &self,
        reaction: &ScoredReaction,
        site: &SiteState,
        rng: &mut R,
    ) -> Result<bool> {
        if !(site.volume > 0.0) {
            return Err(Error::DegenerateState {
                site_id: site.id,
                phase: site.phase.label().to_string(),
                volume: site.volume,
            });
        }

        let probability = reaction.stoich_fraction(site.phase.label()) / site.volume;
        Ok(rng.r#gen::<f64>() < probability)
    }

    /// Commit to a single product, weighted by stoichiometric coefficient.
    pub(crate) fn choose_product<'r, R: Rng + ?Sized>(
        &self,
        reaction: &'r ScoredReaction,
        rng: &mut R,
    ) -> Result<&'r str> {
        let products: Vec<&str> = reaction.products().collect();
        let coefficients: Vec<f64> = products
            .iter()
            .map(|p| reaction.product_stoich(p))
            .collect();
        choose_weighted(rng, &products, &coefficients).copied()
    }
}
