use crate::error::Result;
use crate::lattice::site::{SiteId, SiteState};
use crate::lattice::state::SimulationState;
use crate::lattice::topology::NeighborGraph;
use crate::reactions::reaction::ScoredReaction;
use crate::reactions::set::ReactionSet;
use crate::simulation::calculator::ReactionCalculator;
use crate::simulation::selection::adjust_score_for_distance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// Two neighboring solids react.
    SolidSolid,
    /// Two neighboring solids react together with an atmospheric species.
    SolidSolidGas,
    /// A solid reacts with the atmosphere through adjacent free space.
    Atmospheric,
    /// A solid reacts on its own.
    Decomposition,
    NoOp,
}

/// One candidate local event at a site, built fresh for each enumeration.
#[derive(Debug, Clone)]
pub struct SiteInteraction<'a> {
    pub kind: InteractionKind,
    pub score: f64,
    /// Participating site snapshots: the site itself first, then any partner.
    pub sites: Vec<&'a SiteState>,
    /// Competing reactions that could realize this event, best ranked first.
    pub reactions: Vec<&'a ScoredReaction>,
    pub atmosphere_reactant: Option<&'a str>,
}

impl<'a> SiteInteraction<'a> {
    pub fn no_op(inertia: f64) -> Self {
        SiteInteraction {
            kind: InteractionKind::NoOp,
            score: inertia,
            sites: Vec::new(),
            reactions: Vec::new(),
            atmosphere_reactant: None,
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.kind == InteractionKind::NoOp
    }

    fn new(
        kind: InteractionKind,
        sites: Vec<&'a SiteState>,
        reactions: Vec<&'a ScoredReaction>,
        distance: f64,
    ) -> Result<Option<Self>> {
        let Some(top) = reactions.first() else {
            return Ok(None);
        };
        let score = adjust_score_for_distance(top.competitiveness(), distance)?;
        Ok(Some(SiteInteraction {
            kind,
            score,
            sites,
            reactions,
            atmosphere_reactant: None,
        }))
    }
}

impl<G: NeighborGraph, S: ReactionSet> ReactionCalculator<G, S> {
    /// Every candidate event at `site_id` this tick.
    ///
    /// Candidates from all neighbors are pooled together with at most one
    /// decomposition and exactly one no-op weighted by the inertia, so the
    /// pool is never empty and its total weight is always positive.
    pub fn possible_interactions<'a>(
        &'a self,
        site_id: SiteId,
        state: &'a SimulationState,
    ) -> Result<Vec<SiteInteraction<'a>>> {
        let rxn_set = self.reaction_set()?;
        let site = state.site_state(site_id)?;
        let mut interactions = Vec::new();

        if !site.phase.is_free_space() {
            let phase = site.phase.label();

            for neighbor in self.graph.neighbors_of(site_id) {
                let other = state.site_state(neighbor.id)?;

                if other.phase.is_free_space() {
                    interactions.extend(self.atmospheric_interactions(site, rxn_set)?);
                    continue;
                }

                let other_phase = other.phase.label();
                // Identical phases would collapse into a single-reactant lookup
                if other_phase == phase {
                    continue;
                }

                let three_body: Vec<&ScoredReaction> = self
                    .atmospheric_species
                    .iter()
                    .filter(|species| species.as_str() != phase && species.as_str() != other_phase)
                    .flat_map(|species| rxn_set.reactions_for(&[phase, other_phase, species.as_str()]))
                    .collect();
                interactions.extend(SiteInteraction::new(
                    InteractionKind::SolidSolidGas,
                    vec![site, other],
                    three_body,
                    neighbor.distance,
                )?);

                let pairwise = rxn_set.reactions_for(&[other_phase, phase]);
                interactions.extend(SiteInteraction::new(
                    InteractionKind::SolidSolid,
                    vec![site, other],
                    pairwise.iter().collect(),
                    neighbor.distance,
                )?);
            }

            let decomposition = rxn_set.reactions_for(&[phase]);
            interactions.extend(SiteInteraction::new(
                InteractionKind::Decomposition,
                vec![site],
                decomposition.iter().collect(),
                1.0,
            )?);
        }

        interactions.push(SiteInteraction::no_op(self.inertia));
        Ok(interactions)
    }

    /// Reactions between `site` and each atmospheric species, reached through
    /// an adjacent free-space site. The gas partner is ambient, so the score
    /// is not decayed by distance.
    fn atmospheric_interactions<'a>(
        &'a self,
        site: &'a SiteState,
        rxn_set: &'a S,
    ) -> Result<Vec<SiteInteraction<'a>>> {
        let phase = site.phase.label();
        let mut interactions = Vec::new();
        for species in &self.atmospheric_species {
            if species.as_str() == phase {
                continue;
            }
            let rxns = rxn_set.reactions_for(&[phase, species.as_str()]);
            let atmospheric = SiteInteraction::new(
                InteractionKind::Atmospheric,
                vec![site],
                rxns.iter().collect(),
                1.0,
            )?;
            if let Some(interaction) = atmospheric {
                interactions.push(SiteInteraction {
                    atmosphere_reactant: Some(species.as_str()),
                    ..interaction
                });
            }
        }
        Ok(interactions)
    }
}
