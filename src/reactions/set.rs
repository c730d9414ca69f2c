use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::reactions::phases::PhaseSet;
use crate::reactions::reaction::ScoredReaction;

/// Stable index of a reaction within its registry.
pub type ReactionId = usize;

/// Read-only reaction registry consulted by the reaction core.
pub trait ReactionSet: Send + Sync {
    /// Reactions whose reactants are exactly the given unordered combination,
    /// ranked by descending competitiveness.
    fn reactions_for(&self, phases: &[&str]) -> &[ScoredReaction];

    fn reaction_id(&self, reaction: &ScoredReaction) -> Option<ReactionId>;

    fn is_gas(&self, phase: &str) -> bool;
}

/// In-memory [ReactionSet] bucketed by reactant combination.
///
/// Reactions are stored sorted by reactant key and then by descending
/// competitiveness, so every bucket is a contiguous slice whose first entry
/// is the best-ranked reaction. Ids are positions in that order.
#[derive(Debug, Clone)]
pub struct ScoredReactionSet {
    phases: PhaseSet,
    reactions: Vec<ScoredReaction>,
    buckets: HashMap<Vec<String>, Range<usize>>,
}

impl ScoredReactionSet {
    pub fn new(phases: PhaseSet, mut reactions: Vec<ScoredReaction>) -> Self {
        // Stable sort: ties keep their input order
        reactions.sort_by(|a, b| {
            a.reactant_key()
                .cmp(&b.reactant_key())
                .then(b.competitiveness().total_cmp(&a.competitiveness()))
        });

        let mut buckets: HashMap<Vec<String>, Range<usize>> = HashMap::new();
        for (i, rxn) in reactions.iter().enumerate() {
            buckets
                .entry(rxn.reactant_key())
                .and_modify(|range| range.end = i + 1)
                .or_insert(i..i + 1);
        }

        ScoredReactionSet {
            phases,
            reactions,
            buckets,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        ReactionLibrary::from_toml_str(&content)?.build()
    }

    pub fn phases(&self) -> &PhaseSet {
        &self.phases
    }

    pub fn reactions(&self) -> &[ScoredReaction] {
        &self.reactions
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

fn combination_key(phases: &[&str]) -> Vec<String> {
    let mut key: Vec<String> = phases.iter().map(|p| p.to_string()).collect();
    key.sort_unstable();
    key.dedup();
    key
}

impl ReactionSet for ScoredReactionSet {
    fn reactions_for(&self, phases: &[&str]) -> &[ScoredReaction] {
        match self.buckets.get(&combination_key(phases)) {
            Some(range) => &self.reactions[range.clone()],
            None => &[],
        }
    }

    fn reaction_id(&self, reaction: &ScoredReaction) -> Option<ReactionId> {
        let range = self.buckets.get(&reaction.reactant_key())?;
        self.reactions[range.clone()]
            .iter()
            .position(|r| std::ptr::eq(r, reaction) || r == reaction)
            .map(|offset| range.start + offset)
    }

    fn is_gas(&self, phase: &str) -> bool {
        self.phases.is_gas(phase)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolidDefinition {
    pub name: String,
    pub molar_volume: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionDefinition {
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    #[serde(default = "default_competitiveness")]
    pub competitiveness: f64,
}

fn default_competitiveness() -> f64 {
    1.0
}

/// On-disk reaction library: phases plus scored reactions.
///
/// ```toml
/// gases = ["CO2"]
///
/// [[solids]]
/// name = "CaO"
/// molar_volume = 16.8
///
/// [[reactions]]
/// reactants = { CaO = 1.0, CO2 = 1.0 }
/// products = { CaCO3 = 1.0 }
/// competitiveness = 1.0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionLibrary {
    #[serde(default)]
    pub solids: Vec<SolidDefinition>,
    #[serde(default)]
    pub gases: Vec<String>,
    #[serde(default)]
    pub reactions: Vec<ReactionDefinition>,
}

impl ReactionLibrary {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn build(self) -> Result<ScoredReactionSet> {
        let mut phases = PhaseSet::new();
        for solid in self.solids {
            phases.add_solid(solid.name, solid.molar_volume)?;
        }
        for gas in self.gases {
            phases.add_gas(gas)?;
        }

        let reactions = self
            .reactions
            .into_iter()
            .enumerate()
            .map(|(i, def)| {
                ScoredReaction::new(def.reactants, def.products, def.competitiveness, &phases)
                    .map_err(|e| match e {
                        Error::InvalidReaction(msg) => {
                            Error::InvalidReaction(format!("reactions[{}]: {}", i, msg))
                        }
                        other => other,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ScoredReactionSet::new(phases, reactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
        gases = ["CO2"]

        [[solids]]
        name = "CaO"
        molar_volume = 16.8

        [[solids]]
        name = "CaCO3"
        molar_volume = 36.9

        [[solids]]
        name = "Ca2O3"
        molar_volume = 30.0

        [[reactions]]
        reactants = { CaO = 1.0, CO2 = 1.0 }
        products = { CaCO3 = 1.0 }
        competitiveness = 0.5

        [[reactions]]
        reactants = { CO2 = 1.0, CaO = 2.0 }
        products = { Ca2O3 = 1.0, CaCO3 = 1.0 }
        competitiveness = 2.0

        [[reactions]]
        reactants = { CaCO3 = 1.0 }
        products = { CaO = 1.0, CO2 = 1.0 }
    "#;

    fn library() -> ScoredReactionSet {
        ReactionLibrary::from_toml_str(LIBRARY).unwrap().build().unwrap()
    }

    #[test]
    fn lookup_is_order_independent() {
        let set = library();
        let forward = set.reactions_for(&["CaO", "CO2"]);
        let reverse = set.reactions_for(&["CO2", "CaO"]);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn buckets_ranked_by_competitiveness() {
        let set = library();
        let rxns = set.reactions_for(&["CaO", "CO2"]);
        assert_eq!(rxns[0].competitiveness(), 2.0);
        assert_eq!(rxns[1].competitiveness(), 0.5);
    }

    #[test]
    fn single_reactant_lookup_finds_decomposition() {
        let set = library();
        let rxns = set.reactions_for(&["CaCO3"]);
        assert_eq!(rxns.len(), 1);
        assert_eq!(rxns[0].competitiveness(), 1.0);
    }

    #[test]
    fn missing_combination_is_empty() {
        let set = library();
        assert!(set.reactions_for(&["CaO", "CaCO3"]).is_empty());
    }

    #[test]
    fn reaction_ids_are_stable_positions() {
        let set = library();
        for (id, rxn) in set.reactions().iter().enumerate() {
            assert_eq!(set.reaction_id(rxn), Some(id));
        }
        for rxn in set.reactions_for(&["CO2", "CaO"]) {
            let id = set.reaction_id(rxn).unwrap();
            assert!(std::ptr::eq(&set.reactions()[id], rxn));
        }
    }

    #[test]
    fn gas_classification_delegates_to_phases() {
        let set = library();
        assert!(set.is_gas("CO2"));
        assert!(!set.is_gas("CaO"));
    }

    #[test]
    fn unknown_phase_reports_reaction_index() {
        let toml = r#"
            [[solids]]
            name = "CaO"
            molar_volume = 16.8

            [[reactions]]
            reactants = { CaO = 1.0 }
            products = { MgO = 1.0 }
        "#;
        let err = ReactionLibrary::from_toml_str(toml)
            .unwrap()
            .build()
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("reactions[0]"));
        assert!(msg.contains("MgO"));
    }

    #[test]
    fn from_file_reads_library() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reactions.toml");
        std::fs::write(&path, LIBRARY).unwrap();
        let set = ScoredReactionSet::from_file(&path).unwrap();
        assert_eq!(set.len(), 3);
    }
}
