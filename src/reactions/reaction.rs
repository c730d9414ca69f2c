use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::reactions::phases::PhaseSet;

/// A balanced reaction with an externally supplied competitiveness score.
///
/// Stoichiometric fractions and molar volumes are resolved against a
/// [PhaseSet] at construction, so the reaction is immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReaction {
    reactants: BTreeMap<String, f64>,
    products: BTreeMap<String, f64>,
    competitiveness: f64,
    solid_fractions: BTreeMap<String, f64>,
    molar_volumes: BTreeMap<String, f64>,
}

impl ScoredReaction {
    pub fn new(
        reactants: BTreeMap<String, f64>,
        products: BTreeMap<String, f64>,
        competitiveness: f64,
        phases: &PhaseSet,
    ) -> Result<Self> {
        if reactants.is_empty() {
            return Err(Error::InvalidReaction("reaction has no reactants".into()));
        }
        if products.is_empty() {
            return Err(Error::InvalidReaction("reaction has no products".into()));
        }
        if !(competitiveness.is_finite() && competitiveness >= 0.0) {
            return Err(Error::InvalidReaction(format!(
                "competitiveness must be finite and >= 0, got {}",
                competitiveness
            )));
        }
        for (name, &coeff) in reactants.iter().chain(products.iter()) {
            if !phases.contains(name) {
                return Err(Error::InvalidReaction(format!("unknown phase '{}'", name)));
            }
            if !(coeff.is_finite() && coeff > 0.0) {
                return Err(Error::InvalidReaction(format!(
                    "coefficient for '{}' must be > 0, got {}",
                    name, coeff
                )));
            }
        }

        let solid_total: f64 = reactants
            .iter()
            .filter(|(name, _)| !phases.is_gas(name))
            .map(|(_, coeff)| coeff)
            .sum();
        let solid_fractions = reactants
            .iter()
            .filter(|(name, _)| !phases.is_gas(name))
            .map(|(name, coeff)| (name.clone(), coeff / solid_total))
            .collect();
        let molar_volumes = reactants
            .keys()
            .chain(products.keys())
            .map(|name| (name.clone(), phases.molar_volume(name)))
            .collect();

        Ok(ScoredReaction {
            reactants,
            products,
            competitiveness,
            solid_fractions,
            molar_volumes,
        })
    }

    pub fn competitiveness(&self) -> f64 {
        self.competitiveness
    }

    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    pub fn reactant_stoich(&self, phase: &str) -> f64 {
        self.reactants.get(phase).copied().unwrap_or(0.0)
    }

    pub fn product_stoich(&self, phase: &str) -> f64 {
        self.products.get(phase).copied().unwrap_or(0.0)
    }

    /// Share of the solid reactant requirement carried by `phase`, in [0, 1].
    /// Gas reactants and phases outside the reaction yield 0.
    pub fn stoich_fraction(&self, phase: &str) -> f64 {
        self.solid_fractions.get(phase).copied().unwrap_or(0.0)
    }

    /// Product volume formed when `reactant_volume` of `reactant` is consumed.
    pub fn convert_volume(&self, reactant: &str, reactant_volume: f64, product: &str) -> f64 {
        let reactant_coeff = self.reactant_stoich(reactant);
        if reactant_coeff == 0.0 {
            return 0.0;
        }
        let moles = reactant_volume / self.molar_volume(reactant);
        moles * self.product_stoich(product) / reactant_coeff * self.molar_volume(product)
    }

    fn molar_volume(&self, phase: &str) -> f64 {
        self.molar_volumes
            .get(phase)
            .copied()
            .unwrap_or(crate::reactions::phases::DEFAULT_MOLAR_VOLUME)
    }

    /// Sorted, de-duplicated reactant labels used as the registry key.
    pub fn reactant_key(&self) -> Vec<String> {
        self.reactants.keys().cloned().collect()
    }
}

impl fmt::Display for ScoredReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(terms: &BTreeMap<String, f64>) -> String {
            terms
                .iter()
                .map(|(name, &coeff)| {
                    if coeff == 1.0 {
                        name.clone()
                    } else {
                        format!("{} {}", coeff, name)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        }
        write!(f, "{} -> {}", side(&self.reactants), side(&self.products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    fn phases() -> PhaseSet {
        let mut phases = PhaseSet::new();
        phases.add_solid("CaO", 16.8).unwrap();
        phases.add_solid("CaCO3", 36.9).unwrap();
        phases.add_solid("BaO", 25.6).unwrap();
        phases.add_solid("TiO2", 18.8).unwrap();
        phases.add_solid("BaTiO3", 38.7).unwrap();
        phases.add_gas("CO2").unwrap();
        phases
    }

    #[test]
    fn gas_reactants_excluded_from_solid_fraction() {
        let rxn = ScoredReaction::new(
            terms(&[("CaO", 1.0), ("CO2", 1.0)]),
            terms(&[("CaCO3", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        assert_eq!(rxn.stoich_fraction("CaO"), 1.0);
        assert_eq!(rxn.stoich_fraction("CO2"), 0.0);
    }

    #[test]
    fn solid_fractions_follow_coefficients() {
        let rxn = ScoredReaction::new(
            terms(&[("BaO", 2.0), ("TiO2", 1.0)]),
            terms(&[("BaTiO3", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        assert!((rxn.stoich_fraction("BaO") - 2.0 / 3.0).abs() < 1e-12);
        assert!((rxn.stoich_fraction("TiO2") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn convert_volume_scales_by_molar_volume_and_coefficients() {
        let rxn = ScoredReaction::new(
            terms(&[("CaO", 1.0), ("CO2", 1.0)]),
            terms(&[("CaCO3", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        let produced = rxn.convert_volume("CaO", 16.8, "CaCO3");
        assert!((produced - 36.9).abs() < 1e-9);
    }

    #[test]
    fn decomposition_to_gas_uses_unit_gas_volume() {
        let rxn = ScoredReaction::new(
            terms(&[("CaCO3", 1.0)]),
            terms(&[("CaO", 1.0), ("CO2", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        let gas = rxn.convert_volume("CaCO3", 36.9 * 2.0, "CO2");
        assert!((gas - 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_reactant_converts_to_nothing() {
        let rxn = ScoredReaction::new(
            terms(&[("CaCO3", 1.0)]),
            terms(&[("CaO", 1.0), ("CO2", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        assert_eq!(rxn.convert_volume("BaO", 5.0, "CaO"), 0.0);
    }

    #[test]
    fn invalid_reactions_rejected() {
        let p = phases();
        assert!(ScoredReaction::new(terms(&[]), terms(&[("CaO", 1.0)]), 1.0, &p).is_err());
        assert!(ScoredReaction::new(terms(&[("CaO", 1.0)]), terms(&[]), 1.0, &p).is_err());
        assert!(
            ScoredReaction::new(terms(&[("CaO", 1.0)]), terms(&[("MgO", 1.0)]), 1.0, &p).is_err()
        );
        assert!(
            ScoredReaction::new(terms(&[("CaO", 0.0)]), terms(&[("CaCO3", 1.0)]), 1.0, &p)
                .is_err()
        );
        assert!(
            ScoredReaction::new(terms(&[("CaO", 1.0)]), terms(&[("CaCO3", 1.0)]), -1.0, &p)
                .is_err()
        );
    }

    #[test]
    fn display_writes_balanced_equation() {
        let rxn = ScoredReaction::new(
            terms(&[("BaO", 2.0), ("TiO2", 1.0)]),
            terms(&[("BaTiO3", 1.0)]),
            1.0,
            &phases(),
        )
        .unwrap();
        assert_eq!(rxn.to_string(), "2 BaO + TiO2 -> BaTiO3");
    }
}
