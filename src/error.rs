//! Error types and the crate-wide [Result] alias.
//!
//! Most variants are contract violations raised by the reaction core: they
//! surface to the tick driver immediately and are never retried.
use thiserror::Error;

use crate::lattice::site::SiteId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("no reaction set attached; call set_reaction_set before computing updates")]
    Unconfigured,

    #[error("site {site_id} holds solid '{phase}' with non-positive volume {volume}")]
    DegenerateState {
        site_id: SiteId,
        phase: String,
        volume: f64,
    },

    #[error("degenerate selection pool: {0}")]
    Scoring(String),

    #[error("site {0} is not present in the lattice state")]
    UnknownSite(SiteId),

    #[error("invalid reaction: {0}")]
    InvalidReaction(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
