pub mod cli;
pub mod config;
pub mod error;
pub mod lattice;
pub mod reactions;
pub mod simulation;

pub use error::{Error, Result};
