pub mod lattice;
pub mod simulation;
