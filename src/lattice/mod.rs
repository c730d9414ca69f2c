pub mod generation;
pub mod site;
pub mod state;
pub mod topology;

pub use site::{Phase, SiteId, SiteState, FREE_SPACE};
pub use state::{GeneralState, MergeSummary, SimulationState};
pub use topology::{Neighbor, NeighborGraph, NeighborhoodGraph, NeighborhoodKind};
