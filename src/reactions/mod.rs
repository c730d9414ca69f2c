pub mod phases;
pub mod reaction;
pub mod set;

pub use phases::PhaseSet;
pub use reaction::ScoredReaction;
pub use set::{ReactionId, ReactionLibrary, ReactionSet, ScoredReactionSet};
