// Movie standardization stages: normalization, identity, coherence,
// enrichment, presentation and validation.

pub mod attributes;
pub mod catalog;
pub mod coherence;
pub mod enrich;
pub mod family;
pub mod formatting;
pub mod normalize;
pub mod quality_gate;
