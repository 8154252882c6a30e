//! Core types shared across the filing-summarization pipeline: sortable
//! identifiers, closed enumerations, and the content-addressing rules
//! that make the pipeline idempotent.

pub mod enums;
pub mod hashing;
pub mod ids;

pub use enums::*;
pub use ids::*;
