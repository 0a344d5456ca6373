//! Analysis modules.
//!
//! Series aggregation and spectral index computation.

pub mod aggregator;
pub mod indices;

pub use aggregator::*;
pub use indices::compute_indices;
