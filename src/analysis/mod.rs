//! Result synthesis and aggregation.

pub mod summary;

pub use summary::*;
