//! Technical indicators computed over plain close/volume slices

pub mod momentum;
pub mod trend;

pub use momentum::*;
pub use trend::*;
