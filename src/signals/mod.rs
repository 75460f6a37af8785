//! Signal detectors and their aggregation.

pub mod aggregation;
pub mod capex;
pub mod pricing;
pub mod rotation;
pub mod sell;

pub use aggregation::{SignalAggregator, SignalPayload, NEUTRAL_REASON};
