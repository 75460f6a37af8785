//! Analysis job execution

pub mod context;
pub mod handlers;
pub mod log;
pub mod runner;
pub mod types;
pub mod workflow;

pub use context::JobContext;
pub use log::JobLog;
pub use runner::JobRunner;
pub use types::{AnalysisCreated, AnalysisRequest, PipelineOutcome};
pub use workflow::Stage;
