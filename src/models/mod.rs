//! Shared data models spanning the engine layers.

pub mod job;
pub mod market;
pub mod signal;

pub use job::{AnalysisJob, JobStatus, LogLine};
pub use market::{DailyBar, PeriodValue, StatementItem};
pub use signal::{
    CapexGrowth, DistributionExit, FundamentalPeak, PriceInfo, PriceSpike, Rating,
    Recommendation, SectorRotation, SellSignal, TechnicalExhaustion,
};
