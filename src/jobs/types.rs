//! Request and outcome types for analysis jobs

use crate::models::signal::Recommendation;
use serde::{Deserialize, Serialize};

/// Body of a create request. Omitted or empty tickers resolve to the default set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub tickers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCreated {
    pub analysis_id: String,
}

/// What a successful pipeline run hands back for persistence
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Serialized `{"summary", "recommendations"}` document
    pub summary: String,
    pub recommendation: Option<String>,
    pub recommendations: Vec<Recommendation>,
}
