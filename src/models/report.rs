use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabeledCount {
    pub label: String,
    pub count: i64,
}

/// Aggregates for the admin dashboard, computed from persisted rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub total_jobs: i64,
    pub total_applications: i64,
    pub total_hired: i64,
    pub users_by_role: Vec<LabeledCount>,
    pub jobs_by_category: Vec<LabeledCount>,
    pub candidates_by_stage: Vec<LabeledCount>,
    pub applications_last_7_days: Vec<LabeledCount>,
}
