use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::job::JobPosting;
use crate::models::progress::{self, CandidateProgress, StageView};
use crate::models::schedule::{MeetingType, ScheduleDay};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOptionsResponse {
    pub first_stage: String,
    pub last_stage: String,
    pub middle_stage_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSelectionPayload {
    pub middle_stages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderStagesPayload {
    pub middle_stages: Vec<String>,
    pub from_index: usize,
    pub to_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagePreviewResponse {
    pub middle_stages: Vec<String>,
    pub stages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    #[validate(url)]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdvancePayload {
    #[validate(length(min = 1))]
    pub to_stage: String,
}

/// Progress with the derived pipeline position and per-stage classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub job_id: Uuid,
    pub job_title: String,
    pub candidate_id: Uuid,
    pub resume_url: Option<String>,
    pub completed_stages: Vec<String>,
    pub current_stage: Option<String>,
    pub hired: bool,
    pub stages: Vec<StageView>,
    pub version: i32,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressResponse {
    pub fn new(job: &JobPosting, progress: CandidateProgress) -> Self {
        let stages = &job.recruitment_stages;
        let completed = &progress.completed_stages;
        Self {
            job_id: progress.job_id,
            job_title: job.title.clone(),
            candidate_id: progress.candidate_id,
            current_stage: progress::current_stage(stages, completed).map(str::to_string),
            hired: progress::is_hired(stages, completed),
            stages: progress::classify_stages(stages, completed),
            resume_url: progress.resume_url,
            completed_stages: progress.completed_stages,
            version: progress.version,
            applied_at: progress.applied_at,
            updated_at: progress.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSchedulePayload {
    #[validate(length(min = 1))]
    pub stage_name: String,
    pub scheduled_date: NaiveDate,
    #[serde(deserialize_with = "crate::utils::time::deserialize_time")]
    pub start_time: NaiveTime,
    #[serde(deserialize_with = "crate::utils::time::deserialize_time")]
    pub end_time: NaiveTime,
    pub meeting_type: MeetingType,
    #[validate(url)]
    pub meeting_link: Option<String>,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub today: NaiveDate,
    pub days: Vec<ScheduleDay>,
}
