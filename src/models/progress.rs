use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::stage::LAST_STAGE;

/// One candidate's application to one job. `completed_stages` is always a
/// prefix of the job's recruitment stages; `version` guards concurrent writes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProgress {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub resume_url: Option<String>,
    pub completed_stages: Vec<String>,
    pub version: i32,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageView {
    pub name: String,
    pub status: StageStatus,
}

/// First stage not yet completed. `None` only when every stage is completed.
pub fn current_stage<'a>(stages: &'a [String], completed: &[String]) -> Option<&'a str> {
    stages
        .iter()
        .find(|stage| !completed.contains(stage))
        .map(String::as_str)
}

/// A candidate sitting in the final stage has been hired.
pub fn is_hired(stages: &[String], completed: &[String]) -> bool {
    match current_stage(stages, completed) {
        Some(stage) => stage == LAST_STAGE,
        None => true,
    }
}

pub fn is_prefix(stages: &[String], completed: &[String]) -> bool {
    completed.len() <= stages.len() && stages[..completed.len()] == *completed
}

/// Completes the current stage and moves to `to_stage`, which must be its
/// immediate successor. Returns the new completed list; the input is never
/// modified, so a rejected transition leaves state unchanged.
pub fn advance(stages: &[String], completed: &[String], to_stage: &str) -> Result<Vec<String>> {
    if !is_prefix(stages, completed) {
        return Err(Error::Internal(
            "Completed stages are not a prefix of the recruitment stages".to_string(),
        ));
    }

    let current_idx = completed.len();
    let Some(current) = stages.get(current_idx) else {
        return Err(Error::InvalidTransition(
            "Candidate has already completed every stage".to_string(),
        ));
    };
    if current == LAST_STAGE {
        return Err(Error::InvalidTransition(
            "Candidate has already been hired".to_string(),
        ));
    }

    let Some(next) = stages.get(current_idx + 1) else {
        return Err(Error::InvalidTransition(format!(
            "No stage follows '{}'",
            current
        )));
    };
    if next != to_stage {
        return Err(Error::InvalidTransition(format!(
            "Cannot move from '{}' to '{}'; the next stage is '{}'",
            current, to_stage, next
        )));
    }

    let mut updated = completed.to_vec();
    updated.push(current.clone());
    Ok(updated)
}

pub fn classify_stages(stages: &[String], completed: &[String]) -> Vec<StageView> {
    stages
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let status = if completed.contains(name) {
                StageStatus::Completed
            } else if idx == completed.len() {
                StageStatus::Current
            } else {
                StageStatus::Pending
            };
            StageView {
                name: name.clone(),
                status,
            }
        })
        .collect()
}
