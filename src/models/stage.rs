//! Recruitment stage catalog.
//!
//! Every pipeline starts with [`FIRST_STAGE`] and ends with [`LAST_STAGE`].
//! Recruiters pick and order the middle stages from [`MIDDLE_STAGE_OPTIONS`]
//! when posting a job; the resulting list is snapshotted into the job and
//! never changes afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const FIRST_STAGE: &str = "CV Screening";
pub const LAST_STAGE: &str = "Hire";

pub const MIDDLE_STAGE_OPTIONS: [&str; 4] = [
    "Initial Interview",
    "Technical Test",
    "Technical Interview",
    "HR Interview",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCatalog {
    middle_stages: Vec<String>,
}

impl StageCatalog {
    pub fn build(selected: &[String]) -> Result<Self> {
        if selected.is_empty() {
            return Err(Error::InvalidStages(
                "Select at least one recruitment stage".to_string(),
            ));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(selected.len());
        for stage in selected {
            if !MIDDLE_STAGE_OPTIONS.contains(&stage.as_str()) {
                return Err(Error::InvalidStages(format!(
                    "Unknown recruitment stage '{}'",
                    stage
                )));
            }
            if seen.contains(&stage.as_str()) {
                return Err(Error::InvalidStages(format!(
                    "Recruitment stage '{}' selected more than once",
                    stage
                )));
            }
            seen.push(stage.as_str());
        }

        Ok(Self {
            middle_stages: selected.to_vec(),
        })
    }

    pub fn middle_stages(&self) -> &[String] {
        &self.middle_stages
    }

    pub fn stages(&self) -> Vec<String> {
        let mut stages = Vec::with_capacity(self.middle_stages.len() + 2);
        stages.push(FIRST_STAGE.to_string());
        stages.extend(self.middle_stages.iter().cloned());
        stages.push(LAST_STAGE.to_string());
        stages
    }
}

/// `["CV Screening", ...selected, "Hire"]`, or an error when the selection is
/// empty, repeats a stage or names a stage outside the predefined set.
pub fn build_stages(selected: &[String]) -> Result<Vec<String>> {
    Ok(StageCatalog::build(selected)?.stages())
}

/// Swaps two adjacent middle stages. Anything else (out of bounds indices,
/// non-adjacent indices) leaves the order untouched.
pub fn reorder(selected: &[String], from: usize, to: usize) -> Vec<String> {
    let mut reordered = selected.to_vec();
    if from < reordered.len() && to < reordered.len() && from.abs_diff(to) == 1 {
        reordered.swap(from, to);
    }
    reordered
}

/// Checks a persisted stage list still has the shape the catalog produces.
pub fn validate_stage_list(stages: &[String]) -> Result<()> {
    if stages.len() < 3 {
        return Err(Error::Internal(format!(
            "Stage list has {} entries, expected at least 3",
            stages.len()
        )));
    }
    if stages.first().map(String::as_str) != Some(FIRST_STAGE)
        || stages.last().map(String::as_str) != Some(LAST_STAGE)
    {
        return Err(Error::Internal(
            "Stage list does not start with CV Screening and end with Hire".to_string(),
        ));
    }
    for (idx, stage) in stages.iter().enumerate() {
        if stages[..idx].contains(stage) {
            return Err(Error::Internal(format!("Duplicate stage '{}'", stage)));
        }
    }
    Ok(())
}
