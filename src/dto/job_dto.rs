use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

use crate::models::job::{JobChanges, JobPosting};
use crate::services::job_service::JobPage;

fn default_vacancy() -> i32 {
    1
}

/// Keeps "field sent as null" apart from "field left out": an explicit
/// `null` becomes `Some(None)` and clears the column, a missing field stays
/// `None` (via `#[serde(default)]`) and leaves it untouched.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    pub job_type: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[serde(default = "default_vacancy")]
    #[validate(range(min = 1))]
    pub vacancy: i32,
    pub deadline: Option<NaiveDate>,
    /// Ordered middle stages; the first and last stage are added by the catalog.
    pub middle_stages: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary_min: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary_max: Option<Option<Decimal>>,
    #[validate(range(min = 1))]
    pub vacancy: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub deadline: Option<Option<NaiveDate>>,
    /// Only present so a client trying to edit the stage snapshot gets a
    /// clear error instead of a silently ignored field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruitment_stages: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_stages: Option<JsonValue>,
}

impl From<UpdateJobPayload> for JobChanges {
    fn from(value: UpdateJobPayload) -> Self {
        Self {
            title: value.title,
            description: value.description,
            category: value.category,
            location: value.location,
            job_type: value.job_type,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            vacancy: value.vacancy,
            deadline: value.deadline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    Newest,
    Oldest,
    SalaryHigh,
    SalaryLow,
    Deadline,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub open_only: Option<bool>,
    pub sort: Option<JobSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: JobPosting,
    pub is_open: bool,
}

impl JobResponse {
    pub fn new(job: JobPosting, today: NaiveDate) -> Self {
        let is_open = job.is_open(today);
        Self { job, is_open }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl JobListResponse {
    pub fn new(page: JobPage, today: NaiveDate) -> Self {
        Self {
            items: page
                .items
                .into_iter()
                .map(|job| JobResponse::new(job, today))
                .collect(),
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}
