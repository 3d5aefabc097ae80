use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub job_type: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub vacancy: i32,
    pub deadline: Option<NaiveDate>,
    pub recruitment_stages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn is_open(&self, today: NaiveDate) -> bool {
        self.deadline.map_or(true, |deadline| deadline >= today)
    }
}

/// Insert payload; `recruitment_stages` comes from the stage catalog.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub recruiter_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub job_type: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub vacancy: i32,
    pub deadline: Option<NaiveDate>,
    pub recruitment_stages: Vec<String>,
}

/// Descriptive fields only; the stage snapshot is not patchable. Nullable
/// columns use `Option<Option<_>>`, where `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<Option<String>>,
    pub salary_min: Option<Option<Decimal>>,
    pub salary_max: Option<Option<Decimal>>,
    pub vacancy: Option<i32>,
    pub deadline: Option<Option<NaiveDate>>,
}
