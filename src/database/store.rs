//! Persistence port for the pipeline.
//!
//! Services only talk to [`Store`]; `PgStore` is the production adapter.
//! Writes that must not race (progress advances, schedule bookings) are
//! expressed as compare-and-swap on the progress `version`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::job::{JobChanges, JobPosting, NewJob};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::progress::CandidateProgress;
use crate::models::report::PipelineReport;
use crate::models::schedule::{NewSchedule, Schedule};
use crate::models::user::{Role, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---
    async fn upsert_user(&self, id: Uuid, email: &str, display_name: &str, role: Role)
        -> Result<User>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // --- Jobs ---
    async fn insert_job(&self, job: NewJob) -> Result<JobPosting>;

    async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>>;

    /// Applies descriptive changes; never touches `recruitment_stages`.
    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<JobPosting>>;

    async fn list_jobs(&self) -> Result<Vec<JobPosting>>;

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobPosting>>;

    // --- Candidate progress ---
    /// Creates an empty progress row. Fails with `Conflict` when the
    /// candidate already applied to the job.
    async fn insert_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        resume_url: Option<String>,
    ) -> Result<CandidateProgress>;

    async fn get_progress(&self, job_id: Uuid, candidate_id: Uuid)
        -> Result<Option<CandidateProgress>>;

    /// Replaces `completed_stages` only if the stored version still equals
    /// `expected_version`. `None` means another writer got there first.
    async fn compare_and_set_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        expected_version: i32,
        completed_stages: Vec<String>,
    ) -> Result<Option<CandidateProgress>>;

    async fn list_progress_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateProgress>>;

    async fn list_progress_for_candidate(&self, candidate_id: Uuid)
        -> Result<Vec<CandidateProgress>>;

    // --- Schedules ---
    /// Inserts the schedule only if the candidate's progress version still
    /// equals `expected_version`. `None` means progress moved meanwhile.
    async fn insert_schedule_if_unchanged(
        &self,
        schedule: NewSchedule,
        expected_version: i32,
    ) -> Result<Option<Schedule>>;

    async fn list_schedules_for_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<Schedule>>;

    async fn list_schedules_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Schedule>>;

    // --- Notifications ---
    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        message: String,
    ) -> Result<Notification>;

    async fn list_notifications(&self, recipient_id: Uuid, unread_only: bool)
        -> Result<Vec<Notification>>;

    async fn mark_notification_read(&self, recipient_id: Uuid, id: Uuid)
        -> Result<Option<Notification>>;

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64>;

    // --- Reports ---
    async fn pipeline_report(&self) -> Result<PipelineReport>;
}
