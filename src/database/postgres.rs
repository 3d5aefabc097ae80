use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::Store;
use crate::error::{Error, Result};
use crate::models::job::{JobChanges, JobPosting, NewJob};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::progress::CandidateProgress;
use crate::models::report::{LabeledCount, PipelineReport};
use crate::models::schedule::{NewSchedule, Schedule};
use crate::models::stage::LAST_STAGE;
use crate::models::user::{Role, User};

const JOB_COLUMNS: &str = "id, recruiter_id, title, description, category, location, job_type, salary_min, salary_max, vacancy, deadline, recruitment_stages, created_at, updated_at";
const PROGRESS_COLUMNS: &str =
    "job_id, candidate_id, resume_url, completed_stages, version, applied_at, updated_at";
const SCHEDULE_COLUMNS: &str = "id, job_id, candidate_id, stage_name, scheduled_date, start_time, end_time, meeting_type, meeting_link, note, created_at";
const NOTIFICATION_COLUMNS: &str = "id, recipient_id, kind, message, is_read, read_at, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_user(
        &self,
        id: Uuid,
        email: &str,
        display_name: &str,
        role: Role,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, display_name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email,
                    display_name = EXCLUDED.display_name,
                    role = EXCLUDED.role,
                    updated_at = NOW()
            RETURNING id, email, display_name, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(display_name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("Email is already registered to another account".to_string())
            }
            other => other.into(),
        })?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, display_name, role, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_job(&self, job: NewJob) -> Result<JobPosting> {
        let query = format!(
            r#"
            INSERT INTO jobs (
                recruiter_id, title, description, category, location, job_type,
                salary_min, salary_max, vacancy, deadline, recruitment_stages
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, JobPosting>(&query)
            .bind(job.recruiter_id)
            .bind(&job.title)
            .bind(&job.description)
            .bind(&job.category)
            .bind(&job.location)
            .bind(&job.job_type)
            .bind(job.salary_min)
            .bind(job.salary_max)
            .bind(job.vacancy)
            .bind(job.deadline)
            .bind(&job.recruitment_stages)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>> {
        let query = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        let row = sqlx::query_as::<_, JobPosting>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<JobPosting>> {
        let query = format!(
            r#"
            UPDATE jobs
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                location = COALESCE($5, location),
                job_type = CASE WHEN $6 THEN $7 ELSE job_type END,
                salary_min = CASE WHEN $8 THEN $9 ELSE salary_min END,
                salary_max = CASE WHEN $10 THEN $11 ELSE salary_max END,
                vacancy = COALESCE($12, vacancy),
                deadline = CASE WHEN $13 THEN $14 ELSE deadline END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            JOB_COLUMNS
        );
        let row = sqlx::query_as::<_, JobPosting>(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.category)
            .bind(changes.location)
            .bind(changes.job_type.is_some())
            .bind(changes.job_type.flatten())
            .bind(changes.salary_min.is_some())
            .bind(changes.salary_min.flatten())
            .bind(changes.salary_max.is_some())
            .bind(changes.salary_max.flatten())
            .bind(changes.vacancy)
            .bind(changes.deadline.is_some())
            .bind(changes.deadline.flatten())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>> {
        let query = format!("SELECT {} FROM jobs ORDER BY created_at DESC", JOB_COLUMNS);
        let rows = sqlx::query_as::<_, JobPosting>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobPosting>> {
        let query = format!(
            "SELECT {} FROM jobs WHERE recruiter_id = $1 ORDER BY created_at DESC",
            JOB_COLUMNS
        );
        let rows = sqlx::query_as::<_, JobPosting>(&query)
            .bind(recruiter_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        resume_url: Option<String>,
    ) -> Result<CandidateProgress> {
        let query = format!(
            r#"
            INSERT INTO candidate_progress (job_id, candidate_id, resume_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (job_id, candidate_id) DO NOTHING
            RETURNING {}
            "#,
            PROGRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateProgress>(&query)
            .bind(job_id)
            .bind(candidate_id)
            .bind(resume_url)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::Conflict("Candidate has already applied to this job".to_string()))
    }

    async fn get_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProgress>> {
        let query = format!(
            "SELECT {} FROM candidate_progress WHERE job_id = $1 AND candidate_id = $2",
            PROGRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateProgress>(&query)
            .bind(job_id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn compare_and_set_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        expected_version: i32,
        completed_stages: Vec<String>,
    ) -> Result<Option<CandidateProgress>> {
        let query = format!(
            r#"
            UPDATE candidate_progress
            SET completed_stages = $4, version = version + 1, updated_at = NOW()
            WHERE job_id = $1 AND candidate_id = $2 AND version = $3
            RETURNING {}
            "#,
            PROGRESS_COLUMNS
        );
        let row = sqlx::query_as::<_, CandidateProgress>(&query)
            .bind(job_id)
            .bind(candidate_id)
            .bind(expected_version)
            .bind(&completed_stages)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_progress_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateProgress>> {
        let query = format!(
            "SELECT {} FROM candidate_progress WHERE job_id = $1 ORDER BY applied_at DESC",
            PROGRESS_COLUMNS
        );
        let rows = sqlx::query_as::<_, CandidateProgress>(&query)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_progress_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateProgress>> {
        let query = format!(
            "SELECT {} FROM candidate_progress WHERE candidate_id = $1 ORDER BY applied_at DESC",
            PROGRESS_COLUMNS
        );
        let rows = sqlx::query_as::<_, CandidateProgress>(&query)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_schedule_if_unchanged(
        &self,
        schedule: NewSchedule,
        expected_version: i32,
    ) -> Result<Option<Schedule>> {
        // The SELECT locks nothing; the version predicate makes the insert a
        // no-op once progress has moved.
        let query = format!(
            r#"
            INSERT INTO schedules (
                job_id, candidate_id, stage_name, scheduled_date, start_time,
                end_time, meeting_type, meeting_link, note
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            FROM candidate_progress
            WHERE job_id = $1 AND candidate_id = $2 AND version = $10
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        );
        let row = sqlx::query_as::<_, Schedule>(&query)
            .bind(schedule.job_id)
            .bind(schedule.candidate_id)
            .bind(&schedule.stage_name)
            .bind(schedule.scheduled_date)
            .bind(schedule.start_time)
            .bind(schedule.end_time)
            .bind(schedule.meeting_type)
            .bind(&schedule.meeting_link)
            .bind(&schedule.note)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_schedules_for_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT s.id, s.job_id, s.candidate_id, s.stage_name, s.scheduled_date, s.start_time,
                   s.end_time, s.meeting_type, s.meeting_link, s.note, s.created_at
            FROM schedules s
            JOIN jobs j ON j.id = s.job_id
            WHERE j.recruiter_id = $1
            ORDER BY s.scheduled_date ASC, s.start_time ASC
            "#,
        )
        .bind(recruiter_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_schedules_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Schedule>> {
        let query = format!(
            "SELECT {} FROM schedules WHERE candidate_id = $1 ORDER BY scheduled_date ASC, start_time ASC",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Schedule>(&query)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        message: String,
    ) -> Result<Notification> {
        let query = format!(
            r#"
            INSERT INTO notifications (recipient_id, kind, message)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(kind)
            .bind(message)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let query = format!(
            r#"
            SELECT {}
            FROM notifications
            WHERE recipient_id = $1 AND ($2 = FALSE OR is_read = FALSE)
            ORDER BY created_at DESC
            "#,
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        let query = format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND recipient_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(recipient_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = NOW()
            WHERE recipient_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn pipeline_report(&self) -> Result<PipelineReport> {
        let total_jobs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        let total_applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM candidate_progress")
            .fetch_one(&self.pool)
            .await?;

        // Current stage is the element right after the completed prefix
        // (Postgres arrays are 1-based).
        let candidates_by_stage = labeled_counts(
            &self.pool,
            r#"
            SELECT COALESCE(j.recruitment_stages[cardinality(p.completed_stages) + 1], $1) AS label,
                   COUNT(*) AS count
            FROM candidate_progress p
            JOIN jobs j ON j.id = p.job_id
            GROUP BY 1
            ORDER BY 2 DESC, 1
            "#,
            Some(LAST_STAGE),
        )
        .await?;
        let total_hired = candidates_by_stage
            .iter()
            .filter(|c| c.label == LAST_STAGE)
            .map(|c| c.count)
            .sum();

        let users_by_role = labeled_counts(
            &self.pool,
            "SELECT role::text AS label, COUNT(*) AS count FROM users GROUP BY 1 ORDER BY 1",
            None,
        )
        .await?;
        let jobs_by_category = labeled_counts(
            &self.pool,
            "SELECT category AS label, COUNT(*) AS count FROM jobs GROUP BY 1 ORDER BY 2 DESC, 1",
            None,
        )
        .await?;
        let applications_last_7_days = labeled_counts(
            &self.pool,
            r#"
            SELECT TO_CHAR(applied_at, 'YYYY-MM-DD') AS label, COUNT(*) AS count
            FROM candidate_progress
            WHERE applied_at > NOW() - INTERVAL '7 days'
            GROUP BY 1
            ORDER BY 1
            "#,
            None,
        )
        .await?;

        Ok(PipelineReport {
            total_jobs,
            total_applications,
            total_hired,
            users_by_role,
            jobs_by_category,
            candidates_by_stage,
            applications_last_7_days,
        })
    }
}

async fn labeled_counts(
    pool: &PgPool,
    sql: &str,
    param: Option<&str>,
) -> Result<Vec<LabeledCount>> {
    let mut query = sqlx::query_as::<_, (String, i64)>(sql);
    if let Some(value) = param {
        query = query.bind(value.to_string());
    }
    let rows = query.fetch_all(pool).await?;
    Ok(rows
        .into_iter()
        .map(|(label, count)| LabeledCount { label, count })
        .collect())
}
