#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration as ChronoDuration;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

use next_career_backend::{
    database::store::Store,
    error::{Error, Result},
    middleware::auth::Claims,
    models::{
        job::{JobChanges, JobPosting, NewJob},
        notification::{Notification, NotificationKind},
        progress::{self, CandidateProgress},
        report::{LabeledCount, PipelineReport},
        schedule::{NewSchedule, Schedule},
        user::{Role, User},
    },
    routes,
    utils::time,
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    jobs: Vec<JobPosting>,
    progress: Vec<CandidateProgress>,
    schedules: Vec<Schedule>,
    notifications: Vec<Notification>,
}

/// `Store` backed by plain vectors, with the same compare-and-swap rules as
/// the Postgres adapter.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_notifications: AtomicBool,
    stall_notifications: AtomicBool,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Makes `insert_notification` hang forever, like a wedged connection.
    pub fn stall_notifications(&self, stall: bool) {
        self.stall_notifications.store(stall, Ordering::SeqCst);
    }

    pub fn progress_row(&self, job_id: Uuid, candidate_id: Uuid) -> Option<CandidateProgress> {
        self.tables()
            .progress
            .iter()
            .find(|p| p.job_id == job_id && p.candidate_id == candidate_id)
            .cloned()
    }

    pub fn schedule_count(&self) -> usize {
        self.tables().schedules.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(
        &self,
        id: Uuid,
        email: &str,
        display_name: &str,
        role: Role,
    ) -> Result<User> {
        let mut tables = self.tables();
        let now = time::now();
        if let Some(user) = tables
            .users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
        {
            if user.id != id {
                return Err(Error::Conflict("Email is already registered".to_string()));
            }
            user.display_name = display_name.to_string();
            user.role = role;
            user.updated_at = now;
            return Ok(user.clone());
        }
        let user = User {
            id,
            email: email.to_string(),
            display_name: display_name.to_string(),
            role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_job(&self, job: NewJob) -> Result<JobPosting> {
        let now = time::now();
        let posting = JobPosting {
            id: Uuid::new_v4(),
            recruiter_id: job.recruiter_id,
            title: job.title,
            description: job.description,
            category: job.category,
            location: job.location,
            job_type: job.job_type,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            vacancy: job.vacancy,
            deadline: job.deadline,
            recruitment_stages: job.recruitment_stages,
            created_at: now,
            updated_at: now,
        };
        self.tables().jobs.push(posting.clone());
        Ok(posting)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobPosting>> {
        Ok(self.tables().jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn update_job(&self, id: Uuid, changes: JobChanges) -> Result<Option<JobPosting>> {
        let mut tables = self.tables();
        let Some(job) = tables.jobs.iter_mut().find(|j| j.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.title {
            job.title = v;
        }
        if let Some(v) = changes.description {
            job.description = v;
        }
        if let Some(v) = changes.category {
            job.category = v;
        }
        if let Some(v) = changes.location {
            job.location = v;
        }
        if let Some(v) = changes.job_type {
            job.job_type = v;
        }
        if let Some(v) = changes.salary_min {
            job.salary_min = v;
        }
        if let Some(v) = changes.salary_max {
            job.salary_max = v;
        }
        if let Some(v) = changes.vacancy {
            job.vacancy = v;
        }
        if let Some(v) = changes.deadline {
            job.deadline = v;
        }
        job.updated_at = time::now();
        Ok(Some(job.clone()))
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>> {
        Ok(self.tables().jobs.clone())
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobPosting>> {
        Ok(self
            .tables()
            .jobs
            .iter()
            .filter(|j| j.recruiter_id == recruiter_id)
            .cloned()
            .collect())
    }

    async fn insert_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        resume_url: Option<String>,
    ) -> Result<CandidateProgress> {
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == candidate_id)
            || !tables.jobs.iter().any(|j| j.id == job_id)
        {
            return Err(Error::BadRequest(
                "Referenced account or record does not exist; register with POST /api/users first"
                    .to_string(),
            ));
        }
        if tables
            .progress
            .iter()
            .any(|p| p.job_id == job_id && p.candidate_id == candidate_id)
        {
            return Err(Error::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }
        let now = time::now();
        let row = CandidateProgress {
            job_id,
            candidate_id,
            resume_url,
            completed_stages: Vec::new(),
            version: 0,
            applied_at: now,
            updated_at: now,
        };
        tables.progress.push(row.clone());
        Ok(row)
    }

    async fn get_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<CandidateProgress>> {
        Ok(self.progress_row(job_id, candidate_id))
    }

    async fn compare_and_set_progress(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        expected_version: i32,
        completed_stages: Vec<String>,
    ) -> Result<Option<CandidateProgress>> {
        let mut tables = self.tables();
        let Some(row) = tables.progress.iter_mut().find(|p| {
            p.job_id == job_id && p.candidate_id == candidate_id && p.version == expected_version
        }) else {
            return Ok(None);
        };
        row.completed_stages = completed_stages;
        row.version += 1;
        row.updated_at = time::now();
        Ok(Some(row.clone()))
    }

    async fn list_progress_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateProgress>> {
        Ok(self
            .tables()
            .progress
            .iter()
            .filter(|p| p.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn list_progress_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<Vec<CandidateProgress>> {
        Ok(self
            .tables()
            .progress
            .iter()
            .filter(|p| p.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn insert_schedule_if_unchanged(
        &self,
        schedule: NewSchedule,
        expected_version: i32,
    ) -> Result<Option<Schedule>> {
        let mut tables = self.tables();
        let unchanged = tables.progress.iter().any(|p| {
            p.job_id == schedule.job_id
                && p.candidate_id == schedule.candidate_id
                && p.version == expected_version
        });
        if !unchanged {
            return Ok(None);
        }
        let row = Schedule {
            id: Uuid::new_v4(),
            job_id: schedule.job_id,
            candidate_id: schedule.candidate_id,
            stage_name: schedule.stage_name,
            scheduled_date: schedule.scheduled_date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            meeting_type: schedule.meeting_type,
            meeting_link: schedule.meeting_link,
            note: schedule.note,
            created_at: time::now(),
        };
        tables.schedules.push(row.clone());
        Ok(Some(row))
    }

    async fn list_schedules_for_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<Schedule>> {
        let tables = self.tables();
        Ok(tables
            .schedules
            .iter()
            .filter(|s| {
                tables
                    .jobs
                    .iter()
                    .any(|j| j.id == s.job_id && j.recruiter_id == recruiter_id)
            })
            .cloned()
            .collect())
    }

    async fn list_schedules_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Schedule>> {
        Ok(self
            .tables()
            .schedules
            .iter()
            .filter(|s| s.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    async fn insert_notification(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        message: String,
    ) -> Result<Notification> {
        if self.stall_notifications.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(Error::Internal("notification storage unavailable".to_string()));
        }
        let row = Notification {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            message,
            is_read: false,
            read_at: None,
            created_at: time::now(),
        };
        self.tables().notifications.push(row.clone());
        Ok(row)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .tables()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn mark_notification_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        let mut tables = self.tables();
        let Some(row) = tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
        else {
            return Ok(None);
        };
        if !row.is_read {
            row.is_read = true;
            row.read_at = Some(time::now());
        }
        Ok(Some(row.clone()))
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut tables = self.tables();
        let now = time::now();
        let mut updated = 0;
        for row in tables
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            row.is_read = true;
            row.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn pipeline_report(&self) -> Result<PipelineReport> {
        let tables = self.tables();

        let mut by_stage: HashMap<String, i64> = HashMap::new();
        let mut hired = 0;
        for row in &tables.progress {
            let Some(job) = tables.jobs.iter().find(|j| j.id == row.job_id) else {
                continue;
            };
            let stage = progress::current_stage(&job.recruitment_stages, &row.completed_stages)
                .unwrap_or("Hire")
                .to_string();
            if progress::is_hired(&job.recruitment_stages, &row.completed_stages) {
                hired += 1;
            }
            *by_stage.entry(stage).or_default() += 1;
        }

        let mut by_role: HashMap<String, i64> = HashMap::new();
        for user in &tables.users {
            *by_role.entry(user.role.as_str().to_string()).or_default() += 1;
        }
        let mut by_category: HashMap<String, i64> = HashMap::new();
        for job in &tables.jobs {
            *by_category.entry(job.category.clone()).or_default() += 1;
        }

        let today = time::today();
        let applications_last_7_days = (0..7)
            .rev()
            .map(|offset| {
                let day = today - ChronoDuration::days(offset);
                LabeledCount {
                    label: day.to_string(),
                    count: tables
                        .progress
                        .iter()
                        .filter(|p| p.applied_at.date_naive() == day)
                        .count() as i64,
                }
            })
            .collect();

        Ok(PipelineReport {
            total_jobs: tables.jobs.len() as i64,
            total_applications: tables.progress.len() as i64,
            total_hired: hired,
            users_by_role: sorted_counts(by_role),
            jobs_by_category: sorted_counts(by_category),
            candidates_by_stage: sorted_counts(by_stage),
            applications_last_7_days,
        })
    }
}

fn sorted_counts(counts: HashMap<String, i64>) -> Vec<LabeledCount> {
    let mut rows: Vec<LabeledCount> = counts
        .into_iter()
        .map(|(label, count)| LabeledCount { label, count })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(store.clone(), JWT_SECRET, Duration::from_secs(300));
        let router = routes::router(state.clone(), 10_000, 10_000);
        Self {
            store,
            state,
            router,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    /// Mints a token and registers the account with `role` (admins are
    /// seeded straight into the store).
    pub async fn account(&self, name: &str, role: Role) -> (Uuid, String) {
        let id = Uuid::new_v4();
        let email = format!("{}-{}@example.com", name, id.simple());
        let token = token_for(id, &email, name);
        match role {
            Role::Admin => {
                self.store
                    .upsert_user(id, &email, name, Role::Admin)
                    .await
                    .unwrap();
            }
            _ => {
                let (status, _) = self
                    .request(
                        Method::POST,
                        "/api/users",
                        Some(&token),
                        Some(serde_json::json!({ "role": role, "display_name": name })),
                    )
                    .await;
                assert_eq!(status, StatusCode::CREATED);
            }
        }
        (id, token)
    }
}

pub fn token_for(id: Uuid, email: &str, name: &str) -> String {
    let claims = Claims {
        sub: id.to_string(),
        email: email.to_string(),
        name: Some(name.to_string()),
        exp: (time::now() + ChronoDuration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
