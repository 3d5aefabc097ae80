use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::pipeline_dto::{ApplyPayload, ProgressResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::notification::NotificationKind;
use crate::models::user::Role;
use crate::services::job_service::{ensure_owner, load_job};
use crate::services::notification_service::NotificationService;
use crate::utils::time;

#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Starts the candidate at the first stage and tells the recruiter.
    pub async fn apply(
        &self,
        job_id: Uuid,
        candidate: &AuthUser,
        payload: ApplyPayload,
    ) -> Result<ProgressResponse> {
        let job = load_job(self.store.as_ref(), job_id).await?;
        if !job.is_open(time::today()) {
            return Err(Error::BadRequest(
                "The application deadline for this job has passed".to_string(),
            ));
        }

        let applicant = candidate
            .display_name
            .clone()
            .unwrap_or_else(|| candidate.email.clone());
        self.ensure_account(candidate, &applicant).await?;

        let progress = self
            .store
            .insert_progress(job_id, candidate.id, payload.resume_url)
            .await?;
        tracing::info!(%job_id, candidate_id = %candidate.id, "application submitted");

        self.notifications
            .emit(
                job.recruiter_id,
                NotificationKind::JobApplication,
                format!("{} applied for {}", applicant, job.title),
            )
            .await;

        Ok(ProgressResponse::new(&job, progress))
    }

    /// Job seekers may apply without registering first; their account row is
    /// created here with the `user` role.
    async fn ensure_account(&self, candidate: &AuthUser, display_name: &str) -> Result<()> {
        if self.store.find_user_by_email(&candidate.email).await?.is_some() {
            return Ok(());
        }
        self.store
            .upsert_user(candidate.id, &candidate.email, display_name, Role::User)
            .await?;
        tracing::info!(user_id = %candidate.id, "job seeker account created on first application");
        Ok(())
    }

    pub async fn list_applicants(
        &self,
        job_id: Uuid,
        recruiter_id: Uuid,
    ) -> Result<Vec<ProgressResponse>> {
        let job = load_job(self.store.as_ref(), job_id).await?;
        ensure_owner(&job, recruiter_id)?;

        let applicants = self.store.list_progress_for_job(job_id).await?;
        Ok(applicants
            .into_iter()
            .map(|progress| ProgressResponse::new(&job, progress))
            .collect())
    }

    pub async fn list_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<ProgressResponse>> {
        let applications = self.store.list_progress_for_candidate(candidate_id).await?;

        let mut jobs = HashMap::new();
        let mut responses = Vec::with_capacity(applications.len());
        for progress in applications {
            if !jobs.contains_key(&progress.job_id) {
                let job = load_job(self.store.as_ref(), progress.job_id).await?;
                jobs.insert(progress.job_id, job);
            }
            if let Some(job) = jobs.get(&progress.job_id) {
                responses.push(ProgressResponse::new(job, progress));
            }
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockStore;
    use crate::models::job::JobPosting;
    use crate::models::notification::Notification;
    use crate::models::progress::CandidateProgress;
    use crate::models::user::User;
    use crate::services::realtime_service::RealtimeHub;

    fn job() -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            recruiter_id: Uuid::new_v4(),
            title: "Support Engineer".to_string(),
            description: "Keep customers happy".to_string(),
            category: "Support".to_string(),
            location: "Remote".to_string(),
            job_type: None,
            salary_min: None,
            salary_max: None,
            vacancy: 2,
            deadline: None,
            recruitment_stages: vec!["CV Screening".to_string(), "Hire".to_string()],
            created_at: time::now(),
            updated_at: time::now(),
        }
    }

    fn seeker() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "walk-in@example.com".to_string(),
            display_name: Some("Walk In".to_string()),
            role: Role::User,
        }
    }

    fn store_for(posting: JobPosting) -> MockStore {
        let mut store = MockStore::new();
        store
            .expect_get_job()
            .returning(move |_| Ok(Some(posting.clone())));
        store
            .expect_insert_progress()
            .returning(|job_id, candidate_id, resume_url| {
                Ok(CandidateProgress {
                    job_id,
                    candidate_id,
                    resume_url,
                    completed_stages: Vec::new(),
                    version: 0,
                    applied_at: time::now(),
                    updated_at: time::now(),
                })
            });
        store
            .expect_insert_notification()
            .returning(|recipient_id, kind, message| {
                Ok(Notification {
                    id: Uuid::new_v4(),
                    recipient_id,
                    kind,
                    message,
                    is_read: false,
                    read_at: None,
                    created_at: time::now(),
                })
            });
        store
    }

    fn service(store: MockStore) -> ApplicationService {
        let store: Arc<dyn Store> = Arc::new(store);
        ApplicationService::new(
            store.clone(),
            NotificationService::new(store, RealtimeHub::new()),
        )
    }

    #[tokio::test]
    async fn first_application_creates_user_account() {
        let posting = job();
        let job_id = posting.id;
        let candidate = seeker();
        let candidate_id = candidate.id;

        let mut store = store_for(posting);
        store.expect_find_user_by_email().returning(|_| Ok(None));
        store
            .expect_upsert_user()
            .withf(move |id, email, name, role| {
                *id == candidate_id
                    && email.to_string() == "walk-in@example.com"
                    && name.to_string() == "Walk In"
                    && *role == Role::User
            })
            .times(1)
            .returning(|id, email, name, role| {
                Ok(User {
                    id,
                    email: email.to_string(),
                    display_name: name.to_string(),
                    role,
                    created_at: time::now(),
                    updated_at: time::now(),
                })
            });

        let response = service(store)
            .apply(job_id, &candidate, ApplyPayload::default())
            .await;
        tokio_test::assert_ok!(response);
    }

    #[tokio::test]
    async fn registered_applicant_is_not_upserted() {
        let posting = job();
        let job_id = posting.id;
        let candidate = seeker();
        let existing = User {
            id: candidate.id,
            email: candidate.email.clone(),
            display_name: "Walk In".to_string(),
            role: Role::User,
            created_at: time::now(),
            updated_at: time::now(),
        };

        let mut store = store_for(posting);
        store
            .expect_find_user_by_email()
            .returning(move |_| Ok(Some(existing.clone())));

        let response = service(store)
            .apply(job_id, &candidate, ApplyPayload::default())
            .await;
        tokio_test::assert_ok!(response);
    }
}
