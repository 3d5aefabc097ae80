use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::pipeline_dto::ProgressResponse;
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::notification::NotificationKind;
use crate::models::progress::{self, CandidateProgress};
use crate::models::stage::{self, LAST_STAGE};
use crate::services::job_service::{ensure_owner, load_job};
use crate::services::notification_service::NotificationService;

const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn Store>,
    notifications: NotificationService,
}

impl ProgressService {
    pub fn new(store: Arc<dyn Store>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Visible to the owning recruiter and to the candidate themselves.
    pub async fn view(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        viewer: &AuthUser,
    ) -> Result<ProgressResponse> {
        let job = load_job(self.store.as_ref(), job_id).await?;
        if viewer.id != candidate_id {
            ensure_owner(&job, viewer.id)?;
        }
        let progress = self.load_progress(job_id, candidate_id).await?;
        Ok(ProgressResponse::new(&job, progress))
    }

    /// Moves the candidate from their current stage into `to_stage`.
    ///
    /// The write is a compare-and-swap on the progress version. When another
    /// writer wins, the row is re-read and the transition re-validated; if
    /// that writer already performed this very move the caller gets
    /// `StaleStage`.
    pub async fn advance(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        to_stage: &str,
        recruiter_id: Uuid,
    ) -> Result<ProgressResponse> {
        let job = load_job(self.store.as_ref(), job_id).await?;
        ensure_owner(&job, recruiter_id)?;
        let stages = &job.recruitment_stages;
        stage::validate_stage_list(stages)?;

        let mut updated = None;
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let current = self.load_progress(job_id, candidate_id).await?;
            if attempt > 0 && already_reached(stages, &current, to_stage) {
                return Err(Error::StaleStage(format!(
                    "Candidate was already moved to '{}' by another request",
                    to_stage
                )));
            }

            let completed = progress::advance(stages, &current.completed_stages, to_stage)?;
            match self
                .store
                .compare_and_set_progress(job_id, candidate_id, current.version, completed)
                .await?
            {
                Some(row) => {
                    updated = Some(row);
                    break;
                }
                None => {
                    tracing::warn!(
                        %job_id,
                        %candidate_id,
                        attempt,
                        "progress changed concurrently, retrying"
                    );
                }
            }
        }

        let Some(updated) = updated else {
            return Err(Error::StaleStage(
                "Progress kept changing; refresh and try again".to_string(),
            ));
        };

        tracing::info!(%job_id, %candidate_id, to_stage, version = updated.version, "candidate advanced");

        let message = if to_stage == LAST_STAGE {
            format!("Congratulations! You have been hired for {}", job.title)
        } else {
            format!(
                "Your application for {} moved to the {} stage",
                job.title, to_stage
            )
        };
        self.notifications
            .emit(candidate_id, NotificationKind::StageProgress, message)
            .await;

        Ok(ProgressResponse::new(&job, updated))
    }

    async fn load_progress(&self, job_id: Uuid, candidate_id: Uuid) -> Result<CandidateProgress> {
        self.store
            .get_progress(job_id, candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }
}

/// True when `to_stage` is already the current stage or behind it.
fn already_reached(stages: &[String], progress: &CandidateProgress, to_stage: &str) -> bool {
    progress.completed_stages.iter().any(|s| s == to_stage)
        || progress::current_stage(stages, &progress.completed_stages) == Some(to_stage)
}
