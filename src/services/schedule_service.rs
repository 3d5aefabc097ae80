use std::sync::Arc;

use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::pipeline_dto::{CreateSchedulePayload, ScheduleListResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthUser;
use crate::models::progress::CandidateProgress;
use crate::models::schedule::{self, NewSchedule, Schedule};
use crate::models::user::{Capability, Role};
use crate::services::job_service::{ensure_owner, load_job};
use crate::utils::time;

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn Store>,
}

/// Where a stage sits relative to a candidate's position in the pipeline.
#[derive(Debug, PartialEq, Eq)]
enum StagePosition {
    Completed,
    Current,
    Ahead,
}

fn position_of(stages: &[String], progress: &CandidateProgress, stage: &str) -> Option<StagePosition> {
    let idx = stages.iter().position(|s| s == stage)?;
    let done = progress.completed_stages.len();
    Some(if idx < done {
        StagePosition::Completed
    } else if idx == done {
        StagePosition::Current
    } else {
        StagePosition::Ahead
    })
}

impl ScheduleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Books a meeting for the candidate's current stage. The insert only
    /// lands if the candidate has not moved since the stage was checked.
    pub async fn create(
        &self,
        job_id: Uuid,
        candidate_id: Uuid,
        recruiter_id: Uuid,
        payload: CreateSchedulePayload,
    ) -> Result<Schedule> {
        if payload.end_time <= payload.start_time {
            return Err(Error::BadRequest(
                "end_time must be after start_time".to_string(),
            ));
        }

        let job = load_job(self.store.as_ref(), job_id).await?;
        ensure_owner(&job, recruiter_id)?;
        let progress = self.load_progress(job_id, candidate_id).await?;

        match position_of(&job.recruitment_stages, &progress, &payload.stage_name) {
            None => {
                return Err(Error::BadRequest(format!(
                    "'{}' is not a recruitment stage of this job",
                    payload.stage_name
                )))
            }
            Some(StagePosition::Completed) => {
                return Err(Error::StaleStage(format!(
                    "Candidate has already moved past '{}'",
                    payload.stage_name
                )))
            }
            Some(StagePosition::Ahead) => {
                return Err(Error::BadRequest(format!(
                    "Candidate has not reached '{}' yet",
                    payload.stage_name
                )))
            }
            Some(StagePosition::Current) => {}
        }

        let stage_name = payload.stage_name.clone();
        let new_schedule = NewSchedule {
            job_id,
            candidate_id,
            stage_name: payload.stage_name,
            scheduled_date: payload.scheduled_date,
            start_time: payload.start_time,
            end_time: payload.end_time,
            meeting_type: payload.meeting_type,
            meeting_link: payload.meeting_link,
            note: payload.note,
        };

        match self
            .store
            .insert_schedule_if_unchanged(new_schedule, progress.version)
            .await?
        {
            Some(created) => {
                tracing::info!(
                    schedule_id = %created.id,
                    %job_id,
                    %candidate_id,
                    stage = %created.stage_name,
                    date = %created.scheduled_date,
                    "schedule created"
                );
                Ok(created)
            }
            None => {
                tracing::warn!(%job_id, %candidate_id, stage = %stage_name, "progress moved while scheduling");
                Err(Error::StaleStage(format!(
                    "Candidate is no longer at '{}'",
                    stage_name
                )))
            }
        }
    }

    /// Recruiters see meetings for their jobs, candidates see their own.
    pub async fn list_for(&self, user: &AuthUser) -> Result<ScheduleListResponse> {
        user.require(Capability::ViewSchedules)?;
        let schedules = match user.role {
            Role::Recruiter => self.store.list_schedules_for_recruiter(user.id).await?,
            _ => self.store.list_schedules_for_candidate(user.id).await?,
        };
        let today = time::today();
        Ok(ScheduleListResponse {
            today,
            days: schedule::group_by_day(schedules, today),
        })
    }

    async fn load_progress(&self, job_id: Uuid, candidate_id: Uuid) -> Result<CandidateProgress> {
        self.store
            .get_progress(job_id, candidate_id)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockStore;
    use crate::models::job::JobPosting;
    use crate::models::schedule::MeetingType;
    use chrono::{Duration, NaiveTime};

    fn stages() -> Vec<String> {
        ["CV Screening", "Aptitude Test", "Technical Test", "Hire"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn progress(completed: &[&str], version: i32) -> CandidateProgress {
        CandidateProgress {
            job_id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            resume_url: None,
            completed_stages: completed.iter().map(|s| s.to_string()).collect(),
            version,
            applied_at: time::now(),
            updated_at: time::now(),
        }
    }

    fn job(recruiter_id: Uuid) -> JobPosting {
        JobPosting {
            id: Uuid::new_v4(),
            recruiter_id,
            title: "QA Engineer".to_string(),
            description: "Test things".to_string(),
            category: "Engineering".to_string(),
            location: "Chattogram".to_string(),
            job_type: None,
            salary_min: None,
            salary_max: None,
            vacancy: 2,
            deadline: None,
            recruitment_stages: stages(),
            created_at: time::now(),
            updated_at: time::now(),
        }
    }

    fn payload(stage: &str) -> CreateSchedulePayload {
        CreateSchedulePayload {
            stage_name: stage.to_string(),
            scheduled_date: time::today() + Duration::days(1),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            meeting_type: MeetingType::Video,
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            note: None,
        }
    }

    #[test]
    fn positions_relative_to_progress() {
        let stages = stages();
        let row = progress(&["CV Screening"], 1);
        assert_eq!(
            position_of(&stages, &row, "CV Screening"),
            Some(StagePosition::Completed)
        );
        assert_eq!(
            position_of(&stages, &row, "Aptitude Test"),
            Some(StagePosition::Current)
        );
        assert_eq!(position_of(&stages, &row, "Hire"), Some(StagePosition::Ahead));
        assert_eq!(position_of(&stages, &row, "Group Discussion"), None);
    }

    #[tokio::test]
    async fn completed_stage_is_stale() {
        let recruiter = Uuid::new_v4();
        let posting = job(recruiter);
        let job_id = posting.id;
        let mut store = MockStore::new();
        store
            .expect_get_job()
            .returning(move |_| Ok(Some(posting.clone())));
        store
            .expect_get_progress()
            .returning(|_, _| Ok(Some(progress(&["CV Screening", "Aptitude Test"], 2))));
        store.expect_insert_schedule_if_unchanged().never();

        let err = ScheduleService::new(Arc::new(store))
            .create(job_id, Uuid::new_v4(), recruiter, payload("Aptitude Test"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StaleStage(_)));
    }

    #[tokio::test]
    async fn version_mismatch_at_insert_is_stale() {
        let recruiter = Uuid::new_v4();
        let posting = job(recruiter);
        let job_id = posting.id;
        let mut store = MockStore::new();
        store
            .expect_get_job()
            .returning(move |_| Ok(Some(posting.clone())));
        store
            .expect_get_progress()
            .returning(|_, _| Ok(Some(progress(&["CV Screening"], 1))));
        store
            .expect_insert_schedule_if_unchanged()
            .times(1)
            .returning(|_, expected| {
                assert_eq!(expected, 1);
                Ok(None)
            });

        let err = ScheduleService::new(Arc::new(store))
            .create(job_id, Uuid::new_v4(), recruiter, payload("Aptitude Test"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StaleStage(_)));
    }

    #[tokio::test]
    async fn inverted_time_range_is_rejected() {
        let mut bad = payload("CV Screening");
        bad.end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let err = ScheduleService::new(Arc::new(MockStore::new()))
            .create(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), bad)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn admin_has_no_schedule_view() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            display_name: None,
            role: Role::Admin,
        };
        let err = ScheduleService::new(Arc::new(MockStore::new()))
            .list_for(&admin)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
