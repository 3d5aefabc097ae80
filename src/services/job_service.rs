use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::database::store::Store;
use crate::dto::job_dto::{CreateJobPayload, JobListQuery, JobSort, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{JobPosting, NewJob};
use crate::models::stage::build_stages;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn Store>,
}

pub struct JobPage {
    pub items: Vec<JobPosting>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl JobService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, recruiter_id: Uuid, payload: CreateJobPayload) -> Result<JobPosting> {
        check_salary_range(payload.salary_min, payload.salary_max)?;
        let recruitment_stages = build_stages(&payload.middle_stages)?;

        let job = self
            .store
            .insert_job(NewJob {
                recruiter_id,
                title: payload.title,
                description: payload.description,
                category: payload.category,
                location: payload.location,
                job_type: payload.job_type,
                salary_min: payload.salary_min,
                salary_max: payload.salary_max,
                vacancy: payload.vacancy,
                deadline: payload.deadline,
                recruitment_stages,
            })
            .await?;

        tracing::info!(
            job_id = %job.id,
            %recruiter_id,
            stages = ?job.recruitment_stages,
            "job posted"
        );
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobPosting> {
        load_job(self.store.as_ref(), id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        recruiter_id: Uuid,
        payload: UpdateJobPayload,
    ) -> Result<JobPosting> {
        if payload.recruitment_stages.is_some() || payload.middle_stages.is_some() {
            return Err(Error::BadRequest(
                "Recruitment stages are fixed once a job is posted".to_string(),
            ));
        }

        let existing = load_job(self.store.as_ref(), id).await?;
        ensure_owner(&existing, recruiter_id)?;
        check_salary_range(
            payload.salary_min.unwrap_or(existing.salary_min),
            payload.salary_max.unwrap_or(existing.salary_max),
        )?;

        let job = self
            .store
            .update_job(id, payload.into())
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".to_string()))?;
        tracing::info!(job_id = %job.id, "job updated");
        Ok(job)
    }

    pub async fn list(&self, query: &JobListQuery, today: NaiveDate) -> Result<JobPage> {
        let jobs = self.store.list_jobs().await?;
        Ok(paginate_jobs(jobs, query, today))
    }

    pub async fn list_for_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobPosting>> {
        self.store.list_jobs_by_recruiter(recruiter_id).await
    }
}

pub(crate) async fn load_job(store: &dyn Store, id: Uuid) -> Result<JobPosting> {
    store
        .get_job(id)
        .await?
        .ok_or_else(|| Error::NotFound("Job not found".to_string()))
}

pub(crate) fn ensure_owner(job: &JobPosting, recruiter_id: Uuid) -> Result<()> {
    if job.recruiter_id == recruiter_id {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "Only the recruiter who posted this job can manage it".to_string(),
        ))
    }
}

fn check_salary_range(min: Option<Decimal>, max: Option<Decimal>) -> Result<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(Error::BadRequest(
            "salary_min cannot be greater than salary_max".to_string(),
        )),
        _ => Ok(()),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(job: &JobPosting, query: &JobListQuery, today: NaiveDate) -> bool {
    let search_ok = query.search.as_deref().map_or(true, |term| {
        let term = term.trim();
        term.is_empty()
            || contains_ci(&job.title, term)
            || contains_ci(&job.description, term)
            || contains_ci(&job.category, term)
    });
    let category_ok = query
        .category
        .as_deref()
        .map_or(true, |c| job.category.eq_ignore_ascii_case(c.trim()));
    let location_ok = query
        .location
        .as_deref()
        .map_or(true, |l| contains_ci(&job.location, l.trim()));
    let job_type_ok = query.job_type.as_deref().map_or(true, |t| {
        job.job_type
            .as_deref()
            .is_some_and(|jt| jt.eq_ignore_ascii_case(t.trim()))
    });
    let open_ok = !query.open_only.unwrap_or(false) || job.is_open(today);

    search_ok && category_ok && location_ok && job_type_ok && open_ok
}

/// Orders `Some` values with `cmp` and pushes `None` to the end.
fn nones_last<T: Ord>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &JobPosting, b: &JobPosting, sort: JobSort) -> Ordering {
    let primary = match sort {
        JobSort::Newest => b.created_at.cmp(&a.created_at),
        JobSort::Oldest => a.created_at.cmp(&b.created_at),
        JobSort::SalaryHigh => nones_last(
            a.salary_max.or(a.salary_min),
            b.salary_max.or(b.salary_min),
            |x, y| y.cmp(x),
        ),
        JobSort::SalaryLow => nones_last(
            a.salary_min.or(a.salary_max),
            b.salary_min.or(b.salary_max),
            |x, y| x.cmp(y),
        ),
        JobSort::Deadline => nones_last(a.deadline, b.deadline, |x, y| x.cmp(y)),
    };
    primary.then_with(|| b.created_at.cmp(&a.created_at))
}

/// Filters, sorts and pages the job board listing.
pub fn paginate_jobs(jobs: Vec<JobPosting>, query: &JobListQuery, today: NaiveDate) -> JobPage {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let sort = query.sort.unwrap_or_default();

    let mut filtered: Vec<JobPosting> = jobs
        .into_iter()
        .filter(|job| matches(job, query, today))
        .collect();
    filtered.sort_by(|a, b| compare(a, b, sort));

    let total = filtered.len() as i64;
    let total_pages = (total + per_page - 1) / per_page;
    let offset = usize::try_from(page.saturating_sub(1).saturating_mul(per_page))
        .unwrap_or(usize::MAX);
    let items = filtered
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    JobPage {
        items,
        total,
        page,
        per_page,
        total_pages,
    }
}
