pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::database::store::Store;
use crate::services::{
    application_service::ApplicationService, job_service::JobService,
    notification_service::NotificationService, progress_service::ProgressService,
    realtime_service::RealtimeHub, report_service::ReportService,
    schedule_service::ScheduleService, user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub realtime: RealtimeHub,
    pub jwt_secret: Arc<str>,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub progress_service: ProgressService,
    pub schedule_service: ScheduleService,
    pub notification_service: NotificationService,
    pub user_service: UserService,
    pub report_service: ReportService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str, role_cache_ttl: Duration) -> Self {
        let realtime = RealtimeHub::new();
        let notification_service = NotificationService::new(store.clone(), realtime.clone());

        let job_service = JobService::new(store.clone());
        let application_service =
            ApplicationService::new(store.clone(), notification_service.clone());
        let progress_service = ProgressService::new(store.clone(), notification_service.clone());
        let schedule_service = ScheduleService::new(store.clone());
        let user_service = UserService::new(store.clone(), role_cache_ttl);
        let report_service = ReportService::new(store.clone());

        Self {
            store,
            realtime,
            jwt_secret: Arc::from(jwt_secret),
            job_service,
            application_service,
            progress_service,
            schedule_service,
            notification_service,
            user_service,
            report_service,
        }
    }
}
