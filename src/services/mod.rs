pub mod application_service;
pub mod job_service;
pub mod notification_service;
pub mod progress_service;
pub mod realtime_service;
pub mod report_service;
pub mod schedule_service;
pub mod user_service;
