pub mod job;
pub mod notification;
pub mod progress;
pub mod report;
pub mod schedule;
pub mod stage;
pub mod user;
