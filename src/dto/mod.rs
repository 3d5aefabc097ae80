pub mod job_dto;
pub mod pipeline_dto;
pub mod user_dto;
