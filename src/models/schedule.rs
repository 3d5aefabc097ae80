use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "meeting_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    Video,
    Phone,
    InPerson,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub stage_name: String,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub meeting_type: MeetingType,
    pub meeting_link: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub stage_name: String,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub meeting_type: MeetingType,
    pub meeting_link: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Past,
    Today,
    Soon,
    Upcoming,
}

pub const SOON_WINDOW_DAYS: i64 = 2;

pub fn classify(date: NaiveDate, today: NaiveDate) -> ScheduleStatus {
    let days_remaining = (date - today).num_days();
    if days_remaining < 0 {
        ScheduleStatus::Past
    } else if days_remaining == 0 {
        ScheduleStatus::Today
    } else if days_remaining <= SOON_WINDOW_DAYS {
        ScheduleStatus::Soon
    } else {
        ScheduleStatus::Upcoming
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub status: ScheduleStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub status: ScheduleStatus,
    pub items: Vec<ScheduleEntry>,
}

/// Sorts by date then start time and buckets schedules per calendar day.
pub fn group_by_day(mut schedules: Vec<Schedule>, today: NaiveDate) -> Vec<ScheduleDay> {
    schedules.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then(a.start_time.cmp(&b.start_time))
    });

    let mut days: Vec<ScheduleDay> = Vec::new();
    for schedule in schedules {
        let status = classify(schedule.scheduled_date, today);
        let entry = ScheduleEntry { schedule, status };
        match days.last_mut() {
            Some(day) if day.date == entry.schedule.scheduled_date => day.items.push(entry),
            _ => days.push(ScheduleDay {
                date: entry.schedule.scheduled_date,
                status,
                items: vec![entry],
            }),
        }
    }
    days
}
