use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar day used for deadlines and schedule classification (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Accepts `HH:MM` as well as `HH:MM:SS`.
pub fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", raw, e)))
}
