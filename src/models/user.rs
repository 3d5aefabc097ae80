use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Recruiter,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    BrowseJobs,
    ApplyToJobs,
    PostJobs,
    ManageApplicants,
    ViewSchedules,
    ViewReports,
}

const USER_CAPABILITIES: &[Capability] = &[
    Capability::BrowseJobs,
    Capability::ApplyToJobs,
    Capability::ViewSchedules,
];

const RECRUITER_CAPABILITIES: &[Capability] = &[
    Capability::BrowseJobs,
    Capability::PostJobs,
    Capability::ManageApplicants,
    Capability::ViewSchedules,
];

const ADMIN_CAPABILITIES: &[Capability] = &[Capability::BrowseJobs, Capability::ViewReports];

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::User => USER_CAPABILITIES,
            Role::Recruiter => RECRUITER_CAPABILITIES,
            Role::Admin => ADMIN_CAPABILITIES,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Recruiter => "recruiter",
            Role::Admin => "admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_table() {
        assert!(Role::User.can(Capability::ApplyToJobs));
        assert!(!Role::User.can(Capability::PostJobs));
        assert!(Role::Recruiter.can(Capability::ManageApplicants));
        assert!(!Role::Recruiter.can(Capability::ApplyToJobs));
        assert!(Role::Admin.can(Capability::ViewReports));
        assert!(!Role::Admin.can(Capability::ViewSchedules));
    }
}
