use serde::Serialize;
use serde_json::Value;

/// Only this exact role string may delete other users.
pub const ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE: &str = "student";

/// Row of `GET /all-users`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserSummary {
    pub username: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub full_name: String,  // "" when NULL in the store
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub total_points: Value,  // NULL reported as 0
}
