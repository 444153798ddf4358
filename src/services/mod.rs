mod sqlite_service;

pub use sqlite_service::{SqliteService, ProfileUpdate};
