mod auth;
mod users;
mod scores;

#[cfg(test)]
pub mod test_support;

pub use auth::{handle_register, handle_login, handle_change_password};
pub use users::{list_all_users, get_user_role, get_user_profile, update_profile, debug_users, delete_user};
pub use scores::{get_user_points, get_user_attempts, leaderboard};
