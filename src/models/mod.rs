mod user;
mod forms;
mod attempt;

pub use user::{UserSummary, UserProfile, LeaderboardEntry, ADMIN_ROLE, DEFAULT_ROLE};
pub use forms::{RegisterForm, LoginForm, UpdateProfileForm, ChangePasswordForm, DeleteUserForm};
pub use attempt::UserAttempt;
