use serde::Serialize;
use serde_json::Value;

// Rows are written by the quiz subsystem; this service only reports them.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct UserAttempt {
    pub question_id: Value,  // as stored, integer or text
    pub attempts: Value,
    pub is_correct: bool,
}
