use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile fields the generation workflows read. Everything but `language` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub language: String,
    pub name: Option<String>,
    pub expertise: Option<String>,
    pub tone: Option<String>,
}
