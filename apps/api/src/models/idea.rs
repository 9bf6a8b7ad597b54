use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One generated content seed.
///
/// `topic_name` is captured at generation time so a later topic rename does not
/// rewrite historical ideas. `used` only ever goes from false to true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub user_id: Uuid,
    pub topic_id: Uuid,
    pub topic_name: String,
    pub content: String,
    pub used: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Idea {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn idea(expires_at: Option<DateTime<Utc>>) -> Idea {
        Idea {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            topic_id: Uuid::new_v4(),
            topic_name: "Rust".to_string(),
            content: "Ownership explained with coffee mugs".to_string(),
            used: false,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_idea_without_expiration_never_expires() {
        assert!(!idea(None).is_expired(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_idea_expires_at_its_timestamp() {
        let now = Utc::now();
        assert!(idea(Some(now)).is_expired(now));
        assert!(idea(Some(now - Duration::seconds(1))).is_expired(now));
        assert!(!idea(Some(now + Duration::hours(1))).is_expired(now));
    }
}
