use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Serialize, Deserialize, FromRow, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Resolved through `User.email`, visible only to the user themself
    #[graphql(skip)]
    pub email: String,
    /// bcrypt digest
    #[serde(skip_serializing)]
    #[graphql(skip)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Fields required to create a user. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password_digest() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Jess".to_string(),
            email: "jess@example.com".to_string(),
            password: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            created_at: now,
            updated_at: now,
        };
        let printed = format!("{:?}", user);
        assert!(printed.contains("jess@example.com"));
        assert!(!printed.contains("$2b$04$"));
    }
}
