use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

pub fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first, last).trim().to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub avatar: String,
}

/// What pages show about a user: never the email or password hash.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self { id: u.id, full_name: u.full_name(), username: u.username, avatar: None }
    }
}
