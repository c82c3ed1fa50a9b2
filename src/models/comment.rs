use serde::Serialize;
use chrono::{DateTime, Utc};

use super::user::full_name;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: CommentAuthor,
}

#[derive(Serialize, Debug, Clone)]
pub struct CommentAuthor {
    pub id: i64,
    pub username: String,
    pub full_name: String,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            text: r.text,
            created: r.created,
            author: CommentAuthor {
                id: r.author_id,
                full_name: full_name(&r.author_first_name, &r.author_last_name),
                username: r.author_username,
            },
        }
    }
}
