use serde::Serialize;
use chrono::{DateTime, Utc};

use super::group::GroupRef;
use super::user::{PublicUser, full_name};

/// Bare `posts` row, used where only ownership and editable fields matter.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// A post joined with its author, profile and group, flattened the way the
/// feed queries select it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_avatar: Option<String>,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub comment_count: i64,
}

#[derive(Serialize, Debug, Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image_url: Option<String>,
    pub author: PublicUser,
    pub group: Option<GroupRef>,
    pub comment_count: i64,
}

pub fn media_url(path: &str) -> String {
    format!("/media/{}", path)
}

impl From<PostRow> for PostCard {
    fn from(r: PostRow) -> Self {
        let group = match (r.group_id, r.group_title, r.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
            _ => None,
        };
        Self {
            id: r.id,
            text: r.text,
            pub_date: r.pub_date,
            image_url: r.image.as_deref().filter(|s| !s.is_empty()).map(media_url),
            author: PublicUser {
                id: r.author_id,
                full_name: full_name(&r.author_first_name, &r.author_last_name),
                username: r.author_username,
                avatar: r.author_avatar.as_deref().map(media_url),
            },
            group,
            comment_count: r.comment_count,
        }
    }
}
