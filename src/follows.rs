//! Follow edges between a user and an author.
//!
//! A pair is either following or not. Both transitions are idempotent: the
//! unique (user_id, author_id) index turns a repeated follow into a no-op and
//! deleting a missing edge simply affects zero rows.

use crate::{db::Db, errors::ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollowIgnored,
}

pub async fn follow(db: &Db, user_id: i64, author_id: i64) -> Result<FollowOutcome, ApiError> {
    if user_id == author_id {
        return Ok(FollowOutcome::SelfFollowIgnored);
    }
    let res = sqlx::query(
        "INSERT INTO follows(user_id, author_id) VALUES (?, ?)
         ON CONFLICT(user_id, author_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(&db.0)
    .await?;

    Ok(if res.rows_affected() == 0 {
        FollowOutcome::AlreadyFollowing
    } else {
        FollowOutcome::Created
    })
}

/// Returns whether an edge was actually removed.
pub async fn unfollow(db: &Db, user_id: i64, author_id: i64) -> Result<bool, ApiError> {
    let res = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(&db.0)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn is_following(db: &Db, user_id: i64, author_id: i64) -> Result<bool, ApiError> {
    let row = sqlx::query("SELECT 1 FROM follows WHERE user_id = ? AND author_id = ? LIMIT 1")
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&db.0)
        .await?;
    Ok(row.is_some())
}

pub async fn follower_count(db: &Db, author_id: i64) -> Result<i64, ApiError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(&db.0)
        .await?)
}

pub async fn following_count(db: &Db, user_id: i64) -> Result<i64, ApiError> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&db.0)
        .await?)
}
