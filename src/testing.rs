//! Fixtures for unit tests. Rows are inserted directly so tests do not pay for
//! password hashing; every seeded user still gets its profile.

use crate::db::Db;

pub async fn seed_user(db: &Db, username: &str) -> i64 {
    let id = sqlx::query(
        "INSERT INTO users(username, password_hash, date_joined) VALUES (?, 'x', ?)",
    )
    .bind(username)
    .bind(chrono::Utc::now())
    .execute(&db.0)
    .await
    .unwrap()
    .last_insert_rowid();
    sqlx::query("INSERT INTO profiles(user_id) VALUES (?)")
        .bind(id)
        .execute(&db.0)
        .await
        .unwrap();
    id
}

pub async fn seed_group(db: &Db, title: &str, slug: &str) -> i64 {
    sqlx::query("INSERT INTO post_groups(title, slug, description) VALUES (?, ?, 'description')")
        .bind(title)
        .bind(slug)
        .execute(&db.0)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn seed_post(db: &Db, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
    sqlx::query("INSERT INTO posts(text, pub_date, author_id, group_id) VALUES (?, ?, ?, ?)")
        .bind(text)
        .bind(chrono::Utc::now())
        .bind(author_id)
        .bind(group_id)
        .execute(&db.0)
        .await
        .unwrap()
        .last_insert_rowid()
}
