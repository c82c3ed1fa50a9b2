//! User accounts. Creating a user always creates its profile in the same
//! transaction, so no user ever exists without one.

use thiserror::Error;

use crate::{
    auth,
    db::Db,
    errors::ApiError,
    forms::{FormErrors, SignupForm},
    models::user::{Profile, User},
};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid account data")]
    Invalid(FormErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        AccountError::Api(e.into())
    }
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, date_joined";

pub async fn create_user(db: &Db, form: &SignupForm) -> Result<User, AccountError> {
    form.errors().into_result().map_err(AccountError::Invalid)?;

    let hash = auth::hash_password(&form.password1)?;
    let now = chrono::Utc::now();

    let mut tx = db.0.begin().await?;

    let res = sqlx::query(
        "INSERT INTO users(username, email, first_name, last_name, password_hash, date_joined) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&form.username)
    .bind(form.email.as_deref().unwrap_or_default())
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(&hash)
    .bind(now)
    .execute(&mut *tx)
    .await;

    let user_id = match res {
        Ok(r) => r.last_insert_rowid(),
        Err(e) => {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    let mut errors = FormErrors::default();
                    errors.add("username", "A user with that username already exists.");
                    return Err(AccountError::Invalid(errors));
                }
            }
            return Err(e.into());
        }
    };

    sqlx::query("INSERT INTO profiles(user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!("user created id={} username={}", user.id, user.username);
    Ok(user)
}

pub async fn delete_user(db: &Db, user_id: i64) -> Result<bool, ApiError> {
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&db.0)
        .await?;
    if res.rows_affected() > 0 {
        log::info!("user deleted id={user_id}");
    }
    Ok(res.rows_affected() > 0)
}

pub async fn find_by_username(db: &Db, username: &str) -> Result<Option<User>, ApiError> {
    Ok(
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(&db.0)
            .await?,
    )
}

pub async fn find_by_id(db: &Db, user_id: i64) -> Result<Option<User>, ApiError> {
    Ok(
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&db.0)
            .await?,
    )
}

/// The user matching both username and password, if any.
pub async fn authenticate(db: &Db, username: &str, password: &str) -> Result<Option<User>, ApiError> {
    let user = find_by_username(db, username).await?;
    Ok(user.filter(|u| auth::verify_password(&u.password_hash, password)))
}

pub async fn set_password(db: &Db, user_id: i64, password: &str) -> Result<(), ApiError> {
    let hash = auth::hash_password(password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(hash)
        .bind(user_id)
        .execute(&db.0)
        .await?;
    Ok(())
}

pub async fn profile(db: &Db, user_id: i64) -> Result<Option<Profile>, ApiError> {
    Ok(
        sqlx::query_as::<_, Profile>("SELECT id, user_id, avatar FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&db.0)
            .await?,
    )
}

pub async fn set_avatar(db: &Db, user_id: i64, avatar: &str) -> Result<(), ApiError> {
    sqlx::query("UPDATE profiles SET avatar = ? WHERE user_id = ?")
        .bind(avatar)
        .bind(user_id)
        .execute(&db.0)
        .await?;
    Ok(())
}
