use crate::config::Config;
use crate::errors::ApiError;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use futures_util::future::{Ready, ready};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub exp: usize,
}

pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string())
}

pub fn verify_password(hash: &str, plain: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub fn create_session_token(user_id: i64, username: &str, cfg: &Config) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(cfg.session_ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        exp,
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}

pub fn verify_session_token(token: &str, cfg: &Config) -> Option<AuthUser> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    let claims = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(cfg.jwt_secret_bytes()), &v)
        .ok()?
        .claims;
    let user_id = claims.sub.parse().ok()?;
    Some(AuthUser {
        user_id,
        username: claims.username,
    })
}

pub fn session_cookie(token: String, cfg: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(actix_web::cookie::time::Duration::hours(cfg.session_ttl_hours))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// The logged-in user behind a request. Handlers that take it require a
/// session; everyone else is sent to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

fn session_from_request(req: &HttpRequest) -> Option<AuthUser> {
    let cfg = req.app_data::<actix_web::web::Data<Config>>()?;
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string);
    let token = bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))?;
    verify_session_token(&token, cfg)
}

/// Path and query of the request, the place to return to after logging in.
pub fn full_path(req: &HttpRequest) -> String {
    match req.uri().query() {
        Some(q) if !q.is_empty() => format!("{}?{}", req.path(), q),
        _ => req.path().to_string(),
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(session_from_request(req).ok_or_else(|| ApiError::Unauthenticated {
            next: full_path(req),
        }))
    }
}

/// Whoever is looking at a public page, if anyone is logged in.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<AuthUser>);

impl Viewer {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

impl FromRequest for Viewer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Viewer(session_from_request(req))))
    }
}
