use actix_web::{HttpResponse, http::StatusCode, http::header, ResponseError};
use thiserror::Error;
use serde::Serialize;

use crate::render::Rendered;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Protected route hit without a session; `next` is the path to come back to.
    #[error("unauthenticated")]
    Unauthenticated { next: String },
    #[error("not found")]
    NotFound,
    #[error("internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ApiErrBody {
    error: String
}

pub fn login_url(next: &str) -> String {
    format!("/auth/login/?next={}", urlencoding::encode(next))
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated { .. } => StatusCode::FOUND,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Unauthenticated { next } => HttpResponse::Found()
                .append_header((header::LOCATION, login_url(next)))
                .finish(),
            ApiError::NotFound => Rendered::new("core/404.html", serde_json::json!({}))
                .respond(StatusCode::NOT_FOUND),
            ApiError::Internal => Rendered::new("core/500.html", serde_json::json!({}))
                .respond(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::BadRequest(_) => HttpResponse::build(self.status_code())
                .json(ApiErrBody { error: self.to_string() }),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        log::error!("db error: {e:?}");
        ApiError::Internal
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        log::error!("io error: {e:?}");
        ApiError::Internal
    }
}
