#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use serde_json::Value;
use tempfile::TempDir;

use yatube::{
    accounts, auth, cache::FeedCache, config::Config, db::Db, forms::SignupForm,
};

pub const BOUNDARY: &str = "yatube-test-boundary";

/// Everything an app instance needs, backed by an in-memory database and a
/// throwaway media directory.
pub struct Ctx {
    pub cfg: Config,
    pub db: Db,
    pub cache: FeedCache,
    _media: TempDir,
}

impl Ctx {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let cfg = Config {
            media_dir: media.path().to_string_lossy().into_owned(),
            jwt_secret: Some("integration-secret".into()),
            ..Config::default()
        };
        cfg.ensure_media_dirs().unwrap();
        let db = Db::connect_in_memory().await.unwrap();
        let cache = FeedCache::new(cfg.feed_cache_ttl());
        Self { cfg, db, cache, _media: media }
    }

    pub async fn user(&self, username: &str) -> i64 {
        let form = SignupForm {
            username: username.into(),
            password1: "correct-horse".into(),
            password2: "correct-horse".into(),
            ..SignupForm::default()
        };
        accounts::create_user(&self.db, &form).await.unwrap().id
    }

    pub fn session(&self, user_id: i64, username: &str) -> Cookie<'static> {
        let token = auth::create_session_token(user_id, username, &self.cfg).unwrap();
        Cookie::new(auth::SESSION_COOKIE, token)
    }

    pub async fn group(&self, title: &str, slug: &str) -> i64 {
        sqlx::query("INSERT INTO post_groups(title, slug, description) VALUES (?, ?, 'about')")
            .bind(title)
            .bind(slug)
            .execute(&self.db.0)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    pub async fn post(&self, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
        sqlx::query("INSERT INTO posts(text, pub_date, author_id, group_id) VALUES (?, ?, ?, ?)")
            .bind(text)
            .bind(chrono::Utc::now())
            .bind(author_id)
            .bind(group_id)
            .execute(&self.db.0)
            .await
            .unwrap()
            .last_insert_rowid()
    }
}

/// Builds the full application around a `Ctx`.
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.cfg.clone()))
                .app_data(actix_web::web::Data::new($ctx.db.clone()))
                .app_data(actix_web::web::Data::new($ctx.cache.clone()))
                .configure(yatube::routes::configure),
        )
        .await
    };
}

pub async fn json_body(resp: ServiceResponse) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap()
}

pub fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(w, h));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}
