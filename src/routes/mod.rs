pub mod about;
pub mod auth;
pub mod files;
pub mod follows;
pub mod groups;
pub mod health;
pub mod posts;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, http::StatusCode, web};
use serde_json::json;

use crate::render::Rendered;

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    Rendered::new("core/404.html", json!({ "path": req.path() })).respond(StatusCode::NOT_FOUND)
}

/// Every page of the site. `/create/group/` is registered ahead of `/create/`
/// so the two never shadow each other.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/follow/", web::get().to(follows::follow_index))
        .route("/create/group/", web::get().to(groups::group_create_form))
        .route("/create/group/", web::post().to(groups::group_create))
        .route("/create/", web::get().to(posts::post_create_form))
        .route("/create/", web::post().to(posts::post_create))
        .service(
            web::scope("/posts/{post_id}")
                .route("/", web::get().to(posts::post_detail))
                .route("/edit/", web::get().to(posts::post_edit_form))
                .route("/edit/", web::post().to(posts::post_edit))
                .route("/comment/", web::post().to(posts::add_comment)),
        )
        .service(
            web::scope("/profile/{username}")
                .route("/", web::get().to(posts::profile))
                .route("/follow/", web::get().to(follows::profile_follow))
                .route("/unfollow/", web::get().to(follows::profile_unfollow))
                .route("/settings/", web::get().to(users::profile_settings_form))
                .route("/settings/", web::post().to(users::profile_settings)),
        )
        .service(
            web::scope("/auth")
                .route("/signup/", web::get().to(auth::signup_form))
                .route("/signup/", web::post().to(auth::signup))
                .route("/login/", web::get().to(auth::login_form))
                .route("/login/", web::post().to(auth::login))
                .route("/logout/", web::get().to(auth::logout))
                .route("/password_change/", web::get().to(auth::password_change_form))
                .route("/password_change/", web::post().to(auth::password_change))
                .route("/password_change/done/", web::get().to(auth::password_change_done)),
        )
        .service(
            web::scope("/about")
                .route("/author/", web::get().to(about::author))
                .route("/tech/", web::get().to(about::tech)),
        )
        .route("/media/{path:.*}", web::get().to(files::get_media))
        .route("/health", web::get().to(health::health_check))
        .default_service(web::to(not_found));
}
