use crate::{
    accounts,
    auth::AuthUser,
    config::Config,
    db::Db,
    errors::ApiError,
    forms::FormErrors,
    media,
    models::{post::media_url, user::PublicUser},
    render::{redirect, Rendered},
};
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use serde_json::json;

pub const DEFAULT_AVATAR: &str = "default_avatar.png";

pub fn settings_url(username: &str) -> String {
    format!("/profile/{}/settings/", urlencoding::encode(username))
}

async fn render_settings(db: &Db, user: &AuthUser, errors: &FormErrors) -> Result<HttpResponse, ApiError> {
    let me = accounts::find_by_id(db, user.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let avatar = accounts::profile(db, user.user_id)
        .await?
        .map(|p| media_url(&p.avatar));

    let mut public = PublicUser::from(me);
    public.avatar = avatar;
    Ok(Rendered::new(
        "posts/profile_settings.html",
        json!({ "author": public, "form": { "errors": errors } }),
    )
    .ok())
}

pub async fn profile_settings_form(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if path.into_inner() != user.username {
        return Ok(redirect(&settings_url(&user.username)));
    }
    render_settings(&db, &user, &FormErrors::default()).await
}

pub async fn profile_settings(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    if path.into_inner() != user.username {
        return Ok(redirect(&settings_url(&user.username)));
    }

    let body = media::read_multipart(&cfg, payload).await?;
    let avatar = match body.file("avatar") {
        None => DEFAULT_AVATAR.to_string(),
        Some(data) => {
            if let Err(e) = media::check_image(data) {
                let mut errors = FormErrors::default();
                errors.add("avatar", e.message());
                return render_settings(&db, &user, &errors).await;
            }
            media::store_avatar(&cfg, data)?
        }
    };

    accounts::set_avatar(&db, user.user_id, &avatar).await?;
    log::info!("avatar updated username={} avatar={}", user.username, avatar);
    Ok(redirect(&settings_url(&user.username)))
}
