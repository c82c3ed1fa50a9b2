use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::{
    accounts,
    auth::AuthUser,
    db::Db,
    errors::ApiError,
    feed::{self, FeedFilter},
    follows::{self, FollowOutcome},
    models::user::PublicUser,
    pagination::PageQuery,
    render::{redirect, Rendered},
};

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub async fn follow_index(
    db: web::Data<Db>,
    user: AuthUser,
    q: PageQuery,
) -> Result<HttpResponse, ApiError> {
    let page = feed::fetch_page(&db, FeedFilter::FollowedBy(user.user_id), q.page.as_deref()).await?;
    Ok(Rendered::new("posts/follow.html", json!({ "page_obj": page })).ok())
}

pub async fn profile_follow(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let author = accounts::find_by_username(&db, &username)
        .await?
        .ok_or(ApiError::NotFound)?;

    match follows::follow(&db, user.user_id, author.id).await? {
        FollowOutcome::Created => log::info!("{} follows {}", user.username, author.username),
        FollowOutcome::AlreadyFollowing => {}
        FollowOutcome::SelfFollowIgnored => log::debug!("self-follow by {} ignored", user.username),
    }
    Ok(redirect(&profile_url(&author.username)))
}

pub async fn profile_unfollow(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let author = accounts::find_by_username(&db, &username)
        .await?
        .ok_or(ApiError::NotFound)?;

    if follows::unfollow(&db, user.user_id, author.id).await? {
        log::info!("{} unfollowed {}", user.username, author.username);
    }
    Ok(Rendered::new("posts/unfollow.html", json!({ "author": PublicUser::from(author) })).ok())
}
