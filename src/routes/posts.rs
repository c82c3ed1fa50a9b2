use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, http::StatusCode, web};
use serde_json::json;

use crate::{
    accounts,
    auth::{AuthUser, Viewer},
    cache::FeedCache,
    config::Config,
    db::Db,
    errors::ApiError,
    feed::{self, FeedFilter},
    follows,
    forms::{check, form_context, CommentForm, FormErrors, PostForm},
    media::{self, MultipartForm},
    models::{
        comment::{Comment, CommentRow},
        group::{Group, GroupRef},
        post::Post,
        user::PublicUser,
    },
    pagination::PageQuery,
    render::{body_response, redirect, Rendered},
};

pub fn detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub async fn index(
    req: HttpRequest,
    db: web::Data<Db>,
    cache: web::Data<FeedCache>,
    q: PageQuery,
) -> Result<HttpResponse, ApiError> {
    let key = FeedCache::key(req.path(), req.query_string());
    let body = cache
        .get_or_render(&key, || async {
            let page = feed::fetch_page(&db, FeedFilter::All, q.page.as_deref()).await?;
            Ok(Rendered::new("posts/index.html", json!({ "page_obj": page })).body())
        })
        .await?;
    Ok(body_response(StatusCode::OK, body))
}

pub(crate) async fn find_group_by_slug(db: &Db, slug: &str) -> Result<Option<Group>, ApiError> {
    Ok(sqlx::query_as::<_, Group>(
        "SELECT id, title, slug, description, author_id FROM post_groups WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(&db.0)
    .await?)
}

pub async fn group_posts(
    db: web::Data<Db>,
    path: web::Path<String>,
    q: PageQuery,
) -> Result<HttpResponse, ApiError> {
    let slug = path.into_inner();
    let group = find_group_by_slug(&db, &slug).await?.ok_or(ApiError::NotFound)?;
    let page = feed::fetch_page(&db, FeedFilter::Group(group.id), q.page.as_deref()).await?;
    Ok(Rendered::new(
        "posts/group_list.html",
        json!({ "group": group, "page_obj": page }),
    )
    .ok())
}

pub async fn profile(
    db: web::Data<Db>,
    viewer: Viewer,
    path: web::Path<String>,
    q: PageQuery,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    let author = accounts::find_by_username(&db, &username)
        .await?
        .ok_or(ApiError::NotFound)?;

    let following = match viewer.user_id() {
        Some(viewer_id) => follows::is_following(&db, viewer_id, author.id).await?,
        None => false,
    };
    let page = feed::fetch_page(&db, FeedFilter::Author(author.id), q.page.as_deref()).await?;
    let followers = follows::follower_count(&db, author.id).await?;
    let following_count = follows::following_count(&db, author.id).await?;
    let avatar = accounts::profile(&db, author.id).await?.map(|p| p.avatar);

    let author_id = author.id;
    let mut public = PublicUser::from(author);
    public.avatar = avatar.as_deref().map(crate::models::post::media_url);

    Ok(Rendered::new(
        "posts/profile.html",
        json!({
            "author": public,
            "page_obj": page,
            "following": following,
            "is_self": viewer.user_id() == Some(author_id),
            "followers_count": followers,
            "following_count": following_count,
        }),
    )
    .ok())
}

async fn post_comments(db: &Db, post_id: i64) -> Result<Vec<Comment>, ApiError> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT c.id, c.post_id, c.text, c.created,
                u.id AS author_id, u.username AS author_username,
                u.first_name AS author_first_name, u.last_name AS author_last_name
         FROM comments c
         INNER JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?
         ORDER BY c.created ASC, c.id ASC",
    )
    .bind(post_id)
    .fetch_all(&db.0)
    .await?;
    Ok(rows.into_iter().map(Comment::from).collect())
}

pub async fn post_detail(
    db: web::Data<Db>,
    viewer: Viewer,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let post = feed::post_card(&db, post_id).await?.ok_or(ApiError::NotFound)?;
    let comments = post_comments(&db, post_id).await?;
    let author_posts_count = feed::count_posts(&db, FeedFilter::Author(post.author.id)).await?;
    let can_edit = viewer.user_id() == Some(post.author.id);

    Ok(Rendered::new(
        "posts/post_detail.html",
        json!({
            "post": post,
            "comments": comments,
            "form": form_context(&CommentForm::default(), &FormErrors::default()),
            "author_posts_count": author_posts_count,
            "can_edit": can_edit,
        }),
    )
    .ok())
}

async fn group_choices(db: &Db) -> Result<Vec<GroupRef>, ApiError> {
    Ok(
        sqlx::query_as::<_, GroupRef>("SELECT id, title, slug FROM post_groups ORDER BY title ASC")
            .fetch_all(&db.0)
            .await?,
    )
}

async fn find_post(db: &Db, post_id: i64) -> Result<Option<Post>, ApiError> {
    Ok(sqlx::query_as::<_, Post>(
        "SELECT id, text, pub_date, author_id, group_id, image FROM posts WHERE id = ?",
    )
    .bind(post_id)
    .fetch_optional(&db.0)
    .await?)
}

/// A post form bound to a submitted multipart body, with the image (if any)
/// already checked.
struct BoundPostForm<'a> {
    form: PostForm,
    image: Option<&'a [u8]>,
    clear_image: bool,
    errors: FormErrors,
}

async fn bind_post_form<'a>(db: &Db, body: &'a MultipartForm) -> Result<BoundPostForm<'a>, ApiError> {
    let text = body.field("text").unwrap_or("").trim().to_string();
    let mut form = PostForm { text, group: None };
    let mut errors = check(&form);

    match body.field("group").map(str::trim).filter(|g| !g.is_empty()) {
        None => {}
        Some(raw) => {
            let known = match raw.parse::<i64>() {
                Ok(id) => sqlx::query("SELECT 1 FROM post_groups WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&db.0)
                    .await?
                    .map(|_| id),
                Err(_) => None,
            };
            match known {
                Some(id) => form.group = Some(id),
                None => errors.add(
                    "group",
                    "Select a valid choice. That choice is not one of the available choices.",
                ),
            }
        }
    }

    let image = body.file("image");
    if let Some(data) = image {
        if let Err(e) = media::check_image(data) {
            errors.add("image", e.message());
        }
    }
    let clear_image = body.field("image-clear").is_some_and(|v| v == "on" || v == "true");

    Ok(BoundPostForm { form, image, clear_image, errors })
}

async fn render_post_form(
    db: &Db,
    form: &PostForm,
    errors: &FormErrors,
    edit_of: Option<&Post>,
) -> Result<HttpResponse, ApiError> {
    let groups = group_choices(db).await?;
    Ok(Rendered::new(
        "posts/create_post.html",
        json!({
            "form": form_context(form, errors),
            "groups": groups,
            "is_edit": edit_of.is_some(),
            "post_id": edit_of.map(|p| p.id),
            "image_url": edit_of.and_then(|p| p.image.as_deref()).map(crate::models::post::media_url),
        }),
    )
    .ok())
}

/// Stores the image, then the row. An image whose row fails to insert is
/// removed again.
async fn insert_post(
    cfg: &Config,
    db: &Db,
    author_id: i64,
    form: &PostForm,
    image: Option<&[u8]>,
) -> Result<i64, ApiError> {
    let image = match image {
        Some(data) => Some(media::store_post_image(cfg, data)?),
        None => None,
    };
    let res = sqlx::query(
        "INSERT INTO posts(text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&form.text)
    .bind(chrono::Utc::now())
    .bind(author_id)
    .bind(form.group)
    .bind(&image)
    .execute(&db.0)
    .await;

    match res {
        Ok(r) => Ok(r.last_insert_rowid()),
        Err(e) => {
            if let Some(stored) = &image {
                media::discard(cfg, stored);
            }
            Err(e.into())
        }
    }
}

pub async fn post_create_form(db: web::Data<Db>, _user: AuthUser) -> Result<HttpResponse, ApiError> {
    render_post_form(&db, &PostForm::default(), &FormErrors::default(), None).await
}

pub async fn post_create(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let body = media::read_multipart(&cfg, payload).await?;
    let bound = bind_post_form(&db, &body).await?;
    if !bound.errors.is_empty() {
        return render_post_form(&db, &bound.form, &bound.errors, None).await;
    }

    let post_id = insert_post(&cfg, &db, user.user_id, &bound.form, bound.image).await?;
    log::info!("post created id={} author={}", post_id, user.username);
    Ok(redirect(&detail_url(post_id)))
}

pub async fn post_edit_form(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let post = find_post(&db, post_id).await?.ok_or(ApiError::NotFound)?;
    if post.author_id != user.user_id {
        return Ok(redirect(&detail_url(post_id)));
    }
    let form = PostForm { text: post.text.clone(), group: post.group_id };
    render_post_form(&db, &form, &FormErrors::default(), Some(&post)).await
}

pub async fn post_edit(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let post = find_post(&db, post_id).await?.ok_or(ApiError::NotFound)?;
    if post.author_id != user.user_id {
        log::info!("edit of post {} by non-author {} ignored", post_id, user.username);
        return Ok(redirect(&detail_url(post_id)));
    }

    let body = media::read_multipart(&cfg, payload).await?;
    let bound = bind_post_form(&db, &body).await?;
    if !bound.errors.is_empty() {
        return render_post_form(&db, &bound.form, &bound.errors, Some(&post)).await;
    }

    let stored = match bound.image {
        Some(data) => Some(media::store_post_image(&cfg, data)?),
        None => None,
    };
    let image = match (&stored, bound.clear_image) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => None,
        (None, false) => post.image.clone(),
    };
    let res = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
        .bind(&bound.form.text)
        .bind(bound.form.group)
        .bind(&image)
        .bind(post_id)
        .execute(&db.0)
        .await;
    if let Err(e) = res {
        if let Some(path) = &stored {
            media::discard(&cfg, path);
        }
        return Err(e.into());
    }

    log::info!("post edited id={} author={}", post_id, user.username);
    Ok(redirect(&detail_url(post_id)))
}

pub async fn add_comment(
    db: web::Data<Db>,
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Form<CommentForm>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    find_post(&db, post_id).await?.ok_or(ApiError::NotFound)?;

    let form = body.into_inner().cleaned();
    if check(&form).is_empty() {
        sqlx::query("INSERT INTO comments(post_id, author_id, text, created) VALUES (?, ?, ?, ?)")
            .bind(post_id)
            .bind(user.user_id)
            .bind(&form.text)
            .bind(chrono::Utc::now())
            .execute(&db.0)
            .await?;
        log::info!("comment added post={} author={}", post_id, user.username);
    }
    Ok(redirect(&detail_url(post_id)))
}
