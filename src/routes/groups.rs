use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::{
    auth::AuthUser,
    db::Db,
    errors::ApiError,
    forms::{check, form_context, FormErrors, GroupForm, NON_FIELD},
    render::{redirect, Rendered},
};

fn render_group_form(form: &GroupForm, errors: &FormErrors) -> HttpResponse {
    Rendered::new("posts/create_group.html", json!({ "form": form_context(form, errors) })).ok()
}

pub async fn group_create_form(_user: AuthUser) -> HttpResponse {
    render_group_form(&GroupForm::default(), &FormErrors::default())
}

async fn taken(db: &Db, column: &str, value: &str) -> Result<bool, ApiError> {
    let sql = format!("SELECT 1 FROM post_groups WHERE {column} = ? LIMIT 1");
    Ok(sqlx::query(&sql).bind(value).fetch_optional(&db.0).await?.is_some())
}

pub async fn group_create(
    db: web::Data<Db>,
    user: AuthUser,
    body: web::Form<GroupForm>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner().cleaned();
    let mut errors = check(&form);
    if !errors.has("title") && taken(&db, "title", &form.title).await? {
        errors.add("title", "Group with this title already exists.");
    }
    if !errors.has("slug") && taken(&db, "slug", &form.slug).await? {
        errors.add("slug", "Group with this slug already exists.");
    }
    if !errors.is_empty() {
        return Ok(render_group_form(&form, &errors));
    }

    let res = sqlx::query(
        "INSERT INTO post_groups(title, slug, description, author_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&form.title)
    .bind(&form.slug)
    .bind(&form.description)
    .bind(user.user_id)
    .execute(&db.0)
    .await;

    if let Err(e) = res {
        // lost a race with a concurrent create of the same title or slug
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            errors.add(NON_FIELD, "Group with this title or slug already exists.");
            return Ok(render_group_form(&form, &errors));
        }
        return Err(e.into());
    }

    log::info!("group created slug={} author={}", form.slug, user.username);
    Ok(redirect(&format!("/group/{}/", form.slug)))
}
