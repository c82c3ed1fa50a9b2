use crate::{
    accounts::{self, AccountError},
    auth::{self, AuthUser},
    config::Config,
    db::Db,
    errors::ApiError,
    forms::{check, form_context, FormErrors, LoginForm, PasswordChangeForm, SignupForm, NON_FIELD},
    render::{redirect, Rendered},
};
use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use serde_json::json;

pub const PASSWORD_CHANGE_DONE: &str = "/auth/password_change/done/";

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}

fn logged_in_redirect(cfg: &Config, user_id: i64, username: &str, to: &str) -> Result<HttpResponse, ApiError> {
    let token = auth::create_session_token(user_id, username, cfg)?;
    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, to))
        .cookie(auth::session_cookie(token, cfg))
        .finish())
}

fn render_signup(form: &SignupForm, errors: &FormErrors) -> HttpResponse {
    Rendered::new("users/signup.html", json!({ "form": form_context(form, errors) })).ok()
}

pub async fn signup_form() -> HttpResponse {
    render_signup(&SignupForm::default(), &FormErrors::default())
}

pub async fn signup(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    body: web::Form<SignupForm>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner().cleaned();
    match accounts::create_user(&db, &form).await {
        Ok(user) => logged_in_redirect(&cfg, user.id, &user.username, "/"),
        Err(AccountError::Invalid(errors)) => Ok(render_signup(&form, &errors)),
        Err(AccountError::Api(e)) => Err(e),
    }
}

fn render_login(form: &LoginForm, errors: &FormErrors, next: Option<&str>) -> HttpResponse {
    Rendered::new(
        "users/login.html",
        json!({ "form": form_context(form, errors), "next": next }),
    )
    .ok()
}

pub async fn login_form(q: web::Query<NextQuery>) -> HttpResponse {
    render_login(&LoginForm::default(), &FormErrors::default(), q.next.as_deref())
}

pub async fn login(
    cfg: web::Data<Config>,
    db: web::Data<Db>,
    q: web::Query<NextQuery>,
    body: web::Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();
    let mut errors = check(&form);
    if !errors.is_empty() {
        return Ok(render_login(&form, &errors, q.next.as_deref()));
    }

    match accounts::authenticate(&db, form.username.trim(), &form.password).await? {
        Some(user) => {
            log::info!("login username={}", user.username);
            logged_in_redirect(&cfg, user.id, &user.username, safe_next(q.next.as_deref()))
        }
        None => {
            errors.add(
                NON_FIELD,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            Ok(render_login(&form, &errors, q.next.as_deref()))
        }
    }
}

pub async fn logout() -> HttpResponse {
    let mut resp = Rendered::new("users/logged_out.html", json!({})).ok();
    // only fails on a malformed cookie, which this one is not
    let _ = resp.add_cookie(&auth::expired_session_cookie());
    resp
}

fn render_password_change(errors: &FormErrors) -> HttpResponse {
    Rendered::new(
        "users/password_change_form.html",
        json!({ "form": form_context(&PasswordChangeForm::default(), errors) }),
    )
    .ok()
}

pub async fn password_change_form(_user: AuthUser) -> HttpResponse {
    render_password_change(&FormErrors::default())
}

pub async fn password_change(
    db: web::Data<Db>,
    user: AuthUser,
    body: web::Form<PasswordChangeForm>,
) -> Result<HttpResponse, ApiError> {
    let form = body.into_inner();
    let mut errors = form.errors();

    let current = accounts::find_by_id(&db, user.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated { next: "/auth/password_change/".into() })?;
    if !auth::verify_password(&current.password_hash, &form.old_password) {
        errors.add(
            "old_password",
            "Your old password was entered incorrectly. Please enter it again.",
        );
    }
    if !errors.is_empty() {
        return Ok(render_password_change(&errors));
    }

    accounts::set_password(&db, user.user_id, &form.new_password1).await?;
    log::info!("password changed username={}", user.username);
    Ok(redirect(PASSWORD_CHANGE_DONE))
}

pub async fn password_change_done(_user: AuthUser) -> HttpResponse {
    Rendered::new("users/password_change_done.html", json!({})).ok()
}
