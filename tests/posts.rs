#[macro_use]
mod common;

use actix_web::{http::header, http::StatusCode, test};
use common::{json_body, location, multipart, multipart_content_type, png_bytes, Ctx, Part};

async fn post_text(ctx: &Ctx, id: i64) -> String {
    sqlx::query_scalar("SELECT text FROM posts WHERE id = ?")
        .bind(id)
        .fetch_one(&ctx.db.0)
        .await
        .unwrap()
}

#[actix_web::test]
async fn protected_pages_redirect_to_login_with_next() {
    let ctx = Ctx::new().await;
    let app = init_app!(ctx);

    for (uri, next) in [
        ("/create/", "%2Fcreate%2F"),
        ("/follow/?page=2", "%2Ffollow%2F%3Fpage%3D2"),
        ("/create/group/", "%2Fcreate%2Fgroup%2F"),
    ] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), format!("/auth/login/?next={next}"));
    }
}

#[actix_web::test]
async fn create_post_with_image_redirects_to_detail() {
    let ctx = Ctx::new().await;
    let author = ctx.user("writer").await;
    let group = ctx.group("Cats", "cats").await;
    let app = init_app!(ctx);

    let group_id = group.to_string();
    let png = png_bytes(4, 4);
    let body = multipart(&[
        Part::Text("text", "a post with a picture"),
        Part::Text("group", &group_id),
        Part::File("image", "small.png", &png),
    ]);
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(ctx.session(author, "writer"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let (id, image, group_id): (i64, Option<String>, Option<i64>) =
        sqlx::query_as("SELECT id, image, group_id FROM posts")
            .fetch_one(&ctx.db.0)
            .await
            .unwrap();
    assert_eq!(location(&resp), format!("/posts/{id}/"));
    assert_eq!(group_id, Some(group));
    let image = image.unwrap();
    assert!(image.starts_with("posts/") && image.ends_with(".png"));

    let req = test::TestRequest::get().uri(&format!("/posts/{id}/")).to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["template"], "posts/post_detail.html");
    assert_eq!(body["context"]["post"]["image_url"], format!("/media/{image}"));
    assert_eq!(body["context"]["author_posts_count"], 1);

    let req = test::TestRequest::get().uri(&format!("/media/{image}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn invalid_post_form_is_rerendered_without_saving() {
    let ctx = Ctx::new().await;
    let author = ctx.user("writer").await;
    let app = init_app!(ctx);

    let body = multipart(&[
        Part::Text("text", "   "),
        Part::Text("group", "999"),
        Part::File("image", "fake.png", b"not an image at all"),
    ]);
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(ctx.session(author, "writer"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["template"], "posts/create_post.html");
    let errors = &body["context"]["form"]["errors"];
    assert!(errors.get("text").is_some());
    assert!(errors.get("group").is_some());
    assert!(errors.get("image").is_some());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&ctx.db.0)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn non_author_edit_redirects_and_leaves_post_unchanged() {
    let ctx = Ctx::new().await;
    let author = ctx.user("author").await;
    let intruder = ctx.user("intruder").await;
    let cats = ctx.group("Cats", "cats").await;
    let dogs = ctx.group("Dogs", "dogs").await;
    let id = ctx.post(author, "original", Some(cats)).await;
    let before: (String, Option<i64>, i64, String) =
        sqlx::query_as("SELECT text, group_id, author_id, pub_date FROM posts WHERE id = ?")
            .bind(id)
            .fetch_one(&ctx.db.0)
            .await
            .unwrap();
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{id}/edit/"))
        .cookie(ctx.session(intruder, "intruder"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{id}/"));

    let dogs_id = dogs.to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{id}/edit/"))
        .cookie(ctx.session(intruder, "intruder"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart(&[Part::Text("text", "defaced"), Part::Text("group", &dogs_id)]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{id}/"));

    let after: (String, Option<i64>, i64, String) =
        sqlx::query_as("SELECT text, group_id, author_id, pub_date FROM posts WHERE id = ?")
            .bind(id)
            .fetch_one(&ctx.db.0)
            .await
            .unwrap();
    assert_eq!(after, before);
    assert_eq!(after.1, Some(cats));
    assert_eq!(after.2, author);
    assert_eq!(post_text(&ctx, id).await, "original");
}

#[actix_web::test]
async fn author_edit_updates_post() {
    let ctx = Ctx::new().await;
    let author = ctx.user("author").await;
    let id = ctx.post(author, "draft", None).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{id}/edit/"))
        .cookie(ctx.session(author, "author"))
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert_eq!(body["context"]["is_edit"], true);
    assert_eq!(body["context"]["form"]["fields"]["text"], "draft");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{id}/edit/"))
        .cookie(ctx.session(author, "author"))
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart(&[Part::Text("text", "final"), Part::Text("group", "")]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(post_text(&ctx, id).await, "final");
}

#[actix_web::test]
async fn comments_are_added_by_logged_in_users_only() {
    let ctx = Ctx::new().await;
    let author = ctx.user("author").await;
    let reader = ctx.user("reader").await;
    let id = ctx.post(author, "discuss", None).await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{id}/comment/"))
        .set_form([("text", "anonymous")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/"));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{id}/comment/"))
        .cookie(ctx.session(reader, "reader"))
        .set_form([("text", "nice one")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{id}/"));

    let req = test::TestRequest::get().uri(&format!("/posts/{id}/")).to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    let comments = body["context"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "nice one");
    assert_eq!(comments[0]["author"]["username"], "reader");
    assert_eq!(body["context"]["post"]["comment_count"], 1);

    let req = test::TestRequest::post()
        .uri("/posts/424242/comment/")
        .cookie(ctx.session(reader, "reader"))
        .set_form([("text", "lost")])
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn group_create_validates_and_redirects() {
    let ctx = Ctx::new().await;
    let user = ctx.user("founder").await;
    ctx.group("Taken", "taken").await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/create/group/")
        .cookie(ctx.session(user, "founder"))
        .set_form([("title", "Rust"), ("slug", "rust-lang"), ("description", "crabs")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/group/rust-lang/");

    let req = test::TestRequest::post()
        .uri("/create/group/")
        .cookie(ctx.session(user, "founder"))
        .set_form([("title", "Other"), ("slug", "taken"), ("description", "dup")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["template"], "posts/create_group.html");
    assert!(body["context"]["form"]["errors"].get("slug").is_some());

    let req = test::TestRequest::post()
        .uri("/create/group/")
        .cookie(ctx.session(user, "founder"))
        .set_form([("title", "Bad"), ("slug", "not a slug!"), ("description", "x")])
        .to_request();
    let body = json_body(test::call_service(&app, req).await).await;
    assert!(body["context"]["form"]["errors"].get("slug").is_some());
}

#[actix_web::test]
async fn unknown_route_renders_not_found_page() {
    let ctx = Ctx::new().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/definitely/not/here/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = json_body(resp).await;
    assert_eq!(body["template"], "core/404.html");
    assert_eq!(body["context"]["path"], "/definitely/not/here/");
}
