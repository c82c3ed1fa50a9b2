use crate::{config::Config, errors::ApiError, media};
use actix_web::{HttpRequest, HttpResponse, web};

// Route pattern: .route("/media/{path:.*}", web::get().to(get_media))
pub async fn get_media(
    cfg: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let rel = path.into_inner();
    let p = media::resolve(&cfg, &rel).ok_or(ApiError::NotFound)?;
    if !p.is_file() {
        return Err(ApiError::NotFound);
    }

    let named = actix_files::NamedFile::open_async(p)
        .await
        .map_err(|_| ApiError::NotFound)?
        .use_last_modified(true)
        .prefer_utf8(true);
    Ok(named.into_response(&req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn serves_stored_file_and_refuses_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("posts")).unwrap();
        std::fs::write(dir.path().join("posts/a.txt"), b"hello").unwrap();
        let cfg = Config {
            media_dir: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        };

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(cfg))
                .route("/media/{path:.*}", web::get().to(get_media)),
        )
        .await;

        let req = test::TestRequest::get().uri("/media/posts/a.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "hello");

        let req = test::TestRequest::get().uri("/media/posts/missing.txt").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/media/posts/../../etc/passwd").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
