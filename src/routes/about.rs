use crate::render::Rendered;
use actix_web::HttpResponse;
use serde_json::json;

pub async fn author() -> HttpResponse {
    Rendered::new("about/author.html", json!({})).ok()
}

pub async fn tech() -> HttpResponse {
    Rendered::new(
        "about/tech.html",
        json!({
            "stack": ["actix-web", "sqlx", "SQLite", "moka"],
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
    .ok()
}
