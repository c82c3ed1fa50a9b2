use crate::db::Db;
use actix_web::{HttpResponse, web};

pub async fn health_check(db: web::Data<Db>) -> HttpResponse {
    let database = sqlx::query("SELECT 1").execute(&db.0).await.is_ok();
    HttpResponse::Ok().json(serde_json::json!({
        "health": database,
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
    }))
}
