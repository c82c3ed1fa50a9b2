use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use env_logger::Env;
use yatube::{cache::FeedCache, config::Config, db::Db, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Init logger to show info by default, but can be overridden by RUST_LOG
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = Config::from_env_config()?;

    let db = Db::connect_and_migrate(&cfg.database_path).await?;
    let cache = FeedCache::new(cfg.feed_cache_ttl());
    log::info!("Starting server at {}", cfg.listen);

    let listen_addr = cfg.listen.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(Data::new(cfg.clone()))
            .app_data(Data::new(db.clone()))
            .app_data(Data::new(cache.clone()))
            .configure(routes::configure)
    })
    .bind(listen_addr)?
    .run()
    .await?;
    Ok(())
}
