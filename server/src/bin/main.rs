use actix_web::{middleware::Logger, web, App, HttpServer};
use pong_server::{config::settings, http, matchmaking, metrics, ws};
use redis::Client as RedisClient;
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let cfg = settings();
    if cfg.database_url.is_empty() {
        panic!("DATABASE_URL must be set");
    }
    if cfg.jwt_secret.is_none() {
        log::warn!("JWT_SECRET is not set; authenticated routes will reject every request");
    }

    // Postgres pool
    let db_pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(&cfg.database_url)
        .await
        .expect("Failed to create Postgres pool");

    if cfg.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .expect("Failed to run migrations");
    }

    // Redis client
    let redis_client = RedisClient::open(cfg.redis_url.as_str()).expect("Invalid REDIS_URL");

    // Start the background matchmaking loop
    matchmaking::start(db_pool.clone(), redis_client.clone());

    log::info!("42Pong server listening on {}", cfg.server_addr);

    // Start HTTP + WS server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(web::Data::new(redis_client.clone()))
            .configure(http::routes::init_routes)
            .configure(ws::routes::init_routes)
    })
    .bind(&cfg.server_addr)?
    .run()
    .await
}
