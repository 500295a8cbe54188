use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use match_engine::config::Settings;
use match_engine::routes::{self, AppState};
use match_engine::services::{CacheManager, CachedExclusions, ExclusionResolver, PostgresClient};
use std::io;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting match engine...");

    let postgres = Arc::new(
        PostgresClient::from_settings(&settings.database)
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!(
        "PostgreSQL client initialized (max: {} connections)",
        settings.database.max_connections.unwrap_or(10)
    );

    let cache = Arc::new(
        CacheManager::from_settings(&settings.cache)
            .await
            .map_err(|e| startup_error("Failed to initialize cache", e))?,
    );

    info!("Cache manager initialized (L2 enabled: {})", cache.has_l2());

    let exclusions = Arc::new(CachedExclusions::new(postgres.clone(), cache));

    let app_state = AppState::new(postgres, exclusions.clone() as Arc<dyn ExclusionResolver>, &settings)
        .map_err(|e| startup_error("Invalid profile step configuration", e))?;

    // Cached exclusions follow every block written through the API
    exclusions.spawn_invalidation(app_state.blocks.subscribe());

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(routes::handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
