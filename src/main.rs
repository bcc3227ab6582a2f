mod models;
mod service;
mod config;
mod dtos;
mod error;
mod db;
mod utils;
mod middleware;
mod handler;
mod routes;

use std::sync::Arc;

use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use config::Config;
use db::{db::DBClient, memory::MemoryStore, Store};
use dotenv::dotenv;
use routes::create_router;
use service::{
    chat_service::ChatService,
    clock::{Clock, SystemClock},
    job_service::JobService,
    rating::RatingAggregator,
    side_effects::SideEffectPublisher,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub job_service: Arc<JobService>,
    pub chat_service: Arc<ChatService>,
    pub side_effects: SideEffectPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, side_effects: SideEffectPublisher, env: Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let job_service = JobService::new(
            store.clone(),
            RatingAggregator::new(store.clone()),
            side_effects.clone(),
            clock.clone(),
            env.default_rate_per_hour.clone(),
        );
        let chat_service = ChatService::new(store, clock);

        AppState {
            env,
            job_service: Arc::new(job_service),
            chat_service: Arc::new(chat_service),
            side_effects,
        }
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if let Some(database_url) = &config.database_url {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(database_url)
            .await?;
        tracing::info!("Connection to the database is successful");
        return Ok(Arc::new(DBClient::new(pool)) as Arc<dyn Store>);
    }

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &config.seed_file {
        let loaded = store.load_seed_file(path).await?;
        tracing::info!("Seeded in-memory store with {} records from {}", loaded, path);
    }
    tracing::warn!("DATABASE_URL not set, using the in-memory store");
    Ok(store as Arc<dyn Store>)
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let level = std::env::var("RUST_LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::DEBUG);

    tracing_subscriber::fmt()
    .with_max_level(level)
    .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Invalid configuration: {:?}", err);
            std::process::exit(1);
        }
    };

    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("Failed to initialise storage: {:?}", err);
            std::process::exit(1);
        }
    };

    let (side_effects, worker) = SideEffectPublisher::new(store.clone());
    let worker_handle = tokio::spawn(worker.run());

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST]);

    let app_state = Arc::new(AppState::new(store, side_effects, config.clone()));
    let app = create_router(app_state.clone()).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {:?}", err);
    }

    // Drain queued availability/counter updates before exiting.
    app_state.side_effects.flush().await;
    worker_handle.abort();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", err);
    }
    tracing::info!("Shutting down");
}
