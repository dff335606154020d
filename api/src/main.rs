//! Taleteller API Server
//!
//! Manages illustrated stories: a story is a sequence of scenes, each scene gets
//! a set of generated candidate images, and the customer picks one per scene.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Json, Router,
};
use sea_orm::Database;
use serde::Serialize;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{HttpImageGenerator, PostgresSceneRepository, PostgresStoryRepository};
use app::StoryService;
use config::Config;
use domain::ports::{ImageGenerator, SceneRepository, StoryRepository};

/// Story service over trait objects, so the router does not depend on the
/// concrete adapters
pub type DynStoryService =
    StoryService<dyn StoryRepository, dyn SceneRepository, dyn ImageGenerator>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub story_service: Arc<DynStoryService>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Routes that call the image backend
pub fn generation_routes() -> Router<AppState> {
    Router::new()
        .route("/stories/:story_id/scenes", post(handlers::create_scene))
        .route(
            "/stories/:story_id/scenes/:scene_id/generate",
            post(handlers::retry_scene_generation),
        )
}

/// Full API; `generation` is merged in so callers can layer it separately
pub fn router(generation: Router<AppState>) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/stories",
            get(handlers::list_stories).post(handlers::create_story),
        )
        .route("/stories/:story_id", get(handlers::get_story))
        .route(
            "/stories/:story_id/complete",
            post(handlers::complete_story),
        )
        .route("/stories/:story_id/scenes", get(handlers::list_scenes))
        .route(
            "/stories/:story_id/scenes/:scene_id",
            get(handlers::get_scene).put(handlers::update_scene),
        )
        .merge(generation)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,taleteller_api=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(environment = %config.environment, "Starting Taleteller API...");

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Create adapters
    let story_repo: Arc<dyn StoryRepository> = Arc::new(PostgresStoryRepository::new(db.clone()));
    let scene_repo: Arc<dyn SceneRepository> = Arc::new(PostgresSceneRepository::new(db));
    let image_generator: Arc<dyn ImageGenerator> = Arc::new(HttpImageGenerator::new(
        config.image_generator_url.clone(),
        config.image_generator_token.clone(),
    ));

    // Create application services
    let story_service = Arc::new(StoryService::new(
        story_repo,
        scene_repo,
        image_generator,
        &config.generation,
    ));

    let state = AppState { story_service };

    // Rate limiting on the routes that reach the image backend
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(config.rate_limit.per_second)
            .burst_size(config.rate_limit.burst_size)
            .finish()
            .context("Invalid rate limit settings")?,
    );

    let rate_limited_routes = generation_routes().layer(GovernorLayer {
        config: governor_config,
    });

    // Build router
    let app = router(rate_limited_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
