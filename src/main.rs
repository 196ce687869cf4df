use axum::Router;
use std::sync::Arc;
use steproute::config::Config;
use steproute::services::mapbox::{AuthMode, MapboxClient};
use steproute::services::oracle::RoutingOracle;
use steproute::services::route_matcher::RouteMatcher;
use steproute::services::session::SessionStore;
use steproute::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steproute=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting StepRoute API server");
    tracing::info!(
        tolerance = config.matcher.distance_tolerance,
        bearing_counts = ?config.matcher.bearing_counts,
        fanout = config.matcher.oracle_fanout,
        max_attempts = config.selection.max_attempts,
        "Configuration loaded successfully"
    );

    // Routing oracle: direct Mapbox, or a bearer-authenticated proxy
    let oracle: Arc<dyn RoutingOracle> = if let Some(ref base_url) = config.mapbox_base_url {
        tracing::info!("Using directions proxy at {}", base_url);
        Arc::new(MapboxClient::with_config(
            config.mapbox_api_key.clone(),
            base_url.clone(),
            AuthMode::BearerHeader,
        ))
    } else {
        Arc::new(MapboxClient::new(config.mapbox_api_key.clone()))
    };

    // Create application state
    let state = Arc::new(AppState {
        matcher: RouteMatcher::new(oracle, config.matcher.clone()),
        sessions: SessionStore::new(config.session_ttl_seconds, config.session_max_entries),
        selection: config.selection,
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", steproute::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
