//! Kisan Server Library
//!
//! Provides the HTTP API over the advisory service.

pub mod error;
pub mod routes;
pub mod state;

use axum::{
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Once;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::ApiError;
pub use state::AppState;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber (only once)
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| {
                    "kisan_server=debug,kisan_core=info,tower_http=debug".into()
                }),
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

/// Build the Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_html))
        .route("/api/health", get(health_check))
        // Advisory routes
        .route("/api/advice", post(routes::advise))
        .route("/api/specialists/:name", post(routes::run_specialist))
        // Data routes
        .route("/api/market", get(routes::market_quote))
        .route("/api/users/:id/history", get(routes::farmer_history))
        // LLM routes
        .route("/api/providers", get(routes::list_providers))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the Kisan web server on the specified port
pub async fn run_server(port: u16) -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Kisan Server...");

    let cwd = std::env::current_dir()?;
    let config = match kisan_core::config::load_config(&cwd) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "using default configuration");
            Default::default()
        }
    };

    let state = AppState::from_config(config)?;
    tracing::info!(
        provider = %state.service.active_provider_id(),
        mode = state.service.config().advisory.mode.as_str(),
        "advisory service ready"
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": kisan_core::version()
    }))
}

async fn index_html() -> impl IntoResponse {
    Html(
        r#"
<!DOCTYPE html>
<html>
<head>
    <title>Kisan</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f1e8;
            color: #1f2d1b;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
        }
        .container {
            text-align: center;
            padding: 2rem;
        }
        h1 { color: #2f6b2f; }
        .status { color: #3f8f3f; }
        .endpoints {
            margin-top: 2rem;
            text-align: left;
            background: #e6e0cc;
            padding: 1rem 2rem;
            border-radius: 8px;
        }
        code {
            background: #d6cfb4;
            padding: 0.2rem 0.5rem;
            border-radius: 4px;
        }
        a { color: #2f6b2f; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Kisan Advisory Server</h1>
        <p class="status">Server is running</p>
        <div class="endpoints">
            <h3>API Endpoints:</h3>
            <ul>
                <li><code>GET /api/health</code> - Health check</li>
                <li><code>POST /api/advice</code> - Ask a farming question</li>
                <li><code>POST /api/specialists/:name</code> - Run one specialist</li>
                <li><code>GET /api/market?crop=...&amp;region=...</code> - Market quote</li>
                <li><code>GET /api/users/:id/history</code> - Soil reports and scans</li>
                <li><code>GET /api/providers</code> - LLM providers</li>
            </ul>
        </div>
        <p style="margin-top: 2rem;">
            <a href="/api/health">Check API Health</a>
        </p>
    </div>
</body>
</html>
    "#,
    )
}
