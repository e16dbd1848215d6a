use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod enhance;
mod error;
mod state;

use crate::enhance::manager::EngineManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "image_enhancer=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(config::AppConfig::from_env()?);

    let auth_state = state::AuthState::init(config.clone()).await?;
    sqlx::migrate!("./migrations").run(&auth_state.db).await?;

    let engines = Arc::new(EngineManager::new(
        config.weights_dir.clone(),
        enhance::engine::Device::detect(config.device_override.as_deref()),
    ));
    // Preload the default model; an offline start degrades to model_loaded=false
    // instead of aborting.
    if let Err(e) = engines.select(&config.default_model).await {
        tracing::warn!(error = %e, model = %config.default_model, "default model not loaded at startup; continuing");
    }
    let enhance_state = state::EnhanceState { engines };

    let auth_app = with_layers(auth::router().with_state(auth_state));
    let enhance_app = with_layers(enhance::router().with_state(enhance_state));

    tokio::try_join!(
        serve(auth_app, config.auth_port),
        serve(enhance_app, config.enhance_port),
    )?;

    Ok(())
}

fn with_layers(app: Router) -> Router {
    app.layer(CorsLayer::permissive()).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri)
            })
            .on_response(
                |res: &axum::http::Response<_>,
                 _latency: std::time::Duration,
                 span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    if status.is_server_error() {
                        tracing::error!(%status, "response");
                    } else {
                        tracing::info!(%status, "response");
                    }
                },
            ),
    )
}

async fn serve(app: Router, port: u16) -> anyhow::Result<()> {
    let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
