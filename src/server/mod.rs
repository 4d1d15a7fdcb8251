//! HTTP surface: routes, shared state and the serve loop.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{ClassifyRequest, HealthResponse};

use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::classify::Classifier;
use crate::clip::ClipModel;
use crate::config::{Config, ServerConfig};
use crate::fetch::HttpImageSource;
use crate::sentence::SentenceModel;

/// Models and engines shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub sentence: Option<Arc<SentenceModel>>,
}

impl AppState {
    /// Load every model named by the configuration. Blocks while files are
    /// downloaded and sessions are built.
    pub fn load(config: &Config) -> Result<Self> {
        let clip = Arc::new(ClipModel::load(&config.models).context("Failed to load CLIP")?);
        let images = Arc::new(HttpImageSource::new(&config.fetch));
        let classifier = Classifier::new(clip, images, config.grouping_cutoff())?;

        let sentence = if config.models.sentence_enabled {
            let model = SentenceModel::load(&config.models)
                .context("Failed to load sentence encoder")?;
            Some(Arc::new(model))
        } else {
            None
        };

        Ok(Self {
            classifier: Arc::new(classifier),
            sentence,
        })
    }
}

/// Build the router. Credentialed cross-origin requests are accepted from
/// `allowed_origin` only.
pub fn router(state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|e| anyhow!("Invalid allowed origin {:?}: {}", allowed_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/group-threshold", post(handlers::group_threshold))
        .route("/classify-art-style", post(handlers::classify_art_style))
        .route("/classify-mood-theme", post(handlers::classify_mood_theme))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Serve until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid listen address")?;

    let app = router(state, &config.allowed_origin)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, origin = %config.allowed_origin, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}
