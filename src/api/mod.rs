//! HTTP surface over the [`AnalysisService`].
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET  | `/`               | [`routes::root`] |
//! | GET  | `/status`         | [`routes::status`] |
//! | GET  | `/questions`      | [`routes::questions`] |
//! | POST | `/analyze/single` | [`routes::analyze_single`] |
//! | POST | `/analyze/batch`  | [`routes::analyze_batch`] |
//! | GET  | `/health`         | [`routes::health`] |

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::pipeline::llm::ModelClient;
use crate::service::AnalysisService;

pub use error::{AppError, AppResult};

/// Build the router with CORS restricted to `allowed_origins`.
pub fn router<M: ModelClient + 'static>(
    service: Arc<AnalysisService<M>>,
    allowed_origins: &[String],
) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/status", get(routes::status::<M>))
        .route("/questions", get(routes::questions::<M>))
        .route("/analyze/single", post(routes::analyze_single::<M>))
        .route("/analyze/batch", post(routes::analyze_batch::<M>))
        .route("/health", get(routes::health))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// CORS policy from the configured origin list.
///
/// `"*"` anywhere in the list allows any origin without credentials; browsers
/// reject credentialed wildcard responses. An explicit list allows
/// credentials. Entries that are not valid header values are skipped.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true)
}

/// Bind `addr` and serve `app` until Ctrl+C.
pub async fn serve(addr: &str, app: Router) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await.map_err(|source| AppError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    match listener.local_addr() {
        Ok(local) => info!("Compliance API listening on http://{}", local),
        Err(_) => info!("Compliance API listening on {}", addr),
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
