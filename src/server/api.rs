//! Quote HTTP API
//!
//! JSON endpoints over [`QuoteQueries`].

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;

use super::types::*;
use super::QuoteQueries;

const WELCOME: &str = "Welcome to the Currency Exchange API!

Go to /quotes to view all quotes
Go to /average to view average prices
Go to /slippage to view slippage data
";

/// Create the API router with all endpoints
pub fn create_router(queries: QuoteQueries) -> Router {
    // A wrong method on a known path is reported like an unknown route
    Router::new()
        .route("/", get(welcome).fallback(not_found))
        .route("/health", get(get_health).fallback(not_found))
        // Query endpoints
        .route("/quotes", get(get_quotes).fallback(not_found))
        .route("/average", get(get_average).fallback(not_found))
        .route("/slippage", get(get_slippage).fallback(not_found))
        .fallback(not_found)
        .with_state(queries)
        .layer(
            ServiceBuilder::new()
                // Request logging
                .layer(TraceLayer::new_for_http())
                // Open CORS for browser clients
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

fn internal_error(label: &'static str, err: impl std::fmt::Display) -> Response {
    error!(error = %err, "{}", label);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: label,
            message: err.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────

/// GET / - Endpoint listing
async fn welcome() -> &'static str {
    WELCOME
}

/// GET /health - Store reachability
async fn get_health(State(queries): State<QuoteQueries>) -> Response {
    match queries.health().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::healthy())).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::unhealthy(e)),
        )
            .into_response(),
    }
}

/// GET /quotes - Latest quote per source
async fn get_quotes(State(queries): State<QuoteQueries>) -> Response {
    match queries.get_quotes().await {
        Ok(quotes) if quotes.is_empty() => Json(EmptyQuotesResponse::default()).into_response(),
        Ok(quotes) => Json(quotes).into_response(),
        Err(e) => internal_error("Failed to fetch quotes", e),
    }
}

/// GET /average - Cross-source average
async fn get_average(State(queries): State<QuoteQueries>) -> Response {
    match queries.get_average().await {
        Ok(average) => Json(AverageResponse::from(average)).into_response(),
        Err(e) => internal_error("Failed to calculate average", e),
    }
}

/// GET /slippage - Per-source deviation from the average
async fn get_slippage(State(queries): State<QuoteQueries>) -> Response {
    match queries.get_slippage().await {
        Ok(slippages) if slippages.is_empty() => {
            Json(EmptySlippageResponse::default()).into_response()
        }
        Ok(slippages) => Json(slippages).into_response(),
        Err(e) => internal_error("Failed to calculate slippage", e),
    }
}

async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse::route(method.as_str(), uri.path())),
    )
        .into_response()
}
