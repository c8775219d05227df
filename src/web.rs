//! Web serve mode: JSON API plus the static display page
//!
//! The page itself is plain static assets under `static/`; everything it
//! renders comes from the `/api` routes below.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::SkycastError;
use crate::config::SkycastConfig;
use crate::current::CurrentWeatherService;
use crate::models::CurrentReport;
use crate::models::open_meteo::GeocodingResult;

#[derive(Clone)]
struct AppState {
    service: Arc<CurrentWeatherService>,
}

/// Build the `/api` router
pub fn api_router(service: Arc<CurrentWeatherService>) -> Router {
    Router::new()
        .route("/current", get(get_current))
        .route("/search", get(get_search))
        .with_state(AppState { service })
}

#[derive(Deserialize)]
struct CurrentParams {
    location: Option<String>,
}

#[derive(Deserialize)]
struct SearchParams {
    name: String,
}

async fn get_current(
    State(state): State<AppState>,
    Query(params): Query<CurrentParams>,
) -> Result<Json<CurrentReport>, StatusCode> {
    // An empty query means "wherever the default points", same as the CLI
    let query = params
        .location
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    state
        .service
        .lookup(query)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Current-conditions lookup failed: {:#}", e);
            status_for(&e)
        })
}

async fn get_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<GeocodingResult>>, StatusCode> {
    state.service.search(&params.name).await.map(Json).map_err(|e| {
        tracing::error!("Geocoding search failed: {:#}", e);
        status_for(&e)
    })
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<SkycastError>() {
        Some(SkycastError::Validation { .. }) => StatusCode::BAD_REQUEST,
        Some(SkycastError::Api { .. }) => StatusCode::BAD_GATEWAY,
        _ if error.to_string().contains("Location not found") => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Run the web server until shutdown
pub async fn run(config: &SkycastConfig) -> Result<()> {
    let service = Arc::new(CurrentWeatherService::new(config)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router(service))
        .fallback_service(ServeDir::new("static"))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", config.server.port);

    #[cfg(feature = "tls")]
    if let (Some(cert), Some(key)) = (&config.server.cert_path, &config.server.key_path) {
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await?;
        tracing::info!(
            "Web server running at https://localhost:{}",
            config.server.port
        );
        axum_server::bind_rustls(addr.parse()?, tls)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation: anyhow::Error = SkycastError::validation("empty").into();
        assert_eq!(status_for(&validation), StatusCode::BAD_REQUEST);

        let api: anyhow::Error = SkycastError::api("boom").into();
        assert_eq!(status_for(&api), StatusCode::BAD_GATEWAY);

        let not_found = anyhow::anyhow!("Location not found: Nowhereville");
        assert_eq!(status_for(&not_found), StatusCode::NOT_FOUND);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(status_for(&other), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
