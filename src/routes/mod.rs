// src/routes/mod.rs
pub mod relay;
pub mod report;

use crate::{config::AppConfig, state::SharedState};
use axum::{
    Router,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName},
    routing::{get, post},
};
use relay::proxy_pdf_handler;
use report::{generate_report_handler, history_handler};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(config: &AppConfig) -> Router<SharedState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/proxy-pdf", post(proxy_pdf_handler))
        .route("/api/reports", post(generate_report_handler))
        .route("/api/reports/history/{user}", get(history_handler))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/reports", ServeDir::new(&config.reports_dir))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
