// src/routes/report.rs
use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    message::{GenerateReportRequest, GenerateReportResponse, HistoryResponse},
    services::{
        painter::generate_document,
        pdf_renderer::write_pdf_report,
        report_data::SectionFilter,
        report_history::StoredReport,
    },
    state::SharedState,
};

pub async fn generate_report_handler(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateReportRequest>,
) -> Result<Json<GenerateReportResponse>, AppError> {
    let filter = SectionFilter::from(&payload.filter_options);
    let document = generate_document(&payload.report_data, &filter);
    let pages = document.page_count();

    let id = Uuid::new_v4().to_string();
    let url = write_pdf_report(&state.config.reports_dir, &id, document).await?;

    let meta = &payload.report_data.meta;
    let user = [payload.user_email.as_deref(), meta.email.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|u| !u.is_empty());
    if let Some(user) = user {
        let record = StoredReport::new(id.clone(), user, meta, Some(format!("{id}.pdf")));
        state.history.save(record).await;
    }

    info!(%id, pages, "report generated");
    Ok(Json(GenerateReportResponse { id, url, pages }))
}

pub async fn history_handler(
    State(state): State<SharedState>,
    Path(user): Path<String>,
) -> Json<HistoryResponse> {
    let reports = state.history.list_by_user(&user).await;
    let count = reports.len();
    Json(HistoryResponse { reports, count })
}
