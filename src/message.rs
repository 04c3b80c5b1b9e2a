// src/message.rs
use serde::{Deserialize, Serialize};

use crate::services::{
    report_data::{FilterOptions, ReportData, loose_text},
    report_history::StoredReport,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    #[serde(default)]
    pub report_data: ReportData,
    #[serde(default)]
    pub filter_options: FilterOptions,
    #[serde(default, deserialize_with = "loose_text")]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateReportResponse {
    pub id: String,
    pub url: String,
    pub pages: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub reports: Vec<StoredReport>,
    pub count: usize,
}
