// src/services/mod.rs
pub mod format;
pub mod layout;
pub mod painter;
pub mod pdf_renderer;
pub mod relay;
pub mod report_data;
pub mod report_history;
pub mod sections;
