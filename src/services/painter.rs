// src/services/painter.rs
use tracing::debug;

use super::format::{self, text_or_dash, wrap};
use super::layout::{
    chars_per_line, palette, Align, Chrome, Document, Font, PageBuilder, MARGIN, PAGE_HEIGHT, PAGE_WIDTH,
};
use super::report_data::{ReportData, ReportMeta, SectionFilter};
use super::sections;

pub const REPORT_TITLE: &str = "GOVERNMENT TENDER ANALYSIS";

/// Lays out the whole report: cover page first, then every included section in
/// fixed order. Pure and total; identical inputs give identical documents.
pub fn generate_document(report: &ReportData, filter: &SectionFilter) -> Document {
    let meta = &report.meta;
    let chrome = Chrome {
        title: REPORT_TITLE.to_string(),
        seller: text_or_dash(meta.seller_name.as_deref()),
        date: format::date(meta.generated_at.as_deref()),
    };
    let mut page = PageBuilder::new(chrome);
    draw_cover(&mut page, meta);

    for section in filter.iter() {
        sections::draw(section, &mut page, report);
    }

    let document = page.finish();
    debug!(pages = document.page_count(), "report document laid out");
    document
}

fn draw_cover(page: &mut PageBuilder, meta: &ReportMeta) {
    let center = PAGE_WIDTH / 2.0;
    page.cover_page();
    page.rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT, Some(palette::NAVY), None);

    page.text(center, 58.0, 24.0, Font::Bold, palette::WHITE, Align::Center, "GOVERNMENT");
    page.text(center, 72.0, 24.0, Font::Bold, palette::WHITE, Align::Center, "TENDER ANALYSIS");

    let band_x = MARGIN + 10.0;
    page.rect(band_x, 90.0, PAGE_WIDTH - 2.0 * band_x, 14.0, Some(palette::COVER_BAND), None);
    page.text(center, 99.0, 12.0, Font::Regular, palette::BLUE, Align::Center, "Comprehensive Performance Report");

    let box_width = PAGE_WIDTH - 60.0;
    page.rect((PAGE_WIDTH - box_width) / 2.0, 115.0, box_width, 20.0, Some(palette::COVER_BOX), Some(palette::BLUE));
    let seller = format::truncate(&text_or_dash(meta.seller_name.as_deref()), chars_per_line(box_width - 8.0, 18.0));
    page.text(center, 128.0, 18.0, Font::Bold, palette::BLUE, Align::Center, seller);

    let generated = format!("Report Generated: {}", format::date(meta.generated_at.as_deref()));
    let period = format!("Analysis Period: {} days", format::count(meta.days));
    let department = format!(
        "Department: {}",
        meta.department.as_deref().map(format::clean).unwrap_or_else(|| "All".to_string())
    );
    for (y, line) in [(150.0, generated), (158.0, period), (166.0, department)] {
        page.text(center, y, 10.0, Font::Regular, palette::WHITE, Align::Center, line);
    }

    page.text(center, 178.0, 9.0, Font::Bold, palette::WHITE, Align::Center, "Offered Items:");
    let items = text_or_dash(meta.offered_item.as_deref());
    for (i, line) in wrap(&items, chars_per_line(PAGE_WIDTH - 40.0, 9.0)).into_iter().take(3).enumerate() {
        page.text(center, 184.0 + i as f64 * 5.0, 9.0, Font::Regular, palette::WHITE, Align::Center, line);
    }
}
