// src/services/layout.rs
//
// Backend-neutral page model plus the builder that owns the vertical cursor.
// Coordinates are millimetres from the top-left corner of an A4 page; the PDF
// renderer flips them.
use super::format::{self, wrap};

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 14.0;
pub const HEADER_HEIGHT: f64 = 18.0;
pub const FOOTER_HEIGHT: f64 = 12.0;
pub const CONTENT_TOP: f64 = HEADER_HEIGHT + 6.0;
pub const CONTENT_BOTTOM: f64 = PAGE_HEIGHT - FOOTER_HEIGHT - 8.0;
pub const PRINTABLE_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;

const PT_TO_MM: f64 = 0.3528;
const AVG_GLYPH_EM: f64 = 0.5;

const HEADING_HEIGHT: f64 = 10.0;
const TABLE_HEADER_HEIGHT: f64 = 8.0;
const TABLE_ROW_HEIGHT: f64 = 8.0;
const CELL_PADDING: f64 = 1.5;
const BAR_LABEL_WIDTH: f64 = 70.0;
const BAR_VALUE_WIDTH: f64 = 18.0;
const BAR_ROW_HEIGHT: f64 = 9.0;
const CARD_LINE_HEIGHT: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub mod palette {
    use super::Color;

    pub const NAVY: Color = Color::rgb(30, 58, 95);
    pub const BLUE: Color = Color::rgb(74, 144, 226);
    pub const GREEN: Color = Color::rgb(46, 204, 113);
    pub const ORANGE: Color = Color::rgb(243, 156, 18);
    pub const RED: Color = Color::rgb(231, 76, 60);
    pub const PURPLE: Color = Color::rgb(138, 43, 226);
    pub const SLATE: Color = Color::rgb(128, 128, 128);
    pub const DARK_GRAY: Color = Color::rgb(55, 65, 81);
    pub const MEDIUM_GRAY: Color = Color::rgb(107, 114, 128);
    pub const LIGHT_GRAY: Color = Color::rgb(209, 213, 219);
    pub const STRIPE: Color = Color::rgb(245, 245, 245);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const GREEN_TINT: Color = Color::rgb(240, 253, 244);
    pub const RED_TINT: Color = Color::rgb(254, 226, 226);
    pub const BLUE_TINT: Color = Color::rgb(239, 246, 255);
    pub const AMBER_TINT: Color = Color::rgb(254, 243, 199);
    pub const PURPLE_TINT: Color = Color::rgb(243, 232, 255);
    pub const PANEL: Color = Color::rgb(241, 245, 249);
    pub const BACKGROUND_GRAY: Color = Color::rgb(249, 250, 251);

    pub const COVER_BAND: Color = Color::rgb(25, 50, 85);
    pub const COVER_BOX: Color = Color::rgb(15, 30, 55);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f64,
        y: f64,
        size: f64,
        font: Font,
        color: Color,
        align: Align,
        content: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Color>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Content,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub kind: PageKind,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { content, .. } => Some(content.as_str()),
            DrawOp::Rect { .. } => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.pages.iter().flat_map(Page::texts).collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|p| p.contains_text(needle))
    }
}

/// What the header and footer bands show on every content page.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub title: String,
    pub seller: String,
    pub date: String,
}

pub fn glyph_width(size: f64) -> f64 {
    size * AVG_GLYPH_EM * PT_TO_MM
}

/// Estimated rendered width of `text` at `size` points.
pub fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * glyph_width(size)
}

pub fn chars_per_line(width: f64, size: f64) -> usize {
    ((width / glyph_width(size)).floor() as usize).max(1)
}

/// Scale column widths down to `available`, keeping their ratios.
pub fn fit_column_widths(widths: &[f64], available: f64) -> Vec<f64> {
    let total: f64 = widths.iter().sum();
    if total <= available || total <= 0.0 {
        return widths.to_vec();
    }
    let scale = available / total;
    widths.iter().map(|w| w * scale).collect()
}

/// Bar lengths proportional to the largest value. A list whose maximum is
/// zero (or empty) yields zero-length bars.
pub fn bar_lengths(values: &[f64], area: f64) -> Vec<f64> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    values
        .iter()
        .map(|&v| {
            if max > 0.0 && v.is_finite() && v > 0.0 {
                v / max * area
            } else {
                0.0
            }
        })
        .collect()
}

pub type CellTint = fn(&str) -> Option<Color>;

#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
    pub width: f64,
    pub max_chars: usize,
    pub align: Align,
    pub tint: Option<CellTint>,
}

impl Column {
    pub fn new(header: &'static str, width: f64, max_chars: usize) -> Self {
        Self { header, width, max_chars, align: Align::Left, tint: None }
    }

    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    pub fn center(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn tinted(mut self, tint: CellTint) -> Self {
        self.tint = Some(tint);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub header_fill: Color,
    pub font_size: f64,
    pub grid: bool,
}

impl Table {
    pub fn new(columns: Vec<Column>, header_fill: Color) -> Self {
        Self { columns, rows: Vec::new(), header_fill, font_size: 7.0, grid: false }
    }

    pub fn rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn grid(mut self) -> Self {
        self.grid = true;
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct BarList {
    pub bars: Vec<Bar>,
    pub fill: Color,
    pub label_chars: usize,
}

impl BarList {
    /// Bars are ranked descending by value; `limit` keeps the top entries.
    pub fn ranked(mut bars: Vec<Bar>, limit: usize, fill: Color) -> Self {
        bars.sort_by(|a, b| b.value.total_cmp(&a.value));
        bars.truncate(limit);
        Self { bars, fill, label_chars: 28 }
    }
}

#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub accent: Color,
    pub background: Color,
}

#[derive(Debug, Clone)]
pub struct TextCard<'a> {
    pub title: Option<&'a str>,
    pub accent: Color,
    pub body: &'a str,
    pub background: Color,
    pub border: Option<Color>,
    pub min_height: f64,
    pub max_lines: Option<usize>,
}

impl<'a> TextCard<'a> {
    pub fn new(body: &'a str, background: Color) -> Self {
        Self {
            title: None,
            accent: palette::DARK_GRAY,
            body,
            background,
            border: None,
            min_height: 14.0,
            max_lines: None,
        }
    }

    pub fn title(mut self, title: &'a str, accent: Color) -> Self {
        self.title = Some(title);
        self.accent = accent;
        self
    }

    pub fn border(mut self, color: Color) -> Self {
        self.border = Some(color);
        self
    }

    pub fn min_height(mut self, height: f64) -> Self {
        self.min_height = height;
        self
    }

    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = Some(lines);
        self
    }
}

/// Owns the document under construction and the vertical cursor. Every
/// drawing step goes through `ensure_space` first.
pub struct PageBuilder {
    document: Document,
    chrome: Chrome,
    cursor: f64,
    fresh: bool,
}

impl PageBuilder {
    pub fn new(chrome: Chrome) -> Self {
        Self {
            document: Document { title: chrome.title.clone(), pages: Vec::new() },
            chrome,
            cursor: CONTENT_TOP,
            fresh: false,
        }
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.document.pages.len()
    }

    pub fn advance(&mut self, dy: f64) {
        self.cursor += dy;
        self.fresh = false;
    }

    /// Starts the cover page. Cover pages carry no chrome.
    pub fn cover_page(&mut self) {
        self.push_page(PageKind::Cover);
        self.cursor = 0.0;
        self.fresh = false;
    }

    pub fn new_page(&mut self) {
        self.push_page(PageKind::Content);
        self.draw_chrome();
        self.cursor = CONTENT_TOP;
        self.fresh = true;
    }

    /// New content page unless the current one is still untouched.
    pub fn start_content_page(&mut self) {
        if !self.fresh {
            self.new_page();
        }
    }

    /// Breaks the page when `height` does not fit below the cursor. Returns
    /// true when a new page was started.
    pub fn ensure_space(&mut self, height: f64) -> bool {
        let on_content = matches!(
            self.document.pages.last(),
            Some(Page { kind: PageKind::Content, .. })
        );
        if !on_content || (self.cursor + height > CONTENT_BOTTOM && !self.fresh) {
            self.new_page();
            return true;
        }
        false
    }

    pub fn finish(self) -> Document {
        self.document
    }

    pub fn text(&mut self, x: f64, y: f64, size: f64, font: Font, color: Color, align: Align, content: impl Into<String>) {
        self.push_op(DrawOp::Text { x, y, size, font, color, align, content: content.into() });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: Option<Color>, stroke: Option<Color>) {
        self.push_op(DrawOp::Rect { x, y, width, height, fill, stroke });
    }

    pub fn heading(&mut self, title: &str, color: Color) {
        self.ensure_space(HEADING_HEIGHT + 6.0);
        let y = self.cursor;
        self.rect(MARGIN, y, PRINTABLE_WIDTH, HEADING_HEIGHT, Some(color), None);
        let title = format::truncate(title, chars_per_line(PRINTABLE_WIDTH - 8.0, 11.0));
        self.text(MARGIN + 4.0, y + 7.0, 11.0, Font::Bold, palette::WHITE, Align::Left, title);
        self.advance(HEADING_HEIGHT + 4.0);
    }

    pub fn subheading(&mut self, text: &str) {
        self.ensure_space(10.0 + TABLE_ROW_HEIGHT);
        let y = self.cursor + 5.0;
        self.text(MARGIN, y, 10.0, Font::Bold, palette::DARK_GRAY, Align::Left, text);
        self.advance(8.0);
    }

    pub fn line(&mut self, text: &str, size: f64, font: Font, color: Color) {
        self.ensure_space(7.0);
        let y = self.cursor + 4.0;
        self.text(MARGIN, y, size, font, color, Align::Left, text);
        self.advance(6.0);
    }

    pub fn note(&mut self, text: &str) {
        self.line(text, 8.0, Font::Italic, palette::MEDIUM_GRAY);
        self.advance(2.0);
    }

    pub fn gap(&mut self, dy: f64) {
        if self.cursor + dy <= CONTENT_BOTTOM {
            self.advance(dy);
        }
    }

    pub fn table(&mut self, table: &Table) {
        if table.rows.is_empty() {
            return;
        }
        let declared: Vec<f64> = table.columns.iter().map(|c| c.width).collect();
        let widths = fit_column_widths(&declared, PRINTABLE_WIDTH);

        self.ensure_space(TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT);
        self.table_header(table, &widths);

        for (index, row) in table.rows.iter().enumerate() {
            if self.ensure_space(TABLE_ROW_HEIGHT) {
                self.table_header(table, &widths);
            }
            let y = self.cursor;
            if !table.grid && index % 2 == 1 {
                self.rect(MARGIN, y, PRINTABLE_WIDTH, TABLE_ROW_HEIGHT, Some(palette::STRIPE), None);
            }
            let mut x = MARGIN;
            for (i, (col, width)) in table.columns.iter().zip(&widths).enumerate() {
                if table.grid {
                    self.rect(x, y, *width, TABLE_ROW_HEIGHT, None, Some(palette::LIGHT_GRAY));
                }
                let raw = row.get(i).map(String::as_str).unwrap_or(format::PLACEHOLDER);
                let limit = col.max_chars.min(chars_per_line(width - 2.0 * CELL_PADDING, table.font_size));
                let content = format::truncate(raw, limit);
                let color = col.tint.and_then(|tint| tint(raw)).unwrap_or(palette::DARK_GRAY);
                let anchor = cell_anchor(x, *width, col.align);
                self.text(anchor, y + 5.2, table.font_size, Font::Regular, color, col.align, content);
                x += width;
            }
            self.advance(TABLE_ROW_HEIGHT);
        }
        self.advance(8.0);
    }

    fn table_header(&mut self, table: &Table, widths: &[f64]) {
        let y = self.cursor;
        self.rect(MARGIN, y, PRINTABLE_WIDTH, TABLE_HEADER_HEIGHT, Some(table.header_fill), None);
        let mut x = MARGIN;
        for (col, width) in table.columns.iter().zip(widths) {
            let anchor = cell_anchor(x, *width, Align::Center);
            self.text(anchor, y + 5.4, 8.0, Font::Bold, palette::WHITE, Align::Center, col.header);
            x += width;
        }
        self.advance(TABLE_HEADER_HEIGHT);
    }

    pub fn bar_list(&mut self, list: &BarList) {
        if list.bars.is_empty() {
            self.note("No data available");
            return;
        }
        let bar_x = MARGIN + BAR_LABEL_WIDTH + BAR_VALUE_WIDTH + 4.0;
        let area = PAGE_WIDTH - bar_x - MARGIN;
        let values: Vec<f64> = list.bars.iter().map(|b| b.value).collect();
        let lengths = bar_lengths(&values, area);

        for (bar, length) in list.bars.iter().zip(lengths) {
            self.ensure_space(BAR_ROW_HEIGHT);
            let y = self.cursor;
            let label = format::truncate(&bar.label, list.label_chars);
            self.text(MARGIN, y + 5.0, 8.0, Font::Regular, palette::DARK_GRAY, Align::Left, label);
            self.text(
                MARGIN + BAR_LABEL_WIDTH + BAR_VALUE_WIDTH,
                y + 5.0,
                8.0,
                Font::Bold,
                palette::BLUE,
                Align::Right,
                format::count(Some(bar.value)),
            );
            self.rect(bar_x, y + 0.5, area, 6.0, Some(palette::LIGHT_GRAY), None);
            if length > 0.0 {
                self.rect(bar_x, y + 0.5, length, 6.0, Some(list.fill), None);
            }
            self.advance(BAR_ROW_HEIGHT);
        }
        self.gap(4.0);
    }

    pub fn stat_cards(&mut self, cards: &[StatCard], value_size: f64) {
        if cards.is_empty() {
            return;
        }
        let height = 24.0;
        let spacing = 5.0;
        let width = (PRINTABLE_WIDTH - spacing * (cards.len() as f64 - 1.0)) / cards.len() as f64;
        self.ensure_space(height);
        let y = self.cursor;
        let mut x = MARGIN;
        for card in cards {
            self.rect(x, y, width, height, Some(card.background), None);
            let value = format::truncate(&card.value, chars_per_line(width - 4.0, value_size));
            self.text(x + width / 2.0, y + 13.0, value_size, Font::Bold, card.accent, Align::Center, value);
            self.text(x + width / 2.0, y + 20.0, 8.0, Font::Regular, palette::MEDIUM_GRAY, Align::Center, card.label);
            x += width + spacing;
        }
        self.advance(height + 8.0);
    }

    pub fn text_card(&mut self, card: &TextCard<'_>) {
        let body_size = 8.0;
        let inner = PRINTABLE_WIDTH - 8.0;
        let title_height = if card.title.is_some() { 6.0 } else { 0.0 };
        let page_lines = ((CONTENT_BOTTOM - CONTENT_TOP - 10.0 - title_height) / CARD_LINE_HEIGHT) as usize;

        let mut lines = wrap(card.body, chars_per_line(inner, body_size));
        lines.truncate(card.max_lines.unwrap_or(page_lines).min(page_lines));

        let height = (8.0 + title_height + lines.len() as f64 * CARD_LINE_HEIGHT).max(card.min_height);
        self.ensure_space(height);
        let y = self.cursor;
        self.rect(MARGIN, y, PRINTABLE_WIDTH, height, Some(card.background), card.border);

        let mut baseline = y + 6.0;
        if let Some(title) = card.title {
            let title = format::truncate(title, chars_per_line(inner, 9.0));
            self.text(MARGIN + 4.0, baseline, 9.0, Font::Bold, card.accent, Align::Left, title);
            baseline += title_height;
        }
        for line in lines {
            self.text(MARGIN + 4.0, baseline, body_size, Font::Regular, palette::DARK_GRAY, Align::Left, line);
            baseline += CARD_LINE_HEIGHT;
        }
        self.advance(height + 6.0);
    }

    fn push_page(&mut self, kind: PageKind) {
        let number = self.document.pages.len() + 1;
        self.document.pages.push(Page { number, kind, ops: Vec::new() });
    }

    fn push_op(&mut self, op: DrawOp) {
        if self.document.pages.is_empty() {
            self.new_page();
        }
        if let Some(page) = self.document.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn draw_chrome(&mut self) {
        let number = self.document.pages.len();
        let title = self.chrome.title.clone();
        let seller = format::truncate(&self.chrome.seller, 60);
        let date = self.chrome.date.clone();

        self.rect(0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, Some(palette::NAVY), None);
        self.text(PAGE_WIDTH / 2.0, 11.0, 10.0, Font::Bold, palette::WHITE, Align::Center, title);

        let footer_y = PAGE_HEIGHT - FOOTER_HEIGHT;
        let baseline = PAGE_HEIGHT - 6.0;
        self.rect(0.0, footer_y, PAGE_WIDTH, FOOTER_HEIGHT, Some(palette::NAVY), None);
        self.text(MARGIN, baseline, 7.0, Font::Regular, palette::WHITE, Align::Left, seller);
        self.text(PAGE_WIDTH / 2.0, baseline, 7.0, Font::Regular, palette::WHITE, Align::Center, format!("Page {number}"));
        self.text(PAGE_WIDTH - MARGIN, baseline, 7.0, Font::Regular, palette::WHITE, Align::Right, date);
    }
}

fn cell_anchor(x: f64, width: f64, align: Align) -> f64 {
    match align {
        Align::Left => x + CELL_PADDING,
        Align::Center => x + width / 2.0,
        Align::Right => x + width - CELL_PADDING,
    }
}
