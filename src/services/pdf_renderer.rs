// src/services/pdf_renderer.rs
use printpdf::{
    BuiltinFont, Color as PdfColor, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use std::io::{BufWriter, Cursor};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::layout::{text_width, Align, Color, Document, DrawOp, Font, Page, PAGE_HEIGHT, PAGE_WIDTH};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf encoding failed: {0}")]
    Pdf(String),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn pdf_error(e: impl std::fmt::Debug) -> RenderError {
    RenderError::Pdf(format!("{e:?}"))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Italic => &self.italic,
        }
    }
}

/// Encodes a laid-out document as A4 PDF bytes.
pub fn render_pdf(document: &Document) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(document.title.clone(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_error)?,
    };

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        draw_page(&layer, page, &fonts);
    }

    let mut writer = BufWriter::new(Cursor::new(Vec::new()));
    doc.save(&mut writer).map_err(pdf_error)?;
    let cursor = writer.into_inner().map_err(|e| RenderError::Io(e.into_error()))?;
    Ok(cursor.into_inner())
}

fn pdf_color(color: Color) -> PdfColor {
    PdfColor::Rgb(Rgb::new(
        f64::from(color.r) / 255.0,
        f64::from(color.g) / 255.0,
        f64::from(color.b) / 255.0,
        None,
    ))
}

fn draw_page(layer: &PdfLayerReference, page: &Page, fonts: &Fonts) {
    for op in &page.ops {
        match op {
            DrawOp::Rect { x, y, width, height, fill, stroke } => {
                if *width <= 0.0 || *height <= 0.0 || (fill.is_none() && stroke.is_none()) {
                    continue;
                }
                if let Some(color) = fill {
                    layer.set_fill_color(pdf_color(*color));
                }
                if let Some(color) = stroke {
                    layer.set_outline_color(pdf_color(*color));
                    layer.set_outline_thickness(0.5);
                }
                layer.add_shape(rectangle(*x, *y, *width, *height, fill.is_some(), stroke.is_some()));
            }
            DrawOp::Text { x, y, size, font, color, align, content } => {
                let left = match align {
                    Align::Left => *x,
                    Align::Center => x - text_width(content, *size) / 2.0,
                    Align::Right => x - text_width(content, *size),
                };
                layer.set_fill_color(pdf_color(*color));
                layer.use_text(content.clone(), *size, Mm(left), Mm(PAGE_HEIGHT - y), fonts.get(*font));
            }
        }
    }
}

// layout y grows downwards, PDF y grows upwards
fn rectangle(x: f64, y: f64, width: f64, height: f64, fill: bool, stroke: bool) -> Line {
    let top = PAGE_HEIGHT - y;
    let bottom = top - height;
    let corners = [(x, bottom), (x + width, bottom), (x + width, top), (x, top)];
    Line {
        points: corners.iter().map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false)).collect(),
        is_closed: true,
        has_fill: fill,
        has_stroke: stroke,
        is_clipping_path: false,
    }
}

/// Renders on the blocking pool and writes `<dir>/<id>.pdf`. Returns the public
/// URL path of the file.
pub async fn write_pdf_report(dir: &Path, id: &str, document: Document) -> Result<String, RenderError> {
    tokio::fs::create_dir_all(dir).await?;

    let bytes = tokio::task::spawn_blocking(move || render_pdf(&document)).await??;

    let path = dir.join(format!("{id}.pdf"));
    tokio::fs::write(&path, &bytes).await?;
    info!(path = %path.display(), size = bytes.len(), "report pdf written");

    Ok(format!("/reports/{id}.pdf"))
}
