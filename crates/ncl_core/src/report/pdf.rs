//! PDF backend.
//!
//! # Responsibility
//! - Lay out content blocks on A4 pages with builtin Helvetica.
//!
//! # Invariants
//! - Text stays inside the 20 mm margins; long lines are word-wrapped
//!   using an average glyph width estimate.
//! - A block that does not fit the remaining page space starts a new page.

use super::content::{self, Block, TableBlock};
use super::{check_target, RenderError, RenderResult, ReportData, ReportFormat, ReportRenderer};
use log::{debug, info};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};
use std::path::Path;
use std::time::Instant;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const PT_TO_MM: f32 = 0.352_778;
/// Mean Helvetica advance width as a share of the font size.
const GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;
const BODY_PT: f32 = 11.0;
const TABLE_PT: f32 = 9.0;
const CELL_PADDING_MM: f32 = 1.5;
const BULLET_INDENT_MM: f32 = 6.0;
const LAYER_NAME: &str = "content";

/// Renders reports as A4 PDF documents.
#[derive(Debug, Clone)]
pub struct PdfReportRenderer {
    title: String,
}

impl Default for PdfReportRenderer {
    fn default() -> Self {
        Self {
            title: content::REPORT_TITLE.to_string(),
        }
    }
}

impl ReportRenderer for PdfReportRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn render(&self, data: &ReportData, path: &Path) -> RenderResult<()> {
        check_target(path)?;
        let started_at = Instant::now();

        let blocks = content::document(data);
        let bytes = self.layout(&blocks)?;
        std::fs::write(path, &bytes)?;

        info!(
            "event=render module=report status=ok format=pdf blocks={} bytes={} duration_ms={}",
            blocks.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

impl PdfReportRenderer {
    fn layout(&self, blocks: &[Block]) -> RenderResult<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            self.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            LAYER_NAME,
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(backend)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(backend)?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut cursor = PageCursor {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        };
        for block in blocks {
            cursor.block(block);
        }
        debug!(
            "event=layout module=report status=ok format=pdf pages={}",
            cursor.pages
        );
        cursor.doc.save_to_bytes().map_err(backend)
    }
}

fn backend(err: printpdf::Error) -> RenderError {
    RenderError::Backend(err.to_string())
}

struct PageCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, measured from the page bottom.
    y: f32,
    pages: usize,
}

impl PageCursor {
    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading { level, text } => self.heading(*level, text),
            Block::Paragraph(text) => {
                self.text(text, BODY_PT, MARGIN_MM, CONTENT_WIDTH_MM, false);
                self.y -= line_height(BODY_PT) * 0.5;
            }
            Block::Bullet { lead, text } => self.bullet(lead.as_deref(), text),
            Block::Table(table) => self.table(table),
            Block::PageBreak => self.page_break(),
        }
    }

    fn heading(&mut self, level: u8, text: &str) {
        let size = match level {
            1 => 20.0,
            2 => 14.0,
            _ => 12.0,
        };
        let height = line_height(size);
        self.ensure_space(height * 3.0);
        self.y -= height * 0.5;

        if level == 1 {
            for line in wrap(text, size, CONTENT_WIDTH_MM) {
                let offset = ((CONTENT_WIDTH_MM - text_width(&line, size)) / 2.0).max(0.0);
                self.layer
                    .use_text(line, size, Mm(MARGIN_MM + offset), Mm(self.y), &self.bold);
                self.y -= height;
            }
            self.y -= height;
        } else {
            self.text(text, size, MARGIN_MM, CONTENT_WIDTH_MM, true);
            self.y -= height * 0.25;
        }
    }

    fn bullet(&mut self, lead: Option<&str>, text: &str) {
        let x = MARGIN_MM + BULLET_INDENT_MM;
        let width = CONTENT_WIDTH_MM - BULLET_INDENT_MM;
        let height = line_height(BODY_PT);
        let full = match lead {
            Some(lead) => format!("{lead} {text}"),
            None => text.to_string(),
        };

        for (index, line) in wrap(&full, BODY_PT, width).into_iter().enumerate() {
            self.ensure_space(height);
            if index == 0 {
                self.layer.use_text(
                    "\u{2022}",
                    BODY_PT,
                    Mm(MARGIN_MM + 1.5),
                    Mm(self.y),
                    &self.regular,
                );
                match lead.filter(|lead| line.starts_with(*lead)) {
                    Some(lead) => {
                        self.layer
                            .use_text(lead, BODY_PT, Mm(x), Mm(self.y), &self.bold);
                        let rest = line[lead.len()..].trim_start();
                        let rest_x = x + text_width(lead, BODY_PT) * 1.1 + 1.5;
                        self.layer
                            .use_text(rest, BODY_PT, Mm(rest_x), Mm(self.y), &self.regular);
                    }
                    None => self
                        .layer
                        .use_text(line, BODY_PT, Mm(x), Mm(self.y), &self.regular),
                }
            } else {
                self.layer
                    .use_text(line, BODY_PT, Mm(x), Mm(self.y), &self.regular);
            }
            self.y -= height;
        }
        self.y -= height * 0.2;
    }

    fn table(&mut self, table: &TableBlock) {
        let total: f32 = table.widths.iter().sum();
        let widths = table
            .headers
            .iter()
            .enumerate()
            .map(|(index, _)| {
                let share = table.widths.get(index).copied().unwrap_or(1.0);
                if total > 0.0 {
                    CONTENT_WIDTH_MM * share / total
                } else {
                    CONTENT_WIDTH_MM / table.headers.len().max(1) as f32
                }
            })
            .collect::<Vec<_>>();

        self.row(&table.headers, &widths, true);
        for row in &table.rows {
            self.row(row, &widths, false);
        }
        self.y -= line_height(BODY_PT) * 0.5;
    }

    fn row(&mut self, cells: &[String], widths: &[f32], header: bool) {
        let height = line_height(TABLE_PT);
        let wrapped = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| wrap(cell, TABLE_PT, width - 2.0 * CELL_PADDING_MM))
            .collect::<Vec<_>>();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let row_height = lines as f32 * height + 2.0 * CELL_PADDING_MM;
        self.ensure_space(row_height);

        let top = self.y + height * 0.75;
        let bottom = top - row_height;
        if header {
            self.layer.set_fill_color(rgb(0.224, 0.286, 0.671));
            self.layer.add_rect(Rect::new(
                Mm(MARGIN_MM),
                Mm(bottom),
                Mm(MARGIN_MM + CONTENT_WIDTH_MM),
                Mm(top),
            ));
            self.layer.set_fill_color(rgb(1.0, 1.0, 1.0));
        }

        let font = if header { &self.bold } else { &self.regular };
        let mut x = MARGIN_MM;
        for (cell_lines, width) in wrapped.iter().zip(widths) {
            let mut y = self.y - CELL_PADDING_MM;
            for line in cell_lines {
                self.layer
                    .use_text(line.as_str(), TABLE_PT, Mm(x + CELL_PADDING_MM), Mm(y), font);
                y -= height;
            }
            x += width;
        }
        if header {
            self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        }

        self.layer.set_outline_color(rgb(0.6, 0.6, 0.6));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), Mm(bottom)), false),
                (Point::new(Mm(MARGIN_MM + CONTENT_WIDTH_MM), Mm(bottom)), false),
            ],
            is_closed: false,
        });
        self.y -= row_height;
    }

    fn text(&mut self, text: &str, size: f32, x: f32, width: f32, bold: bool) {
        let height = line_height(size);
        for line in wrap(text, size, width) {
            self.ensure_space(height);
            let font = if bold { &self.bold } else { &self.regular };
            self.layer.use_text(line, size, Mm(x), Mm(self.y), font);
            self.y -= height;
        }
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN_MM {
            self.new_page();
        }
    }

    fn page_break(&mut self) {
        if self.y < PAGE_HEIGHT_MM - MARGIN_MM {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        self.pages += 1;
    }
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_SPACING
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * GLYPH_EM
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * PT_TO_MM * GLYPH_EM)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(index, _)| index);
            let rest = word.split_off(split_at);
            lines.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::wrap;

    #[test]
    fn wrap_respects_width_and_keeps_words() {
        // 10 pt at 0.5 em is ~1.76 mm per glyph, so 20 mm holds 11 glyphs.
        let lines = wrap("alpha beta gamma delta", 10.0, 20.0);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn wrap_splits_oversized_words_and_handles_empty_text() {
        let lines = wrap("abcdefghijklmnopqrstuvwxyz", 10.0, 20.0);
        assert_eq!(lines, vec!["abcdefghijk", "lmnopqrstuv", "wxyz"]);
        assert_eq!(wrap("", 10.0, 20.0), vec![String::new()]);
    }
}
