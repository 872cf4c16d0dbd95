//! Word (`.docx`) backend.

use super::content::{self, Block, TableBlock};
use super::{check_target, RenderError, RenderResult, ReportData, ReportFormat, ReportRenderer};
use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run, Table, TableCell, TableRow};
use log::info;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

/// Table width in twentieths of a point (16 cm).
const TABLE_WIDTH_TWIPS: f32 = 9_070.0;
const TITLE_COLOR: &str = "1A237E";
const CHAPTER_COLOR: &str = "283593";
const SECTION_COLOR: &str = "3949AB";

/// Renders reports as Word documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReportRenderer;

impl ReportRenderer for DocxReportRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Docx
    }

    fn render(&self, data: &ReportData, path: &Path) -> RenderResult<()> {
        check_target(path)?;
        let started_at = Instant::now();

        let blocks = content::document(data);
        let bytes = package(&blocks)?;
        std::fs::write(path, &bytes)?;

        info!(
            "event=render module=report status=ok format=docx blocks={} bytes={} duration_ms={}",
            blocks.len(),
            bytes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

/// Packs the whole document in memory; nothing touches the target until
/// packing succeeded.
fn package(blocks: &[Block]) -> RenderResult<Vec<u8>> {
    let docx = blocks.iter().fold(Docx::new(), append_block);
    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|err| RenderError::Backend(format!("{err:?}")))?;
    Ok(buffer.into_inner())
}

fn append_block(docx: Docx, block: &Block) -> Docx {
    match block {
        Block::Heading { level, text } => docx.add_paragraph(heading(*level, text)),
        Block::Paragraph(text) => {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text.as_str()).size(22)))
        }
        Block::Bullet { lead, text } => {
            let mut paragraph = Paragraph::new().add_run(Run::new().add_text("\u{2022} ").size(22));
            if let Some(lead) = lead {
                paragraph =
                    paragraph.add_run(Run::new().add_text(format!("{lead} ")).bold().size(22));
            }
            docx.add_paragraph(paragraph.add_run(Run::new().add_text(text.as_str()).size(22)))
        }
        Block::Table(table) => docx
            .add_table(table_of(table))
            .add_paragraph(Paragraph::new()),
        Block::PageBreak => {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        }
    }
}

fn heading(level: u8, text: &str) -> Paragraph {
    // Run sizes are in half-points.
    let (size, color) = match level {
        1 => (48, TITLE_COLOR),
        2 => (32, CHAPTER_COLOR),
        _ => (28, SECTION_COLOR),
    };
    let paragraph = Paragraph::new().add_run(
        Run::new()
            .add_text(text)
            .bold()
            .size(size)
            .color(color),
    );
    if level == 1 {
        paragraph.align(AlignmentType::Center)
    } else {
        paragraph
    }
}

fn table_of(table: &TableBlock) -> Table {
    let total: f32 = table.widths.iter().sum();
    let grid = table
        .headers
        .iter()
        .enumerate()
        .map(|(index, _)| {
            let share = table.widths.get(index).copied().unwrap_or(1.0);
            let columns = table.headers.len().max(1) as f32;
            let twips = if total > 0.0 {
                TABLE_WIDTH_TWIPS * share / total
            } else {
                TABLE_WIDTH_TWIPS / columns
            };
            twips.round() as usize
        })
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    rows.push(TableRow::new(
        table.headers.iter().map(|cell| cell_of(cell, true)).collect(),
    ));
    rows.extend(
        table
            .rows
            .iter()
            .map(|row| TableRow::new(row.iter().map(|cell| cell_of(cell, false)).collect())),
    );
    Table::new(rows).set_grid(grid)
}

fn cell_of(text: &str, header: bool) -> TableCell {
    let run = Run::new().add_text(text).size(20);
    let run = if header { run.bold() } else { run };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

#[cfg(test)]
mod tests {
    use super::{package, DocxReportRenderer};
    use crate::report::content::Block;
    use crate::report::{ReportData, ReportRenderer, ReportSection};
    use chrono::NaiveDate;

    fn empty_report() -> ReportData {
        ReportData {
            period_label: "Fiscal Year 2024".to_string(),
            issued_on: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            debts: ReportSection::empty(),
            provisions: ReportSection::empty(),
        }
    }

    fn blocks() -> Vec<Block> {
        vec![
            Block::Heading {
                level: 1,
                text: "Audit".to_string(),
            },
            Block::Paragraph("Long-term debts".to_string()),
            Block::PageBreak,
        ]
    }

    #[test]
    fn package_is_a_complete_zip_archive() {
        let bytes = package(&blocks()).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
        // End-of-central-directory record closes every finished archive.
        assert!(bytes.windows(4).any(|window| window == b"PK\x05\x06"));
    }

    #[test]
    fn render_replaces_existing_file_with_packed_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.docx");
        std::fs::write(&path, vec![0u8; 4 * 1024 * 1024]).unwrap();

        DocxReportRenderer
            .render(&empty_report(), &path)
            .unwrap();

        let written = std::fs::read(&path).unwrap();
        assert!(written.starts_with(b"PK\x03\x04"));
        assert!(written.len() < 4 * 1024 * 1024);
        assert!(written.windows(4).any(|window| window == b"PK\x05\x06"));
    }

    #[test]
    fn render_into_missing_directory_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("audit.docx");

        assert!(DocxReportRenderer
            .render(&empty_report(), &path)
            .is_err());
        assert!(!path.exists());
    }
}
