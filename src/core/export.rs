//! PDF export of the monthly expense report.
//!
//! The report is first laid out as plain strings in a [`ReportDocument`] so the
//! content can be checked without parsing PDF output, then drawn with
//! `printpdf` on A4 pages.

use crate::{
    config::app::ReportConfig,
    core::{
        money,
        report::{MonthRange, fetch_month_expenses, report_total},
        transaction::{TransactionWithCategory, format_date_br},
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use sea_orm::DatabaseConnection;
use std::{io::BufWriter, path::PathBuf};
use tracing::info;

/// Title printed at the top of the first page.
pub const REPORT_TITLE: &str = "Relatório Financeiro Mensal";

/// Column headers of the expense table.
pub const TABLE_HEADER: [&str; 4] = ["Data", "Descrição", "Categoria", "Valor"];

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 7.0;
const COLUMNS_X: [f32; 4] = [15.0, 45.0, 120.0, 165.0];
const MAX_CELL_CHARS: usize = 40;

/// One line of the expense table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// `dd/mm/yyyy`
    pub date: String,
    /// Description, possibly empty
    pub description: String,
    /// Category name or "-"
    pub category: String,
    /// Formatted amount
    pub amount: String,
}

/// Laid-out content of a monthly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Report title
    pub title: String,
    /// `Período: YYYY-MM`
    pub period: String,
    /// `Gerado em: dd/mm/yyyy`
    pub generated: String,
    /// Expense rows, in fetched order
    pub rows: Vec<ReportRow>,
    /// Formatted sum of all rows
    pub total: String,
}

impl ReportDocument {
    /// Lays out the report for `month` from already fetched rows.
    #[must_use]
    pub fn build(
        month: &MonthRange,
        generated_on: NaiveDate,
        rows: &[TransactionWithCategory],
        currency_symbol: &str,
    ) -> Self {
        let table = rows
            .iter()
            .map(|(tx, category)| ReportRow {
                date: format_date_br(tx.date),
                description: tx.description.clone().unwrap_or_default(),
                category: category
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |c| c.name.clone()),
                amount: money::format_currency(tx.amount(), currency_symbol),
            })
            .collect();

        Self {
            title: REPORT_TITLE.to_string(),
            period: format!("Período: {}", month.label()),
            generated: format!("Gerado em: {}", format_date_br(generated_on)),
            rows: table,
            total: money::format_currency(report_total(rows), currency_symbol),
        }
    }
}

/// File name of an exported month: `relatorio_<YYYY-MM>.pdf`.
#[must_use]
pub fn report_filename(month: &MonthRange) -> String {
    format!("relatorio_{}.pdf", month.label())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn push_row(layer: &PdfLayerReference, font: &IndirectFontRef, cells: [&str; 4], y: f32) {
    for (cell, x) in cells.iter().zip(COLUMNS_X) {
        layer.use_text(truncate(cell), 10.0, Mm(x), Mm(y), font);
    }
}

fn rule(layer: &PdfLayerReference, y: f32) {
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

/// Renders the document as PDF bytes, adding pages as rows overflow.
///
/// # Errors
/// Returns [`Error::Pdf`] if the renderer fails.
pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>> {
    let pdf_error = |e: &dyn std::fmt::Display| Error::Pdf {
        message: e.to_string(),
    };

    let (doc, page, layer) =
        PdfDocument::new(&document.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| pdf_error(&e))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| pdf_error(&e))?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - 20.0;

    layer.use_text(&document.title, 16.0, Mm(MARGIN), Mm(y), &font_bold);
    y -= 8.0;
    layer.use_text(&document.period, 10.0, Mm(MARGIN), Mm(y), &font);
    y -= 5.0;
    layer.use_text(&document.generated, 10.0, Mm(MARGIN), Mm(y), &font);
    y -= 10.0;

    push_row(&layer, &font_bold, TABLE_HEADER, y);
    y -= 2.0;
    rule(&layer, y);
    y -= ROW_HEIGHT;

    for row in &document.rows {
        if y < MARGIN + ROW_HEIGHT {
            let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT - 20.0;
            push_row(&layer, &font_bold, TABLE_HEADER, y);
            y -= 2.0;
            rule(&layer, y);
            y -= ROW_HEIGHT;
        }
        push_row(
            &layer,
            &font,
            [&row.date, &row.description, &row.category, &row.amount],
            y,
        );
        y -= ROW_HEIGHT;
    }

    if y < MARGIN + ROW_HEIGHT {
        let (next_page, next_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        layer = doc.get_page(next_page).get_layer(next_layer);
        y = PAGE_HEIGHT - 20.0;
    }
    rule(&layer, y + ROW_HEIGHT - 2.0);
    push_row(&layer, &font_bold, ["TOTAL", "", "", &document.total], y);

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| pdf_error(&e))?;
    writer.into_inner().map_err(|e| pdf_error(&e))
}

/// Fetches the month's expenses, renders them and writes the PDF to the
/// configured output directory. Returns the written path.
///
/// # Errors
/// Returns [`Error::EmptyReport`] when the month has no expenses.
pub async fn export_month_report(
    db: &DatabaseConnection,
    user_id: i64,
    month: MonthRange,
    today: NaiveDate,
    config: &ReportConfig,
) -> Result<PathBuf> {
    let rows = fetch_month_expenses(db, user_id, month).await?;
    if rows.is_empty() {
        return Err(Error::EmptyReport {
            month: month.label(),
        });
    }

    let document = ReportDocument::build(&month, today, &rows, &config.currency_symbol);
    let bytes = render_pdf(&document)?;

    std::fs::create_dir_all(&config.output_dir)?;
    let path = config.output_dir.join(report_filename(&month));
    std::fs::write(&path, bytes)?;

    info!(
        "Exported {} expense(s) for {month} to {}",
        document.rows.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{TransactionKind, category};
    use crate::test_utils::*;

    fn rows() -> Vec<TransactionWithCategory> {
        let market = category::Model {
            id: 1,
            user_id: Some(1),
            name: "Mercado".to_string(),
            kind: TransactionKind::Expense,
        };
        let mut first = sample_transaction(1, TransactionKind::Expense, 123_456, date(2024, 3, 2));
        first.description = Some("Compras do mês".to_string());
        let second = sample_transaction(2, TransactionKind::Expense, 2_500, date(2024, 3, 9));
        vec![(first, Some(market)), (second, None)]
    }

    #[test]
    fn test_build_document() {
        let month = MonthRange::parse("2024-03").unwrap();
        let doc = ReportDocument::build(&month, date(2024, 4, 1), &rows(), "R$");

        assert_eq!(doc.title, "Relatório Financeiro Mensal");
        assert_eq!(doc.period, "Período: 2024-03");
        assert_eq!(doc.generated, "Gerado em: 01/04/2024");
        assert_eq!(doc.rows.len(), 2);
        assert_eq!(
            doc.rows[0],
            ReportRow {
                date: "02/03/2024".to_string(),
                description: "Compras do mês".to_string(),
                category: "Mercado".to_string(),
                amount: "R$ 1.234,56".to_string(),
            }
        );
        assert_eq!(doc.rows[1].category, "-");
        assert_eq!(doc.rows[1].description, "");
        assert_eq!(doc.total, "R$ 1.259,56");
    }

    #[test]
    fn test_report_filename() {
        let month = MonthRange::parse("2024-11").unwrap();
        assert_eq!(report_filename(&month), "relatorio_2024-11.pdf");
    }

    #[test]
    fn test_truncate_long_cells() {
        assert_eq!(truncate("curto"), "curto");
        let long = "x".repeat(60);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), MAX_CELL_CHARS);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_render_pdf_paginates() {
        let month = MonthRange::parse("2024-03").unwrap();
        let many: Vec<_> = (0..120)
            .map(|i| (sample_transaction(i, TransactionKind::Expense, 100, date(2024, 3, 1)), None))
            .collect();
        let doc = ReportDocument::build(&month, date(2024, 4, 1), &many, "R$");
        let bytes = render_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_refuses_empty_month() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let month = MonthRange::parse("2024-03")?;
        let result =
            export_month_report(&db, user.id, month, date(2024, 4, 1), &ReportConfig::default()).await;
        assert!(matches!(result, Err(Error::EmptyReport { month }) if month == "2024-03"));
        Ok(())
    }

    #[tokio::test]
    async fn test_export_writes_file() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        create_test_transaction(&db, user.id, TransactionKind::Expense, 4_200, None, date(2024, 3, 5)).await?;

        let dir = std::env::temp_dir().join(format!("finance-buddy-export-{}", uuid::Uuid::new_v4()));
        let config = ReportConfig {
            output_dir: dir.clone(),
            ..ReportConfig::default()
        };
        let month = MonthRange::parse("2024-03")?;
        let path = export_month_report(&db, user.id, month, date(2024, 4, 1), &config).await?;

        assert_eq!(path, dir.join("relatorio_2024-03.pdf"));
        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(b"%PDF"));
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
