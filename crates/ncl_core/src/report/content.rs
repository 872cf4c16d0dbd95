//! Format-neutral document content.
//!
//! # Responsibility
//! - Turn `ReportData` into the ordered block list every backend renders.
//!
//! # Invariants
//! - Block order is fixed: cover, executive summary, regulatory framework,
//!   debt analysis, provision analysis, risk matrix, conclusions and
//!   signature.
//! - Empty breakdowns render as an explanatory paragraph instead of an
//!   empty table.

use super::format::{format_amount, format_date, format_percent};
use super::{ReportData, ReportSection};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub const REPORT_TITLE: &str = "ALGORITHMIC SYSTEMS AUDIT REPORT";
pub const RESPONSIBLE_PARTY: &str = "Algorithmic Audit System";
pub const REPORT_VERSION: &str = "1.0";
pub const CLASSIFICATION: &str = "Confidential";

/// One renderable unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Level 1 is the cover title, 2 a chapter, 3 a section.
    Heading { level: u8, text: String },
    Paragraph(String),
    /// Bullet item with an optional bold lead-in.
    Bullet { lead: Option<String>, text: String },
    Table(TableBlock),
    PageBreak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Relative column widths, one per header.
    pub widths: Vec<f32>,
}

impl Block {
    fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }

    fn bullet(text: impl Into<String>) -> Self {
        Self::Bullet {
            lead: None,
            text: text.into(),
        }
    }

    fn lead_bullet(lead: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Bullet {
            lead: Some(lead.into()),
            text: text.into(),
        }
    }
}

/// Builds the complete report body.
pub fn document(data: &ReportData) -> Vec<Block> {
    let mut blocks = Vec::new();
    cover(&mut blocks, data);
    executive_summary(&mut blocks, data);
    regulatory_framework(&mut blocks);
    section(&mut blocks, &DEBT_COPY, &data.debts);
    blocks.push(Block::PageBreak);
    section(&mut blocks, &PROVISION_COPY, &data.provisions);
    blocks.push(Block::PageBreak);
    risk_matrix(&mut blocks);
    conclusions(&mut blocks, data);
    signature(&mut blocks);
    blocks
}

fn cover(blocks: &mut Vec<Block>, data: &ReportData) {
    blocks.push(Block::heading(1, REPORT_TITLE));
    blocks.push(Block::heading(
        2,
        format!("NON-CURRENT LIABILITIES ANALYSIS - {}", data.period_label),
    ));
    blocks.push(Block::paragraph(
        "Algorithmic Output Evaluation and Anomaly Detection",
    ));
    blocks.push(Block::lead_bullet("Issue date:", format_date(data.issued_on)));
    blocks.push(Block::lead_bullet("Period analyzed:", data.period_label.clone()));
    blocks.push(Block::lead_bullet("Responsible:", RESPONSIBLE_PARTY));
    blocks.push(Block::lead_bullet("Version:", REPORT_VERSION));
    blocks.push(Block::lead_bullet("Classification:", CLASSIFICATION));
    blocks.push(Block::PageBreak);
}

fn executive_summary(blocks: &mut Vec<Block>, data: &ReportData) {
    blocks.push(Block::heading(2, "EXECUTIVE SUMMARY"));
    blocks.push(Block::paragraph(format!(
        "This report covers the algorithmic analysis of non-current liabilities for {}, \
         performed with unsupervised anomaly detection over debt and provision records.",
        data.period_label
    )));
    blocks.push(Block::lead_bullet(
        "Total records analyzed:",
        format!(
            "{} ({} debts and {} provisions)",
            data.total_records(),
            data.debts.totals.count,
            data.provisions.totals.count
        ),
    ));
    blocks.push(Block::lead_bullet(
        "Total non-current liabilities:",
        format_amount(data.total_liability()),
    ));
    blocks.push(Block::lead_bullet(
        "Anomalies detected:",
        format!(
            "{} records ({} in debts, {} in provisions)",
            data.total_anomalies(),
            data.debts.anomaly_count,
            data.provisions.anomaly_count
        ),
    ));
    blocks.push(Block::paragraph(
        "Flagged records show patterns that deviate from the rest of the portfolio and \
         should be reviewed by management, in particular long-term obligations and \
         provisions for legal contingencies.",
    ));
}

fn regulatory_framework(blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(2, "APPLICABLE REGULATORY FRAMEWORK"));
    blocks.push(Block::heading(3, "National Standards (Argentina)"));
    blocks.push(Block::lead_bullet(
        "Technical Resolution No. 37 (FACPCE):",
        "Professional accounting standards on liabilities and provisions. The split between \
         current and non-current items and the measurement of long-term obligations were \
         reviewed.",
    ));
    blocks.push(Block::lead_bullet(
        "Technical Resolution No. 41 (FACPCE):",
        "Recognition and measurement of financial instruments, applied to the valuation of \
         financial debt.",
    ));
    blocks.push(Block::lead_bullet(
        "Law 25.506 (Digital Signature):",
        "Digital records and algorithmic outputs meet the integrity and authenticity \
         requirements of the law.",
    ));
    blocks.push(Block::lead_bullet(
        "Law 25.326 (Personal Data Protection):",
        "Sensitive information was processed under confidentiality and security principles.",
    ));
    blocks.push(Block::heading(3, "International Standards"));
    blocks.push(Block::lead_bullet(
        "ISA 315 (Identifying and Assessing Risks):",
        "Procedures were applied to identify risks of material misstatement in \
         non-current liabilities.",
    ));
    blocks.push(Block::lead_bullet(
        "ISA 520 (Analytical Procedures):",
        "Anomaly detection acts as an advanced analytical procedure for assessing the \
         reasonableness of balances.",
    ));
    blocks.push(Block::lead_bullet(
        "COSO Framework (Internal Control):",
        "The effectiveness of automated controls over non-current liability transactions \
         was evaluated.",
    ));
}

struct SectionCopy {
    chapter: &'static str,
    noun: &'static str,
    amount_phrase: &'static str,
    type_heading: &'static str,
    type_column: &'static str,
    amount_column: &'static str,
    recommendation: &'static str,
}

const DEBT_COPY: SectionCopy = SectionCopy {
    chapter: "NON-CURRENT DEBT ANALYSIS",
    noun: "non-current debt",
    amount_phrase: "an outstanding balance of",
    type_heading: "Distribution by Debt Type",
    type_column: "Debt Type",
    amount_column: "Outstanding Balance",
    recommendation: "Review the supporting documentation of the flagged debts and verify \
                     their accounting treatment and classification.",
};

const PROVISION_COPY: SectionCopy = SectionCopy {
    chapter: "PROVISION ANALYSIS",
    noun: "provision",
    amount_phrase: "an estimated amount of",
    type_heading: "Distribution by Provision Type",
    type_column: "Provision Type",
    amount_column: "Estimated Amount",
    recommendation: "Review the calculation basis and legal reports behind the flagged \
                     estimates, and assess whether amounts should be adjusted or \
                     provisions reclassified.",
};

fn section(blocks: &mut Vec<Block>, copy: &SectionCopy, data: &ReportSection) {
    blocks.push(Block::heading(2, copy.chapter));
    blocks.push(Block::paragraph(format!(
        "{} {} records were analyzed, with {} {}. The detector flagged {} anomalies that \
         deviate significantly from the expected patterns.",
        data.totals.count,
        copy.noun,
        copy.amount_phrase,
        format_amount(data.totals.amount),
        data.anomaly_count
    )));

    blocks.push(Block::heading(3, copy.type_heading));
    if data.by_type.is_empty() {
        blocks.push(Block::paragraph("No type breakdown is available for this period."));
    } else {
        blocks.push(Block::Table(TableBlock {
            headers: vec![
                copy.type_column.to_string(),
                copy.amount_column.to_string(),
                "Share".to_string(),
            ],
            rows: data
                .by_type
                .iter()
                .map(|share| {
                    vec![
                        share.label.clone(),
                        format_amount(share.amount),
                        format_percent(share.percentage),
                    ]
                })
                .collect(),
            widths: vec![8.0, 5.0, 3.0],
        }));
    }

    blocks.push(Block::heading(3, "Distribution by Status"));
    if data.by_status.is_empty() {
        blocks.push(Block::paragraph("No status breakdown is available for this period."));
    } else {
        blocks.push(Block::Table(TableBlock {
            headers: vec!["Status".to_string(), "Records".to_string(), "Share".to_string()],
            rows: data
                .by_status
                .iter()
                .map(|share| {
                    vec![
                        share.label.clone(),
                        share.count.to_string(),
                        format_percent(share.percentage),
                    ]
                })
                .collect(),
            widths: vec![8.0, 5.0, 3.0],
        }));
    }

    blocks.push(Block::heading(3, "Detected Anomalies"));
    if data.flagged.is_empty() {
        blocks.push(Block::paragraph("No records were flagged for review."));
    } else {
        blocks.push(Block::paragraph(format!(
            "The isolation forest flagged {} records:",
            data.flagged.len()
        )));
        for record in &data.flagged {
            blocks.push(Block::lead_bullet(
                format!("{}:", record.id),
                format!("{}, {}", record.label, format_amount(record.amount)),
            ));
        }
    }
    blocks.push(Block::lead_bullet("Recommendation:", copy.recommendation));
}

const RISKS: [[&str; 4]; 6] = [
    ["Incorrect time classification of debts", "High", "Medium", "HIGH"],
    ["Undervalued litigation provisions", "High", "Medium", "HIGH"],
    ["Missing supporting documentation", "Medium", "High", "HIGH"],
    ["Outdated interest rates", "Medium", "Medium", "MEDIUM"],
    ["Obsolete provisions not reversed", "Low", "High", "MEDIUM"],
    ["Debt amortization errors", "Medium", "Low", "LOW"],
];

fn risk_matrix(blocks: &mut Vec<Block>) {
    blocks.push(Block::heading(2, "IDENTIFIED RISK MATRIX"));
    blocks.push(Block::paragraph(
        "Risks identified during the algorithmic analysis, classified by impact and \
         probability of occurrence.",
    ));
    blocks.push(Block::Table(TableBlock {
        headers: ["Identified Risk", "Impact", "Probability", "Level"]
            .iter()
            .map(|header| header.to_string())
            .collect(),
        rows: RISKS
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
        widths: vec![7.0, 3.0, 3.0, 3.0],
    }));
}

/// Share of flagged records over all records, and of flagged amount over
/// total liability, both in percent.
pub fn anomaly_shares(data: &ReportData) -> (f64, f64) {
    let records = data.total_records();
    let record_share = if records == 0 {
        0.0
    } else {
        data.total_anomalies() as f64 / records as f64 * 100.0
    };

    let total = data.total_liability();
    let flagged = data.debts.flagged_amount() + data.provisions.flagged_amount();
    let amount_share = if total.is_zero() {
        0.0
    } else {
        (flagged / total * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
    };
    (record_share, amount_share)
}

fn conclusions(blocks: &mut Vec<Block>, data: &ReportData) {
    let (record_share, amount_share) = anomaly_shares(data);

    blocks.push(Block::heading(2, "CONCLUSIONS AND RECOMMENDATIONS"));
    blocks.push(Block::paragraph(format!(
        "Based on the algorithmic analysis of non-current liabilities for {}, we conclude:",
        data.period_label
    )));
    blocks.push(Block::heading(3, "1. Regulatory Compliance"));
    blocks.push(Block::paragraph(
        "The records analyzed substantially comply with FACPCE Technical Resolutions 37 and \
         41 and with ISA 315 and ISA 520.",
    ));
    blocks.push(Block::heading(3, "2. Anomaly Detection"));
    blocks.push(Block::paragraph(format!(
        "{} records show anomalous behavior and require additional review. They represent \
         {} of all records analyzed and {} of total liabilities.",
        data.total_anomalies(),
        format_percent(record_share),
        format_percent(amount_share)
    )));
    blocks.push(Block::heading(3, "3. Priority Recommendations"));
    if !data.debts.flagged.is_empty() {
        blocks.push(Block::bullet(format!(
            "Review and update the supporting documentation of debts {}",
            id_list(&data.debts)
        )));
    }
    if !data.provisions.flagged.is_empty() {
        blocks.push(Block::bullet(format!(
            "Reassess the calculation basis of provisions {}",
            id_list(&data.provisions)
        )));
    }
    blocks.push(Block::bullet(
        "Implement automated controls for periodic interest rate updates",
    ));
    blocks.push(Block::bullet(
        "Establish a quarterly review of provisions older than 24 months",
    ));
    blocks.push(Block::heading(3, "4. Technical Opinion"));
    blocks.push(Block::paragraph(
        "In our professional opinion, and subject to the review of the detected anomalies, \
         non-current liabilities are fairly presented in all material respects in \
         accordance with current Argentine professional accounting standards.",
    ));
}

fn id_list(section: &ReportSection) -> String {
    section
        .flagged
        .iter()
        .map(|record| record.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn signature(blocks: &mut Vec<Block>) {
    blocks.push(Block::paragraph("________________________________"));
    blocks.push(Block::paragraph(RESPONSIBLE_PARTY));
    blocks.push(Block::paragraph("Systems and Controls Audit"));
}

#[cfg(test)]
mod tests {
    use super::{anomaly_shares, document, Block};
    use crate::report::{FlaggedRecord, ReportData, ReportSection, SectionTotals};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn sample() -> ReportData {
        let mut debts = ReportSection::empty();
        debts.totals = SectionTotals {
            count: 10,
            amount: Decimal::new(1_000_000, 0),
        };
        debts.anomaly_count = 1;
        debts.flagged.push(FlaggedRecord {
            id: "LTD-50003".to_string(),
            label: "Issued Bonds".to_string(),
            amount: Decimal::new(250_000, 0),
        });
        let mut provisions = ReportSection::empty();
        provisions.totals = SectionTotals {
            count: 10,
            amount: Decimal::new(1_000_000, 0),
        };
        ReportData {
            period_label: "Fiscal Year 2024".to_string(),
            issued_on: NaiveDate::from_ymd_opt(2024, 12, 31).expect("valid date"),
            debts,
            provisions,
        }
    }

    #[test]
    fn shares_cover_records_and_amounts() {
        let (records, amount) = anomaly_shares(&sample());
        assert!((records - 5.0).abs() < 1e-9);
        assert!((amount - 12.5).abs() < 1e-9);
    }

    #[test]
    fn empty_breakdowns_become_paragraphs() {
        let blocks = document(&sample());
        assert!(!blocks.iter().any(|block| matches!(block, Block::Table(t) if t.rows.is_empty())));
        assert!(blocks.contains(&Block::Paragraph(
            "No type breakdown is available for this period.".to_string()
        )));
        assert!(matches!(&blocks[0], Block::Heading { level: 1, .. }));
    }
}
