//! Plain-text rendering of panels for the terminal.

use ncl_core::report::archive::{SearchResult, TextStats};
use ncl_core::report::format::{format_amount, format_percent};
use ncl_core::{
    AmountMetric, ArchivedReport, Breakdown, ConsolidatedSummary, CountMetric, DebtAnalysis,
    ProvisionAnalysis, Scoring,
};
use rust_decimal::Decimal;

pub fn print_debts(analysis: &DebtAnalysis) {
    println!("== Non-current debts ==");
    println!("records:              {}", analysis.total_count);
    println!("original amount:      {}", format_amount(analysis.original_total));
    println!("outstanding balance:  {}", format_amount(analysis.outstanding_total));
    println!("accrued interest:     {}", format_amount(analysis.accrued_interest_total));
    print_amounts("balance by type", &analysis.by_type);
    print_counts("records by status", &analysis.by_status);
    print_scoring(&analysis.scoring);
    for debt in &analysis.flagged {
        println!(
            "  ! {} {} ({}) {} score={:.3}",
            debt.id,
            debt.debtor_name,
            debt.debt_type,
            format_amount(debt.outstanding_balance),
            debt.score
        );
    }
    println!();
}

pub fn print_provisions(analysis: &ProvisionAnalysis) {
    println!("== Provisions ==");
    println!("records:              {}", analysis.total_count);
    println!("active:               {}", analysis.active_count);
    println!("estimated amount:     {}", format_amount(analysis.estimated_total));
    print_amounts("amount by type", &analysis.by_type);
    print_counts("records by status", &analysis.by_status);
    print_scoring(&analysis.scoring);
    for provision in &analysis.flagged {
        println!(
            "  ! {} {} [{}] {} score={:.3}",
            provision.id,
            provision.provision_type,
            provision.status,
            format_amount(provision.estimated_amount),
            provision.score
        );
    }
    println!();
}

pub fn print_consolidated(summary: &ConsolidatedSummary) {
    println!("== Consolidated ==");
    println!(
        "debts:       {:>4}  {}  {}",
        summary.debt_count,
        format_amount(summary.debt_balance),
        format_percent(summary.debt_share)
    );
    println!(
        "provisions:  {:>4}  {}  {}",
        summary.provision_count,
        format_amount(summary.provision_amount),
        format_percent(summary.provision_share)
    );
    println!(
        "total:       {:>4}  {}",
        summary.total_count,
        format_amount(summary.total_liability)
    );
}

pub fn print_archive(reports: &[ArchivedReport]) {
    if reports.is_empty() {
        println!("No archived reports.");
        return;
    }
    for report in reports {
        let year = report
            .fiscal_year
            .map_or_else(|| "-".to_string(), |year| year.to_string());
        println!("{:<28} {:<6} {}", report.file_name, year, report.title);
    }
}

pub fn print_stats(file_name: &str, stats: &TextStats) {
    println!("{file_name}");
    println!("pages:       {}", stats.pages);
    println!("words:       {}", stats.words);
    println!("characters:  {}", stats.characters);
}

pub fn print_search(result: &SearchResult) {
    println!("matches for `{}`: {}", result.term, result.matches);
    if result.matches == 0 {
        return;
    }
    for line in result.highlighted.lines().filter(|line| line.contains("**")) {
        println!("  {}", line.trim());
    }
}

fn print_amounts(title: &str, breakdown: &Breakdown<Decimal>) {
    println!("{title}:");
    match breakdown {
        Breakdown::Available(metrics) => metrics.iter().for_each(print_amount),
        Breakdown::Unavailable(missing) => println!("  unavailable: {missing}"),
    }
}

fn print_amount(metric: &AmountMetric) {
    println!(
        "  {:<24} {:>18} {:>7}",
        metric.group,
        format_amount(metric.value),
        format_percent(metric.percentage)
    );
}

fn print_counts(title: &str, breakdown: &Breakdown<u64>) {
    println!("{title}:");
    match breakdown {
        Breakdown::Available(metrics) => metrics.iter().for_each(print_count),
        Breakdown::Unavailable(missing) => println!("  unavailable: {missing}"),
    }
}

fn print_count(metric: &CountMetric) {
    println!(
        "  {:<24} {:>18} {:>7}",
        metric.group,
        metric.value,
        format_percent(metric.percentage)
    );
}

fn print_scoring(scoring: &Scoring) {
    match scoring {
        Scoring::Scored(detection) => println!(
            "anomalies:            {} of {} (threshold {:.3})",
            detection.outlier_count(),
            detection.scored.len(),
            detection.threshold
        ),
        Scoring::Skipped { reason } => println!("anomalies:            skipped ({reason})"),
    }
}
