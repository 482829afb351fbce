//! Markdown and JSON report generation.
//!
//! This module renders view outcomes as tables. Charts are left to whatever
//! consumes the JSON output.

use crate::analysis::{active_days, top_operators};
use crate::models::{
    AggregationResult, NoDataReason, OperatorSelection, RankingResult, Report, ReportMetadata,
    TimeSeriesResult, ViewOutcome, ViewSection,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Productivity Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(&report.sections));

    for section in &report.sections {
        output.push_str(&generate_view_section(section));
    }

    output.push_str(&generate_operators_section(&report.known_operators));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();
    let filters = &metadata.filters;

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Date Range:** {} to {}\n",
        filters.range.start(),
        filters.range.end()
    ));

    let categories: Vec<&str> = filters.categories.iter().map(|c| c.label()).collect();
    let categories = if categories.is_empty() {
        "(none)".to_string()
    } else {
        categories.join(", ")
    };
    section.push_str(&format!("- **Legalization Types:** {}\n", categories));

    let operators = match &filters.operators {
        OperatorSelection::All => "All".to_string(),
        OperatorSelection::Only(names) => names.iter().cloned().collect::<Vec<_>>().join(", "),
    };
    section.push_str(&format!("- **Operators:** {}\n", operators));

    let sources: Vec<String> = metadata
        .loaded_sources
        .iter()
        .map(|s| s.to_string())
        .collect();
    let sources = if sources.is_empty() {
        "(none)".to_string()
    } else {
        sources.join(", ")
    };
    section.push_str(&format!("- **Loaded Sources:** {}\n", sources));
    section.push_str(&format!(
        "- **Data:** {}\n",
        if metadata.synchronized {
            "synchronized this run"
        } else {
            "from cache"
        }
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(sections: &[ViewSection]) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    for section in sections {
        toc.push_str(&format!("- [{}](#{})\n", section.title, anchor(&section.title)));
    }
    toc.push_str("- [Operators](#operators)\n\n");

    toc
}

fn anchor(title: &str) -> String {
    title.replace(' ', "-").to_lowercase()
}

/// Generate the section for one view.
fn generate_view_section(view: &ViewSection) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", view.title));

    match &view.outcome {
        ViewOutcome::NoData {
            reason: NoDataReason::NotSynchronized,
        } => {
            section.push_str(&format!(
                "> ℹ️ No data loaded for {}. Run with `--sync` to synchronize.\n\n",
                view.title
            ));
        }
        ViewOutcome::NoData {
            reason: NoDataReason::NoRows,
        } => {
            section.push_str(&format!(
                "> ℹ️ The {} source is synchronized but has no rows.\n\n",
                view.title
            ));
        }
        ViewOutcome::CannotProcess { reason } => {
            section.push_str(&format!(
                "> ⛔ {} cannot be processed: {}\n\n",
                view.title, reason
            ));
        }
        ViewOutcome::EmptyAfterFilter => {
            section.push_str(&format!(
                "> ⚠️ No {} records match the current filters.\n\n",
                view.title
            ));
        }
        ViewOutcome::Ready(report) => {
            section.push_str(&format!(
                "**Total Records ({}):** {}\n\n",
                view.title, report.total_records
            ));
            match &report.result {
                AggregationResult::Ranking(ranking) => {
                    section.push_str(&generate_ranking_table(ranking));
                }
                AggregationResult::TimeSeries(series) => {
                    section.push_str(&generate_time_series_tables(series));
                }
            }
        }
    }

    section
}

/// Ranking table with counts and shares.
fn generate_ranking_table(ranking: &RankingResult) -> String {
    let mut table = String::new();

    table.push_str("### Overall Productivity\n\n");
    if let Some(leader) = top_operators(ranking, 1).first() {
        table.push_str(&format!(
            "Top operator: **{}** with {} records ({:.2}%).\n\n",
            leader.operator, leader.count, leader.percentage
        ));
    }

    table.push_str(&format!(
        "*{} records attributed to an operator*\n\n",
        ranking.total()
    ));
    table.push_str("| # | Operator | Count | % |\n");
    table.push_str("|---:|:---|---:|---:|\n");
    for (i, row) in ranking.rows.iter().enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} | {:.2}% |\n",
            i + 1,
            escape_cell(&row.operator),
            row.count,
            row.percentage
        ));
    }
    table.push('\n');

    table
}

/// Daily comparison table followed by the per-operator summary.
fn generate_time_series_tables(series: &TimeSeriesResult) -> String {
    let mut tables = String::new();

    tables.push_str("### Daily Comparison\n\n");
    if series.series.is_empty() {
        tables.push_str("*This source has no date column; no daily breakdown available.*\n\n");
    } else {
        tables.push_str(&format!("*{} active days*\n\n", active_days(series)));
        tables.push_str("| Day | Operator | Count |\n");
        tables.push_str("|:---|:---|---:|\n");
        for point in &series.series {
            tables.push_str(&format!(
                "| {} | {} | {} |\n",
                point.day,
                escape_cell(&point.operator),
                point.count
            ));
        }
        tables.push('\n');
    }

    tables.push_str("### Selected Operators Summary\n\n");
    tables.push_str("| Operator | Total |\n");
    tables.push_str("|:---|---:|\n");
    for total in &series.summary {
        tables.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&total.operator),
            total.total
        ));
    }
    tables.push('\n');

    tables
}

/// Operator names are free text; a bare `|` would split the cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// List of every operator seen in the loaded data.
fn generate_operators_section(operators: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Operators\n\n");
    if operators.is_empty() {
        section.push_str("No operators found in the loaded data.\n\n");
        return section;
    }

    for operator in operators {
        section.push_str(&format!("- {}\n", operator));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by prodreport v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
