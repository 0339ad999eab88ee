//! Insights report generation.
//!
//! Renders aggregated insights as Markdown or JSON for export.

use crate::models::{
    AdviceItem, AdvicePriority, DistributionSlice, InsightsReport, ReportMetadata, SummaryStats,
    TrendPoint,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &InsightsReport) -> String {
    let mut output = String::new();

    output.push_str("# Health Insights Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    output.push_str(&generate_table_of_contents());

    output.push_str(&generate_stats_section(&report.stats));

    output.push_str(&generate_trend_section(&report.insights.trend));

    output.push_str(&generate_distribution_section(&report.insights.distribution));

    output.push_str(&generate_advice_section(&report.insights.advice));

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **User:** {}\n", metadata.user_id));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **API:** {}\n", metadata.api_url));

    if !metadata.degraded_sources.is_empty() {
        section.push_str("- **Unavailable data:**\n");
        for source in &metadata.degraded_sources {
            section.push_str(&format!("  - {}\n", source));
        }
    }
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Symptom Intensity Over Time](#symptom-intensity-over-time)\n");
    toc.push_str("- [Side Effect Distribution](#side-effect-distribution)\n");
    toc.push_str("- [Advice History](#advice-history)\n\n");

    toc
}

fn generate_stats_section(stats: &SummaryStats) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Total Symptoms Logged | Active Medications | Insights This Month |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        stats.total_symptoms, stats.active_medications, stats.insights_this_month
    ));

    if let Some(change) = stats.symptom_change_pct {
        section.push_str(&format!("*{:+}% symptoms logged vs. last month*\n\n", change));
    }

    section
}

fn generate_trend_section(trend: &[TrendPoint]) -> String {
    let mut section = String::new();

    section.push_str("## Symptom Intensity Over Time\n\n");

    let Some(first) = trend.first() else {
        section.push_str("No symptom data.\n\n");
        return section;
    };

    let tags = first.tags();
    section.push_str("| Week |");
    for tag in &tags {
        section.push_str(&format!(" {} |", tag));
    }
    section.push_str("\n|:---|");
    section.push_str(&":---:|".repeat(tags.len()));
    section.push('\n');

    for point in trend {
        section.push_str(&format!("| {} |", point.bucket_label));
        for tag in &tags {
            section.push_str(&format!(" {:.1} |", point.value(tag).unwrap_or(0.0)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_distribution_section(slices: &[DistributionSlice]) -> String {
    let mut section = String::new();

    section.push_str("## Side Effect Distribution\n\n");
    section.push_str("| Side Effect | Share |\n");
    section.push_str("|:---|:---:|\n");

    for slice in slices {
        section.push_str(&format!("| {} | {}% |\n", slice.name, slice.value));
    }
    section.push('\n');

    section
}

fn generate_advice_section(advice: &[AdviceItem]) -> String {
    let mut section = String::new();

    section.push_str("## Advice History\n\n");

    if advice.is_empty() {
        section.push_str("No advice yet. Describe your symptoms to the assistant to get started.\n\n");
        return section;
    }

    for item in advice {
        section.push_str(&generate_advice_block(item));
    }

    section
}

fn generate_advice_block(item: &AdviceItem) -> String {
    let marker = match item.priority {
        AdvicePriority::High => "🔴",
        AdvicePriority::Medium => "🟡",
        AdvicePriority::Positive => "🟢",
    };

    format!(
        "#### {} {} **{}**\n\n{}\n\n---\n\n",
        item.date,
        marker,
        item.priority.badge(),
        item.advice
    )
}

fn generate_footer() -> String {
    "---\n\n*Insights are informational and not a diagnosis.*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &InsightsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
