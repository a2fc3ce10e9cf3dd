//! Plain-text and JSON rendering of reports

use crate::{
    aggregator::AggregatedPageData, breakdown::BreakdownEntry, category::CategoryGroup,
    dashboard::DashboardReport,
};
use serde::{Deserialize, Serialize};
use std::{fmt, fmt::Write as _, str::FromStr};
use utmdash_common::{
    format_count, format_diff, format_rate, truncate_string, DashError, MappingEntry, Result,
};

const NAME_WIDTH: usize = 28;
const CELL_WIDTH: usize = 11;

/// Metric shown in the daily grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMetric {
    /// Sessions
    #[default]
    Sessions,
    /// Users
    Users,
    /// Page views
    Pageviews,
    /// Engagement rate
    Engagement,
}

impl DisplayMetric {
    /// CLI spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Users => "users",
            Self::Pageviews => "pageviews",
            Self::Engagement => "engagement",
        }
    }
}

impl fmt::Display for DisplayMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMetric {
    type Err = DashError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sessions" => Ok(Self::Sessions),
            "users" => Ok(Self::Users),
            "pageviews" | "views" => Ok(Self::Pageviews),
            "engagement" => Ok(Self::Engagement),
            other => Err(DashError::validation_field(
                format!("unknown metric '{other}', expected sessions, users, pageviews or engagement"),
                "metric",
            )),
        }
    }
}

/// Renders the report as indented text tables.
pub fn render_table(report: &DashboardReport, metric: DisplayMetric) -> String {
    let mut out = String::new();
    let options = &report.options;
    let campaign = if options.campaign.is_empty() {
        "all campaigns"
    } else {
        options.campaign.as_str()
    };
    let _ = writeln!(out, "{} traffic, {} ({})", options.platform, options.range, campaign);

    if let Some(headlines) = &report.headlines {
        let _ = writeln!(
            out,
            "Yesterday ({}): {} sessions ({} vs {})",
            headlines.daily.date,
            format_count(headlines.daily.sessions),
            format_diff(headlines.daily.diff),
            format_count(headlines.daily.prev_sessions)
        );
        let _ = writeln!(
            out,
            "Last week ({}): {} sessions ({} vs {})",
            headlines.weekly.range,
            format_count(headlines.weekly.sessions),
            format_diff(headlines.weekly.diff),
            format_count(headlines.weekly.prev_sessions)
        );
    }

    let stats = &report.stats;
    let _ = writeln!(
        out,
        "Sessions {} | Users {} | Pageviews {} | Returning {} | Identified {} | Avg engagement {}",
        format_count(stats.sessions),
        format_count(stats.users),
        format_count(stats.pageviews),
        format_count(stats.recurring_users),
        format_count(stats.identified_users),
        format_rate(stats.average_engagement())
    );
    let coverage = &report.coverage;
    if coverage.unmapped_sessions > 0 {
        let _ = writeln!(
            out,
            "Unmapped traffic: {} of {} sessions ({:.1}%)",
            format_count(coverage.unmapped_sessions),
            format_count(coverage.raw_sessions),
            coverage.leakage_percent
        );
        if coverage.rejected_sessions > 0 {
            let _ = writeln!(
                out,
                "  incl. {} sessions from rows that could not be read",
                format_count(coverage.rejected_sessions)
            );
        }
    }
    out.push('\n');

    if report.pages.is_empty() {
        out.push_str("No traffic in this range.\n");
        return out;
    }

    render_grid(&mut out, report, metric);
    render_breakdown(&mut out, "Top countries", &report.countries);
    render_breakdown(&mut out, "Gender", &report.genders);
    out
}

fn render_grid(out: &mut String, report: &DashboardReport, metric: DisplayMetric) {
    let _ = write!(out, "{:<NAME_WIDTH$}{:>CELL_WIDTH$}", metric.as_str().to_uppercase(), "TOTAL");
    for date in &report.date_headers {
        let _ = write!(out, "{:>CELL_WIDTH$}", date.format("%m-%d").to_string());
    }
    out.push('\n');

    for group in &report.categories {
        let _ = write!(
            out,
            "{:<NAME_WIDTH$}{:>CELL_WIDTH$}",
            truncate_string(&group.category, NAME_WIDTH - 1),
            category_total(group, metric)
        );
        for date in &report.date_headers {
            let cell = group
                .day(*date)
                .map_or_else(|| "-".to_string(), |day| match metric {
                    DisplayMetric::Sessions => format_count(day.sessions),
                    DisplayMetric::Users => format_count(day.users),
                    DisplayMetric::Pageviews => format_count(day.pageviews),
                    DisplayMetric::Engagement => format_rate(day.engagement()),
                });
            let _ = write!(out, "{cell:>CELL_WIDTH$}");
        }
        out.push('\n');

        for page in &group.pages {
            let name = format!("  {}", truncate_string(&page.page_name, NAME_WIDTH - 3));
            let _ = write!(out, "{name:<NAME_WIDTH$}{:>CELL_WIDTH$}", page_total(page, metric));
            for date in &report.date_headers {
                let cell = page
                    .daily_trend
                    .iter()
                    .find(|day| day.date == *date)
                    .map_or_else(|| "-".to_string(), |day| match metric {
                        DisplayMetric::Sessions => format_count(day.counts.sessions),
                        DisplayMetric::Users => format_count(day.counts.users),
                        DisplayMetric::Pageviews => format_count(day.counts.pageviews),
                        DisplayMetric::Engagement => format_rate(day.engagement_rate),
                    });
                let _ = write!(out, "{cell:>CELL_WIDTH$}");
            }
            out.push('\n');
        }
    }
}

fn category_total(group: &CategoryGroup, metric: DisplayMetric) -> String {
    match metric {
        DisplayMetric::Sessions => format_count(group.sessions),
        DisplayMetric::Users => format_count(group.users),
        DisplayMetric::Pageviews => format_count(group.pageviews),
        DisplayMetric::Engagement => format_rate(group.engagement()),
    }
}

fn page_total(page: &AggregatedPageData, metric: DisplayMetric) -> String {
    let counts = &page.totals.counts;
    match metric {
        DisplayMetric::Sessions => format_count(counts.sessions),
        DisplayMetric::Users => format_count(counts.users),
        DisplayMetric::Pageviews => format_count(counts.pageviews),
        DisplayMetric::Engagement => format_rate(page.totals.engagement_rate_avg),
    }
}

fn render_breakdown(out: &mut String, title: &str, entries: &[BreakdownEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}");
    for entry in entries {
        let _ = writeln!(
            out,
            "  {:<24}{:>10}{:>8.1}%",
            truncate_string(&entry.label, 23),
            format_count(entry.sessions),
            entry.percent
        );
    }
}

/// Renders the report as pretty JSON.
pub fn render_json(report: &DashboardReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Renders the mapping table, one entry per line.
pub fn render_mappings(entries: &[MappingEntry]) -> String {
    if entries.is_empty() {
        return "No page mappings.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{:>6}  {:<10}{:<20}{:<28}MEDIUMS", "ID", "PLATFORM", "CATEGORY", "PAGE");
    for entry in entries {
        let id = entry.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let _ = writeln!(
            out,
            "{id:>6}  {:<10}{:<20}{:<28}{}",
            entry.platform.as_str(),
            truncate_string(entry.category_or_default(), 19),
            truncate_string(&entry.page_name, 27),
            entry.utm_mediums.join(", ")
        );
    }
    out
}
