//! Command line arguments

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use utmdash_common::{EngagementMerge, LogFormat, Platform};
use utmdash_config::Config;
use utmdash_report::{DisplayMetric, RangePreset};

/// UTM traffic dashboard for social page campaigns
#[derive(Parser, Debug)]
#[command(name = "utmdash", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "utmdash_report=trace"
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies global flags on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the traffic report for a date range
    Report(ReportArgs),
    /// List the campaigns present in a date range
    Campaigns(RangeArgs),
    /// Manage the page-mapping table
    #[command(subcommand)]
    Mappings(MappingsCommand),
    /// Inspect or create configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Date range and platform selection
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeArgs {
    /// Platform: facebook or threads (defaults to the configured one)
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// First day, YYYY-MM-DD
    #[arg(long, requires = "end", conflicts_with = "preset")]
    pub start: Option<NaiveDate>,

    /// Last day, YYYY-MM-DD
    #[arg(long, requires = "start", conflicts_with = "preset")]
    pub end: Option<NaiveDate>,

    /// Quick range: last-7-days, last-30-days, prev-week, this-month
    #[arg(long)]
    pub preset: Option<RangePreset>,
}

/// Arguments of `report`
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Range selection
    #[command(flatten)]
    pub range: RangeArgs,

    /// Only count traffic of this campaign (exact match)
    #[arg(long)]
    pub campaign: Option<String>,

    /// Engagement merge policy: pairwise or mean
    #[arg(long)]
    pub merge: Option<EngagementMerge>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Metric shown in the daily grid
    #[arg(short, long, default_value = "sessions")]
    pub metric: DisplayMetric,
}

/// Report output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Text tables
    #[default]
    Table,
    /// Pretty JSON
    Json,
}

/// Mapping table commands
#[derive(Subcommand, Debug, Clone)]
pub enum MappingsCommand {
    /// List every mapping entry
    List,
    /// Map UTM mediums to a page
    Add(AddMappingArgs),
    /// Delete a mapping entry by id
    Delete {
        /// Entry id as shown by `mappings list`
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments of `mappings add`
#[derive(Args, Debug, Clone)]
pub struct AddMappingArgs {
    /// Page display name
    #[arg(long)]
    pub page_name: String,

    /// Comma separated UTM mediums, e.g. "uss_page_1, uss_page_2"
    #[arg(long)]
    pub mediums: String,

    /// Category; "Uncategorized" when omitted
    #[arg(long)]
    pub category: Option<String>,

    /// Platform: facebook or threads (defaults to the configured one)
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// UTM source; derived from the platform when omitted
    #[arg(long)]
    pub utm_source: Option<String>,
}

/// Configuration commands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets masked
    Show,
    /// Write a default configuration file
    Init {
        /// Destination file
        #[arg(default_value = "utmdash.toml")]
        path: PathBuf,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}
