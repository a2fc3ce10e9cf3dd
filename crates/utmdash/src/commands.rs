//! Command implementations
//!
//! Each command writes its result to the given writer so it can be exercised
//! without a terminal; only `execute` touches stdin and stdout.

use crate::cli::{AddMappingArgs, Command, ConfigCommand, MappingsCommand, OutputFormat, RangeArgs, ReportArgs};
use crate::error::{AppError, AppResult};
use chrono::{Local, NaiveDate};
use std::{
    io::{self, BufRead, Write},
    path::Path,
};
use tracing::{info, warn};
use utmdash_common::{AnalyticsClient, DateRange, MappingId, NewMapping};
use utmdash_config::{Config, ConfigFormat, ConfigLoader};
use utmdash_report::{
    default_range, render_json, render_mappings, render_table, DisplayMetric, LoadOutcome,
    MetricsSource, ReportManager, ReportOptions,
};

/// Picks the date range: explicit dates, then a preset, then the default.
pub fn resolve_range(args: &RangeArgs, today: NaiveDate) -> AppResult<DateRange> {
    match (args.start, args.end, args.preset) {
        (Some(start), Some(end), _) => {
            if start > end {
                return Err(AppError::Usage(format!(
                    "start date {start} is after end date {end}"
                )));
            }
            Ok(DateRange::new(start, end))
        }
        (None, None, Some(preset)) => Ok(preset.range(today)),
        (None, None, None) => Ok(default_range(today)),
        _ => Err(AppError::Usage(
            "--start and --end must be given together".to_string(),
        )),
    }
}

/// Report options from flags, falling back to configuration.
pub fn report_options(
    range: &RangeArgs,
    campaign: Option<&str>,
    config: &Config,
    today: NaiveDate,
) -> AppResult<ReportOptions> {
    let options = ReportOptions::new(
        resolve_range(range, today)?,
        range.platform.unwrap_or(config.report.platform),
    )
    .with_merge_policy(config.report.merge_policy)
    .with_country_limit(config.report.country_limit)
    .with_campaign(campaign.unwrap_or_default());
    Ok(options)
}

/// Loads and prints a report.
pub async fn run_report<S, W>(
    manager: &ReportManager<S>,
    options: ReportOptions,
    format: OutputFormat,
    metric: DisplayMetric,
    out: &mut W,
) -> AppResult<()>
where
    S: MetricsSource,
    W: Write,
{
    let snapshot = match manager.reload(options).await {
        LoadOutcome::Committed(snapshot) => snapshot,
        LoadOutcome::Superseded { ticket } => {
            return Err(AppError::Usage(format!("report load {ticket} was superseded")));
        }
    };
    if snapshot.rejected_rows > 0 {
        warn!("{} malformed rows were skipped", snapshot.rejected_rows);
    }

    let rendered = match format {
        OutputFormat::Table => render_table(&snapshot.report, metric),
        OutputFormat::Json => render_json(&snapshot.report)?,
    };
    out.write_all(rendered.as_bytes())?;
    if !rendered.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

/// Prints the campaigns present in the range, one per line.
pub async fn run_campaigns<S, W>(manager: &ReportManager<S>, options: ReportOptions, out: &mut W) -> AppResult<()>
where
    S: MetricsSource,
    W: Write,
{
    if let Some(snapshot) = manager.reload(options).await.snapshot() {
        if snapshot.report.campaigns.is_empty() {
            writeln!(out, "No campaigns in this range.")?;
        }
        for campaign in &snapshot.report.campaigns {
            writeln!(out, "{campaign}")?;
        }
    }
    Ok(())
}

/// Prints the mapping table.
pub async fn run_mappings_list<W: Write>(client: &AnalyticsClient, out: &mut W) -> AppResult<()> {
    let entries = client.list_mappings().await?;
    out.write_all(render_mappings(&entries).as_bytes())?;
    Ok(())
}

/// Validates and submits a new mapping entry.
///
/// Nothing is sent when the page name or the medium list is empty.
pub async fn run_mappings_add<W: Write>(
    client: &AnalyticsClient,
    args: AddMappingArgs,
    config: &Config,
    out: &mut W,
) -> AppResult<()> {
    let entry = NewMapping {
        category: args.category,
        platform: args.platform.unwrap_or(config.report.platform),
        page_name: args.page_name,
        utm_source: args.utm_source,
        mediums: args.mediums,
    }
    .into_entry()?;

    let created = client.create_mapping(&entry).await?;
    info!("Created mapping for {}", created.page_name);
    let id = created.id.map_or_else(|| "-".to_string(), |id| id.to_string());
    writeln!(
        out,
        "Added mapping {id}: {} ({}) <- {}",
        created.page_name,
        created.category_or_default(),
        created.utm_mediums.join(", ")
    )?;
    Ok(())
}

/// Deletes a mapping entry after confirmation. There is no undo.
pub async fn run_mappings_delete<R, W>(
    client: &AnalyticsClient,
    id: MappingId,
    assume_yes: bool,
    input: &mut R,
    out: &mut W,
) -> AppResult<()>
where
    R: BufRead,
    W: Write,
{
    if !assume_yes && !confirm(&format!("Delete mapping {id}? This cannot be undone."), input, out)? {
        writeln!(out, "Cancelled.")?;
        return Ok(());
    }

    client.delete_mapping(id).await?;
    info!("Deleted mapping {}", id);
    writeln!(out, "Deleted mapping {id}.")?;
    Ok(())
}

fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> AppResult<bool> {
    write!(out, "{prompt} [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Prints the effective configuration as TOML with the API key masked.
pub fn run_config_show<W: Write>(config: &Config, out: &mut W) -> AppResult<()> {
    let text = ConfigLoader::render(&config.redacted(), ConfigFormat::Toml)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// Writes a default configuration file.
pub fn run_config_init<W: Write>(path: &Path, force: bool, out: &mut W) -> AppResult<()> {
    if path.exists() && !force {
        return Err(AppError::Usage(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )));
    }
    ConfigLoader::save(path, &Config::default())?;
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

/// Runs a parsed command against stdin and stdout.
pub async fn execute(command: Command, config: &Config) -> AppResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let today = Local::now().date_naive();

    match command {
        Command::Report(ReportArgs {
            range,
            campaign,
            merge,
            format,
            metric,
        }) => {
            let mut options = report_options(&range, campaign.as_deref(), config, today)?;
            if let Some(merge) = merge {
                options = options.with_merge_policy(merge);
            }
            let manager = ReportManager::new(client(config)?);
            run_report(&manager, options, format, metric, &mut out).await
        }
        Command::Campaigns(range) => {
            let options = report_options(&range, None, config, today)?;
            let manager = ReportManager::new(client(config)?);
            run_campaigns(&manager, options, &mut out).await
        }
        Command::Mappings(MappingsCommand::List) => run_mappings_list(&client(config)?, &mut out).await,
        Command::Mappings(MappingsCommand::Add(args)) => {
            run_mappings_add(&client(config)?, args, config, &mut out).await
        }
        Command::Mappings(MappingsCommand::Delete { id, yes }) => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            run_mappings_delete(&client(config)?, MappingId(id), yes, &mut input, &mut out).await
        }
        Command::Config(ConfigCommand::Show) => run_config_show(config, &mut out),
        Command::Config(ConfigCommand::Init { path, force }) => run_config_init(&path, force, &mut out),
    }
}

fn client(config: &Config) -> AppResult<AnalyticsClient> {
    Ok(AnalyticsClient::new(config.api.to_api_config())?)
}
