//! CLI definition, dispatch and the update/bootstrap pipelines.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::directory_upload_adapter::DirectoryUploadAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_file_adapter::JsonFileAdapter;
use crate::adapters::log_adapter::LogCrateAdapter;
use crate::adapters::state_log_adapter::StateLogAdapter;
use crate::adapters::statement_adapter::StatementAdapter;
use crate::domain::error::TickerError;
use crate::domain::history::{History, MergeStats};
use crate::domain::normalize::normalize;
use crate::domain::report::{ReportOptions, ReportPayload, build_payload};
use crate::domain::settings::{TickerSettings, UploadProtocol, build_settings};
use crate::ports::history_port::HistoryPort;
use crate::ports::log_port::LogPort;
use crate::ports::report_port::ReportPort;
use crate::ports::source_port::{StateLogPort, StatementPort};
use crate::ports::upload_port::UploadPort;

#[derive(Parser, Debug)]
#[command(name = "webticker", about = "Trading history merge and dashboard payload builder")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge new state log entries and rebuild the dashboard payload
    Update {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        state_log: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        marker_output: Option<PathBuf>,
        #[arg(long)]
        force_upload: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// Build a fresh history from an account statement and the state log
    Bootstrap {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        statement: Option<PathBuf>,
        #[arg(long)]
        state_log: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        skip_update: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let log = LogCrateAdapter;
    match cli.command {
        Command::Update {
            config,
            state_log,
            output,
            marker_output,
            force_upload,
            pretty,
        } => {
            let mut settings = match load_settings(&config, &log) {
                Ok(s) => s,
                Err(code) => return code,
            };
            apply_overrides(&mut settings, state_log, output);
            if let Some(marker) = marker_output {
                settings.marker_path = marker;
            }
            settings.pretty |= pretty;
            if force_upload {
                settings.upload.enabled = true;
            }
            report_result(run_update(&settings, &log), &log)
        }
        Command::Bootstrap {
            config,
            statement,
            state_log,
            output,
            skip_update,
        } => {
            let mut settings = match load_settings(&config, &log) {
                Ok(s) => s,
                Err(code) => return code,
            };
            apply_overrides(&mut settings, state_log, output);
            if statement.is_some() {
                settings.initial_statement = statement;
            }
            let result = run_bootstrap(&settings, &log).and_then(|()| {
                if skip_update {
                    return Ok(());
                }
                settings.pretty = true;
                run_update(&settings, &log)
            });
            report_result(result, &log)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TickerError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Settings from the config file, with relative paths resolved against the
/// file's directory.
pub fn load_settings(path: &Path, log: &dyn LogPort) -> Result<TickerSettings, ExitCode> {
    log.debug(&format!("loading config from {}", path.display()));
    let config = load_config(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    build_settings(&config, base_dir).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn apply_overrides(
    settings: &mut TickerSettings,
    state_log: Option<PathBuf>,
    output: Option<PathBuf>,
) {
    if let Some(path) = state_log {
        settings.state_log = path;
    }
    if let Some(path) = output {
        settings.output_json = path;
    }
}

fn report_result(result: Result<(), TickerError>, log: &dyn LogPort) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&e.to_string());
            (&e).into()
        }
    }
}

/// The upload collaborator for these settings, if uploads are on and the
/// transport is one this crate performs itself.
pub fn select_uploader(
    settings: &TickerSettings,
    log: &dyn LogPort,
) -> Option<DirectoryUploadAdapter> {
    if !settings.upload.enabled {
        return None;
    }
    match settings.upload.protocol {
        UploadProtocol::Directory => Some(DirectoryUploadAdapter::from_settings(&settings.upload)),
        UploadProtocol::Ftp => {
            log.info("ftp upload is handled by the external transport, skipping");
            None
        }
    }
}

fn run_update(settings: &TickerSettings, log: &dyn LogPort) -> Result<(), TickerError> {
    let state_log = StateLogAdapter::new(settings.locate_state_log());
    let store = JsonFileAdapter::new(settings.output_json.clone())
        .with_marker(settings.marker_path.clone())
        .pretty(settings.pretty);
    let uploader = select_uploader(settings, log);
    run_update_pipeline(
        &state_log,
        &store,
        &store,
        uploader.as_ref().map(|u| u as &dyn UploadPort),
        &settings.report,
        Utc::now(),
        log,
    )?;
    Ok(())
}

fn run_bootstrap(settings: &TickerSettings, log: &dyn LogPort) -> Result<(), TickerError> {
    let statement_path = settings
        .initial_statement
        .clone()
        .ok_or_else(|| TickerError::ConfigMissing {
            section: "web_ticker".into(),
            key: "initial_statement".into(),
        })?;
    let statement = StatementAdapter::new(statement_path);
    let state_log = StateLogAdapter::new(settings.locate_state_log());
    let store = JsonFileAdapter::new(settings.output_json.clone());
    run_bootstrap_pipeline(&statement, Some(&state_log as &dyn StateLogPort), &store, log)?;
    Ok(())
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub stats: MergeStats,
    pub payload: ReportPayload,
    pub files: Vec<(String, PathBuf)>,
}

/// Load the history, merge the state log into it, and publish the payload.
///
/// All inputs are read and parsed before anything is written, so a fatal
/// input error leaves the published files untouched.
pub fn run_update_pipeline(
    state_log: &dyn StateLogPort,
    history_store: &dyn HistoryPort,
    report: &dyn ReportPort,
    uploader: Option<&dyn UploadPort>,
    options: &ReportOptions,
    now: DateTime<Utc>,
    log: &dyn LogPort,
) -> Result<UpdateOutcome, TickerError> {
    let mut history = history_store.load(log);
    let records = state_log.read_records(log)?;
    let normalized = normalize(&records);
    if !normalized.ignored.is_empty() {
        log.debug(&format!(
            "ignored {} records of other types (lines {:?})",
            normalized.ignored.len(),
            normalized.ignored
        ));
    }

    let stats = history.merge(&normalized.trades, &normalized.snapshots);
    log.info(&format!(
        "merged {} new trades ({} skipped), {} new snapshots ({} skipped)",
        stats.trades_added, stats.trades_skipped, stats.snapshots_added, stats.snapshots_skipped
    ));

    let payload = build_payload(&history, options, now);
    let files = report.publish(&payload)?;
    for (label, path) in &files {
        log.info(&format!("wrote {label} to {}", path.display()));
    }

    if let Some(uploader) = uploader {
        uploader.upload(&files, log)?;
    }
    log.info(&format!("ticker updated (trades={})", payload.overall.trades));
    Ok(UpdateOutcome {
        stats,
        payload,
        files,
    })
}

/// Build a fresh history from the statement plus the optional state log and
/// store it, replacing whatever was stored before.
pub fn run_bootstrap_pipeline(
    statement: &dyn StatementPort,
    state_log: Option<&dyn StateLogPort>,
    history_store: &dyn HistoryPort,
    log: &dyn LogPort,
) -> Result<History, TickerError> {
    let statement_trades = statement.read_trades(log)?;

    let normalized = match state_log {
        Some(source) => normalize(&source.read_records(log)?),
        None => Default::default(),
    };
    log.info(&format!(
        "state log: {} trades, {} snapshots",
        normalized.trades.len(),
        normalized.snapshots.len()
    ));

    let (history, stats) = History::bootstrap(
        &[statement_trades, normalized.trades],
        &normalized.snapshots,
    );
    history_store.store(&history)?;
    log.info(&format!(
        "history stored (trades={}, snapshots={})",
        stats.trades_added, stats.snapshots_added
    ));
    Ok(history)
}
