use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use shared::{
    domain::{DestinationConfig, SourceConfig, TransferDirection, TransferStatus},
    error::ErrorCode,
    protocol::{Notice, TransferEvent},
};
use tracing_subscriber::EnvFilter;
use transfer_core::load_settings;

mod backend_bridge;
mod controller;
mod render;

use backend_bridge::commands::BackendCommand;
use controller::{
    events::{UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

#[derive(Parser, Debug)]
#[command(
    name = "transfer-console",
    about = "Simulated MSSQL <-> BigQuery transfer console"
)]
struct Cli {
    /// MSSQL database name.
    #[arg(long, default_value = "")]
    db_name: String,
    #[arg(long, default_value = "")]
    schema_name: String,
    #[arg(long, default_value = "")]
    table_name: String,
    /// MSSQL host URL, e.g. sqlserver://server.database.windows.net
    #[arg(long, default_value = "")]
    host_url: String,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,

    /// BigQuery project id.
    #[arg(long, default_value = "")]
    project_id: String,
    #[arg(long, default_value = "")]
    dataset_id: String,
    #[arg(long, default_value = "")]
    table_id: String,
    /// Service account key JSON.
    #[arg(long)]
    auth_json: Option<String>,

    /// source-to-destination or destination-to-source.
    #[arg(long, conflicts_with = "suggest")]
    direction: Option<TransferDirection>,
    /// Let the advisor pick the direction.
    #[arg(long)]
    suggest: bool,

    /// Number of back-to-back runs.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,
    /// Seed for outcome and suggestion draws.
    #[arg(long)]
    seed: Option<u64>,
    /// Settings file; defaults to ./transfer.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print transfer events as JSON lines.
    #[arg(long)]
    json: bool,
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn source_config(&self) -> SourceConfig {
        SourceConfig {
            db_name: self.db_name.clone(),
            schema_name: self.schema_name.clone(),
            table_name: self.table_name.clone(),
            host_url: self.host_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    fn destination_config(&self) -> DestinationConfig {
        DestinationConfig {
            project_id: self.project_id.clone(),
            dataset_id: self.dataset_id.clone(),
            table_id: self.table_id.clone(),
            auth_json: self.auth_json.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Finish,
}

struct ConsoleSession<W: Write> {
    out: W,
    json: bool,
    remaining_runs: u32,
    completed_runs: u32,
    failed_runs: u32,
    start_error: Option<String>,
}

impl<W: Write> ConsoleSession<W> {
    fn new(out: W, json: bool, runs: u32) -> Self {
        Self {
            out,
            json,
            remaining_runs: runs,
            completed_runs: 0,
            failed_runs: 0,
            start_error: None,
        }
    }

    fn handle(&mut self, event: UiEvent) -> Result<Flow> {
        match event {
            UiEvent::Info(message) => tracing::info!("{message}"),
            UiEvent::FieldErrors { form, errors } => {
                if let Some(block) = render::field_errors_block(form.title(), &errors) {
                    eprintln!("{block}");
                }
            }
            UiEvent::DirectionChanged {
                direction,
                suggested,
            } => {
                if suggested {
                    let notice = Notice::direction_suggested(direction);
                    writeln!(self.out, "{}", render::notice_line(&notice))?;
                } else {
                    writeln!(self.out, "Direction: {direction}.")?;
                }
            }
            UiEvent::Transfer(event) => return self.handle_transfer(event),
            UiEvent::History(entries) => {
                if !self.json {
                    writeln!(self.out, "{}", render::history_table(&entries))?;
                }
                return Ok(Flow::Finish);
            }
            UiEvent::Error(err) => {
                eprintln!("error: {}", err.message());
                if err.context() == UiErrorContext::BackendStartup {
                    self.start_error = Some(err.message().to_string());
                    return Ok(Flow::Finish);
                }
            }
            UiEvent::BackendStopped => return Ok(Flow::Finish),
        }
        Ok(Flow::Continue)
    }

    fn handle_transfer(&mut self, event: TransferEvent) -> Result<Flow> {
        if self.json {
            let line = serde_json::to_string(&event).context("failed to encode transfer event")?;
            writeln!(self.out, "{line}")?;
        }

        match event {
            TransferEvent::StatusChanged { status, error, .. } => {
                if !self.json && status != TransferStatus::Idle {
                    let headline = render::status_headline(status, error.as_deref());
                    writeln!(self.out, "{headline}")?;
                }
            }
            TransferEvent::ProgressUpdated { progress, .. } => {
                if !self.json {
                    writeln!(self.out, "{}", render::progress_line(progress))?;
                }
            }
            TransferEvent::Rejected { error } => {
                if !self.json {
                    eprintln!("error: {}", error.message);
                }
                // Incomplete configuration is followed by its notice.
                let notice_follows = error.code == ErrorCode::Validation;
                self.start_error = Some(error.message);
                if !notice_follows {
                    return Ok(Flow::Finish);
                }
            }
            TransferEvent::Notice(notice) => {
                if !self.json {
                    writeln!(self.out, "{}", render::notice_line(&notice))?;
                }
                if self.start_error.is_some() {
                    return Ok(Flow::Finish);
                }
            }
            TransferEvent::Completed { entry } => {
                self.completed_runs += 1;
                if let Some(error) = entry.error.as_deref() {
                    self.failed_runs += 1;
                    if !self.json {
                        writeln!(self.out, "Error: {error}")?;
                    }
                }
                self.remaining_runs = self.remaining_runs.saturating_sub(1);
            }
        }
        Ok(Flow::Continue)
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(seed) = cli.seed {
        settings.seed = Some(seed);
    }
    tracing::debug!(?settings, "settings loaded");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    let backend = backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let mut status = String::new();
    let mut dispatch = |cmd: BackendCommand| -> Result<()> {
        if dispatch_backend_command(&cmd_tx, cmd, &mut status) {
            Ok(())
        } else {
            Err(anyhow!(status.clone()))
        }
    };

    dispatch(BackendCommand::UpdateSource(cli.source_config()))?;
    dispatch(BackendCommand::UpdateDestination(cli.destination_config()))?;
    if cli.suggest {
        dispatch(BackendCommand::SuggestDirection)?;
    } else if let Some(direction) = cli.direction {
        dispatch(BackendCommand::SetDirection(direction))?;
    }
    dispatch(BackendCommand::StartTransfer)?;

    let mut session = ConsoleSession::new(std::io::stdout(), cli.json, cli.runs);
    let mut history_requested = false;
    while let Ok(event) = ui_rx.recv() {
        let run_finished = matches!(event, UiEvent::Transfer(TransferEvent::Completed { .. }));
        if session.handle(event)? == Flow::Finish {
            break;
        }
        if run_finished {
            if session.remaining_runs > 0 {
                dispatch(BackendCommand::StartTransfer)?;
            } else if !history_requested {
                history_requested = true;
                dispatch(BackendCommand::RequestHistory)?;
            }
        }
    }

    // A disconnected backend has already stopped.
    let _ = dispatch(BackendCommand::Shutdown);
    if backend.join().is_err() {
        tracing::error!("backend worker panicked");
    }

    if let Some(err) = session.start_error {
        return Err(anyhow!("transfer did not start: {err}"));
    }
    if session.completed_runs > 0 {
        println!(
            "{} run(s) completed, {} failed.",
            session.completed_runs, session.failed_runs
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
