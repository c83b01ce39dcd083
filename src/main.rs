// src/main.rs

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};

use scano::api;
use scano::core::config::ScanConfig;
use scano::core::error::ScanError;
use scano::core::geoip::{GeoIpLookup, MaxMindGeoIp, StaticGeoIp};
use scano::core::models::ScanReport;
use scano::core::scanner::Scanner;
use scano::logging::{LogSink, initialize_logging};
use scano::report::{render_pdf, render_text};

mod app;
mod ui;

use app::{App, AppState};

type ScanOutcome = std::result::Result<ScanReport, ScanError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Web security posture scanner.
///
/// Without `--scan` or `--serve` it starts the interactive terminal front end.
#[derive(Debug, Parser)]
#[command(name = "scano", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SCANO_CONFIG")]
    config: Option<PathBuf>,

    /// Run the HTTP API instead of the terminal front end.
    #[arg(long, conflicts_with = "scan")]
    serve: bool,

    /// Address for `--serve`; overrides `server.listen_addr`.
    #[arg(long, requires = "serve")]
    listen: Option<String>,

    /// Scan a single target and print the report.
    #[arg(long, value_name = "TARGET")]
    scan: Option<String>,

    /// Output format for `--scan`.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Also write the rendered PDF to this file.
    #[arg(long, value_name = "FILE", requires = "scan")]
    pdf: Option<PathBuf>,

    /// Enable the sensitive endpoint probe.
    #[arg(long)]
    probe_paths: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let headless = cli.serve || cli.scan.is_some();
    initialize_logging(if headless { LogSink::Stderr } else { LogSink::File })?;

    let mut config = ScanConfig::load(cli.config.as_deref()).wrap_err("failed to load configuration")?;
    if cli.probe_paths {
        config.endpoint_probe.enabled = true;
    }
    let listen = cli.listen.clone().unwrap_or_else(|| config.server.listen_addr.clone());

    let geoip: Arc<dyn GeoIpLookup> = match MaxMindGeoIp::open(&config.geoip) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            warn!(error = %e, "GeoIP databases unavailable, locations will be reported as Unknown.");
            Arc::new(StaticGeoIp::new())
        }
    };
    let scanner = Arc::new(Scanner::new(config, geoip).wrap_err("failed to build HTTP client")?);

    if cli.serve {
        api::serve(scanner, &listen).await.wrap_err_with(|| format!("API server on {listen} failed"))?;
        return Ok(());
    }

    if let Some(target) = cli.scan.as_deref() {
        return run_headless(&scanner, target, cli.format, cli.pdf.as_deref()).await;
    }

    run_tui(scanner).await
}

async fn run_headless(
    scanner: &Scanner,
    target: &str,
    format: OutputFormat,
    pdf: Option<&std::path::Path>,
) -> Result<()> {
    let report = scanner.scan(target).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_text(&report)),
    }

    if let Some(path) = pdf {
        let bytes = render_pdf(&report)?;
        std::fs::write(path, bytes).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "PDF report written.");
    }
    Ok(())
}

async fn run_tui(scanner: Arc<Scanner>) -> Result<()> {
    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = event_loop(&mut terminal, scanner).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, scanner: Arc<Scanner>) -> Result<()> {
    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<ScanOutcome>(1);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, &scanner, &tx);
                }
            }
        }

        if let Ok(outcome) = rx.try_recv() {
            app.finish_scan(outcome);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_key(app: &mut App, key_code: KeyCode, scanner: &Arc<Scanner>, tx: &mpsc::Sender<ScanOutcome>) {
    match app.state {
        AppState::Disclaimer => match key_code {
            KeyCode::Enter => app.state = AppState::Idle,
            KeyCode::Char('q') | KeyCode::Esc => app.quit(),
            _ => {}
        },
        AppState::Idle => handle_idle_input(app, key_code, scanner, tx),
        AppState::Scanning => {
            if key_code == KeyCode::Char('q') {
                app.quit();
            }
        }
        AppState::Finished => handle_finished_input(app, key_code),
        AppState::Rejected(_) => match key_code {
            KeyCode::Char('q') => app.quit(),
            KeyCode::Char('n') | KeyCode::Enter => app.reset(),
            _ => {}
        },
    }
}

/// Typing into the target box; Enter starts the scan in the background.
fn handle_idle_input(app: &mut App, key_code: KeyCode, scanner: &Arc<Scanner>, tx: &mpsc::Sender<ScanOutcome>) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            let raw = app.input.trim().to_string();
            if raw.is_empty() {
                return;
            }
            app.state = AppState::Scanning;
            let scanner = Arc::clone(scanner);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = scanner.scan(&raw).await;
                let _ = tx.send(outcome).await;
            });
        }
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('n') => app.reset(),
        KeyCode::Char('e') => app.export_pdf(),
        KeyCode::Tab => app.toggle_view(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        _ => {}
    }
}
