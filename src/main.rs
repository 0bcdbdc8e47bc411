mod charts;
mod config;
mod dashboard;
mod history;
mod logging;
mod model;
mod network;
mod protocol;
mod render;
mod scheduler;
mod ui;

use std::{io, sync::Arc, time::Duration, time::Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::dashboard::{Dashboard, Event};
use crate::network::{DashboardApi, HttpApi};
use crate::ui::{TuiRenderer, View};

/// pktdash: terminal dashboard for a packet anomaly classifier
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// Backend base URL, overrides `api.base_url`
    #[arg(long, env = "PKTDASH_API")]
    api: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive dashboard (default)
    Watch,
    /// Fetch live data once and print a summary
    Snapshot,
    /// Show the backend's capture queue status
    Queue,
    /// Ask the backend to retrain its model
    Retrain,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading config '{}'", cli.config))?;
    if let Some(api) = cli.api {
        config.api.base_url = api;
    }
    config.validate()?;
    logging::init(&config.logging)?;

    let api: Arc<dyn DashboardApi> = Arc::new(HttpApi::new(&config.api.base_url)?);
    info!(api = %config.api.base_url, "pktdash starting");

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => run_dashboard(&config, api),
        Commands::Snapshot => print_snapshot(api.as_ref()).await,
        Commands::Queue => print_queue(api.as_ref()).await,
        Commands::Retrain => retrain_once(api.as_ref()).await,
    }
}

fn run_dashboard(config: &Config, api: Arc<dyn DashboardApi>) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let (mut dashboard, mut rx) = Dashboard::new(api, TuiRenderer::default(), config.polling.clone());
    dashboard.initialize();

    let result = event_loop(&mut terminal, &mut dashboard, &mut rx);
    if let Err(e) = &result {
        error!(error = %e, "dashboard loop failed");
    }
    dashboard.teardown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dashboard: &mut Dashboard<TuiRenderer>,
    rx: &mut UnboundedReceiver<Event>,
) -> anyhow::Result<()> {
    loop {
        while let Ok(event) = rx.try_recv() {
            dashboard.handle(event);
        }

        terminal.draw(|f| ui::draw(f, dashboard.renderer(), Instant::now()))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let event::Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let view = dashboard.renderer_mut();
        if view.editing_filter {
            match key.code {
                KeyCode::Char(c) => view.filter.push(c),
                KeyCode::Backspace => {
                    view.filter.pop();
                }
                KeyCode::Enter | KeyCode::Esc => view.editing_filter = false,
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Char('r') => {
                dashboard.poll_live_data();
            }
            KeyCode::Char('t') => dashboard.retrain_model(),
            KeyCode::Char('a') => {
                let enabled = !dashboard.auto_refresh();
                info!(enabled, "auto-refresh toggled");
                dashboard.set_auto_refresh(enabled);
            }
            KeyCode::Char('h') => dashboard.renderer_mut().toggle_view(),
            KeyCode::Char('/') => {
                let view = dashboard.renderer_mut();
                view.view = View::History;
                view.editing_filter = true;
            }
            KeyCode::Esc => dashboard.renderer_mut().filter.clear(),
            _ => {}
        }
    }
    Ok(())
}

async fn print_snapshot(api: &dyn DashboardApi) -> anyhow::Result<()> {
    let live = api.live_data().await.context("fetching live data")?;
    let stats = charts::StatsView::from(&live.stats);
    println!(
        "Total: {}  Normal: {}  Anomaly: {}  Rate: {} ({:?})",
        stats.total, stats.normal, stats.anomaly, stats.rate_label, stats.severity
    );

    let records = live.recent_data.unwrap_or_default();
    println!();
    println!(
        "{:<20} {:<16} {:<16} {:<14} {:>8}  Status",
        "Timestamp", "Source", "Destination", "Protocol", "Length"
    );
    for row in charts::recent_rows(&records) {
        println!(
            "{:<20} {:<16} {:<16} {:<14} {:>8}  {}",
            row.timestamp, row.source, row.destination, row.protocol, row.length, row.status
        );
    }

    println!();
    for (name, count) in charts::protocol_tally(&records) {
        println!("{:<14} {}", name, count);
    }
    Ok(())
}

async fn print_queue(api: &dyn DashboardApi) -> anyhow::Result<()> {
    let status = api.queue_status().await.context("fetching queue status")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn retrain_once(api: &dyn DashboardApi) -> anyhow::Result<()> {
    let reply = api.retrain_model().await.context("retraining model")?;
    println!(
        "{}",
        reply.message.as_deref().unwrap_or(dashboard::RETRAIN_OK)
    );
    Ok(())
}
