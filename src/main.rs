use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use flux::ClientConfig;
use flux::client::{ClientError, FluxClient};
use flux::config::DEFAULT_BASE_URL;
use flux::coords::CellCoord;
use flux::mapper::visible_cell_range;
use flux::net::api::ApiError;
use flux::net::types::CreateMessage;
use flux::state::HeatTier;
use flux::viewport::{CanvasSize, Viewport};
use serde::Serialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("request failed: {0}")]
    Api(#[from] ApiError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "flux", about = "Flux canvas client")]
struct Cli {
    #[arg(long, env = "FLUX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "FLUX_WS_URL")]
    ws_url: Option<String>,

    /// Canvas width in pixels used for viewport calculations.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Canvas height in pixels used for viewport calculations.
    #[arg(long, default_value_t = 800.0)]
    height: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct ViewportArgs {
    /// Pan offset x; the server's initial position is used when omitted.
    #[arg(long, allow_hyphen_values = true)]
    x: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    y: Option<f64>,
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow realtime updates and log stats until Ctrl-C.
    Watch {
        #[command(flatten)]
        viewport: ViewportArgs,
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
    /// Load and print the cells visible in a viewport.
    Cells {
        #[command(flatten)]
        viewport: ViewportArgs,
    },
    /// Load and print the heat values visible in a viewport.
    Heatmap {
        #[command(flatten)]
        viewport: ViewportArgs,
    },
    /// Write a message into a cell.
    Post {
        #[arg(allow_hyphen_values = true)]
        row: i64,
        #[arg(allow_hyphen_values = true)]
        col: i64,
        content: String,
        #[arg(long)]
        bg_color: Option<String>,
        #[arg(long)]
        base_version_id: Option<i64>,
    },
    /// Print the hover detail of one message.
    Detail { id: i64 },
    /// Print global stats.
    Stats,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HeatRow {
    grid_x: i64,
    grid_y: i64,
    heat_value: u32,
    tier: Option<&'static str>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ClientConfig { base_url: cli.base_url, ws_url: cli.ws_url, ..ClientConfig::from_env() };
    let size = CanvasSize::new(cli.width, cli.height);
    let client = FluxClient::from_config(&config)?;

    match cli.command {
        Command::Watch { viewport, interval_secs } => run_watch(&client, viewport, size, interval_secs).await,
        Command::Cells { viewport } => {
            let viewport = resolve_viewport(&client, viewport, size).await;
            let load = client.on_viewport_changed(&viewport, size).await;
            info!(grid = ?load.grid, "cells loaded");
            print_json(&client.store().cells_in_range(visible_cell_range(&viewport, size)))
        }
        Command::Heatmap { viewport } => {
            let viewport = resolve_viewport(&client, viewport, size).await;
            let load = client.on_viewport_changed(&viewport, size).await;
            info!(heatmap = ?load.heatmap, "heatmap loaded");
            let snapshot = client.snapshot();
            let mut rows: Vec<HeatRow> = snapshot
                .heat
                .iter()
                .map(|(chunk, &value)| HeatRow {
                    grid_x: chunk.grid_x,
                    grid_y: chunk.grid_y,
                    heat_value: value,
                    tier: HeatTier::classify(value).map(HeatTier::label),
                })
                .collect();
            rows.sort_by_key(|r| (r.grid_y, r.grid_x));
            print_json(&rows)
        }
        Command::Post { row, col, content, bg_color, base_version_id } => {
            let message = CreateMessage {
                bg_color,
                base_version_id,
                ..CreateMessage::text(CellCoord::new(row, col), content)
            };
            let cell = client.create_message(&message).await?;
            print_json(&cell)
        }
        Command::Detail { id } => match client.load_message_detail(id).await {
            Some(detail) => print_json(&detail),
            None => Err(CliError::Api(ApiError::Rejected(format!("Failed to fetch message detail for id {id}")))),
        },
        Command::Stats => {
            let stats = client.refresh_stats().await?;
            print_json(&stats)
        }
    }
}

async fn resolve_viewport(client: &FluxClient, args: ViewportArgs, size: CanvasSize) -> Viewport {
    match (args.x, args.y) {
        (Some(x), Some(y)) => Viewport::new(x, y, args.zoom),
        _ => {
            let initial = client.initial_viewport(size).await;
            Viewport::new(initial.x, initial.y, args.zoom)
        }
    }
}

async fn run_watch(client: &FluxClient, args: ViewportArgs, size: CanvasSize, interval_secs: u64) -> Result<(), CliError> {
    client.connect_realtime();
    let mut state = client.realtime().subscribe();

    let viewport = resolve_viewport(client, args, size).await;
    let load = client.on_viewport_changed(&viewport, size).await;
    info!(grid = ?load.grid, heatmap = ?load.heatmap, "initial viewport loaded");

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(state = ?*state.borrow(), "realtime state changed");
            }
            _ = ticker.tick() => {
                let snapshot = client.snapshot();
                info!(
                    cells = snapshot.cells.len(),
                    locks = snapshot.locks.len(),
                    online = snapshot.stats.online_users,
                    total = snapshot.stats.total_messages,
                    in_view = snapshot.stats.viewport_message_count,
                    "stats"
                );
            }
        }
    }

    client.shutdown();
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
