mod cache;
mod config;
mod render;
mod state;
mod sync;

use anyhow::{Context, Result};
use std::{env, sync::Arc, time::Duration};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use watering_client::ApiClient;

use state::{DashboardState, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "dashboard.toml".to_string());
    let mut cfg = config::load(&config_path)?;
    if let Ok(url) = env::var("API_URL") {
        cfg.api_url = url;
        cfg.validate().context("invalid API_URL override")?;
    }

    let client = ApiClient::new(
        &cfg.api_url,
        Duration::from_secs(cfg.request_timeout_sec),
    )
    .context("failed to build http client")?;

    // ── Shared state (ephemeral; discarded on exit) ─────────────────
    let shared: SharedState = Arc::new(RwLock::new(DashboardState::new()));
    shared
        .write()
        .await
        .record_system("dashboard started".to_string());

    info!(api_url = %cfg.api_url, "loading initial state");
    sync::load(&shared, &client).await;
    print!("{}", render::render_cards(&*shared.read().await));

    // ── Background refresh ──────────────────────────────────────────
    if cfg.refresh_sec > 0 {
        let shared_bg = Arc::clone(&shared);
        let client_bg = client.clone();
        let every = Duration::from_secs(cfg.refresh_sec);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await; // the first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                sync::load(&shared_bg, &client_bg).await;
            }
        });
    }

    // ── Command loop ────────────────────────────────────────────────
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (None, _) => {}
            (Some("l"), None) => {
                print!("{}", render::render_cards(&*shared.read().await));
            }
            (Some("e"), Some(arg)) => match parse_id(arg) {
                Some(id) => {
                    let mut st = shared.write().await;
                    if st.toggle_expansion(id).is_none() {
                        println!("no bed with id {id}");
                    }
                    print!("{}", render::render_cards(&st));
                }
                None => print_help(),
            },
            (Some("t"), Some(arg)) => match parse_id(arg) {
                Some(id) => {
                    sync::toggle_active(&shared, &client, id).await;
                    print!("{}", render::render_cards(&*shared.read().await));
                }
                None => print_help(),
            },
            (Some("r"), None) => {
                sync::load(&shared, &client).await;
                print!("{}", render::render_cards(&*shared.read().await));
            }
            (Some("h"), Some(arg)) => match parse_id(arg) {
                Some(id) => show_readings(&shared, &client, id).await,
                None => print_help(),
            },
            (Some("ev"), None) => {
                print!("{}", render::render_events(&*shared.read().await));
            }
            (Some("q"), None) => break,
            _ => print_help(),
        }
    }

    info!("dashboard exiting");
    Ok(())
}

/// Last hour of telemetry for the given bed's sensor.
async fn show_readings(shared: &SharedState, client: &ApiClient, bed_id: i64) {
    let sensor_id = shared.read().await.bed(bed_id).and_then(|b| b.sensor_id);
    let Some(sensor_id) = sensor_id else {
        println!("bed {bed_id} is unknown or has no sensor");
        return;
    };

    let to = time::OffsetDateTime::now_utc();
    let from = to - time::Duration::hours(1);
    match client.readings_between(from, to).await {
        Ok(readings) => {
            let mine: Vec<_> = readings
                .into_iter()
                .filter(|r| r.sensor_id == sensor_id)
                .collect();
            print!("{}", render::render_readings(&mine));
        }
        Err(e) => {
            warn!(bed_id, error = %e, "readings fetch failed");
            shared
                .write()
                .await
                .record_error(format!("readings fetch failed: {e}"));
        }
    }
}

fn parse_id(arg: &str) -> Option<i64> {
    arg.parse().ok()
}

fn print_help() {
    println!("commands:");
    println!("  l          list all plant beds");
    println!("  e <id>     expand/collapse a bed's card");
    println!("  t <id>     toggle a bed's irrigation");
    println!("  r          reload from the backend");
    println!("  h <id>     last hour of readings for a bed's sensor");
    println!("  ev         show the event log");
    println!("  q          quit");
}
