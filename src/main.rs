use std::time::Duration;

use clap::{arg, Command};
use eyre::WrapErr;
use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::client::{BalanceApi, HttpApi};
use crate::config::Config;
use crate::model::BalanceSnapshot;
use crate::poller::Poller;

mod change;
mod chart;
mod client;
mod config;
mod error;
mod format;
mod model;
mod poller;
mod reconcile;
mod sort;
mod theme;
mod tui;

fn cli() -> Command {
    Command::new("balance_tui")
        .about("A terminal dashboard for a balance-checker backend")
        .subcommand(
            Command::new("dash")
                .about("Run the live dashboard (default)")
                .arg(arg!(--server <URL> "Backend base URL").required(false)),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Fetch once, print the balances and a chain allocation chart")
                .arg(arg!(--server <URL> "Backend base URL").required(false)),
        )
        .subcommand(
            Command::new("stop")
                .about("Ask the backend to shut down")
                .arg(arg!(--server <URL> "Backend base URL").required(false)),
        )
        .subcommand(Command::new("config").about("Print the path to the config file"))
}

async fn run_dashboard(cfg: Config, server_url: String) -> eyre::Result<()> {
    let api = HttpApi::new(server_url);
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);

    let poller = Poller::new(
        api.clone(),
        Duration::from_secs(cfg.poll_interval_secs.max(1)),
        update_tx,
        stop_rx,
    );
    let poll_task = tokio::spawn(poller.run());

    let res = tui::run_tui(api, cfg, update_rx, stop_tx).await;

    // the TUI flips the stop signal on quit; wait for the loop to notice
    if let Err(err) = poll_task.await {
        warn!(%err, "poller task ended abnormally");
    }
    res
}

async fn run_snapshot(server_url: String) -> eyre::Result<()> {
    let api = HttpApi::new(server_url);

    let snapshot = api
        .fetch_balance()
        .await
        .wrap_err("fetching aggregate balance data")?;
    let addresses = api
        .fetch_addresses()
        .await
        .wrap_err("fetching address list")?;

    println!(
        "Accounts: {}   Total value: {}",
        snapshot.global_stats.total_accounts,
        format::format_currency(snapshot.global_stats.total_usd_value, false)
    );

    print_addresses(&addresses);
    draw_chains_chart(&snapshot);
    record_total_value(&snapshot);
    Ok(())
}

fn print_addresses(addresses: &[model::AddressRecord]) {
    use comfy_table::{
        presets::UTF8_FULL, Attribute, Cell, CellAlignment, ContentArrangement, Table,
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120)
        .set_header(vec![
            Cell::new("Address").add_attribute(Attribute::Bold),
            Cell::new("Balance").add_attribute(Attribute::Bold),
            Cell::new("Tokens").add_attribute(Attribute::Bold),
            Cell::new("Projects").add_attribute(Attribute::Bold),
        ]);

    for record in addresses {
        table.add_row(vec![
            Cell::new(format::format_address(&record.address)),
            Cell::new(format::format_currency(record.total_balance, false))
                .set_alignment(CellAlignment::Right),
            Cell::new(record.token_count).set_alignment(CellAlignment::Right),
            Cell::new(record.project_count).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
}

fn draw_chains_chart(snapshot: &BalanceSnapshot) {
    use piechart::{Chart, Color};

    let Some(data) = chart::chains_chart(&snapshot.chains, false) else {
        return;
    };

    let colors = [
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Red,
        Color::Purple,
        Color::Cyan,
        Color::White,
        Color::Black,
    ];

    let slices: Vec<piechart::Data> = data
        .labels
        .iter()
        .zip(&data.values)
        .enumerate()
        .map(|(i, (label, value))| piechart::Data {
            label: label.clone(),
            value: *value as f32,
            color: Some(colors[i % colors.len()].into()),
            fill: '•',
        })
        .collect();

    Chart::new()
        .legend(true)
        .radius(9)
        .aspect_ratio(3)
        .draw(&slices);
}

fn record_total_value(snapshot: &BalanceSnapshot) {
    let db = match sled::open("balance_history") {
        Ok(db) => db,
        Err(err) => {
            warn!(%err, "could not open history database");
            return;
        }
    };
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let value = snapshot.global_stats.total_usd_value.to_string();
    if let Err(err) = db.insert(now, value.as_bytes()) {
        warn!(%err, "could not record total value");
        return;
    }
    // block until the write is stable on disk
    if let Err(err) = db.flush() {
        warn!(%err, "could not flush history database");
    }
}

fn server_url(matches: Option<&clap::ArgMatches>, cfg: &Config) -> String {
    matches
        .and_then(|m| m.try_get_one::<String>("server").ok().flatten())
        .cloned()
        .unwrap_or_else(|| cfg.server_url.clone())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cfg: Config = config::load().wrap_err("loading configuration")?;
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("config", _)) => {
            println!(
                "Your config file is located here: \n{}",
                config::path().wrap_err("locating config file")?.display()
            );
            Ok(())
        }
        Some(("snapshot", sub)) => run_snapshot(server_url(Some(sub), &cfg)).await,
        Some(("stop", sub)) => {
            let api = HttpApi::new(server_url(Some(sub), &cfg));
            match api.stop_server().await {
                Ok(()) => println!("Server stopped."),
                Err(err) => println!("Failed to stop server: {err}"),
            }
            Ok(())
        }
        Some(("dash", sub)) => {
            let url = server_url(Some(sub), &cfg);
            run_dashboard(cfg, url).await
        }
        _ => {
            let url = server_url(None, &cfg);
            run_dashboard(cfg, url).await
        }
    }
}
