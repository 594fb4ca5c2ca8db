mod follow;
mod poll;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};
use fleetwatch_core::{
    config::{self, AppConfig},
    FleetRepository, FleetStore, JsonFleetFile, ProfileClient, RefreshScheduler,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = AppConfig::default_path();
    config::ensure_default_config(&config_path)?;
    let config = AppConfig::load_from(&config_path)?;

    let repository = Arc::new(JsonFleetFile::new(config.state_path.clone()));
    let fleet = match repository.load() {
        Ok(fleet) => fleet.unwrap_or_default(),
        Err(err) => {
            warn!(?err, "Could not restore fleet; starting empty");
            Default::default()
        }
    };

    let (refresh_tx, refresh_rx) = mpsc::channel(1);
    let scheduler = RefreshScheduler::new(Arc::new(refresh_tx.clone()), config.refresh_delay());
    let store = FleetStore::new(fleet).with_refresh(scheduler);
    info!(ships = store.ships().len(), "Fleet restored");

    tokio::spawn(announce_changes(store.clone()));

    match &config.profile_url {
        Some(url) => {
            let client = ProfileClient::new(url.clone(), config.profile_token.clone())?
                .with_carrier_url(config.carrier_url.clone());
            let poller = poll::ProfilePoller::new(
                client,
                store.clone(),
                repository.clone(),
                config.poll_interval(),
            );
            tokio::spawn(async move { poller.run(refresh_rx).await });
        }
        None => info!("No profile URL configured; remote polling disabled"),
    }

    let follower = follow::JournalFollower::new(&config.journal_dir, store, repository);
    tokio::select! {
        result = follower.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}

/// Log a one-line summary of the current ship whenever live play changes the fleet.
async fn announce_changes(store: FleetStore) {
    let mut changes = store.subscribe();
    loop {
        match changes.recv().await {
            Ok(change) if change.replayed => {}
            Ok(_) => match store.current_ship() {
                Some(ship) => info!(
                    ship_id = %ship.local_id,
                    ship = %ship.label(),
                    cargo = ship.cargo_capacity(),
                    jump_range = %format!("{:.2}", ship.max_jump_range()),
                    "Fleet changed"
                ),
                None => info!("Fleet changed"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Change listener fell behind")
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("fleetwatch.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
