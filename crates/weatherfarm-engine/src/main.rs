//! Weather Farm console runner.
//!
//! Type a key name (`F5`, `F9`, `F8`, `F12`, `Escape`, or whatever the
//! config binds) and press enter. An empty line prints the current status.

#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weatherfarm_engine::{
    Command, EngineConfig, FarmAction, FileStore, KeyBindings, LogPresentation, SchedulerHandle,
    WeatherScheduler,
};
use weatherfarm_gameplay::{Clock, Farm, PlantCatalog, ReferenceClock, WeatherEngine};

/// Main entry point.
#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::load();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(config.log_directive().parse()?))
        .init();

    info!("Weather Farm starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    let config_path = EngineConfig::config_path();
    info!("Config: {}", config_path.display());
    config.check()?;
    if !config_path.exists() {
        if let Err(e) = config.save() {
            warn!("Could not write default config: {e}");
        }
    }

    let clock: Arc<dyn Clock> = Arc::new(ReferenceClock::resolve(
        &config.reference_timezone,
        &config.timezone_alias,
    ));
    info!("Reference time is {}", clock.now());

    let store = FileStore::open(&config.store_path);
    let engine = WeatherEngine::with_seed(
        config.engine_settings(),
        Box::new(store),
        clock,
        config.rng_seed,
    );
    let farm = Farm::with_acres(config.starting_money, config.plot_count);
    let scheduler = WeatherScheduler::new(
        engine,
        farm,
        PlantCatalog::default_crops(),
        LogPresentation::new(),
        config.schedule_mode(),
    );

    let bindings = config.key_bindings();
    log_bindings(&bindings);

    let (handle, task) = scheduler.spawn();
    read_keys(&handle, &bindings).await?;

    handle.shutdown();
    task.await?;
    info!("Weather Farm shutdown complete");
    Ok(())
}

fn log_bindings(bindings: &KeyBindings) {
    for action in FarmAction::ALL {
        let Some(binding) = bindings.get_binding(action) else {
            continue;
        };
        match &binding.secondary {
            Some(secondary) => info!("  {}: {} or {secondary}", action.display_name(), binding.primary),
            None => info!("  {}: {}", action.display_name(), binding.primary),
        }
    }
}

/// Feeds key names from stdin to the scheduler until Quit, Ctrl-C or EOF.
async fn read_keys(handle: &SchedulerHandle, bindings: &KeyBindings) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Interrupted");
                return Ok(());
            }
        };
        let Some(line) = line else {
            return Ok(());
        };

        let key = line.trim();
        if key.is_empty() {
            let status = handle.snapshot().await?;
            info!(
                "{} | money {} | {} dry plot(s) | freezing: {}",
                status.label, status.money, status.dry_plots, status.state.is_freezing
            );
            continue;
        }

        let command = match bindings.action_for_key(key) {
            Some(FarmAction::QuickSave) => Command::Save,
            Some(FarmAction::QuickLoad) => Command::Load,
            Some(FarmAction::ForceAdvance) => Command::ForceAdvance,
            Some(FarmAction::ClearWeather) => Command::ClearStored,
            Some(FarmAction::Quit) => return Ok(()),
            None => {
                warn!("Key {key:?} is not bound");
                continue;
            },
        };
        handle.send(command).await?;
    }
}
