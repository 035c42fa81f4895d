//! geowatch bot: polls GeoNet hazard feeds and posts notifications.
//!
//! The seismic and volcano feeds run as independent tokio tasks, each
//! owning its own retained state. [`run`] wires them up from a [`Config`]
//! and waits until a task stops; only a failed first poll stops a task.

pub mod config;
pub mod quakes;
pub mod scheduler;
pub mod snapshot;
pub mod volcanoes;

use std::sync::Arc;

use geowatch_feed::FeedSource;
use geowatch_notify::NotificationSink;
use tokio::task::JoinSet;

pub use config::Config;
use config::ConfigError;
use quakes::QuakeWatcher;
use scheduler::{run_once, run_poll_loop, PollError};
use volcanoes::VolcanoWatcher;

/// Errors that stop the bot.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Runs every enabled feed until one fails to seed.
///
/// With `config.run_once` each feed runs its first cycle and the function
/// returns once all of them are done.
///
/// # Errors
///
/// Returns [`BotError::Config`] if the display time zone is invalid, or the
/// first [`PollError`] reported by a feed.
pub async fn run(
    config: &Config,
    source: Arc<dyn FeedSource>,
    sink: Arc<dyn NotificationSink>,
) -> Result<(), BotError> {
    let tz = config.feed.timezone()?;
    let mut tasks: JoinSet<Result<(), PollError>> = JoinSet::new();

    if config.quakes.enabled {
        let watcher = QuakeWatcher::new(
            source.clone(),
            sink.clone(),
            config.quakes.clone(),
            tz,
        );
        if config.run_once {
            tracing::warn!("quake feed seeds silently, so a single run posts nothing");
            tasks.spawn(async move { run_once(watcher).await.map(|_| ()) });
        } else {
            tasks.spawn(run_poll_loop(watcher, config.quakes.poll_interval()));
        }
    }

    if config.volcanoes.enabled {
        let watcher = VolcanoWatcher::new(source.clone(), sink.clone(), config.volcanoes.clone());
        if config.run_once {
            tasks.spawn(async move { run_once(watcher).await.map(|_| ()) });
        } else {
            tasks.spawn(run_poll_loop(watcher, config.volcanoes.poll_interval()));
        }
    }

    if tasks.is_empty() {
        tracing::warn!("no feeds enabled, nothing to do");
        return Ok(());
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => tracing::error!(error = %e, "feed task panicked or was cancelled"),
        }
    }
    Ok(())
}
