//! geowatch binary: the entry point for the hazard notification bot.
//!
//! Loads configuration, sets up structured logging, builds the GeoNet
//! client and the posting sink, and runs the feed pollers until a fatal
//! error or SIGTERM/SIGINT.

use std::sync::Arc;

use geowatch_bot::config;
use geowatch_feed::{FeedSource, GeoNetClient};
use geowatch_notify::{LogSink, MastodonSink, NotificationSink};
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("GEOWATCH_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("geowatch.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path).unwrap_or_else(|e| {
        panic!(
            "failed to load configuration from {} ({config_source}): {e}",
            selected_config_path.unwrap_or("<none>")
        )
    });

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let source: Arc<dyn FeedSource> = Arc::new(
        GeoNetClient::new(
            &config.feed.base_url,
            config.feed.timeout(),
            &config.feed.user_agent,
        )
        .expect("failed to build feed HTTP client"),
    );

    let sink: Arc<dyn NotificationSink> = if config.mastodon.dry_run {
        tracing::info!("dry run enabled, notifications will only be logged");
        Arc::new(LogSink::new())
    } else {
        Arc::new(
            MastodonSink::new(
                &config.mastodon.instance_url,
                config.mastodon.access_token.clone(),
                config.mastodon.visibility,
                &config.feed.user_agent,
            )
            .expect("failed to build Mastodon sink, check mastodon.access_token"),
        )
    };

    tracing::info!(
        quakes = config.quakes.enabled,
        volcanoes = config.volcanoes.enabled,
        run_once = config.run_once,
        "starting geowatch"
    );

    tokio::select! {
        result = geowatch_bot::run(&config, source, sink) => match result {
            Ok(()) => tracing::info!("all feeds finished"),
            Err(e) => {
                tracing::error!(error = %e, "fatal error, shutting down");
                std::process::exit(1);
            }
        },
        () = shutdown_signal() => {}
    }

    tracing::info!("geowatch shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        () = terminate => { tracing::info!("received SIGTERM, shutting down"); }
    }
}
