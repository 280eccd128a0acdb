use crate::core::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Connection-level chatter from the HTTP stack is rarely useful
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(format!("{},{}", config.level, QUIET_DEPENDENCIES))
        .context(format!("Invalid log level '{}'", config.level))
}

pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_filter(config)?;

    let use_console = config.console || config.format == "console";

    if use_console {
        // Human readable output for running in a terminal
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_ansi(true)
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    Ok(())
}
