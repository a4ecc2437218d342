use std::env;
use std::io::IsTerminal;

use sentry::integrations::tracing as sentry_tracing;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{Config, LogFormat};

pub fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry.dsn.as_deref()?;

    Some(sentry::init(sentry::ClientOptions {
        dsn: dsn.parse().ok(),
        environment: config.sentry.environment.clone().map(Into::into),
        release: sentry::release_name!(),
        sample_rate: config.sentry.sample_rate,
        enable_logs: true,
        ..Default::default()
    }))
}

pub fn init_tracing(config: &Config) {
    // Warnings and errors become events, everything down to INFO is sent as logs.
    let sentry_layer = config.sentry.is_enabled().then(|| {
        sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
            Level::ERROR | Level::WARN => {
                sentry_tracing::EventFilter::Event | sentry_tracing::EventFilter::Log
            }
            Level::INFO => sentry_tracing::EventFilter::Log,
            Level::DEBUG | Level::TRACE => sentry_tracing::EventFilter::Ignore,
        })
    });

    let (level, env_filter) = parse_rust_log(config.logging.level);
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let format = match resolve_format(config.logging.format) {
        LogFormat::Json => format.json().with_filter(level).boxed(),
        LogFormat::Simplified => format.with_ansi(false).with_filter(level).boxed(),
        LogFormat::Pretty | LogFormat::Auto => format.compact().with_filter(level).boxed(),
    };

    tracing_subscriber::registry()
        .with(format)
        .with(sentry_layer)
        .with(env_filter)
        .init();
}

fn resolve_format(format: LogFormat) -> LogFormat {
    match format {
        LogFormat::Auto if std::io::stderr().is_terminal() => LogFormat::Pretty,
        LogFormat::Auto => LogFormat::Simplified,
        format => format,
    }
}

/// Returns the level to log at and the per-crate filter.
///
/// A `RUST_LOG` holding a plain level overrides `default`. Any other `RUST_LOG` is used literally
/// as the filter.
pub fn parse_rust_log(default: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => default,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        ammo_cli=TRACE,\
        ammo_workload=TRACE,\
        make_ammo=TRACE,\
        ",
    );

    (level, env_filter)
}
