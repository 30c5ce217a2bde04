//! Signal Worker
//!
//! Polls market data on a cron schedule, evaluates the signal rules and
//! delivers admitted signals. Serves `/health` and `/metrics` alongside.

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use signalbot::config::{get_environment, Config};
use signalbot::core::http::{start_server, AppState};
use signalbot::core::pipeline::SignalPipeline;
use signalbot::core::runtime::SignalRuntime;
use signalbot::logging;
use signalbot::metrics::Metrics;
use signalbot::services::{
    ArchiveNotifier, BinanceCandleSource, BroadcastNotifier, CandleSource,
    CryptoCompareCandleSource, FallbackCandleSource, LogNotifier, Notifier, SmsNotifier,
    TelegramNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "signal-worker", about = "Candle-driven signal generation worker")]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single evaluation tick and exit
    #[arg(long)]
    check_now: bool,

    /// Port for the health and metrics endpoint
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logging::init_logging("info");

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(port) = cli.port {
        config.runtime.http_port = port;
    }

    info!(
        environment = %get_environment(),
        symbol = %config.instrument.symbol,
        timezone = config.schedule.timezone.name(),
        daily_cap = config.schedule.daily_cap,
        "Starting Signal Worker"
    );

    let metrics = Arc::new(Metrics::new().context("registering metrics")?);
    let source = build_source(&config);
    let notifier = build_notifier(&config);
    let pipeline = SignalPipeline::new(&config, source, notifier).with_metrics(metrics.clone());

    let app_state = AppState::new(metrics.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut runtime = SignalRuntime::new(pipeline, &config.runtime.tick_cron, shutdown_rx.clone())
        .context("building runtime")?
        .with_health(app_state.health.clone());

    if cli.check_now {
        let outcome = runtime.run_once().await;
        info!(outcome = ?outcome, "Single check finished");
        return Ok(());
    }

    let server = tokio::spawn(start_server(
        config.runtime.http_port,
        app_state,
        shutdown_rx,
    ));
    let worker = tokio::spawn(runtime.run());

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
    let _ = shutdown_tx.send(true);

    let pipeline = worker.await.context("runtime task panicked")?;
    info!(
        signals_today = pipeline.ledger().emitted_count,
        "Runtime stopped"
    );
    if let Err(e) = server.await.context("http task panicked")? {
        warn!(error = %e, "HTTP server exited with error");
    }

    info!("Signal Worker stopped");
    Ok(())
}

fn build_source(config: &Config) -> Arc<dyn CandleSource> {
    let ds = &config.data_source;
    let interval = config.instrument.interval_secs;
    let request_timeout = Duration::from_secs(ds.request_timeout_secs);
    let primary: Arc<dyn CandleSource> = Arc::new(
        BinanceCandleSource::new(&ds.binance_base_url, &config.instrument.symbol, interval)
            .with_request_timeout(request_timeout),
    );
    let secondary: Arc<dyn CandleSource> = Arc::new(
        CryptoCompareCandleSource::new(
            &ds.cryptocompare_base_url,
            &ds.base_asset,
            &ds.quote_asset,
            interval,
        )
        .with_request_timeout(request_timeout),
    );
    let sources = vec![primary, secondary];
    // each source gets an equal share of the tick's fetch budget
    let per_source = Duration::from_secs(config.runtime.fetch_timeout_secs) / sources.len() as u32;
    Arc::new(
        FallbackCandleSource::new(sources, ds.max_retries).with_source_timeout(per_source),
    )
}

fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    let timezone = config.schedule.timezone;
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];

    if config.notifier.telegram_enabled() {
        match TelegramNotifier::from_config(&config.notifier, timezone) {
            Ok(notifier) => notifiers.push(Arc::new(notifier)),
            Err(e) => warn!(error = %e, "Telegram notifier unavailable"),
        }
    } else {
        info!("Telegram not configured");
    }
    if config.notifier.sms_enabled() {
        match SmsNotifier::from_config(&config.notifier, timezone) {
            Ok(notifier) => notifiers.push(Arc::new(notifier)),
            Err(e) => warn!(error = %e, "SMS notifier unavailable"),
        }
    }
    if let Some(dir) = &config.notifier.archive_dir {
        info!(dir = %dir.display(), "Archiving emitted signals");
        notifiers.push(Arc::new(ArchiveNotifier::new(dir.clone(), timezone)));
    }

    if notifiers.len() == 1 {
        info!("Signals will be logged only");
        return Arc::new(LogNotifier);
    }
    Arc::new(BroadcastNotifier::new(notifiers))
}
