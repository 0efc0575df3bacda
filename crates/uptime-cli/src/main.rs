mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use uptime_core::{
    AlertDispatcher, FileSink, HttpProber, LogSink, Monitor, PagerDutySink, WebhookSink,
};

use crate::config::AppConfig;

fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");

    if GIT_HASH.is_empty() {
        // Leaked once at startup, lives for the program's lifetime.
        Box::leak(VERSION.to_string().into_boxed_str())
    } else {
        Box::leak(format!("{VERSION} ({GIT_HASH})").into_boxed_str())
    }
}

/// Probe HTTP(S) endpoints on a schedule and alert on status transitions.
#[derive(Parser)]
#[command(name = "uptime-monitor", version = version_string(), about)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, default_value = "uptime.toml")]
    config: PathBuf,

    /// Poll interval in seconds. Overrides the config file; default 60.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Run a single poll pass, print results as JSON, and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            init_tracing("pretty");
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&app_config.log_format);
    tracing::info!(path = %cli.config.display(), "Loaded config file");

    let sites = match app_config.to_site_specs() {
        Ok(sites) => sites,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let checker_config = app_config.checker_config(cli.interval);
    let shared_client = HttpProber::build_client(checker_config.default_timeout);
    let prober = Arc::new(HttpProber::with_client(
        shared_client.clone(),
        &checker_config,
    ));

    let mut dispatcher = AlertDispatcher::new().with_sink(Box::new(LogSink::new()));
    if let Some(path) = &app_config.history_file {
        dispatcher.register(Box::new(FileSink::new(path)));
    }
    for webhook in &app_config.webhook {
        dispatcher.register(Box::new(WebhookSink::new(
            webhook.clone(),
            shared_client.clone(),
        )));
    }
    if let Some(pd) = &app_config.pagerduty {
        dispatcher.register(Box::new(PagerDutySink::new(
            pd.routing_key.clone(),
            shared_client.clone(),
        )));
    }

    let monitor = Monitor::new(sites, checker_config, prober, dispatcher);

    if cli.once {
        let results = monitor.check_all().await;
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize results");
                std::process::exit(1);
            }
        }
        return;
    }

    print_banner(&monitor, &app_config);

    let run = monitor.run();
    tokio::pin!(run);

    tokio::select! {
        () = &mut run => {}
        () = shutdown_signal() => {
            monitor.stop().await;
            run.await;
        }
    }
}

fn print_banner(monitor: &Monitor, app_config: &AppConfig) {
    println!(
        "{} {}",
        style("uptime-monitor").bold(),
        style(version_string()).dim()
    );
    println!(
        "  {} {}",
        style("sites:   ").dim(),
        monitor.sites().len()
    );
    println!(
        "  {} {}s",
        style("interval:").dim(),
        monitor.config().poll_interval.as_secs()
    );
    println!(
        "  {} {}",
        style("sinks:   ").dim(),
        sink_summary(app_config)
    );
    println!();
    println!("{}", style("Press Ctrl+C to stop").dim());
    println!();
}

fn sink_summary(app_config: &AppConfig) -> String {
    let mut parts = vec!["log".to_string()];
    if app_config.history_file.is_some() {
        parts.push("file".to_string());
    }
    if !app_config.webhook.is_empty() {
        parts.push(format!("webhook x{}", app_config.webhook.len()));
    }
    if app_config.pagerduty.is_some() {
        parts.push("pagerduty".to_string());
    }
    parts.join(", ")
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt().with_env_filter(filter).init();
        }
    }
}

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
