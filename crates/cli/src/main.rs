use anyhow::Context;
use clap::Parser;
use relay_dns_application::ports::CacheStore;
use relay_dns_domain::config::CliOverrides;
use relay_dns_jobs::JobRunner;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod bootstrap;
mod di;
mod server;

#[derive(Parser)]
#[command(name = "relay-dns")]
#[command(version)]
#[command(about = "Local DNS caching relay with query coalescing")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Bind address
    #[arg(short = 'b', long)]
    bind: Option<String>,

    /// DNS listen port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Upstream resolver (udp://IP:PORT, tcp://IP:PORT or IP[:PORT]); repeatable
    #[arg(short = 'u', long = "upstream", value_name = "ENDPOINT")]
    upstreams: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        bind_address: cli.bind,
        port: cli.port,
        upstreams: cli.upstreams,
        log_level: cli.log_level,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting relay-dns v{}", env!("CARGO_PKG_VERSION"));

    let services = di::DnsServices::new(&config)?;
    let shutdown = CancellationToken::new();

    let job_handles = JobRunner::new()
        .with_stats_report(services.stats_report)
        .with_shutdown_token(shutdown.clone())
        .start()
        .await;

    let settings = server::ListenerSettings::from_config(&config)?;
    let mut dns_server = tokio::spawn(server::start_dns_server(
        settings,
        services.engine.clone(),
        shutdown.clone(),
    ));

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
        }
        result = &mut dns_server => {
            match result {
                Ok(Ok(())) => info!("DNS listener exited"),
                Ok(Err(e)) => error!(error = %e, "DNS listener error"),
                Err(e) => error!(error = %e, "DNS listener task panicked"),
            }
        }
    }

    shutdown.cancel();

    if !dns_server.is_finished() {
        if let Ok(Err(e)) = dns_server.await {
            error!(error = %e, "DNS listener error during shutdown");
        }
    }
    for handle in job_handles {
        let _ = handle.await;
    }

    info!(
        cache_entries = services.cache.len(),
        in_flight = services.engine.in_flight(),
        "Relay shutdown complete"
    );
    Ok(())
}
