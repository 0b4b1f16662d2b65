//! sigrelay daemon: entry point for running a signature relay.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use sigrelay_node::{RelayModeSetting, RelayerConfig, RelayerContext, ShutdownController};
use sigrelay_rpc::RpcServer;
use sigrelay_store::SubmissionLedger;
use sigrelay_store_lmdb::{check_data_dir, check_integrity, LmdbEnvironment};
use sigrelay_types::{Address, GovernorKind};
use sigrelay_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "sigrelay", about = "Gasless vote and delegation signature relay")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "SIGRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP listen port.
    #[arg(long, env = "SIGRELAY_PORT")]
    port: Option<u16>,

    /// Data directory for the LMDB ledger.
    #[arg(long, env = "SIGRELAY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SIGRELAY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SIGRELAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Ethereum JSON-RPC endpoint.
    #[arg(long, env = "SIGRELAY_RPC_URL")]
    rpc_url: Option<String>,

    #[arg(long, env = "SIGRELAY_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Governance token address.
    #[arg(long, env = "SIGRELAY_TOKEN")]
    token: Option<Address>,

    /// Governor contract address.
    #[arg(long, env = "SIGRELAY_GOVERNOR")]
    governor: Option<Address>,

    /// Governor generation: "alpha", "bravo" or "charlie".
    #[arg(long, env = "SIGRELAY_GOVERNOR_KIND")]
    governor_kind: Option<GovernorKind>,

    /// What happens after an intent is stored: "deferred" or "synchronous".
    #[arg(long, env = "SIGRELAY_RELAY_MODE", value_parser = parse_relay_mode)]
    relay_mode: Option<RelayModeSetting>,

    /// Relay service URL, required in synchronous mode.
    #[arg(long, env = "SIGRELAY_RELAY_ENDPOINT")]
    relay_endpoint: Option<String>,

    /// Webhook prefix notified on every accepted intent.
    #[arg(long, env = "SIGRELAY_NOTIFICATION_HOOK")]
    notification_hook: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Serve the HTTP API until SIGINT/SIGTERM.
    Run,
    /// Open the ledger, verify every record decodes, and exit.
    Check,
    /// Print the effective configuration as TOML.
    Config,
}

fn parse_relay_mode(s: &str) -> Result<RelayModeSetting, String> {
    match s.to_ascii_lowercase().as_str() {
        "deferred" => Ok(RelayModeSetting::Deferred),
        "synchronous" => Ok(RelayModeSetting::Synchronous),
        other => Err(format!(
            "unknown relay mode '{other}' (expected deferred or synchronous)"
        )),
    }
}

impl Cli {
    /// File (or defaults) overlaid with every flag that was given.
    fn resolve_config(&self) -> anyhow::Result<RelayerConfig> {
        let mut config = match &self.config {
            Some(path) => RelayerConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RelayerConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(url) = &self.rpc_url {
            config.chain.rpc_url = url.clone();
        }
        if let Some(chain_id) = self.chain_id {
            config.chain.chain_id = chain_id;
        }
        if let Some(token) = self.token {
            config.token.address = token;
        }
        if let Some(governor) = self.governor {
            config.governor.address = governor;
        }
        if let Some(kind) = self.governor_kind {
            config.governor.kind = kind;
        }
        if let Some(mode) = self.relay_mode {
            config.relay.mode = mode;
        }
        if let Some(endpoint) = &self.relay_endpoint {
            config.relay.endpoint = Some(endpoint.clone());
        }
        if let Some(hook) = &self.notification_hook {
            config.notification_hook = Some(hook.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn open_environment(config: &RelayerConfig) -> anyhow::Result<LmdbEnvironment> {
    check_data_dir(&config.data_dir).map_err(|e| anyhow!(e))?;
    let environment = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)
        .with_context(|| format!("opening LMDB at {}", config.data_dir.display()))?;
    Ok(environment)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(config.log_format, &config.log_level);

    match cli.command {
        Command::Config => {
            println!("{}", config.to_toml_string()?);
        }
        Command::Check => {
            let environment = open_environment(&config)?;
            let report = check_integrity(&environment)?;
            tracing::info!(
                databases = report.databases_checked,
                entries = report.total_entries,
                records = report.records_decoded,
                "integrity check finished"
            );
            if !report.is_healthy() {
                for error in &report.errors {
                    tracing::error!("{error}");
                }
                return Err(anyhow!("{} integrity errors", report.errors.len()));
            }
        }
        Command::Run => run(config).await?,
    }

    Ok(())
}

async fn run(config: RelayerConfig) -> anyhow::Result<()> {
    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        governor = %config.governor.address,
        kind = %config.governor.kind,
        "starting sigrelay"
    );

    let environment = open_environment(&config)?;
    let report = check_integrity(&environment)?;
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!("{error}");
        }
        return Err(anyhow!(
            "ledger failed integrity check ({} errors); run `sigrelay check` for details",
            report.errors.len()
        ));
    }

    let ledger = environment.submission_ledger(config.eligibility.delegation_window_secs);
    tracing::info!(records = ledger.record_count()?, "ledger ready");
    let ledger: Arc<dyn SubmissionLedger> = Arc::new(ledger);

    let ctx = Arc::new(RelayerContext::from_config(&config, ledger)?);
    let shutdown = Arc::new(ShutdownController::new());
    let server = RpcServer::new(config.port, ctx);

    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.wait_for_signal().await })
    };

    let served = server.start(shutdown.signalled()).await;
    signals.abort();

    if let Err(e) = environment.sync() {
        tracing::warn!("LMDB force_sync failed: {e}");
    } else {
        tracing::info!("LMDB flushed to disk");
    }

    served?;
    tracing::info!("sigrelay exited cleanly");
    Ok(())
}
