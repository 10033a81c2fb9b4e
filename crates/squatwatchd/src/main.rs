// # squatwatchd - typosquatting monitor
//
// Thin integration layer around squatwatch-core. One process invocation is
// one monitoring run for one client:
//
// 1. Read configuration from environment variables
// 2. Read the invocation (`SQUATWATCH_EVENT` JSON or CLI arguments)
// 3. Register plugins and build prober, history store and notifier
// 4. Run the monitor and map the outcome to an exit code
//
// All generation, probing and novelty logic lives in squatwatch-core.
//
// ## Configuration
//
// ### Probing
// - `SQUATWATCH_BASE_WORKERS`: Base worker count (1-64, default 10)
// - `SQUATWATCH_WORKER_MULTIPLIER`: Worker multiplier (1-50, default 20)
// - `SQUATWATCH_LOOKUP_TIMEOUT_MS`: Per-lookup timeout (100-30000, default 2000)
// - `SQUATWATCH_WHOIS`: Query WHOIS for registered candidates (default false)
// - `SQUATWATCH_REGISTERED_ONLY`: Diff only candidates with DNS records
//   (default true)
//
// ### History
// - `SQUATWATCH_HISTORY_TYPE`: file or memory (default file)
// - `SQUATWATCH_HISTORY_DIR`: Directory for the file store (default ./history)
//
// ### Notifier
// - `SQUATWATCH_NOTIFIER_TYPE`: webhook or log (default log)
// - `SQUATWATCH_GENERIC_CREDENTIALS`: Use shared credential keys
// - `SQUATWATCH_<CLIENT>_NOTIFIER_URL` / `SQUATWATCH_<CLIENT>_NOTIFIER_TOKEN`
//   (or `SQUATWATCH_NOTIFIER_URL` / `_TOKEN` with shared credentials)
// - `SQUATWATCH_MODE`: dry-run logs webhook requests instead of sending them
//
// ### Logging
// - `SQUATWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default warn)
//
// ## Example
//
// ```bash
// export SQUATWATCH_NOTIFIER_TYPE=webhook
// export SQUATWATCH_ABC0_NOTIFIER_URL=https://tickets.example.net/hook
// export SQUATWATCH_ABC0_NOTIFIER_TOKEN=...
//
// squatwatchd example.com ABC0
// squatwatchd example.com ABC0 --local
// SQUATWATCH_EVENT='{"OriginalDomain":"example.com","ClientCode":"ABC0"}' squatwatchd
// ```

use anyhow::{Context, Result};
use squatwatch_core::config::{
    CredentialScope, EngineConfig, HistoryStoreConfig, MonitorConfig, NotifierConfig, ProbeConfig,
};
use squatwatch_core::{Invocation, Monitor, MonitorEvent, PluginRegistry, RunReport};
use std::env;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes
///
/// - 0: Run completed
/// - 1: Configuration error or invalid input
/// - 2: Runtime error (history unreadable, runtime failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SquatwatchExitCode {
    Completed = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<SquatwatchExitCode> for ExitCode {
    fn from(code: SquatwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration, read from the environment
#[derive(Debug)]
struct Config {
    base_workers: usize,
    worker_multiplier: usize,
    lookup_timeout_ms: u64,
    whois: bool,
    registered_only: bool,
    history_type: String,
    history_dir: String,
    notifier_type: String,
    credential_scope: CredentialScope,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            base_workers: parse_or(&lookup, "SQUATWATCH_BASE_WORKERS", 10)?,
            worker_multiplier: parse_or(&lookup, "SQUATWATCH_WORKER_MULTIPLIER", 20)?,
            lookup_timeout_ms: parse_or(&lookup, "SQUATWATCH_LOOKUP_TIMEOUT_MS", 2000)?,
            whois: parse_bool(&lookup, "SQUATWATCH_WHOIS", false)?,
            registered_only: parse_bool(&lookup, "SQUATWATCH_REGISTERED_ONLY", true)?,
            history_type: lookup("SQUATWATCH_HISTORY_TYPE").unwrap_or_else(|| "file".to_string()),
            history_dir: lookup("SQUATWATCH_HISTORY_DIR")
                .unwrap_or_else(|| "./history".to_string()),
            notifier_type: lookup("SQUATWATCH_NOTIFIER_TYPE")
                .unwrap_or_else(|| "log".to_string()),
            credential_scope: if parse_bool(&lookup, "SQUATWATCH_GENERIC_CREDENTIALS", false)? {
                CredentialScope::Shared
            } else {
                CredentialScope::ClientScoped
            },
            log_level: lookup("SQUATWATCH_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// Validate ranges and type names
    fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.base_workers) {
            anyhow::bail!(
                "SQUATWATCH_BASE_WORKERS must be between 1 and 64. Got: {}",
                self.base_workers
            );
        }

        if !(1..=50).contains(&self.worker_multiplier) {
            anyhow::bail!(
                "SQUATWATCH_WORKER_MULTIPLIER must be between 1 and 50. Got: {}",
                self.worker_multiplier
            );
        }

        if !(100..=30_000).contains(&self.lookup_timeout_ms) {
            anyhow::bail!(
                "SQUATWATCH_LOOKUP_TIMEOUT_MS must be between 100 and 30000. Got: {}",
                self.lookup_timeout_ms
            );
        }

        match self.history_type.as_str() {
            "file" => {
                if self.history_dir.is_empty() {
                    anyhow::bail!(
                        "SQUATWATCH_HISTORY_DIR cannot be empty when SQUATWATCH_HISTORY_TYPE=file"
                    );
                }
            }
            "memory" => {}
            other => anyhow::bail!(
                "SQUATWATCH_HISTORY_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        }

        match self.notifier_type.as_str() {
            "webhook" | "log" => {}
            other => anyhow::bail!(
                "SQUATWATCH_NOTIFIER_TYPE '{}' is not supported. Supported types: webhook, log",
                other
            ),
        }

        parse_level(&self.log_level)?;
        Ok(())
    }

    /// Monitor configuration for one client
    ///
    /// Webhook credentials are resolved here, once per run.
    fn monitor_config(
        &self,
        client_code: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<MonitorConfig> {
        let history = match self.history_type.as_str() {
            "memory" => HistoryStoreConfig::Memory,
            _ => HistoryStoreConfig::File {
                dir: self.history_dir.clone(),
            },
        };

        let notifier = match self.notifier_type.as_str() {
            "webhook" => {
                let url_key = self.credential_scope.key("NOTIFIER_URL", client_code);
                let token_key = self.credential_scope.key("NOTIFIER_TOKEN", client_code);
                NotifierConfig::Webhook {
                    url: lookup(&url_key)
                        .filter(|v| !v.is_empty())
                        .with_context(|| format!("{} is required for the webhook notifier", url_key))?,
                    token: lookup(&token_key)
                        .filter(|v| !v.is_empty())
                        .with_context(|| format!("{} is required for the webhook notifier", token_key))?,
                    dry_run: false,
                }
            }
            _ => NotifierConfig::Log,
        };

        Ok(MonitorConfig {
            probe: ProbeConfig {
                base_workers: self.base_workers,
                worker_multiplier: self.worker_multiplier,
                lookup_timeout_ms: self.lookup_timeout_ms,
                whois: self.whois,
                ..ProbeConfig::default()
            },
            history,
            notifier,
            engine: EngineConfig {
                registered_only: self.registered_only,
                ..EngineConfig::default()
            },
            credential_scope: self.credential_scope,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} is not a valid number: '{}'", key, value)),
        None => Ok(default),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> Result<bool> {
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => anyhow::bail!("{} must be true or false. Got: '{}'", key, v),
    }
}

fn parse_level(level: &str) -> Result<Level> {
    Ok(match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => anyhow::bail!(
            "SQUATWATCH_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    })
}

/// Invocation from `SQUATWATCH_EVENT`, else from `<domain> <client-code> [--local]`
fn read_invocation(event: Option<String>, args: &[String]) -> Result<Invocation> {
    if let Some(event) = event.filter(|e| !e.trim().is_empty()) {
        return Ok(Invocation::from_json(&event)?);
    }

    let local = args.iter().any(|a| a == "--local");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if let Some(flag) = args.iter().find(|a| a.starts_with("--") && *a != "--local") {
        anyhow::bail!("Unknown option: {}", flag);
    }

    match positional.as_slice() {
        [domain, client] => {
            let invocation = Invocation::new(domain.as_str(), client.as_str()).with_local_mode(local);
            invocation.validate()?;
            Ok(invocation)
        }
        _ => anyhow::bail!(
            "Usage: squatwatchd <domain> <client-code> [--local] \
            (or set SQUATWATCH_EVENT to a JSON invocation)"
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SquatwatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SquatwatchExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SquatwatchExitCode::ConfigError.into();
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match read_invocation(env::var("SQUATWATCH_EVENT").ok(), &args) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!("Invalid invocation: {}", e);
            eprintln!("Invalid invocation: {}", e);
            return SquatwatchExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SquatwatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(&config, &invocation).await {
            Ok(report) => {
                print_report(&report);
                SquatwatchExitCode::Completed
            }
            Err(e) => {
                error!("Run failed: {:#}", e);
                eprintln!("Run failed: {:#}", e);
                exit_code_for(&e)
            }
        }
    })
    .into()
}

/// Configuration and input errors exit with 1, everything else with 2
fn exit_code_for(err: &anyhow::Error) -> SquatwatchExitCode {
    match err.downcast_ref::<squatwatch_core::Error>() {
        Some(squatwatch_core::Error::InvalidInput(_)) | Some(squatwatch_core::Error::Config(_)) => {
            SquatwatchExitCode::ConfigError
        }
        _ => SquatwatchExitCode::RuntimeError,
    }
}

/// Build components and run one pass
async fn run(config: &Config, invocation: &Invocation) -> Result<RunReport> {
    let registry = PluginRegistry::with_builtins();
    squatwatch_probe_dns::register(&registry);
    squatwatch_notify_webhook::register(&registry);
    debug!(
        "Registered probers={:?} history={:?} notifiers={:?}",
        registry.list_probers(),
        registry.list_history_stores(),
        registry.list_notifiers()
    );

    let monitor_config = config
        .monitor_config(&invocation.client_code, |key| env::var(key).ok())
        .map_err(|e| squatwatch_core::Error::config(format!("{:#}", e)))?;

    let prober = registry.create_prober(&monitor_config.probe)?;
    let history = registry.create_history_store(&monitor_config.history)?;
    let notifier = registry.create_notifier(&monitor_config.notifier)?;

    info!(
        "Starting run for client {} (prober={}, history={}, notifier={})",
        invocation.client_code,
        prober.prober_name(),
        monitor_config.history.type_name(),
        notifier.notifier_name()
    );

    let (monitor, mut events) = Monitor::new(prober, history, notifier, monitor_config)?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let MonitorEvent::PersistenceFailed { domain } = &event {
                warn!("History write failed for {}; it may be reported again", domain);
            }
            debug!("Monitor event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Signal handling unavailable: {}", e),
        }
    });

    Ok(monitor.run_with_shutdown(invocation, Some(shutdown_rx)).await?)
}

/// Summary on stdout; local mode also lists every registered candidate
fn print_report(report: &RunReport) {
    if report.local_mode {
        for variant in report.hit_variants() {
            match serde_json::to_string(variant) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Cannot serialize {}: {}", variant.domain_name, e),
            }
        }
    }

    println!(
        "{}: {} candidates, {} hits ({:.2}%), {} new{}",
        report.original_domain,
        report.candidates,
        report.hits,
        report.hit_rate * 100.0,
        report.findings.len(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
