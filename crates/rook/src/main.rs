//! Rook recursive DNS resolver
//!
//! Answers UDP queries by walking the delegation hierarchy from the root
//! servers, without forwarding to an upstream resolver.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use rook_config::{Config, FailurePolicy};
use rook_resolver::{IterativeResolver, Resolver, ResolverConfig, RootHints};
use rook_server::{DnsServer, ResolverHandler};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn, Level};

mod logging;

use logging::{init_tracing, parse_log_level};

/// Rook - recursive DNS resolution from the root servers
#[derive(Parser, Debug)]
#[command(name = "rook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Quiet mode (errors only, no banner)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the resolver (default)
    Run,

    /// Validate configuration file
    Validate {
        /// Show the loaded settings
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version {
        /// Show build details
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Returns the explicit path, or the first standard location that exists.
fn find_config_file(explicit_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path);
    }

    let mut search_paths = vec![PathBuf::from("./rook.yaml"), PathBuf::from("./rook.toml")];
    if let Some(dir) = dirs::config_dir() {
        search_paths.push(dir.join("rook/config.yaml"));
    }
    search_paths.push(PathBuf::from("/etc/rook/config.yaml"));

    search_paths.into_iter().find(|path| path.exists())
}

fn load_config(path: Option<PathBuf>, quiet: bool) -> Result<Config> {
    match find_config_file(path) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => {
            if !quiet {
                eprintln!(
                    "{}",
                    style("No configuration file found, using defaults").yellow()
                );
            }
            Ok(Config::default())
        }
    }
}

fn init_logging(config: &Config, cli_level: Option<&str>, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        parse_log_level(cli_level.unwrap_or(config.logging.level.as_str()))
    };

    init_tracing(level, config.logging.format);
}

fn print_banner(config: &Config, quiet: bool) {
    if quiet {
        return;
    }

    println!();
    println!(
        "  {} {}",
        style("Rook").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!("  {}", style("Iterative resolution from the root").dim());
    println!();

    let listen: Vec<String> = config.server.listen.iter().map(ToString::to_string).collect();
    println!("  {} {}", style("Listen:").green(), listen.join(", "));

    let hints = if config.resolver.root_hints.is_empty() {
        "built-in (13)".to_string()
    } else {
        format!("custom ({})", config.resolver.root_hints.len())
    };
    println!("  {} {}", style("Root hints:").green(), hints);
    println!(
        "  {} {}",
        style("On failure:").green(),
        config.server.on_failure
    );
    println!();
}

/// Resolves once Ctrl-C or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Runtime resolver settings from the `resolver` section.
fn resolver_settings(config: &rook_config::ResolverConfig) -> ResolverConfig {
    ResolverConfig {
        query_timeout: config.timeout(),
        max_iterations: config.max_iterations,
        max_depth: config.max_depth,
        max_exchanges: config.max_exchanges,
        upstream_port: config.upstream_port,
    }
}

/// Configured root hints, or the built-in set when none are listed.
fn root_hints(config: &rook_config::ResolverConfig) -> RootHints {
    RootHints::from_addrs(config.root_hints.iter().copied())
}

fn failure_policy(policy: FailurePolicy) -> rook_server::FailurePolicy {
    match policy {
        FailurePolicy::Drop => rook_server::FailurePolicy::Drop,
        FailurePolicy::Servfail => rook_server::FailurePolicy::Servfail,
    }
}

async fn run_server(config: Config, quiet: bool) -> Result<()> {
    print_banner(&config, quiet);

    let resolver: Arc<dyn Resolver> = Arc::new(IterativeResolver::with_udp(
        resolver_settings(&config.resolver),
        root_hints(&config.resolver),
    ));
    let handler = Arc::new(ResolverHandler::new(
        resolver,
        failure_policy(config.server.on_failure),
    ));
    let server = DnsServer::new(config.server.listen.clone(), handler);

    info!(
        listeners = config.server.listen.len(),
        max_iterations = config.resolver.max_iterations,
        timeout_ms = config.resolver.timeout_ms,
        "Rook resolver started"
    );

    tokio::select! {
        result = server.run() => {
            result.context("DNS server failed")?;
        }
        _ = shutdown_signal() => {}
    }

    server.shutdown();
    info!("Rook resolver stopped");
    Ok(())
}

fn validate_config(path: Option<PathBuf>, verbose: bool) -> Result<()> {
    let config_path = find_config_file(path).context("No configuration file found")?;

    println!("Validating configuration: {}", config_path.display());

    let config = Config::from_file(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_path.display()
        )
    })?;

    if verbose {
        println!("\n{}", style("Configuration loaded:").green().bold());
        for addr in &config.server.listen {
            println!("  Listen: {addr}");
        }
        println!("  On failure: {}", config.server.on_failure);
        println!("  Timeout: {}ms", config.resolver.timeout_ms);
        println!("  Max iterations: {}", config.resolver.max_iterations);
        println!("  Max depth: {}", config.resolver.max_depth);
        println!("  Max exchanges: {}", config.resolver.max_exchanges);
        println!("  Upstream port: {}", config.resolver.upstream_port);
        println!("  Root hints: {}", root_hints(&config.resolver).addrs().len());
        println!(
            "  Logging: {} ({:?})",
            config.logging.level, config.logging.format
        );
    }

    config
        .validate()
        .with_context(|| "Configuration validation failed")?;

    println!("{}", style("Configuration is valid!").green().bold());
    Ok(())
}

fn print_version(verbose: bool) {
    let version = env!("CARGO_PKG_VERSION");
    let name = env!("CARGO_PKG_NAME");

    if verbose {
        println!(
            "{} {}",
            style(name).cyan().bold(),
            style(format!("v{version}")).dim()
        );
        println!();
        println!("  {}: {}", style("Arch").dim(), std::env::consts::ARCH);
        println!("  {}: {}", style("OS").dim(), std::env::consts::OS);
        println!(
            "  {}: {}",
            style("Max UDP message").dim(),
            rook_proto::MAX_UDP_MESSAGE_SIZE
        );
        println!();
    } else {
        println!("{name} {version}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version { verbose }) => {
            print_version(verbose);
            Ok(())
        }
        Some(Commands::Validate { verbose }) => validate_config(cli.config, verbose),
        Some(Commands::Run) | None => {
            let config = load_config(cli.config, cli.quiet)?;
            config.validate().context("Invalid configuration")?;
            init_logging(&config, cli.log_level.as_deref(), cli.quiet);
            run_server(config, cli.quiet).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["rook"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.quiet);
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["rook", "-c", "/etc/rook/config.yaml", "-q"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/rook/config.yaml")));
        assert!(cli.quiet);

        let cli = Cli::try_parse_from(["rook", "run", "-l", "debug"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));

        let cli = Cli::try_parse_from(["rook", "validate", "--verbose"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Validate { verbose: true })
        ));

        let cli = Cli::try_parse_from(["rook", "version"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Version { verbose: false })
        ));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = PathBuf::from("/nonexistent/rook.yaml");
        assert_eq!(find_config_file(Some(path.clone())), Some(path));
    }

    #[test]
    fn test_load_explicit_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:\n  on_failure: servfail").unwrap();

        let config = load_config(Some(file.path().to_path_buf()), true).unwrap();
        assert_eq!(config.server.on_failure, FailurePolicy::Servfail);
        assert!(validate_config(Some(file.path().to_path_buf()), true).is_ok());
    }

    #[test]
    fn test_resolver_settings_from_defaults() {
        let config = rook_config::ResolverConfig::default();
        assert_eq!(resolver_settings(&config), ResolverConfig::default());
        assert_eq!(root_hints(&config), RootHints::from_builtin());
    }

    #[test]
    fn test_resolver_settings_from_file_values() {
        let config = rook_config::ResolverConfig {
            timeout_ms: 500,
            max_exchanges: 8,
            upstream_port: 5300,
            root_hints: vec!["127.0.0.1".parse().unwrap()],
            ..Default::default()
        };
        let settings = resolver_settings(&config);
        assert_eq!(settings.query_timeout, std::time::Duration::from_millis(500));
        assert_eq!(settings.max_exchanges, 8);
        assert_eq!(settings.upstream_port, 5300);
        assert_eq!(
            root_hints(&config).addrs(),
            &["127.0.0.1".parse::<std::net::IpAddr>().unwrap()]
        );
    }

    #[test]
    fn test_failure_policy_conversion() {
        assert_eq!(
            failure_policy(FailurePolicy::Drop),
            rook_server::FailurePolicy::Drop
        );
        assert_eq!(
            failure_policy(FailurePolicy::Servfail),
            rook_server::FailurePolicy::Servfail
        );
    }

    #[test]
    fn test_load_missing_explicit_config() {
        assert!(load_config(Some(PathBuf::from("/nonexistent/rook.yaml")), true).is_err());
    }
}
