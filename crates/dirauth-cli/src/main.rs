//! Dirauth - Directory Authentication Service
//!
//! Verifies username/password pairs against the directory servers of a
//! domain, discovered through DNS.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dirauth_api::DirAuthServer;
use dirauth_core::config::DirAuthConfig;
use dirauth_ldap::{DomainDiscovery, HickorySrvResolver};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(author = "Dirauth Team")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Directory authentication service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Bind address
    #[arg(long, env = "DIRAUTH_BIND_ADDRESS")]
    bind: Option<String>,

    /// Port number
    #[arg(short, long, env = "DIRAUTH_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRAUTH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long, env = "DIRAUTH_LOG_FORMAT")]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Server,

    /// Resolve the directory servers of a domain and print them in order
    Discover {
        /// Domain to resolve
        domain: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        DirAuthConfig::from_file(config_path)?
    } else {
        DirAuthConfig::from_env()
    };
    apply_overrides(&mut config, &cli);

    init_logging(&config.logging.level, &config.logging.format);

    match cli.command {
        Some(Commands::Version) => {
            print_banner();
        }
        Some(Commands::Discover { domain }) => {
            discover(&config, &domain).await;
        }
        Some(Commands::Server) | None => {
            print_banner();
            run_server(config).await?;
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut DirAuthConfig, cli: &Cli) {
    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
}

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn print_banner() {
    println!(
        r#"
    ____  _                 __  __
   / __ \(_)________ ___  __/ /_/ /_
  / / / / / ___/ __ `/ / / / __/ __ \
 / /_/ / / /  / /_/ / /_/ / /_/ / / /
/_____/_/_/   \__,_/\__,_/\__/_/ /_/

   Directory Authentication Service
   Version: {}
"#,
        dirauth_core::VERSION
    );
}

async fn discover(config: &DirAuthConfig, domain: &str) {
    let resolver = Arc::new(HickorySrvResolver::from_system_conf());
    let discovery = DomainDiscovery::from_settings(resolver, &config.discovery);

    let servers = discovery.resolve(domain).await;
    if servers.is_empty() {
        println!("No LDAP servers discovered for domain: {}", domain);
        return;
    }

    for (i, server) in servers.iter().enumerate() {
        println!("{:>3}. {}", i + 1, server);
    }
}

async fn run_server(config: DirAuthConfig) -> anyhow::Result<()> {
    info!("Starting Dirauth server...");
    info!("Search base: {}", config.ldap.base_dn);
    info!("Service account: {}", config.ldap.service_bind_dn);

    let server = DirAuthServer::new(config);
    if let Err(e) = server.run().await {
        error!(code = e.code(), "Dirauth server failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_win_over_config() {
        let cli = Cli::parse_from([
            "dirauth",
            "--bind",
            "127.0.0.1",
            "--port",
            "9090",
            "--log-format",
            "json",
            "server",
        ]);
        let mut config = DirAuthConfig::default();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.format, "json");
        assert!(matches!(cli.command, Some(Commands::Server)));
    }

    #[test]
    fn test_discover_subcommand() {
        let cli = Cli::parse_from(["dirauth", "discover", "corp.example"]);
        match cli.command {
            Some(Commands::Discover { domain }) => assert_eq!(domain, "corp.example"),
            _ => panic!("expected discover"),
        }
    }
}
