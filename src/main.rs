use clap::Parser;
use flow_tape::cli::{Cli, Commands};
use flow_tape::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };

    // Initialize telemetry
    let _telemetry = flow_tape::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(url = %args.apply(&config).stream.url, "Starting flow capture");
            args.execute(&config).await?;
        }
        Commands::Export(args) => {
            args.execute(&config).await?;
        }
        Commands::Tail(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Stream: {}", config.stream.url);
            println!(
                "  Reconnect: {:?} (initial {}ms, max {}ms, attempts {})",
                config.stream.reconnect.strategy,
                config.stream.reconnect.initial_delay_ms,
                config.stream.reconnect.max_delay_ms,
                config.stream.reconnect.max_attempts
            );
            println!("  Tape: {}", config.log.path.display());
            println!(
                "  Table: snapshot {} rows, cap {}",
                config.table.snapshot_limit,
                match config.table.max_rows {
                    0 => "none".to_string(),
                    n => n.to_string(),
                }
            );
            println!("  Expiry policy: {:?}", config.normalize.expiry_policy);
            println!("  Refresh: every {}s", config.ui.refresh_interval_secs);
        }
    }

    Ok(())
}
