mod cli;
mod core;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::config::AppConfig;

#[derive(Parser)]
#[command(name = "mbu", about = "Microsoft 365 mailbox usage report", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format (text|json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate mailbox details with the usage report
    Report {
        /// Only list mailboxes whose quota is known
        #[arg(long)]
        only_with_quota: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the config file path
    Path,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None | Some(Commands::Report { .. }) => {
            let only_with_quota = matches!(
                cli.command,
                Some(Commands::Report {
                    only_with_quota: true
                })
            );
            let config = AppConfig::load()?;

            let format = if cli.json {
                OutputFormat::Json
            } else {
                let name = cli
                    .format
                    .as_deref()
                    .unwrap_or(&config.settings.default_format);
                OutputFormat::from_name(name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown output format: '{}'", name))?
            };
            let output_opts = OutputOptions {
                format,
                pretty: cli.pretty,
                use_color: cli::output::detect_color(!cli.no_color, &config.settings.color),
            };

            cli::report_cmd::run(&config, only_with_quota, &output_opts).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init()?,
            ConfigAction::Check => cli::config_cmd::check()?,
            ConfigAction::Path => cli::config_cmd::path()?,
        },
    }

    Ok(())
}
