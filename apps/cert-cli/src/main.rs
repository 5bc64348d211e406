use std::path::PathBuf;

use cert_client::CertClient;
use cert_client::config::core_config::AppConfig;
use cert_cli::{CliConfig, command};
use clap::{Parser, Subcommand};
use shared_types::CertificateId;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config files applied in order, later ones win
    #[arg(short, long, value_name = "FILE")]
    config: Option<Vec<PathBuf>>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every certificate
    List,
    /// Print one certificate
    Get { id: CertificateId },
    /// Submit a certificate application
    Apply {
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = command::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Submit an application for immediate issuance, without form validation
    OneClick {
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = command::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Save the issued certificate file of an application
    Download {
        id: CertificateId,
        /// Target file or directory, defaults to the name the service suggests
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Save a file stored by the service
    File {
        name: String,
        /// Target file or directory, defaults to the file's own name
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Validate fields without submitting
    Check {
        #[arg(short, long = "field", value_name = "NAME=VALUE", value_parser = command::parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_files = cli.config.unwrap_or_default();
    let app_config: AppConfig<CliConfig> = AppConfig::from_files(&config_files)?;

    initialize_tracing(&app_config.app)?;

    let client = CertClient::new(app_config.client)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            match cli.command {
                Command::List => command::list(&client, &mut std::io::stdout()).await,
                Command::Get { id } => command::get(&client, id, &mut std::io::stdout()).await,
                Command::Apply { fields } => {
                    command::apply(&client, fields, std::io::stdout()).await
                }
                Command::OneClick { fields } => {
                    command::one_click(&client, fields, &mut std::io::stdout()).await
                }
                Command::Download { id, output } => {
                    command::download(&client, id, output, &mut std::io::stdout()).await
                }
                Command::File { name, output } => {
                    command::file(&client, &name, output, &mut std::io::stdout()).await
                }
                Command::Check { fields } => command::check(&client, fields, std::io::stdout()),
            }
        })
}

fn initialize_tracing(config: &CliConfig) -> anyhow::Result<()> {
    // Create a filter based on the log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(config.trace_level.as_deref().unwrap_or("info"))
    })?;

    let tracing_layer = tracing_subscriber::registry().with(filter);

    // stdout carries the command output
    if config.trace_json.unwrap_or_default() {
        tracing_layer
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_layer
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    };

    Ok(())
}
