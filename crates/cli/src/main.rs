//! Signed request CLI.
//!
//! This tool provides commands for:
//! - Deriving the identity address of a private key
//! - Printing the authentication headers for a request
//! - Uploading a file to a verifying server as a signed multipart request
//! - Validating configuration files

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use signed_request_common::logging::{init_logging, level_for_verbosity};

mod config;
mod error;
mod sign;
mod upload;

use error::CliError;

#[derive(Parser)]
#[command(name = "srcli")]
#[command(about = "Sign HTTP requests with a secp256k1 identity key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Hex private key, overrides `[signing] private_key`
    #[arg(long, global = true, env = "SIGNED_REQUEST_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Path to a TOML configuration file (defaults to the built-in configuration)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the identity address of the signing key
    Address,

    /// Print the authentication headers for a request
    Sign {
        /// HTTP method
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Request path including any query string
        #[arg(long, short, default_value = "/")]
        path: String,

        /// Request body as a literal string
        #[arg(long, conflicts_with = "body_file")]
        data: Option<String>,

        /// Read the request body from a file
        #[arg(long)]
        body_file: Option<PathBuf>,

        /// Unix timestamp to sign (defaults to now)
        #[arg(long)]
        timestamp: Option<i64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Upload a file as a signed multipart POST
    Upload {
        /// Server base URL
        #[arg(long, short)]
        server: String,

        /// File to upload
        #[arg(long, short)]
        file: PathBuf,

        /// Request path
        #[arg(long, short, default_value = "/")]
        path: String,

        /// Multipart field name
        #[arg(long, default_value = "file")]
        field: String,

        /// MIME type of the file part
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file, including environment overrides
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(level_for_verbosity(cli.verbose)) {
        eprintln!("Warning: failed to initialise logging: {}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let key = cli.key.as_deref();
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Address => {
            let settings = config::load_settings(config_file)?;
            let signer = config::resolve_signer(key, &settings)?;
            println!("{}", signer.address());
            Ok(())
        }
        Commands::Sign {
            method,
            path,
            data,
            body_file,
            timestamp,
            format,
        } => {
            let settings = config::load_settings(config_file)?;
            let signer = config::resolve_signer(key, &settings)?;
            let body = sign::read_body(data, body_file.as_deref())?;
            let output = sign::render_signed_headers(
                &signer,
                &settings,
                &sign::SignArgs {
                    method: &method,
                    path: &path,
                    timestamp,
                    body: &body,
                },
                format,
            )?;
            println!("{}", output);
            Ok(())
        }
        Commands::Upload {
            server,
            file,
            path,
            field,
            mime,
        } => {
            let settings = config::load_settings(config_file)?;
            let signer = config::resolve_signer(key, &settings)?;
            let status = upload::upload_file(
                &signer,
                &settings,
                &upload::UploadArgs {
                    server: &server,
                    path: &path,
                    file: &file,
                    field: &field,
                    mime: &mime,
                },
            )?;
            println!("Uploaded {} as {} ({})", file.display(), signer.address(), status);
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { file } => config::validate(&file, cli.verbose),
        },
    }
}
