//! `certmail` - extract plain mail, PEC messages and PEC receipts from `.eml` files
//!
//! Prints the extracted entity as JSON on standard output.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use certmail_core::{MailParser, ParserConfig, TransportType};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "certmail",
    version,
    about = "Extract plain email, PEC certified mail and PEC receipts as JSON"
)]
struct Cli {
    /// Message file (RFC 5322 `.eml`)
    file: PathBuf,

    /// Include every top-level header, in wire order
    #[arg(long)]
    all_headers: bool,

    /// Transport type whose daticert.xml is bound (repeatable)
    #[arg(long = "certify", value_name = "TYPE", value_parser = parse_transport)]
    certify: Vec<TransportType>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn config(&self) -> ParserConfig {
        let mut builder = ParserConfig::builder().extract_all_headers(self.all_headers);
        for transport in &self.certify {
            builder = builder.certify_transport(*transport);
        }
        builder.build()
    }
}

fn parse_transport(value: &str) -> std::result::Result<TransportType, String> {
    match TransportType::from_wire(value) {
        TransportType::Unknown => Err(format!(
            "unknown transport type '{value}' (expected '{}' or '{}')",
            TransportType::PostaCertificata.as_str(),
            TransportType::Errore.as_str()
        )),
        transport => Ok(transport),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certmail=info,certmail_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let parser = MailParser::new(cli.config());

    let entity = parser
        .parse_file(&cli.file)
        .with_context(|| format!("Failed to parse {}", cli.file.display()))?;
    info!(
        "{} is a {} message",
        cli.file.display(),
        entity.entity_type().as_str()
    );

    let json = if cli.pretty {
        serde_json::to_string_pretty(&entity)
    } else {
        serde_json::to_string(&entity)
    }
    .context("Failed to serialize result")?;
    println!("{json}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["certmail", "message.eml"]).unwrap();
        let config = cli.config();

        assert!(!config.extract_all_headers);
        assert!(config.is_certified(TransportType::PostaCertificata));
        assert!(!config.is_certified(TransportType::Errore));
        assert!(!cli.pretty);
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "certmail",
            "--all-headers",
            "--certify",
            "errore",
            "--pretty",
            "message.eml",
        ])
        .unwrap();
        let config = cli.config();

        assert!(config.extract_all_headers);
        assert!(config.is_certified(TransportType::Errore));
        assert!(config.is_certified(TransportType::PostaCertificata));
        assert_eq!(cli.file, PathBuf::from("message.eml"));
    }

    #[test]
    fn test_unknown_transport_rejected() {
        assert!(Cli::try_parse_from(["certmail", "--certify", "bogus", "m.eml"]).is_err());
        assert!(parse_transport("bogus").is_err());
    }

    #[test]
    fn test_file_required() {
        assert!(Cli::try_parse_from(["certmail"]).is_err());
    }
}
