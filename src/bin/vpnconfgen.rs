//! vpnconfgen - AWS VPN configuration generator CLI
//!
//! Reads an AWS site-to-site VPN connection description (the
//! CustomerGatewayConfiguration XML download or describe-vpn-connections
//! JSON output) and renders daemon configuration files from it.

use clap::Parser;
use libvpnconfgen::aws::{self, ImportOptions};
use libvpnconfgen::error::ConfgenResult;
use libvpnconfgen::render::{ConfigFormat, FormatRegistry};
use libvpnconfgen::output;
use std::path::PathBuf;
use std::process;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "vpnconfgen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Generate on-premises VPN and routing daemon configs from AWS site-to-site VPN connections",
    long_about = None
)]
struct Cli {
    /// Source document: CustomerGatewayConfiguration XML or
    /// describe-vpn-connections JSON; '-' reads stdin
    #[arg(short, long, required_unless_present = "list_formats")]
    input: Option<String>,

    /// Format(s) to generate; one identifier or an IPSec+BGP pair
    /// joined with '-' (e.g. 'strongswan-quagga')
    #[arg(short, long, default_value = "strongswan-quagga")]
    format: String,

    /// Connection name override (otherwise derived from the Name tag)
    #[arg(long)]
    name: Option<String>,

    /// AWS region, used in the derived connection name
    #[arg(long, default_value = "us-east-1")]
    region: String,

    /// Tag key the connection name is derived from (JSON input)
    #[arg(long, default_value = "Name")]
    name_tag: String,

    /// VPC CIDR block behind the VPN gateway (traffic selectors,
    /// BGP network advertisement)
    #[arg(long)]
    vpc_cidr: Option<String>,

    /// On-premises network CIDR
    #[arg(long)]
    local_cidr: Option<String>,

    /// Write artifacts into this directory instead of stdout
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// List supported format identifiers and exit
    #[arg(long)]
    list_formats: bool,
}

/// Split a format spec like "strongswan-quagga" into its parts
fn parse_formats(spec: &str) -> ConfgenResult<Vec<ConfigFormat>> {
    spec.split('-').map(str::parse).collect()
}

async fn read_source(input: &str) -> ConfgenResult<String> {
    if input == "-" {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        Ok(content)
    } else {
        Ok(tokio::fs::read_to_string(input).await?)
    }
}

async fn run(cli: Cli) -> ConfgenResult<()> {
    let registry = FormatRegistry::with_defaults();

    if cli.list_formats {
        for format in registry.available_formats() {
            println!("{}", format);
        }
        return Ok(());
    }

    // clap enforces --input unless --list-formats was given
    let input = cli.input.as_deref().unwrap_or("-");
    let content = read_source(input).await?;

    let formats = parse_formats(&cli.format)?;

    let opts = ImportOptions {
        name: cli.name.clone(),
        region: cli.region.clone(),
        name_tag: cli.name_tag.clone(),
        vpc_cidr: cli.vpc_cidr.clone(),
        local_cidr: cli.local_cidr.clone(),
    };
    let conn = aws::parse_source(&content, &opts)?;

    for format in formats {
        let rendered = registry.generate(format.as_str(), &conn)?;

        match &cli.output_dir {
            Some(dir) => {
                let written =
                    output::write_artifacts(&rendered, format, conn.name(), dir).await?;
                for path in written {
                    println!("{}", path.display());
                }
            }
            None => output::print_artifacts(&rendered),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for rendered configs
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(
            parse_formats("strongswan").unwrap(),
            vec![ConfigFormat::Strongswan]
        );
        assert_eq!(
            parse_formats("strongswan-quagga").unwrap(),
            vec![ConfigFormat::Strongswan, ConfigFormat::Quagga]
        );
        assert_eq!(
            parse_formats("racoon-bird").unwrap(),
            vec![ConfigFormat::Racoon, ConfigFormat::Bird]
        );

        assert!(parse_formats("strongswan-nonsense").is_err());
        assert!(parse_formats("").is_err());
    }
}
