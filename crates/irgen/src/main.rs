use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use irgen::cmd_convert::{self, ConvertArgs, OutputFormat};
use irgen::cmd_inspect::{self, InspectArgs};
use irgen::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "irgen",
    version,
    about = "Convert spreadsheet register maps to IP-XACT"
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Configuration file (defaults to ./irgen.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Convert a workbook into an IP-XACT (or RegVue) document
    Convert {
        /// Input spreadsheet
        #[arg(short, long)]
        excel: PathBuf,
        /// Output file (defaults to the input stem with .xml/.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        vendor_sheet: Option<String>,
        #[arg(long)]
        address_sheet: Option<String>,
        /// IP-XACT revision, e.g. 1685-2014
        #[arg(long)]
        ipxact_version: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Ipxact)]
        format: OutputFormat,
        /// Directory holding <version>/index.xsd for xmllint validation
        #[arg(long)]
        xsd_dir: Option<PathBuf>,
        /// Skip validation of the written document
        #[arg(long)]
        no_validate: bool,
    },
    /// List the address blocks and registers a workbook converts to
    Inspect {
        #[arg(short, long)]
        excel: PathBuf,
        #[arg(long)]
        vendor_sheet: Option<String>,
        #[arg(long)]
        address_sheet: Option<String>,
        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let Cli {
        verbose,
        config,
        cmd,
    } = Cli::parse();

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .init();

    let config = Config::load(config.as_deref())?;

    match cmd {
        Cmd::Convert {
            excel,
            output,
            vendor_sheet,
            address_sheet,
            ipxact_version,
            format,
            xsd_dir,
            no_validate,
        } => {
            let args = ConvertArgs {
                excel,
                output,
                vendor_sheet,
                address_sheet,
                ipxact_version,
                format,
                xsd_dir,
                no_validate,
            };
            cmd_convert::run(args, &config)?
        }
        Cmd::Inspect {
            excel,
            vendor_sheet,
            address_sheet,
            json,
        } => {
            let args = InspectArgs {
                excel,
                vendor_sheet,
                address_sheet,
                json,
            };
            cmd_inspect::run(args, &config)?
        }
    };

    Ok(())
}
