use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use lora_netid::activation::ActivationFile;
use lora_netid::config::{self, Overrides, ReportFormat};
use lora_netid::lorawan::{self, DevAddr, NetId};
use lora_netid::report::NetIdReport;

#[derive(Parser)]
#[command(name = "lora-netid")]
#[command(about = "Decode LoRaWAN DevAddrs into NetIDs and report devices per network")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level (overrides LOGGING_LEVEL and the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode DevAddrs and print their NetID
    Decode {
        /// DevAddrs as hex, e.g. 260B1234
        #[arg(required = true)]
        dev_addrs: Vec<String>,

        /// Print a JSON array instead of one line per address
        #[arg(long)]
        json: bool,
    },
    /// Build a DevAddr inside the block of a NetID
    Encode {
        /// NetID as hex, e.g. 000013
        net_id: String,

        /// Network-assigned part of the address, as hex
        #[arg(long, default_value = "0")]
        nwk_addr: String,
    },
    /// Count devices per NetID from an activation export
    Report {
        /// Activation export (overrides REPORT_INPUT)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (overrides REPORT_OUTPUT); stdout when unset
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (overrides REPORT_FORMAT)
        #[arg(short, long, value_enum, ignore_case = true)]
        format: Option<ReportFormat>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides = Overrides {
        logging_level: cli.log_level.clone(),
        ..Default::default()
    };
    if let Command::Report {
        input,
        output,
        format,
    } = &cli.command
    {
        overrides.report_input = input.clone();
        overrides.report_output = output.clone();
        overrides.report_format = *format;
    }

    // Load configuration
    let config = config::Config::resolve(&cli.config, &overrides)?;

    // Initialize tracing/logging on stderr, stdout carries results
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    debug!("lora-netid v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Decode { dev_addrs, json } => run_decode(&dev_addrs, json),
        Command::Encode { net_id, nwk_addr } => run_encode(&net_id, &nwk_addr),
        Command::Report { .. } => run_report(&config.report),
    }
}

fn run_decode(dev_addrs: &[String], json: bool) -> anyhow::Result<()> {
    let mut rows = Vec::with_capacity(dev_addrs.len());

    for input in dev_addrs {
        let result = lorawan::decode(input);
        if let Err(e) = &result {
            warn!("{}", e);
        }

        let addr_type = result.as_ref().ok().map(|net_id| net_id.addr_type());
        let bucket = lorawan::NetIdBucket::from(result);
        if !json {
            match addr_type {
                Some(t) => println!("{}\t{}\t{}", input, bucket, t),
                None => println!("{}\t{}", input, bucket),
            }
        }
        rows.push(serde_json::json!({
            "dev_addr": input,
            "net_id": bucket,
            "addr_type": addr_type,
        }));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    }
    Ok(())
}

fn run_encode(net_id: &str, nwk_addr: &str) -> anyhow::Result<()> {
    let net_id: NetId = net_id.parse()?;
    let nwk_addr = nwk_addr
        .parse::<DevAddr>()
        .map_err(|e| anyhow::anyhow!("Invalid NwkAddr: {}", e))?
        .value();

    let addr = DevAddr::from_net_id(net_id, nwk_addr)?;
    let (first, last) = DevAddr::range(net_id)?;

    debug!("NetID {} is address type {}", net_id, net_id.addr_type());
    println!("{}", addr);
    println!("{}..{}", first, last);
    Ok(())
}

fn run_report(report_config: &config::ReportConfig) -> anyhow::Result<()> {
    info!("Reading activations from {:?}", report_config.input);
    let source = ActivationFile::load(&report_config.input)?;
    let report = NetIdReport::from_source(&source);
    info!(
        "{} devices across {} NetID buckets",
        report.total(),
        report.entries().len()
    );

    let rendered = match report_config.format {
        ReportFormat::Text => report.to_string(),
        ReportFormat::Json => report.to_json(chrono::Utc::now())? + "\n",
    };

    match &report_config.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .map_err(|e| anyhow::anyhow!("Failed to write report to {:?}: {}", path, e))?;
            info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
