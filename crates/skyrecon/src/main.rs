mod args;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use skyrecon_aws::AwsDriver;
use skyrecon_config::ReconConfig;
use skyrecon_core::{
    CommandGateway, ProviderGateway, TracingCallLogger, WaitConfig, WaitPolicy,
};
use skyrecon_sim::{SimCloud, SimConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use commands::{
    cluster::ClusterCommands, config::ConfigCommands, disk::DiskCommands, image::ImageCommands,
    ip::IpCommands, keypair::KeyPairCommands, lb::LbCommands, regions::RegionCommands,
    sg::SgCommands, tag::TagCommands, vm::VmCommands, vpc::VpcCommands,
};

#[derive(Parser)]
#[command(name = "skyrecon")]
#[command(about = "Reconcile cloud resources through one canonical model", long_about = None)]
struct Cli {
    /// Config file (default: skyrecon.yaml discovery)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Region to operate in, overriding the config file
    #[arg(long, global = true, env = "SKYRECON_REGION")]
    region: Option<String>,

    /// Run against an in-memory cloud instead of the provider driver
    #[arg(long, global = true)]
    simulate: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Regions and zones
    #[command(subcommand)]
    Regions(RegionCommands),
    /// Block storage volumes
    #[command(subcommand)]
    Disk(DiskCommands),
    /// Virtual machines
    #[command(subcommand)]
    Vm(VmCommands),
    /// Machine images
    #[command(subcommand)]
    Image(ImageCommands),
    /// SSH key pairs
    #[command(subcommand)]
    Keypair(KeyPairCommands),
    /// Security groups and their rules
    #[command(subcommand)]
    Sg(SgCommands),
    /// Public IP addresses
    #[command(subcommand)]
    Ip(IpCommands),
    /// Tags on any resource
    #[command(subcommand)]
    Tag(TagCommands),
    /// Virtual networks and their subnets
    #[command(subcommand)]
    Vpc(VpcCommands),
    /// Network load balancers
    #[command(subcommand)]
    Lb(LbCommands),
    /// Managed Kubernetes clusters
    #[command(subcommand)]
    Cluster(ClusterCommands),
    /// Show version information
    Version,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ReconConfig> {
    let config = match path {
        Some(path) => skyrecon_config::load_from(path)?,
        None => skyrecon_config::load()?,
    };
    Ok(config)
}

/// Build the driver for the configured provider, or for the in-memory cloud
fn connect(cli: &Cli, config: &ReconConfig) -> AwsDriver {
    let mut settings = config.aws_settings(cli.region.as_deref());

    let gateway: Arc<dyn ProviderGateway> = if cli.simulate {
        // the simulated cloud settles on first read
        settings.wait = WaitPolicy::uniform(WaitConfig::fixed(
            Duration::from_millis(10),
            Duration::from_secs(10),
        ));
        Arc::new(SimCloud::with_config(SimConfig {
            region: settings.region.clone(),
            settle_reads: 0,
            ..Default::default()
        }))
    } else {
        Arc::new(CommandGateway::new(
            config.provider.name.clone(),
            config.gateway.command.clone(),
            config.gateway.args.clone(),
        ))
    };

    tracing::debug!(
        "connecting to {} in {}{}",
        config.provider.name,
        settings.region,
        if cli.simulate { " (simulated)" } else { "" }
    );
    AwsDriver::new(gateway, Arc::new(TracingCallLogger), settings)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Version needs no config
    if matches!(cli.command, Commands::Version) {
        println!("skyrecon {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;

    if let Commands::Config(cmd) = &cli.command {
        return commands::config::handle(cmd, &config, cli.config.as_deref(), cli.region.as_deref());
    }

    let driver = connect(&cli, &config);

    match cli.command {
        Commands::Regions(cmd) => commands::regions::handle(&driver, cmd).await,
        Commands::Disk(cmd) => commands::disk::handle(&driver, cmd).await,
        Commands::Vm(cmd) => commands::vm::handle(&driver, cmd).await,
        Commands::Image(cmd) => commands::image::handle(&driver, cmd).await,
        Commands::Keypair(cmd) => commands::keypair::handle(&driver, cmd).await,
        Commands::Sg(cmd) => commands::sg::handle(&driver, cmd).await,
        Commands::Ip(cmd) => commands::ip::handle(&driver, cmd).await,
        Commands::Tag(cmd) => commands::tag::handle(&driver, cmd).await,
        Commands::Vpc(cmd) => commands::vpc::handle(&driver, cmd).await,
        Commands::Lb(cmd) => commands::lb::handle(&driver, cmd).await,
        Commands::Cluster(cmd) => commands::cluster::handle(&driver, cmd).await,
        Commands::Config(_) | Commands::Version => Ok(()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Err(err) = &result {
        output::report_leftovers(err);
    }
    result
}
