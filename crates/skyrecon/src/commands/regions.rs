use crate::output;
use clap::Subcommand;
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum RegionCommands {
    /// List regions with their zones
    List,
    /// Show one region
    Get { region: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: RegionCommands) -> anyhow::Result<()> {
    match cmd {
        RegionCommands::List => {
            let regions = driver.regions().list().await?;
            output::count(ResourceKind::Region, regions.len());
            output::print_json(&regions)
        }
        RegionCommands::Get { region } => {
            let info = driver.regions().get(&region).await?;
            output::print_json(&info)
        }
    }
}
