use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{DiskRequest, KeyValue};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum DiskCommands {
    /// Create a volume and wait until it is available
    Create {
        name: String,
        /// Volume type (catalog default when omitted)
        #[arg(long = "type")]
        disk_type: Option<String>,
        /// Size in GB (type minimum when omitted)
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        /// KEY=VALUE, repeatable
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    /// Show a volume by name or id
    Get { disk: String },
    Delete { disk: String },
    /// Attach a volume to a VM
    Attach { disk: String, vm: String },
    /// Detach a volume from a VM
    Detach { disk: String, vm: String },
    /// Grow a volume to SIZE GB
    Resize { disk: String, size: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: DiskCommands) -> anyhow::Result<()> {
    let disks = driver.disks();
    match cmd {
        DiskCommands::Create {
            name,
            disk_type,
            size,
            zone,
            tags,
        } => {
            output::step(format!("creating disk {}", name));
            let info = disks
                .create(DiskRequest {
                    name,
                    zone,
                    disk_type: disk_type.unwrap_or_default(),
                    disk_size: size.unwrap_or_default(),
                    tags,
                })
                .await?;
            output::done(format!(
                "disk {} is {} ({} GB {})",
                output::iid(&info.iid),
                info.status,
                info.disk_size,
                info.disk_type
            ));
            output::print_json(&info)
        }
        DiskCommands::List => {
            let list = disks.list().await?;
            output::count(ResourceKind::Disk, list.len());
            output::print_json(&list)
        }
        DiskCommands::Get { disk } => output::print_json(&disks.get(&args::iid(&disk)).await?),
        DiskCommands::Delete { disk } => {
            let target = args::iid(&disk);
            let gone = disks.delete(&target).await?;
            output::deleted(ResourceKind::Disk, &target, gone);
            Ok(())
        }
        DiskCommands::Attach { disk, vm } => {
            output::step(format!("attaching {} to {}", disk, vm));
            let info = disks.attach(&args::iid(&disk), &args::iid(&vm)).await?;
            output::done(format!("disk {} is {}", output::iid(&info.iid), info.status));
            output::print_json(&info)
        }
        DiskCommands::Detach { disk, vm } => {
            output::step(format!("detaching {} from {}", disk, vm));
            disks.detach(&args::iid(&disk), &args::iid(&vm)).await?;
            output::done(format!("disk {} detached", disk));
            Ok(())
        }
        DiskCommands::Resize { disk, size } => {
            let info = disks.change_size(&args::iid(&disk), &size).await?;
            output::done(format!(
                "disk {} is now {} GB",
                output::iid(&info.iid),
                info.disk_size
            ));
            output::print_json(&info)
        }
    }
}
