use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{KeyValue, PublicIpRequest};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum IpCommands {
    /// Allocate a public IP
    Create {
        name: String,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { ip: String },
    /// Release an IP; it must not be associated
    Delete { ip: String },
    Associate { ip: String, vm: String },
    Disassociate { ip: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: IpCommands) -> anyhow::Result<()> {
    let ips = driver.public_ips();
    match cmd {
        IpCommands::Create { name, tags } => {
            let info = ips.create(PublicIpRequest { name, tags }).await?;
            output::done(format!(
                "public ip {} allocated: {}",
                output::iid(&info.iid),
                info.public_ip
            ));
            output::print_json(&info)
        }
        IpCommands::List => {
            let list = ips.list().await?;
            output::count(ResourceKind::PublicIp, list.len());
            output::print_json(&list)
        }
        IpCommands::Get { ip } => output::print_json(&ips.get(&args::iid(&ip)).await?),
        IpCommands::Delete { ip } => {
            let target = args::iid(&ip);
            let gone = ips.delete(&target).await?;
            output::deleted(ResourceKind::PublicIp, &target, gone);
            Ok(())
        }
        IpCommands::Associate { ip, vm } => {
            let info = ips.associate(&args::iid(&ip), &args::iid(&vm)).await?;
            output::done(format!("{} is associated with {}", info.public_ip, vm));
            output::print_json(&info)
        }
        IpCommands::Disassociate { ip } => {
            let info = ips.disassociate(&args::iid(&ip)).await?;
            output::print_json(&info)
        }
    }
}
