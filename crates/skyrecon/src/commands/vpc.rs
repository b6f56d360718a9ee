use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{KeyValue, SubnetRequest, VpcRequest};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum VpcCommands {
    /// Create the network, its internet gateway and default route, then each subnet
    Create {
        name: String,
        #[arg(long, default_value = "10.0.0.0/16")]
        cidr: String,
        /// name=..,cidr=..[,zone=..] (repeatable)
        #[arg(long = "subnet", value_parser = args::subnet)]
        subnets: Vec<SubnetRequest>,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { vpc: String },
    /// Delete subnets, the default route and gateway, then the network
    Delete { vpc: String },
    AddSubnet {
        vpc: String,
        #[arg(value_parser = args::subnet)]
        subnet: SubnetRequest,
    },
    RemoveSubnet { vpc: String, subnet: String },
    Subnets { vpc: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: VpcCommands) -> anyhow::Result<()> {
    let vpcs = driver.vpcs();
    match cmd {
        VpcCommands::Create {
            name,
            cidr,
            subnets,
            tags,
        } => {
            output::step(format!(
                "creating vpc {} ({}) with {} subnet(s)",
                name,
                cidr,
                subnets.len()
            ));
            let info = vpcs
                .create(VpcRequest {
                    name,
                    ipv4_cidr: cidr,
                    subnets,
                    tags,
                })
                .await?;
            output::done(format!("vpc {} is ready", output::iid(&info.iid)));
            output::print_json(&info)
        }
        VpcCommands::List => {
            let list = vpcs.list().await?;
            output::count(ResourceKind::Vpc, list.len());
            output::print_json(&list)
        }
        VpcCommands::Get { vpc } => output::print_json(&vpcs.get(&args::iid(&vpc)).await?),
        VpcCommands::Delete { vpc } => {
            let target = args::iid(&vpc);
            output::step(format!("deleting vpc {}", vpc));
            let gone = vpcs.delete(&target).await?;
            output::deleted(ResourceKind::Vpc, &target, gone);
            Ok(())
        }
        VpcCommands::AddSubnet { vpc, subnet } => {
            output::step(format!("adding subnet {} to {}", subnet.name, vpc));
            let info = vpcs.add_subnet(&args::iid(&vpc), subnet).await?;
            output::done(format!(
                "vpc {} has {} subnet(s)",
                output::iid(&info.iid),
                info.subnets.len()
            ));
            output::print_json(&info)
        }
        VpcCommands::RemoveSubnet { vpc, subnet } => {
            let target = args::iid(&subnet);
            let gone = vpcs.remove_subnet(&args::iid(&vpc), &target).await?;
            output::deleted(ResourceKind::Subnet, &target, gone);
            Ok(())
        }
        VpcCommands::Subnets { vpc } => {
            let list = vpcs.list_subnets(&args::iid(&vpc)).await?;
            output::count(ResourceKind::Subnet, list.len());
            output::print_json(&list)
        }
    }
}
