use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{KeyValue, VmRequest};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum VmCommands {
    /// Launch a VM and wait until it is running
    Create {
        name: String,
        #[arg(long)]
        image: String,
        /// Instance type, e.g. t3.micro
        #[arg(long)]
        spec: String,
        #[arg(long)]
        key_pair: Option<String>,
        /// Repeatable
        #[arg(long = "security-group")]
        security_groups: Vec<String>,
        #[arg(long)]
        subnet: Option<String>,
        /// KEY=VALUE, repeatable
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { vm: String },
    /// Show only the canonical status
    Status { vm: String },
    Start { vm: String },
    Stop { vm: String },
    Reboot { vm: String },
    /// Terminate and wait until terminated
    Delete { vm: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: VmCommands) -> anyhow::Result<()> {
    let vms = driver.vms();
    match cmd {
        VmCommands::Create {
            name,
            image,
            spec,
            key_pair,
            security_groups,
            subnet,
            tags,
        } => {
            output::step(format!("launching vm {} ({})", name, spec));
            let info = vms
                .create(VmRequest {
                    name,
                    image,
                    vm_spec: spec,
                    key_pair: key_pair.as_deref().map(args::iid),
                    security_groups: args::iids(&security_groups),
                    subnet_id: subnet,
                    tags,
                })
                .await?;
            output::done(format!("vm {} is {}", output::iid(&info.iid), info.status));
            output::print_json(&info)
        }
        VmCommands::List => {
            let list = vms.list().await?;
            output::count(ResourceKind::Vm, list.len());
            output::print_json(&list)
        }
        VmCommands::Get { vm } => output::print_json(&vms.get(&args::iid(&vm)).await?),
        VmCommands::Status { vm } => {
            println!("{}", vms.status(&args::iid(&vm)).await?);
            Ok(())
        }
        VmCommands::Start { vm } => {
            let status = vms.start(&args::iid(&vm)).await?;
            output::done(format!("vm {} is {}", vm, status));
            Ok(())
        }
        VmCommands::Stop { vm } => {
            let status = vms.stop(&args::iid(&vm)).await?;
            output::done(format!("vm {} is {}", vm, status));
            Ok(())
        }
        VmCommands::Reboot { vm } => {
            let status = vms.reboot(&args::iid(&vm)).await?;
            output::done(format!("vm {} is {}", vm, status));
            Ok(())
        }
        VmCommands::Delete { vm } => {
            let target = args::iid(&vm);
            output::step(format!("terminating vm {}", vm));
            let gone = vms.delete(&target).await?;
            output::deleted(ResourceKind::Vm, &target, gone);
            Ok(())
        }
    }
}
