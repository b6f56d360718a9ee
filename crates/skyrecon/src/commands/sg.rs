use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{KeyValue, SecurityGroupRequest, SecurityRule};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum SgCommands {
    /// Create a security group
    Create {
        name: String,
        #[arg(long)]
        vpc: String,
        #[arg(long, default_value = "")]
        description: String,
        /// DIRECTION:PROTOCOL:PORTS:CIDR, repeatable
        #[arg(long = "rule", value_parser = args::rule)]
        rules: Vec<SecurityRule>,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { sg: String },
    Delete { sg: String },
    /// Add rules; rules already present are left alone
    AddRules {
        sg: String,
        #[arg(required = true, value_parser = args::rule)]
        rules: Vec<SecurityRule>,
    },
    RemoveRules {
        sg: String,
        #[arg(required = true, value_parser = args::rule)]
        rules: Vec<SecurityRule>,
    },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: SgCommands) -> anyhow::Result<()> {
    let groups = driver.security_groups();
    match cmd {
        SgCommands::Create {
            name,
            vpc,
            description,
            rules,
            tags,
        } => {
            let info = groups
                .create(SecurityGroupRequest {
                    name,
                    vpc_id: vpc,
                    description,
                    rules,
                    tags,
                })
                .await?;
            output::done(format!(
                "security group {} created with {} rule(s)",
                output::iid(&info.iid),
                info.rules.len()
            ));
            output::print_json(&info)
        }
        SgCommands::List => {
            let list = groups.list().await?;
            output::count(ResourceKind::SecurityGroup, list.len());
            output::print_json(&list)
        }
        SgCommands::Get { sg } => output::print_json(&groups.get(&args::iid(&sg)).await?),
        SgCommands::Delete { sg } => {
            let target = args::iid(&sg);
            let gone = groups.delete(&target).await?;
            output::deleted(ResourceKind::SecurityGroup, &target, gone);
            Ok(())
        }
        SgCommands::AddRules { sg, rules } => {
            let info = groups.add_rules(&args::iid(&sg), &rules).await?;
            output::print_json(&info)
        }
        SgCommands::RemoveRules { sg, rules } => {
            let info = groups.remove_rules(&args::iid(&sg), &rules).await?;
            output::print_json(&info)
        }
    }
}
