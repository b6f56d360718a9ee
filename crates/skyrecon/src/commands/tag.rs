use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::KeyValue;
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum TagCommands {
    /// Set a tag on a resource
    Add {
        #[arg(value_parser = args::kind)]
        kind: ResourceKind,
        resource: String,
        /// KEY=VALUE
        #[arg(value_parser = args::tag)]
        tag: KeyValue,
    },
    List {
        #[arg(value_parser = args::kind)]
        kind: ResourceKind,
        resource: String,
    },
    Get {
        #[arg(value_parser = args::kind)]
        kind: ResourceKind,
        resource: String,
        key: String,
    },
    Remove {
        #[arg(value_parser = args::kind)]
        kind: ResourceKind,
        resource: String,
        key: String,
    },
    /// Resources of KIND with a tag key or value containing KEYWORD
    Find {
        #[arg(value_parser = args::kind)]
        kind: ResourceKind,
        keyword: String,
    },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: TagCommands) -> anyhow::Result<()> {
    let tags = driver.tags();
    match cmd {
        TagCommands::Add { kind, resource, tag } => {
            let tag = tags.add(kind, &args::iid(&resource), tag).await?;
            output::print_json(&tag)
        }
        TagCommands::List { kind, resource } => {
            output::print_json(&tags.list(kind, &args::iid(&resource)).await?)
        }
        TagCommands::Get {
            kind,
            resource,
            key,
        } => output::print_json(&tags.get(kind, &args::iid(&resource), &key).await?),
        TagCommands::Remove {
            kind,
            resource,
            key,
        } => {
            tags.remove(kind, &args::iid(&resource), &key).await?;
            output::done(format!("tag {} removed from {} {}", key, kind, resource));
            Ok(())
        }
        TagCommands::Find { kind, keyword } => {
            let found = tags.find(kind, &keyword).await?;
            output::count(kind, found.len());
            output::print_json(&found)
        }
    }
}
