use crate::{args, output};
use clap::Subcommand;
use colored::Colorize;
use skyrecon_core::model::{KeyPairRequest, KeyValue};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum KeyPairCommands {
    /// Create a key pair; the private key is printed once
    Create {
        name: String,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { key_pair: String },
    Delete { key_pair: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: KeyPairCommands) -> anyhow::Result<()> {
    let key_pairs = driver.key_pairs();
    match cmd {
        KeyPairCommands::Create { name, tags } => {
            let info = key_pairs.create(KeyPairRequest { name, tags }).await?;
            output::done(format!("key pair {} created", output::iid(&info.iid)));
            if info.private_key.is_some() {
                eprintln!(
                    "{}",
                    "the private key is only shown now; store it safely".yellow()
                );
            }
            output::print_json(&info)
        }
        KeyPairCommands::List => {
            let list = key_pairs.list().await?;
            output::count(ResourceKind::KeyPair, list.len());
            output::print_json(&list)
        }
        KeyPairCommands::Get { key_pair } => {
            output::print_json(&key_pairs.get(&args::iid(&key_pair)).await?)
        }
        KeyPairCommands::Delete { key_pair } => {
            let target = args::iid(&key_pair);
            let gone = key_pairs.delete(&target).await?;
            output::deleted(ResourceKind::KeyPair, &target, gone);
            Ok(())
        }
    }
}
