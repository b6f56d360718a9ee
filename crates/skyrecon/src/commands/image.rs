use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{ImageRequest, KeyValue};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum ImageCommands {
    /// Capture an image from a VM
    Create {
        name: String,
        /// Source VM
        #[arg(long)]
        vm: String,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { image: String },
    Delete { image: String },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: ImageCommands) -> anyhow::Result<()> {
    let images = driver.images();
    match cmd {
        ImageCommands::Create { name, vm, tags } => {
            output::step(format!("capturing image {} from {}", name, vm));
            let info = images
                .create(ImageRequest {
                    name,
                    source_vm: args::iid(&vm),
                    tags,
                })
                .await?;
            output::done(format!("image {} is {}", output::iid(&info.iid), info.status));
            output::print_json(&info)
        }
        ImageCommands::List => {
            let list = images.list().await?;
            output::count(ResourceKind::Image, list.len());
            output::print_json(&list)
        }
        ImageCommands::Get { image } => {
            output::print_json(&images.get(&args::iid(&image)).await?)
        }
        ImageCommands::Delete { image } => {
            let target = args::iid(&image);
            let gone = images.delete(&target).await?;
            output::deleted(ResourceKind::Image, &target, gone);
            Ok(())
        }
    }
}
