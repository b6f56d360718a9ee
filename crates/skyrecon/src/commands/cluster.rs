use crate::{args, output};
use clap::Subcommand;
use skyrecon_core::model::{
    ClusterNetwork, ClusterRequest, KeyValue, NodeGroupRequest, NodeGroupScaling,
};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum ClusterCommands {
    /// Create the control plane, then each node group
    Create {
        name: String,
        /// Kubernetes version, e.g. 1.29
        #[arg(long, default_value = "")]
        version: String,
        #[arg(long)]
        vpc: String,
        /// Repeatable
        #[arg(long = "subnet")]
        subnets: Vec<String>,
        /// Repeatable
        #[arg(long = "security-group")]
        security_groups: Vec<String>,
        /// name=..,spec=..,desired=..[,min=..][,max=..][,image=..][,disk=..][,key=..]
        #[arg(long = "node-group", value_parser = args::node_group)]
        node_groups: Vec<NodeGroupRequest>,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { cluster: String },
    /// Delete node groups, then the control plane
    Delete { cluster: String },
    AddNodeGroup {
        cluster: String,
        #[arg(value_parser = args::node_group)]
        node_group: NodeGroupRequest,
    },
    RemoveNodeGroup { cluster: String, node_group: String },
    /// Change a node group's size bounds
    Scale {
        cluster: String,
        node_group: String,
        #[arg(long)]
        desired: u32,
        #[arg(long)]
        min: u32,
        #[arg(long)]
        max: u32,
    },
}

pub async fn handle(driver: &dyn CloudDriver, cmd: ClusterCommands) -> anyhow::Result<()> {
    let clusters = driver.clusters();
    match cmd {
        ClusterCommands::Create {
            name,
            version,
            vpc,
            subnets,
            security_groups,
            node_groups,
            tags,
        } => {
            output::step(format!(
                "creating cluster {} with {} node group(s)",
                name,
                node_groups.len()
            ));
            let info = clusters
                .create(ClusterRequest {
                    name,
                    version,
                    network: ClusterNetwork {
                        vpc_id: vpc,
                        subnet_ids: subnets,
                        security_group_ids: security_groups,
                    },
                    node_groups,
                    tags,
                })
                .await?;
            output::done(format!("cluster {} is {}", output::iid(&info.iid), info.status));
            output::print_json(&info)
        }
        ClusterCommands::List => {
            let list = clusters.list().await?;
            output::count(ResourceKind::Cluster, list.len());
            output::print_json(&list)
        }
        ClusterCommands::Get { cluster } => {
            output::print_json(&clusters.get(&args::iid(&cluster)).await?)
        }
        ClusterCommands::Delete { cluster } => {
            let target = args::iid(&cluster);
            output::step(format!("deleting cluster {}", cluster));
            let gone = clusters.delete(&target).await?;
            output::deleted(ResourceKind::Cluster, &target, gone);
            Ok(())
        }
        ClusterCommands::AddNodeGroup {
            cluster,
            node_group,
        } => {
            output::step(format!("adding node group {} to {}", node_group.name, cluster));
            let info = clusters
                .add_node_group(&args::iid(&cluster), node_group)
                .await?;
            output::done(format!(
                "node group {} is {}",
                output::iid(&info.iid),
                info.status
            ));
            output::print_json(&info)
        }
        ClusterCommands::RemoveNodeGroup {
            cluster,
            node_group,
        } => {
            let target = args::iid(&node_group);
            let gone = clusters
                .remove_node_group(&args::iid(&cluster), &target)
                .await?;
            output::deleted(ResourceKind::NodeGroup, &target, gone);
            Ok(())
        }
        ClusterCommands::Scale {
            cluster,
            node_group,
            desired,
            min,
            max,
        } => {
            let info = clusters
                .scale_node_group(
                    &args::iid(&cluster),
                    &args::iid(&node_group),
                    NodeGroupScaling {
                        desired_size: desired,
                        min_size: min,
                        max_size: max,
                    },
                )
                .await?;
            output::done(format!(
                "node group {} has {} node(s)",
                output::iid(&info.iid),
                info.nodes.len()
            ));
            output::print_json(&info)
        }
    }
}
