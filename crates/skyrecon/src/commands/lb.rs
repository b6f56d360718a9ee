use crate::{args, output};
use clap::{Args, Subcommand};
use skyrecon_core::model::{
    HealthCheckerRequest, KeyValue, ListenerRequest, LoadBalancerRequest, TargetGroupRequest,
};
use skyrecon_core::{CloudDriver, ResourceKind};

#[derive(Subcommand)]
pub enum LbCommands {
    /// Create target group, listener and balancer
    Create {
        name: String,
        #[arg(long)]
        vpc: String,
        /// Repeatable
        #[arg(long = "subnet")]
        subnets: Vec<String>,
        /// internet-facing (default) or internal
        #[arg(long)]
        scheme: Option<String>,
        /// Client-facing PROTOCOL:PORT
        #[arg(long, value_parser = args::endpoint)]
        listener: (String, String),
        /// Member-facing PROTOCOL:PORT
        #[arg(long, value_parser = args::endpoint)]
        target: (String, String),
        /// Member VM, repeatable
        #[arg(long = "member")]
        members: Vec<String>,
        #[command(flatten)]
        health: HealthArgs,
        #[arg(long = "tag", value_parser = args::tag)]
        tags: Vec<KeyValue>,
    },
    List,
    Get { lb: String },
    /// Delete balancer, listener and target group
    Delete { lb: String },
    AddMembers {
        lb: String,
        #[arg(required = true)]
        vms: Vec<String>,
    },
    RemoveMembers {
        lb: String,
        #[arg(required = true)]
        vms: Vec<String>,
    },
    /// Health of each member
    Health { lb: String },
    /// Replace the listener's PROTOCOL:PORT
    Listener {
        lb: String,
        #[arg(value_parser = args::endpoint)]
        endpoint: (String, String),
    },
    /// Change health check settings
    HealthCheck {
        lb: String,
        #[command(flatten)]
        health: HealthArgs,
    },
}

#[derive(Args)]
pub struct HealthArgs {
    /// Health check protocol
    #[arg(long = "check-protocol")]
    protocol: Option<String>,
    /// Health check port or traffic-port
    #[arg(long = "check-port")]
    port: Option<String>,
    #[arg(long = "check-interval")]
    interval: Option<u32>,
    #[arg(long = "check-timeout")]
    timeout: Option<u32>,
    #[arg(long = "check-threshold")]
    threshold: Option<u32>,
}

impl HealthArgs {
    fn is_empty(&self) -> bool {
        self.protocol.is_none()
            && self.port.is_none()
            && self.interval.is_none()
            && self.timeout.is_none()
            && self.threshold.is_none()
    }

    fn into_request(self) -> HealthCheckerRequest {
        HealthCheckerRequest {
            protocol: self.protocol,
            port: self.port,
            interval_secs: self.interval,
            timeout_secs: self.timeout,
            threshold: self.threshold,
        }
    }
}

pub async fn handle(driver: &dyn CloudDriver, cmd: LbCommands) -> anyhow::Result<()> {
    let lbs = driver.load_balancers();
    match cmd {
        LbCommands::Create {
            name,
            vpc,
            subnets,
            scheme,
            listener,
            target,
            members,
            health,
            tags,
        } => {
            output::step(format!("creating load balancer {}", name));
            let health_checker = (!health.is_empty()).then(|| health.into_request());
            let info = lbs
                .create(LoadBalancerRequest {
                    name,
                    vpc_id: vpc,
                    subnet_ids: subnets,
                    scheme,
                    listener: ListenerRequest {
                        protocol: listener.0,
                        port: listener.1,
                    },
                    target_group: TargetGroupRequest {
                        protocol: target.0,
                        port: target.1,
                        members: args::iids(&members),
                    },
                    health_checker,
                    tags,
                })
                .await?;
            output::done(format!(
                "load balancer {} is {}",
                output::iid(&info.iid),
                info.status
            ));
            output::print_json(&info)
        }
        LbCommands::List => {
            let list = lbs.list().await?;
            output::count(ResourceKind::LoadBalancer, list.len());
            output::print_json(&list)
        }
        LbCommands::Get { lb } => output::print_json(&lbs.get(&args::iid(&lb)).await?),
        LbCommands::Delete { lb } => {
            let target = args::iid(&lb);
            output::step(format!("deleting load balancer {}", lb));
            let gone = lbs.delete(&target).await?;
            output::deleted(ResourceKind::LoadBalancer, &target, gone);
            Ok(())
        }
        LbCommands::AddMembers { lb, vms } => {
            let info = lbs.add_members(&args::iid(&lb), &args::iids(&vms)).await?;
            output::print_json(&info)
        }
        LbCommands::RemoveMembers { lb, vms } => {
            lbs.remove_members(&args::iid(&lb), &args::iids(&vms)).await?;
            output::done(format!("{} member(s) removed from {}", vms.len(), lb));
            Ok(())
        }
        LbCommands::Health { lb } => {
            output::print_json(&lbs.member_health(&args::iid(&lb)).await?)
        }
        LbCommands::Listener { lb, endpoint } => {
            let listener = lbs
                .change_listener(
                    &args::iid(&lb),
                    ListenerRequest {
                        protocol: endpoint.0,
                        port: endpoint.1,
                    },
                )
                .await?;
            output::print_json(&listener)
        }
        LbCommands::HealthCheck { lb, health } => {
            let checker = lbs
                .change_health_checker(&args::iid(&lb), health.into_request())
                .await?;
            output::print_json(&checker)
        }
    }
}
