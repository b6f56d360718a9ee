//! AWS-shaped provider adapter for skyrecon
//!
//! This crate implements the canonical handler traits of `skyrecon-core`
//! against the AWS wire shapes (EC2 and VPC, ELBv2, EKS, IAM, Auto Scaling and the
//! resource tagging API), talking to the cloud only through a
//! [`ProviderGateway`](skyrecon_core::ProviderGateway).
//!
//! # Features
//!
//! - Disks, VMs, images, key pairs, security groups, public IPs and tags
//! - Network load balancers (target group, listener, frontend)
//! - Managed Kubernetes clusters with node groups
//! - Virtual networks with an internet gateway and subnets
//! - Region and zone enumeration
//!
//! # Example
//!
//! ```ignore
//! use skyrecon_aws::{AwsDriver, AwsSettings};
//! use skyrecon_core::{CloudDriver, CommandGateway, Iid, TracingCallLogger};
//! use std::sync::Arc;
//!
//! let gateway = CommandGateway::new("aws", "skyrecon-aws-driver", vec![]);
//! let driver = AwsDriver::new(
//!     Arc::new(gateway),
//!     Arc::new(TracingCallLogger),
//!     AwsSettings { region: "us-east-1".into(), ..Default::default() },
//! );
//!
//! let disk = driver.disks().get(&Iid::by_name("data")).await?;
//! ```

pub mod catalog;
pub mod codes;
pub mod composite;
pub mod context;
pub mod convert;
pub mod driver;
pub mod handlers;
pub mod ops;
pub mod shapes;
pub mod status;

pub use catalog::{DiskCatalog, DiskTypeSpec};
pub use codes::AwsErrorClassifier;
pub use composite::{AwsClusterHandler, AwsLoadBalancerHandler, AwsVpcHandler};
pub use context::{AwsContext, AwsSettings, ClusterRoles};
pub use driver::AwsDriver;
pub use handlers::{
    AwsDiskHandler, AwsImageHandler, AwsKeyPairHandler, AwsPublicIpHandler, AwsRegionZoneHandler,
    AwsSecurityGroupHandler, AwsTagHandler, AwsVmHandler,
};
