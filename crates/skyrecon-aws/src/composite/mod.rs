//! Multi-step composite resources: load balancers, clusters and networks

pub(crate) mod cluster;
pub(crate) mod load_balancer;
pub(crate) mod vpc;

pub use cluster::AwsClusterHandler;
pub use load_balancer::AwsLoadBalancerHandler;
pub use vpc::AwsVpcHandler;
