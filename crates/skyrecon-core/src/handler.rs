//! Canonical handler traits
//!
//! One trait per resource kind. Each provider adapter implements them over
//! its own wire shapes; callers only ever see canonical records.
//!
//! Deletes return `Ok(true)` when the resource is gone afterwards, including
//! when it was already gone.

use crate::error::Result;
use crate::iid::Iid;
use crate::kind::ResourceKind;
use crate::model::*;
use crate::status::VmStatus;
use async_trait::async_trait;

#[async_trait]
pub trait DiskHandler: Send + Sync {
    /// Validate, create and wait until the volume is available
    async fn create(&self, req: DiskRequest) -> Result<DiskInfo>;
    async fn list(&self) -> Result<Vec<DiskInfo>>;
    async fn get(&self, iid: &Iid) -> Result<DiskInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    /// Attach and wait until attached to `vm`
    async fn attach(&self, disk: &Iid, vm: &Iid) -> Result<DiskInfo>;
    /// Detach and wait until available
    async fn detach(&self, disk: &Iid, vm: &Iid) -> Result<bool>;
    /// Grow the volume. `size` is in GB and must exceed the current size.
    async fn change_size(&self, disk: &Iid, size: &str) -> Result<DiskInfo>;
}

#[async_trait]
pub trait VmHandler: Send + Sync {
    /// Launch and wait until running
    async fn create(&self, req: VmRequest) -> Result<VmInfo>;
    async fn list(&self) -> Result<Vec<VmInfo>>;
    async fn get(&self, iid: &Iid) -> Result<VmInfo>;
    async fn status(&self, iid: &Iid) -> Result<VmStatus>;
    async fn start(&self, iid: &Iid) -> Result<VmStatus>;
    async fn stop(&self, iid: &Iid) -> Result<VmStatus>;
    async fn reboot(&self, iid: &Iid) -> Result<VmStatus>;
    /// Terminate and wait until terminated
    async fn delete(&self, iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait ImageHandler: Send + Sync {
    /// Capture an image from a VM and wait until available
    async fn create(&self, req: ImageRequest) -> Result<ImageInfo>;
    async fn list(&self) -> Result<Vec<ImageInfo>>;
    async fn get(&self, iid: &Iid) -> Result<ImageInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait KeyPairHandler: Send + Sync {
    async fn create(&self, req: KeyPairRequest) -> Result<KeyPairInfo>;
    async fn list(&self) -> Result<Vec<KeyPairInfo>>;
    async fn get(&self, iid: &Iid) -> Result<KeyPairInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
}

#[async_trait]
pub trait SecurityGroupHandler: Send + Sync {
    async fn create(&self, req: SecurityGroupRequest) -> Result<SecurityGroupInfo>;
    async fn list(&self) -> Result<Vec<SecurityGroupInfo>>;
    async fn get(&self, iid: &Iid) -> Result<SecurityGroupInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    async fn add_rules(&self, iid: &Iid, rules: &[SecurityRule]) -> Result<SecurityGroupInfo>;
    async fn remove_rules(&self, iid: &Iid, rules: &[SecurityRule]) -> Result<SecurityGroupInfo>;
}

#[async_trait]
pub trait PublicIpHandler: Send + Sync {
    async fn create(&self, req: PublicIpRequest) -> Result<PublicIpInfo>;
    async fn list(&self) -> Result<Vec<PublicIpInfo>>;
    async fn get(&self, iid: &Iid) -> Result<PublicIpInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    async fn associate(&self, ip: &Iid, vm: &Iid) -> Result<PublicIpInfo>;
    async fn disassociate(&self, ip: &Iid) -> Result<PublicIpInfo>;
}

#[async_trait]
pub trait TagHandler: Send + Sync {
    async fn add(&self, kind: ResourceKind, iid: &Iid, tag: KeyValue) -> Result<KeyValue>;
    async fn list(&self, kind: ResourceKind, iid: &Iid) -> Result<Vec<KeyValue>>;
    async fn get(&self, kind: ResourceKind, iid: &Iid, key: &str) -> Result<KeyValue>;
    async fn remove(&self, kind: ResourceKind, iid: &Iid, key: &str) -> Result<bool>;
    /// Resources of `kind` with a tag key or value containing `keyword`
    async fn find(&self, kind: ResourceKind, keyword: &str) -> Result<Vec<TagInfo>>;
}

#[async_trait]
pub trait LoadBalancerHandler: Send + Sync {
    /// Target group, then listener, then frontend
    async fn create(&self, req: LoadBalancerRequest) -> Result<LoadBalancerInfo>;
    async fn list(&self) -> Result<Vec<LoadBalancerInfo>>;
    async fn get(&self, iid: &Iid) -> Result<LoadBalancerInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    async fn add_members(&self, iid: &Iid, members: &[Iid]) -> Result<LoadBalancerInfo>;
    async fn remove_members(&self, iid: &Iid, members: &[Iid]) -> Result<bool>;
    async fn member_health(&self, iid: &Iid) -> Result<Vec<MemberHealth>>;
    async fn change_listener(&self, iid: &Iid, listener: ListenerRequest) -> Result<ListenerInfo>;
    async fn change_health_checker(
        &self,
        iid: &Iid,
        checker: HealthCheckerRequest,
    ) -> Result<HealthCheckerInfo>;
}

#[async_trait]
pub trait ClusterHandler: Send + Sync {
    /// Control plane, then each node group
    async fn create(&self, req: ClusterRequest) -> Result<ClusterInfo>;
    async fn list(&self) -> Result<Vec<ClusterInfo>>;
    async fn get(&self, iid: &Iid) -> Result<ClusterInfo>;
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    async fn add_node_group(&self, cluster: &Iid, req: NodeGroupRequest) -> Result<NodeGroupInfo>;
    async fn remove_node_group(&self, cluster: &Iid, node_group: &Iid) -> Result<bool>;
    async fn scale_node_group(
        &self,
        cluster: &Iid,
        node_group: &Iid,
        scaling: NodeGroupScaling,
    ) -> Result<NodeGroupInfo>;
}

#[async_trait]
pub trait VpcHandler: Send + Sync {
    /// Network, internet gateway and default route, then each subnet
    async fn create(&self, req: VpcRequest) -> Result<VpcInfo>;
    async fn list(&self) -> Result<Vec<VpcInfo>>;
    async fn get(&self, iid: &Iid) -> Result<VpcInfo>;
    /// Subnets, then the gateway and its route, then the network
    async fn delete(&self, iid: &Iid) -> Result<bool>;
    async fn add_subnet(&self, vpc: &Iid, req: SubnetRequest) -> Result<VpcInfo>;
    async fn remove_subnet(&self, vpc: &Iid, subnet: &Iid) -> Result<bool>;
    async fn list_subnets(&self, vpc: &Iid) -> Result<Vec<SubnetInfo>>;
}

#[async_trait]
pub trait RegionZoneHandler: Send + Sync {
    async fn list(&self) -> Result<Vec<RegionZoneInfo>>;
    async fn get(&self, region: &str) -> Result<RegionZoneInfo>;
}

/// Every handler of one provider connection
pub trait CloudDriver: Send + Sync {
    /// Provider name (e.g. "aws")
    fn name(&self) -> &str;
    fn region(&self) -> &str;

    fn disks(&self) -> &dyn DiskHandler;
    fn vms(&self) -> &dyn VmHandler;
    fn images(&self) -> &dyn ImageHandler;
    fn key_pairs(&self) -> &dyn KeyPairHandler;
    fn security_groups(&self) -> &dyn SecurityGroupHandler;
    fn public_ips(&self) -> &dyn PublicIpHandler;
    fn tags(&self) -> &dyn TagHandler;
    fn load_balancers(&self) -> &dyn LoadBalancerHandler;
    fn clusters(&self) -> &dyn ClusterHandler;
    fn vpcs(&self) -> &dyn VpcHandler;
    fn regions(&self) -> &dyn RegionZoneHandler;
}
