//! AWS-shaped cloud driver

use crate::composite::{AwsClusterHandler, AwsLoadBalancerHandler, AwsVpcHandler};
use crate::context::{AwsContext, AwsSettings};
use crate::handlers::*;
use skyrecon_core::{
    CallLogger, CloudDriver, ClusterHandler, DiskHandler, ImageHandler, KeyPairHandler,
    LoadBalancerHandler, ProviderGateway, PublicIpHandler, RegionZoneHandler,
    SecurityGroupHandler, TagHandler, VmHandler, VpcHandler,
};
use std::sync::Arc;

/// Every handler of one provider connection, sharing a single context
pub struct AwsDriver {
    ctx: Arc<AwsContext>,
    disks: AwsDiskHandler,
    vms: AwsVmHandler,
    images: AwsImageHandler,
    key_pairs: AwsKeyPairHandler,
    security_groups: AwsSecurityGroupHandler,
    public_ips: AwsPublicIpHandler,
    tags: AwsTagHandler,
    load_balancers: AwsLoadBalancerHandler,
    clusters: AwsClusterHandler,
    vpcs: AwsVpcHandler,
    regions: AwsRegionZoneHandler,
}

impl AwsDriver {
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        logger: Arc<dyn CallLogger>,
        settings: AwsSettings,
    ) -> Self {
        Self::from_context(Arc::new(AwsContext::new(gateway, logger, settings)))
    }

    pub fn from_context(ctx: Arc<AwsContext>) -> Self {
        Self {
            disks: AwsDiskHandler::new(ctx.clone()),
            vms: AwsVmHandler::new(ctx.clone()),
            images: AwsImageHandler::new(ctx.clone()),
            key_pairs: AwsKeyPairHandler::new(ctx.clone()),
            security_groups: AwsSecurityGroupHandler::new(ctx.clone()),
            public_ips: AwsPublicIpHandler::new(ctx.clone()),
            tags: AwsTagHandler::new(ctx.clone()),
            load_balancers: AwsLoadBalancerHandler::new(ctx.clone()),
            clusters: AwsClusterHandler::new(ctx.clone()),
            vpcs: AwsVpcHandler::new(ctx.clone()),
            regions: AwsRegionZoneHandler::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &AwsContext {
        &self.ctx
    }
}

impl CloudDriver for AwsDriver {
    fn name(&self) -> &str {
        self.ctx.invoker().cloud()
    }

    fn region(&self) -> &str {
        self.ctx.region()
    }

    fn disks(&self) -> &dyn DiskHandler {
        &self.disks
    }

    fn vms(&self) -> &dyn VmHandler {
        &self.vms
    }

    fn images(&self) -> &dyn ImageHandler {
        &self.images
    }

    fn key_pairs(&self) -> &dyn KeyPairHandler {
        &self.key_pairs
    }

    fn security_groups(&self) -> &dyn SecurityGroupHandler {
        &self.security_groups
    }

    fn public_ips(&self) -> &dyn PublicIpHandler {
        &self.public_ips
    }

    fn tags(&self) -> &dyn TagHandler {
        &self.tags
    }

    fn load_balancers(&self) -> &dyn LoadBalancerHandler {
        &self.load_balancers
    }

    fn clusters(&self) -> &dyn ClusterHandler {
        &self.clusters
    }

    fn vpcs(&self) -> &dyn VpcHandler {
        &self.vpcs
    }

    fn regions(&self) -> &dyn RegionZoneHandler {
        &self.regions
    }
}
