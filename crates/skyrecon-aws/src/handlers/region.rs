//! Regions and their availability zones

use crate::context::AwsContext;
use crate::convert::region_to_info;
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::RegionZoneInfo;
use skyrecon_core::{ReconError, RegionZoneHandler, ResourceKind, Result, fan_out};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Region;

pub struct AwsRegionZoneHandler {
    ctx: Arc<AwsContext>,
}

impl AwsRegionZoneHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn zones(&self, region: String) -> Result<RegionZoneInfo> {
        let out: DescribeAvailabilityZonesOutput = self
            .ctx
            .invoker
            .call(
                KIND,
                &region,
                ops::DESCRIBE_AVAILABILITY_ZONES,
                &json!({ "RegionName": region }),
            )
            .await?;
        Ok(region_to_info(&region, out.availability_zones))
    }
}

#[async_trait]
impl RegionZoneHandler for AwsRegionZoneHandler {
    async fn list(&self) -> Result<Vec<RegionZoneInfo>> {
        let out: DescribeRegionsOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_REGIONS, &json!({}))
            .await?;
        let names: Vec<String> = out
            .regions
            .into_iter()
            .filter(|r| r.opt_in_status.as_deref() != Some("not-opted-in"))
            .filter_map(|r| r.region_name)
            .collect();

        let mut regions = fan_out(KIND, names, self.ctx.concurrency(), |name| self.zones(name)).await;
        regions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(regions)
    }

    async fn get(&self, region: &str) -> Result<RegionZoneInfo> {
        if region.trim().is_empty() {
            return Err(ReconError::validation("region name is required"));
        }
        let info = self.zones(region.to_string()).await?;
        if info.zones.is_empty() {
            return Err(ReconError::not_found(KIND, region));
        }
        Ok(info)
    }
}
