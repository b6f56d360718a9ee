//! Elastic public addresses

use super::{absent_on_not_found, convert_all, require_name, resolve_vm};
use crate::context::AwsContext;
use crate::convert::{address_to_info, named_tags, tag_spec};
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::{PublicIpInfo, PublicIpRequest};
use skyrecon_core::{Iid, PublicIpHandler, ReconError, ResourceKind, Result};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::PublicIp;

pub(crate) async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeAddressesOutput = ctx
        .invoker
        .call(
            KIND,
            &name,
            ops::DESCRIBE_ADDRESSES,
            &DescribeInput {
                filters: vec![Filter::name_tag(&name)],
            },
        )
        .await?;
    Ok(out
        .addresses
        .into_iter()
        .filter_map(|a| a.allocation_id)
        .collect())
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

pub struct AwsPublicIpHandler {
    ctx: Arc<AwsContext>,
}

impl AwsPublicIpHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn describe(&self, id: &str) -> Result<Option<Address>> {
        let out: Option<DescribeAddressesOutput> = absent_on_not_found(
            self.ctx
                .invoker
                .call(
                    KIND,
                    id,
                    ops::DESCRIBE_ADDRESSES,
                    &json!({ "AllocationIds": [id] }),
                )
                .await,
        )?;
        Ok(out.and_then(|o| o.addresses.into_iter().next()))
    }

    async fn get_by_id(&self, id: &str) -> Result<PublicIpInfo> {
        let address = self
            .describe(id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))?;
        address_to_info(address)
    }
}

#[async_trait]
impl PublicIpHandler for AwsPublicIpHandler {
    async fn create(&self, req: PublicIpRequest) -> Result<PublicIpInfo> {
        require_name(KIND, &req.name)?;
        if !lookup(&self.ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let out: AllocateAddressOutput = self
            .ctx
            .invoker
            .call(
                KIND,
                &req.name,
                ops::ALLOCATE_ADDRESS,
                &AllocateAddressInput {
                    domain: "vpc".to_string(),
                    tag_specifications: tag_spec("elastic-ip", named_tags(&req.name, &req.tags)),
                },
            )
            .await?;
        let id = out
            .allocation_id
            .ok_or_else(|| ReconError::malformed("AllocateAddress returned no AllocationId"))?;
        tracing::info!(
            "allocated public ip {} {} ({})",
            req.name,
            out.public_ip.as_deref().unwrap_or("?"),
            id
        );
        self.get_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<PublicIpInfo>> {
        let out: DescribeAddressesOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_ADDRESSES, &DescribeInput::default())
            .await?;
        Ok(convert_all(KIND, out.addresses, address_to_info))
    }

    async fn get(&self, iid: &Iid) -> Result<PublicIpInfo> {
        let id = resolve(&self.ctx, iid).await?;
        self.get_by_id(&id).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve(&self.ctx, iid).await)? else {
            return Ok(true);
        };
        let Some(address) = self.describe(&id).await? else {
            return Ok(true);
        };
        if address.association_id.is_some() {
            return Err(ReconError::ResourceInUse { kind: KIND, id });
        }

        absent_on_not_found(
            self.ctx
                .invoker
                .call_unit(KIND, &id, ops::RELEASE_ADDRESS, &json!({ "AllocationId": id }))
                .await,
        )?;
        tracing::info!("released public ip {}", id);
        Ok(true)
    }

    async fn associate(&self, ip: &Iid, vm: &Iid) -> Result<PublicIpInfo> {
        let id = resolve(&self.ctx, ip).await?;
        let instance_id = resolve_vm(&self.ctx, vm).await?;

        self.ctx
            .invoker
            .call_unit(
                KIND,
                &id,
                ops::ASSOCIATE_ADDRESS,
                &json!({ "AllocationId": id, "InstanceId": instance_id }),
            )
            .await?;
        self.get_by_id(&id).await
    }

    async fn disassociate(&self, ip: &Iid) -> Result<PublicIpInfo> {
        let id = resolve(&self.ctx, ip).await?;
        let address = self
            .describe(&id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, &id))?;

        let Some(association_id) = address.association_id.clone() else {
            tracing::debug!("public ip {} is not associated", id);
            return address_to_info(address);
        };
        self.ctx
            .invoker
            .call_unit(
                KIND,
                &id,
                ops::DISASSOCIATE_ADDRESS,
                &json!({ "AssociationId": association_id }),
            )
            .await?;
        self.get_by_id(&id).await
    }
}
