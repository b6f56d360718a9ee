//! SSH key pairs. Every operation completes synchronously.

use super::{absent_on_not_found, convert_all, require_name};
use crate::context::AwsContext;
use crate::convert::{key_pair_to_info, named_tags, tag_spec};
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::{KeyPairInfo, KeyPairRequest};
use skyrecon_core::{Iid, KeyPairHandler, ReconError, ResourceKind, Result};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::KeyPair;

async fn describe_by_name(ctx: &AwsContext, name: &str) -> Result<Vec<KeyPair>> {
    // an unknown key name fails the whole call instead of matching nothing
    let out: Option<DescribeKeyPairsOutput> = absent_on_not_found(
        ctx.invoker
            .call(KIND, name, ops::DESCRIBE_KEY_PAIRS, &json!({ "KeyNames": [name] }))
            .await,
    )?;
    Ok(out.map(|o| o.key_pairs).unwrap_or_default())
}

async fn describe_by_id(ctx: &AwsContext, id: &str) -> Result<Option<KeyPair>> {
    let out: Option<DescribeKeyPairsOutput> = absent_on_not_found(
        ctx.invoker
            .call(KIND, id, ops::DESCRIBE_KEY_PAIRS, &json!({ "KeyPairIds": [id] }))
            .await,
    )?;
    Ok(out.and_then(|o| o.key_pairs.into_iter().next()))
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| async move {
        Ok(describe_by_name(ctx, &name)
            .await?
            .into_iter()
            .map(|k| k.key_pair_id.or(k.key_name).unwrap_or_default())
            .collect())
    })
    .await
}

/// Key name the provider expects when launching instances
pub(crate) async fn key_name(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    if iid.provider_id.is_empty() {
        require_name(KIND, &iid.name)?;
        resolve(ctx, iid).await?;
        return Ok(iid.name.clone());
    }
    describe_by_id(ctx, &iid.provider_id)
        .await?
        .and_then(|k| k.key_name)
        .ok_or_else(|| ReconError::not_found(KIND, &iid.provider_id))
}

pub struct AwsKeyPairHandler {
    ctx: Arc<AwsContext>,
}

impl AwsKeyPairHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl KeyPairHandler for AwsKeyPairHandler {
    async fn create(&self, req: KeyPairRequest) -> Result<KeyPairInfo> {
        require_name(KIND, &req.name)?;
        if !describe_by_name(&self.ctx, &req.name).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let key: KeyPair = self
            .ctx
            .invoker
            .call(
                KIND,
                &req.name,
                ops::CREATE_KEY_PAIR,
                &CreateKeyPairInput {
                    key_name: req.name.clone(),
                    tag_specifications: tag_spec("key-pair", named_tags(&req.name, &req.tags)),
                },
            )
            .await?;
        tracing::info!("created key pair {}", req.name);
        key_pair_to_info(key)
    }

    async fn list(&self) -> Result<Vec<KeyPairInfo>> {
        let out: DescribeKeyPairsOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_KEY_PAIRS, &json!({}))
            .await?;
        Ok(convert_all(KIND, out.key_pairs, key_pair_to_info))
    }

    async fn get(&self, iid: &Iid) -> Result<KeyPairInfo> {
        let id = resolve(&self.ctx, iid).await?;
        let key = describe_by_id(&self.ctx, &id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, &id))?;
        key_pair_to_info(key)
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve(&self.ctx, iid).await)? else {
            return Ok(true);
        };
        if describe_by_id(&self.ctx, &id).await?.is_none() {
            return Ok(true);
        }

        absent_on_not_found(
            self.ctx
                .invoker
                .call_unit(KIND, &id, ops::DELETE_KEY_PAIR, &json!({ "KeyPairId": id }))
                .await,
        )?;
        tracing::info!("deleted key pair {}", iid);
        Ok(true)
    }
}
