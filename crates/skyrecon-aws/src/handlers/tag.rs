//! Tags on any taggable resource, through the resource tagging API

use super::resolve_any;
use crate::context::AwsContext;
use crate::convert::{to_key_values, to_tags};
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::iid::tag_value;
use skyrecon_core::model::{KeyValue, TagInfo};
use skyrecon_core::{Iid, ReconError, ResourceKind, Result, TagHandler, recover_name};
use std::sync::Arc;

/// Resource type string of `kind` in the tagging API
pub(crate) fn resource_type(kind: ResourceKind) -> Result<&'static str> {
    let value = match kind {
        ResourceKind::Vm => "ec2:instance",
        ResourceKind::Disk => "ec2:volume",
        ResourceKind::Image => "ec2:image",
        ResourceKind::KeyPair => "ec2:key-pair",
        ResourceKind::SecurityGroup => "ec2:security-group",
        ResourceKind::PublicIp => "ec2:elastic-ip",
        ResourceKind::Vpc => "ec2:vpc",
        ResourceKind::Subnet => "ec2:subnet",
        ResourceKind::InternetGateway => "ec2:internet-gateway",
        ResourceKind::LoadBalancer | ResourceKind::TargetGroup => {
            "elasticloadbalancing:targetgroup"
        }
        ResourceKind::Cluster => "eks:cluster",
        ResourceKind::NodeGroup => "eks:nodegroup",
        other => {
            return Err(ReconError::validation(format!(
                "{} resources cannot be tagged",
                other
            )));
        }
    };
    Ok(value)
}

fn matches_keyword(tag: &KeyValue, keyword: &str) -> bool {
    keyword.is_empty()
        || tag.key.to_lowercase().contains(keyword)
        || tag.value.to_lowercase().contains(keyword)
}

pub struct AwsTagHandler {
    ctx: Arc<AwsContext>,
}

impl AwsTagHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn target(&self, kind: ResourceKind, iid: &Iid) -> Result<String> {
        resource_type(kind)?;
        resolve_any(&self.ctx, kind, iid).await
    }

    async fn tags_of(&self, id: &str) -> Result<Vec<KeyValue>> {
        let out: GetResourcesOutput = self
            .ctx
            .invoker
            .call(
                ResourceKind::Tag,
                id,
                ops::GET_RESOURCES,
                &json!({ "ResourceIds": [id] }),
            )
            .await?;
        Ok(out
            .resource_tag_mapping_list
            .into_iter()
            .find(|m| m.resource_id.as_deref() == Some(id))
            .map(|m| to_key_values(&m.tags))
            .unwrap_or_default())
    }
}

#[async_trait]
impl TagHandler for AwsTagHandler {
    async fn add(&self, kind: ResourceKind, iid: &Iid, tag: KeyValue) -> Result<KeyValue> {
        if tag.key.trim().is_empty() {
            return Err(ReconError::validation("tag key is required"));
        }
        let id = self.target(kind, iid).await?;

        self.ctx
            .invoker
            .call_unit(
                ResourceKind::Tag,
                &id,
                ops::TAG_RESOURCES,
                &json!({ "ResourceIds": [id], "Tags": to_tags(std::slice::from_ref(&tag)) }),
            )
            .await?;
        tracing::debug!("tagged {} {} with {}", kind, id, tag.key);
        Ok(tag)
    }

    async fn list(&self, kind: ResourceKind, iid: &Iid) -> Result<Vec<KeyValue>> {
        let id = self.target(kind, iid).await?;
        self.tags_of(&id).await
    }

    async fn get(&self, kind: ResourceKind, iid: &Iid, key: &str) -> Result<KeyValue> {
        let id = self.target(kind, iid).await?;
        let tags = self.tags_of(&id).await?;
        tag_value(&tags, key)
            .map(|value| KeyValue::new(key, value))
            .ok_or_else(|| ReconError::not_found(ResourceKind::Tag, format!("{}/{}", id, key)))
    }

    async fn remove(&self, kind: ResourceKind, iid: &Iid, key: &str) -> Result<bool> {
        let id = self.target(kind, iid).await?;
        let tags = self.tags_of(&id).await?;
        if tag_value(&tags, key).is_none() {
            tracing::debug!("{} {} has no tag {}", kind, id, key);
            return Ok(true);
        }

        self.ctx
            .invoker
            .call_unit(
                ResourceKind::Tag,
                &id,
                ops::UNTAG_RESOURCES,
                &json!({ "ResourceIds": [id], "TagKeys": [key] }),
            )
            .await?;
        Ok(true)
    }

    async fn find(&self, kind: ResourceKind, keyword: &str) -> Result<Vec<TagInfo>> {
        let resource_type = resource_type(kind)?;
        let out: GetResourcesOutput = self
            .ctx
            .invoker
            .call(
                ResourceKind::Tag,
                keyword,
                ops::GET_RESOURCES,
                &json!({ "ResourceTypeFilters": [resource_type] }),
            )
            .await?;

        let keyword = keyword.trim().to_lowercase();
        Ok(out
            .resource_tag_mapping_list
            .into_iter()
            .filter_map(|m| {
                let id = m.resource_id?;
                let tags = to_key_values(&m.tags);
                if !tags.iter().any(|t| matches_keyword(t, &keyword)) {
                    return None;
                }
                Some(TagInfo {
                    kind,
                    iid: Iid::new(recover_name(None, &tags, &id), id),
                    tags,
                })
            })
            .collect())
    }
}
