//! Machine images captured from VMs

use super::{absent_on_not_found, convert_all, require_name, resolve_vm};
use crate::context::AwsContext;
use crate::convert::{SOURCE_VM_TAG, image_to_info, named_tags, tag_spec};
use crate::ops;
use crate::shapes::*;
use crate::status::IMAGE_STATES;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::{ImageInfo, ImageRequest, KeyValue};
use skyrecon_core::{ImageHandler, ImageStatus, Iid, ReconError, ResourceKind, Result, WaitGoal};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Image;

pub(crate) async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeImagesOutput = ctx
        .invoker
        .call(
            KIND,
            &name,
            ops::DESCRIBE_IMAGES,
            &json!({ "Owners": ["self"], "Filters": [Filter::new("name", &name)] }),
        )
        .await?;
    Ok(out
        .images
        .into_iter()
        .filter(|i| i.state.as_deref() != Some("deregistered"))
        .filter_map(|i| i.image_id)
        .collect())
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

pub struct AwsImageHandler {
    ctx: Arc<AwsContext>,
}

impl AwsImageHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn describe(&self, id: &str) -> Result<Option<Image>> {
        let out: Option<DescribeImagesOutput> = absent_on_not_found(
            self.ctx
                .invoker
                .call(KIND, id, ops::DESCRIBE_IMAGES, &json!({ "ImageIds": [id] }))
                .await,
        )?;
        Ok(out.and_then(|o| o.images.into_iter().next()))
    }

    async fn probe(&self, id: &str) -> Result<Option<ImageStatus>> {
        Ok(self
            .describe(id)
            .await?
            .map(|i| IMAGE_STATES.normalize(i.state.as_deref())))
    }

    async fn get_by_id(&self, id: &str) -> Result<ImageInfo> {
        let image = self
            .describe(id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))?;
        image_to_info(image)
    }
}

#[async_trait]
impl ImageHandler for AwsImageHandler {
    async fn create(&self, req: ImageRequest) -> Result<ImageInfo> {
        require_name(KIND, &req.name)?;
        if req.source_vm.is_empty() {
            return Err(ReconError::validation("image source vm is required"));
        }

        if !lookup(&self.ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }
        let instance_id = resolve_vm(&self.ctx, &req.source_vm).await?;

        let mut tags = req.tags.clone();
        tags.retain(|t| t.key != SOURCE_VM_TAG);
        tags.push(KeyValue::new(SOURCE_VM_TAG, &instance_id));

        let out: CreateImageOutput = self
            .ctx
            .invoker
            .call(
                KIND,
                &req.name,
                ops::CREATE_IMAGE,
                &CreateImageInput {
                    instance_id,
                    name: req.name.clone(),
                    tag_specifications: tag_spec("image", named_tags(&req.name, &tags)),
                },
            )
            .await?;
        let id = out
            .image_id
            .ok_or_else(|| ReconError::malformed("CreateImage returned no ImageId"))?;

        tracing::info!("capturing image {} ({})", req.name, id);
        self.ctx
            .waiter(KIND)
            .await_status(
                KIND,
                &id,
                WaitGoal::Reach(&[ImageStatus::Available]),
                &[ImageStatus::Deleted, ImageStatus::Error],
                || self.probe(&id),
            )
            .await?;
        self.get_by_id(&id).await
    }

    async fn list(&self) -> Result<Vec<ImageInfo>> {
        let out: DescribeImagesOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_IMAGES, &json!({ "Owners": ["self"] }))
            .await?;
        Ok(convert_all(KIND, out.images, image_to_info))
    }

    async fn get(&self, iid: &Iid) -> Result<ImageInfo> {
        let id = resolve(&self.ctx, iid).await?;
        self.get_by_id(&id).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve(&self.ctx, iid).await)? else {
            return Ok(true);
        };
        match self.probe(&id).await? {
            None | Some(ImageStatus::Deleted) => return Ok(true),
            Some(_) => {}
        }

        absent_on_not_found(
            self.ctx
                .invoker
                .call_unit(KIND, &id, ops::DEREGISTER_IMAGE, &json!({ "ImageId": id }))
                .await,
        )?;

        self.ctx
            .waiter(KIND)
            .await_status(
                KIND,
                &id,
                WaitGoal::Gone(&[ImageStatus::Deleted]),
                &[],
                || self.probe(&id),
            )
            .await?;
        Ok(true)
    }
}
