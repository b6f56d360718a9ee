//! Resource tagging API over every simulated resource

use crate::error::{SimError, SimResult};
use crate::world::{TagInput, World, parse};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct TaggingRequest {
    resource_ids: Vec<String>,
    resource_type_filters: Vec<String>,
    tags: Vec<TagInput>,
    tag_keys: Vec<String>,
}

pub(crate) fn handle(world: &mut World, action: &str, request: Value) -> SimResult<Value> {
    let req: TaggingRequest = parse(request)?;
    match action {
        "TagResources" => {
            known(world, &req.resource_ids)?;
            for id in &req.resource_ids {
                for tag in &req.tags {
                    world.tags.set(id, &tag.key, &tag.value);
                }
            }
            Ok(json!({ "FailedResourcesMap": {} }))
        }
        "UntagResources" => {
            known(world, &req.resource_ids)?;
            for id in &req.resource_ids {
                for key in &req.tag_keys {
                    world.tags.unset(id, key);
                }
            }
            Ok(json!({ "FailedResourcesMap": {} }))
        }
        "GetResources" => {
            let mut ids: Vec<String> = req
                .resource_ids
                .iter()
                .filter(|id| world.tags.known(id))
                .cloned()
                .collect();
            for resource_type in &req.resource_type_filters {
                ids.extend(world.tags.ids_of_type(resource_type));
            }
            let mappings: Vec<Value> = ids
                .iter()
                .map(|id| {
                    json!({
                        "ResourceId": id,
                        "ResourceType": world.tags.resource_type(id),
                        "Tags": world.tags.render(id),
                    })
                })
                .collect();
            Ok(json!({ "ResourceTagMappingList": mappings }))
        }
        other => Err(SimError::Unsupported(format!("tagging:{}", other))),
    }
}

fn known(world: &World, ids: &[String]) -> SimResult<()> {
    if ids.is_empty() {
        return Err(SimError::api("InvalidParameterException", "ResourceIds is required"));
    }
    match ids.iter().find(|id| !world.tags.known(id)) {
        Some(id) => Err(SimError::api(
            "ResourceNotFoundException",
            format!("resource {} does not exist", id),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimConfig;

    #[test]
    fn test_tag_and_untag() {
        let mut w = World::new(SimConfig::default());
        w.tags.register("vol-1", "ec2:volume", &[]);

        handle(
            &mut w,
            "TagResources",
            json!({ "ResourceIds": ["vol-1"], "Tags": [{ "Key": "env", "Value": "prod" }] }),
        )
        .unwrap();
        let out = handle(&mut w, "GetResources", json!({ "ResourceTypeFilters": ["ec2:volume"] })).unwrap();
        assert_eq!(out["ResourceTagMappingList"][0]["Tags"][0]["Value"], "prod");

        handle(
            &mut w,
            "UntagResources",
            json!({ "ResourceIds": ["vol-1"], "TagKeys": ["env"] }),
        )
        .unwrap();
        let out = handle(&mut w, "GetResources", json!({ "ResourceIds": ["vol-1"] })).unwrap();
        assert!(out["ResourceTagMappingList"][0]["Tags"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_resource() {
        let mut w = World::new(SimConfig::default());
        let err = handle(
            &mut w,
            "TagResources",
            json!({ "ResourceIds": ["vol-x"], "Tags": [{ "Key": "a", "Value": "b" }] }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "ResourceNotFoundException");
    }
}
