//! Security groups and their rules

use super::{absent_on_not_found, convert_all, require_name};
use crate::context::AwsContext;
use crate::convert::{named_tags, rules_to_permissions, security_group_to_info, tag_spec};
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::{SecurityGroupInfo, SecurityGroupRequest, SecurityRule};
use skyrecon_core::{Iid, ReconError, ResourceKind, Result, SecurityGroupHandler};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::SecurityGroup;

pub(crate) async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeSecurityGroupsOutput = ctx
        .invoker
        .call(
            KIND,
            &name,
            ops::DESCRIBE_SECURITY_GROUPS,
            &DescribeInput {
                filters: vec![Filter::new("group-name", &name)],
            },
        )
        .await?;
    Ok(out
        .security_groups
        .into_iter()
        .filter_map(|g| g.group_id)
        .collect())
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

fn validate_rule(rule: &SecurityRule) -> Result<()> {
    let protocol = rule.protocol.to_lowercase();
    match protocol.as_str() {
        "all" | "-1" | "icmp" => Ok(()),
        "tcp" | "udp" => {
            let valid = |p: i32| (0..=65535).contains(&p);
            if !valid(rule.from_port) || !valid(rule.to_port) || rule.from_port > rule.to_port {
                return Err(ReconError::validation(format!(
                    "invalid port range {}-{} for {}",
                    rule.from_port, rule.to_port, protocol
                )));
            }
            Ok(())
        }
        other => Err(ReconError::validation(format!(
            "unsupported protocol '{}'",
            other
        ))),
    }
}

/// Rule identity ignoring case and the port range of port-less protocols
fn same_rule(a: &SecurityRule, b: &SecurityRule) -> bool {
    let normalize = |p: &str| {
        let p = p.to_lowercase();
        if p == "-1" { "all".to_string() } else { p }
    };
    let (pa, pb) = (normalize(&a.protocol), normalize(&b.protocol));
    a.direction == b.direction
        && pa == pb
        && a.cidr == b.cidr
        && (pa == "all" || (a.from_port == b.from_port && a.to_port == b.to_port))
}

pub struct AwsSecurityGroupHandler {
    ctx: Arc<AwsContext>,
}

impl AwsSecurityGroupHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }

    async fn describe(&self, id: &str) -> Result<Option<SecurityGroup>> {
        let out: Option<DescribeSecurityGroupsOutput> = absent_on_not_found(
            self.ctx
                .invoker
                .call(
                    KIND,
                    id,
                    ops::DESCRIBE_SECURITY_GROUPS,
                    &json!({ "GroupIds": [id] }),
                )
                .await,
        )?;
        Ok(out.and_then(|o| o.security_groups.into_iter().next()))
    }

    async fn get_by_id(&self, id: &str) -> Result<SecurityGroupInfo> {
        let group = self
            .describe(id)
            .await?
            .ok_or_else(|| ReconError::not_found(KIND, id))?;
        security_group_to_info(group)
    }

    /// Authorize or revoke `rules`, one call per direction
    async fn apply(
        &self,
        id: &str,
        rules: &[SecurityRule],
        ingress_op: &str,
        egress_op: &str,
    ) -> Result<()> {
        let (ingress, egress) = rules_to_permissions(rules);
        for (operation, permissions) in [(ingress_op, ingress), (egress_op, egress)] {
            if permissions.is_empty() {
                continue;
            }
            self.ctx
                .invoker
                .call_unit(
                    KIND,
                    id,
                    operation,
                    &SecurityGroupRulesInput {
                        group_id: id.to_string(),
                        ip_permissions: permissions,
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn add_rules_by_id(&self, id: &str, rules: &[SecurityRule]) -> Result<SecurityGroupInfo> {
        for rule in rules {
            validate_rule(rule)?;
        }
        let current = self.get_by_id(id).await?;
        let missing: Vec<SecurityRule> = rules
            .iter()
            .filter(|r| !current.rules.iter().any(|c| same_rule(c, r)))
            .cloned()
            .collect();

        if missing.is_empty() {
            tracing::debug!("security group {} already has every rule", id);
            return Ok(current);
        }
        self.apply(id, &missing, ops::AUTHORIZE_INGRESS, ops::AUTHORIZE_EGRESS)
            .await?;
        self.get_by_id(id).await
    }
}

#[async_trait]
impl SecurityGroupHandler for AwsSecurityGroupHandler {
    async fn create(&self, req: SecurityGroupRequest) -> Result<SecurityGroupInfo> {
        require_name(KIND, &req.name)?;
        if req.vpc_id.trim().is_empty() {
            return Err(ReconError::validation("security group vpc id is required"));
        }
        for rule in &req.rules {
            validate_rule(rule)?;
        }

        if !lookup(&self.ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let description = if req.description.is_empty() {
            req.name.clone()
        } else {
            req.description.clone()
        };
        let out: CreateSecurityGroupOutput = self
            .ctx
            .invoker
            .call(
                KIND,
                &req.name,
                ops::CREATE_SECURITY_GROUP,
                &CreateSecurityGroupInput {
                    group_name: req.name.clone(),
                    description,
                    vpc_id: req.vpc_id.clone(),
                    tag_specifications: tag_spec(
                        "security-group",
                        named_tags(&req.name, &req.tags),
                    ),
                },
            )
            .await?;
        let id = out
            .group_id
            .ok_or_else(|| ReconError::malformed("CreateSecurityGroup returned no GroupId"))?;
        tracing::info!("created security group {} ({})", req.name, id);

        self.add_rules_by_id(&id, &req.rules).await
    }

    async fn list(&self) -> Result<Vec<SecurityGroupInfo>> {
        let out: DescribeSecurityGroupsOutput = self
            .ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_SECURITY_GROUPS, &DescribeInput::default())
            .await?;
        Ok(convert_all(KIND, out.security_groups, security_group_to_info))
    }

    async fn get(&self, iid: &Iid) -> Result<SecurityGroupInfo> {
        let id = resolve(&self.ctx, iid).await?;
        self.get_by_id(&id).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let Some(id) = absent_on_not_found(resolve(&self.ctx, iid).await)? else {
            return Ok(true);
        };
        if self.describe(&id).await?.is_none() {
            return Ok(true);
        }

        absent_on_not_found(
            self.ctx
                .invoker
                .call_unit(KIND, &id, ops::DELETE_SECURITY_GROUP, &json!({ "GroupId": id }))
                .await,
        )?;
        tracing::info!("deleted security group {}", id);
        Ok(true)
    }

    async fn add_rules(&self, iid: &Iid, rules: &[SecurityRule]) -> Result<SecurityGroupInfo> {
        let id = resolve(&self.ctx, iid).await?;
        self.add_rules_by_id(&id, rules).await
    }

    async fn remove_rules(&self, iid: &Iid, rules: &[SecurityRule]) -> Result<SecurityGroupInfo> {
        let id = resolve(&self.ctx, iid).await?;
        let current = self.get_by_id(&id).await?;

        let mut present = Vec::new();
        for rule in rules {
            if current.rules.iter().any(|c| same_rule(c, rule)) {
                present.push(rule.clone());
            } else {
                tracing::debug!("security group {} has no rule {:?}", id, rule);
            }
        }
        if present.is_empty() {
            return Ok(current);
        }

        self.apply(&id, &present, ops::REVOKE_INGRESS, ops::REVOKE_EGRESS)
            .await?;
        self.get_by_id(&id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrecon_core::model::RuleDirection;

    fn rule(protocol: &str, from: i32, to: i32) -> SecurityRule {
        SecurityRule {
            direction: RuleDirection::Inbound,
            protocol: protocol.into(),
            from_port: from,
            to_port: to,
            cidr: "0.0.0.0/0".into(),
        }
    }

    #[test]
    fn test_validate_rule() {
        assert!(validate_rule(&rule("tcp", 22, 22)).is_ok());
        assert!(validate_rule(&rule("all", -1, -1)).is_ok());
        assert!(validate_rule(&rule("tcp", 80, 22)).is_err());
        assert!(validate_rule(&rule("tcp", -1, 22)).is_err());
        assert!(validate_rule(&rule("sctp", 1, 2)).is_err());
    }

    #[test]
    fn test_same_rule_ignores_ports_of_all() {
        assert!(same_rule(&rule("ALL", -1, -1), &rule("-1", 0, 0)));
        assert!(same_rule(&rule("TCP", 22, 22), &rule("tcp", 22, 22)));
        assert!(!same_rule(&rule("tcp", 22, 22), &rule("tcp", 80, 80)));
    }
}
