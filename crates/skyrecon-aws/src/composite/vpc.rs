//! Virtual network composite
//!
//! Creation makes the network, attaches a fresh internet gateway, points the
//! main route table's default route at it, then adds each subnet in order.
//! Deletion runs the other way: subnets, the default route and every
//! attached gateway, then the network itself.

use crate::context::AwsContext;
use crate::convert::{named_tags, subnet_to_info, tag_spec, vpc_to_info};
use crate::handlers::{absent_on_not_found, convert_all, require_name};
use crate::ops;
use crate::shapes::*;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::*;
use skyrecon_core::{Iid, ReconError, ResourceKind, Result, VpcHandler, WorkflowRun, fan_out};
use std::net::Ipv4Addr;
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::Vpc;

const STEP_VPC: &str = "vpc";
const STEP_GATEWAY: &str = "internet-gateway";
const STEP_ROUTE: &str = "route";

const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// `a.b.c.d/n` with the prefix lengths the provider accepts
fn check_cidr(kind: ResourceKind, cidr: &str) -> Result<()> {
    let invalid = || ReconError::validation(format!("invalid {} CIDR block '{}'", kind, cidr));
    let (addr, prefix) = cidr.trim().split_once('/').ok_or_else(invalid)?;
    addr.parse::<Ipv4Addr>().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    if !(16..=28).contains(&prefix) {
        return Err(ReconError::validation(format!(
            "{} CIDR block '{}' must have a prefix between /16 and /28",
            kind, cidr
        )));
    }
    Ok(())
}

fn validate_subnet(req: &SubnetRequest) -> Result<()> {
    require_name(ResourceKind::Subnet, &req.name)?;
    check_cidr(ResourceKind::Subnet, &req.ipv4_cidr)
}

fn validate(req: &VpcRequest) -> Result<()> {
    require_name(KIND, &req.name)?;
    check_cidr(KIND, &req.ipv4_cidr)?;
    for (i, subnet) in req.subnets.iter().enumerate() {
        validate_subnet(subnet)?;
        if req.subnets[..i].iter().any(|s| s.name == subnet.name) {
            return Err(ReconError::validation(format!(
                "subnet name '{}' is used twice",
                subnet.name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// lookups

pub(crate) async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: DescribeVpcsOutput = ctx
        .invoker
        .call(
            KIND,
            &name,
            ops::DESCRIBE_VPCS,
            &DescribeInput {
                filters: vec![Filter::name_tag(&name)],
            },
        )
        .await?;
    Ok(out.vpcs.into_iter().filter_map(|v| v.vpc_id).collect())
}

pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

async fn network(ctx: &AwsContext, id: &str) -> Result<Option<Vpc>> {
    let out: Option<DescribeVpcsOutput> = absent_on_not_found(
        ctx.invoker
            .call(KIND, id, ops::DESCRIBE_VPCS, &json!({ "VpcIds": [id] }))
            .await,
    )?;
    Ok(out.and_then(|o| o.vpcs.into_iter().next()))
}

async fn subnets_of(ctx: &AwsContext, vpc_id: &str) -> Result<Vec<Subnet>> {
    let out: DescribeSubnetsOutput = ctx
        .invoker
        .call(
            ResourceKind::Subnet,
            vpc_id,
            ops::DESCRIBE_SUBNETS,
            &DescribeInput {
                filters: vec![Filter::new("vpc-id", vpc_id)],
            },
        )
        .await?;
    Ok(out.subnets)
}

async fn subnet_ids_by_name(ctx: &AwsContext, vpc_id: &str, name: String) -> Result<Vec<String>> {
    let out: DescribeSubnetsOutput = ctx
        .invoker
        .call(
            ResourceKind::Subnet,
            &name,
            ops::DESCRIBE_SUBNETS,
            &DescribeInput {
                filters: vec![Filter::new("vpc-id", vpc_id), Filter::name_tag(&name)],
            },
        )
        .await?;
    Ok(out.subnets.into_iter().filter_map(|s| s.subnet_id).collect())
}

async fn subnet_by_id(ctx: &AwsContext, id: &str) -> Result<Option<Subnet>> {
    let out: Option<DescribeSubnetsOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                ResourceKind::Subnet,
                id,
                ops::DESCRIBE_SUBNETS,
                &json!({ "SubnetIds": [id] }),
            )
            .await,
    )?;
    Ok(out.and_then(|o| o.subnets.into_iter().next()))
}

async fn gateways_of(ctx: &AwsContext, vpc_id: &str) -> Result<Vec<String>> {
    let out: DescribeInternetGatewaysOutput = ctx
        .invoker
        .call(
            ResourceKind::InternetGateway,
            vpc_id,
            ops::DESCRIBE_INTERNET_GATEWAYS,
            &DescribeInput {
                filters: vec![Filter::new("attachment.vpc-id", vpc_id)],
            },
        )
        .await?;
    Ok(out
        .internet_gateways
        .into_iter()
        .filter_map(|g| g.internet_gateway_id)
        .collect())
}

async fn main_route_table(ctx: &AwsContext, vpc_id: &str) -> Result<RouteTable> {
    let out: DescribeRouteTablesOutput = ctx
        .invoker
        .call(
            KIND,
            vpc_id,
            ops::DESCRIBE_ROUTE_TABLES,
            &DescribeInput {
                filters: vec![Filter::new("vpc-id", vpc_id)],
            },
        )
        .await?;
    out.route_tables
        .into_iter()
        .find(RouteTable::is_main)
        .ok_or_else(|| ReconError::malformed(format!("{} has no main route table", vpc_id)))
}

/// Re-derive the network with its subnets and gateway
async fn describe(ctx: &AwsContext, id: &str) -> Result<VpcInfo> {
    let vpc = network(ctx, id)
        .await?
        .ok_or_else(|| ReconError::not_found(KIND, id))?;
    let mut subnets = convert_all(
        ResourceKind::Subnet,
        subnets_of(ctx, id).await?,
        subnet_to_info,
    );
    subnets.sort_by(|a, b| a.iid.name.cmp(&b.iid.name));
    let gateway = gateways_of(ctx, id).await?.into_iter().next();
    vpc_to_info(vpc, subnets, gateway)
}

// ---------------------------------------------------------------------------
// sub-resource lifecycle

async fn create_network(ctx: &AwsContext, req: &VpcRequest) -> Result<String> {
    let out: CreateVpcOutput = ctx
        .invoker
        .call(
            KIND,
            &req.name,
            ops::CREATE_VPC,
            &CreateVpcInput {
                cidr_block: req.ipv4_cidr.trim().to_string(),
                tag_specifications: tag_spec("vpc", named_tags(&req.name, &req.tags)),
            },
        )
        .await?;
    out.vpc
        .and_then(|v| v.vpc_id)
        .ok_or_else(|| ReconError::malformed("CreateVpc returned no VpcId"))
}

async fn delete_network(ctx: &AwsContext, id: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(KIND, &id, ops::DELETE_VPC, &json!({ "VpcId": id }))
            .await,
    )?;
    Ok(())
}

async fn create_gateway(ctx: &AwsContext, name: &str) -> Result<String> {
    let out: CreateInternetGatewayOutput = ctx
        .invoker
        .call(
            ResourceKind::InternetGateway,
            name,
            ops::CREATE_INTERNET_GATEWAY,
            &CreateInternetGatewayInput {
                tag_specifications: tag_spec("internet-gateway", named_tags(name, &[])),
            },
        )
        .await?;
    out.internet_gateway
        .and_then(|g| g.internet_gateway_id)
        .ok_or_else(|| ReconError::malformed("CreateInternetGateway returned no InternetGatewayId"))
}

async fn attach_gateway(ctx: &AwsContext, vpc_id: &str, gateway_id: &str) -> Result<()> {
    ctx.invoker
        .call_unit(
            ResourceKind::InternetGateway,
            gateway_id,
            ops::ATTACH_INTERNET_GATEWAY,
            &InternetGatewayInput {
                internet_gateway_id: gateway_id.to_string(),
                vpc_id: vpc_id.to_string(),
            },
        )
        .await
}

/// Detach (if attached) and delete one gateway
async fn delete_gateway(ctx: &AwsContext, vpc_id: String, gateway_id: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::InternetGateway,
                &gateway_id,
                ops::DETACH_INTERNET_GATEWAY,
                &InternetGatewayInput {
                    internet_gateway_id: gateway_id.clone(),
                    vpc_id,
                },
            )
            .await,
    )?;
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::InternetGateway,
                &gateway_id,
                ops::DELETE_INTERNET_GATEWAY,
                &json!({ "InternetGatewayId": gateway_id }),
            )
            .await,
    )?;
    Ok(())
}

/// Point the main route table's default route at the gateway
async fn create_default_route(ctx: &AwsContext, vpc_id: &str, gateway_id: &str) -> Result<()> {
    let table = main_route_table(ctx, vpc_id).await?;
    ctx.invoker
        .call_unit(
            KIND,
            vpc_id,
            ops::CREATE_ROUTE,
            &RouteInput {
                route_table_id: table.route_table_id.unwrap_or_default(),
                destination_cidr_block: DEFAULT_ROUTE.to_string(),
                gateway_id: Some(gateway_id.to_string()),
            },
        )
        .await
}

/// Remove the main route table's default route, if there is one
async fn delete_default_route(ctx: &AwsContext, vpc_id: &str) -> Result<()> {
    let table = match absent_on_not_found(main_route_table(ctx, vpc_id).await)? {
        Some(table) => table,
        None => return Ok(()),
    };
    let has_default = table
        .routes
        .iter()
        .any(|r| r.destination_cidr_block.as_deref() == Some(DEFAULT_ROUTE));
    if !has_default {
        return Ok(());
    }
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                KIND,
                vpc_id,
                ops::DELETE_ROUTE,
                &RouteInput {
                    route_table_id: table.route_table_id.unwrap_or_default(),
                    destination_cidr_block: DEFAULT_ROUTE.to_string(),
                    gateway_id: None,
                },
            )
            .await,
    )?;
    Ok(())
}

/// Route, then gateway
async fn teardown_gateway(ctx: &AwsContext, vpc_id: String, gateway_id: String) -> Result<()> {
    delete_default_route(ctx, &vpc_id).await?;
    delete_gateway(ctx, vpc_id, gateway_id).await
}

async fn create_subnet(ctx: &AwsContext, vpc_id: &str, req: &SubnetRequest) -> Result<String> {
    let zone = req
        .zone
        .clone()
        .filter(|z| !z.trim().is_empty())
        .unwrap_or_else(|| ctx.zone());
    let out: CreateSubnetOutput = ctx
        .invoker
        .call(
            ResourceKind::Subnet,
            &req.name,
            ops::CREATE_SUBNET,
            &CreateSubnetInput {
                vpc_id: vpc_id.to_string(),
                cidr_block: req.ipv4_cidr.trim().to_string(),
                availability_zone: zone,
                tag_specifications: tag_spec("subnet", named_tags(&req.name, &req.tags)),
            },
        )
        .await?;
    out.subnet
        .and_then(|s| s.subnet_id)
        .ok_or_else(|| ReconError::malformed("CreateSubnet returned no SubnetId"))
}

async fn delete_subnet(ctx: &AwsContext, id: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::Subnet,
                &id,
                ops::DELETE_SUBNET,
                &json!({ "SubnetId": id }),
            )
            .await,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------

pub struct AwsVpcHandler {
    ctx: Arc<AwsContext>,
}

impl AwsVpcHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl VpcHandler for AwsVpcHandler {
    async fn create(&self, req: VpcRequest) -> Result<VpcInfo> {
        let ctx: &AwsContext = &self.ctx;
        validate(&req)?;
        if !lookup(ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let mut run = WorkflowRun::new(KIND, &req.name, ctx.composite_policy());

        let vpc_id = run.step(STEP_VPC, create_network(ctx, &req)).await?;
        run.record_with_undo(
            KIND,
            &vpc_id,
            STEP_VPC,
            Box::pin(delete_network(ctx, vpc_id.clone())),
        );

        let gateway_id = run.step(STEP_GATEWAY, create_gateway(ctx, &req.name)).await?;
        run.record_with_undo(
            ResourceKind::InternetGateway,
            &gateway_id,
            STEP_GATEWAY,
            Box::pin(teardown_gateway(ctx, vpc_id.clone(), gateway_id.clone())),
        );
        run.step(STEP_GATEWAY, attach_gateway(ctx, &vpc_id, &gateway_id))
            .await?;
        run.step(STEP_ROUTE, create_default_route(ctx, &vpc_id, &gateway_id))
            .await?;

        for subnet in &req.subnets {
            let step = format!("subnet:{}", subnet.name);
            let subnet_id = run.step(&step, create_subnet(ctx, &vpc_id, subnet)).await?;
            run.record_with_undo(
                ResourceKind::Subnet,
                &subnet_id,
                &step,
                Box::pin(delete_subnet(ctx, subnet_id.clone())),
            );
        }

        tracing::info!(
            "vpc {} ({}) is ready with {} subnet(s)",
            req.name,
            vpc_id,
            req.subnets.len()
        );
        run.step(STEP_VPC, describe(ctx, &vpc_id)).await
    }

    async fn list(&self) -> Result<Vec<VpcInfo>> {
        let ctx: &AwsContext = &self.ctx;
        let out: DescribeVpcsOutput = ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_VPCS, &json!({}))
            .await?;
        let ids: Vec<String> = out.vpcs.into_iter().filter_map(|v| v.vpc_id).collect();

        Ok(fan_out(KIND, ids, ctx.concurrency(), |id| async move {
            describe(ctx, &id).await
        })
        .await)
    }

    async fn get(&self, iid: &Iid) -> Result<VpcInfo> {
        let id = resolve(&self.ctx, iid).await?;
        describe(&self.ctx, &id).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let ctx: &AwsContext = &self.ctx;
        let id = match resolve(ctx, iid).await {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Ok(true),
            Err(e) => return Err(e),
        };
        if network(ctx, &id).await?.is_none() {
            return Ok(true);
        }

        for subnet in subnets_of(ctx, &id).await? {
            if let Some(subnet_id) = subnet.subnet_id {
                delete_subnet(ctx, subnet_id).await?;
            }
        }
        delete_default_route(ctx, &id).await?;
        for gateway in gateways_of(ctx, &id).await? {
            delete_gateway(ctx, id.clone(), gateway).await?;
        }
        delete_network(ctx, id.clone()).await?;

        tracing::info!("deleted vpc {}", id);
        Ok(true)
    }

    async fn add_subnet(&self, vpc: &Iid, req: SubnetRequest) -> Result<VpcInfo> {
        let ctx: &AwsContext = &self.ctx;
        validate_subnet(&req)?;
        let vpc_id = resolve(ctx, vpc).await?;
        if network(ctx, &vpc_id).await?.is_none() {
            return Err(ReconError::not_found(KIND, &vpc_id));
        }
        if !subnet_ids_by_name(ctx, &vpc_id, req.name.clone())
            .await?
            .is_empty()
        {
            return Err(ReconError::AlreadyExists {
                kind: ResourceKind::Subnet,
                name: req.name,
            });
        }

        let subnet_id = create_subnet(ctx, &vpc_id, &req).await?;
        tracing::info!("added subnet {} ({}) to {}", req.name, subnet_id, vpc_id);
        describe(ctx, &vpc_id).await
    }

    async fn remove_subnet(&self, vpc: &Iid, subnet: &Iid) -> Result<bool> {
        let ctx: &AwsContext = &self.ctx;
        let vpc_id = resolve(ctx, vpc).await?;
        let subnet_id = match skyrecon_core::resolve(ResourceKind::Subnet, subnet, |name| {
            subnet_ids_by_name(ctx, &vpc_id, name)
        })
        .await
        {
            Ok(id) => id,
            Err(e) if e.is_not_found() => return Ok(true),
            Err(e) => return Err(e),
        };

        // an id given directly must belong to this network
        match subnet_by_id(ctx, &subnet_id).await? {
            None => return Ok(true),
            Some(s) if s.vpc_id.as_deref() != Some(vpc_id.as_str()) => {
                return Err(ReconError::not_found(
                    ResourceKind::Subnet,
                    format!("{} in {}", subnet_id, vpc_id),
                ));
            }
            Some(_) => {}
        }

        delete_subnet(ctx, subnet_id).await?;
        Ok(true)
    }

    async fn list_subnets(&self, vpc: &Iid) -> Result<Vec<SubnetInfo>> {
        let ctx: &AwsContext = &self.ctx;
        let vpc_id = resolve(ctx, vpc).await?;
        let mut subnets = convert_all(
            ResourceKind::Subnet,
            subnets_of(ctx, &vpc_id).await?,
            subnet_to_info,
        );
        subnets.sort_by(|a, b| a.iid.name.cmp(&b.iid.name));
        Ok(subnets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_blocks() {
        assert!(check_cidr(KIND, "10.0.0.0/16").is_ok());
        assert!(check_cidr(KIND, " 10.0.1.0/24 ").is_ok());
        assert!(check_cidr(KIND, "10.0.0.0/8").is_err());
        assert!(check_cidr(KIND, "10.0.0.0/30").is_err());
        assert!(check_cidr(KIND, "10.0.0/16").is_err());
        assert!(check_cidr(KIND, "10.0.0.0").is_err());
        assert!(check_cidr(KIND, "").is_err());
    }

    #[test]
    fn test_subnet_names_must_be_unique() {
        let subnet = |name: &str, cidr: &str| SubnetRequest {
            name: name.to_string(),
            ipv4_cidr: cidr.to_string(),
            ..Default::default()
        };
        let mut req = VpcRequest {
            name: "main".to_string(),
            ipv4_cidr: "10.0.0.0/16".to_string(),
            subnets: vec![subnet("a", "10.0.1.0/24"), subnet("b", "10.0.2.0/24")],
            ..Default::default()
        };
        assert!(validate(&req).is_ok());

        req.subnets.push(subnet("a", "10.0.3.0/24"));
        assert!(matches!(validate(&req), Err(ReconError::Validation(_))));
    }
}
