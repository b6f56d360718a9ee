//! Networking: VPCs, subnets, internet gateways and route tables

use crate::ec2::{not_found, selection};
use crate::error::{SimError, SimResult};
use crate::world::{FilterInput, TagSpecInput, World, parse, passes};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

#[derive(Debug, Default)]
pub(crate) struct VpcState {
    vpcs: BTreeMap<String, Vpc>,
    subnets: BTreeMap<String, Subnet>,
    gateways: BTreeMap<String, Gateway>,
    route_tables: BTreeMap<String, RouteTable>,
}

#[derive(Debug)]
struct Vpc {
    cidr: Cidr,
}

#[derive(Debug)]
struct Subnet {
    vpc_id: String,
    cidr: Cidr,
    zone: String,
}

#[derive(Debug, Default)]
struct Gateway {
    vpc_id: Option<String>,
}

#[derive(Debug)]
struct RouteTable {
    vpc_id: String,
    main: bool,
    /// destination -> gateway id (`local` for the network's own range)
    routes: BTreeMap<String, String>,
}

/// IPv4 block as base address and prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cidr {
    base: u32,
    prefix: u8,
}

impl Cidr {
    fn parse(value: &str) -> SimResult<Self> {
        let invalid = || {
            SimError::api(
                "InvalidParameterValue",
                format!("value ({}) for parameter cidrBlock is invalid", value),
            )
        };
        let (addr, prefix) = value.split_once('/').ok_or_else(invalid)?;
        let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
        if prefix > 32 {
            return Err(invalid());
        }
        let cidr = Self {
            base: u32::from(addr),
            prefix,
        };
        if cidr.base & !cidr.mask() != 0 {
            return Err(invalid());
        }
        Ok(cidr)
    }

    fn mask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - self.prefix)
        }
    }

    fn contains(&self, other: &Cidr) -> bool {
        other.prefix >= self.prefix && other.base & self.mask() == self.base
    }

    fn overlaps(&self, other: &Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Usable addresses; the provider reserves five per subnet
    fn available(&self) -> u32 {
        let size = 1u64 << (32 - u32::from(self.prefix));
        size.saturating_sub(5) as u32
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", Ipv4Addr::from(self.base), self.prefix)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeRequest {
    vpc_ids: Vec<String>,
    subnet_ids: Vec<String>,
    internet_gateway_ids: Vec<String>,
    route_table_ids: Vec<String>,
    filters: Vec<FilterInput>,
}

pub(crate) fn handle(world: &mut World, action: &str, request: Value) -> SimResult<Value> {
    match action {
        "CreateVpc" => create_vpc(world, parse(request)?),
        "DescribeVpcs" => describe_vpcs(world, parse(request)?),
        "DeleteVpc" => delete_vpc(world, parse(request)?),
        "CreateSubnet" => create_subnet(world, parse(request)?),
        "DescribeSubnets" => describe_subnets(world, parse(request)?),
        "DeleteSubnet" => delete_subnet(world, parse(request)?),
        "CreateInternetGateway" => create_gateway(world, parse(request)?),
        "DescribeInternetGateways" => describe_gateways(world, parse(request)?),
        "AttachInternetGateway" => attach_gateway(world, parse(request)?),
        "DetachInternetGateway" => detach_gateway(world, parse(request)?),
        "DeleteInternetGateway" => delete_gateway(world, parse(request)?),
        "DescribeRouteTables" => describe_route_tables(world, parse(request)?),
        "CreateRoute" => create_route(world, parse(request)?),
        "DeleteRoute" => delete_route(world, parse(request)?),
        other => Err(SimError::Unsupported(format!("ec2:{}", other))),
    }
}

// ---------------------------------------------------------------------------
// VPCs

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateVpcRequest {
    cidr_block: String,
    #[serde(default)]
    tag_specifications: Vec<TagSpecInput>,
}

fn create_vpc(world: &mut World, req: CreateVpcRequest) -> SimResult<Value> {
    let cidr = Cidr::parse(&req.cidr_block)?;
    if !(16..=28).contains(&cidr.prefix) {
        return Err(SimError::api(
            "InvalidVpc.Range",
            format!("the CIDR '{}' is invalid", req.cidr_block),
        ));
    }
    let id = format!("vpc-{}", world.next_hex());
    let table_id = format!("rtb-{}", world.next_hex());
    world.tags.register_specs(&id, "ec2:vpc", &req.tag_specifications);
    world.vpc.vpcs.insert(id.clone(), Vpc { cidr });
    world.vpc.route_tables.insert(
        table_id,
        RouteTable {
            vpc_id: id.clone(),
            main: true,
            routes: BTreeMap::from([(cidr.to_string(), "local".to_string())]),
        },
    );
    Ok(json!({ "Vpc": render_vpc(world, &id) }))
}

fn render_vpc(world: &World, id: &str) -> Value {
    let Some(v) = world.vpc.vpcs.get(id) else {
        return Value::Null;
    };
    json!({
        "VpcId": id,
        "CidrBlock": v.cidr.to_string(),
        "State": "available",
        "IsDefault": false,
        "Tags": world.tags.render(id),
    })
}

fn describe_vpcs(world: &mut World, req: DescribeRequest) -> SimResult<Value> {
    let ids = selection(&world.vpc.vpcs, &req.vpc_ids, "InvalidVpcID.NotFound")?;
    let vpcs: Vec<Value> = ids
        .iter()
        .filter(|id| {
            let cidr = world.vpc.vpcs.get(*id).map(|v| v.cidr.to_string());
            passes(&req.filters, &world.tags, id, |attr| match attr {
                "vpc-id" => Some(id.to_string()),
                "cidr" | "cidr-block" => cidr.clone(),
                _ => None,
            })
        })
        .map(|id| render_vpc(world, id))
        .collect();
    Ok(json!({ "Vpcs": vpcs }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcIdRequest {
    vpc_id: String,
}

fn dependency(id: &str) -> SimError {
    SimError::api(
        "DependencyViolation",
        format!("The vpc '{}' has dependencies and cannot be deleted.", id),
    )
}

fn delete_vpc(world: &mut World, req: VpcIdRequest) -> SimResult<Value> {
    let id = req.vpc_id;
    if !world.vpc.vpcs.contains_key(&id) {
        return Err(not_found("InvalidVpcID.NotFound", &id));
    }
    if world.vpc.subnets.values().any(|s| s.vpc_id == id)
        || world
            .vpc
            .gateways
            .values()
            .any(|g| g.vpc_id.as_deref() == Some(id.as_str()))
        || world.ec2.has_groups_in(&id)
    {
        return Err(dependency(&id));
    }
    world.vpc.vpcs.remove(&id);
    world.vpc.route_tables.retain(|_, t| t.vpc_id != id);
    world.tags.forget(&id);
    Ok(json!({}))
}

// ---------------------------------------------------------------------------
// Subnets

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSubnetRequest {
    vpc_id: String,
    cidr_block: String,
    #[serde(default)]
    availability_zone: Option<String>,
    #[serde(default)]
    tag_specifications: Vec<TagSpecInput>,
}

fn create_subnet(world: &mut World, req: CreateSubnetRequest) -> SimResult<Value> {
    let vpc_cidr = world
        .vpc
        .vpcs
        .get(&req.vpc_id)
        .map(|v| v.cidr)
        .ok_or_else(|| not_found("InvalidVpcID.NotFound", &req.vpc_id))?;
    let cidr = Cidr::parse(&req.cidr_block)?;
    if !vpc_cidr.contains(&cidr) || !(16..=28).contains(&cidr.prefix) {
        return Err(SimError::api(
            "InvalidSubnet.Range",
            format!("The CIDR '{}' is invalid.", req.cidr_block),
        ));
    }
    if world
        .vpc
        .subnets
        .values()
        .any(|s| s.vpc_id == req.vpc_id && s.cidr.overlaps(&cidr))
    {
        return Err(SimError::api(
            "InvalidSubnet.Conflict",
            format!("The CIDR '{}' conflicts with another subnet", req.cidr_block),
        ));
    }

    let zones = world.regions.get(&world.config.region).cloned().unwrap_or_default();
    let zone = req
        .availability_zone
        .unwrap_or_else(|| zones.first().cloned().unwrap_or_default());
    if !zones.contains(&zone) {
        return Err(SimError::api(
            "InvalidParameterValue",
            format!("Value ({}) for parameter availabilityZone is invalid.", zone),
        ));
    }

    let id = format!("subnet-{}", world.next_hex());
    world
        .tags
        .register_specs(&id, "ec2:subnet", &req.tag_specifications);
    world.vpc.subnets.insert(
        id.clone(),
        Subnet {
            vpc_id: req.vpc_id,
            cidr,
            zone,
        },
    );
    Ok(json!({ "Subnet": render_subnet(world, &id) }))
}

fn render_subnet(world: &World, id: &str) -> Value {
    let Some(s) = world.vpc.subnets.get(id) else {
        return Value::Null;
    };
    json!({
        "SubnetId": id,
        "VpcId": s.vpc_id,
        "CidrBlock": s.cidr.to_string(),
        "AvailabilityZone": s.zone,
        "State": "available",
        "AvailableIpAddressCount": s.cidr.available(),
        "Tags": world.tags.render(id),
    })
}

fn describe_subnets(world: &mut World, req: DescribeRequest) -> SimResult<Value> {
    let ids = selection(&world.vpc.subnets, &req.subnet_ids, "InvalidSubnetID.NotFound")?;
    let subnets: Vec<Value> = ids
        .iter()
        .filter(|id| {
            let subnet = world.vpc.subnets.get(*id);
            passes(&req.filters, &world.tags, id, |attr| match attr {
                "subnet-id" => Some(id.to_string()),
                "vpc-id" => subnet.map(|s| s.vpc_id.clone()),
                "availability-zone" => subnet.map(|s| s.zone.clone()),
                _ => None,
            })
        })
        .map(|id| render_subnet(world, id))
        .collect();
    Ok(json!({ "Subnets": subnets }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetIdRequest {
    subnet_id: String,
}

fn delete_subnet(world: &mut World, req: SubnetIdRequest) -> SimResult<Value> {
    if !world.vpc.subnets.contains_key(&req.subnet_id) {
        return Err(not_found("InvalidSubnetID.NotFound", &req.subnet_id));
    }
    if world.ec2.has_instances_in(&req.subnet_id) {
        return Err(SimError::api(
            "DependencyViolation",
            format!("The subnet '{}' has dependencies and cannot be deleted.", req.subnet_id),
        ));
    }
    world.vpc.subnets.remove(&req.subnet_id);
    world.tags.forget(&req.subnet_id);
    Ok(json!({}))
}

// ---------------------------------------------------------------------------
// Internet gateways

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreateGatewayRequest {
    tag_specifications: Vec<TagSpecInput>,
}

fn create_gateway(world: &mut World, req: CreateGatewayRequest) -> SimResult<Value> {
    let id = format!("igw-{}", world.next_hex());
    world
        .tags
        .register_specs(&id, "ec2:internet-gateway", &req.tag_specifications);
    world.vpc.gateways.insert(id.clone(), Gateway::default());
    Ok(json!({ "InternetGateway": render_gateway(world, &id) }))
}

fn render_gateway(world: &World, id: &str) -> Value {
    let attachments: Vec<Value> = world
        .vpc
        .gateways
        .get(id)
        .and_then(|g| g.vpc_id.as_ref())
        .map(|vpc| json!({ "VpcId": vpc, "State": "available" }))
        .into_iter()
        .collect();
    json!({
        "InternetGatewayId": id,
        "Attachments": attachments,
        "Tags": world.tags.render(id),
    })
}

fn describe_gateways(world: &mut World, req: DescribeRequest) -> SimResult<Value> {
    let ids = selection(
        &world.vpc.gateways,
        &req.internet_gateway_ids,
        "InvalidInternetGatewayID.NotFound",
    )?;
    let gateways: Vec<Value> = ids
        .iter()
        .filter(|id| {
            let vpc = world.vpc.gateways.get(*id).and_then(|g| g.vpc_id.clone());
            passes(&req.filters, &world.tags, id, |attr| match attr {
                "internet-gateway-id" => Some(id.to_string()),
                "attachment.vpc-id" => vpc.clone(),
                _ => None,
            })
        })
        .map(|id| render_gateway(world, id))
        .collect();
    Ok(json!({ "InternetGateways": gateways }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GatewayRequest {
    internet_gateway_id: String,
    #[serde(default)]
    vpc_id: String,
}

fn attach_gateway(world: &mut World, req: GatewayRequest) -> SimResult<Value> {
    if !world.vpc.vpcs.contains_key(&req.vpc_id) {
        return Err(not_found("InvalidVpcID.NotFound", &req.vpc_id));
    }
    if world
        .vpc
        .gateways
        .values()
        .any(|g| g.vpc_id.as_deref() == Some(req.vpc_id.as_str()))
    {
        return Err(SimError::api(
            "Resource.AlreadyAssociated",
            format!("{} already has an internet gateway attached", req.vpc_id),
        ));
    }
    let gateway = world
        .vpc
        .gateways
        .get_mut(&req.internet_gateway_id)
        .ok_or_else(|| not_found("InvalidInternetGatewayID.NotFound", &req.internet_gateway_id))?;
    if gateway.vpc_id.is_some() {
        return Err(SimError::api(
            "Resource.AlreadyAssociated",
            format!("{} is already attached", req.internet_gateway_id),
        ));
    }
    gateway.vpc_id = Some(req.vpc_id);
    Ok(json!({}))
}

fn detach_gateway(world: &mut World, req: GatewayRequest) -> SimResult<Value> {
    let gateway = world
        .vpc
        .gateways
        .get_mut(&req.internet_gateway_id)
        .ok_or_else(|| not_found("InvalidInternetGatewayID.NotFound", &req.internet_gateway_id))?;
    if gateway.vpc_id.as_deref() != Some(req.vpc_id.as_str()) {
        return Err(SimError::api(
            "Gateway.NotAttached",
            format!(
                "resource {} is not attached to network {}",
                req.internet_gateway_id, req.vpc_id
            ),
        ));
    }
    gateway.vpc_id = None;
    Ok(json!({}))
}

fn delete_gateway(world: &mut World, req: GatewayRequest) -> SimResult<Value> {
    let gateway = world
        .vpc
        .gateways
        .get(&req.internet_gateway_id)
        .ok_or_else(|| not_found("InvalidInternetGatewayID.NotFound", &req.internet_gateway_id))?;
    if gateway.vpc_id.is_some() {
        return Err(SimError::api(
            "DependencyViolation",
            format!("The internetGateway '{}' has dependencies and cannot be deleted.", req.internet_gateway_id),
        ));
    }
    world.vpc.gateways.remove(&req.internet_gateway_id);
    world.tags.forget(&req.internet_gateway_id);
    Ok(json!({}))
}

// ---------------------------------------------------------------------------
// Route tables

fn describe_route_tables(world: &mut World, req: DescribeRequest) -> SimResult<Value> {
    let ids = selection(
        &world.vpc.route_tables,
        &req.route_table_ids,
        "InvalidRouteTableID.NotFound",
    )?;
    let tables: Vec<Value> = ids
        .iter()
        .filter_map(|id| {
            let t = world.vpc.route_tables.get(id)?;
            let visible = passes(&req.filters, &world.tags, id, |attr| match attr {
                "route-table-id" => Some(id.clone()),
                "vpc-id" => Some(t.vpc_id.clone()),
                "association.main" => Some(t.main.to_string()),
                _ => None,
            });
            let routes: Vec<Value> = t
                .routes
                .iter()
                .map(|(dest, target)| {
                    json!({ "DestinationCidrBlock": dest, "GatewayId": target, "State": "active" })
                })
                .collect();
            let associations: Vec<Value> = if t.main {
                vec![json!({
                    "RouteTableAssociationId": format!("rtbassoc-{}", &id[4..]),
                    "RouteTableId": id,
                    "Main": true,
                })]
            } else {
                Vec::new()
            };
            visible.then(|| {
                json!({
                    "RouteTableId": id,
                    "VpcId": t.vpc_id,
                    "Routes": routes,
                    "Associations": associations,
                })
            })
        })
        .collect();
    Ok(json!({ "RouteTables": tables }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RouteRequest {
    route_table_id: String,
    destination_cidr_block: String,
    #[serde(default)]
    gateway_id: Option<String>,
}

fn create_route(world: &mut World, req: RouteRequest) -> SimResult<Value> {
    let gateway_id = req
        .gateway_id
        .ok_or_else(|| SimError::api("MissingParameter", "a route target is required"))?;
    let table = world
        .vpc
        .route_tables
        .get(&req.route_table_id)
        .ok_or_else(|| not_found("InvalidRouteTableID.NotFound", &req.route_table_id))?;
    let gateway = world
        .vpc
        .gateways
        .get(&gateway_id)
        .ok_or_else(|| not_found("InvalidGatewayID.NotFound", &gateway_id))?;
    if gateway.vpc_id.as_deref() != Some(table.vpc_id.as_str()) {
        return Err(SimError::api(
            "InvalidParameterValue",
            format!("route table {} and network gateway {} belong to different networks", req.route_table_id, gateway_id),
        ));
    }
    if table.routes.contains_key(&req.destination_cidr_block) {
        return Err(SimError::api(
            "RouteAlreadyExists",
            format!("the route identified by {} already exists", req.destination_cidr_block),
        ));
    }
    if let Some(table) = world.vpc.route_tables.get_mut(&req.route_table_id) {
        table.routes.insert(req.destination_cidr_block, gateway_id);
    }
    Ok(json!({ "Return": true }))
}

fn delete_route(world: &mut World, req: RouteRequest) -> SimResult<Value> {
    let table = world
        .vpc
        .route_tables
        .get_mut(&req.route_table_id)
        .ok_or_else(|| not_found("InvalidRouteTableID.NotFound", &req.route_table_id))?;
    match table.routes.get(&req.destination_cidr_block).map(String::as_str) {
        Some("local") => Err(SimError::api(
            "InvalidParameterValue",
            "cannot remove the local route",
        )),
        Some(_) => {
            table.routes.remove(&req.destination_cidr_block);
            Ok(json!({}))
        }
        None => Err(SimError::api(
            "InvalidRoute.NotFound",
            format!("no route with destination {} in {}", req.destination_cidr_block, req.route_table_id),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimConfig;

    fn world() -> World {
        World::new(SimConfig::default())
    }

    fn create(w: &mut World, action: &str, request: Value) -> Value {
        handle(w, action, request).unwrap()
    }

    #[test]
    fn test_cidr_math() {
        let vpc = Cidr::parse("10.0.0.0/16").unwrap();
        let a = Cidr::parse("10.0.1.0/24").unwrap();
        let b = Cidr::parse("10.0.1.128/25").unwrap();
        assert!(vpc.contains(&a));
        assert!(a.overlaps(&b));
        assert!(!vpc.contains(&Cidr::parse("10.1.0.0/24").unwrap()));
        assert_eq!(a.to_string(), "10.0.1.0/24");
        assert_eq!(a.available(), 251);
        assert!(Cidr::parse("10.0.1.1/24").is_err());
        assert!(Cidr::parse("10.0.1.0").is_err());
    }

    #[test]
    fn test_subnet_must_fit_and_not_overlap() {
        let mut w = world();
        let vpc = create(&mut w, "CreateVpc", json!({ "CidrBlock": "10.0.0.0/16" }));
        let vpc_id = vpc["Vpc"]["VpcId"].as_str().unwrap().to_string();

        create(
            &mut w,
            "CreateSubnet",
            json!({ "VpcId": vpc_id, "CidrBlock": "10.0.1.0/24" }),
        );
        let outside = handle(
            &mut w,
            "CreateSubnet",
            json!({ "VpcId": vpc_id, "CidrBlock": "192.168.0.0/24" }),
        )
        .unwrap_err();
        assert_eq!(outside.code(), "InvalidSubnet.Range");

        let overlap = handle(
            &mut w,
            "CreateSubnet",
            json!({ "VpcId": vpc_id, "CidrBlock": "10.0.1.0/25" }),
        )
        .unwrap_err();
        assert_eq!(overlap.code(), "InvalidSubnet.Conflict");
    }

    #[test]
    fn test_vpc_with_dependencies_cannot_be_deleted() {
        let mut w = world();
        let vpc = create(&mut w, "CreateVpc", json!({ "CidrBlock": "10.0.0.0/16" }));
        let vpc_id = vpc["Vpc"]["VpcId"].as_str().unwrap().to_string();
        let igw = create(&mut w, "CreateInternetGateway", json!({}));
        let igw_id = igw["InternetGateway"]["InternetGatewayId"]
            .as_str()
            .unwrap()
            .to_string();
        create(
            &mut w,
            "AttachInternetGateway",
            json!({ "InternetGatewayId": igw_id, "VpcId": vpc_id }),
        );

        let err = handle(&mut w, "DeleteVpc", json!({ "VpcId": vpc_id })).unwrap_err();
        assert_eq!(err.code(), "DependencyViolation");
        let err = handle(
            &mut w,
            "DeleteInternetGateway",
            json!({ "InternetGatewayId": igw_id }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "DependencyViolation");

        create(
            &mut w,
            "DetachInternetGateway",
            json!({ "InternetGatewayId": igw_id, "VpcId": vpc_id }),
        );
        let err = handle(
            &mut w,
            "DetachInternetGateway",
            json!({ "InternetGatewayId": igw_id, "VpcId": vpc_id }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "Gateway.NotAttached");

        create(&mut w, "DeleteInternetGateway", json!({ "InternetGatewayId": igw_id }));
        create(&mut w, "DeleteVpc", json!({ "VpcId": vpc_id }));
        let tables = create(&mut w, "DescribeRouteTables", json!({}));
        assert_eq!(tables["RouteTables"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_default_route_needs_attached_gateway() {
        let mut w = world();
        let vpc = create(&mut w, "CreateVpc", json!({ "CidrBlock": "10.0.0.0/16" }));
        let vpc_id = vpc["Vpc"]["VpcId"].as_str().unwrap().to_string();
        let tables = create(
            &mut w,
            "DescribeRouteTables",
            json!({ "Filters": [{ "Name": "vpc-id", "Values": [vpc_id] }] }),
        );
        let table_id = tables["RouteTables"][0]["RouteTableId"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(tables["RouteTables"][0]["Associations"][0]["Main"], true);

        let igw = create(&mut w, "CreateInternetGateway", json!({}));
        let igw_id = igw["InternetGateway"]["InternetGatewayId"]
            .as_str()
            .unwrap()
            .to_string();
        let route = json!({
            "RouteTableId": table_id,
            "DestinationCidrBlock": "0.0.0.0/0",
            "GatewayId": igw_id,
        });
        let err = handle(&mut w, "CreateRoute", route.clone()).unwrap_err();
        assert_eq!(err.code(), "InvalidParameterValue");

        create(
            &mut w,
            "AttachInternetGateway",
            json!({ "InternetGatewayId": igw_id, "VpcId": vpc_id }),
        );
        create(&mut w, "CreateRoute", route.clone());
        assert_eq!(
            handle(&mut w, "CreateRoute", route).unwrap_err().code(),
            "RouteAlreadyExists"
        );
    }
}
