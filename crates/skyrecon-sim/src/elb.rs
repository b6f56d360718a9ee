//! Load balancing service: target groups, listeners and network load
//! balancers

use crate::error::{SimError, SimResult};
use crate::world::{Lifecycle, TagInput, World, now, parse};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

const PROTOCOLS: [&str; 4] = ["TCP", "UDP", "TLS", "TCP_UDP"];
const HEALTH_PROTOCOLS: [&str; 3] = ["TCP", "HTTP", "HTTPS"];

#[derive(Debug, Default)]
pub(crate) struct ElbState {
    target_groups: BTreeMap<String, TargetGroup>,
    listeners: BTreeMap<String, Listener>,
    load_balancers: BTreeMap<String, LoadBalancer>,
}

#[derive(Debug, Clone)]
struct Health {
    protocol: String,
    port: String,
    interval: u32,
    timeout: u32,
    healthy: u32,
    unhealthy: u32,
}

#[derive(Debug)]
struct TargetGroup {
    name: String,
    protocol: String,
    port: u16,
    vpc_id: String,
    health: Health,
    targets: Vec<(String, Option<u16>)>,
    created: String,
}

#[derive(Debug)]
struct Listener {
    protocol: String,
    port: u16,
    target_group: String,
    load_balancer: Option<String>,
}

#[derive(Debug)]
struct LoadBalancer {
    name: String,
    scheme: String,
    subnets: Vec<String>,
    listeners: Vec<String>,
    dns: String,
    created: String,
    life: Lifecycle,
}

pub(crate) fn handle(world: &mut World, action: &str, request: Value) -> SimResult<Value> {
    match action {
        "CreateTargetGroup" => create_target_group(world, parse(request)?),
        "DescribeTargetGroups" => describe_target_groups(world, parse(request)?),
        "ModifyTargetGroup" => modify_target_group(world, parse(request)?),
        "DeleteTargetGroup" => delete_target_group(world, parse(request)?),
        "RegisterTargets" => register_targets(world, parse(request)?),
        "DeregisterTargets" => deregister_targets(world, parse(request)?),
        "DescribeTargetHealth" => describe_target_health(world, parse(request)?),
        "CreateListener" => create_listener(world, parse(request)?),
        "DescribeListeners" => describe_listeners(world, parse(request)?),
        "ModifyListener" => modify_listener(world, parse(request)?),
        "DeleteListener" => delete_listener(world, parse(request)?),
        "CreateLoadBalancer" => create_load_balancer(world, parse(request)?),
        "DescribeLoadBalancers" => describe_load_balancers(world, parse(request)?),
        "DeleteLoadBalancer" => delete_load_balancer(world, parse(request)?),
        other => Err(SimError::Unsupported(format!("elbv2:{}", other))),
    }
}

fn validation(message: impl Into<String>) -> SimError {
    SimError::api("ValidationError", message)
}

fn check_protocol(value: &str, allowed: &[&str]) -> SimResult<String> {
    let upper = value.to_uppercase();
    if allowed.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(validation(format!("protocol '{}' is not supported", value)))
    }
}

fn check_port(value: u16) -> SimResult<u16> {
    if value == 0 {
        return Err(validation("port must be between 1 and 65535"));
    }
    Ok(value)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct HealthInput {
    health_check_protocol: Option<String>,
    health_check_port: Option<String>,
    health_check_interval_seconds: Option<u32>,
    health_check_timeout_seconds: Option<u32>,
    healthy_threshold_count: Option<u32>,
    unhealthy_threshold_count: Option<u32>,
}

impl HealthInput {
    fn apply(self, current: &Health) -> SimResult<Health> {
        let health = Health {
            protocol: match self.health_check_protocol {
                Some(p) => check_protocol(&p, &HEALTH_PROTOCOLS)?,
                None => current.protocol.clone(),
            },
            port: self
                .health_check_port
                .unwrap_or_else(|| current.port.clone()),
            interval: self.health_check_interval_seconds.unwrap_or(current.interval),
            timeout: self.health_check_timeout_seconds.unwrap_or(current.timeout),
            healthy: self.healthy_threshold_count.unwrap_or(current.healthy),
            unhealthy: self.unhealthy_threshold_count.unwrap_or(current.unhealthy),
        };
        if !(5..=300).contains(&health.interval) {
            return Err(validation("health check interval must be between 5 and 300"));
        }
        if !(2..=120).contains(&health.timeout) {
            return Err(validation("health check timeout must be between 2 and 120"));
        }
        if !(2..=10).contains(&health.healthy) || !(2..=10).contains(&health.unhealthy) {
            return Err(validation("health check thresholds must be between 2 and 10"));
        }
        Ok(health)
    }
}

impl Default for Health {
    fn default() -> Self {
        Self {
            protocol: "TCP".to_string(),
            port: "traffic-port".to_string(),
            interval: 30,
            timeout: 10,
            healthy: 3,
            unhealthy: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Target groups

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateTargetGroupRequest {
    name: String,
    protocol: String,
    port: u16,
    #[serde(default)]
    vpc_id: String,
    #[serde(flatten)]
    health: HealthInput,
    #[serde(default)]
    tags: Vec<TagInput>,
}

fn create_target_group(world: &mut World, req: CreateTargetGroupRequest) -> SimResult<Value> {
    if req.name.is_empty() || req.name.len() > 32 {
        return Err(validation("target group name must be 1 to 32 characters"));
    }
    if req.vpc_id.is_empty() {
        return Err(validation("VpcId is required"));
    }
    let protocol = check_protocol(&req.protocol, &PROTOCOLS)?;
    let port = check_port(req.port)?;
    if world.elb.target_groups.values().any(|t| t.name == req.name) {
        return Err(SimError::api(
            "DuplicateTargetGroupName",
            format!("a target group named '{}' already exists", req.name),
        ));
    }
    let health = req.health.apply(&Health::default())?;

    let hex = world.next_hex();
    let arn = world.arn(
        "elasticloadbalancing",
        &format!("targetgroup/{}/{}", req.name, hex),
    );
    world
        .tags
        .register(&arn, "elasticloadbalancing:targetgroup", &req.tags);
    world.elb.target_groups.insert(
        arn.clone(),
        TargetGroup {
            name: req.name,
            protocol,
            port,
            vpc_id: req.vpc_id,
            health,
            targets: Vec::new(),
            created: now(),
        },
    );
    Ok(json!({ "TargetGroups": [render_target_group(world, &arn)] }))
}

fn render_target_group(world: &World, arn: &str) -> Value {
    let Some(t) = world.elb.target_groups.get(arn) else {
        return Value::Null;
    };
    let lbs: Vec<&String> = world
        .elb
        .listeners
        .values()
        .filter(|l| l.target_group == arn)
        .filter_map(|l| l.load_balancer.as_ref())
        .collect();
    json!({
        "TargetGroupArn": arn,
        "TargetGroupName": t.name,
        "Protocol": t.protocol,
        "Port": t.port,
        "VpcId": t.vpc_id,
        "TargetType": "instance",
        "HealthCheckProtocol": t.health.protocol,
        "HealthCheckPort": t.health.port,
        "HealthCheckIntervalSeconds": t.health.interval,
        "HealthCheckTimeoutSeconds": t.health.timeout,
        "HealthyThresholdCount": t.health.healthy,
        "UnhealthyThresholdCount": t.health.unhealthy,
        "LoadBalancerArns": lbs,
        "CreatedTime": t.created,
        "Tags": world.tags.render(arn),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeTargetGroupsRequest {
    names: Vec<String>,
    target_group_arns: Vec<String>,
}

fn describe_target_groups(world: &mut World, req: DescribeTargetGroupsRequest) -> SimResult<Value> {
    let mut arns = Vec::new();
    for name in &req.names {
        let arn = world
            .elb
            .target_groups
            .iter()
            .find(|(_, t)| &t.name == name)
            .map(|(arn, _)| arn.clone())
            .ok_or_else(|| {
                SimError::api(
                    "TargetGroupNotFound",
                    format!("one or more target groups not found: {}", name),
                )
            })?;
        arns.push(arn);
    }
    for arn in &req.target_group_arns {
        if !world.elb.target_groups.contains_key(arn) {
            return Err(SimError::api(
                "TargetGroupNotFound",
                format!("one or more target groups not found: {}", arn),
            ));
        }
        arns.push(arn.clone());
    }
    if req.names.is_empty() && req.target_group_arns.is_empty() {
        arns = world.elb.target_groups.keys().cloned().collect();
    }
    let groups: Vec<Value> = arns
        .iter()
        .map(|arn| render_target_group(world, arn))
        .collect();
    Ok(json!({ "TargetGroups": groups }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyTargetGroupRequest {
    target_group_arn: String,
    #[serde(flatten)]
    health: HealthInput,
}

fn modify_target_group(world: &mut World, req: ModifyTargetGroupRequest) -> SimResult<Value> {
    let group = target_group_mut(world, &req.target_group_arn)?;
    group.health = req.health.apply(&group.health)?;
    Ok(json!({ "TargetGroups": [render_target_group(world, &req.target_group_arn)] }))
}

fn target_group_mut<'w>(world: &'w mut World, arn: &str) -> SimResult<&'w mut TargetGroup> {
    world.elb.target_groups.get_mut(arn).ok_or_else(|| {
        SimError::api(
            "TargetGroupNotFound",
            format!("target group '{}' not found", arn),
        )
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetGroupArnRequest {
    target_group_arn: String,
}

fn delete_target_group(world: &mut World, req: TargetGroupArnRequest) -> SimResult<Value> {
    target_group_mut(world, &req.target_group_arn)?;
    if let Some((listener, _)) = world
        .elb
        .listeners
        .iter()
        .find(|(_, l)| l.target_group == req.target_group_arn)
    {
        return Err(SimError::api(
            "ResourceInUse",
            format!(
                "target group '{}' is used by listener '{}'",
                req.target_group_arn, listener
            ),
        ));
    }
    world.elb.target_groups.remove(&req.target_group_arn);
    world.tags.forget(&req.target_group_arn);
    Ok(json!({}))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetInput {
    id: String,
    #[serde(default)]
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TargetsRequest {
    target_group_arn: String,
    targets: Vec<TargetInput>,
}

fn register_targets(world: &mut World, req: TargetsRequest) -> SimResult<Value> {
    target_group_mut(world, &req.target_group_arn)?;
    for target in &req.targets {
        match world.ec2.instance_state(&target.id) {
            Some("terminated" | "shutting-down") | None => {
                return Err(SimError::api(
                    "InvalidTarget",
                    format!("the target '{}' is not a valid instance", target.id),
                ));
            }
            Some(_) => {}
        }
    }
    let group = target_group_mut(world, &req.target_group_arn)?;
    for target in req.targets {
        if !group.targets.iter().any(|(id, _)| *id == target.id) {
            group.targets.push((target.id, target.port));
        }
    }
    Ok(json!({}))
}

fn deregister_targets(world: &mut World, req: TargetsRequest) -> SimResult<Value> {
    let group = target_group_mut(world, &req.target_group_arn)?;
    group
        .targets
        .retain(|(id, _)| !req.targets.iter().any(|t| t.id == *id));
    Ok(json!({}))
}

fn describe_target_health(world: &mut World, req: TargetGroupArnRequest) -> SimResult<Value> {
    target_group_mut(world, &req.target_group_arn)?;
    let world: &World = world;
    let Some(group) = world.elb.target_groups.get(&req.target_group_arn) else {
        return Ok(json!({ "TargetHealthDescriptions": [] }));
    };
    let descriptions: Vec<Value> = group
        .targets
        .iter()
        .map(|(id, port)| {
            let (state, reason) = match world.ec2.instance_state(id) {
                Some("running") => ("healthy", None),
                Some("pending") => ("initial", Some("Elb.RegistrationInProgress")),
                _ => ("unhealthy", Some("Target.NotInUse")),
            };
            json!({
                "Target": { "Id": id, "Port": port.unwrap_or(group.port) },
                "TargetHealth": { "State": state, "Reason": reason },
            })
        })
        .collect();
    Ok(json!({ "TargetHealthDescriptions": descriptions }))
}

// ---------------------------------------------------------------------------
// Listeners

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ActionInput {
    #[serde(rename = "Type")]
    action_type: String,
    #[serde(default)]
    target_group_arn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateListenerRequest {
    protocol: String,
    port: u16,
    default_actions: Vec<ActionInput>,
}

fn create_listener(world: &mut World, req: CreateListenerRequest) -> SimResult<Value> {
    let protocol = check_protocol(&req.protocol, &PROTOCOLS)?;
    let port = check_port(req.port)?;
    let target_group = req
        .default_actions
        .into_iter()
        .find(|a| a.action_type == "forward")
        .and_then(|a| a.target_group_arn)
        .ok_or_else(|| validation("a forward action is required"))?;
    target_group_mut(world, &target_group)?;
    if world
        .elb
        .listeners
        .values()
        .any(|l| l.target_group == target_group && l.port == port)
    {
        return Err(SimError::api(
            "DuplicateListener",
            format!("a listener on port {} already exists", port),
        ));
    }

    let hex = world.next_hex();
    let arn = world.arn("elasticloadbalancing", &format!("listener/net/{}", hex));
    world.elb.listeners.insert(
        arn.clone(),
        Listener {
            protocol,
            port,
            target_group,
            load_balancer: None,
        },
    );
    Ok(json!({ "Listeners": [render_listener(world, &arn)] }))
}

fn render_listener(world: &World, arn: &str) -> Value {
    let Some(l) = world.elb.listeners.get(arn) else {
        return Value::Null;
    };
    json!({
        "ListenerArn": arn,
        "LoadBalancerArn": l.load_balancer,
        "Protocol": l.protocol,
        "Port": l.port,
        "DefaultActions": [{ "Type": "forward", "TargetGroupArn": l.target_group }],
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeListenersRequest {
    listener_arns: Vec<String>,
    target_group_arn: Option<String>,
    load_balancer_arn: Option<String>,
}

fn describe_listeners(world: &mut World, req: DescribeListenersRequest) -> SimResult<Value> {
    if let Some(arn) = req
        .listener_arns
        .iter()
        .find(|a| !world.elb.listeners.contains_key(*a))
    {
        return Err(SimError::api(
            "ListenerNotFound",
            format!("listener '{}' not found", arn),
        ));
    }
    let listeners: Vec<Value> = world
        .elb
        .listeners
        .iter()
        .filter(|(arn, _)| req.listener_arns.is_empty() || req.listener_arns.contains(*arn))
        .filter(|(_, l)| {
            req.target_group_arn
                .as_ref()
                .is_none_or(|tg| *tg == l.target_group)
        })
        .filter(|(_, l)| {
            req.load_balancer_arn
                .as_ref()
                .is_none_or(|lb| l.load_balancer.as_ref() == Some(lb))
        })
        .map(|(arn, _)| render_listener(world, arn))
        .collect();
    Ok(json!({ "Listeners": listeners }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModifyListenerRequest {
    listener_arn: String,
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    port: Option<u16>,
}

fn listener_not_found(arn: &str) -> SimError {
    SimError::api("ListenerNotFound", format!("listener '{}' not found", arn))
}

fn modify_listener(world: &mut World, req: ModifyListenerRequest) -> SimResult<Value> {
    let protocol = req
        .protocol
        .as_deref()
        .map(|p| check_protocol(p, &PROTOCOLS))
        .transpose()?;
    let port = req.port.map(check_port).transpose()?;
    let listener = world
        .elb
        .listeners
        .get_mut(&req.listener_arn)
        .ok_or_else(|| listener_not_found(&req.listener_arn))?;
    if let Some(protocol) = protocol {
        listener.protocol = protocol;
    }
    if let Some(port) = port {
        listener.port = port;
    }
    Ok(json!({ "Listeners": [render_listener(world, &req.listener_arn)] }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListenerArnRequest {
    listener_arn: String,
}

fn delete_listener(world: &mut World, req: ListenerArnRequest) -> SimResult<Value> {
    let listener = world
        .elb
        .listeners
        .get(&req.listener_arn)
        .ok_or_else(|| listener_not_found(&req.listener_arn))?;
    if let Some(lb) = &listener.load_balancer {
        return Err(SimError::api(
            "ResourceInUse",
            format!("listener is used by load balancer '{}'", lb),
        ));
    }
    world.elb.listeners.remove(&req.listener_arn);
    Ok(json!({}))
}

// ---------------------------------------------------------------------------
// Load balancers

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateLoadBalancerRequest {
    name: String,
    #[serde(default)]
    scheme: Option<String>,
    #[serde(default)]
    subnets: Vec<String>,
    #[serde(default)]
    listener_arns: Vec<String>,
    #[serde(default)]
    tags: Vec<TagInput>,
}

fn create_load_balancer(world: &mut World, req: CreateLoadBalancerRequest) -> SimResult<Value> {
    if req.name.is_empty() || req.name.len() > 32 {
        return Err(validation("load balancer name must be 1 to 32 characters"));
    }
    let scheme = req
        .scheme
        .unwrap_or_else(|| "internet-facing".to_string());
    if scheme != "internet-facing" && scheme != "internal" {
        return Err(validation(format!("scheme '{}' is not supported", scheme)));
    }
    if world.elb.load_balancers.values().any(|l| l.name == req.name) {
        return Err(SimError::api(
            "DuplicateLoadBalancerName",
            format!("a load balancer named '{}' already exists", req.name),
        ));
    }
    for arn in &req.listener_arns {
        let listener = world
            .elb
            .listeners
            .get(arn)
            .ok_or_else(|| listener_not_found(arn))?;
        if listener.load_balancer.is_some() {
            return Err(SimError::api(
                "ResourceInUse",
                format!("listener '{}' already has a load balancer", arn),
            ));
        }
    }

    let hex = world.next_hex();
    let arn = world.arn(
        "elasticloadbalancing",
        &format!("loadbalancer/net/{}/{}", req.name, hex),
    );
    for listener in &req.listener_arns {
        if let Some(l) = world.elb.listeners.get_mut(listener) {
            l.load_balancer = Some(arn.clone());
        }
    }
    world
        .tags
        .register(&arn, "elasticloadbalancing:loadbalancer", &req.tags);
    let subnets = if req.subnets.is_empty() {
        vec!["subnet-0sim0a".to_string()]
    } else {
        req.subnets
    };
    world.elb.load_balancers.insert(
        arn.clone(),
        LoadBalancer {
            dns: format!(
                "{}-{}.elb.{}.amazonaws.com",
                req.name, &hex[hex.len() - 8..], world.config.region
            ),
            name: req.name,
            scheme,
            subnets,
            listeners: req.listener_arns,
            created: now(),
            life: Lifecycle::moving("provisioning", Some("active"), world.config.settle_reads),
        },
    );
    Ok(json!({ "LoadBalancers": [render_load_balancer(world, &arn)] }))
}

fn render_load_balancer(world: &World, arn: &str) -> Value {
    let Some(lb) = world.elb.load_balancers.get(arn) else {
        return Value::Null;
    };
    let zones = world
        .regions
        .get(&world.config.region)
        .cloned()
        .unwrap_or_default();
    let availability_zones: Vec<Value> = lb
        .subnets
        .iter()
        .enumerate()
        .map(|(i, subnet)| {
            let address = (lb.scheme == "internet-facing")
                .then(|| json!({ "IpAddress": format!("198.51.100.{}", i + 10) }));
            json!({
                "ZoneName": zones.get(i % zones.len().max(1)),
                "SubnetId": subnet,
                "LoadBalancerAddresses": address.into_iter().collect::<Vec<_>>(),
            })
        })
        .collect();
    let vpc = lb
        .listeners
        .first()
        .and_then(|l| world.elb.listeners.get(l))
        .and_then(|l| world.elb.target_groups.get(&l.target_group))
        .map(|t| t.vpc_id.clone());
    json!({
        "LoadBalancerArn": arn,
        "LoadBalancerName": lb.name,
        "DNSName": lb.dns,
        "Scheme": lb.scheme,
        "Type": "network",
        "VpcId": vpc,
        "State": { "Code": lb.life.state },
        "CreatedTime": lb.created,
        "AvailabilityZones": availability_zones,
        "ListenerArns": lb.listeners,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeLoadBalancersRequest {
    load_balancer_arns: Vec<String>,
    names: Vec<String>,
    target_group_arn: Option<String>,
}

fn describe_load_balancers(world: &mut World, req: DescribeLoadBalancersRequest) -> SimResult<Value> {
    let not_found = |what: &str| {
        SimError::api(
            "LoadBalancerNotFound",
            format!("one or more load balancers not found: {}", what),
        )
    };
    let mut arns: Vec<String> = Vec::new();
    for arn in &req.load_balancer_arns {
        if !world.elb.load_balancers.contains_key(arn) {
            return Err(not_found(arn));
        }
        arns.push(arn.clone());
    }
    for name in &req.names {
        let arn = world
            .elb
            .load_balancers
            .iter()
            .find(|(_, l)| &l.name == name)
            .map(|(arn, _)| arn.clone())
            .ok_or_else(|| not_found(name))?;
        arns.push(arn);
    }
    if req.load_balancer_arns.is_empty() && req.names.is_empty() {
        arns = world.elb.load_balancers.keys().cloned().collect();
    }
    if let Some(tg) = &req.target_group_arn {
        let serving: Vec<&String> = world
            .elb
            .listeners
            .values()
            .filter(|l| l.target_group == *tg)
            .filter_map(|l| l.load_balancer.as_ref())
            .collect();
        arns.retain(|arn| serving.contains(&arn));
    }

    let mut load_balancers = Vec::new();
    for arn in arns {
        if let Some(lb) = world.elb.load_balancers.get_mut(&arn) {
            lb.life.observe();
        }
        load_balancers.push(render_load_balancer(world, &arn));
    }
    Ok(json!({ "LoadBalancers": load_balancers }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LoadBalancerArnRequest {
    load_balancer_arn: String,
}

fn delete_load_balancer(world: &mut World, req: LoadBalancerArnRequest) -> SimResult<Value> {
    let lb = world
        .elb
        .load_balancers
        .remove(&req.load_balancer_arn)
        .ok_or_else(|| {
            SimError::api(
                "LoadBalancerNotFound",
                format!("load balancer '{}' not found", req.load_balancer_arn),
            )
        })?;
    for listener in lb.listeners {
        if let Some(l) = world.elb.listeners.get_mut(&listener) {
            l.load_balancer = None;
        }
    }
    world.tags.forget(&req.load_balancer_arn);
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimConfig;

    fn world() -> World {
        World::new(SimConfig::default())
    }

    fn target_group(w: &mut World, name: &str) -> String {
        let out = handle(
            w,
            "CreateTargetGroup",
            json!({ "Name": name, "Protocol": "tcp", "Port": 80, "VpcId": "vpc-1" }),
        )
        .unwrap();
        out["TargetGroups"][0]["TargetGroupArn"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn listener(w: &mut World, tg: &str, port: u16) -> String {
        let out = handle(
            w,
            "CreateListener",
            json!({
                "Protocol": "TCP",
                "Port": port,
                "DefaultActions": [{ "Type": "forward", "TargetGroupArn": tg }],
            }),
        )
        .unwrap();
        out["Listeners"][0]["ListenerArn"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_duplicate_target_group_name() {
        let mut w = world();
        target_group(&mut w, "web");
        let err = handle(
            &mut w,
            "CreateTargetGroup",
            json!({ "Name": "web", "Protocol": "TCP", "Port": 80, "VpcId": "vpc-1" }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "DuplicateTargetGroupName");
    }

    #[test]
    fn test_target_group_in_use_by_listener() {
        let mut w = world();
        let tg = target_group(&mut w, "web");
        let listener = listener(&mut w, &tg, 80);

        let err = handle(&mut w, "DeleteTargetGroup", json!({ "TargetGroupArn": tg })).unwrap_err();
        assert_eq!(err.code(), "ResourceInUse");

        handle(&mut w, "DeleteListener", json!({ "ListenerArn": listener })).unwrap();
        handle(&mut w, "DeleteTargetGroup", json!({ "TargetGroupArn": tg })).unwrap();
    }

    #[test]
    fn test_load_balancer_found_through_target_group() {
        let mut w = world();
        let tg = target_group(&mut w, "web");
        let other = target_group(&mut w, "api");
        let listener = listener(&mut w, &tg, 80);
        handle(
            &mut w,
            "CreateLoadBalancer",
            json!({ "Name": "web", "Type": "network", "ListenerArns": [listener] }),
        )
        .unwrap();

        let out = handle(&mut w, "DescribeLoadBalancers", json!({ "TargetGroupArn": tg })).unwrap();
        assert_eq!(out["LoadBalancers"][0]["State"]["Code"], "provisioning");
        let out = handle(&mut w, "DescribeLoadBalancers", json!({ "TargetGroupArn": tg })).unwrap();
        assert_eq!(out["LoadBalancers"][0]["State"]["Code"], "active");

        let out =
            handle(&mut w, "DescribeLoadBalancers", json!({ "TargetGroupArn": other })).unwrap();
        assert!(out["LoadBalancers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_listener_port_zero_is_invalid() {
        let mut w = world();
        let tg = target_group(&mut w, "web");
        let err = handle(
            &mut w,
            "CreateListener",
            json!({
                "Protocol": "TCP",
                "Port": 0,
                "DefaultActions": [{ "Type": "forward", "TargetGroupArn": tg }],
            }),
        )
        .unwrap_err();
        assert_eq!(err.code(), "ValidationError");
    }
}
