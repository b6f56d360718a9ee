//! Parsers for resource arguments given on the command line

use skyrecon_core::model::{KeyValue, NodeGroupRequest, RuleDirection, SecurityRule, SubnetRequest};
use skyrecon_core::{Iid, ResourceKind};

/// Prefixes of provider-assigned ids
const ID_PREFIXES: [&str; 10] = [
    "vol-", "i-", "ami-", "key-", "sg-", "eipalloc-", "subnet-", "vpc-", "igw-", "snap-",
];

/// Turn a resource argument into an [`Iid`].
///
/// `id:<value>` and anything shaped like a provider id (an ARN or a
/// `<prefix>-<hex>` id) address the resource by id; everything else is a
/// logical name.
pub fn iid(value: &str) -> Iid {
    if let Some(id) = value.strip_prefix("id:") {
        return Iid::by_id(id);
    }
    if looks_like_id(value) {
        Iid::by_id(value)
    } else {
        Iid::by_name(value)
    }
}

fn looks_like_id(value: &str) -> bool {
    if value.starts_with("arn:") {
        return true;
    }
    ID_PREFIXES.iter().any(|prefix| {
        value
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.len() >= 8 && rest.chars().all(|c| c.is_ascii_hexdigit()))
    })
}

pub fn iids(values: &[String]) -> Vec<Iid> {
    values.iter().map(|v| iid(v)).collect()
}

/// `key=value`
pub fn tag(value: &str) -> Result<KeyValue, String> {
    match value.split_once('=') {
        Some((key, val)) if !key.trim().is_empty() => Ok(KeyValue::new(key.trim(), val)),
        _ => Err(format!("expected KEY=VALUE, got '{}'", value)),
    }
}

pub fn kind(value: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(value).ok_or_else(|| {
        format!(
            "unknown resource kind '{}', expected one of: vm, disk, image, key-pair, \
             security-group, public-ip, load-balancer, cluster, node-group, vpc, subnet, \
             internet-gateway",
            value
        )
    })
}

/// `PROTOCOL:PORT`. The port is kept as text so the handler validates it.
pub fn endpoint(value: &str) -> Result<(String, String), String> {
    match value.split_once(':') {
        Some((protocol, port)) if !protocol.is_empty() && !port.is_empty() => {
            Ok((protocol.to_string(), port.to_string()))
        }
        _ => Err(format!("expected PROTOCOL:PORT, got '{}'", value)),
    }
}

/// `DIRECTION:PROTOCOL:PORTS:CIDR`, e.g. `inbound:tcp:22:10.0.0.0/8` or
/// `outbound:all:-:0.0.0.0/0`. PORTS is a single port or `FROM-TO`.
pub fn rule(value: &str) -> Result<SecurityRule, String> {
    let parts: Vec<&str> = value.splitn(4, ':').collect();
    let [direction, protocol, ports, cidr] = parts.as_slice() else {
        return Err(format!(
            "expected DIRECTION:PROTOCOL:PORTS:CIDR, got '{}'",
            value
        ));
    };

    let direction = match direction.to_lowercase().as_str() {
        "inbound" | "in" | "ingress" => RuleDirection::Inbound,
        "outbound" | "out" | "egress" => RuleDirection::Outbound,
        other => return Err(format!("unknown rule direction '{}'", other)),
    };

    let (from_port, to_port) = match *ports {
        "-" | "" => (-1, -1),
        ports => {
            let (from, to) = ports.split_once('-').unwrap_or((ports, ports));
            let parse = |p: &str| {
                p.trim()
                    .parse::<i32>()
                    .map_err(|_| format!("invalid port '{}' in rule '{}'", p, value))
            };
            (parse(from)?, parse(to)?)
        }
    };

    Ok(SecurityRule {
        direction,
        protocol: protocol.to_string(),
        from_port,
        to_port,
        cidr: cidr.to_string(),
    })
}

/// `name=workers,spec=m5.large,desired=2,min=1,max=3[,image=..][,disk=40][,key=..]`
pub fn node_group(value: &str) -> Result<NodeGroupRequest, String> {
    let mut req = NodeGroupRequest {
        desired_size: 1,
        min_size: 1,
        max_size: 1,
        ..Default::default()
    };
    let mut sizes_given = (false, false);

    for field in value.split(',').filter(|f| !f.trim().is_empty()) {
        let (key, val) = field
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE in node group, got '{}'", field))?;
        let number = || {
            val.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid number '{}' for node group {}", val, key))
        };
        match key.trim() {
            "name" => req.name = val.trim().to_string(),
            "spec" => req.vm_spec = val.trim().to_string(),
            "image" => req.image = val.trim().to_string(),
            "disk" => req.root_disk_size = Some(number()?),
            "key" => req.key_pair = Some(iid(val.trim())),
            "desired" => req.desired_size = number()?,
            "min" => {
                req.min_size = number()?;
                sizes_given.0 = true;
            }
            "max" => {
                req.max_size = number()?;
                sizes_given.1 = true;
            }
            other => return Err(format!("unknown node group field '{}'", other)),
        }
    }

    if req.name.is_empty() {
        return Err(format!("node group needs a name: '{}'", value));
    }
    // bounds left out follow the desired size
    if !sizes_given.0 {
        req.min_size = req.min_size.min(req.desired_size);
    }
    if !sizes_given.1 {
        req.max_size = req.max_size.max(req.desired_size);
    }
    Ok(req)
}

/// `name=web,cidr=10.0.1.0/24[,zone=us-east-1b]`
pub fn subnet(value: &str) -> Result<SubnetRequest, String> {
    let mut req = SubnetRequest::default();
    for field in value.split(',').filter(|f| !f.trim().is_empty()) {
        let (key, val) = field
            .split_once('=')
            .ok_or_else(|| format!("expected KEY=VALUE in subnet, got '{}'", field))?;
        let val = val.trim().to_string();
        match key.trim() {
            "name" => req.name = val,
            "cidr" => req.ipv4_cidr = val,
            "zone" => req.zone = Some(val),
            other => return Err(format!("unknown subnet field '{}'", other)),
        }
    }
    if req.name.is_empty() || req.ipv4_cidr.is_empty() {
        return Err(format!("subnet needs a name and a cidr: '{}'", value));
    }
    Ok(req)
}
