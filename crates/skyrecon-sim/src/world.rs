//! Simulated provider state

use crate::error::{SimError, SimResult};
use crate::fault::Fault;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Tunables of a [`SimCloud`](crate::SimCloud)
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub region: String,
    /// Describe reads that observe a transitional state before it settles
    pub settle_reads: u32,
    pub account: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            settle_reads: 1,
            account: "000000000000".to_string(),
        }
    }
}

/// A state that moves on after being observed a number of times
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    pub state: String,
    next: Option<Transition>,
}

#[derive(Debug, Clone)]
struct Transition {
    /// `None` means the resource disappears
    to: Option<String>,
    reads: u32,
}

impl Lifecycle {
    pub fn settled(state: &str) -> Self {
        Self {
            state: state.to_string(),
            next: None,
        }
    }

    pub fn moving(from: &str, to: Option<&str>, reads: u32) -> Self {
        let mut life = Self::settled(from);
        life.go(from, to, reads);
        life
    }

    pub fn go(&mut self, from: &str, to: Option<&str>, reads: u32) {
        self.state = from.to_string();
        self.next = Some(Transition {
            to: to.map(str::to_string),
            reads,
        });
    }

    pub fn is(&self, state: &str) -> bool {
        self.state == state
    }

    /// Count one read. Returns false once the resource is gone.
    pub fn observe(&mut self) -> bool {
        let Some(next) = self.next.as_mut() else {
            return true;
        };
        if next.reads > 0 {
            next.reads -= 1;
            return true;
        }
        match next.to.take() {
            Some(to) => {
                self.state = to;
                self.next = None;
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tags

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TagInput {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct TagSpecInput {
    #[serde(default)]
    pub tags: Vec<TagInput>,
}

/// Tags of every resource, with the tagging API type of each id
#[derive(Debug, Default)]
pub(crate) struct TagStore {
    tags: BTreeMap<String, BTreeMap<String, String>>,
    types: BTreeMap<String, String>,
}

impl TagStore {
    pub fn register(&mut self, id: &str, resource_type: &str, tags: &[TagInput]) {
        self.types.insert(id.to_string(), resource_type.to_string());
        let entry = self.tags.entry(id.to_string()).or_default();
        for tag in tags {
            entry.insert(tag.key.clone(), tag.value.clone());
        }
    }

    pub fn register_specs(&mut self, id: &str, resource_type: &str, specs: &[TagSpecInput]) {
        let tags: Vec<TagInput> = specs.iter().flat_map(|s| s.tags.clone()).collect();
        self.register(id, resource_type, &tags);
    }

    pub fn forget(&mut self, id: &str) {
        self.tags.remove(id);
        self.types.remove(id);
    }

    pub fn known(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    pub fn resource_type(&self, id: &str) -> Option<&str> {
        self.types.get(id).map(String::as_str)
    }

    pub fn ids_of_type(&self, resource_type: &str) -> Vec<String> {
        self.types
            .iter()
            .filter(|(_, t)| t.as_str() == resource_type)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn set(&mut self, id: &str, key: &str, value: &str) {
        self.tags
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
    }

    pub fn unset(&mut self, id: &str, key: &str) {
        if let Some(entry) = self.tags.get_mut(id) {
            entry.remove(key);
        }
    }

    pub fn get(&self, id: &str, key: &str) -> Option<&str> {
        self.tags.get(id)?.get(key).map(String::as_str)
    }

    pub fn render(&self, id: &str) -> Vec<Value> {
        self.tags
            .get(id)
            .map(|entry| {
                entry
                    .iter()
                    .map(|(k, v)| json!({ "Key": k, "Value": v }))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Describe filters

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FilterInput {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Whether a resource passes every filter. `tag:<key>` filters look at the
/// resource's tags, others at `attribute(name)`.
pub(crate) fn passes(
    filters: &[FilterInput],
    tags: &TagStore,
    id: &str,
    attribute: impl Fn(&str) -> Option<String>,
) -> bool {
    filters.iter().all(|f| {
        let actual = match f.name.strip_prefix("tag:") {
            Some(key) => tags.get(id, key).map(str::to_string),
            None => attribute(&f.name),
        };
        actual.is_some_and(|v| f.values.iter().any(|want| *want == v))
    })
}

pub(crate) fn parse<T: serde::de::DeserializeOwned>(request: Value) -> SimResult<T> {
    // an empty body reads as an empty object
    let request = if request.is_null() { json!({}) } else { request };
    Ok(serde_json::from_value(request)?)
}

/// Timestamp in the provider's RFC 3339 form
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// World

/// Everything the simulated provider knows
#[derive(Debug, Default)]
pub(crate) struct World {
    pub config: SimConfig,
    pub seq: u64,
    pub calls: BTreeMap<String, usize>,
    pub faults: Vec<Fault>,
    /// Resource types whose next creations settle in a failed state
    pub doomed: BTreeMap<String, u32>,
    pub tags: TagStore,
    pub regions: BTreeMap<String, Vec<String>>,
    pub ec2: crate::ec2::Ec2State,
    pub vpc: crate::vpc::VpcState,
    pub elb: crate::elb::ElbState,
    pub eks: crate::eks::EksState,
}

impl World {
    pub fn new(config: SimConfig) -> Self {
        let mut world = Self {
            config,
            ..Default::default()
        };
        for (region, zones) in [
            ("us-east-1", &["a", "b", "c"][..]),
            ("us-west-2", &["a", "b"][..]),
            ("ap-northeast-1", &["a", "c", "d"][..]),
        ] {
            world.regions.insert(
                region.to_string(),
                zones.iter().map(|z| format!("{}{}", region, z)).collect(),
            );
        }
        world
            .regions
            .entry(world.config.region.clone())
            .or_insert_with_key(|r| vec![format!("{}a", r)]);
        world.eks.seed_default_roles(&world.config.account);
        world
    }

    /// Fresh hex suffix for ids
    pub fn next_hex(&mut self) -> String {
        self.seq += 1;
        format!("{:017x}", 0x0a1b_2c3d_0000u64 + self.seq)
    }

    pub fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:aws:{}:{}:{}:{}",
            service, self.config.region, self.config.account, resource
        )
    }

    pub fn reads(&self) -> u32 {
        self.config.settle_reads
    }

    /// Consume one pending failed creation of `resource_type`
    pub fn doom(&mut self, resource_type: &str) -> bool {
        match self.doomed.get_mut(resource_type) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    /// Count a call and fire a matching fault, if any
    pub fn admit(&mut self, operation: &str, request: &Value) -> SimResult<()> {
        *self.calls.entry(operation.to_string()).or_default() += 1;
        let body = request.to_string();
        if let Some(fault) = self.faults.iter_mut().find(|f| f.fires_on(operation, &body)) {
            let err = fault.take();
            self.faults.retain(|f| !f.is_spent());
            tracing::debug!("injected {} into {}", err, operation);
            return Err(err);
        }
        Ok(())
    }

    pub fn dispatch(&mut self, operation: &str, request: Value) -> SimResult<Value> {
        self.admit(operation, &request)?;
        let (service, action) = operation
            .split_once(':')
            .ok_or_else(|| SimError::Unsupported(operation.to_string()))?;
        match service {
            "ec2" => crate::ec2::handle(self, action, request),
            "elbv2" => crate::elb::handle(self, action, request),
            "eks" | "iam" | "autoscaling" => crate::eks::handle(self, service, action, request),
            "tagging" => crate::tagging::handle(self, action, request),
            _ => Err(SimError::Unsupported(operation.to_string())),
        }
    }
}
