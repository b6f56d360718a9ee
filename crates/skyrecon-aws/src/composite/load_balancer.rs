//! Network load balancer composite
//!
//! Built in three steps: target group, listener, frontend. The target group
//! is created first and its ARN is the composite's provider id; the
//! listener and frontend are found again by filtering on that ARN.

use crate::context::AwsContext;
use crate::convert::{
    listener_to_info, load_balancer_status, load_balancer_to_frontend, member_state, named_tags,
    target_group_to_info, to_key_values,
};
use crate::handlers::{absent_on_not_found, require_name, resolve_vm};
use crate::ops;
use crate::shapes::*;
use crate::status::LOAD_BALANCER_STATES;
use async_trait::async_trait;
use serde_json::json;
use skyrecon_core::model::*;
use skyrecon_core::{
    Iid, LoadBalancerHandler, LoadBalancerStatus, ReconError, ResourceKind, Result, WaitGoal,
    WorkflowRun, fan_out,
};
use std::sync::Arc;

const KIND: ResourceKind = ResourceKind::LoadBalancer;

const STEP_TARGET_GROUP: &str = "target-group";
const STEP_MEMBERS: &str = "register-members";
const STEP_LISTENER: &str = "listener";
const STEP_FRONTEND: &str = "frontend";

const PROTOCOLS: [&str; 4] = ["TCP", "UDP", "TLS", "TCP_UDP"];
const HEALTH_PROTOCOLS: [&str; 3] = ["TCP", "HTTP", "HTTPS"];

const DEFAULT_HEALTH_INTERVAL: u32 = 30;
const DEFAULT_HEALTH_TIMEOUT: u32 = 10;
const DEFAULT_HEALTH_THRESHOLD: u32 = 3;

// ---------------------------------------------------------------------------
// validation

fn parse_port(what: &str, port: &str) -> Result<u16> {
    match port.trim().parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(ReconError::validation(format!(
            "invalid {} port '{}'",
            what, port
        ))),
    }
}

fn parse_protocol(what: &str, protocol: &str, allowed: &[&str]) -> Result<String> {
    let upper = protocol.trim().to_uppercase();
    if allowed.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(ReconError::validation(format!(
            "unsupported {} protocol '{}', expected one of {}",
            what,
            protocol,
            allowed.join(", ")
        )))
    }
}

/// Health check settings with defaults filled in
fn health_check(req: Option<&HealthCheckerRequest>, current: Option<&HealthCheckerInfo>) -> Result<HealthCheckerInfo> {
    let empty = HealthCheckerRequest::default();
    let req = req.unwrap_or(&empty);

    let protocol = match (&req.protocol, current) {
        (Some(p), _) => parse_protocol("health check", p, &HEALTH_PROTOCOLS)?,
        (None, Some(c)) if !c.protocol.is_empty() => c.protocol.clone(),
        _ => "TCP".to_string(),
    };
    let port = match (&req.port, current) {
        (Some(p), _) if p.eq_ignore_ascii_case("traffic-port") => "traffic-port".to_string(),
        (Some(p), _) => parse_port("health check", p)?.to_string(),
        (None, Some(c)) => c.port.clone(),
        (None, None) => "traffic-port".to_string(),
    };

    let interval = req
        .interval_secs
        .or(current.map(|c| c.interval_secs))
        .unwrap_or(DEFAULT_HEALTH_INTERVAL);
    if protocol == "TCP" && interval != 10 && interval != 30 {
        return Err(ReconError::validation(format!(
            "TCP health check interval must be 10 or 30 seconds, got {}",
            interval
        )));
    }
    if protocol == "TCP" && req.timeout_secs.is_some() {
        return Err(ReconError::validation(
            "TCP health checks do not support a custom timeout",
        ));
    }
    let timeout = req
        .timeout_secs
        .or(current.map(|c| c.timeout_secs))
        .unwrap_or(DEFAULT_HEALTH_TIMEOUT);

    let threshold = req
        .threshold
        .or(current.map(|c| c.threshold))
        .unwrap_or(DEFAULT_HEALTH_THRESHOLD);
    if !(2..=10).contains(&threshold) {
        return Err(ReconError::validation(format!(
            "health check threshold must be between 2 and 10, got {}",
            threshold
        )));
    }

    Ok(HealthCheckerInfo {
        protocol,
        port,
        interval_secs: interval,
        timeout_secs: timeout,
        threshold,
    })
}

// ---------------------------------------------------------------------------
// lookups

async fn lookup(ctx: &AwsContext, name: String) -> Result<Vec<String>> {
    let out: Option<DescribeTargetGroupsOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                KIND,
                &name,
                ops::DESCRIBE_TARGET_GROUPS,
                &json!({ "Names": [name] }),
            )
            .await,
    )?;
    Ok(out
        .map(|o| o.target_groups)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| g.target_group_arn)
        .collect())
}

/// Target group ARN of a load balancer
pub(crate) async fn resolve(ctx: &AwsContext, iid: &Iid) -> Result<String> {
    skyrecon_core::resolve(KIND, iid, |name| lookup(ctx, name)).await
}

async fn target_group(ctx: &AwsContext, arn: &str) -> Result<TargetGroup> {
    let out: DescribeTargetGroupsOutput = ctx
        .invoker
        .call(
            ResourceKind::TargetGroup,
            arn,
            ops::DESCRIBE_TARGET_GROUPS,
            &json!({ "TargetGroupArns": [arn] }),
        )
        .await?;
    out.target_groups
        .into_iter()
        .next()
        .ok_or_else(|| ReconError::not_found(KIND, arn))
}

async fn listeners(ctx: &AwsContext, tg_arn: &str) -> Result<Vec<Listener>> {
    let out: Option<DescribeListenersOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                ResourceKind::Listener,
                tg_arn,
                ops::DESCRIBE_LISTENERS,
                &json!({ "TargetGroupArn": tg_arn }),
            )
            .await,
    )?;
    Ok(out.map(|o| o.listeners).unwrap_or_default())
}

async fn frontend(ctx: &AwsContext, tg_arn: &str) -> Result<Option<LoadBalancer>> {
    let out: Option<DescribeLoadBalancersOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                KIND,
                tg_arn,
                ops::DESCRIBE_LOAD_BALANCERS,
                &json!({ "TargetGroupArn": tg_arn }),
            )
            .await,
    )?;
    Ok(out.and_then(|o| o.load_balancers.into_iter().next()))
}

async fn frontend_status(ctx: &AwsContext, lb_arn: &str) -> Result<Option<LoadBalancerStatus>> {
    let out: Option<DescribeLoadBalancersOutput> = absent_on_not_found(
        ctx.invoker
            .call(
                KIND,
                lb_arn,
                ops::DESCRIBE_LOAD_BALANCERS,
                &json!({ "LoadBalancerArns": [lb_arn] }),
            )
            .await,
    )?;
    Ok(out.and_then(|o| o.load_balancers.into_iter().next()).map(|lb| {
        LOAD_BALANCER_STATES.normalize(lb.state.as_ref().and_then(|s| s.code.as_deref()))
    }))
}

async fn target_health(ctx: &AwsContext, tg_arn: &str) -> Result<Vec<TargetHealthDescription>> {
    let out: DescribeTargetHealthOutput = ctx
        .invoker
        .call(
            ResourceKind::TargetGroup,
            tg_arn,
            ops::DESCRIBE_TARGET_HEALTH,
            &json!({ "TargetGroupArn": tg_arn }),
        )
        .await?;
    Ok(out.target_health_descriptions)
}

/// Re-derive the whole composite from its target group
async fn describe(ctx: &AwsContext, tg_arn: &str) -> Result<LoadBalancerInfo> {
    let group = target_group(ctx, tg_arn).await?;
    let listener = listeners(ctx, tg_arn).await?.into_iter().next();
    let lb = frontend(ctx, tg_arn).await?;
    let members = target_health(ctx, tg_arn)
        .await?
        .into_iter()
        .filter_map(|d| d.target.map(|t| Iid::by_id(t.id)))
        .collect();

    let tags = to_key_values(&group.tags);
    Ok(LoadBalancerInfo {
        iid: Iid::new(
            skyrecon_core::recover_name(group.target_group_name.as_deref(), &tags, tg_arn),
            tg_arn,
        ),
        vpc_id: group.vpc_id.clone().unwrap_or_default(),
        status: load_balancer_status(lb.as_ref()),
        target_group: target_group_to_info(&group, members)?,
        listener: listener.as_ref().map(listener_to_info).transpose()?,
        frontend: lb.as_ref().map(load_balancer_to_frontend).transpose()?,
        created_at: lb
            .as_ref()
            .and_then(|l| l.created_time)
            .or(group.created_time),
        tags,
    })
}

// ---------------------------------------------------------------------------
// sub-resource lifecycle

async fn create_target_group(ctx: &AwsContext, req: &LoadBalancerRequest) -> Result<String> {
    let protocol = parse_protocol("target group", &req.target_group.protocol, &PROTOCOLS)?;
    let port = parse_port("target group", &req.target_group.port)?;
    let health = health_check(req.health_checker.as_ref(), None)?;

    let out: DescribeTargetGroupsOutput = ctx
        .invoker
        .call(
            ResourceKind::TargetGroup,
            &req.name,
            ops::CREATE_TARGET_GROUP,
            &CreateTargetGroupInput {
                name: req.name.clone(),
                protocol,
                port,
                vpc_id: req.vpc_id.clone(),
                target_type: "instance".to_string(),
                health_check_protocol: health.protocol,
                health_check_port: health.port,
                health_check_interval_seconds: health.interval_secs,
                health_check_timeout_seconds: health.timeout_secs,
                healthy_threshold_count: health.threshold,
                unhealthy_threshold_count: health.threshold,
                tags: named_tags(&req.name, &req.tags),
            },
        )
        .await?;
    out.target_groups
        .into_iter()
        .next()
        .and_then(|g| g.target_group_arn)
        .ok_or_else(|| ReconError::malformed("CreateTargetGroup returned no TargetGroupArn"))
}

async fn register(ctx: &AwsContext, tg_arn: &str, members: &[Iid]) -> Result<()> {
    if members.is_empty() {
        return Ok(());
    }
    let port = target_group(ctx, tg_arn).await?.port;
    let mut targets = Vec::with_capacity(members.len());
    for vm in members {
        targets.push(TargetDescription {
            id: resolve_vm(ctx, vm).await?,
            port,
        });
    }
    ctx.invoker
        .call_unit(
            ResourceKind::TargetGroup,
            tg_arn,
            ops::REGISTER_TARGETS,
            &TargetsInput {
                target_group_arn: tg_arn.to_string(),
                targets,
            },
        )
        .await
}

async fn create_listener(ctx: &AwsContext, req: &LoadBalancerRequest, tg_arn: &str) -> Result<String> {
    let protocol = parse_protocol("listener", &req.listener.protocol, &PROTOCOLS)?;
    let port = parse_port("listener", &req.listener.port)?;

    let out: DescribeListenersOutput = ctx
        .invoker
        .call(
            ResourceKind::Listener,
            &req.name,
            ops::CREATE_LISTENER,
            &CreateListenerInput {
                protocol,
                port,
                default_actions: vec![Action::forward(tg_arn)],
            },
        )
        .await?;
    out.listeners
        .into_iter()
        .next()
        .and_then(|l| l.listener_arn)
        .ok_or_else(|| ReconError::malformed("CreateListener returned no ListenerArn"))
}

/// `internet-facing` when unset
fn scheme_of(req: &LoadBalancerRequest) -> Result<String> {
    let scheme = req
        .scheme
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("internet-facing");
    if scheme != "internet-facing" && scheme != "internal" {
        return Err(ReconError::validation(format!(
            "invalid load balancer scheme '{}'",
            scheme
        )));
    }
    Ok(scheme.to_string())
}

async fn create_frontend(
    ctx: &AwsContext,
    req: &LoadBalancerRequest,
    scheme: String,
    listener_arn: &str,
) -> Result<String> {
    let out: DescribeLoadBalancersOutput = ctx
        .invoker
        .call(
            KIND,
            &req.name,
            ops::CREATE_LOAD_BALANCER,
            &CreateLoadBalancerInput {
                name: req.name.clone(),
                lb_type: "network".to_string(),
                scheme,
                subnets: req.subnet_ids.clone(),
                listener_arns: vec![listener_arn.to_string()],
                tags: named_tags(&req.name, &req.tags),
            },
        )
        .await?;
    out.load_balancers
        .into_iter()
        .next()
        .and_then(|lb| lb.load_balancer_arn)
        .ok_or_else(|| ReconError::malformed("CreateLoadBalancer returned no LoadBalancerArn"))
}

async fn wait_frontend(ctx: &AwsContext, lb_arn: &str, goal: WaitGoal<'_, LoadBalancerStatus>) -> Result<()> {
    ctx.waiter(KIND)
        .await_status(KIND, lb_arn, goal, &[LoadBalancerStatus::Error], || {
            frontend_status(ctx, lb_arn)
        })
        .await
        .map(|_| ())
}

async fn delete_frontend(ctx: &AwsContext, lb_arn: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                KIND,
                &lb_arn,
                ops::DELETE_LOAD_BALANCER,
                &json!({ "LoadBalancerArn": lb_arn }),
            )
            .await,
    )?;
    ctx.waiter(KIND)
        .await_status(KIND, &lb_arn, WaitGoal::Gone(&[]), &[], || {
            frontend_status(ctx, &lb_arn)
        })
        .await?;
    Ok(())
}

async fn delete_listener(ctx: &AwsContext, listener_arn: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::Listener,
                &listener_arn,
                ops::DELETE_LISTENER,
                &json!({ "ListenerArn": listener_arn }),
            )
            .await,
    )?;
    Ok(())
}

async fn delete_target_group(ctx: &AwsContext, tg_arn: String) -> Result<()> {
    absent_on_not_found(
        ctx.invoker
            .call_unit(
                ResourceKind::TargetGroup,
                &tg_arn,
                ops::DELETE_TARGET_GROUP,
                &json!({ "TargetGroupArn": tg_arn }),
            )
            .await,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------

pub struct AwsLoadBalancerHandler {
    ctx: Arc<AwsContext>,
}

impl AwsLoadBalancerHandler {
    pub fn new(ctx: Arc<AwsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl LoadBalancerHandler for AwsLoadBalancerHandler {
    async fn create(&self, req: LoadBalancerRequest) -> Result<LoadBalancerInfo> {
        let ctx: &AwsContext = &self.ctx;
        require_name(KIND, &req.name)?;
        if req.vpc_id.trim().is_empty() {
            return Err(ReconError::validation("load balancer vpc id is required"));
        }
        let scheme = scheme_of(&req)?;
        if !lookup(ctx, req.name.clone()).await?.is_empty() {
            return Err(ReconError::AlreadyExists {
                kind: KIND,
                name: req.name,
            });
        }

        let mut run = WorkflowRun::new(KIND, &req.name, ctx.composite_policy());

        let tg_arn = run
            .step(STEP_TARGET_GROUP, create_target_group(ctx, &req))
            .await?;
        run.record_with_undo(
            ResourceKind::TargetGroup,
            &tg_arn,
            STEP_TARGET_GROUP,
            Box::pin(delete_target_group(ctx, tg_arn.clone())),
        );

        run.step(STEP_MEMBERS, register(ctx, &tg_arn, &req.target_group.members))
            .await?;

        let listener_arn = run
            .step(STEP_LISTENER, create_listener(ctx, &req, &tg_arn))
            .await?;
        run.record_with_undo(
            ResourceKind::Listener,
            &listener_arn,
            STEP_LISTENER,
            Box::pin(delete_listener(ctx, listener_arn.clone())),
        );

        let lb_arn = run
            .step(STEP_FRONTEND, create_frontend(ctx, &req, scheme, &listener_arn))
            .await?;
        run.record_with_undo(
            KIND,
            &lb_arn,
            STEP_FRONTEND,
            Box::pin(delete_frontend(ctx, lb_arn.clone())),
        );
        run.step(
            STEP_FRONTEND,
            wait_frontend(ctx, &lb_arn, WaitGoal::Reach(&[LoadBalancerStatus::Active])),
        )
        .await?;

        tracing::info!("load balancer {} is active ({})", req.name, tg_arn);
        run.step(STEP_FRONTEND, describe(ctx, &tg_arn)).await
    }

    async fn list(&self) -> Result<Vec<LoadBalancerInfo>> {
        let ctx: &AwsContext = &self.ctx;
        let out: DescribeTargetGroupsOutput = ctx
            .invoker
            .call(KIND, "*", ops::DESCRIBE_TARGET_GROUPS, &json!({}))
            .await?;
        let arns: Vec<String> = out
            .target_groups
            .into_iter()
            .filter_map(|g| g.target_group_arn)
            .collect();

        Ok(fan_out(KIND, arns, ctx.concurrency(), |arn| async move {
            describe(ctx, &arn).await
        })
        .await)
    }

    async fn get(&self, iid: &Iid) -> Result<LoadBalancerInfo> {
        let arn = resolve(&self.ctx, iid).await?;
        describe(&self.ctx, &arn).await
    }

    async fn delete(&self, iid: &Iid) -> Result<bool> {
        let ctx: &AwsContext = &self.ctx;
        let Some(tg_arn) = absent_on_not_found(resolve(ctx, iid).await)? else {
            return Ok(true);
        };
        if absent_on_not_found(target_group(ctx, &tg_arn).await)?.is_none() {
            return Ok(true);
        }

        if let Some(lb_arn) = frontend(ctx, &tg_arn)
            .await?
            .and_then(|lb| lb.load_balancer_arn)
        {
            delete_frontend(ctx, lb_arn).await?;
        }
        for listener in listeners(ctx, &tg_arn).await? {
            if let Some(arn) = listener.listener_arn {
                delete_listener(ctx, arn).await?;
            }
        }
        delete_target_group(ctx, tg_arn.clone()).await?;

        tracing::info!("deleted load balancer {}", tg_arn);
        Ok(true)
    }

    async fn add_members(&self, iid: &Iid, members: &[Iid]) -> Result<LoadBalancerInfo> {
        let tg_arn = resolve(&self.ctx, iid).await?;
        register(&self.ctx, &tg_arn, members).await?;
        describe(&self.ctx, &tg_arn).await
    }

    async fn remove_members(&self, iid: &Iid, members: &[Iid]) -> Result<bool> {
        let tg_arn = resolve(&self.ctx, iid).await?;
        let mut targets = Vec::with_capacity(members.len());
        for vm in members {
            targets.push(TargetDescription {
                id: resolve_vm(&self.ctx, vm).await?,
                port: None,
            });
        }
        if targets.is_empty() {
            return Ok(true);
        }

        self.ctx
            .invoker
            .call_unit(
                ResourceKind::TargetGroup,
                &tg_arn,
                ops::DEREGISTER_TARGETS,
                &TargetsInput {
                    target_group_arn: tg_arn.clone(),
                    targets,
                },
            )
            .await?;
        Ok(true)
    }

    async fn member_health(&self, iid: &Iid) -> Result<Vec<MemberHealth>> {
        let tg_arn = resolve(&self.ctx, iid).await?;
        Ok(target_health(&self.ctx, &tg_arn)
            .await?
            .into_iter()
            .filter_map(|d| {
                let target = d.target?;
                Some(MemberHealth {
                    vm: Iid::by_id(target.id),
                    state: member_state(d.target_health.as_ref().and_then(|h| h.state.as_deref())),
                })
            })
            .collect())
    }

    async fn change_listener(&self, iid: &Iid, listener: ListenerRequest) -> Result<ListenerInfo> {
        let ctx: &AwsContext = &self.ctx;
        let tg_arn = resolve(ctx, iid).await?;
        let protocol = parse_protocol("listener", &listener.protocol, &PROTOCOLS)?;
        let port = parse_port("listener", &listener.port)?;

        let listener_arn = listeners(ctx, &tg_arn)
            .await?
            .into_iter()
            .find_map(|l| l.listener_arn)
            .ok_or_else(|| ReconError::not_found(ResourceKind::Listener, &tg_arn))?;

        let out: DescribeListenersOutput = ctx
            .invoker
            .call(
                ResourceKind::Listener,
                &listener_arn,
                ops::MODIFY_LISTENER,
                &ModifyListenerInput {
                    listener_arn: listener_arn.clone(),
                    protocol,
                    port,
                },
            )
            .await?;
        let changed = out
            .listeners
            .first()
            .ok_or_else(|| ReconError::malformed("ModifyListener returned no listener"))?;
        listener_to_info(changed)
    }

    async fn change_health_checker(
        &self,
        iid: &Iid,
        health_checker: HealthCheckerRequest,
    ) -> Result<HealthCheckerInfo> {
        let ctx: &AwsContext = &self.ctx;
        let tg_arn = resolve(ctx, iid).await?;
        let group = target_group(ctx, &tg_arn).await?;
        let current = target_group_to_info(&group, Vec::new())?.health_checker;
        let health = health_check(Some(&health_checker), Some(&current))?;

        let out: DescribeTargetGroupsOutput = ctx
            .invoker
            .call(
                ResourceKind::TargetGroup,
                &tg_arn,
                ops::MODIFY_TARGET_GROUP,
                &ModifyTargetGroupInput {
                    target_group_arn: tg_arn.clone(),
                    health_check_protocol: health.protocol,
                    health_check_port: health.port,
                    health_check_interval_seconds: health.interval_secs,
                    health_check_timeout_seconds: health.timeout_secs,
                    healthy_threshold_count: health.threshold,
                    unhealthy_threshold_count: health.threshold,
                },
            )
            .await?;
        let changed = out
            .target_groups
            .first()
            .ok_or_else(|| ReconError::malformed("ModifyTargetGroup returned no target group"))?;
        Ok(target_group_to_info(changed, Vec::new())?.health_checker)
    }
}
