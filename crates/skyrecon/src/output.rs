//! Command output
//!
//! Records go to stdout as JSON so they can be piped into other tools;
//! progress and summaries go to stderr.

use colored::Colorize;
use serde::Serialize;
use skyrecon_core::{Iid, ReconError, ResourceKind};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn step(message: impl std::fmt::Display) {
    eprintln!("{} {}", "→".cyan(), message);
}

pub fn done(message: impl std::fmt::Display) {
    eprintln!("{} {}", "✓".green(), message);
}

pub fn count(kind: ResourceKind, n: usize) {
    eprintln!("{}", format!("{} {}(s)", n, kind).dimmed());
}

/// Both halves of an identifier, for messages
pub fn iid(iid: &Iid) -> String {
    match (iid.name.is_empty(), iid.provider_id.is_empty()) {
        (false, false) if iid.name != iid.provider_id => {
            format!("{} ({})", iid.name.bold(), iid.provider_id.dimmed())
        }
        (false, _) => iid.name.bold().to_string(),
        _ => iid.provider_id.bold().to_string(),
    }
}

pub fn deleted(kind: ResourceKind, target: &Iid, gone: bool) {
    if gone {
        done(format!("{} {} deleted", kind, iid(target)));
    } else {
        eprintln!("{} {} {} still exists", "⚠".yellow(), kind, iid(target));
    }
}

/// After a failed composite create, list what was left in the cloud
pub fn report_leftovers(err: &anyhow::Error) {
    let Some(ReconError::PartialFailure {
        kind,
        composite_id,
        created,
        rolled_back,
        ..
    }) = err.downcast_ref::<ReconError>()
    else {
        return;
    };

    if *rolled_back {
        eprintln!("{} {} creation was rolled back", "⚠".yellow(), kind);
        return;
    }
    if created.is_empty() {
        return;
    }

    eprintln!(
        "{} {} creation left {} sub-resource(s) behind:",
        "⚠".yellow(),
        kind,
        created.len()
    );
    for resource in created {
        eprintln!(
            "  • {} {} {}",
            resource.kind.to_string().cyan(),
            resource.provider_id,
            format!("(step {})", resource.step).dimmed()
        );
    }
    if let Some(id) = composite_id {
        eprintln!(
            "  delete with: skyrecon {} delete id:{}",
            command_for(*kind),
            id
        );
    }
}

fn command_for(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Cluster | ResourceKind::NodeGroup => "cluster",
        ResourceKind::Vpc | ResourceKind::Subnet | ResourceKind::InternetGateway => "vpc",
        _ => "lb",
    }
}
