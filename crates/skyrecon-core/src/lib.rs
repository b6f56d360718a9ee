//! skyrecon core
//!
//! Provider-neutral reconciliation layer for cloud resources: a canonical
//! model, dual identity, status normalization, completion waiting, and
//! composite workflows, all driven through an abstract provider gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 skyrecon CLI                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │ trait CloudDriver
//! ┌─────────────────▼───────────────────────────────┐
//! │                skyrecon-core                     │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │ Iid / model│ │   Waiter   │ │ WorkflowRun │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Invoker ── CallLogger / ErrorClassifier │   │
//! │  └──────────────────┬───────────────────────┘   │
//! └─────────────────────┼───────────────────────────┘
//!                       │ trait ProviderGateway
//!          ┌────────────┴────────────┐
//! ┌────────▼────────┐       ┌────────▼────────┐
//! │ CommandGateway  │       │  skyrecon-sim   │
//! │ (driver process)│       │  (in-memory)    │
//! └─────────────────┘       └─────────────────┘
//! ```

pub mod call_log;
pub mod command;
pub mod error;
pub mod fanout;
pub mod gateway;
pub mod handler;
pub mod iid;
pub mod invoker;
pub mod kind;
pub mod model;
pub mod status;
pub mod waiter;
pub mod workflow;

// Re-exports
pub use call_log::{CallLogger, CallRecord, MemoryCallLogger, NoopCallLogger, TracingCallLogger};
pub use command::CommandGateway;
pub use error::{CreatedResource, ReconError, Result};
pub use fanout::fan_out;
pub use gateway::{ErrorClass, ErrorClassifier, ProviderError, ProviderGateway};
pub use handler::{
    CloudDriver, ClusterHandler, DiskHandler, ImageHandler, KeyPairHandler, LoadBalancerHandler,
    PublicIpHandler, RegionZoneHandler, SecurityGroupHandler, TagHandler, VmHandler, VpcHandler,
};
pub use iid::{Iid, NAME_TAG, recover_name, resolve};
pub use invoker::Invoker;
pub use kind::ResourceKind;
pub use status::{
    CanonicalStatus, ClusterStatus, DiskStatus, ImageStatus, LoadBalancerStatus, NodeGroupStatus,
    PublicIpStatus, StatusTable, VmStatus,
};
pub use waiter::{WaitConfig, WaitGoal, WaitPolicy, Waiter};
pub use workflow::{CompositePolicy, WorkflowRun};
