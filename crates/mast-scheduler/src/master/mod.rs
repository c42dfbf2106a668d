mod actor;
mod event;
mod fitting;
mod handle;
mod handler;
mod options;
mod registry;
mod supervisor;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use handle::AppMaster;
pub use options::MasterOptions;
pub use registry::{WorkerState, WorkerSummary};
pub use supervisor::TopologyMasterTask;

pub(crate) use event::MasterEvent;

use crate::id::WorkerId;
use crate::master::registry::WorkerRegistry;
use crate::master::supervisor::MasterSupervisor;
use crate::packing::ContainerPlan;
use crate::resource_manager::ResourceManager;

/// Construction-time dependencies of the application master actor.
pub(crate) struct MasterServices {
    pub options: MasterOptions,
    pub resource_manager: Arc<dyn ResourceManager>,
    pub master_task: Arc<dyn TopologyMasterTask>,
}

/// The topology application master actor. It owns all scheduling state and
/// processes resource manager events and operator commands on one mailbox,
/// so every scheduling decision is made atomically.
pub(crate) struct MasterActor {
    options: MasterOptions,
    resource_manager: Arc<dyn ResourceManager>,
    /// What should exist: one container plan per logical worker id.
    planned: BTreeMap<WorkerId, ContainerPlan>,
    /// What does exist: workers bound to granted allocations.
    registry: WorkerRegistry,
    supervisor: MasterSupervisor,
    /// Captured from the packing plan; forwarded verbatim to the topology
    /// master and every executor task.
    component_ram_map: Option<String>,
    /// Shared with the supervisor, which reads it off the actor event loop.
    killed: Arc<AtomicBool>,
}
