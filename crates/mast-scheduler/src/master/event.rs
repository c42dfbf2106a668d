use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::SchedulerResult;
use crate::id::WorkerId;
use crate::master::registry::WorkerSummary;
use crate::packing::{ContainerPlan, PackingPlan};
use crate::resource_manager::{Allocation, ExecutorContext};

pub(crate) enum MasterEvent {
    // Operator commands, serialized against the resource manager event
    // stream by the actor mailbox.
    ScheduleWorkers {
        plan: PackingPlan,
        result: oneshot::Sender<SchedulerResult<()>>,
    },
    LaunchTopologyMaster {
        result: oneshot::Sender<SchedulerResult<()>>,
    },
    KillWorkers {
        containers: Vec<ContainerPlan>,
        result: oneshot::Sender<()>,
    },
    KillTopology {
        result: oneshot::Sender<()>,
    },
    RestartWorker {
        worker_id: WorkerId,
        result: oneshot::Sender<SchedulerResult<()>>,
    },
    RestartTopology {
        result: oneshot::Sender<SchedulerResult<()>>,
    },
    ListWorkers {
        result: oneshot::Sender<Vec<WorkerSummary>>,
    },
    // Events delivered by the resource manager client.
    AllocationGranted {
        allocation: Arc<dyn Allocation>,
    },
    AllocationFailed {
        allocation_id: String,
    },
    ContextActive {
        context: Arc<dyn ExecutorContext>,
    },
    TaskRunning {
        task_id: String,
    },
    TaskFailed {
        task_id: String,
    },
    TaskCompleted {
        task_id: String,
    },
    Shutdown,
}
