use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::warn;

use crate::error::{SchedulerError, SchedulerResult};
use crate::id::WorkerId;
use crate::packing::ContainerPlan;
use crate::resource::ByteAmount;
use crate::resource_manager::{Allocation, ExecutorContext};

/// The authoritative record of one container the application master wants
/// running. The record exists before, during, and after the worker is bound
/// to a physical allocation.
#[derive(Clone)]
pub(crate) struct LogicalWorker {
    id: WorkerId,
    cores: u32,
    mem: ByteAmount,
    state: WorkerState,
    allocation: Option<Arc<dyn Allocation>>,
    context: Option<Arc<dyn ExecutorContext>>,
}

/// Lifecycle of a logical worker. A worker that is planned but not yet
/// bound has a container request outstanding and no registry entry.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WorkerState {
    /// A container request has been submitted for the worker.
    Requested,
    /// The worker is bound to a granted allocation and its bootstrap
    /// configuration has been submitted.
    Bound,
    /// The in-container bootstrap reported ready.
    ContextReady,
    /// The executor task has been submitted.
    Running,
}

impl LogicalWorker {
    pub fn new(id: WorkerId, cores: u32, mem: ByteAmount) -> Self {
        Self {
            id,
            cores,
            mem,
            state: WorkerState::Requested,
            allocation: None,
            context: None,
        }
    }

    pub fn from_plan(plan: &ContainerPlan) -> Self {
        Self::new(
            plan.id(),
            plan.resource().executor_cores(),
            plan.resource().ram,
        )
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn mem(&self) -> ByteAmount {
        self.mem
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn context(&self) -> Option<&Arc<dyn ExecutorContext>> {
        self.context.as_ref()
    }

    fn bind(&mut self, allocation: Arc<dyn Allocation>) {
        self.allocation = Some(allocation);
        self.state = WorkerState::Bound;
    }

    pub fn activate(&mut self, context: Arc<dyn ExecutorContext>) {
        self.context = Some(context);
        self.state = WorkerState::ContextReady;
    }

    pub fn run(&mut self) {
        self.state = WorkerState::Running;
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            id: self.id(),
            cores: self.cores(),
            mem: self.mem(),
            state: self.state(),
            allocation_id: self.allocation.as_ref().map(|a| a.id().to_string()),
        }
    }
}

/// A read-only view of a registered worker.
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub id: WorkerId,
    pub cores: u32,
    pub mem: ByteAmount,
    pub state: WorkerState,
    pub allocation_id: Option<String>,
}

/// Bidirectional index of bound workers, keyed by worker id and by
/// allocation id. Both keys are updated within the same call, so no
/// partially updated state is ever observable. The registry is pure
/// bookkeeping and performs no I/O.
#[derive(Default)]
pub(crate) struct WorkerRegistry {
    workers: BTreeMap<WorkerId, LogicalWorker>,
    allocations: HashMap<String, WorkerId>,
}

impl WorkerRegistry {
    /// Binds the worker to the allocation and registers it under both keys.
    pub fn assign(&mut self, mut worker: LogicalWorker, allocation: Arc<dyn Allocation>) {
        let worker_id = worker.id();
        let allocation_id = allocation.id().to_string();
        worker.bind(allocation);
        if let Some(previous) = self.workers.insert(worker_id, worker) {
            warn!("worker {worker_id} was already registered, replacing it");
            if let Some(previous_allocation) = previous.allocation {
                self.allocations.remove(previous_allocation.id());
            }
        }
        self.allocations.insert(allocation_id, worker_id);
    }

    pub fn lookup(&self, id: WorkerId) -> Option<&LogicalWorker> {
        self.workers.get(&id)
    }

    pub fn lookup_mut(&mut self, id: WorkerId) -> Option<&mut LogicalWorker> {
        self.workers.get_mut(&id)
    }

    pub fn lookup_by_allocation(&self, allocation_id: &str) -> Option<&LogicalWorker> {
        self.allocations
            .get(allocation_id)
            .and_then(|id| self.workers.get(id))
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.workers.contains_key(&id)
    }

    /// Removes the worker from both indices and returns it together with
    /// the allocation it was bound to. Calling this for an unregistered or
    /// unbound worker is a programmer error.
    pub fn detach(&mut self, id: WorkerId) -> SchedulerResult<(LogicalWorker, Arc<dyn Allocation>)> {
        let Some(mut worker) = self.workers.remove(&id) else {
            return Err(SchedulerError::InternalError(format!(
                "worker {id} is not registered"
            )));
        };
        let Some(allocation) = worker.allocation.take() else {
            return Err(SchedulerError::InternalError(format!(
                "worker {id} is not bound to an allocation"
            )));
        };
        self.allocations.remove(allocation.id());
        worker.context = None;
        worker.state = WorkerState::Requested;
        Ok((worker, allocation))
    }

    /// A stable copy of the registered workers for iteration.
    pub fn snapshot(&self) -> Vec<LogicalWorker> {
        self.workers.values().cloned().collect()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.keys().copied().collect()
    }
}
