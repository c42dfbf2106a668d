use std::sync::Arc;

use mast_server::actor::ActorHandle;
use tokio::sync::oneshot;

use crate::error::{SchedulerError, SchedulerResult};
use crate::id::WorkerId;
use crate::master::registry::WorkerSummary;
use crate::master::supervisor::TopologyMasterTask;
use crate::master::{MasterActor, MasterEvent, MasterOptions, MasterServices};
use crate::packing::{ContainerPlan, PackingPlan};
use crate::resource_manager::{Allocation, ExecutorContext, ResourceManager};

/// The topology application master.
///
/// The master owns the lifecycle of every worker container of one topology:
/// it procures containers from the resource manager, binds granted
/// allocations to logical workers, launches and supervises executor tasks,
/// and tears everything down on request. Operator commands and resource
/// manager events are funneled into one mailbox, so they are applied to the
/// scheduling state strictly one at a time.
///
/// The handle is cheap to clone; the embedding layer typically keeps one
/// clone for the scheduler command stream and one for the resource manager
/// event bindings.
#[derive(Clone)]
pub struct AppMaster {
    handle: ActorHandle<MasterActor>,
}

impl AppMaster {
    /// Starts the application master event loop.
    /// Must be called from within a tokio runtime.
    pub fn new(
        options: MasterOptions,
        resource_manager: Arc<dyn ResourceManager>,
        master_task: Arc<dyn TopologyMasterTask>,
    ) -> Self {
        let handle = ActorHandle::new(MasterServices {
            options,
            resource_manager,
            master_task,
        });
        Self { handle }
    }

    async fn call<T>(
        &self,
        event: impl FnOnce(oneshot::Sender<T>) -> MasterEvent,
    ) -> SchedulerResult<T> {
        let (tx, rx) = oneshot::channel();
        self.handle.send(event(tx)).await?;
        rx.await.map_err(|_| {
            SchedulerError::InternalError(
                "the application master stopped before replying".to_string(),
            )
        })
    }

    /// Admits the packing plan and requests one container per worker.
    /// Fails with [`SchedulerError::DuplicateAllocation`] if any worker id
    /// has already been admitted, in which case nothing is mutated.
    pub async fn schedule_workers(&self, plan: PackingPlan) -> SchedulerResult<()> {
        self.call(|result| MasterEvent::ScheduleWorkers { plan, result })
            .await?
    }

    /// Launches the supervised topology master. Must be called after
    /// [`AppMaster::schedule_workers`], which captures the component-ram
    /// map the topology master needs. A no-op once the topology is killed.
    pub async fn launch_topology_master(&self) -> SchedulerResult<()> {
        self.call(|result| MasterEvent::LaunchTopologyMaster { result })
            .await?
    }

    /// Closes the containers of the given workers and removes them from the
    /// packing plan.
    pub async fn kill_workers(&self, containers: Vec<ContainerPlan>) -> SchedulerResult<()> {
        self.call(|result| MasterEvent::KillWorkers { containers, result })
            .await
    }

    /// Kills the topology master and closes every bound container. Further
    /// resource manager events for this topology are ignored. Idempotent.
    pub async fn kill_topology(&self) -> SchedulerResult<()> {
        self.call(|result| MasterEvent::KillTopology { result }).await
    }

    /// Recycles the worker's container, or requests a fresh container if
    /// the worker is not bound. Fails with [`SchedulerError::UnknownWorker`]
    /// if the worker is neither bound nor planned.
    pub async fn restart_worker(&self, worker_id: impl Into<WorkerId>) -> SchedulerResult<()> {
        let worker_id = worker_id.into();
        self.call(|result| MasterEvent::RestartWorker { worker_id, result })
            .await?
    }

    /// Restarts every worker currently bound to a container.
    pub async fn restart_topology(&self) -> SchedulerResult<()> {
        self.call(|result| MasterEvent::RestartTopology { result })
            .await?
    }

    /// A read-only snapshot of the workers bound to containers.
    pub async fn list_workers(&self) -> SchedulerResult<Vec<WorkerSummary>> {
        self.call(|result| MasterEvent::ListWorkers { result }).await
    }

    /// Stops the event loop and waits for it to end. The supervised
    /// topology master is aborted if it is still running.
    pub async fn shutdown(self) -> SchedulerResult<()> {
        self.handle.send(MasterEvent::Shutdown).await?;
        self.handle.wait_for_stop().await;
        Ok(())
    }

    // Resource manager event bindings.

    /// A container is ready to receive a bootstrap context.
    pub async fn on_allocated(&self, allocation: Arc<dyn Allocation>) -> SchedulerResult<()> {
        self.handle
            .send(MasterEvent::AllocationGranted { allocation })
            .await
    }

    /// A previously granted container died.
    pub async fn on_allocation_failed(
        &self,
        allocation_id: impl Into<String>,
    ) -> SchedulerResult<()> {
        self.handle
            .send(MasterEvent::AllocationFailed {
                allocation_id: allocation_id.into(),
            })
            .await
    }

    /// An in-container bootstrap reported ready.
    pub async fn on_context_active(&self, context: Arc<dyn ExecutorContext>) -> SchedulerResult<()> {
        self.handle.send(MasterEvent::ContextActive { context }).await
    }

    /// A submitted executor task started.
    pub async fn on_task_running(&self, task_id: impl Into<String>) -> SchedulerResult<()> {
        self.handle
            .send(MasterEvent::TaskRunning {
                task_id: task_id.into(),
            })
            .await
    }

    /// An executor task died abnormally.
    pub async fn on_task_failed(&self, task_id: impl Into<String>) -> SchedulerResult<()> {
        self.handle
            .send(MasterEvent::TaskFailed {
                task_id: task_id.into(),
            })
            .await
    }

    /// An executor task exited normally, which is unexpected for long-lived
    /// workers.
    pub async fn on_task_completed(&self, task_id: impl Into<String>) -> SchedulerResult<()> {
        self.handle
            .send(MasterEvent::TaskCompleted {
                task_id: task_id.into(),
            })
            .await
    }
}
