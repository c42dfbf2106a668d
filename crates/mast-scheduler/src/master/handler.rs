use std::sync::atomic::Ordering;
use std::sync::Arc;

use log::{error, info, warn};
use mast_server::actor::{ActorAction, ActorContext};
use tokio::sync::oneshot;

use crate::error::{SchedulerError, SchedulerResult};
use crate::id::{WorkerId, TOPOLOGY_MASTER_ID};
use crate::master::fitting::find_largest_fitting_worker;
use crate::master::registry::{LogicalWorker, WorkerSummary};
use crate::master::MasterActor;
use crate::packing::{ContainerPlan, PackingPlan};
use crate::resource_manager::{
    Allocation, ContainerRequest, ContextConfig, ExecutorContext, TaskConfig,
};

impl MasterActor {
    // Operator commands.

    pub(super) fn handle_schedule_workers(
        &mut self,
        ctx: &mut ActorContext<Self>,
        plan: PackingPlan,
        result: oneshot::Sender<SchedulerResult<()>>,
    ) -> ActorAction {
        let (containers, component_ram_map) = plan.into_parts();
        for id in containers.keys() {
            if self.planned.contains_key(id) {
                reply(result, Err(SchedulerError::DuplicateAllocation(*id)));
                return ActorAction::Continue;
            }
        }
        info!(
            "scheduling {} workers for topology {}",
            containers.len(),
            self.options.topology_name
        );
        self.component_ram_map = Some(component_ram_map);
        let mut requests = Vec::with_capacity(containers.len());
        for (id, container) in containers {
            let worker = LogicalWorker::from_plan(&container);
            requests.push((id, container_request(&worker)));
            self.planned.insert(id, container);
        }
        self.submit_container_requests(ctx, requests, Some(result));
        ActorAction::Continue
    }

    pub(super) fn handle_launch_topology_master(
        &mut self,
        result: oneshot::Sender<SchedulerResult<()>>,
    ) -> ActorAction {
        if self.killed.load(Ordering::SeqCst) {
            info!("the topology is killed, skipping the topology master launch");
            reply(result, Ok(()));
            return ActorAction::Continue;
        }
        let Some(component_ram_map) = self.component_ram_map.clone() else {
            reply(
                result,
                Err(SchedulerError::InternalError(
                    "cannot launch the topology master before workers are scheduled".to_string(),
                )),
            );
            return ActorAction::Continue;
        };
        let config = self.task_config(TOPOLOGY_MASTER_ID, component_ram_map);
        self.supervisor.launch(config);
        reply(result, Ok(()));
        ActorAction::Continue
    }

    pub(super) fn handle_kill_workers(
        &mut self,
        ctx: &mut ActorContext<Self>,
        containers: Vec<ContainerPlan>,
        result: oneshot::Sender<()>,
    ) -> ActorAction {
        for container in containers {
            let id = container.id();
            info!("finding and killing the container for worker {id}");
            if self.registry.contains(id) {
                self.close_worker_allocation(ctx, id);
            } else {
                warn!("no bound container for worker {id}");
            }
            self.planned.remove(&id);
        }
        reply(result, ());
        ActorAction::Continue
    }

    pub(super) fn handle_kill_topology(
        &mut self,
        ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<()>,
    ) -> ActorAction {
        info!("killing topology {}", self.options.topology_name);
        self.killed.store(true, Ordering::SeqCst);
        self.supervisor.kill();
        for worker in self.registry.snapshot() {
            self.close_worker_allocation(ctx, worker.id());
        }
        reply(result, ());
        ActorAction::Continue
    }

    pub(super) fn handle_restart_worker(
        &mut self,
        ctx: &mut ActorContext<Self>,
        worker_id: WorkerId,
        result: oneshot::Sender<SchedulerResult<()>>,
    ) -> ActorAction {
        match self.rebuild_worker(ctx, worker_id) {
            Ok(worker) => {
                let request = (worker.id(), container_request(&worker));
                self.submit_container_requests(ctx, vec![request], Some(result));
            }
            Err(e) => reply(result, Err(e)),
        }
        ActorAction::Continue
    }

    pub(super) fn handle_restart_topology(
        &mut self,
        ctx: &mut ActorContext<Self>,
        result: oneshot::Sender<SchedulerResult<()>>,
    ) -> ActorAction {
        let mut requests = vec![];
        for worker_id in self.registry.worker_ids() {
            match self.rebuild_worker(ctx, worker_id) {
                Ok(worker) => requests.push((worker_id, container_request(&worker))),
                Err(e) => {
                    reply(result, Err(e));
                    return ActorAction::Continue;
                }
            }
        }
        self.submit_container_requests(ctx, requests, Some(result));
        ActorAction::Continue
    }

    pub(super) fn handle_list_workers(
        &mut self,
        result: oneshot::Sender<Vec<WorkerSummary>>,
    ) -> ActorAction {
        let summaries = self
            .registry
            .snapshot()
            .iter()
            .map(LogicalWorker::summary)
            .collect();
        reply(result, summaries);
        ActorAction::Continue
    }

    // Resource manager events.

    pub(super) fn handle_allocation_granted(
        &mut self,
        ctx: &mut ActorContext<Self>,
        allocation: Arc<dyn Allocation>,
    ) -> ActorAction {
        info!(
            "new container received, id: {}, mem: {}, cores: {}",
            allocation.id(),
            allocation.granted_memory(),
            allocation.granted_cores()
        );
        if self.killed.load(Ordering::SeqCst) {
            info!(
                "the topology is killed, closing container {}",
                allocation.id()
            );
            Self::close_allocation(ctx, allocation);
            return ActorAction::Continue;
        }
        let awaiting = self.workers_awaiting_allocation();
        if awaiting.is_empty() {
            info!(
                "no workers are awaiting allocation, closing container {}",
                allocation.id()
            );
            Self::close_allocation(ctx, allocation);
            return ActorAction::Continue;
        }
        let Some(worker) = find_largest_fitting_worker(
            allocation.granted_memory(),
            allocation.granted_cores(),
            awaiting,
            true,
        ) else {
            warn!(
                "no awaiting worker fits container {}, closing it",
                allocation.id()
            );
            Self::close_allocation(ctx, allocation);
            return ActorAction::Continue;
        };
        info!(
            "worker {} (mem: {}, cores: {}) fits container {}",
            worker.id(),
            worker.mem(),
            worker.cores(),
            allocation.id()
        );
        let worker_id = worker.id();
        self.registry.assign(worker, Arc::clone(&allocation));
        let config = ContextConfig::for_worker(worker_id);
        ctx.spawn(async move {
            if let Err(e) = allocation.submit_context(config).await {
                error!("failed to submit the context for worker {worker_id}: {e}");
            }
            Ok(())
        });
        ActorAction::Continue
    }

    pub(super) fn handle_allocation_failed(
        &mut self,
        ctx: &mut ActorContext<Self>,
        allocation_id: String,
    ) -> ActorAction {
        warn!("container {allocation_id} failed");
        let Some(worker) = self.registry.lookup_by_allocation(&allocation_id) else {
            warn!("no worker is bound to failed container {allocation_id}, skipping recovery");
            return ActorAction::Continue;
        };
        let worker_id = worker.id();
        info!("requesting a new container for worker {worker_id}");
        match self.registry.detach(worker_id) {
            Ok((worker, _allocation)) => {
                // The container is already gone, so the stale handle is
                // dropped without closing it.
                let request = (worker_id, container_request(&worker));
                self.submit_container_requests(ctx, vec![request], None);
            }
            Err(e) => error!("failed to detach worker {worker_id}: {e}"),
        }
        ActorAction::Continue
    }

    pub(super) fn handle_context_active(
        &mut self,
        ctx: &mut ActorContext<Self>,
        context: Arc<dyn ExecutorContext>,
    ) -> ActorAction {
        if self.killed.load(Ordering::SeqCst) {
            warn!(
                "the topology is killed, closing new context {}",
                context.id()
            );
            Self::close_context(ctx, context);
            return ActorAction::Continue;
        }
        let Ok(worker_id) = context.id().parse::<WorkerId>() else {
            warn!("malformed context id {}, closing the context", context.id());
            Self::close_context(ctx, context);
            return ActorAction::Continue;
        };
        let Some(worker) = self.registry.lookup_mut(worker_id) else {
            warn!(
                "no registered worker for context {}, closing the context",
                context.id()
            );
            Self::close_context(ctx, context);
            return ActorAction::Continue;
        };
        worker.activate(context);
        self.submit_executor_task(ctx, worker_id);
        ActorAction::Continue
    }

    pub(super) fn handle_task_running(&mut self, task_id: String) -> ActorAction {
        info!("task {task_id} has started");
        ActorAction::Continue
    }

    pub(super) fn handle_task_failed(
        &mut self,
        ctx: &mut ActorContext<Self>,
        task_id: String,
    ) -> ActorAction {
        warn!("task {task_id} failed");
        if self.killed.load(Ordering::SeqCst) {
            info!("the topology is killed, ignoring the failure of task {task_id}");
            return ActorAction::Continue;
        }
        info!("relaunching task {task_id}");
        self.resubmit_task(ctx, &task_id);
        ActorAction::Continue
    }

    pub(super) fn handle_task_completed(
        &mut self,
        ctx: &mut ActorContext<Self>,
        task_id: String,
    ) -> ActorAction {
        info!("task {task_id} completed");
        if self.killed.load(Ordering::SeqCst) {
            info!("the topology is killed, ignoring the completion of task {task_id}");
            return ActorAction::Continue;
        }
        warn!("tasks are not expected to complete, relaunching task {task_id}");
        self.resubmit_task(ctx, &task_id);
        ActorAction::Continue
    }

    // Shared helpers.

    /// Workers present in the packing plan with no bound container. Each of
    /// them has a container request outstanding.
    fn workers_awaiting_allocation(&self) -> Vec<LogicalWorker> {
        let awaiting: Vec<LogicalWorker> = self
            .planned
            .iter()
            .filter(|(id, _)| !self.registry.contains(**id))
            .map(|(_, container)| LogicalWorker::from_plan(container))
            .collect();
        info!("workers awaiting allocation: {}", awaiting.len());
        awaiting
    }

    /// Recycles the worker's container if it is bound, or rebuilds the
    /// worker from its container plan.
    fn rebuild_worker(
        &mut self,
        ctx: &mut ActorContext<Self>,
        worker_id: WorkerId,
    ) -> SchedulerResult<LogicalWorker> {
        info!("finding and restarting the container for worker {worker_id}");
        if self.registry.contains(worker_id) {
            let (worker, allocation) = self.registry.detach(worker_id)?;
            info!("shutting down container {}", allocation.id());
            ctx.spawn(async move {
                allocation.close().await;
                Ok(())
            });
            Ok(worker)
        } else {
            warn!("no bound container for worker {worker_id}, requesting a new one");
            let Some(container) = self.planned.get(&worker_id) else {
                return Err(SchedulerError::UnknownWorker(worker_id));
            };
            Ok(LogicalWorker::from_plan(container))
        }
    }

    fn resubmit_task(&mut self, ctx: &mut ActorContext<Self>, task_id: &str) {
        let Ok(worker_id) = task_id.parse::<WorkerId>() else {
            warn!("malformed task id {task_id}");
            return;
        };
        self.submit_executor_task(ctx, worker_id);
    }

    fn submit_executor_task(&mut self, ctx: &mut ActorContext<Self>, worker_id: WorkerId) {
        let Some(worker) = self.registry.lookup(worker_id) else {
            // A stale event for a worker that is no longer registered.
            info!("no registered worker {worker_id}, skipping task submission");
            return;
        };
        let Some(context) = worker.context().cloned() else {
            warn!("worker {worker_id} has no active context");
            return;
        };
        let Some(component_ram_map) = self.component_ram_map.clone() else {
            warn!("the component ram map is not available, cannot submit a task for worker {worker_id}");
            return;
        };
        let config = self.task_config(worker_id, component_ram_map);
        if let Some(worker) = self.registry.lookup_mut(worker_id) {
            worker.run();
        }
        info!("submitting the executor task for worker {worker_id}");
        ctx.spawn(async move {
            if let Err(e) = context.submit_task(config).await {
                error!("failed to submit the executor task for worker {worker_id}: {e}");
            }
            Ok(())
        });
    }

    fn task_config(&self, container_id: WorkerId, component_ram_map: String) -> TaskConfig {
        TaskConfig {
            topology_name: self.options.topology_name.clone(),
            topology_jar: self.options.topology_jar.clone(),
            topology_package_name: self.options.topology_package_name.clone(),
            core_package_name: self.options.core_package_name.clone(),
            role: self.options.role.clone(),
            env: self.options.env.clone(),
            cluster: self.options.cluster.clone(),
            component_ram_map,
            container_id,
            verbose: self.options.verbose,
        }
    }

    /// Detaches the worker and closes its allocation.
    fn close_worker_allocation(&mut self, ctx: &mut ActorContext<Self>, worker_id: WorkerId) {
        match self.registry.detach(worker_id) {
            Ok((_, allocation)) => {
                info!(
                    "closing container {} for worker {worker_id}",
                    allocation.id()
                );
                ctx.spawn(async move {
                    allocation.close().await;
                    Ok(())
                });
            }
            Err(e) => error!("failed to detach worker {worker_id}: {e}"),
        }
    }

    /// Submits the container requests one at a time so the resource manager
    /// cannot coalesce requests of different sizes.
    fn submit_container_requests(
        &self,
        ctx: &mut ActorContext<Self>,
        requests: Vec<(WorkerId, ContainerRequest)>,
        result: Option<oneshot::Sender<SchedulerResult<()>>>,
    ) {
        let resource_manager = Arc::clone(&self.resource_manager);
        ctx.spawn(async move {
            let mut outcome = Ok(());
            for (worker_id, request) in requests {
                info!(
                    "requesting a container for worker {worker_id}, mem: {} MB, cores: {}",
                    request.memory_mb, request.cores
                );
                if let Err(e) = resource_manager.submit(request).await {
                    error!("failed to request a container for worker {worker_id}: {e}");
                    outcome = Err(SchedulerError::ContainerAllocation(format!(
                        "failed to request a container for worker {worker_id}: {e}"
                    )));
                    break;
                }
            }
            if let Some(result) = result {
                let _ = result.send(outcome);
            }
            Ok(())
        });
    }

    fn close_allocation(ctx: &mut ActorContext<Self>, allocation: Arc<dyn Allocation>) {
        ctx.spawn(async move {
            allocation.close().await;
            Ok(())
        });
    }

    fn close_context(ctx: &mut ActorContext<Self>, context: Arc<dyn ExecutorContext>) {
        ctx.spawn(async move {
            context.close().await;
            Ok(())
        });
    }
}

fn container_request(worker: &LogicalWorker) -> ContainerRequest {
    ContainerRequest {
        count: 1,
        memory_mb: worker.mem().as_megabytes(),
        cores: worker.cores(),
    }
}

fn reply<T>(result: oneshot::Sender<T>, value: T) {
    if result.send(value).is_err() {
        warn!("the caller went away before receiving the reply");
    }
}
