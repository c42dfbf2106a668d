use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::info;
use mast_server::actor::{Actor, ActorAction, ActorContext};

use crate::error::SchedulerError;
use crate::master::registry::WorkerRegistry;
use crate::master::supervisor::MasterSupervisor;
use crate::master::{MasterActor, MasterEvent, MasterServices};

impl Actor for MasterActor {
    type Message = MasterEvent;
    type Options = MasterServices;
    type Error = SchedulerError;

    fn new(services: MasterServices) -> Self {
        let killed = Arc::new(AtomicBool::new(false));
        let supervisor = MasterSupervisor::new(services.master_task, Arc::clone(&killed));
        Self {
            options: services.options,
            resource_manager: services.resource_manager,
            planned: BTreeMap::new(),
            registry: WorkerRegistry::default(),
            supervisor,
            component_ram_map: None,
            killed,
        }
    }

    fn start(&mut self, _ctx: &mut ActorContext<Self>) {
        info!(
            "application master started for topology {}",
            self.options.topology_name
        );
    }

    fn receive(&mut self, ctx: &mut ActorContext<Self>, message: MasterEvent) -> ActorAction {
        match message {
            MasterEvent::ScheduleWorkers { plan, result } => {
                self.handle_schedule_workers(ctx, plan, result)
            }
            MasterEvent::LaunchTopologyMaster { result } => {
                self.handle_launch_topology_master(result)
            }
            MasterEvent::KillWorkers { containers, result } => {
                self.handle_kill_workers(ctx, containers, result)
            }
            MasterEvent::KillTopology { result } => self.handle_kill_topology(ctx, result),
            MasterEvent::RestartWorker { worker_id, result } => {
                self.handle_restart_worker(ctx, worker_id, result)
            }
            MasterEvent::RestartTopology { result } => self.handle_restart_topology(ctx, result),
            MasterEvent::ListWorkers { result } => self.handle_list_workers(result),
            MasterEvent::AllocationGranted { allocation } => {
                self.handle_allocation_granted(ctx, allocation)
            }
            MasterEvent::AllocationFailed { allocation_id } => {
                self.handle_allocation_failed(ctx, allocation_id)
            }
            MasterEvent::ContextActive { context } => self.handle_context_active(ctx, context),
            MasterEvent::TaskRunning { task_id } => self.handle_task_running(task_id),
            MasterEvent::TaskFailed { task_id } => self.handle_task_failed(ctx, task_id),
            MasterEvent::TaskCompleted { task_id } => self.handle_task_completed(ctx, task_id),
            MasterEvent::Shutdown => ActorAction::Stop,
        }
    }

    fn stop(mut self) {
        self.supervisor.kill();
        info!(
            "application master stopped for topology {}",
            self.options.topology_name
        );
    }
}
