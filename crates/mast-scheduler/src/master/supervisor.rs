use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use tokio::task::JoinHandle;

use crate::error::SchedulerResult;
use crate::resource_manager::TaskConfig;

/// The number of times the topology master is launched before it is left
/// down. The topology degrades without its master but does not crash.
const MASTER_LAUNCH_ATTEMPTS: u32 = 3;

/// Runs the topology master executor to completion. The topology master
/// shares the application master's own container and never goes through
/// the resource manager.
#[async_trait]
pub trait TopologyMasterTask: Send + Sync + 'static {
    async fn run(&self, config: TaskConfig) -> SchedulerResult<()>;
}

/// Supervises the singleton topology master process on a dedicated task
/// with a bounded number of launch attempts.
pub(crate) struct MasterSupervisor {
    task: Arc<dyn TopologyMasterTask>,
    killed: Arc<AtomicBool>,
    supervision: Option<JoinHandle<()>>,
}

impl MasterSupervisor {
    pub fn new(task: Arc<dyn TopologyMasterTask>, killed: Arc<AtomicBool>) -> Self {
        Self {
            task,
            killed,
            supervision: None,
        }
    }

    /// Launches the topology master and keeps relaunching it while attempts
    /// remain and the topology has not been killed.
    pub fn launch(&mut self, config: TaskConfig) {
        if let Some(supervision) = &self.supervision {
            if !supervision.is_finished() {
                warn!("the topology master is already supervised");
                return;
            }
        }
        let task = Arc::clone(&self.task);
        let killed = Arc::clone(&self.killed);
        self.supervision = Some(tokio::spawn(async move {
            let mut attempts = MASTER_LAUNCH_ATTEMPTS;
            loop {
                info!("launching the topology master executor");
                match task.run(config.clone()).await {
                    Ok(()) => info!("the topology master executor terminated"),
                    Err(e) => warn!("the topology master executor failed: {e}"),
                }
                if killed.load(Ordering::SeqCst) {
                    info!("the topology is killed, leaving the topology master down");
                    return;
                }
                attempts -= 1;
                if attempts == 0 {
                    warn!("the topology master keeps terminating, leaving it down");
                    return;
                }
                warn!("restarting the topology master, attempts left: {attempts}");
            }
        }));
    }

    /// Cancels the in-flight run and stops supervision.
    pub fn kill(&mut self) {
        if let Some(supervision) = self.supervision.take() {
            info!("killing the topology master");
            supervision.abort();
        }
    }
}
