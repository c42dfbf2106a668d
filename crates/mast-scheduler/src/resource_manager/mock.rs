use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{SchedulerError, SchedulerResult};
use crate::resource::ByteAmount;
use crate::resource_manager::{
    Allocation, ContainerRequest, ContextConfig, ExecutorContext, ResourceManager, TaskConfig,
};

/// Records submitted container requests and optionally fails submissions.
#[derive(Default)]
pub(crate) struct MockResourceManager {
    requests: Mutex<Vec<ContainerRequest>>,
    fail_submissions: AtomicBool,
}

impl MockResourceManager {
    pub fn requests(&self) -> Vec<ContainerRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn fail_submissions(&self) {
        self.fail_submissions.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceManager for MockResourceManager {
    async fn submit(&self, request: ContainerRequest) -> SchedulerResult<()> {
        if self.fail_submissions.load(Ordering::SeqCst) {
            return Err(SchedulerError::InternalError(
                "the resource manager is unavailable".to_string(),
            ));
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// A granted container that records submitted contexts and close calls.
pub(crate) struct MockAllocation {
    id: String,
    memory: ByteAmount,
    cores: u32,
    contexts: Mutex<Vec<ContextConfig>>,
    close_count: AtomicUsize,
}

impl MockAllocation {
    pub fn new(id: &str, memory: ByteAmount, cores: u32) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            memory,
            cores,
            contexts: Mutex::new(vec![]),
            close_count: AtomicUsize::new(0),
        })
    }

    pub fn submitted_contexts(&self) -> Vec<ContextConfig> {
        self.contexts.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.close_count() > 0
    }
}

#[async_trait]
impl Allocation for MockAllocation {
    fn id(&self) -> &str {
        &self.id
    }

    fn granted_memory(&self) -> ByteAmount {
        self.memory
    }

    fn granted_cores(&self) -> u32 {
        self.cores
    }

    async fn submit_context(&self, config: ContextConfig) -> SchedulerResult<()> {
        self.contexts.lock().unwrap().push(config);
        Ok(())
    }

    async fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// An active context that records submitted tasks and close calls.
pub(crate) struct MockExecutorContext {
    id: String,
    tasks: Mutex<Vec<TaskConfig>>,
    closed: AtomicBool,
}

impl MockExecutorContext {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            tasks: Mutex::new(vec![]),
            closed: AtomicBool::new(false),
        })
    }

    pub fn submitted_tasks(&self) -> Vec<TaskConfig> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutorContext for MockExecutorContext {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit_task(&self, config: TaskConfig) -> SchedulerResult<()> {
        self.tasks.lock().unwrap().push(config);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
