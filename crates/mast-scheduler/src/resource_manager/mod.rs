mod config;
#[cfg(test)]
pub(crate) mod mock;

pub use config::{ContextConfig, TaskConfig};

use async_trait::async_trait;

use crate::error::SchedulerResult;
use crate::resource::ByteAmount;

/// A request for one container of the given size.
///
/// The resource manager allocates in fixed memory and cpu increments, so the
/// granted container may be larger than requested, and grants are not
/// correlated with individual requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRequest {
    pub count: usize,
    pub memory_mb: u64,
    pub cores: u32,
}

/// The client that submits container requests to the cluster resource
/// manager on behalf of the application master. Granted containers arrive
/// later through the allocation event stream.
#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    async fn submit(&self, request: ContainerRequest) -> SchedulerResult<()>;
}

/// A physical container granted by the resource manager.
#[async_trait]
pub trait Allocation: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn granted_memory(&self) -> ByteAmount;

    fn granted_cores(&self) -> u32;

    /// Submits the in-container bootstrap configuration. The bootstrap
    /// reports back through the context event stream.
    async fn submit_context(&self, config: ContextConfig) -> SchedulerResult<()>;

    /// Releases the container. Best effort and bounded.
    async fn close(&self);
}

/// The in-container bootstrap environment into which executor tasks are
/// submitted.
#[async_trait]
pub trait ExecutorContext: Send + Sync + 'static {
    /// The context identifier, which carries the decimal worker id.
    fn id(&self) -> &str;

    async fn submit_task(&self, config: TaskConfig) -> SchedulerResult<()>;

    async fn close(&self);
}
