use mast_common::error::CommonError;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::id::WorkerId;

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("duplicate allocation request for worker {0}")]
    DuplicateAllocation(WorkerId),
    #[error("no worker {0} in the packing plan")]
    UnknownWorker(WorkerId),
    #[error("container allocation error: {0}")]
    ContainerAllocation(String),
    #[error("error in common module: {0}")]
    CommonError(#[from] CommonError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl<M> From<mpsc::error::SendError<M>> for SchedulerError {
    fn from(_: mpsc::error::SendError<M>) -> Self {
        Self::InternalError("the application master mailbox is closed".to_string())
    }
}
