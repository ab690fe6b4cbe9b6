// SPDX-License-Identifier: MIT

//! `WorkflowExecutor`: drives a single workflow to completion, publishing
//! exactly one terminal event on the shared bus for async paths. A
//! synchronous error from `run` is an "early failure" — no event is
//! published, and the caller (the kanban engine) synthesizes the failed
//! transition itself.

use crate::project::ExecutionContext;
use async_trait::async_trait;
use quorum_core::WorkflowId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("workflow validation failed: {0}")]
    Validation(String),
    #[error("workflow {0} is already running")]
    AlreadyRunning(WorkflowId),
    #[error("missing configuration: {0}")]
    MissingConfig(String),
}

#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    async fn run(&self, ctx: &ExecutionContext, workflow_id: WorkflowId) -> Result<(), ExecutorError>;
}
