// SPDX-License-Identifier: MIT

//! `AgentRegistry`/`Agent`: the LLM-invocation seam. Concrete
//! implementations (spawning real model providers) are an external
//! collaborator; this crate only defines the contract and a fake for tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
    pub phase: Option<String>,
    pub reasoning_effort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub output: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cost_usd: f64,
    pub duration: Duration,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent {0:?} not found")]
    NotFound(String),
    #[error("agent {0:?} unavailable")]
    Unavailable(String),
    #[error("agent execution failed: {0}")]
    Execution(String),
}

#[async_trait]
pub trait Agent: Send + Sync {
    async fn execute(&self, request: AgentRequest) -> Result<AgentResponse, AgentError>;
}

#[async_trait]
pub trait AgentRegistry: Send + Sync {
    fn get(&self, name: &str) -> Result<Arc<dyn Agent>, AgentError>;
    fn list(&self) -> Vec<String>;
    async fn available(&self) -> Vec<String>;
    async fn available_for_phase(&self, phase: &str) -> Vec<String>;
}
