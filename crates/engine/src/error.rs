// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot enable: circuit breaker is open, call reset_circuit_breaker first")]
    CircuitOpen,
}
