// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("event bus is closed")]
    Closed,
}
