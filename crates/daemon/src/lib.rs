// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quorum-daemon: composes the bus, attachment store, chat store/registry,
//! and kanban engine into one process, and owns the process-level startup
//! and shutdown sequencing (lock file, state directories, logging init).
//!
//! Carries no network listener: HTTP/SSE transport, concrete agent
//! adapters, and Git/PR integration are external collaborators that plug in
//! through the traits `quorum-adapters` defines.

mod config;
mod env;
mod facade;
mod lifecycle;

pub use config::Config;
pub use facade::Quorum;
pub use lifecycle::{init_logging, shutdown, startup, LifecycleError};
