#![forbid(unsafe_code)]
//! depsort-core library.
//!
//! Computes a dependency-respecting processing order for a set of Python
//! modules, tolerating import cycles.
//!
//! ```text
//! paths ─▶ module::ModuleSet ─▶ graph::DependencyGraph ─▶ graph::sort ─▶ plan::Plan
//!                                   ▲
//!                         extract::Candidates (per module)
//! ```
//!
//! # Conventions
//!
//! - **Errors**: fatal conditions are [`error::PlanError`]; everything
//!   per-module is logged and absorbed. Config loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod module;
pub mod plan;

pub use config::{Config, load_config};
pub use error::{ErrorCode, PlanError};
pub use plan::{Plan, plan};
