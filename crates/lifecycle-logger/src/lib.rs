//! # Lifecycle Logger
//!
//! This crate prepares structured log events for a size-constrained log sink and
//! propagates a hierarchical correlation identifier (the lifecycle token) across
//! service and process boundaries.
//!
//! ## Overview
//!
//! Two independent components form the core:
//! - **Bounded formatting**: [`logs::formatter::LogStashFormatter`] turns a
//!   [`logs::event::LogEvent`] into a JSON document whose message and context fit a
//!   fixed byte budget, shrinking the context with a pluggable
//!   [`logs::truncator::Truncate`] strategy.
//! - **Lifecycle tokens**: [`lifecycle::LifeCycleToken`] is an immutable identifier with
//!   an optional parent, discovered from inbound headers or process arguments and
//!   chained whenever it crosses a boundary.
//!
//! ## Architecture
//!
//! - [`config`]: Configuration from defaults, YAML and environment variables
//! - [`logger`]: Formatter for the crate's own diagnostics
//! - [`logs`]: Log events, bounded formatting, truncation, filtering and metrics
//! - [`lifecycle`]: Lifecycle tokens, carriers, discovery and audit records
//! - [`pipeline`]: Line-oriented event formatting used by the `lifecycle-logger` binary

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Configuration management - YAML files, environment variables, and defaults
pub mod config;

/// Lifecycle token identity, discovery and propagation
pub mod lifecycle;

/// Logging infrastructure and tracing setup
pub mod logger;

/// Log event formatting for the size-bounded sink
pub mod logs;

pub mod pipeline;
