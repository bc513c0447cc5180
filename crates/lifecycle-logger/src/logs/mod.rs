//! Log event formatting for a size-constrained sink.
//!
//! # Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!                     │   LogEvent   │  (timestamp, level, message, context)
//!                     └──────┬───────┘
//!                            │
//!                            v
//!                     ┌──────────────┐
//!                     │    Filter    │  (level predicate)
//!                     └──────┬───────┘
//!                            │
//!                            v
//!                  ┌─────────────────┐
//!                  │ LogStashFormat  │  (index, budget, column map)
//!                  └─────────┬───────┘
//!                            │ context too large?
//!                            v
//!                     ┌──────────────┐
//!                     │  Truncator   │  (pluggable strategy)
//!                     └──────────────┘
//! ```
//!
//! # Components
//!
//! - **[`event`]**: The log event and its timestamp representation
//! - **[`formatter`]**: Bounded JSON document formatting
//! - **[`truncator`]**: Byte-budget aware JSON truncation strategies
//! - **[`column_map`]**: Remapping of event fields to storage columns
//! - **[`filter`]**: Level based acceptance of events
//! - **[`metric`]**: Metric-only formatting of events
//! - **[`constants`]**: Sink size limits

pub mod column_map;
pub mod constants;
pub mod event;
pub mod filter;
pub mod formatter;
pub mod metric;
pub mod truncator;
