//! Formatter for the crate's own diagnostics.
//!
//! Documents go to stdout and diagnostics go to stderr, but both can end up in the same
//! collector. Every diagnostic therefore starts with [`LOG_PREFIX`] and its level:
//!
//! ```text
//! LIFECYCLE_LOGGER | INFO | Lifecycle logger started token=7GQ2...K1 parent="UPSTREAM" protocol=tcp
//! LIFECYCLE_LOGGER | WARN | Skipping event: expected value at line 1 column 1 line=3
//! LIFECYCLE_LOGGER | DEBUG | Context truncated budget=32411 original=40012 truncated=32408
//! ```
//!
//! Event fields follow the message. When the event is emitted inside spans, their names
//! and fields come first, outermost first, e.g. `run{config="/etc"}: ...`.
//!
//! The binary installs it on stderr behind an `EnvFilter` seeded from `log_level`:
//!
//! ```rust,ignore
//! use lifecycle_logger::logger::Formatter;
//! use tracing_subscriber::EnvFilter;
//!
//! let filter = EnvFilter::builder()
//!     .with_default_directive(config.log_level.as_level_filter().into())
//!     .from_env_lossy();
//! let subscriber = tracing_subscriber::fmt::Subscriber::builder()
//!     .with_env_filter(filter)
//!     .event_format(Formatter)
//!     .with_writer(std::io::stderr)
//!     .finish();
//! tracing::subscriber::set_global_default(subscriber)?;
//! ```

use std::fmt;
use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::{
    format::{self, FormatEvent, FormatFields},
    FmtContext, FormattedFields,
};
use tracing_subscriber::registry::{LookupSpan, Scope};

/// Written before every diagnostic line.
pub const LOG_PREFIX: &str = "LIFECYCLE_LOGGER";

/// `LIFECYCLE_LOGGER | LEVEL | [span{fields}: ...] message fields`, one line per event.
#[derive(Debug, Clone, Copy)]
pub struct Formatter;

impl<S, N> FormatEvent<S, N> for Formatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{LOG_PREFIX} | {} | ", event.metadata().level())?;

        for span in ctx.event_scope().into_iter().flat_map(Scope::from_root) {
            write!(writer, "{}", span.name())?;
            if let Some(fields) = span.extensions().get::<FormattedFields<N>>() {
                if !fields.is_empty() {
                    write!(writer, "{{{fields}}}")?;
                }
            }
            write!(writer, ": ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
