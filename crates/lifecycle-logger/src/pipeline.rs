//! Line-oriented formatting pipeline.
//!
//! Reads one JSON [`LogEvent`] per line, drops events rejected by the level filter, stamps
//! the lifecycle token into the context and writes one bounded document per line.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::lifecycle::LifeCycleToken;
use crate::logs::event::LogEvent;
use crate::logs::filter::{Filter, LevelFilter};
use crate::logs::formatter::{FormatError, LogStashFormatter};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid event: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Counters reported when the input is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub written: usize,
    pub filtered: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Pipeline {
    formatter: LogStashFormatter,
    filter: Option<LevelFilter>,
    token: LifeCycleToken,
}

impl Pipeline {
    #[must_use]
    pub fn new(formatter: LogStashFormatter, token: LifeCycleToken) -> Self {
        Self {
            formatter,
            filter: None,
            token,
        }
    }

    /// Builds the pipeline described by `config`. The level filter is only installed when
    /// `accepted_levels` lists something.
    #[must_use]
    pub fn from_config(config: &Config, token: LifeCycleToken) -> Self {
        let pipeline = Self::new(LogStashFormatter::from_config(config), token);
        if config.accepted_levels.is_empty() {
            pipeline
        } else {
            pipeline.with_filter(LevelFilter::new(config.accepted_levels.iter().cloned()))
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: LevelFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn token(&self) -> &LifeCycleToken {
        &self.token
    }

    /// Formats a single input line. `Ok(None)` means the event was filtered out.
    pub fn process_line(&self, line: &str) -> Result<Option<String>, PipelineError> {
        let mut event: LogEvent = serde_json::from_str(line)?;
        if let Some(filter) = &self.filter {
            if !filter.filter(&event) {
                return Ok(None);
            }
        }
        self.token.stamp_context(&mut event.context);
        Ok(Some(self.formatter.format(event)?))
    }

    /// Processes `input` until EOF. Invalid lines, including lines that are not UTF-8, are
    /// logged and skipped. Only I/O errors abort the run.
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> io::Result<PipelineStats> {
        let mut stats = PipelineStats::default();
        let mut buf = Vec::new();
        let mut number = 0usize;
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            number += 1;

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(e) => {
                    warn!(line = number, "Skipping event: {e}");
                    stats.skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match self.process_line(line) {
                Ok(Some(document)) => {
                    writeln!(output, "{document}")?;
                    stats.written += 1;
                }
                Ok(None) => stats.filtered += 1,
                Err(e) => {
                    warn!(line = number, "Skipping event: {e}");
                    stats.skipped += 1;
                }
            }
        }
        output.flush()?;
        debug!(
            written = stats.written,
            filtered = stats.filtered,
            skipped = stats.skipped,
            "Input exhausted"
        );
        Ok(stats)
    }
}
