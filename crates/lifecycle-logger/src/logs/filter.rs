use crate::logs::event::LogEvent;

/// Decides whether an event reaches the formatter.
pub trait Filter {
    /// Returns `true` to accept the event.
    fn filter(&self, event: &LogEvent) -> bool;
}

/// Accepts events whose level is one of the configured levels.
///
/// Levels are compared exactly, an empty list accepts nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelFilter {
    levels: Vec<String>,
}

impl LevelFilter {
    #[must_use]
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

impl Filter for LevelFilter {
    fn filter(&self, event: &LogEvent) -> bool {
        self.levels.iter().any(|level| *level == event.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_listed_levels_only() {
        let filter = LevelFilter::new(["error", "warning"]);
        assert!(filter.filter(&LogEvent::new("error", "")));
        assert!(filter.filter(&LogEvent::new("warning", "")));
        assert!(!filter.filter(&LogEvent::new("info", "")));
        assert!(!filter.filter(&LogEvent::new("ERROR", "")));
    }

    #[test]
    fn test_empty_list_blocks_everything() {
        assert!(!LevelFilter::default().filter(&LogEvent::new("error", "")));
    }
}
