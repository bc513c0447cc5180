//! Per-token audit records on disk.
//!
//! An audit record is a small text file named after the token, stored under a directory
//! per day:
//!
//! ```text
//! <dir>/2024-01-31/QWERTYUIOPASDFGHJKLZXCVBNM0123
//!
//! parent_lifecycle_token: ASDFGHJKLZXCVBNM0123QWERTYUIOP
//! REMOTE_ADDR: 10.0.0.1
//! REQUEST_URI: /orders/42
//! ```
//!
//! Records are diagnostics only. Failing to write one is logged and otherwise ignored,
//! and a crash between create and remove simply leaves the file behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::lifecycle::{carrier::Extractor, LifeCycleToken, KEY_PARENT_LIFECYCLE_TOKEN};

/// Date layout of the per-day directory.
pub const AUDIT_DATE_FORMAT: &str = "%Y-%m-%d";

const REMOTE_ADDR: &str = "REMOTE_ADDR";
const REQUEST_URI: &str = "REQUEST_URI";

/// Request metadata written next to the parent token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub remote_addr: Option<String>,
    pub request_uri: Option<String>,
}

impl RequestInfo {
    /// Reads `REMOTE_ADDR` and `REQUEST_URI` from a CGI-style carrier. Empty values count
    /// as absent.
    #[must_use]
    pub fn from_carrier(carrier: &dyn Extractor) -> Self {
        let lookup = |key| {
            carrier
                .get(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Self {
            remote_addr: lookup(REMOTE_ADDR),
            request_uri: lookup(REQUEST_URI),
        }
    }
}

/// Handle to an audit record. Removal is explicit.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use = "the audit record is only removed by calling `remove`"]
pub struct AuditRecord {
    path: Option<PathBuf>,
}

impl AuditRecord {
    /// Writes the record of `token` under today's directory in `dir`.
    pub fn create(token: &LifeCycleToken, dir: &Path, request: &RequestInfo) -> Self {
        Self::create_on(token, dir, Local::now().date_naive(), request)
    }

    /// Writes the record of `token` under the directory of `date` in `dir`. Tokens whose
    /// identifier is not well formed get no record.
    pub fn create_on(
        token: &LifeCycleToken,
        dir: &Path,
        date: NaiveDate,
        request: &RequestInfo,
    ) -> Self {
        // The identifier becomes a file name.
        if !LifeCycleToken::is_well_formed(token.as_str()) {
            debug!(token = %token, "Not writing audit record for malformed token");
            return Self::default();
        }

        let day_dir = dir.join(date.format(AUDIT_DATE_FORMAT).to_string());
        if let Err(e) = fs::create_dir_all(&day_dir) {
            debug!(dir = %day_dir.display(), "Cannot create audit directory: {e}");
            return Self::default();
        }

        let path = day_dir.join(token.as_str());
        match fs::write(&path, render(token, request)) {
            Ok(()) => {
                debug!(path = %path.display(), "Audit record created");
                Self { path: Some(path) }
            }
            Err(e) => {
                warn!(path = %path.display(), "Cannot write audit record: {e}");
                Self::default()
            }
        }
    }

    /// Path of the written record, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deletes the record. Does nothing if it was never written.
    pub fn remove(mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), "Cannot remove audit record: {e}");
        }
    }
}

fn render(token: &LifeCycleToken, request: &RequestInfo) -> String {
    let parent = token.parent().map(LifeCycleToken::as_str);
    let lines = [
        (KEY_PARENT_LIFECYCLE_TOKEN, parent),
        (REMOTE_ADDR, request.remote_addr.as_deref()),
        (REQUEST_URI, request.request_uri.as_deref()),
    ];
    lines
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|value| !value.is_empty())
                .map(|value| format!("{key}: {value}\n"))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[test]
    fn test_request_info_from_carrier() {
        let env = json!({"REMOTE_ADDR": "10.0.0.1", "REQUEST_URI": ""});
        assert_eq!(
            RequestInfo::from_carrier(&env),
            RequestInfo {
                remote_addr: Some("10.0.0.1".to_string()),
                request_uri: None,
            }
        );
    }

    #[test]
    fn test_create_and_remove() {
        let dir = tempdir().unwrap();
        let token = LifeCycleToken::with_parent("UPSTREAM");
        let request = RequestInfo {
            remote_addr: Some("10.0.0.1".to_string()),
            request_uri: Some("/orders/42".to_string()),
        };

        let record = AuditRecord::create_on(&token, dir.path(), date(), &request);
        let path = record.path().unwrap().to_path_buf();
        assert_eq!(path, dir.path().join("2024-01-31").join(token.as_str()));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "parent_lifecycle_token: UPSTREAM\nREMOTE_ADDR: 10.0.0.1\nREQUEST_URI: /orders/42\n"
        );

        record.remove();
        assert!(!path.exists());
    }

    #[test]
    fn test_root_token_without_request_writes_empty_record() {
        let dir = tempdir().unwrap();
        let token = LifeCycleToken::generate();

        let record = AuditRecord::create(&token, dir.path(), &RequestInfo::default());
        let path = record.path().unwrap().to_path_buf();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        record.remove();
    }

    #[test]
    fn test_uncreatable_directory_is_ignored() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let record = AuditRecord::create_on(
            &LifeCycleToken::generate(),
            &blocker,
            date(),
            &RequestInfo::default(),
        );
        assert_eq!(record.path(), None);
        record.remove();
    }

    #[test]
    fn test_malformed_token_writes_nothing() {
        let dir = tempdir().unwrap();
        for id in ["../escape", "a/b", "lower_case_is_not_an_identifier"] {
            let token = LifeCycleToken::new(id, None);
            let record = AuditRecord::create_on(&token, dir.path(), date(), &RequestInfo::default());
            assert_eq!(record.path(), None, "{id}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
