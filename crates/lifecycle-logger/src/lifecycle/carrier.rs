//! Carriers for inbound transport metadata.
//!
//! Token discovery never reads process-wide state directly. Callers hand it a carrier:
//! a CGI-style environment, a header map or a JSON object.
//!
//! # Case Insensitivity
//!
//! Lookups are case-insensitive so that `HTTP_LIFECYCLETOKEN` and `http_lifecycletoken`
//! name the same entry.
//!
//! # Header Names
//!
//! Web servers expose inbound headers as CGI meta-variables: upper case, `-` replaced by
//! `_`, prefixed with `HTTP_`. [`meta_variables`] and [`request_headers`] convert between
//! the two forms.

use std::collections::HashMap;

use serde_json::Value;

/// Prefix of CGI meta-variables carrying inbound HTTP headers.
pub const HTTP_META_PREFIX: &str = "HTTP_";

/// Read access to transport metadata.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use lifecycle_logger::lifecycle::carrier::Extractor;
///
/// let env = HashMap::from([("HTTP_LIFECYCLETOKEN".to_string(), "ABC".to_string())]);
/// assert_eq!(Extractor::get(&env, "http_lifecycletoken"), Some("ABC"));
/// ```
pub trait Extractor {
    /// Gets a value by key, ignoring case.
    fn get(&self, key: &str) -> Option<&str>;

    /// Gets all keys present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = HashMap::get(self, key) {
            return Some(value.as_str());
        }
        self.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect::<Vec<_>>()
    }
}

/// Only `Value::Object` carries entries; string values are returned, others ignored.
impl Extractor for Value {
    fn get(&self, key: &str) -> Option<&str> {
        let Value::Object(map) = self else {
            return None;
        };
        map.get(key)
            .or_else(|| {
                map.iter()
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                    .map(|(_, value)| value)
            })
            .and_then(Value::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        if let Value::Object(map) = self {
            map.keys().map(String::as_str).collect::<Vec<_>>()
        } else {
            Vec::new()
        }
    }
}

/// Converts raw HTTP headers into CGI meta-variables.
///
/// ```
/// use lifecycle_logger::lifecycle::carrier::meta_variables;
///
/// let env = meta_variables([("Life-Cycle-Token", "ABC")]);
/// assert_eq!(env["HTTP_LIFE_CYCLE_TOKEN"], "ABC");
/// ```
#[must_use]
pub fn meta_variables<I, K, V>(headers: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    headers
        .into_iter()
        .map(|(name, value)| {
            let name = name.as_ref().trim().to_ascii_uppercase().replace('-', "_");
            (format!("{HTTP_META_PREFIX}{name}"), value.into())
        })
        .collect()
}

/// Recovers HTTP headers from the `HTTP_*` entries of a CGI environment.
///
/// Header case is restored word by word, so `HTTP_LIFE_CYCLE_TOKEN` becomes
/// `Life-Cycle-Token`. Names of two characters or fewer are kept as they are.
#[must_use]
pub fn request_headers(carrier: &dyn Extractor) -> HashMap<String, String> {
    carrier
        .keys()
        .into_iter()
        .filter_map(|key| {
            let name = key.strip_prefix(HTTP_META_PREFIX)?;
            let value = carrier.get(key)?;
            let name = if name.len() > 2 {
                name.split('_').map(capitalize).collect::<Vec<_>>().join("-")
            } else {
                name.to_string()
            };
            Some((name, value.to_string()))
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_map_get_ignores_case() {
        let carrier = HashMap::from([("HTTP_LIFECYCLETOKEN".to_string(), "value".to_string())]);

        assert_eq!(Extractor::get(&carrier, "HTTP_LIFECYCLETOKEN"), Some("value"));
        assert_eq!(Extractor::get(&carrier, "http_lifecycleToken"), Some("value"));
        assert_eq!(Extractor::get(&carrier, "HTTP_OTHER"), None);
    }

    #[test]
    fn serde_value_get() {
        let carrier = json!({"REMOTE_ADDR": "10.0.0.1", "PORT": 80});

        assert_eq!(Extractor::get(&carrier, "remote_addr"), Some("10.0.0.1"));
        assert_eq!(Extractor::get(&carrier, "PORT"), None, "non-string values");
        assert_eq!(Extractor::get(&json!("scalar"), "PORT"), None);
    }

    #[test]
    fn serde_value_keys() {
        let carrier = json!({"a": "1", "b": "2"});
        let got = Extractor::keys(&carrier);
        assert_eq!(got.len(), 2);
        assert!(got.contains(&"a"));
        assert!(got.contains(&"b"));
        assert!(Extractor::keys(&json!([1])).is_empty());
    }

    #[test]
    fn meta_variables_normalize_names() {
        let env = meta_variables([("lifecycle-token", "A"), (" LifeCycleToken ", "B")]);
        assert_eq!(env["HTTP_LIFECYCLE_TOKEN"], "A");
        assert_eq!(env["HTTP_LIFECYCLETOKEN"], "B");
    }

    #[test]
    fn request_headers_restore_case() {
        let env = HashMap::from([
            ("HTTP_LIFE_CYCLE_TOKEN".to_string(), "A".to_string()),
            ("HTTP_TE".to_string(), "trailers".to_string()),
            ("REMOTE_ADDR".to_string(), "10.0.0.1".to_string()),
        ]);

        let headers = request_headers(&env);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Life-Cycle-Token"], "A");
        assert_eq!(headers["TE"], "trailers");
    }
}
