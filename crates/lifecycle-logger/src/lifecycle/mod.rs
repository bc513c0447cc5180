//! Lifecycle tokens: correlation identifiers chained across units of work.
//!
//! A [`LifeCycleToken`] identifies one unit of work (a request, a CLI invocation, a job)
//! and optionally owns the token of the unit that caused it. Tokens are immutable once
//! built, so the parent chain is a plain owned list and can never form a cycle.
//!
//! # Crossing a Boundary
//!
//! Exporting a token keeps only its own identifier. Importing that identifier on the other
//! side never reproduces the original token: it yields a new token whose parent is the
//! imported identifier.
//!
//! ```text
//!  process A                           process B
//!  ┌──────────────────┐   "QWE...Z"    ┌──────────────────┐
//!  │ token  QWE...Z   │ ─────────────> │ token  ASD...X   │  (fresh)
//!  │ parent (any)     │ export_identity│ parent QWE...Z   │  derive_child_from
//!  └──────────────────┘                └──────────────────┘
//! ```
//!
//! The serde implementations follow the same protocol.

pub mod audit;
pub mod carrier;
pub mod discovery;

use std::fmt;

use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::lifecycle::carrier::Extractor;
use crate::lifecycle::discovery::{find_token_in_argv, find_token_in_headers};

/// Context field holding the token of the current unit of work.
pub const KEY_LIFECYCLE_TOKEN: &str = "lifecycle_token";
/// Context field keeping a producer supplied token that differs from ours.
pub const KEY_ORIGINAL_LIFECYCLE_TOKEN: &str = "original_lifecycle_token";
/// Context field holding the parent token.
pub const KEY_PARENT_LIFECYCLE_TOKEN: &str = "parent_lifecycle_token";
/// Context field keeping a producer supplied parent token that differs from ours.
pub const KEY_ORIGINAL_PARENT_LIFECYCLE_TOKEN: &str = "original_parent_lifecycle_token";

/// Length of generated identifiers.
pub const TOKEN_LENGTH: usize = 30;

/// Characters generated identifiers are drawn from.
pub const TOKEN_ALPHABET: &[u8; 36] = b"QWERTYUIOPASDFGHJKLZXCVBNM0123456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LifeCycleToken {
    token: String,
    parent: Option<Box<LifeCycleToken>>,
}

impl LifeCycleToken {
    /// Wraps an existing identifier. No validation is applied.
    #[must_use]
    pub fn new(token: impl Into<String>, parent: Option<LifeCycleToken>) -> Self {
        Self {
            token: token.into(),
            parent: parent.map(Box::new),
        }
    }

    /// Creates a root token with a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(generate_identifier(), None)
    }

    /// Creates a fresh token whose parent wraps `parent`.
    ///
    /// Only the given identifier is kept, the parent's own ancestry is unknown.
    #[must_use]
    pub fn with_parent(parent: impl Into<String>) -> Self {
        Self::new(generate_identifier(), Some(Self::new(parent, None)))
    }

    /// Creates a token for a request described by a CGI-style `carrier`.
    ///
    /// The first non-empty inbound header named in
    /// [`discovery::INBOUND_HEADER_KEYS`] becomes the parent. Without one, a root token
    /// is generated.
    #[must_use]
    pub fn from_headers(carrier: &dyn Extractor) -> Self {
        find_token_in_headers(carrier).map_or_else(Self::generate, Self::with_parent)
    }

    /// Creates a token for a process started with `args`.
    ///
    /// A `lifecycleToken:<id>` argument makes `<id>` the parent. Without one, a root token
    /// is generated.
    #[must_use]
    pub fn from_argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        find_token_in_argv(args).map_or_else(Self::generate, Self::with_parent)
    }

    /// Returns the identifier to hand to the next unit of work.
    ///
    /// The parent is dropped. Importing the result with
    /// [`LifeCycleToken::derive_child_from`] gives a child of `self`, not a copy.
    #[must_use]
    pub fn export_identity(&self) -> String {
        self.token.clone()
    }

    /// Creates a fresh token whose parent is the exported identifier `identity`.
    ///
    /// ```
    /// use lifecycle_logger::lifecycle::LifeCycleToken;
    ///
    /// let token = LifeCycleToken::generate();
    /// let child = LifeCycleToken::derive_child_from(&token.export_identity());
    ///
    /// assert_ne!(child, token);
    /// assert_eq!(child.parent().map(LifeCycleToken::as_str), Some(token.as_str()));
    /// ```
    #[must_use]
    pub fn derive_child_from(identity: &str) -> Self {
        Self::with_parent(identity)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&LifeCycleToken> {
        self.parent.as_deref()
    }

    /// Whether `identifier` looks like a generated token: [`TOKEN_LENGTH`] characters of
    /// `A-Z0-9`.
    #[must_use]
    pub fn is_well_formed(identifier: &str) -> bool {
        identifier.len() == TOKEN_LENGTH
            && identifier
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    }

    /// Context fields identifying this token and its parent, if any.
    #[must_use]
    pub fn context_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(
            KEY_LIFECYCLE_TOKEN.to_string(),
            Value::String(self.token.clone()),
        );
        if let Some(parent) = &self.parent {
            fields.insert(
                KEY_PARENT_LIFECYCLE_TOKEN.to_string(),
                Value::String(parent.token.clone()),
            );
        }
        fields
    }

    /// Writes [`LifeCycleToken::context_fields`] into an event context.
    ///
    /// A producer supplied value that differs from ours is kept under the matching
    /// `original_*` key.
    pub fn stamp_context(&self, context: &mut Map<String, Value>) {
        for (key, value) in self.context_fields() {
            let original_key = if key == KEY_LIFECYCLE_TOKEN {
                KEY_ORIGINAL_LIFECYCLE_TOKEN
            } else {
                KEY_ORIGINAL_PARENT_LIFECYCLE_TOKEN
            };
            if let Some(previous) = context.insert(key, value.clone()) {
                if previous != value {
                    context.insert(original_key.to_string(), previous);
                }
            }
        }
    }
}

impl fmt::Display for LifeCycleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Serializes [`LifeCycleToken::export_identity`] only.
impl Serialize for LifeCycleToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

/// Deserializes through [`LifeCycleToken::derive_child_from`].
impl<'de> Deserialize<'de> for LifeCycleToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identity = String::deserialize(deserializer)?;
        Ok(Self::derive_child_from(&identity))
    }
}

fn generate_identifier() -> String {
    let mut rng = OsRng;
    (0..TOKEN_LENGTH)
        .map(|_| char::from(TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    const ID: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123";

    #[test]
    fn test_generate_is_root_and_well_formed() {
        let token = LifeCycleToken::generate();
        assert!(!token.has_parent());
        assert!(token.parent().is_none());
        assert!(LifeCycleToken::is_well_formed(token.as_str()));
        assert_ne!(token, LifeCycleToken::generate());
    }

    #[test]
    fn test_with_parent_has_no_grandparent() {
        let token = LifeCycleToken::with_parent("upstream");
        let parent = token.parent().unwrap();
        assert_eq!(parent.as_str(), "upstream");
        assert!(!parent.has_parent());
        assert!(LifeCycleToken::is_well_formed(token.as_str()));
    }

    #[test]
    fn test_export_discards_parent() {
        let token = LifeCycleToken::new(ID, Some(LifeCycleToken::new("P", None)));
        assert_eq!(token.export_identity(), ID);
        assert_eq!(token.to_string(), ID);
    }

    #[test]
    fn test_derive_child_is_never_a_copy() {
        let token = LifeCycleToken::with_parent("upstream");
        let child = LifeCycleToken::derive_child_from(&token.export_identity());

        assert_ne!(child.as_str(), token.as_str());
        assert_eq!(child.parent().unwrap().as_str(), token.as_str());
        assert!(!child.parent().unwrap().has_parent());
    }

    #[test]
    fn test_serde_follows_export_and_derive() {
        let token = LifeCycleToken::new(ID, Some(LifeCycleToken::new("P", None)));
        let serialized = serde_json::to_string(&token).unwrap();
        assert_eq!(serialized, format!("\"{ID}\""));

        let restored: LifeCycleToken = serde_json::from_str(&serialized).unwrap();
        assert_eq!(restored.parent().unwrap().as_str(), ID);
        assert_ne!(restored.as_str(), ID);
    }

    #[test]
    fn test_from_headers() {
        let root = LifeCycleToken::from_headers(&HashMap::<String, String>::new());
        assert!(!root.has_parent());

        let env = json!({"HTTP_LIFE_CYCLE_TOKEN": "second", "HTTP_LIFECYCLE_TOKEN": "third"});
        let child = LifeCycleToken::from_headers(&env);
        assert_eq!(child.parent().unwrap().as_str(), "second");
    }

    #[test]
    fn test_from_argv() {
        assert!(!LifeCycleToken::from_argv(["bin", "--verbose"]).has_parent());
        assert!(!LifeCycleToken::from_argv(["bin", "lifecycleToken:"]).has_parent());

        let child = LifeCycleToken::from_argv(["bin", "lifecycleToken:UP"]);
        assert_eq!(child.parent().unwrap().as_str(), "UP");
    }

    #[test]
    fn test_is_well_formed() {
        assert!(LifeCycleToken::is_well_formed(ID));
        assert!(!LifeCycleToken::is_well_formed(&ID.to_lowercase()));
        assert!(!LifeCycleToken::is_well_formed(&ID[1..]));
        assert!(!LifeCycleToken::is_well_formed("ABCDEFGHIJKLMNOPQRSTUVWXYZ012-"));
    }

    #[test]
    fn test_context_fields() {
        assert_eq!(
            Value::Object(LifeCycleToken::new(ID, None).context_fields()),
            json!({"lifecycle_token": ID})
        );
        assert_eq!(
            Value::Object(
                LifeCycleToken::new(ID, Some(LifeCycleToken::new("P", None))).context_fields()
            ),
            json!({"lifecycle_token": ID, "parent_lifecycle_token": "P"})
        );
    }

    #[test]
    fn test_stamp_context_keeps_differing_originals() {
        let token = LifeCycleToken::new(ID, Some(LifeCycleToken::new("P", None)));
        let mut context = json!({
            "lifecycle_token": "SENT",
            "parent_lifecycle_token": "P",
            "a": 1
        })
        .as_object()
        .unwrap()
        .clone();

        token.stamp_context(&mut context);
        assert_eq!(
            Value::Object(context),
            json!({
                "lifecycle_token": ID,
                "parent_lifecycle_token": "P",
                "a": 1,
                "original_lifecycle_token": "SENT"
            })
        );
    }
}
