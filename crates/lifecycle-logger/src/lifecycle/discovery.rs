//! Lookup of an inbound parent token.
//!
//! Both lookups are first-match-wins over a fixed order and never fail: `None` means the
//! caller starts a new root token.

use crate::lifecycle::carrier::Extractor;

/// Meta-variables checked for an inbound token, highest priority first.
///
/// These are historical spellings of the same logical `LifeCycleToken` header.
pub const INBOUND_HEADER_KEYS: [&str; 3] = [
    "HTTP_LIFECYCLETOKEN",
    "HTTP_LIFE_CYCLE_TOKEN",
    "HTTP_LIFECYCLE_TOKEN",
];

/// Prefix of the process argument carrying an inbound token, `lifecycleToken:<id>`.
pub const ARGV_TOKEN_PREFIX: &str = "lifecycleToken";

/// Returns the value of the first non-empty inbound header.
#[must_use]
pub fn find_token_in_headers(carrier: &dyn Extractor) -> Option<String> {
    INBOUND_HEADER_KEYS
        .iter()
        .filter_map(|key| carrier.get(key))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Returns the token passed as `lifecycleToken:<id>`.
///
/// Only the first argument starting with [`ARGV_TOKEN_PREFIX`] is considered. Its value is
/// everything after the first `:`; an argument without a colon or with an empty value
/// yields `None`.
///
/// ```
/// use lifecycle_logger::lifecycle::discovery::find_token_in_argv;
///
/// let argv = ["worker", "lifecycleToken:ABC:1", "lifecycleToken:DEF"];
/// assert_eq!(find_token_in_argv(argv).as_deref(), Some("ABC:1"));
/// ```
#[must_use]
pub fn find_token_in_argv<I, S>(args: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let arg = args
        .into_iter()
        .find(|arg| arg.as_ref().starts_with(ARGV_TOKEN_PREFIX))?;
    arg.as_ref()
        .split_once(':')
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
