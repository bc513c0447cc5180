//! Size limits of the log sink.
//!
//! The sink accepts documents of at most [`MAX_DOCUMENT_SIZE_BYTES`]. A fixed
//! [`RESERVED_ENVELOPE_BYTES`] allowance is kept aside, once, for the envelope fields a
//! surrounding pipeline adds (timestamp, destination index metadata and so on). What is
//! left is the default budget shared by message and context.

/// Maximum size in bytes of a single document accepted by the sink.
pub const MAX_DOCUMENT_SIZE_BYTES: usize = 32_765;

/// Bytes reserved for envelope fields added around message and context.
pub const RESERVED_ENVELOPE_BYTES: usize = 350;

/// Default budget for message and context together.
///
/// # Value: 32,415 bytes
pub const DEFAULT_MAX_SIZE: usize = MAX_DOCUMENT_SIZE_BYTES - RESERVED_ENVELOPE_BYTES;

/// Context key that overrides the destination index of a single event.
pub const INDEX_NAME_KEY: &str = "es_index_name";

/// Output field carrying the destination index.
pub const INDEX_NAME_FIELD: &str = "_index_name";

/// Context placeholder used when the message alone exhausts the budget.
pub const EMPTY_CONTEXT: &str = "{}";
