//! Tracing hooks for build observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate. The
//! macro no-ops when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level tracing event with the operation name and finished SQL.
///
/// ```ignore
/// trace_build!("select", &sql);
/// ```
#[macro_export]
macro_rules! trace_build {
    ($operation:literal, $sql:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(operation = $operation, sql = %$sql, "jsonsql.build");
    };
}
