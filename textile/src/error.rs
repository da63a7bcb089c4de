//! Error types for converter configuration.

use thiserror::Error;

/// Errors raised while building a [`crate::Textile`] converter.
///
/// Conversion itself is infallible: malformed markup degrades to literal
/// text rather than failing. Only an inconsistent configuration is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
  /// Lite mode drops the block-level grammar that makes unrestricted input
  /// safe to round-trip, so it is only meaningful together with restricted
  /// mode.
  #[error("lite mode requires restricted mode")]
  LiteRequiresRestricted,
}
