//! Inspection configuration.
//!
//! [`InspectConfig`] is threaded explicitly into every parse, so concurrent
//! inspections with different strictness settings stay independent.

use serde::Deserialize;

use crate::pool::DEFAULT_BUFFER_SIZE;

/// Settings controlling how a `ClientHello` is inspected.
///
/// # Default Values
/// - `strict`: `false`
/// - `fast_path`: `true`
/// - `max_buffered`: 256 KiB
///
/// # Examples
///
/// ```
/// use sni_peek::InspectConfig;
///
/// let config = InspectConfig::default().with_strict(true);
/// assert!(config.strict);
/// assert!(config.fast_path);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Apply the stricter structural checks: SSL record versions and
    /// oversized fragments are rejected, cipher-suite and compression
    /// lengths are range checked, and nested length fields become
    /// enforced budgets.
    pub strict: bool,
    /// Try the single-read fixed-offset parse before the general path.
    pub fast_path: bool,
    /// Ceiling on bytes buffered from the stream while inspecting.
    pub max_buffered: usize,
}

impl InspectConfig {
    /// Default ceiling on buffered bytes.
    ///
    /// Large enough for a maximal `ClientHello` split into 16 KiB records.
    pub const DEFAULT_MAX_BUFFERED: usize = 256 * 1024;

    /// Enable or disable strict validation.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable or disable the single-read fast path.
    #[must_use]
    pub fn with_fast_path(mut self, fast_path: bool) -> Self {
        self.fast_path = fast_path;
        self
    }

    /// Set the ceiling on buffered bytes.
    ///
    /// Values below one pool region are raised to the region size.
    #[must_use]
    pub fn with_max_buffered(mut self, max_buffered: usize) -> Self {
        self.max_buffered = max_buffered;
        self.normalized()
    }

    /// Clamp `max_buffered` so at least one pool region fits.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_buffered = self.max_buffered.max(DEFAULT_BUFFER_SIZE);
        self
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            strict: false,
            fast_path: true,
            max_buffered: Self::DEFAULT_MAX_BUFFERED,
        }
    }
}
