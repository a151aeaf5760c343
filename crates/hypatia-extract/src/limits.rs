//! Resource limits applied while binding.

/// Default maximum body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default maximum number of multipart fields.
pub const DEFAULT_MAX_MULTIPART_FIELDS: usize = 100;

/// Limits on what a request body may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLimits {
    /// Maximum body size in bytes; larger bodies fail with 413.
    pub max_body_bytes: usize,
    /// Maximum number of fields in a multipart body.
    pub max_multipart_fields: usize,
}

impl Default for BindingLimits {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_multipart_fields: DEFAULT_MAX_MULTIPART_FIELDS,
        }
    }
}

impl BindingLimits {
    /// Creates limits with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum body size.
    #[must_use]
    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Sets the maximum number of multipart fields.
    #[must_use]
    pub fn max_multipart_fields(mut self, count: usize) -> Self {
        self.max_multipart_fields = count;
        self
    }
}
