// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Behavior switches of a [`Coordinator`](crate::Coordinator).
///
/// # Examples
///
/// ```
/// use fetchlon::CoordinatorOptions;
///
/// let options = CoordinatorOptions::default().refresh_cache_default(true);
/// assert!(options.is_request_id_tracking());
/// assert!(options.is_refresh_cache_default());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[expect(clippy::struct_excessive_bools, reason = "each flag is an independent switch")]
pub struct CoordinatorOptions {
    request_id_tracking: bool,
    refresh_cache_default: bool,
    cancel_on_dispose: bool,
    emit_cancelled: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            request_id_tracking: true,
            refresh_cache_default: false,
            cancel_on_dispose: true,
            emit_cancelled: true,
        }
    }
}

impl CoordinatorOptions {
    /// Gives every request its own identifier. When disabled, every response carries `0`.
    #[must_use]
    pub fn request_id_tracking(mut self, enabled: bool) -> Self {
        self.request_id_tracking = enabled;
        self
    }

    /// Makes [`Coordinator::request`](crate::Coordinator::request) refresh after a cache hit.
    #[must_use]
    pub fn refresh_cache_default(mut self, enabled: bool) -> Self {
        self.refresh_cache_default = enabled;
        self
    }

    /// Cancels pending work on dispose.
    #[must_use]
    pub fn cancel_on_dispose(mut self, enabled: bool) -> Self {
        self.cancel_on_dispose = enabled;
        self
    }

    /// Emits [`Response::Cancelled`](crate::Response::Cancelled) for cancelled requests.
    /// When disabled, cancellation leaves the state unchanged.
    #[must_use]
    pub fn emit_cancelled(mut self, enabled: bool) -> Self {
        self.emit_cancelled = enabled;
        self
    }

    /// Returns `true` when requests get their own identifiers.
    #[must_use]
    pub fn is_request_id_tracking(&self) -> bool {
        self.request_id_tracking
    }

    /// Returns `true` when plain requests refresh after a cache hit.
    #[must_use]
    pub fn is_refresh_cache_default(&self) -> bool {
        self.refresh_cache_default
    }

    /// Returns `true` when dispose cancels pending work.
    #[must_use]
    pub fn is_cancel_on_dispose(&self) -> bool {
        self.cancel_on_dispose
    }

    /// Returns `true` when cancellation is emitted.
    #[must_use]
    pub fn is_emit_cancelled(&self) -> bool {
        self.emit_cancelled
    }
}

/// Per-request cache handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Evicts the cached value first and always fetches.
    pub clean_cache: bool,
    /// Fetches even after a cache hit; the cached value is emitted as provisional data.
    pub refresh_cache: bool,
}

impl RequestFlags {
    /// Flags that evict the cached value and fetch.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            clean_cache: true,
            refresh_cache: false,
        }
    }

    /// Flags that emit a cached value and then fetch.
    #[must_use]
    pub fn refresh() -> Self {
        Self {
            clean_cache: false,
            refresh_cache: true,
        }
    }
}
