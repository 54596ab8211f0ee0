// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// The longest lifetime a timed value can have. Longer lifetimes are clamped to it so the
/// expiry instant stays representable on every platform.
pub const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(1_000 * 365 * 24 * 60 * 60);

/// A stored value annotated with its absolute expiry instant.
///
/// A timed value is visible to readers only while `now < expires_at`. Backends store the
/// envelope as-is; the expiry check belongs to the timed decorator in `fetchlon`.
///
/// # Examples
///
/// ```
/// use fetchlon_tier::TimedValue;
/// use std::time::{Duration, SystemTime};
///
/// let written = SystemTime::UNIX_EPOCH;
/// let value = TimedValue::expiring_after(written, Duration::from_secs(3), "payload");
///
/// assert!(value.is_live_at(written + Duration::from_secs(2)));
/// assert!(!value.is_live_at(written + Duration::from_secs(3)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedValue<V> {
    expires_at: SystemTime,
    value: V,
}

impl<V> TimedValue<V> {
    /// Creates a value that expires at the given instant.
    pub fn new(expires_at: SystemTime, value: V) -> Self {
        Self { expires_at, value }
    }

    /// Creates a value written at `written_at` that lives for `ttl`.
    ///
    /// Lifetimes beyond [`MAX_TIME_TO_LIVE`] are clamped to it, so a huge `ttl` such as
    /// `Duration::MAX` means "never expires" rather than overflowing.
    pub fn expiring_after(written_at: SystemTime, ttl: Duration, value: V) -> Self {
        let ttl = ttl.min(MAX_TIME_TO_LIVE);
        let expires_at = written_at.checked_add(ttl).unwrap_or(written_at);
        Self::new(expires_at, value)
    }

    /// Returns the absolute expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Returns `true` while `now` is strictly before the expiry instant.
    #[must_use]
    pub fn is_live_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }

    /// Returns a reference to the wrapped value.
    #[must_use]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the envelope and returns the wrapped value.
    #[must_use]
    pub fn into_value(self) -> V {
        self.value
    }
}
