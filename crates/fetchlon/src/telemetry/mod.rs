// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Coordinator telemetry.
//!
//! Every coordinator activity is emitted as a structured `tracing` event. When the `metrics`
//! feature is enabled and a meter is supplied, the same activities are counted with an
//! OpenTelemetry counter.

use tracing::Level;

pub(crate) mod attributes;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
mod recorder;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use recorder::FetcherTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchActivity {
    FetchStarted,
    FetchCoalesced,
    FetchSucceeded,
    FetchEmpty,
    FetchFailed,
    FetchCancelled,
    FetchIgnored,
    CacheHit,
    CacheMiss,
    CacheCoalesced,
    CacheCancelled,
    CacheWriteFailed,
}

impl FetchActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchStarted => "fetch.started",
            Self::FetchCoalesced => "fetch.coalesced",
            Self::FetchSucceeded => "fetch.succeeded",
            Self::FetchEmpty => "fetch.empty",
            Self::FetchFailed => "fetch.failed",
            Self::FetchCancelled => "fetch.cancelled",
            Self::FetchIgnored => "fetch.ignored",
            Self::CacheHit => "cache.hit",
            Self::CacheMiss => "cache.miss",
            Self::CacheCoalesced => "cache.coalesced",
            Self::CacheCancelled => "cache.cancelled",
            Self::CacheWriteFailed => "cache.write_failed",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::CacheHit | Self::CacheMiss | Self::CacheCoalesced | Self::FetchCoalesced => Level::DEBUG,
            Self::FetchStarted
            | Self::FetchSucceeded
            | Self::FetchEmpty
            | Self::FetchCancelled
            | Self::FetchIgnored
            | Self::CacheCancelled => Level::INFO,
            Self::CacheWriteFailed => Level::WARN,
            Self::FetchFailed => Level::ERROR,
        }
    }
}
