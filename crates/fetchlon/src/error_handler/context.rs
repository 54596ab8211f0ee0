// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

/// Caller-supplied hints passed along with a failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    tag: Option<Arc<str>>,
    suppress_propagation: bool,
}

impl ErrorContext {
    /// Creates a context carrying a tag that identifies the failing call site.
    pub fn tagged(tag: impl Into<Arc<str>>) -> Self {
        Self {
            tag: Some(tag.into()),
            suppress_propagation: false,
        }
    }

    /// Classifies failures without running propagators.
    #[must_use]
    pub fn suppressing_propagation(mut self) -> Self {
        self.suppress_propagation = true;
        self
    }

    /// Returns the call site tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Returns `true` when propagators should be skipped.
    #[must_use]
    pub fn is_propagation_suppressed(&self) -> bool {
        self.suppress_propagation
    }
}
